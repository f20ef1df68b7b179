use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        activation::ActivationError, repos::RepoError, uploads::UploadSettingsError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Upload(#[from] UploadSettingsError),
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AppError::Repo(err) | AppError::Upload(UploadSettingsError::Repo(err)) => {
                repo_status(err)
            }
            AppError::Upload(UploadSettingsError::ConstraintViolation(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Upload(UploadSettingsError::PanelDisabled)
            | AppError::Upload(UploadSettingsError::UnknownAttachment(_)) => StatusCode::NOT_FOUND,
            AppError::Infra(InfraError::Storage { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Infra(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Activation(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Request could not be processed",
            StatusCode::NOT_FOUND => "Resource not found",
            StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable",
            _ => "Unexpected error occurred",
        }
    }
}

fn repo_status(err: &RepoError) -> StatusCode {
    match err {
        RepoError::NotFound => StatusCode::NOT_FOUND,
        RepoError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        RepoError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        RepoError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}
