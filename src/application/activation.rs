//! Activation precondition: the host must provide image processing.

use thiserror::Error;
use tracing::{error, info};

use crate::application::repos::{ImagePipeline, ImagePipelineError};

const SOURCE: &str = "application::activation";

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(
        "icona needs an image processing tool to derive the 16x16 favicon from uploads, \
         and none could be used ({0}). Install ImageMagick or point `images.cli_path` \
         at a compatible binary, then start icona again."
    )]
    MissingImagePipeline(#[source] ImagePipelineError),
}

/// Refuse to start unless the image pipeline answers.
pub fn activate(pipeline: &dyn ImagePipeline) -> Result<(), ActivationError> {
    match pipeline.probe() {
        Ok(()) => {
            info!(target = SOURCE, op = "activate", "Image pipeline available");
            Ok(())
        }
        Err(err) => {
            error!(
                target = SOURCE,
                op = "activate",
                result = "pipeline_unavailable",
                error = %err,
                "Activation aborted"
            );
            Err(ActivationError::MissingImagePipeline(err))
        }
    }
}
