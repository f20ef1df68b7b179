//! Image pipeline backed by an external ImageMagick-compatible CLI.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Instant,
};

use tracing::info;

use crate::application::repos::{ImagePipeline, ImagePipelineError};
use crate::domain::favicon::ImageSize;

const SOURCE: &str = "infra::images";

#[derive(Debug, Clone)]
pub struct CliImagePipeline {
    cli_path: PathBuf,
}

impl CliImagePipeline {
    pub fn new(cli_path: PathBuf) -> Self {
        Self { cli_path }
    }

    fn command(&self) -> Command {
        Command::new(&self.cli_path)
    }

    fn spawn_error(&self, err: std::io::Error) -> ImagePipelineError {
        if err.kind() == ErrorKind::NotFound {
            ImagePipelineError::Unavailable(format!(
                "`{}` was not found",
                self.cli_path.display()
            ))
        } else {
            ImagePipelineError::Io(err)
        }
    }
}

/// Arguments for a resize; cropped sizes fill the box and trim the overflow.
fn resize_args(source: &Path, target: &Path, size: ImageSize) -> Vec<String> {
    let geometry = format!("{}x{}", size.width, size.height);
    let mut args = vec![source.display().to_string()];
    if size.crop {
        args.extend([
            "-resize".to_string(),
            format!("{geometry}^"),
            "-gravity".to_string(),
            "center".to_string(),
            "-extent".to_string(),
            geometry,
        ]);
    } else {
        args.extend(["-resize".to_string(), geometry]);
    }
    args.push(target.display().to_string());
    args
}

impl ImagePipeline for CliImagePipeline {
    fn probe(&self) -> Result<(), ImagePipelineError> {
        let status = self
            .command()
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| self.spawn_error(err))?;

        if status.success() {
            Ok(())
        } else {
            Err(ImagePipelineError::Unavailable(format!(
                "`{} -version` exited with {status}",
                self.cli_path.display()
            )))
        }
    }

    fn resize(
        &self,
        source: &Path,
        target: &Path,
        size: ImageSize,
    ) -> Result<(), ImagePipelineError> {
        let started_at = Instant::now();
        let output = self
            .command()
            .args(resize_args(source, target, size))
            .stdin(Stdio::null())
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            return Err(ImagePipelineError::Failed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(
            target = SOURCE,
            op = "resize",
            size = size.name,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            source_path = %source.display(),
            target_path = %target.display(),
            "Derived image size"
        );
        Ok(())
    }
}
