// ABOUTME: Image operations composed from runtime commands and output parsing.
// ABOUTME: Stateless: every call re-detects the runtime and re-reads the image store.

use super::error::ImageError;
use super::record::{ImageListing, JSON_LINE_FORMAT, parse_image_lines};
use crate::registry::RegistrySettings;
use crate::runtime::{
    BinaryProbe, CommandRunner, Executor, ProcessRunner, RuntimeCommand, WhichProbe,
};
use crate::types::{ImageRef, validate_image_name};
use nonempty::NonEmpty;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Marker line `load` prints for each image it restored.
pub const LOADED_IMAGE_MARKER: &str = "Loaded image:";

/// Per-image result of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub image_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-image result of a bulk push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub image_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw `load` output and the image names it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub output: String,
    pub loaded_images: Vec<String>,
}

/// A verified archive written by `save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArchive {
    pub path: PathBuf,
    pub size: u64,
    pub images: Vec<String>,
}

/// Names reported by `load`, in output order.
pub fn parse_loaded_images(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(LOADED_IMAGE_MARKER))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn validated(name: &str) -> Result<&str, ImageError> {
    validate_image_name(name).map_err(|e| ImageError::invalid_name(name, e))
}

/// Image operations against whichever runtime is installed.
pub struct ImageService<R = ProcessRunner, P = WhichProbe> {
    executor: Executor<R, P>,
}

impl<R: CommandRunner, P: BinaryProbe> ImageService<R, P> {
    pub fn new(executor: Executor<R, P>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Executor<R, P> {
        &self.executor
    }

    /// List tagged images in the runtime's native order.
    pub async fn list_images(&self) -> Result<ImageListing, ImageError> {
        let command = RuntimeCommand::new("images").args(["--format", JSON_LINE_FORMAT]);
        let output = self.executor.dispatch(&command).await?;

        let listing = ImageListing::from_outcomes(parse_image_lines(&output.stdout));
        if listing.malformed > 0 {
            tracing::warn!(
                malformed = listing.malformed,
                parsed = listing.images.len(),
                "some image lines could not be parsed"
            );
        }
        Ok(listing)
    }

    /// Low-level runtime metadata for one image.
    pub async fn inspect_image(&self, name: &str) -> Result<serde_json::Value, ImageError> {
        let name = validated(name)?;
        let command = RuntimeCommand::new("inspect").arg(name);
        let output = self
            .executor
            .dispatch(&command)
            .await
            .map_err(|e| ImageError::from_runtime(name, e))?;

        let parsed: serde_json::Value = serde_json::from_str(output.stdout.trim())
            .map_err(|e| ImageError::UnexpectedOutput(e.to_string()))?;

        match parsed {
            serde_json::Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| ImageError::NotFound(name.to_string())),
            other => Ok(other),
        }
    }

    /// Write `names` into a tar archive at `output`.
    ///
    /// On failure a partially written archive is removed before returning. A
    /// file that was already at `output` before the call is never removed.
    pub async fn save_image(
        &self,
        names: &NonEmpty<String>,
        output: &Path,
    ) -> Result<SavedArchive, ImageError> {
        let names = names
            .iter()
            .map(|name| validated(name).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        // Only a file this call created may be removed on failure.
        let preexisting = !matches!(tokio::fs::try_exists(output).await, Ok(false));

        match self.save_and_verify(&names, output).await {
            Ok(size) => {
                tracing::info!(path = %output.display(), size, images = ?names, "images saved");
                Ok(SavedArchive {
                    path: output.to_path_buf(),
                    size,
                    images: names,
                })
            }
            Err(source) => {
                if preexisting {
                    tracing::debug!(path = %output.display(), "leaving pre-existing file in place");
                } else {
                    remove_partial_archive(output).await;
                }
                Err(ImageError::SaveFailed {
                    path: output.to_path_buf(),
                    source: Box::new(source),
                })
            }
        }
    }

    async fn save_and_verify(&self, names: &[String], output: &Path) -> Result<u64, ImageError> {
        let command = RuntimeCommand::new("save")
            .arg("-o")
            .arg(output.to_string_lossy())
            .args(names.iter().cloned());
        self.executor.dispatch(&command).await?;

        let metadata = match tokio::fs::metadata(output).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImageError::ArchiveNotWritten(output.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.len() == 0 {
            return Err(ImageError::EmptyArchive(output.to_path_buf()));
        }
        Ok(metadata.len())
    }

    /// Remove one image.
    pub async fn delete_image(&self, name: &str) -> Result<String, ImageError> {
        let name = validated(name)?;
        let command = RuntimeCommand::new("rmi").arg(name);
        self.executor
            .dispatch(&command)
            .await
            .map_err(|e| ImageError::from_runtime(name, e))?;
        tracing::info!(image = name, "image deleted");
        Ok(format!("Successfully deleted image {name}"))
    }

    /// Remove images one after another; a failure does not stop the rest.
    pub async fn delete_images<I, S>(&self, names: I) -> Vec<DeleteOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for name in names {
            let name = name.as_ref();
            let outcome = match self.delete_image(name).await {
                Ok(message) => DeleteOutcome {
                    image_name: name.to_string(),
                    success: true,
                    message: Some(message),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(image = name, error = %e, "image delete failed");
                    DeleteOutcome {
                        image_name: name.to_string(),
                        success: false,
                        message: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Restore images from a tar archive.
    pub async fn load_image(&self, path: &Path) -> Result<LoadReport, ImageError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(ImageError::ArchiveMissing(path.to_path_buf()));
        }

        let command = RuntimeCommand::new("load")
            .arg("-i")
            .arg(path.to_string_lossy());
        let output = self.executor.dispatch(&command).await?;

        let loaded_images = parse_loaded_images(&output.stdout);
        tracing::info!(path = %path.display(), images = ?loaded_images, "archive loaded");
        Ok(LoadReport {
            output: output.stdout,
            loaded_images,
        })
    }

    pub async fn pull_image(&self, name: &str) -> Result<String, ImageError> {
        let name = validated(name)?;
        let command = RuntimeCommand::new("pull").arg(name);
        self.executor
            .dispatch(&command)
            .await
            .map_err(|e| ImageError::from_runtime(name, e))?;
        tracing::info!(image = name, "image pulled");
        Ok(format!("Successfully pulled image {name}"))
    }

    pub async fn tag_image(&self, source: &str, target: &str) -> Result<String, ImageError> {
        let source = validated(source)?;
        let target = validated(target)?;
        let command = RuntimeCommand::new("tag").args([source, target]);
        self.executor
            .dispatch(&command)
            .await
            .map_err(|e| ImageError::from_runtime(source, e))?;
        tracing::info!(source, target, "image tagged");
        Ok(format!("Successfully tagged {source} as {target}"))
    }

    /// Push an image, retagging it into the configured registry first.
    ///
    /// Returns the reference that was pushed.
    pub async fn push_image(
        &self,
        name: &str,
        registry: Option<&RegistrySettings>,
    ) -> Result<String, ImageError> {
        let name = validated(name)?;
        let target = match registry.and_then(RegistrySettings::address) {
            Some(address) => {
                let reference =
                    ImageRef::parse(name).map_err(|e| ImageError::invalid_name(name, e))?;
                let target = reference.with_registry(address).to_string();
                if target != name {
                    self.tag_image(name, &target).await?;
                }
                target
            }
            None => name.to_string(),
        };

        let command = RuntimeCommand::new("push").arg(&target);
        self.executor
            .dispatch(&command)
            .await
            .map_err(|e| ImageError::from_runtime(&target, e))?;
        tracing::info!(image = name, %target, "image pushed");
        Ok(target)
    }

    /// Push images one after another; a failure does not stop the rest.
    pub async fn push_images<I, S>(
        &self,
        names: I,
        registry: Option<&RegistrySettings>,
    ) -> Vec<PushOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for name in names {
            let name = name.as_ref();
            let outcome = match self.push_image(name, registry).await {
                Ok(target) => PushOutcome {
                    image_name: name.to_string(),
                    success: true,
                    message: Some(format!("Successfully pushed {target}")),
                    target: Some(target),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(image = name, error = %e, "image push failed");
                    PushOutcome {
                        image_name: name.to_string(),
                        success: false,
                        target: None,
                        message: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

async fn remove_partial_archive(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::info!(path = %path.display(), "removed partial archive"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial archive");
        }
    }
}
