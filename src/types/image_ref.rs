// ABOUTME: Container image reference parsing and validation.
// ABOUTME: Handles formats like nginx, nginx:tag, registry:port/image:tag@digest.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0:?}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        // Also rejects anything a runtime CLI could mistake for a flag.
        if input.starts_with('-') {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }
        if let Some(c) = input.chars().find(|c| {
            !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@')
        }) {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) => (before, Some(after.to_string())),
            None => (input, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, Some(after.to_string())),
            _ => (without_digest, None),
        };

        if without_tag.is_empty()
            || tag.as_deref() == Some("")
            || digest.as_deref() == Some("")
        {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        let (registry, name) = Self::parse_registry_and_name(without_tag)?;

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    fn parse_registry_and_name(
        input: &str,
    ) -> Result<(Option<String>, String), ParseImageRefError> {
        match input.split_once('/') {
            None => Ok((None, input.to_string())),
            Some((first, rest)) if rest.is_empty() || first.is_empty() => {
                Err(ParseImageRefError::InvalidFormat(input.to_string()))
            }
            Some((first, rest)) => {
                if first.contains('.') || first.contains(':') || first == "localhost" {
                    Ok((Some(first.to_string()), rest.to_string()))
                } else {
                    Ok((None, input.to_string()))
                }
            }
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Same image addressed through another registry (`host` or `host:port`).
    ///
    /// The digest is dropped: a retagged image is pushed by tag.
    pub fn with_registry(&self, registry: impl Into<String>) -> Self {
        Self {
            registry: Some(registry.into()),
            name: self.name.clone(),
            tag: self.tag.clone().or_else(|| Some("latest".to_string())),
            digest: None,
        }
    }
}

impl FromStr for ImageRef {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// Validate a name or ID handed to the runtime, returning it trimmed.
///
/// Unlike [`ImageRef::parse`] this keeps the input as written, so bare image
/// IDs and untagged names reach the runtime unchanged.
pub fn validate_image_name(input: &str) -> Result<&str, ParseImageRefError> {
    ImageRef::parse(input)?;
    Ok(input.trim())
}
