// ABOUTME: Image records parsed from one-JSON-object-per-line runtime output.
// ABOUTME: Each line yields an explicit outcome: parsed, filtered or malformed.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder the runtimes print for a missing repository, tag or digest.
pub const NONE_PLACEHOLDER: &str = "<none>";

/// Go template asking the runtime for one JSON object per image.
pub const JSON_LINE_FORMAT: &str = "{{json .}}";

/// A locally stored image, normalized across runtimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub size: String,
    pub created_at: String,
    pub digest: Option<String>,
}

impl ImageRecord {
    /// `repository:tag`, the name the runtime accepts for this image.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

#[derive(Debug, Deserialize)]
struct RawImageLine {
    #[serde(rename = "ID", default, deserialize_with = "string_or_number")]
    id: String,
    #[serde(rename = "Repository", default)]
    repository: String,
    #[serde(rename = "Tag", default)]
    tag: String,
    #[serde(rename = "Size", default, deserialize_with = "string_or_number")]
    size: String,
    #[serde(rename = "CreatedAt", default)]
    created_at: String,
    #[serde(rename = "Digest", default)]
    digest: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Number(n) => n.to_string(),
    })
}

/// Why a well-formed line was left out of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    MissingRepository,
    MissingTag,
}

/// Result of parsing a single output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Parsed(ImageRecord),
    Filtered { line: usize, reason: FilterReason },
    Malformed { line: usize, error: String },
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == NONE_PLACEHOLDER
}

/// Parse one line of `images --format "{{json .}}"` output.
///
/// `line` is the 1-based line number, kept for diagnostics.
pub fn parse_image_line(line: usize, text: &str) -> LineOutcome {
    let raw: RawImageLine = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(e) => {
            return LineOutcome::Malformed {
                line,
                error: e.to_string(),
            };
        }
    };

    if is_missing(&raw.repository) {
        return LineOutcome::Filtered {
            line,
            reason: FilterReason::MissingRepository,
        };
    }
    if is_missing(&raw.tag) {
        return LineOutcome::Filtered {
            line,
            reason: FilterReason::MissingTag,
        };
    }

    LineOutcome::Parsed(ImageRecord {
        id: raw.id,
        repository: raw.repository,
        tag: raw.tag,
        size: raw.size,
        created_at: raw.created_at,
        digest: (!is_missing(&raw.digest)).then_some(raw.digest),
    })
}

/// Parse every non-blank line independently, in output order.
pub fn parse_image_lines(stdout: &str) -> Vec<LineOutcome> {
    stdout
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| parse_image_line(idx + 1, text.trim()))
        .collect()
}

/// Images that survived parsing plus counts of what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageListing {
    pub images: Vec<ImageRecord>,
    pub filtered: usize,
    pub malformed: usize,
}

impl ImageListing {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = LineOutcome>) -> Self {
        let mut listing = ImageListing::default();
        for outcome in outcomes {
            match outcome {
                LineOutcome::Parsed(record) => listing.images.push(record),
                LineOutcome::Filtered { line, reason } => {
                    tracing::debug!(line, ?reason, "skipping untagged image");
                    listing.filtered += 1;
                }
                LineOutcome::Malformed { line, error } => {
                    tracing::warn!(line, %error, "dropping unparseable image line");
                    listing.malformed += 1;
                }
            }
        }
        listing
    }
}
