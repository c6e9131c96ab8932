// ABOUTME: Image operations: list, inspect, save, delete, load, pull, tag and push.
// ABOUTME: Each operation composes a runtime command, executes it and parses the output.

mod error;
mod record;
mod service;

pub use error::ImageError;
pub use record::{
    FilterReason, ImageListing, ImageRecord, JSON_LINE_FORMAT, LineOutcome, NONE_PLACEHOLDER,
    parse_image_line, parse_image_lines,
};
pub use service::{
    DeleteOutcome, ImageService, LOADED_IMAGE_MARKER, LoadReport, PushOutcome, SavedArchive,
    parse_loaded_images,
};
