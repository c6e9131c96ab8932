// ABOUTME: Validated domain types shared by the runtime, images and API layers.
// ABOUTME: Image references are checked before they reach a runtime command line.

mod image_ref;

pub use image_ref::{ImageRef, ParseImageRefError, validate_image_name};
