// ABOUTME: Library root for imagedash - exposes the runtime, image and API layers.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod error;
pub mod images;
pub mod registry;
pub mod runtime;
pub mod types;
