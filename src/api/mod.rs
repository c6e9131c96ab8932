// ABOUTME: HTTP JSON API for the image dashboard frontend.
// ABOUTME: Thin axum handlers over ImageService and the registry settings store.

mod error;
mod handlers;
mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use handlers::{
    BulkRequest, LoadRequest, PullRequest, PushRequest, PushResponse, SaveRequest, SaveResponse,
    TagRequest,
};
pub use routes::build_router;
pub use server::serve;
pub use state::{AppState, DeploymentInfo};
