pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{build_state, create_app, create_router, run_server, AppState};
