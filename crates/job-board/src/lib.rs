pub mod api;
pub mod applicants;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod notify;
pub mod profile;
pub mod session;
pub mod telemetry;

pub use api::JobBoardClient;
pub use cache::Queries;
pub use error::AppError;
pub use session::SessionContext;
