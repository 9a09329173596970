pub mod api;
pub mod forms;
pub mod models;

pub use api::{ApiResponse, Page};
