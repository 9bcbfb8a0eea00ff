pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, ShowApi, SUPPORTED_LANGUAGES};
pub use error::ApiError;
pub use types::{CaptureReceipt, CreatedShow, ShowUpdate};
