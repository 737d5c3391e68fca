pub mod config;
pub mod error;
pub mod types;

pub use config::CuramindConfig;
pub use error::{CuramindError, Result};
pub use types::*;
