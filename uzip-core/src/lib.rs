pub mod engine;
pub mod error;
pub mod manifest;
pub mod path_safety;
pub mod progress;
pub mod prompt;
pub mod split_size;
pub mod workflow;

pub use error::{Error, Result};
