pub mod cli;
pub mod error;
pub mod forecast;
pub mod models;
pub mod processors;
pub mod readers;
pub mod settings;
pub mod utils;

pub use error::{ProcessingError, Result};
