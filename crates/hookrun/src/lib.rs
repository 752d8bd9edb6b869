pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod message;
pub mod pretty;
pub mod sink;
pub mod tee;

pub use error::{Error, Result};
