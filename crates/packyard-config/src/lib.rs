pub mod annotations;
pub mod config;
pub mod error;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use config::{Config, MailConfig};
pub use error::{ConfigError, Result};
