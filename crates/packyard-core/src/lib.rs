use error::RegistryError;

pub mod builder;
pub mod cache;
pub mod database;
pub mod document;
pub mod error;
pub mod import;
pub mod minify;
pub mod notify;
pub mod package;
pub mod scope;
pub mod vcs;
pub mod version;
pub mod view;

#[cfg(test)]
mod test_utils;

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
