//! Error types for packyard-core.

use miette::Diagnostic;
use packyard_config::ConfigError;
use packyard_db::DbError;
use thiserror::Error;

/// Core error type for the metadata engine and lifecycle operations.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),

    #[error("Failed to build metadata: {0}")]
    #[diagnostic(
        code(packyard::builder),
        help("The metadata graph could not be assembled from storage")
    )]
    Builder(String),

    #[error("Version {version} of {package} has no valid '{field}' field")]
    #[diagnostic(
        code(packyard::malformed_version),
        help("The stored version record is corrupt; re-import or update the package")
    )]
    MalformedVersionRecord {
        package: String,
        version: String,
        field: &'static str,
    },

    #[error("Version {version} of {package} uses the reserved value '__unset' in '{field}'")]
    #[diagnostic(
        code(packyard::reserved_value),
        help("Minified metadata cannot carry this value; change it in composer.json")
    )]
    ReservedFieldValue {
        package: String,
        version: String,
        field: String,
    },

    #[error("Version {version} of {package} did not serialize to a JSON object")]
    #[diagnostic(
        code(packyard::record_shape),
        help("The stored version record is corrupt; re-import or update the package")
    )]
    RecordShape { package: String, version: String },

    #[error(transparent)]
    #[diagnostic(code(packyard::json), help("Check the JSON document syntax"))]
    Json(#[from] serde_json::Error),

    #[error("Error while {action}")]
    #[diagnostic(code(packyard::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Package '{0}' not found")]
    #[diagnostic(
        code(packyard::package_not_found),
        help("Check the package name, or import it first")
    )]
    PackageNotFound(String),

    #[error("Invalid package data: {0}")]
    #[diagnostic(
        code(packyard::invalid_package),
        help("Packages are keyed by 'vendor/name' and list version objects")
    )]
    InvalidPackageData(String),

    #[error("Thread lock poison error")]
    #[diagnostic(
        code(packyard::poison),
        help("This is an internal error, please report it")
    )]
    PoisonError,
}

impl From<diesel::result::Error> for RegistryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for RegistryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::PoisonError
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, RegistryError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, RegistryError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
