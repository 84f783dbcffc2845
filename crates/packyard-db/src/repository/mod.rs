//! Repository pattern implementations for database operations.
//!
//! - [`PackageRepository`] - packages, access grants and maintainer links
//! - [`VersionRepository`] - package versions
//! - [`MaintainerRepository`] - maintainers and their notification settings
//! - [`ProviderIndexRepository`] - names of the served packages

pub mod maintainer;
pub mod package;
pub mod provider;
pub mod version;

pub use maintainer::MaintainerRepository;
pub use package::PackageRepository;
pub use provider::ProviderIndexRepository;
pub use version::VersionRepository;
