//! Package lifecycle operations: deletion, VCS resolution and update failure
//! notifications.

mod notify;
mod remove;
mod resolve;

use std::sync::Arc;

use packyard_config::MailConfig;
use packyard_db::{models::Package, repository::PackageRepository};
use packyard_events::{EventSinkHandle, NullSink};

use crate::{
    database::Database, notify::NotificationSender, vcs::VcsDriver, RegistryError, RegistryResult,
};

/// A stored package together with its resolved VCS driver.
pub struct PackageHandle {
    pub package: Package,
    vcs_driver: Option<Arc<dyn VcsDriver>>,
}

impl PackageHandle {
    pub fn new(package: Package) -> Self {
        Self {
            package,
            vcs_driver: None,
        }
    }

    pub fn vcs_driver(&self) -> Option<&Arc<dyn VcsDriver>> {
        self.vcs_driver.as_ref()
    }

    pub fn vcs_driver_error(&self) -> Option<&str> {
        self.package.vcs_driver_error.as_deref()
    }
}

/// Mutating operations on stored packages.
pub struct PackageManager {
    db: Database,
    notifier: Arc<dyn NotificationSender>,
    mail: MailConfig,
    events: EventSinkHandle,
}

impl PackageManager {
    pub fn new(db: Database, notifier: Arc<dyn NotificationSender>, mail: MailConfig) -> Self {
        Self {
            db,
            notifier,
            mail,
            events: Arc::new(NullSink),
        }
    }

    pub fn with_events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    /// Loads a package by name, regardless of grants.
    pub fn find(&self, name: &str) -> RegistryResult<Package> {
        self.db
            .with_conn(|conn| PackageRepository::find_by_name(conn, name))?
            .ok_or_else(|| RegistryError::PackageNotFound(name.to_string()))
    }
}

fn display_name(package: &Package) -> &str {
    package.name.as_deref().unwrap_or(&package.repository)
}
