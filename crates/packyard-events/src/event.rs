/// Events emitted by the metadata engine and the package lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A package is about to be deleted. Subscribers can still read its state.
    PackageRemoving {
        package_id: i32,
        name: Option<String>,
        repository: String,
    },
    /// A package and all of its versions were deleted and committed.
    PackageRemoved {
        package_id: i32,
        name: Option<String>,
        versions: usize,
    },
    /// The metadata graph of a scope was rebuilt from storage.
    MetadataRebuilt { scope_id: i64, packages: usize },
    /// A failed update was reported to the package maintainers.
    UpdateFailureNotified {
        package_id: i32,
        name: Option<String>,
        outcome: NotifyOutcome,
    },
}

/// Result of an update failure notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Mail was handed to the transport.
    Sent,
    /// Nobody opted into failure notifications.
    NoRecipients,
    /// Transport rejected the message; a later failure retries.
    DeliveryFailed,
}

impl RegistryEvent {
    /// Name of the package this event concerns, if any.
    pub fn package_name(&self) -> Option<&str> {
        match self {
            Self::PackageRemoving { name, .. }
            | Self::PackageRemoved { name, .. }
            | Self::UpdateFailureNotified { name, .. } => name.as_deref(),
            Self::MetadataRebuilt { .. } => None,
        }
    }
}
