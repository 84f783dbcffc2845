use std::sync::mpsc::Receiver;

use nu_ansi_term::Color::{Cyan, Red};
use packyard_events::{NotifyOutcome, RegistryEvent};
use tracing::{debug, warn};

use crate::utils::{pluralize, Colored};

/// Owns the thread that logs registry events.
///
/// Call [`finish`](EventLogGuard::finish) after dropping every holder of the
/// channel sender, otherwise the join blocks forever.
pub struct EventLogGuard {
    handle: Option<std::thread::JoinHandle<()>>,
}

impl EventLogGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

pub fn describe(event: &RegistryEvent) -> String {
    let name = event.package_name().unwrap_or("<unnamed>");
    match event {
        RegistryEvent::PackageRemoving {
            repository, ..
        } => format!("Removing {} ({repository})", Colored(Cyan, name)),
        RegistryEvent::PackageRemoved {
            versions, ..
        } => format!(
            "Removed {} with {}",
            Colored(Cyan, name),
            pluralize(*versions, "version")
        ),
        RegistryEvent::MetadataRebuilt {
            scope_id,
            packages,
        } => format!(
            "Rebuilt metadata of scope {scope_id} ({})",
            pluralize(*packages, "package")
        ),
        RegistryEvent::UpdateFailureNotified {
            outcome, ..
        } => match outcome {
            NotifyOutcome::Sent => format!("Notified maintainers of {}", Colored(Cyan, name)),
            NotifyOutcome::NoRecipients => format!(
                "{} has no maintainer accepting failure notifications",
                Colored(Cyan, name)
            ),
            NotifyOutcome::DeliveryFailed => format!(
                "{} notifying maintainers of {}",
                Colored(Red, "Failed"),
                Colored(Cyan, name)
            ),
        },
    }
}

pub fn spawn_event_logger(receiver: Receiver<RegistryEvent>) -> EventLogGuard {
    let handle = std::thread::spawn(move || {
        while let Ok(event) = receiver.recv() {
            match event {
                RegistryEvent::UpdateFailureNotified {
                    outcome: NotifyOutcome::DeliveryFailed,
                    ..
                } => warn!("{}", describe(&event)),
                _ => debug!("{}", describe(&event)),
            }
        }
    });

    EventLogGuard {
        handle: Some(handle),
    }
}
