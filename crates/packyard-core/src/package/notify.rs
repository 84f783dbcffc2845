use std::fmt::Display;

use packyard_db::{
    models::Package,
    repository::{MaintainerRepository, PackageRepository},
};
use packyard_events::{NotifyOutcome, RegistryEvent};
use tracing::{debug, error, trace};

use super::{display_name, PackageManager};
use crate::{
    notify::{escape_html, MailMessage},
    RegistryError, RegistryResult,
};

impl PackageManager {
    /// Tells the maintainers that a package failed to update.
    ///
    /// Each failure streak is reported once. The stored flag is claimed
    /// before anything is sent, so a caller holding a stale `Package` or
    /// racing another caller sends nothing and gets `true`. When nobody opted
    /// in the flag stays set. A delivery failure is logged, releases the flag
    /// and returns `false` so the next failure tries again.
    pub fn notify_update_failure(
        &self,
        package: &mut Package,
        error: &dyn Display,
        details: Option<&str>,
    ) -> RegistryResult<bool> {
        let claimed = self.db.with_conn(|conn| {
            PackageRepository::claim_update_failure_notification(conn, package.id)
        })?;
        if !claimed {
            let stored = self
                .db
                .with_conn(|conn| PackageRepository::find_by_id(conn, package.id))?;
            if stored.is_none() {
                return Err(RegistryError::PackageNotFound(
                    display_name(package).to_string(),
                ));
            }
            trace!(package = display_name(package), "update failure already notified");
            package.update_failure_notified = true;
            return Ok(true);
        }
        package.update_failure_notified = true;

        let recipients = match self
            .db
            .with_conn(|conn| MaintainerRepository::list_notifiable(conn, package.id))
        {
            Ok(maintainers) => {
                maintainers
                    .into_iter()
                    .map(|maintainer| maintainer.email)
                    .collect::<Vec<_>>()
            }
            Err(err) => {
                self.release_update_failure_claim(package)?;
                return Err(err);
            }
        };

        let outcome = if recipients.is_empty() {
            debug!(
                package = display_name(package),
                "no maintainer opted into failure notifications"
            );
            NotifyOutcome::NoRecipients
        } else {
            let message = self.failure_message(package, recipients, error, details);
            match self.notifier.send(&message) {
                Ok(()) => NotifyOutcome::Sent,
                Err(err) => {
                    error!(
                        package = display_name(package),
                        "failed to send update failure notification: {err}"
                    );
                    NotifyOutcome::DeliveryFailed
                }
            }
        };

        self.events.emit(RegistryEvent::UpdateFailureNotified {
            package_id: package.id,
            name: package.name.clone(),
            outcome,
        });

        if outcome == NotifyOutcome::DeliveryFailed {
            self.release_update_failure_claim(package)?;
            return Ok(false);
        }

        Ok(true)
    }

    fn release_update_failure_claim(&self, package: &mut Package) -> RegistryResult<()> {
        self.db.with_conn(|conn| {
            PackageRepository::set_update_failure_notified(conn, package.id, false)
        })?;
        package.update_failure_notified = false;
        Ok(())
    }

    /// Clears the notification flag once a package updates successfully again.
    pub fn reset_update_failure_notified(&self, package: &mut Package) -> RegistryResult<()> {
        if !package.update_failure_notified {
            return Ok(());
        }

        self.db.with_conn(|conn| {
            PackageRepository::set_update_failure_notified(conn, package.id, false)
        })?;
        package.update_failure_notified = false;

        Ok(())
    }

    fn failure_message(
        &self,
        package: &Package,
        recipients: Vec<String>,
        error: &dyn Display,
        details: Option<&str>,
    ) -> MailMessage {
        let name = display_name(package);
        let subject = match self.mail.subject_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => {
                format!("{prefix} {name} failed to update, invalid composer.json data")
            }
            _ => format!("{name} failed to update, invalid composer.json data"),
        };

        let mut html_body = format!(
            "<p>The <strong>{}</strong> package of which you are a maintainer has failed to \
             update due to invalid data contained in your composer.json.</p>\n\
             <p>Error:</p>\n<pre>{}</pre>\n",
            escape_html(name),
            escape_html(&error.to_string())
        );
        if let Some(details) = details {
            html_body.push_str(&format!(
                "<p>Details:</p>\n<pre>{}</pre>\n",
                escape_html(details)
            ));
        }
        html_body.push_str(&format!(
            "<p>Repository: {}</p>\n",
            escape_html(&package.repository)
        ));

        MailMessage {
            from: self.mail.from.clone(),
            recipients,
            subject,
            html_body,
        }
    }
}
