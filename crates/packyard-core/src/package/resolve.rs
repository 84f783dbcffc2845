use std::sync::Arc;

use packyard_db::{
    models::{Package, PackageResolution},
    repository::PackageRepository,
};
use tracing::{debug, trace, warn};

use super::{display_name, PackageHandle, PackageManager};
use crate::{
    vcs::{has_inline_credentials, VcsDriver, VcsError, VcsRepositoryFactory},
    RegistryResult,
};

impl PackageManager {
    /// Reads the package name and canonical repository URL through a VCS
    /// driver and stores them.
    ///
    /// Nothing happens when a driver is already resolved or the repository
    /// URL embeds credentials; such URLs never reach the factory. Driver
    /// failures are recorded on the package as `[<kind>] <message>` and are
    /// not returned; only failing to store the outcome is.
    pub fn resolve_canonical_url_and_name(
        &self,
        handle: &mut PackageHandle,
        factory: &dyn VcsRepositoryFactory,
    ) -> RegistryResult<()> {
        if handle.vcs_driver.is_some() {
            trace!(package = display_name(&handle.package), "driver already resolved");
            return Ok(());
        }
        if has_inline_credentials(&handle.package.repository) {
            debug!(
                package_id = handle.package.id,
                "repository URL embeds credentials, skipping resolution"
            );
            return Ok(());
        }

        let mut package = handle.package.clone();
        let mut driver = None;
        match discover(&mut package, &mut driver, factory) {
            Ok(()) => package.vcs_driver_error = None,
            Err(err) => {
                warn!(
                    package = display_name(&package),
                    "failed to resolve repository: {err}"
                );
                package.vcs_driver_error = Some(err.describe());
            }
        }

        self.db.with_conn(|conn| {
            PackageRepository::save_resolution(
                conn,
                package.id,
                &PackageResolution {
                    name: package.name.as_deref(),
                    repository: &package.repository,
                    vcs_driver_error: package.vcs_driver_error.as_deref(),
                },
            )
        })?;

        handle.package = package;
        handle.vcs_driver = driver;

        Ok(())
    }
}

fn discover(
    package: &mut Package,
    driver_slot: &mut Option<Arc<dyn VcsDriver>>,
    factory: &dyn VcsRepositoryFactory,
) -> Result<(), VcsError> {
    let repository =
        factory.create_repository(&package.repository, package.credentials.as_deref())?;

    let Some(driver) = repository.driver()? else {
        trace!(repository = package.repository, "no driver supports repository");
        return Ok(());
    };
    *driver_slot = Some(driver.clone());

    let identifier = driver.root_identifier()?;
    let Some(name) = driver
        .composer_information(&identifier)?
        .and_then(|information| information.name)
    else {
        return Ok(());
    };

    let name = name.trim();
    if package.name.is_none() && !name.is_empty() {
        package.name = Some(name.to_string());
    }
    if let Some(url) = driver.url() {
        package.repository = url;
    }

    Ok(())
}
