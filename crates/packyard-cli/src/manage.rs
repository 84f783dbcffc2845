use nu_ansi_term::Color::{Cyan, Green, Yellow};
use packyard_core::RegistryResult;
use tracing::{info, warn};

use crate::{
    context::AppContext,
    utils::{pluralize, Colored},
};

pub fn delete_packages(ctx: &AppContext, names: &[String]) -> RegistryResult<()> {
    for name in names {
        let versions = ctx.packages.delete_by_name(name)?;
        info!(
            "{} {} ({})",
            Colored(Green, "Deleted"),
            Colored(Cyan, name),
            pluralize(versions, "version")
        );
    }
    Ok(())
}

pub fn notify_failure(
    ctx: &AppContext,
    name: &str,
    error: &str,
    details: Option<&str>,
) -> RegistryResult<()> {
    let mut package = ctx.packages.find(name)?;
    if package.update_failure_notified {
        info!(
            "{} already know {} fails to update",
            Colored(Yellow, "Maintainers"),
            Colored(Cyan, name)
        );
        return Ok(());
    }

    if !ctx
        .packages
        .notify_update_failure(&mut package, &error, details)?
    {
        warn!("Notification for {name} was not delivered; it will be retried");
    }
    Ok(())
}

pub fn reset_failure(ctx: &AppContext, name: &str) -> RegistryResult<()> {
    let mut package = ctx.packages.find(name)?;
    ctx.packages.reset_update_failure_notified(&mut package)?;
    info!("Cleared update failure flag of {}", Colored(Cyan, name));
    Ok(())
}
