use nu_ansi_term::Color::{Cyan, Green};
use packyard_core::{error::RegistryError, import::import_file, RegistryResult};
use tracing::info;

use crate::{
    context::AppContext,
    utils::{pluralize, Colored},
};

pub fn import_packages(ctx: &AppContext, file: &str) -> RegistryResult<()> {
    let summary = import_file(&ctx.db, file).map_err(|err| {
        match err {
            RegistryError::Json(err) => {
                RegistryError::InvalidPackageData(format!("{file}: {err}"))
            }
            err => err,
        }
    })?;

    info!(
        "{} {} and {} from {}",
        Colored(Green, "Imported"),
        pluralize(summary.packages, "package"),
        pluralize(summary.versions, "version"),
        Colored(Cyan, file)
    );
    if summary.maintainers > 0 || summary.grants > 0 {
        info!(
            "Linked {} and granted {}",
            pluralize(summary.maintainers, "maintainer"),
            pluralize(summary.grants, "package")
        );
    }

    Ok(())
}
