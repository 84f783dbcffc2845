use nu_ansi_term::Color::{Cyan, Yellow};
use packyard_core::{document::Lookup, error::RegistryError, RegistryResult};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    context::AppContext,
    utils::{print_document, Colored},
};

pub fn root_document(ctx: &AppContext) -> RegistryResult<Value> {
    Ok(serde_json::to_value(ctx.views.root(ctx.scope)?)?)
}

/// Returns the providers index, or `None` when `hash` is stale.
pub fn providers_document(ctx: &AppContext, hash: Option<&str>) -> RegistryResult<Option<Value>> {
    match ctx.views.providers(ctx.scope, hash)? {
        Lookup::Found(providers) => Ok(Some(serde_json::to_value(providers)?)),
        _ => Ok(None),
    }
}

pub struct PackageQuery<'a> {
    pub name: &'a str,
    pub v2: bool,
    pub dev: bool,
    pub cached: bool,
    pub hash: Option<&'a str>,
}

/// Returns the requested package document, or `None` when `hash` is stale.
pub fn package_document(ctx: &AppContext, query: &PackageQuery) -> RegistryResult<Option<Value>> {
    let not_found = || RegistryError::PackageNotFound(query.name.to_string());

    if query.v2 {
        let package = ctx
            .views
            .package_v2(ctx.scope, query.name, query.dev)?
            .ok_or_else(not_found)?;
        debug!(
            package = query.name,
            "last modified {}",
            package.last_modified_rfc3339()
        );
        return Ok(Some(serde_json::to_value(package.document)?));
    }

    if query.cached {
        return match ctx.views.cached_package(ctx.scope, query.name, query.hash)? {
            Lookup::Found(document) => Ok(Some(serde_json::to_value(document)?)),
            Lookup::NotModified => Ok(None),
            Lookup::Absent => Err(not_found()),
        };
    }

    let document = ctx
        .views
        .package(ctx.scope, query.name)?
        .ok_or_else(not_found)?;
    Ok(Some(serde_json::to_value(document)?))
}

fn print_or_not_modified(document: Option<Value>, what: &str) -> RegistryResult<()> {
    match document {
        Some(document) => print_document(&document),
        None => {
            info!(
                "{} {} is unchanged",
                Colored(Yellow, "Not modified:"),
                Colored(Cyan, what)
            );
            Ok(())
        }
    }
}

pub fn show_root(ctx: &AppContext) -> RegistryResult<()> {
    print_document(&root_document(ctx)?)
}

pub fn show_providers(ctx: &AppContext, hash: Option<&str>) -> RegistryResult<()> {
    print_or_not_modified(providers_document(ctx, hash)?, "provider index")
}

pub fn show_package(ctx: &AppContext, query: &PackageQuery) -> RegistryResult<()> {
    print_or_not_modified(package_document(ctx, query)?, query.name)
}
