use std::{env, path::PathBuf};

use clap::Parser;
use cli::{Args, Commands};
use context::create_context;
use import::import_packages;
use logging::setup_logging;
use manage::{delete_packages, notify_failure, reset_failure};
use metadata::{show_package, show_providers, show_root, PackageQuery};
use packyard_config::Config;
use packyard_core::{error::ErrorContext, RegistryResult};
use packyard_db::repository::{PackageRepository, ProviderIndexRepository};
use tracing::{info, warn};
use utils::disable_color;

mod cli;
mod context;
mod events;
mod import;
mod logging;
mod manage;
mod metadata;
mod utils;

fn load_config(args: &Args) -> RegistryResult<Config> {
    let Some(path) = args.config.as_deref() else {
        return Ok(Config::load()?);
    };

    let path = PathBuf::from(path);
    let path = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .with_context(|| "retrieving current directory".into())?
            .join(path)
    };
    Ok(Config::load_from(path)?)
}

fn print_config(args: &Args, default: bool) -> RegistryResult<()> {
    let config = if default {
        Config::default_config()
    } else {
        if args.config.is_none() && !Config::default_path().exists() {
            warn!(
                "Config file {} not found, showing defaults",
                Config::default_path().display()
            );
        }
        load_config(args)?
    };

    println!("{}", config.to_annotated_document()?);
    Ok(())
}

fn handle_cli() -> RegistryResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        disable_color();
    }

    if let Commands::Config {
        default,
    } = args.command
    {
        return print_config(&args, default);
    }

    let config = load_config(&args)?;
    let (ctx, event_guard) = create_context(config, &args)?;

    let result = match &args.command {
        Commands::Import {
            file,
        } => import_packages(&ctx, file),
        Commands::Root => show_root(&ctx),
        Commands::Providers {
            hash,
        } => show_providers(&ctx, hash.as_deref()),
        Commands::Package {
            name,
            v2,
            dev,
            cached,
            hash,
        } => {
            show_package(
                &ctx,
                &PackageQuery {
                    name,
                    v2: *v2,
                    dev: *dev,
                    cached: *cached,
                    hash: hash.as_deref(),
                },
            )
        }
        Commands::Delete {
            packages,
        } => delete_packages(&ctx, packages),
        Commands::NotifyFailure {
            name,
            error,
            details,
        } => notify_failure(&ctx, name, error, details.as_deref()),
        Commands::ResetFailure {
            name,
        } => reset_failure(&ctx, name),
        Commands::Env => {
            let (packages, indexed) = ctx.db.with_conn(|conn| {
                Ok((
                    PackageRepository::count(conn)?,
                    ProviderIndexRepository::list_names(conn)?.len(),
                ))
            })?;

            let config_path = args
                .config
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_path);
            info!("PACKYARD_CONFIG={}", config_path.display());
            info!("PACKYARD_DB={}", ctx.config.database_path().display());
            info!("PACKYARD_CACHE_TTL={}s", ctx.config.cache_ttl().as_secs());
            info!("PACKAGES={packages}");
            info!("INDEXED_PACKAGES={indexed}");
            Ok(())
        }
        Commands::Config {
            ..
        } => Ok(()),
    };

    // Drop the context first to close the event channel, then join the
    // logger so remaining events are written.
    drop(ctx);
    event_guard.finish();

    result
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
