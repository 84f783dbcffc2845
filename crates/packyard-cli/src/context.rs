use std::{fs, sync::Arc};

use packyard_config::Config;
use packyard_core::{
    builder::{DbMetadataBuilder, RootSettings},
    cache::{MemoryCacheStore, MetadataCache},
    database::Database,
    error::ErrorContext,
    notify::LogSender,
    package::PackageManager,
    scope::{AccessPolicy, AccessScope, NoPrivileges, Principal, PrivilegedUsers},
    view::ProtocolViews,
    RegistryResult,
};
use packyard_events::{ChannelSink, EventSinkHandle};
use tracing::debug;

use crate::{
    cli::Args,
    events::{spawn_event_logger, EventLogGuard},
};

/// Everything a command needs, wired from the configuration.
pub struct AppContext {
    pub config: Config,
    pub db: Database,
    pub views: ProtocolViews,
    pub packages: PackageManager,
    pub scope: AccessScope,
}

impl AppContext {
    pub fn new(config: Config, scope: AccessScope, events: EventSinkHandle) -> RegistryResult<Self> {
        let path = config.database_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
        debug!("opening database at {}", path.display());
        let db = Database::open(&path)?;

        Ok(Self::with_database(config, db, scope, events))
    }

    pub fn with_database(
        config: Config,
        db: Database,
        scope: AccessScope,
        events: EventSinkHandle,
    ) -> Self {
        let builder = DbMetadataBuilder::new(db.clone(), RootSettings::from_config(&config));
        let cache = MetadataCache::new(
            Arc::new(builder),
            Arc::new(MemoryCacheStore::new()),
            config.cache_ttl(),
        )
        .with_events(events.clone());
        let packages = PackageManager::new(db.clone(), Arc::new(LogSender), config.mail())
            .with_events(events);

        Self {
            config,
            db,
            views: ProtocolViews::new(cache),
            packages,
            scope,
        }
    }
}

/// Normalizes the `--user`/`--privileged` options into a scope.
pub fn scope_from_args(args: &Args) -> AccessScope {
    let principal = args
        .user
        .map(|user_id| Principal::new(user_id, format!("user-{user_id}")));
    let policy: Box<dyn AccessPolicy> = match (&principal, args.privileged) {
        (Some(principal), true) => Box::new(PrivilegedUsers(vec![principal.user_id])),
        _ => Box::new(NoPrivileges),
    };

    AccessScope::for_principal(principal.as_ref(), policy.as_ref())
}

pub fn create_context(config: Config, args: &Args) -> RegistryResult<(AppContext, EventLogGuard)> {
    let (sink, receiver) = ChannelSink::new();
    let events: EventSinkHandle = Arc::new(sink);
    let ctx = AppContext::new(config, scope_from_args(args), events)?;
    Ok((ctx, spawn_event_logger(receiver)))
}
