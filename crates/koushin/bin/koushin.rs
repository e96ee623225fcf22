#[macro_use]
extern crate log;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use koushin::{
    application::worker,
    domain::services::{
        reconcile::CatalogReconciler, source::SourceService, update::{PollSummary, UpdateService},
    },
    infrastructure::{
        config::Config,
        database,
        domain::repositories::{
            chapter::ChapterRepositoryImpl, manga::MangaRepositoryImpl,
            source::SourceRepositoryImpl, tag::TagRepositoryImpl,
        },
        notification::{self, Notification},
    },
};
use koushin_notifier::{gotify::Gotify, pushover::Pushover};
use koushin_source::{http::HttpConfig, registry::SourceRegistry, sources::builtin_registry};
use tokio::sync::{broadcast::error::RecvError, watch};

#[derive(Parser)]
#[clap(version, about)]
struct Opts {
    /// Path to config file
    #[clap(long)]
    config: Option<String>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll sources periodically until interrupted (default)
    Run,
    /// Run one poll pass and exit
    Poll,
    /// Register a source by its base url
    AddSource {
        #[clap(long)]
        url: String,
        #[clap(long)]
        name: String,
    },
    /// List registered sources
    Sources,
}

type Service =
    UpdateService<SourceRepositoryImpl, MangaRepositoryImpl, ChapterRepositoryImpl, TagRepositoryImpl>;

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(koushin_log) = std::env::var("KOUSHIN_LOG") {
            builder.parse_filters(&format!(
                "koushin={koushin_log},koushin_source={koushin_log},koushin_notifier={koushin_log}"
            ));
        }
    }
    builder.init();
}

fn notification(config: &Config) -> Notification {
    let mut builder = notification::Builder::new();

    if let Some(pushover_cfg) = config.pushover.as_ref() {
        builder = builder.pushover(
            Pushover::new(pushover_cfg.application_key.clone()),
            pushover_cfg.user_keys.clone(),
        );
    }

    if let Some(gotify_cfg) = config.gotify.as_ref() {
        builder = builder.gotify(
            Gotify::new(gotify_cfg.base_url.clone()),
            gotify_cfg.tokens.clone(),
        );
    }

    if let Some(base_url) = config.base_url.clone() {
        builder = builder.base_url(base_url);
    }

    builder.finish()
}

fn update_service(
    config: &Config,
    pool: &database::Pool,
    registry: Arc<SourceRegistry>,
) -> Service {
    let notifier = notification(config);
    if notifier.is_empty() {
        info!("no notification target configured");
    }

    // one adapter call may issue several requests
    let fetch_timeout = config.request_timeout() * 2;
    let reconciler = CatalogReconciler::new(
        MangaRepositoryImpl::new(pool.clone()),
        ChapterRepositoryImpl::new(pool.clone()),
        TagRepositoryImpl::new(pool.clone()),
        Arc::new(notifier),
    )
    .with_fetch_timeout(fetch_timeout);

    UpdateService::new(
        SourceRepositoryImpl::new(pool.clone()),
        reconciler,
        registry,
        config.poll_interval(),
    )
    .with_fetch_timeout(fetch_timeout)
}

fn print_updates(summary: &PollSummary) {
    for update in &summary.updates {
        println!("{}\t{}", update.manga.title, update.chapter.chapter_number());
    }
}

async fn register_configured_sources(
    config: &Config,
    source_svc: &SourceService<SourceRepositoryImpl>,
    registry: &SourceRegistry,
) {
    for source_cfg in &config.sources {
        match source_svc.ensure_source(&source_cfg.url, &source_cfg.name).await {
            Ok(source) if !registry.contains(&source.url) => {
                warn!("no adapter for {}, it will be skipped", source.url)
            }
            Ok(_) => {}
            Err(e) => error!("failed to register {}: {e}", source_cfg.url),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logger();

    let opts: Opts = Opts::parse();
    let config = Config::open(opts.config)?;

    debug!("config: {:?}", config);

    let pool = database::establish_connection(&config.database_path, config.create_database).await?;
    let source_svc = SourceService::new(SourceRepositoryImpl::new(pool.clone()));

    let registry = Arc::new(builtin_registry(&HttpConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.request_timeout(),
    })?);
    info!(
        "adapters: {} (contract {})",
        registry.list().join(", "),
        koushin_lib::LIB_VERSION
    );

    match opts.command.unwrap_or(Command::Run) {
        Command::AddSource { url, name } => {
            let source = source_svc.register_source(&url, &name).await?;
            if !registry.contains(&source.url) {
                warn!("no adapter for {}, it will be skipped", source.url);
            }
            println!("{}\t{}\t{}", source.id, source.name, source.url);
        }
        Command::Sources => {
            for source in source_svc.get_sources().await? {
                let last_checked = source
                    .last_checked
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("{}\t{}\t{}\t{last_checked}", source.id, source.name, source.url);
            }
        }
        Command::Poll => {
            register_configured_sources(&config, &source_svc, &registry).await;

            let service = update_service(&config, &pool, registry.clone());
            let summary = match service.run_poll_cycle().await {
                Ok(summary) => summary,
                Err(e) => {
                    if let Some(partial) = e.partial_summary() {
                        print_updates(partial);
                    }
                    pool.close().await;
                    return Err(e.into());
                }
            };
            print_updates(&summary);
            info!(
                "polled {} sources, {} idle, {} failed, {} new manga, {} new chapters",
                summary.polled,
                summary.idle,
                summary.failed,
                summary.created,
                summary.updates.len()
            );
        }
        Command::Run => {
            register_configured_sources(&config, &source_svc, &registry).await;

            let service = Arc::new(update_service(&config, &pool, registry.clone()));
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let (mut chapter_updates, _command_tx, mut update_worker_handle) =
                worker::updates::start(config.update_interval, service, shutdown_rx);

            tokio::spawn(async move {
                loop {
                    match chapter_updates.recv().await {
                        Ok(update) => debug!(
                            "chapter update: {} {}",
                            update.manga.title,
                            update.chapter.chapter_number()
                        ),
                        Err(RecvError::Lagged(n)) => warn!("missed {n} chapter updates"),
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            tokio::select! {
                _ = &mut update_worker_handle => {
                    info!("update worker quit");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("ctrl+c signal");
                    let _ = shutdown_tx.send(true);
                    if let Err(e) = update_worker_handle.await {
                        error!("update worker failed: {e}");
                    }
                }
            }
        }
    }

    info!("closing database...");
    pool.close().await;

    Ok(())
}
