use std::{process, sync::Arc, time::Duration};

use postroll::{
    application::{
        chrome::ChromeService,
        error::AppError,
        feed::{FeedService, FeedSettings},
        repos::{CommentsRepo, PostsRepo, TagsRepo},
        serializers::{MediaLocator, SerializeContext},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        media::MediaStore,
        telemetry,
    },
};
use tokio::{signal, sync::Notify};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let causes = match error {
        AppError::Infra(err) => err.chain(),
        other => vec![other.to_string()],
    };

    if dispatcher::has_been_set() {
        error!(error = %error, causes = ?causes, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, causes = ?causes, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let http_state = build_http_state(repositories, &settings);
    serve_http(&settings, http_state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::MissingDatabaseUrl)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::Connect)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> HttpState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();

    let chrome = Arc::new(ChromeService::new(&settings.site));
    let feed_settings = FeedSettings {
        serialize: SerializeContext {
            timezone: settings.site.timezone,
            media: MediaLocator::new(settings.media.url_prefix.clone()),
        },
        public_site_url: chrome.public_site_url().to_string(),
        site_title: settings.site.title.clone(),
    };
    let feed = Arc::new(FeedService::new(
        posts_repo,
        tags_repo,
        comments_repo,
        feed_settings,
    ));

    HttpState {
        feed,
        chrome,
        db: repositories,
        media: Arc::new(MediaStore::new(settings.media.directory.clone())),
    }
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::Bind)?;

    info!(
        target = "postroll::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()));

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = grace_expired(shutdown, grace) => {
            warn!(
                target = "postroll::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out, dropping open connections"
            );
        }
    }

    info!(target = "postroll::serve", "shutdown complete");
    Ok(())
}

/// Resolves once Ctrl+C or SIGTERM arrives, waking anyone waiting on `notify`.
async fn shutdown_signal(notify: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(target = "postroll::serve", "received Ctrl+C"),
        _ = terminate => info!(target = "postroll::serve", "received SIGTERM"),
    }

    notify.notify_one();
}

async fn grace_expired(notify: Arc<Notify>, grace: Duration) {
    notify.notified().await;
    tokio::time::sleep(grace).await;
}
