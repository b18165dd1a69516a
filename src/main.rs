use std::process;
use std::sync::Arc;

use mercato::{
    application::{
        customers::CustomerService,
        error::AppError,
        messages::MessageCatalog,
        products::ProductService,
        repos::{CustomersRepo, ProductsRepo, SalesRepo},
        sales::SaleService,
    },
    cache::{CacheBackend, CacheConfig, CacheStore, MemoryBackend, RedisBackend},
    config::{self, Settings},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, ApiTokens},
        telemetry,
    },
};
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
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect_repositories(settings: &Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

/// Build the cache store for the configured backend.
///
/// A Redis pool that cannot be constructed downgrades to the disabled
/// store: the service must keep answering from Postgres when the cache
/// side channel is unavailable.
fn build_cache(settings: &Settings) -> CacheStore {
    let config = CacheConfig::from(&settings.cache);
    if !config.enabled {
        info!("read cache disabled by configuration");
        return CacheStore::disabled();
    }

    match config.url.as_deref() {
        Some(url) => match RedisBackend::connect(url, config.pool_size) {
            Ok(backend) => {
                info!("read cache backed by redis");
                let backend: Arc<dyn CacheBackend> = Arc::new(backend);
                CacheStore::new(backend, config)
            }
            Err(err) => {
                warn!(error = %err, "failed to initialize redis cache; continuing without cache");
                CacheStore::disabled()
            }
        },
        None => {
            info!("read cache backed by in-process store");
            let backend: Arc<dyn CacheBackend> = Arc::new(MemoryBackend::new());
            CacheStore::new(backend, config)
        }
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let repositories = connect_repositories(&settings).await?;
    let cache = build_cache(&settings);

    if settings.auth.api_tokens.is_empty() {
        warn!("no API tokens configured; every authenticated route will reject requests");
    }

    let customers_repo: Arc<dyn CustomersRepo> = repositories.clone();
    let products_repo: Arc<dyn ProductsRepo> = repositories.clone();
    let sales_repo: Arc<dyn SalesRepo> = repositories.clone();

    let state = ApiState {
        customers: Arc::new(CustomerService::new(customers_repo, cache.clone())),
        products: Arc::new(ProductService::new(products_repo, cache.clone())),
        sales: Arc::new(SaleService::new(sales_repo, cache.clone())),
        tokens: Arc::new(ApiTokens::new(settings.auth.api_tokens.clone())),
        messages: Arc::new(MessageCatalog::new()),
        cache,
        db: Some(repositories),
    };

    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(addr = %settings.server.addr, "mercato listening");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: Settings) -> Result<(), AppError> {
    let repositories = connect_repositories(&settings).await?;
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!("migrations applied");
    Ok(())
}
