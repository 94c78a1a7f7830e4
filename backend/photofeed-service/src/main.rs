use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use cache_store::{CacheStore, RedisCacheStore};
use photofeed_service::db::{self, PgCommentStore, PgUserStore};
use photofeed_service::services::{CommentAggregator, FeedAssembler, IdentityResolver};
use photofeed_service::session::SessionStore;
use photofeed_service::{handlers, metrics, Config};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health(pool: web::Data<sqlx::PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "photofeed-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "photofeed-service"
        })),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting photofeed-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Database pool and migrations
    let pool = match db::create_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("migrations failed: {e}")))?;

    // Shared cache client
    let cache: Arc<dyn CacheStore> = Arc::new(
        RedisCacheStore::connect(&config.cache.url)
            .await
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize cache connection: {e}"),
                )
            })?,
    );

    tracing::info!("Connected to database and cache");

    // Core services with explicit dependencies
    let resolver = IdentityResolver::new(
        cache.clone(),
        Arc::new(PgUserStore::new(pool.clone())),
        Duration::from_secs(config.cache.user_ttl_secs),
    );
    let aggregator = CommentAggregator::new(
        cache.clone(),
        Arc::new(PgCommentStore::new(pool.clone())),
        Duration::from_secs(config.cache.comment_ttl_secs),
    );
    let assembler = FeedAssembler::new(Arc::new(aggregator));
    let sessions = SessionStore::new(cache.clone(), Duration::from_secs(config.session.ttl_secs));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let pool_data = web::Data::new(pool);
    let resolver_data = web::Data::new(resolver);
    let assembler_data = web::Data::new(assembler);
    let sessions_data = web::Data::new(sessions);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(resolver_data.clone())
            .app_data(assembler_data.clone())
            .app_data(sessions_data.clone())
            .app_data(config_data.clone())
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/health", web::get().to(health))
            .route("/", web::get().to(handlers::feed::get_feed))
            .route("/posts", web::get().to(handlers::feed::get_posts))
            .route("/posts", web::post().to(handlers::posts::create_post))
            .route("/posts/{id}", web::get().to(handlers::posts::get_post))
            .route("/comments", web::post().to(handlers::comments::create_comment))
            .route("/register", web::post().to(handlers::auth::register))
            .route("/login", web::post().to(handlers::auth::login))
            .route("/logout", web::post().to(handlers::auth::logout))
            .route("/admin/banned", web::get().to(handlers::admin::get_banned))
            .route("/admin/banned", web::post().to(handlers::admin::post_banned))
            .route("/@{account_name}", web::get().to(handlers::users::get_profile))
    })
    .bind(&bind_address)?
    .workers(4)
    .run()
    .await
}
