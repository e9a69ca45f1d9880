//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use auth::{PgAuthRepository, users_router};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{self, Method, header},
};
use platform::mail::{LogMailer, MailBackend, SmtpMailer};
use platform::storage::{BlobBackend, FsBlobStore, S3BlobStore};
use posts::{AttachmentManager, PgPostRepository, PostsConfig, posts_router};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ApiConfig, FilesBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,posts=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Post attachments and ID documents, never the same store
    let blobs = blob_backend(
        &config.files,
        format!("{}/posts/get-file", config.public_base_url),
    )
    .await?;
    tracing::info!(backend = blobs.name(), "Post file storage ready");
    let blobs = Arc::new(blobs);

    let sweeper = AttachmentManager::new(
        Arc::new(PgPostRepository::new(pool.clone())),
        blobs.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = sweeper.sweep_orphans().await {
            tracing::warn!(error = %e, "Orphaned post file sweep failed");
        }
    });

    let id_documents = blob_backend(
        &config.id_documents,
        format!("{}/users/id-documents", config.public_base_url),
    )
    .await?;
    tracing::info!(backend = id_documents.name(), "ID document storage ready");
    let id_documents = Arc::new(id_documents);

    // Outbound mail
    let mailer = match &config.smtp {
        Some(smtp) => MailBackend::Smtp(SmtpMailer::new(
            &smtp.host,
            smtp.credentials.clone(),
            &smtp.from,
        )?),
        None => {
            tracing::warn!("SMTP_HOST not set, rejection notices will only be logged");
            MailBackend::Log(LogMailer)
        }
    };
    let mailer = Arc::new(mailer);

    let auth_config = Arc::new(config.auth.clone());
    let posts_config = Arc::new(if cfg!(debug_assertions) {
        PostsConfig::development()
    } else {
        PostsConfig::default()
    });

    // CORS configuration
    let allow_origin = match &config.frontend_origins {
        None => AllowOrigin::any(),
        Some(origins) => {
            let allowed: Vec<http::HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            AllowOrigin::list(allowed)
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    // Build router
    let app = Router::new()
        .nest(
            "/users",
            users_router(
                PgAuthRepository::new(pool.clone()),
                id_documents,
                auth_config.clone(),
            ),
        )
        .nest(
            "/posts",
            posts_router(
                PgPostRepository::new(pool.clone()),
                PgAuthRepository::new(pool.clone()),
                blobs,
                mailer,
                auth_config,
                posts_config,
            ),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.listen_addr);

    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// `served_url` is where a local directory is reachable over HTTP.
async fn blob_backend(files: &FilesBackend, served_url: String) -> anyhow::Result<BlobBackend> {
    Ok(match files {
        FilesBackend::Local { path } => {
            let store = FsBlobStore::new(path.clone(), served_url);
            store.ensure_root().await?;
            BlobBackend::Fs(store)
        }
        FilesBackend::S3 {
            bucket,
            key_prefix,
            public_url,
        } => BlobBackend::S3(
            S3BlobStore::from_env(bucket.clone(), key_prefix.clone(), public_url.clone()).await,
        ),
    })
}
