// src/main.rs

use std::{sync::Arc, time::Duration};

use dotenvy::dotenv;
use mastery::{
    config::Config,
    media::{DisabledMediaStore, MediaStore, S3MediaStore},
    models::user::NewUser,
    routes,
    state::AppState,
    store::{PgStore, RecordStore, StoreError},
    utils::{access::Role, hash::hash_password},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e.into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    let store: Arc<dyn RecordStore> = Arc::new(PgStore::new(pool));

    if let Err(e) = seed_instructor(store.as_ref(), &config).await {
        tracing::error!("Failed to seed instructor: {}", e);
    }

    let media: Arc<dyn MediaStore> = match S3MediaStore::from_config(&config.s3).await {
        Some(s3) => {
            tracing::info!(bucket = %config.media_bucket, "Media signing enabled");
            Arc::new(s3)
        }
        None => {
            tracing::warn!("S3 credentials not set; question media will not be served");
            Arc::new(DisabledMediaStore)
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        store,
        media,
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Creates the configured instructor account on first boot.
async fn seed_instructor(
    store: &dyn RecordStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(username), Some(password)) = (
        &config.seed_instructor_username,
        &config.seed_instructor_password,
    ) else {
        return Ok(());
    };

    if store.find_user_by_username(username).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding instructor: {}", username);
    let result = store
        .insert_user(NewUser {
            username: username.clone(),
            password_hash: hash_password(password)?,
            role: Role::Instructor.as_str().to_string(),
        })
        .await;

    match result {
        Ok(_) => tracing::info!("Instructor created successfully."),
        // Created concurrently by another instance.
        Err(StoreError::Conflict(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
