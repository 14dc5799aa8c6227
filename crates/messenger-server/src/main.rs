use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use messenger_api::sms::{DisabledGateway, SmsGateway, TwilioConfig, TwilioGateway};
use messenger_api::state::AppStateInner;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:4200,http://frontend:4200";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "messenger=debug,messenger_api=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("MESSENGER_DB_PATH").unwrap_or_else(|_| "messenger.db".into());
    let host = std::env::var("MESSENGER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MESSENGER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let cors_origins =
        std::env::var("MESSENGER_CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into());

    // Init database
    let db = messenger_db::Database::open(&PathBuf::from(&db_path))?;

    let sms = sms_gateway_from_env()?;
    let state = AppStateInner::new(db, sms);

    let origins = cors_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = messenger_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Messenger API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Twilio when all three credentials are present, otherwise a gateway that
/// refuses every send.
fn sms_gateway_from_env() -> anyhow::Result<Arc<dyn SmsGateway>> {
    let account_sid = std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default();
    let auth_token = std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default();
    let from_number = std::env::var("TWILIO_PHONE_NUMBER").unwrap_or_default();

    if account_sid.is_empty() || auth_token.is_empty() || from_number.is_empty() {
        warn!("Twilio credentials are not configured; outgoing messages will be rejected");
        return Ok(Arc::new(DisabledGateway));
    }

    let config = TwilioConfig {
        api_base: std::env::var("TWILIO_API_BASE")
            .unwrap_or_else(|_| "https://api.twilio.com".into()),
        account_sid,
        auth_token,
        from_number,
        country_code: std::env::var("SMS_COUNTRY_CODE").unwrap_or_else(|_| "+1".into()),
        timeout: Duration::from_secs(
            std::env::var("TWILIO_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
        ),
    };
    info!("SMS gateway: Twilio ({}, timeout {:?})", config.api_base, config.timeout);
    Ok(Arc::new(TwilioGateway::new(config)?))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
