use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::db;
use frontdesk::handlers;
use frontdesk::models::BusinessProfile;
use frontdesk::repl;
use frontdesk::services::ai::build_provider;
use frontdesk::services::ai::chain::ProviderChain;
use frontdesk::services::conversation::{ConversationEngine, EngineSettings};
use frontdesk::services::scheduling::OperatingRules;
use frontdesk::services::sessions::{SessionStore, SqliteSessionStore};
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;

    let profile = BusinessProfile::load(&config.business_profile_path)?;
    tracing::info!(
        clinic = %profile.clinic_info.name,
        services = profile.services.len(),
        "loaded business profile"
    );

    let conn = db::init_db(&config.database_url)?;
    let expired = db::queries::expire_old_sessions(&conn)?;
    if expired > 0 {
        tracing::info!("purged {expired} expired sessions");
    }
    let store = Arc::new(SqliteSessionStore::new(
        Arc::new(Mutex::new(conn)),
        config.session_ttl_minutes,
    ));

    let providers = config
        .providers
        .iter()
        .inspect(|p| tracing::info!(provider = %p.name, model = %p.model, "configured LLM provider"))
        .map(build_provider)
        .collect();
    let chain = Arc::new(ProviderChain::new(providers));

    let engine = ConversationEngine::new(
        Arc::clone(&chain),
        Arc::new(profile),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        EngineSettings {
            rules: OperatingRules {
                lead_time_minutes: config.booking_lead_minutes,
            },
            max_slot_retries: config.max_slot_retries,
        },
    );

    if std::env::args().nth(1).as_deref() == Some("chat") {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        return repl::run(&engine, &config.chat_caller_id, stdin, tokio::io::stdout()).await;
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        engine,
        chain,
        store,
    });
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
