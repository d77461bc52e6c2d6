//! Appointment Scheduling Server
//!
//! Axum server exposing the receptionist agent over REST and WebSocket, plus
//! the mock EHR API its tools call.

mod config;
mod ehr_routes;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider, SessionRegistry};
use agent_runtime::OpenAiProvider;
use ehr_scheduling::{
    EhrGateway, HttpEhrConfig, HttpEhrGateway, InMemoryEhr, RECEPTIONIST_PROMPT,
    SchedulingDispatcher, scheduling_tools,
};

use crate::config::ServerConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    // LLM provider
    let provider = Arc::new(OpenAiProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => tracing::info!(
            base_url = %provider.config().base_url,
            model = %config.generation.model,
            "Connected to LLM endpoint"
        ),
        Ok(false) | Err(_) => {
            tracing::warn!(
                base_url = %provider.config().base_url,
                "LLM endpoint not reachable - chat requests will fail"
            );
            tracing::warn!("Set LLM_BASE_URL and OPENAI_API_KEY in .env");
        }
    }

    // EHR backend; tools use the remote API when EHR_BASE_URL is set
    let ehr = Arc::new(InMemoryEhr::new());
    let gateway: Arc<dyn EhrGateway> = match HttpEhrConfig::from_env() {
        Some(remote) => {
            tracing::info!(base_url = %remote.base_url, "Tools use remote EHR API");
            Arc::new(HttpEhrGateway::new(remote)?)
        }
        None => ehr.clone(),
    };

    let tools = scheduling_tools()?;
    tracing::info!(count = tools.len(), tools = ?tools.names(), "Registered tools");

    let factory = AgentBuilder::new()
        .provider(provider.clone())
        .dispatcher(Arc::new(SchedulingDispatcher::new(gateway)))
        .tools(tools)
        .system_prompt(RECEPTIONIST_PROMPT)
        .generation(config.generation.clone())
        .build_factory()?;

    let state = AppState {
        provider,
        sessions: Arc::new(SessionRegistry::new(factory)),
        ehr,
        fragment_delay: config.fragment_delay,
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("Scheduling server running on http://{}", config.bind_addr);
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  POST /api/chat                  - Send message");
    tracing::info!("  POST /api/chat/greeting         - Opening greeting");
    tracing::info!("  POST /api/chat/reset            - Reset conversation");
    tracing::info!("  GET  /api/chat/history/{{id}}     - Conversation history");
    tracing::info!("  GET  /api/chat/sessions         - Live sessions");
    tracing::info!("  GET  /api/chat/stream           - WebSocket chat");
    tracing::info!("  *    /api/locations, /api/clinicians, /api/availability, /api/patients, /api/appointments");

    axum::serve(listener, app).await?;

    Ok(())
}
