//! Moonsec Deobfuscator API Service
//!
//! Checks the toolchain, starts a background build when no prebuilt tool
//! exists, then serves the HTTP API.

use anyhow::{Context, Result};
use moonsec_api::{config::Config, create_router, AppState};
use moonsec_deobfuscator::Toolchain;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "moonsec_api=debug,moonsec_deobfuscator=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Moonsec Deobfuscator Server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let toolchain = Arc::new(Toolchain::new(config.toolchain_config()));

    // Check requirements
    if !toolchain.prerequisite_available().await {
        anyhow::bail!(
            "{} not found, install the .NET SDK 8.0+ (https://dotnet.microsoft.com/download)",
            config.build_program
        );
    }
    info!("{} is available", config.build_program);

    if !toolchain.tool_dir_exists() {
        anyhow::bail!(
            "MoonsecDeobfuscator folder not found, expected at {}",
            config.moonsec_path.display()
        );
    }
    info!("Moonsec path: {}", config.moonsec_path.display());

    // Requests arriving mid-build wait on this build instead of starting their own
    toolchain.spawn_startup_build();

    let app = create_router(AppState::new(toolchain).with_body_limit(config.max_body_bytes));

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Moonsec API listening on http://{}", config.api_address());
    info!("API endpoints:");
    info!("  POST /deobfuscate - Deobfuscate Lua code");
    info!("  GET /health - Check system health");
    info!("  GET /test - Smoke test");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
