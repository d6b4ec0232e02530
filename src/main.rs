// BlackBook Settlement Engine - Main Entry Point

use blackbook_settlement::app_state::{lock, AppState};
use blackbook_settlement::config::Config;
use blackbook_settlement::routes::router;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    tracing_subscriber::fmt().with_max_level(config.log_level).init();

    info!("═══════════════════════════════════");
    info!("   🏦 BlackBook Settlement Engine");
    info!("═══════════════════════════════════");

    let bind_addr = config.bind_addr;
    let state = match AppState::new(config) {
        Ok(app_state) => app_state.shared(),
        Err(e) => {
            error!(error = %e, "❌ Failed to initialize engine");
            std::process::exit(1);
        }
    };
    let shutdown_state = state.clone();
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%bind_addr, error = %e, "❌ Failed to bind");
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", bind_addr);
    info!("📋 Endpoints:");
    info!("   POST /instructions                          - Submit a signed instruction");
    info!("   POST /airdrop                               - Fund an owner with base currency");
    info!("   GET  /balance/:address                      - Account balance");
    info!("   GET  /accounts/:owner/:mint                 - Associated account");
    info!("   GET  /escrows/:payer/:counterparty/:mint    - Escrow state and vault");
    info!("   GET  /markets/:beneficiary/:token_mint      - Market reserves and price");
    info!("   GET  /markets/:beneficiary/:token_mint/quote - Swap preview");
    info!("   GET  /ledger                                - Recent committed instructions");

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "❌ Failed to listen for shutdown signal");
            return;
        }
        info!("🛑 Shutdown signal received, saving state...");
        match lock(&shutdown_state).save_to_disk() {
            Ok(()) => info!("✅ State saved successfully"),
            Err(e) => error!(error = %e, "❌ Failed to save state"),
        }
        info!("👋 Goodbye!");
        std::process::exit(0);
    });

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "❌ Server error");
    }
}
