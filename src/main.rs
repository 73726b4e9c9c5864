//! Balance monitor entry point.
//!
//! Spawns one independent balance watcher per compiled-in account and
//! stays resident while they run. Any fatal error in any watcher ends
//! the process with a non-zero status.

use std::sync::Arc;

use tracing::info;

use dot_balance_monitor::accounts::{watchlist, UnitScale};
use dot_balance_monitor::connectors::NodeClient;
use dot_balance_monitor::utils::init_telemetry;
use dot_balance_monitor::watchers::MonitorSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file found or error loading it: {}", e);
    }

    init_telemetry();

    let client = NodeClient::from_env();
    let scale = UnitScale::from_env();
    let accounts = watchlist();

    info!("Substrate balance monitor");
    info!("Node HTTP endpoint: {}", client.http_url());
    info!("Node WS endpoint:   {}", client.ws_url());
    info!("Plank per DOT:      {}", scale.plank_per_dot());
    for account in &accounts {
        info!("Watching {} ({})", account.label, account.address);
    }

    // The supervisor never returns Ok; whatever ends the first watcher
    // surfaces here and exits the process non-zero.
    let supervisor = MonitorSupervisor::new(Arc::new(client), scale, accounts);
    supervisor.run().await?;
    Ok(())
}
