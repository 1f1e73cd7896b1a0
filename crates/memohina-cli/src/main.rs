//! Memohina command-line interface
//!
//! Captures reasoning traces and exports them as snapshots.
//!
//! ```bash
//! memohina record --user alice --reasoning "..." --response "..."
//! memohina think --user alice
//! memohina export --user alice
//! memohina serve < events.ndjson
//! memohina config show
//! ```
//!
//! `serve` is the long-running mode: it reads NDJSON events from stdin,
//! flushes records from per-user activity loops and reloads the config file
//! when it changes.

mod args;
mod commands;
mod console;
mod logging;
mod router;

use args::Cli;
use clap::Parser;
use memohina_core::error::HinaResult;


#[tokio::main]
async fn main() -> HinaResult<()> {
    let cli = Cli::parse();
    router::route(cli).await
}
