// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CoopMob - WhatsApp intake funnel for the delivery cooperative.
//!
//! This is the binary entry point. `serve` runs the webhook funnel server,
//! `panel` runs the recruiting-panel API, and `flowkey` provisions the
//! keypair artifacts the encrypted-flow endpoint registration needs.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod flowkey;
mod panel;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coopmob_flowkey::SignInput;

/// CoopMob - WhatsApp intake funnel for the delivery cooperative.
#[derive(Parser, Debug)]
#[command(name = "coopmob", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the WhatsApp webhook funnel server.
    Serve,
    /// Start the recruiting-panel API server.
    Panel {
        /// Address to bind the panel to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind the panel to.
        #[arg(long, default_value_t = 8090)]
        port: u16,
    },
    /// Generate and self-sign the encrypted-flow keypair artifacts.
    Flowkey {
        /// Directory the key artifacts are written to.
        #[arg(long, default_value = "secrets")]
        out: PathBuf,
        /// Which public artifact the signature covers.
        #[arg(long = "sign-input", default_value_t = SignInput::Raw)]
        sign_input: SignInput,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Bad config is a startup error for every subcommand, flowkey included.
    let config = coopmob_config::load_and_validate().unwrap_or_else(|errors| {
        coopmob_config::render_errors(&errors);
        std::process::exit(1)
    });

    init_tracing(&config.server.log_level);

    let result = match cli.command {
        Some(Commands::Panel { host, port }) => panel::run_panel(&config, host, port).await,
        Some(Commands::Flowkey { out, sign_input }) => flowkey::run_flowkey(&out, sign_input),
        Some(Commands::Serve) | None => serve::run_serve(config).await,
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

/// Tracing setup: `RUST_LOG` wins, otherwise the configured level applies to
/// this workspace and everything else stays at `warn`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coopmob={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn global_allocator_is_jemalloc() {
        // Epoch advancement only works when jemalloc actually backs the
        // allocator; the system allocator makes these calls fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "expected a live jemalloc heap");
    }

    #[test]
    fn defaults_stand_alone_without_a_config_file() {
        let config = coopmob_config::load_and_validate().expect("defaults should validate");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
    }
}
