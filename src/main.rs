//! NegamaxChess - UCI Chess Engine
//!
//! Usage:
//!     negamax_chess
//!
//! The engine reads UCI commands from stdin and writes responses to stdout.
//! Diagnostics go to stderr; set `RUST_LOG=debug` to see search progress.

use negamax_chess::uci::UCIProtocol;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut uci = UCIProtocol::new();
    uci.run();
}
