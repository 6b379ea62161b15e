//! Vector Query gRPC Service - Entry Point
//!
//! Minimal entry point that delegates to the server module. The server builds
//! its own runtime so the blocking pool can be sized from configuration.

fn main() -> eyre::Result<()> {
    faiss_server::run()
}
