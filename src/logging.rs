// Logging setup shared by the binaries. Diagnostics go to stderr so that
// stdout only carries the listing. `RUST_LOG` overrides the default level,
// e.g. `RUST_LOG=scw_snippets=debug` to see every request.

use tracing_subscriber::EnvFilter;

pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
