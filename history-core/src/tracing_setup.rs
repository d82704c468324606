//! Process-wide tracing setup (spec §A.1): a single `init_tracing` call
//! from the binary entry point, after which `tracing::{debug,info,warn,error}!`
//! call sites across the workspace reach one subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `level_hint` (e.g. `"info"`, `"debug"`) when the env var is unset.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level_hint: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_hint));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_does_not_panic_on_repeated_calls() {
        init_tracing("info");
        init_tracing("debug");
    }
}
