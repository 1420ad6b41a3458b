//! Logger setup for hosts that have none of their own.

/// Install the global `env_logger`, filtered at `info` unless `RUST_LOG`
/// overrides it. Call once before generation; library code itself only
/// emits through the `log` macros and never installs a logger.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
