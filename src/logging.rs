//! Logger setup for the binary.
//!
//! The crate logs through the `log` facade. `main` installs `env_logger` once,
//! filtered by `--log`, then `RUST_LOG`, then [`DEFAULT_FILTER`].

use std::sync::Once;

/// Used when neither `--log` nor `RUST_LOG` names a filter. Keeps wgpu quiet.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Pick the filter directive. An explicit filter wins over the environment,
/// and blank values are skipped.
pub fn resolve_filter(explicit: Option<&str>, env: Option<&str>) -> String {
    [explicit, env]
        .into_iter()
        .flatten()
        .find(|filter| !filter.trim().is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install `env_logger` with the resolved filter. Later calls are ignored.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let env = std::env::var("RUST_LOG").ok();
        let spec = resolve_filter(filter, env.as_deref());
        env_logger::Builder::new().parse_filters(&spec).init();
        log::debug!("log filter: {spec}");
    });
}
