//! tracing-subscriber setup for binaries built on the SDK.

use crate::config::{AppConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set: the SDK and every extra target at
/// `level`, tower-http at info.
pub fn default_directives(level: &str, targets: &[&str]) -> String {
    let mut directives = vec![format!("resource_sdk={level}")];
    directives.extend(targets.iter().map(|t| format!("{t}={level}")));
    directives.push("tower_http=info".to_string());
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &AppConfig) {
    init_tracing_for(config, &[]);
}

/// Like [`init_tracing`], also enabling `targets` (usually the binary's own
/// crate name) at the configured level. A second install is ignored.
pub fn init_tracing_for(config: &AppConfig, targets: &[&str]) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level, targets)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Console => builder.try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
