use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Instala el subscriber global de `tracing`. `RUST_LOG` pisa el nivel configurado.
/// Si ya había uno instalado no hace nada.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
