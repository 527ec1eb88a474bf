//! # Logging
//! src/telemetry.rs
//!
//! Inicializa `tracing` con salida a stderr. `RUST_LOG` tiene prioridad
//! sobre el nivel por defecto de la configuración.

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global.
///
/// Llamarlo más de una vez (por ejemplo desde tests) no es un error: el
/// primer subscriber instalado se mantiene.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
