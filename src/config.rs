//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración con soporte para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./pool_server --port 8080 --threads 4 --queue-size 16
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKER_THREADS=4 QUEUE_SIZE=16 ./pool_server
//! ```

use crate::error::ConfigError;
use clap::Parser;
use std::time::Duration;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "pool_server")]
#[command(about = "Servidor con pool fijo de workers, cola acotada y log compartido")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Pool y cola ===

    /// Número de workers del pool (fijo durante toda la ejecución)
    #[arg(short, long, default_value = "4", env = "WORKER_THREADS")]
    pub threads: usize,

    /// Capacidad de la cola: máximo de requests en vuelo
    #[arg(short = 'q', long = "queue-size", default_value = "16", env = "QUEUE_SIZE")]
    pub queue_size: usize,

    /// Milisegundos que un worker espera datos del cliente (0 = sin límite)
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Log ===

    /// Milisegundos que un escritor retiene el log (0 = sin demora)
    #[arg(long = "log-write-delay-ms", default_value = "0", env = "LOG_WRITE_DELAY_MS")]
    pub log_write_delay_ms: u64,

    /// Nivel de logging cuando RUST_LOG no está definido
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use pool_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Un pool o una cola de tamaño 0 son errores fatales
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        if self.queue_size == 0 {
            return Err(ConfigError::InvalidQueueSize);
        }

        Ok(())
    }

    /// Timeout de lectura/escritura de cada conexión aceptada
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        tracing::info!("🌐 Address:      {}", self.address());
        tracing::info!("👷 Workers:      {}", self.threads);
        tracing::info!("📥 Queue size:   {}", self.queue_size);
        tracing::info!("⏱️  Read timeout: {} ms", self.read_timeout_ms);
        if self.log_write_delay_ms > 0 {
            tracing::info!("📝 Log delay:    {} ms", self.log_write_delay_ms);
        }
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            threads: 4,
            queue_size: 16,
            read_timeout_ms: 5000,
            log_write_delay_ms: 0,
            log_level: "info".to_string(),
        }
    }
}
