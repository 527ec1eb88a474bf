//! # Tipos de Error
//! src/error.rs
//!
//! Errores de cada componente del núcleo. Ninguno aborta el proceso:
//! todos se propagan como `Result` hacia quien llamó.

use thiserror::Error;

/// Errores de la cola acotada
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// La capacidad debe ser >= 1
    #[error("queue capacity must be >= 1 (got {capacity})")]
    InvalidCapacity { capacity: usize },

    /// La cola fue cerrada: no se aceptan más items
    #[error("queue is closed")]
    Closed,

    /// No se pudo reservar memoria para un nuevo item
    #[error("out of memory while enqueuing (pending: {pending})")]
    ResourceExhaustion { pending: usize },
}

/// Errores del log compartido
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Payload vacío
    #[error("log entry payload must not be empty")]
    EmptyPayload,

    /// El log fue cerrado: no se aceptan más entradas
    #[error("server log is closed")]
    Closed,

    /// No se pudo reservar memoria para la entrada o para la lectura
    #[error("out of memory while {operation} ({bytes} bytes)")]
    ResourceExhaustion { operation: &'static str, bytes: usize },
}

/// Errores del pool de workers
#[derive(Debug, Error)]
pub enum PoolError {
    /// El pool necesita al menos un worker
    #[error("worker pool size must be >= 1 (got {size})")]
    InvalidSize { size: usize },

    /// El sistema operativo no pudo crear el thread
    #[error("failed to spawn worker {id}: {source}")]
    Spawn {
        id: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Errores reportados por el handler externo de requests
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("I/O error while handling request: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to record activity: {0}")]
    Log(#[from] LogError),

    #[error("{0}")]
    Other(String),
}

/// Errores de configuración (fatales al arrancar)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker threads must be >= 1")]
    InvalidThreads,

    #[error("queue size must be >= 1")]
    InvalidQueueSize,
}

/// Errores del servidor completo
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_messages() {
        let err = QueueError::InvalidCapacity { capacity: 0 };
        assert_eq!(err.to_string(), "queue capacity must be >= 1 (got 0)");
        assert_eq!(QueueError::Closed.to_string(), "queue is closed");
    }

    #[test]
    fn test_log_error_messages() {
        let err = LogError::ResourceExhaustion { operation: "appending", bytes: 12 };
        assert_eq!(err.to_string(), "out of memory while appending (12 bytes)");
    }

    #[test]
    fn test_handler_error_from_log_error() {
        let err: HandlerError = LogError::Closed.into();
        assert!(err.to_string().contains("server log is closed"));
    }

    #[test]
    fn test_server_error_from_config() {
        let err: ServerError = ConfigError::InvalidThreads.into();
        assert!(err.to_string().contains("worker threads"));
    }
}
