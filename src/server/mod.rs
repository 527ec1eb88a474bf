//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Capa externa del servidor:
//! 1. `dispatcher`: acepta conexiones y las encola (único productor)
//! 2. `handler`: procesa cada conexión dentro de un worker
//! 3. `tcp`: arma listener, cola, pool y log, y coordina el apagado

pub mod dispatcher;
pub mod handler;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use dispatcher::{ConnectionSource, DispatchSummary, Dispatcher};
pub use handler::LogRequestHandler;
pub use tcp::{Server, ServerReport, ShutdownHandle};
