//! # Log del Servidor
//! src/server_log/mod.rs
//!
//! Registro append-only de la actividad por request. Lo comparten todos los
//! workers (escriben) y el endpoint de estado (lee).
//!
//! ## Formato de lectura
//!
//! ```text
//! entrada 1\n
//! entrada 2\n
//! ...
//! ```

pub mod entry;
pub mod shared;

pub use entry::LogEntry;
pub use shared::{LogStats, SharedLog};
