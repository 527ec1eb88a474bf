//! # Sistema de Workers
//! src/workers/mod.rs
//!
//! Pool fijo de threads que consume la cola de requests:
//! - `item`: unidad de trabajo con su hora de llegada
//! - `stats`: contadores privados de cada worker
//! - `pool`: creación del pool, loop de cada worker y trait del handler

pub mod item;
pub mod pool;
pub mod stats;

pub use item::{wait_duration, wait_micros, WorkItem};
pub use pool::{RequestContext, RequestHandler, WorkerPool};
pub use stats::{RequestKind, WorkerStats};
