//! # Cola de Requests
//! src/queue/mod.rs
//!
//! Cola acotada que desacopla el loop de accept del pool de workers.
//! La capacidad es el único mecanismo de control de carga: cuando está
//! llena el dispatcher se bloquea (backpressure), nunca se rechaza trabajo.

pub mod bounded;

pub use bounded::{BoundedQueue, QueueStats, SlotRelease, SlotReservation};
