//! # Primitivas de Sincronización
//! src/sync/mod.rs
//!
//! - `Semaphore`: semáforo contador que se puede cerrar (cola acotada)
//! - `Gate`: semáforo sin cierre (protocolo lectores/escritores del log)

pub mod gate;
pub mod semaphore;

pub use gate::Gate;
pub use semaphore::{Closed, Semaphore};
