//! # Estadísticas por Worker
//! src/workers/stats.rs
//!
//! Cada worker tiene su propio contador; ningún otro thread lo toca, así
//! que no lleva sincronización. La agregación queda para quien los reciba
//! en `WorkerPool::join`.

use serde::Serialize;

/// Categoría de un request, para los contadores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Contenido estático
    Static,
    /// Contenido generado (ej: el propio log)
    Dynamic,
    /// POST
    Post,
}

/// Contadores privados de un worker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Identificador 1-based del worker
    pub id: usize,
    pub static_requests: u64,
    pub dynamic_requests: u64,
    pub post_requests: u64,
    pub total_requests: u64,
}

impl WorkerStats {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Registra un request de la categoría dada
    pub fn record(&mut self, kind: RequestKind) {
        match kind {
            RequestKind::Static => self.static_requests += 1,
            RequestKind::Dynamic => self.dynamic_requests += 1,
            RequestKind::Post => self.post_requests += 1,
        }
        self.total_requests += 1;
    }
}
