//! # Entrada del Log
//! src/server_log/entry.rs

use std::borrow::Cow;

/// Entrada inmutable del log
///
/// Solo se crea dentro de `SharedLog::append`; después de enlazada nadie
/// puede modificarla.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    data: Box<[u8]>,
}

impl LogEntry {
    pub(crate) fn new(data: Box<[u8]>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Largo del payload en bytes (sin el salto de línea)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload como texto (lossy si no es UTF-8)
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
