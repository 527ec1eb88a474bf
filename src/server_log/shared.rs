//! # Log Compartido con Prioridad de Escritores
//! src/server_log/shared.rs
//!
//! Log append-only protegido con la solución "segundo problema de
//! lectores/escritores": si hay un escritor esperando, ningún lector nuevo
//! entra hasta que ese escritor haya escrito.
//!
//! ## Protocolo
//!
//! ```text
//! Lector:   read_try ─► readers++ (el 1º toma resource) ─► suelta read_try
//!           ... lee ...
//!           readers-- (el último suelta resource)
//!
//! Escritor: writers++ (el 1º cierra read_try) ─► resource
//!           ... escribe ...
//!           suelta resource ─► writers-- (el último abre read_try)
//! ```
//!
//! Los lectores pueden quedar esperando indefinidamente si llegan
//! escritores sin pausa. Es el costo conocido de esta variante.
//!
//! Los accesos se modelan como guards (`ReadAccess`/`WriteAccess`): el
//! protocolo de salida corre en `Drop`, incluso si la sección crítica falla.

use super::entry::LogEntry;
use crate::error::LogError;
use crate::sync::Gate;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

/// Datos del log: solo se tocan con acceso concedido por el protocolo
#[derive(Default)]
struct LogBook {
    entries: Vec<LogEntry>,
    total_length: usize,
}

/// Log compartido entre todos los workers
pub struct SharedLog {
    /// Compuerta de entrada: el primer escritor en espera la cierra
    read_try: Gate,

    /// Acceso exclusivo (un escritor o el grupo de lectores)
    resource: Gate,

    /// Lectores activos
    readers: Mutex<usize>,

    /// Escritores activos o esperando
    writers: Mutex<usize>,

    /// Entradas. El `RwLock` solo provee la celda; la política de acceso
    /// la impone el protocolo, así que nunca hay contención real.
    book: RwLock<LogBook>,

    closed: AtomicBool,

    /// Tiempo que un escritor retiene el acceso exclusivo
    write_delay: Duration,
}

impl SharedLog {
    /// Crea un log vacío
    pub fn new() -> Self {
        Self::with_write_delay(Duration::ZERO)
    }

    /// Crea un log cuyos escritores retienen el acceso exclusivo durante
    /// `write_delay` antes de enlazar la entrada
    pub fn with_write_delay(write_delay: Duration) -> Self {
        Self {
            read_try: Gate::new(1),
            resource: Gate::new(1),
            readers: Mutex::new(0),
            writers: Mutex::new(0),
            book: RwLock::new(LogBook::default()),
            closed: AtomicBool::new(false),
            write_delay,
        }
    }

    /// Agrega una entrada al final del log.
    ///
    /// Bloquea hasta obtener acceso exclusivo. Un payload vacío se rechaza
    /// sin bloquear; si no hay memoria la entrada no se enlaza.
    pub fn append(&self, payload: impl AsRef<[u8]>) -> Result<(), LogError> {
        let payload = payload.as_ref();

        if payload.is_empty() {
            return Err(LogError::EmptyPayload);
        }
        if self.is_closed() {
            return Err(LogError::Closed);
        }

        // La copia se hace antes de pedir acceso exclusivo
        let mut data = Vec::new();
        data.try_reserve_exact(payload.len())
            .map_err(|_| LogError::ResourceExhaustion {
                operation: "appending",
                bytes: payload.len(),
            })?;
        data.extend_from_slice(payload);
        let entry = LogEntry::new(data.into_boxed_slice());

        let _access = self.write_access();

        if self.is_closed() {
            return Err(LogError::Closed);
        }

        if !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }

        let mut book = self.book.write().unwrap_or_else(PoisonError::into_inner);
        if book.entries.try_reserve(1).is_err() {
            return Err(LogError::ResourceExhaustion {
                operation: "linking entry",
                bytes: entry.len(),
            });
        }
        book.total_length += entry.len();
        book.entries.push(entry);

        tracing::trace!(entries = book.entries.len(), "log entry appended");
        Ok(())
    }

    /// Retorna el contenido completo: cada entrada seguida de `\n`, en
    /// orden de inserción.
    ///
    /// Varios lectores pueden leer a la vez; ninguno mientras un escritor
    /// tenga (o espere) el log.
    pub fn read(&self) -> Result<Vec<u8>, LogError> {
        self.with_book(|book| {
            let size = book.total_length + book.entries.len();

            let mut out = Vec::new();
            out.try_reserve_exact(size)
                .map_err(|_| LogError::ResourceExhaustion {
                    operation: "reading",
                    bytes: size,
                })?;

            for entry in &book.entries {
                out.extend_from_slice(entry.as_bytes());
                out.push(b'\n');
            }
            Ok(out)
        })
    }

    /// Como `read`, pero como texto
    pub fn read_string(&self) -> Result<String, LogError> {
        self.read()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Ejecuta `f` con acceso compartido sobre las entradas
    pub fn inspect<R>(&self, f: impl FnOnce(&[LogEntry]) -> R) -> R {
        self.with_book(|book| f(&book.entries))
    }

    /// Copia de las entradas actuales
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inspect(|entries| entries.to_vec())
    }

    pub fn entry_count(&self) -> usize {
        self.with_book(|book| book.entries.len())
    }

    /// Suma de los largos de todas las entradas (sin saltos de línea)
    pub fn total_length(&self) -> usize {
        self.with_book(|book| book.total_length)
    }

    /// Lectores dentro del log en este momento (no bloquea)
    pub fn active_readers(&self) -> usize {
        *lock(&self.readers)
    }

    /// Escritores escribiendo o esperando (no bloquea)
    pub fn waiting_writers(&self) -> usize {
        *lock(&self.writers)
    }

    /// Snapshot de estadísticas (toma acceso compartido)
    pub fn stats(&self) -> LogStats {
        let (entries, bytes) = self.with_book(|book| (book.entries.len(), book.total_length));

        LogStats {
            entries,
            bytes,
            active_readers: self.active_readers(),
            waiting_writers: self.waiting_writers(),
            closed: self.is_closed(),
        }
    }

    /// Cierra el log: los `append` posteriores fallan de inmediato.
    /// Las lecturas siguen funcionando.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn with_book<R>(&self, f: impl FnOnce(&LogBook) -> R) -> R {
        let _access = self.read_access();
        let book = self.book.read().unwrap_or_else(PoisonError::into_inner);
        f(&book)
    }

    fn read_access(&self) -> ReadAccess<'_> {
        self.read_try.acquire();
        {
            let mut readers = lock(&self.readers);
            *readers += 1;
            if *readers == 1 {
                self.resource.acquire();
            }
        }
        self.read_try.release();

        ReadAccess { log: self }
    }

    fn write_access(&self) -> WriteAccess<'_> {
        {
            let mut writers = lock(&self.writers);
            *writers += 1;
            if *writers == 1 {
                self.read_try.acquire();
            }
        }
        self.resource.acquire();

        WriteAccess { log: self }
    }
}

impl Default for SharedLog {
    fn default() -> Self {
        Self::new()
    }
}

struct ReadAccess<'a> {
    log: &'a SharedLog,
}

impl Drop for ReadAccess<'_> {
    fn drop(&mut self) {
        let mut readers = lock(&self.log.readers);
        *readers -= 1;
        if *readers == 0 {
            self.log.resource.release();
        }
    }
}

struct WriteAccess<'a> {
    log: &'a SharedLog,
}

impl Drop for WriteAccess<'_> {
    fn drop(&mut self) {
        self.log.resource.release();

        let mut writers = lock(&self.log.writers);
        *writers -= 1;
        if *writers == 0 {
            self.log.read_try.release();
        }
    }
}

fn lock(counter: &Mutex<usize>) -> MutexGuard<'_, usize> {
    counter.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Estadísticas del log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub entries: usize,
    pub bytes: usize,
    pub active_readers: usize,
    pub waiting_writers: usize,
    pub closed: bool,
}
