//! # Dispatcher (loop de accept)
//! src/server/dispatcher.rs
//!
//! Único productor de la cola. Por cada conexión:
//!
//! ```text
//! reserve (bloquea si la cola está llena) ─► accept ─► marca llegada ─► publish
//! ```
//!
//! El slot se reserva ANTES de aceptar: con la cola llena no se acepta
//! ninguna conexión más. No existe camino de rechazo por sobrecarga.

use crate::error::QueueError;
use crate::queue::BoundedQueue;
use crate::workers::WorkItem;
use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

/// Fuente de conexiones
pub trait ConnectionSource {
    type Connection: Send + 'static;

    /// Bloquea hasta la próxima conexión.
    ///
    /// `None` indica que la fuente se agotó y el dispatcher debe terminar.
    fn next_connection(&mut self) -> Option<io::Result<Self::Connection>>;
}

impl ConnectionSource for TcpListener {
    type Connection = TcpStream;

    fn next_connection(&mut self) -> Option<io::Result<TcpStream>> {
        Some(self.accept().map(|(stream, _)| stream))
    }
}

/// Listener que fija timeouts de I/O en cada conexión aceptada.
///
/// Un cliente que conecta y no envía nada no puede retener a un worker
/// (ni bloquear el apagado) más allá de `timeout`.
pub struct TimeoutListener {
    listener: TcpListener,
    timeout: Option<Duration>,
}

impl TimeoutListener {
    pub fn new(listener: TcpListener, timeout: Option<Duration>) -> Self {
        Self { listener, timeout }
    }
}

impl ConnectionSource for TimeoutListener {
    type Connection = TcpStream;

    fn next_connection(&mut self) -> Option<io::Result<TcpStream>> {
        let stream = match self.listener.next_connection()? {
            Ok(stream) => stream,
            Err(e) => return Some(Err(e)),
        };

        let configured = stream
            .set_read_timeout(self.timeout)
            .and_then(|()| stream.set_write_timeout(self.timeout));

        Some(configured.map(|()| stream))
    }
}

/// Resumen de una ejecución del dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Conexiones encoladas
    pub accepted: u64,
    /// Errores de accept o de encolado
    pub failed: u64,
}

/// Loop de accept que alimenta la cola
pub struct Dispatcher<T> {
    queue: Arc<BoundedQueue<WorkItem<T>>>,
}

impl<T: Send + 'static> Dispatcher<T> {
    pub fn new(queue: Arc<BoundedQueue<WorkItem<T>>>) -> Self {
        Self { queue }
    }

    /// Corre hasta que la cola se cierre o la fuente se agote
    pub fn run<S>(&self, source: &mut S) -> DispatchSummary
    where
        S: ConnectionSource<Connection = T>,
    {
        let mut summary = DispatchSummary::default();

        loop {
            let reservation = match self.queue.reserve() {
                Ok(reservation) => reservation,
                Err(_) => break,
            };

            let connection = match source.next_connection() {
                Some(Ok(connection)) => connection,
                Some(Err(e)) => {
                    // La reserva se descarta y el slot vuelve a la cola
                    tracing::warn!("❌ Error accepting connection: {}", e);
                    summary.failed += 1;
                    continue;
                }
                None => break,
            };

            match reservation.publish(WorkItem::new(connection)) {
                Ok(()) => summary.accepted += 1,
                Err(QueueError::Closed) => break,
                Err(e) => {
                    tracing::error!("❌ Connection dropped: {}", e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            accepted = summary.accepted,
            failed = summary.failed,
            "dispatcher stopped"
        );
        summary
    }
}
