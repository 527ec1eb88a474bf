//! # Pool Fijo de Workers
//! src/workers/pool.rs
//!
//! Pool de threads creado al arrancar. El tamaño no cambia durante la
//! vida del proceso.
//!
//! ## Loop de cada worker
//!
//! ```text
//! dequeue ─► wait = ahora - llegada ─► handler ─► drop(item) ─► libera slot
//! ```

use super::item::{wait_duration, wait_micros, WorkItem};
use super::stats::WorkerStats;
use crate::error::{HandlerError, PoolError};
use crate::queue::BoundedQueue;
use crate::server_log::SharedLog;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

/// Datos que el worker entrega al handler para un request
pub struct RequestContext<'a> {
    /// Worker que procesa el request (1-based)
    pub worker_id: usize,

    /// Hora de llegada al dispatcher
    pub arrival: SystemTime,

    /// Tiempo esperado en la cola
    pub wait: Duration,

    /// Contadores privados del worker
    pub stats: &'a mut WorkerStats,

    /// Log compartido
    pub log: &'a SharedLog,
}

/// Handler externo de requests.
///
/// Puede agregar al log cero o más veces. No debe retener el payload:
/// al retornar, el worker lo destruye y libera su slot.
pub trait RequestHandler<T>: Send + Sync + 'static {
    fn handle(&self, payload: &mut T, ctx: &mut RequestContext<'_>) -> Result<(), HandlerError>;
}

/// Pool fijo de workers
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    /// Crea `size` workers que consumen de `queue`.
    ///
    /// Si el sistema no puede crear algún thread retorna error; los
    /// workers ya creados terminan cuando se cierre la cola.
    pub fn spawn<T, H>(
        size: usize,
        queue: Arc<BoundedQueue<WorkItem<T>>>,
        log: Arc<SharedLog>,
        handler: Arc<H>,
    ) -> Result<Self, PoolError>
    where
        T: Send + 'static,
        H: RequestHandler<T>,
    {
        if size == 0 {
            return Err(PoolError::InvalidSize { size });
        }

        let mut handles = Vec::with_capacity(size);

        for id in 1..=size {
            let queue = Arc::clone(&queue);
            let log = Arc::clone(&log);
            let handler = Arc::clone(&handler);

            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, &queue, &log, handler.as_ref()))
                .map_err(|source| PoolError::Spawn { id, source })?;

            handles.push(handle);
        }

        tracing::info!("👷 {} workers started", size);
        Ok(Self { handles })
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Espera a que todos los workers terminen (la cola debe estar cerrada)
    /// y retorna sus contadores
    pub fn join(self) -> Vec<WorkerStats> {
        let mut all = Vec::with_capacity(self.handles.len());

        for handle in self.handles {
            match handle.join() {
                Ok(stats) => all.push(stats),
                Err(e) => tracing::error!("⚠️ Worker thread panicked: {:?}", e),
            }
        }

        all
    }
}

/// Loop principal del worker
fn worker_loop<T, H>(
    id: usize,
    queue: &BoundedQueue<WorkItem<T>>,
    log: &SharedLog,
    handler: &H,
) -> WorkerStats
where
    H: RequestHandler<T>,
{
    tracing::debug!("🔧 Worker {} started", id);
    let mut stats = WorkerStats::new(id);

    // Termina cuando la cola está cerrada y vacía
    while let Ok((mut item, slot)) = queue.dequeue() {
        let arrival = item.arrival();
        let wait = wait_duration(arrival, SystemTime::now());

        tracing::trace!(worker = id, wait_us = wait_micros(wait), "request dispatched");

        let mut ctx = RequestContext {
            worker_id: id,
            arrival,
            wait,
            stats: &mut stats,
            log,
        };

        if let Err(e) = handler.handle(item.payload_mut(), &mut ctx) {
            tracing::warn!("❌ Worker {} failed request: {}", id, e);
        }

        // Primero se liberan los recursos del item, después el slot
        drop(item);
        slot.release();
    }

    tracing::debug!("Worker {} stopped ({} requests)", id, stats.total_requests);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::stats::RequestKind;
    use std::sync::{mpsc, Mutex};
    use std::time::Instant;

    /// Handler de prueba: registra el payload en el log
    struct EchoHandler;

    impl RequestHandler<u32> for EchoHandler {
        fn handle(&self, payload: &mut u32, ctx: &mut RequestContext<'_>) -> Result<(), HandlerError> {
            ctx.stats.record(RequestKind::Static);
            ctx.log.append(format!("worker={} item={}", ctx.worker_id, payload))?;
            Ok(())
        }
    }

    /// Handler que falla con los payloads impares
    struct OddFails;

    impl RequestHandler<u32> for OddFails {
        fn handle(&self, payload: &mut u32, ctx: &mut RequestContext<'_>) -> Result<(), HandlerError> {
            ctx.stats.record(RequestKind::Dynamic);
            if *payload % 2 == 1 {
                return Err(HandlerError::Other(format!("odd payload {}", payload)));
            }
            Ok(())
        }
    }

    /// Handler que avisa al entrar y espera permiso para salir
    struct Gate {
        entered: Mutex<mpsc::Sender<u32>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl RequestHandler<u32> for Gate {
        fn handle(&self, payload: &mut u32, _ctx: &mut RequestContext<'_>) -> Result<(), HandlerError> {
            self.entered.lock().unwrap().send(*payload).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(())
        }
    }

    fn setup(capacity: usize) -> (Arc<BoundedQueue<WorkItem<u32>>>, Arc<SharedLog>) {
        (
            Arc::new(BoundedQueue::new(capacity).unwrap()),
            Arc::new(SharedLog::new()),
        )
    }

    #[test]
    fn test_zero_workers_rejected() {
        let (queue, log) = setup(1);
        let result = WorkerPool::spawn(0, queue, log, Arc::new(EchoHandler));
        assert!(matches!(result, Err(PoolError::InvalidSize { size: 0 })));
    }

    #[test]
    fn test_pool_processes_every_item() {
        let (queue, log) = setup(4);
        let pool = WorkerPool::spawn(3, Arc::clone(&queue), Arc::clone(&log), Arc::new(EchoHandler)).unwrap();
        assert_eq!(pool.size(), 3);

        for i in 0..20 {
            queue.enqueue(WorkItem::new(i)).unwrap();
        }
        queue.close();

        let stats = pool.join();
        assert_eq!(stats.len(), 3);

        let total: u64 = stats.iter().map(|s| s.total_requests).sum();
        assert_eq!(total, 20);

        let mut ids: Vec<_> = stats.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);

        assert_eq!(log.entry_count(), 20);
        assert_eq!(queue.available_slots(), 4);
    }

    #[test]
    fn test_single_worker_processes_in_fifo_order() {
        let (queue, log) = setup(8);
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), Arc::clone(&log), Arc::new(EchoHandler)).unwrap();

        for i in 0..6 {
            queue.enqueue(WorkItem::new(i)).unwrap();
        }
        queue.close();
        pool.join();

        let expected: String = (0..6).map(|i| format!("worker=1 item={}\n", i)).collect();
        assert_eq!(log.read_string().unwrap(), expected);
    }

    #[test]
    fn test_handler_errors_do_not_stop_worker() {
        let (queue, log) = setup(4);
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), log, Arc::new(OddFails)).unwrap();

        for i in 0..5 {
            queue.enqueue(WorkItem::new(i)).unwrap();
        }
        queue.close();

        let stats = pool.join();
        assert_eq!(stats[0].dynamic_requests, 5);
        assert_eq!(queue.available_slots(), 4);
    }

    #[test]
    fn test_slot_stays_taken_while_handler_runs() {
        let (queue, log) = setup(1);
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let handler = Arc::new(Gate {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });

        let pool = WorkerPool::spawn(1, Arc::clone(&queue), log, handler).unwrap();
        queue.enqueue(WorkItem::new(7)).unwrap();

        assert_eq!(entered_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);

        // La cola está vacía pero el item sigue en vuelo
        assert!(queue.is_empty());
        assert_eq!(queue.available_slots(), 0);
        assert_eq!(queue.in_flight(), 1);

        release_tx.send(()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.available_slots() == 0 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }

        queue.close();
        pool.join();
    }

    #[test]
    fn test_wait_duration_reported_to_handler() {
        struct RecordWait(Mutex<Vec<Duration>>);

        impl RequestHandler<u32> for RecordWait {
            fn handle(&self, _payload: &mut u32, ctx: &mut RequestContext<'_>) -> Result<(), HandlerError> {
                self.0.lock().unwrap().push(ctx.wait);
                Ok(())
            }
        }

        let (queue, log) = setup(2);
        let arrival = SystemTime::now() - Duration::from_secs(2);
        queue.enqueue(WorkItem::with_arrival(1, arrival)).unwrap();
        queue.close();

        let handler = Arc::new(RecordWait(Mutex::new(Vec::new())));
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), log, Arc::clone(&handler)).unwrap();
        pool.join();

        let waits = handler.0.lock().unwrap();
        assert_eq!(waits.len(), 1);
        assert!(waits[0] >= Duration::from_secs(2));
    }

    #[test]
    fn test_panicking_handler_still_returns_slot() {
        struct Panics;

        impl RequestHandler<u32> for Panics {
            fn handle(&self, payload: &mut u32, _ctx: &mut RequestContext<'_>) -> Result<(), HandlerError> {
                panic!("handler blew up on {}", payload);
            }
        }

        let (queue, log) = setup(2);
        let pool = WorkerPool::spawn(1, Arc::clone(&queue), log, Arc::new(Panics)).unwrap();

        queue.enqueue(WorkItem::new(1)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.available_slots() < queue.capacity() || !queue.is_empty() {
            assert!(Instant::now() < deadline, "slot not returned after panic");
            thread::sleep(Duration::from_millis(5));
        }

        queue.close();

        // El worker murió: no entrega contadores
        assert!(pool.join().is_empty());
        assert_eq!(queue.in_flight(), 0);
    }
}
