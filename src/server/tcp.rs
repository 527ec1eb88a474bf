//! # Servidor TCP con Pool Fijo
//! src/server/tcp.rs
//!
//! Une las piezas del núcleo: un listener, el dispatcher que lo consume,
//! la cola acotada, el pool de workers y el log compartido.
//!
//! ```text
//! TcpListener ─► Dispatcher ─► BoundedQueue ─► WorkerPool ─► SharedLog
//! ```
//!
//! A diferencia de un thread por conexión, la cantidad de threads es fija
//! y la cola limita cuántas conexiones pueden estar en vuelo.

use super::dispatcher::{DispatchSummary, Dispatcher, TimeoutListener};
use super::handler::LogRequestHandler;
use crate::config::Config;
use crate::error::ServerError;
use crate::queue::BoundedQueue;
use crate::server_log::SharedLog;
use crate::workers::{WorkItem, WorkerPool, WorkerStats};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

type ConnectionQueue = BoundedQueue<WorkItem<TcpStream>>;

/// Servidor con pool fijo de workers
pub struct Server {
    config: Config,
    listener: TcpListener,
    queue: Arc<ConnectionQueue>,
    log: Arc<SharedLog>,
}

/// Resultado de una ejecución completa del servidor
#[derive(Debug, Clone)]
pub struct ServerReport {
    pub dispatch: DispatchSummary,
    pub workers: Vec<WorkerStats>,
}

impl ServerReport {
    /// Requests atendidos por todos los workers
    pub fn total_requests(&self) -> u64 {
        self.workers.iter().map(|w| w.total_requests).sum()
    }
}

/// Permite detener el servidor desde otro thread
#[derive(Clone)]
pub struct ShutdownHandle {
    queue: Arc<ConnectionQueue>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Cierra la cola y despierta al dispatcher si está bloqueado en accept
    pub fn shutdown(&self) {
        tracing::info!("🛑 Shutdown requested");
        self.queue.close();

        // El accept solo retorna con una conexión entrante
        match TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1)) {
            Ok(_) => {}
            Err(e) => tracing::debug!("wake-up connection failed: {}", e),
        }
    }
}

impl Server {
    /// Valida la configuración, crea la cola y el log, y hace bind del listener
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        let queue = Arc::new(BoundedQueue::new(config.queue_size)?);

        let log = if config.log_write_delay_ms > 0 {
            SharedLog::with_write_delay(Duration::from_millis(config.log_write_delay_ms))
        } else {
            SharedLog::new()
        };

        tracing::info!("🚀 Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            listener,
            queue,
            log: Arc::new(log),
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn log(&self) -> Arc<SharedLog> {
        Arc::clone(&self.log)
    }

    pub fn queue(&self) -> Arc<BoundedQueue<WorkItem<TcpStream>>> {
        Arc::clone(&self.queue)
    }

    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        let mut wake_addr = self.local_addr()?;

        // No se puede conectar a 0.0.0.0 / [::]
        if wake_addr.ip().is_unspecified() {
            let loopback = match wake_addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            wake_addr.set_ip(loopback);
        }

        Ok(ShutdownHandle {
            queue: Arc::clone(&self.queue),
            wake_addr,
        })
    }

    /// Corre el servidor hasta que se cierre la cola.
    ///
    /// Al terminar, los workers vacían la cola, se hace join de todos y
    /// se cierra el log.
    pub fn run(self) -> Result<ServerReport, ServerError> {
        let Server {
            config,
            listener,
            queue,
            log,
        } = self;

        let handler = Arc::new(LogRequestHandler::new(Arc::clone(&queue)));

        let pool = match WorkerPool::spawn(config.threads, Arc::clone(&queue), Arc::clone(&log), handler) {
            Ok(pool) => pool,
            Err(e) => {
                // Los workers que alcanzaron a arrancar terminan con la cola cerrada
                queue.close();
                return Err(e.into());
            }
        };

        tracing::info!(
            "⚙️  Mode: fixed pool ({} workers, queue of {})",
            pool.size(),
            queue.capacity()
        );

        let mut source = TimeoutListener::new(listener, config.read_timeout());
        let dispatch = Dispatcher::new(Arc::clone(&queue)).run(&mut source);
        drop(source);

        queue.close();
        let workers = pool.join();
        log.close();

        let report = ServerReport { dispatch, workers };
        tracing::info!(
            accepted = report.dispatch.accepted,
            handled = report.total_requests(),
            "✅ Server stopped"
        );

        Ok(report)
    }
}
