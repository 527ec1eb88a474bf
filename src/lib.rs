//! # Pool Server
//! src/lib.rs
//!
//! Front end de servidor con un pool fijo de workers: un dispatcher acepta
//! conexiones, las encola en una cola acotada y los workers las procesan
//! registrando su actividad en un log compartido.
//!
//! ## Arquitectura
//!
//! - `sync`: semáforo contador (Mutex + Condvar)
//! - `queue`: cola FIFO acotada con slots que se liberan al terminar el request
//! - `server_log`: log de solo-append con prioridad para escritores
//! - `workers`: pool fijo de threads y trait del handler
//! - `server`: dispatcher, handler de requests y servidor TCP
//! - `config`: configuración por CLI y variables de entorno
//! - `error`: tipos de error de cada componente
//! - `telemetry`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use pool_server::config::Config;
//! use pool_server::server::Server;
//!
//! let server = Server::bind(Config::default()).expect("bind");
//! let report = server.run().expect("run");
//! println!("{} requests", report.total_requests());
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod server;
pub mod server_log;
pub mod sync;
pub mod telemetry;
pub mod workers;
