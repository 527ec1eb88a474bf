//! # Handler de Requests
//! src/server/handler.rs
//!
//! Colaborador externo mínimo que usan los workers. No implementa HTTP:
//! lee la primera línea, la clasifica, deja una entrada en el log y
//! responde con un cuerpo fijo.
//!
//! ## Rutas especiales
//!
//! - `GET /log`   - contenido completo del log compartido
//! - `GET /stats` - estadísticas de cola, log y del worker (JSON)

use crate::error::HandlerError;
use crate::queue::{BoundedQueue, QueueStats};
use crate::workers::{wait_micros, RequestContext, RequestHandler, RequestKind};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Tamaño del buffer de lectura del request
const READ_BUFFER_SIZE: usize = 8192;

type StatsSource = Box<dyn Fn() -> QueueStats + Send + Sync>;

/// Handler que registra cada request en el log compartido
pub struct LogRequestHandler {
    queue_stats: StatsSource,
}

impl LogRequestHandler {
    /// Crea el handler; `queue` solo se usa para `/stats`
    pub fn new<T: Send + 'static>(queue: Arc<BoundedQueue<T>>) -> Self {
        Self {
            queue_stats: Box::new(move || queue.stats()),
        }
    }
}

impl<S> RequestHandler<S> for LogRequestHandler
where
    S: Read + Write + Send + 'static,
{
    fn handle(&self, stream: &mut S, ctx: &mut RequestContext<'_>) -> Result<(), HandlerError> {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let bytes_read = stream.read(&mut buffer)?;

        if bytes_read == 0 {
            tracing::debug!(worker = ctx.worker_id, "connection closed before request");
            return Ok(());
        }

        let Some((method, path)) = parse_request_line(&buffer[..bytes_read]) else {
            write_response(stream, "400 Bad Request", "text/plain", ctx, b"invalid request line\n")?;
            return Ok(());
        };

        let kind = classify(&method, &path);
        ctx.stats.record(kind);

        // Un fallo del log es un problema interno: el cliente igual recibe respuesta
        if let Err(e) = ctx.log.append(activity_line(&method, &path, ctx)) {
            tracing::warn!(worker = ctx.worker_id, "could not record request: {}", e);
        }

        match (method.as_str(), path.as_str()) {
            ("GET", "/log") => {
                let body = ctx.log.read()?;
                write_response(stream, "200 OK", "text/plain", ctx, &body)?;
            }
            ("GET", "/stats") => {
                let body = serde_json::json!({
                    "queue": (self.queue_stats)(),
                    "log": ctx.log.stats(),
                    "worker": &*ctx.stats,
                });
                write_response(stream, "200 OK", "application/json", ctx, body.to_string().as_bytes())?;
            }
            _ => {
                write_response(stream, "200 OK", "text/plain", ctx, b"ok\n")?;
            }
        }

        Ok(())
    }
}

/// Extrae método y path de la primera línea
fn parse_request_line(raw: &[u8]) -> Option<(String, String)> {
    let text = String::from_utf8_lossy(raw);
    let line = text.lines().next()?;

    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;

    if !method.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }

    Some((method.to_string(), path.to_string()))
}

/// Categoría del request para los contadores del worker
pub fn classify(method: &str, path: &str) -> RequestKind {
    match method {
        "POST" => RequestKind::Post,
        _ if path == "/log" || path == "/stats" || path.contains('?') => RequestKind::Dynamic,
        _ => RequestKind::Static,
    }
}

/// Entrada del log para un request (una sola línea)
fn activity_line(method: &str, path: &str, ctx: &RequestContext<'_>) -> String {
    let arrival = ctx.arrival.duration_since(UNIX_EPOCH).unwrap_or_default();

    format!(
        "worker={} method={} path={} arrival={}.{:06} dispatch={}.{:06} static={} dynamic={} post={} total={}",
        ctx.worker_id,
        method,
        path.replace(['\r', '\n'], ""),
        arrival.as_secs(),
        arrival.subsec_micros(),
        ctx.wait.as_secs(),
        ctx.wait.subsec_micros(),
        ctx.stats.static_requests,
        ctx.stats.dynamic_requests,
        ctx.stats.post_requests,
        ctx.stats.total_requests,
    )
}

fn write_response<S: Write>(
    stream: &mut S,
    status: &str,
    content_type: &str,
    ctx: &RequestContext<'_>,
    body: &[u8],
) -> std::io::Result<()> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let head = format!(
        "HTTP/1.0 {}\r\nServer: pool_server\r\nContent-Type: {}\r\nContent-Length: {}\r\nX-Worker-Id: {}\r\nX-Wait-Us: {}\r\nDate: {}\r\n\r\n",
        status,
        content_type,
        body.len(),
        ctx.worker_id,
        wait_micros(ctx.wait),
        now,
    );

    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()
}
