//! # Semáforo Contador
//! src/sync/semaphore.rs
//!
//! Semáforo construido con `Mutex` + `Condvar`. A diferencia de un
//! `MutexGuard`, un permiso puede ser devuelto por un thread distinto
//! al que lo tomó: lo necesitan la cola (el worker libera el slot que
//! reservó el dispatcher) y el log (el último lector libera el recurso
//! que tomó el primero).

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// El semáforo fue cerrado y ya no quedan permisos
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("semaphore closed")]
pub struct Closed;

#[derive(Debug)]
struct State {
    permits: usize,
    closed: bool,
}

/// Semáforo contador bloqueante
#[derive(Debug)]
pub struct Semaphore {
    state: Mutex<State>,
    condvar: Condvar,
}

impl Semaphore {
    /// Crea un semáforo con `permits` permisos iniciales
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(State { permits, closed: false }),
            condvar: Condvar::new(),
        }
    }

    /// Toma un permiso, bloqueando hasta que haya uno.
    ///
    /// Después de `close()` sigue entregando los permisos que queden y
    /// retorna `Err(Closed)` cuando se agotan.
    pub fn acquire(&self) -> Result<(), Closed> {
        let mut state = self.lock();

        loop {
            if state.permits > 0 {
                state.permits -= 1;
                return Ok(());
            }
            if state.closed {
                return Err(Closed);
            }
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta tomar un permiso sin bloquear
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if state.permits > 0 {
            state.permits -= 1;
            true
        } else {
            false
        }
    }

    /// Devuelve un permiso y despierta a un thread en espera
    pub fn release(&self) {
        let mut state = self.lock();
        state.permits += 1;
        drop(state);
        self.condvar.notify_one();
    }

    /// Permisos disponibles en este momento
    pub fn available(&self) -> usize {
        self.lock().permits
    }

    /// Cierra el semáforo y despierta a todos los threads en espera
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Ninguna sección crítica deja el contador a medias
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        let sem = Semaphore::new(2);
        assert!(sem.acquire().is_ok());
        assert!(sem.acquire().is_ok());
        assert_eq!(sem.available(), 0);
        assert!(!sem.try_acquire());

        sem.release();
        assert_eq!(sem.available(), 1);
        assert!(sem.try_acquire());
    }

    #[test]
    fn test_acquire_blocks_until_release_from_other_thread() {
        let sem = Arc::new(Semaphore::new(0));
        let (tx, rx) = mpsc::channel();

        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || {
                sem.acquire().unwrap();
                tx.send(()).unwrap();
            })
        };

        // Sin permisos el thread sigue bloqueado
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        sem.release();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn test_close_wakes_waiters() {
        let sem = Arc::new(Semaphore::new(0));

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let sem = Arc::clone(&sem);
                thread::spawn(move || sem.acquire())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        sem.close();

        for w in waiters {
            assert_eq!(w.join().unwrap(), Err(Closed));
        }
        assert!(sem.is_closed());
    }

    #[test]
    fn test_close_drains_remaining_permits() {
        let sem = Semaphore::new(1);
        sem.close();
        assert!(sem.acquire().is_ok());
        assert_eq!(sem.acquire(), Err(Closed));
    }
}
