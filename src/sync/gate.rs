//! # Compuerta
//! src/sync/gate.rs
//!
//! Semáforo que no se puede cerrar: `acquire` siempre termina tomando un
//! permiso. Lo usan las compuertas del protocolo lectores/escritores, que
//! viven tanto como el log.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct Gate {
    permits: Mutex<usize>,
    condvar: Condvar,
}

impl Gate {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            condvar: Condvar::new(),
        }
    }

    /// Toma un permiso, bloqueando hasta que haya uno
    pub fn acquire(&self) {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = self
                .condvar
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    /// Devuelve un permiso (puede hacerlo otro thread)
    pub fn release(&self) {
        *self.lock() += 1;
        self.condvar.notify_one();
    }

    pub fn available(&self) -> usize {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_release_from_another_thread() {
        let gate = Arc::new(Gate::new(1));
        gate.acquire();
        assert_eq!(gate.available(), 0);

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.acquire();
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        // El permiso lo devuelve un thread distinto al que lo tomó
        thread::spawn({
            let gate = Arc::clone(&gate);
            move || gate.release()
        })
        .join()
        .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
        assert_eq!(gate.available(), 0);
    }
}
