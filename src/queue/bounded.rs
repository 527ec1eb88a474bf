//! # Cola Acotada MPMC
//! src/queue/bounded.rs
//!
//! Cola FIFO de capacidad fija para múltiples productores y consumidores.
//!
//! ## Admisión por semáforos
//!
//! ```text
//! slots   (posiciones libres)   -- reserve/enqueue toma, SlotRelease devuelve
//! pending (items esperando)     -- publish suma, dequeue toma
//! items   (Mutex<VecDeque>)     -- serializa todas las mutaciones
//! ```
//!
//! Un slot NO se libera al desencolar sino cuando el worker termina con el
//! item (`SlotRelease`). Así la capacidad mide items "en vuelo" y el
//! dispatcher queda bloqueado mientras los workers estén ocupados.

use crate::error::QueueError;
use crate::sync::Semaphore;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Cola acotada thread-safe
pub struct BoundedQueue<T> {
    /// Capacidad máxima (items encolados + items en proceso)
    capacity: usize,

    /// Posiciones libres
    slots: Semaphore,

    /// Items publicados que nadie ha tomado
    pending: Semaphore,

    /// Lista FIFO
    inner: Mutex<Inner<T>>,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola vacía con `capacity` slots libres
    ///
    /// Retorna `QueueError::InvalidCapacity` si `capacity == 0`
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity { capacity });
        }

        Ok(Self {
            capacity,
            slots: Semaphore::new(capacity),
            pending: Semaphore::new(0),
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
        })
    }

    /// Reserva un slot libre, bloqueando si la cola está llena.
    ///
    /// El item todavía no existe: el dispatcher reserva antes de aceptar la
    /// conexión para no aceptar nunca algo que no pueda encolar. Si la
    /// reserva se descarta sin publicar, el slot vuelve a la cola.
    pub fn reserve(&self) -> Result<SlotReservation<'_, T>, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        self.slots.acquire().map_err(|_| QueueError::Closed)?;

        // Pudo cerrarse mientras esperábamos
        if self.is_closed() {
            self.slots.release();
            return Err(QueueError::Closed);
        }

        Ok(SlotReservation {
            queue: self,
            published: false,
        })
    }

    /// Encola un item al final, bloqueando mientras la cola esté llena
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        self.reserve()?.publish(item)
    }

    /// Desencola el item más antiguo, bloqueando mientras la cola esté vacía.
    ///
    /// Retorna el item junto con el `SlotRelease` que devuelve su slot.
    /// Después de `close()` entrega los items que queden y luego
    /// retorna `QueueError::Closed`.
    pub fn dequeue(&self) -> Result<(T, SlotRelease<'_>), QueueError> {
        self.pending.acquire().map_err(|_| QueueError::Closed)?;
        self.take_head()
    }

    /// Intenta desencolar sin bloquear
    ///
    /// Retorna `None` si no hay items pendientes
    pub fn try_dequeue(&self) -> Option<(T, SlotRelease<'_>)> {
        if !self.pending.try_acquire() {
            return None;
        }
        self.take_head().ok()
    }

    fn take_head(&self) -> Result<(T, SlotRelease<'_>), QueueError> {
        let item = {
            let mut inner = self.lock();
            // pending == items.len(): con un permiso tomado siempre hay cabeza
            inner.items.pop_front().ok_or(QueueError::Closed)?
        };

        Ok((item, SlotRelease::new(&self.slots)))
    }

    /// Cierra la cola: productores fallan de inmediato, consumidores
    /// drenan lo que queda. Despierta a todos los threads bloqueados.
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            inner.closed = true;
        }
        self.slots.close();
        self.pending.close();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items encolados que ningún consumidor ha tomado
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots libres en este momento
    pub fn available_slots(&self) -> usize {
        self.slots.available()
    }

    /// Items desencolados cuyo slot todavía no fue liberado (aproximado
    /// si hay operaciones en curso)
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.available_slots())
            .saturating_sub(self.len())
    }

    /// Snapshot de estadísticas
    pub fn stats(&self) -> QueueStats {
        let (pending, closed) = {
            let inner = self.lock();
            (inner.items.len(), inner.closed)
        };
        let available_slots = self.available_slots();

        QueueStats {
            capacity: self.capacity,
            pending,
            available_slots,
            in_flight: self.capacity.saturating_sub(available_slots).saturating_sub(pending),
            closed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Slot reservado pero todavía sin item publicado
#[must_use = "dropping a reservation returns the slot without enqueuing anything"]
pub struct SlotReservation<'q, T> {
    queue: &'q BoundedQueue<T>,
    published: bool,
}

impl<T> SlotReservation<'_, T> {
    /// Publica el item en el slot reservado.
    ///
    /// Si la cola se cerró o no hay memoria, el slot se devuelve y no
    /// queda nada enlazado a medias.
    pub fn publish(mut self, item: T) -> Result<(), QueueError> {
        {
            let mut inner = self.queue.lock();

            if inner.closed {
                return Err(QueueError::Closed);
            }

            if inner.items.try_reserve(1).is_err() {
                return Err(QueueError::ResourceExhaustion {
                    pending: inner.items.len(),
                });
            }

            inner.items.push_back(item);

            // Con `inner` tomado: un `close()` concurrente no puede cerrar
            // `pending` entre el push y el permiso, y el item se drena
            self.queue.pending.release();
        }

        self.published = true;
        Ok(())
    }
}

impl<T> Drop for SlotReservation<'_, T> {
    fn drop(&mut self) {
        if !self.published {
            self.queue.slots.release();
        }
    }
}

/// Devuelve el slot de un item desencolado cuando el worker termina con él
#[must_use = "the slot is returned as soon as this value is dropped"]
pub struct SlotRelease<'q> {
    slots: &'q Semaphore,
    released: bool,
}

impl<'q> SlotRelease<'q> {
    fn new(slots: &'q Semaphore) -> Self {
        Self { slots, released: false }
    }

    /// Libera el slot explícitamente
    pub fn release(mut self) {
        self.released = true;
        self.slots.release();
    }
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.slots.release();
        }
    }
}

/// Estadísticas de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub capacity: usize,
    pub pending: usize,
    pub available_slots: usize,
    pub in_flight: usize,
    pub closed: bool,
}
