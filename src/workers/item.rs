//! # Unidad de Trabajo
//! src/workers/item.rs

use std::time::{Duration, SystemTime};

/// Unidad de trabajo (una conexión) más su hora de llegada.
///
/// La crea el dispatcher, pasa por la cola exactamente una vez y la
/// destruye el único worker que la desencola.
#[derive(Debug)]
pub struct WorkItem<T> {
    payload: T,
    arrival: SystemTime,
}

impl<T> WorkItem<T> {
    /// Crea el item marcando la llegada ahora
    pub fn new(payload: T) -> Self {
        Self::with_arrival(payload, SystemTime::now())
    }

    pub fn with_arrival(payload: T, arrival: SystemTime) -> Self {
        Self { payload, arrival }
    }

    pub fn arrival(&self) -> SystemTime {
        self.arrival
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// Tiempo que el item esperó en la cola.
///
/// Si el reloj retrocedió entre la llegada y el despacho retorna cero.
pub fn wait_duration(arrival: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(arrival).unwrap_or(Duration::ZERO)
}

/// Microsegundos de `wait` como `u64`, saturando en `u64::MAX`
pub fn wait_micros(wait: Duration) -> u64 {
    u64::try_from(wait.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_wait_duration_borrows_across_seconds() {
        // 10.900s -> 12.100s: los microsegundos "piden prestado" un segundo
        let arrival = UNIX_EPOCH + Duration::new(10, 900_000_000);
        let now = UNIX_EPOCH + Duration::new(12, 100_000_000);
        assert_eq!(wait_duration(arrival, now), Duration::from_millis(1200));
    }

    #[test]
    fn test_wait_duration_clock_went_backwards() {
        let arrival = UNIX_EPOCH + Duration::from_secs(5);
        let now = UNIX_EPOCH + Duration::from_secs(4);
        assert_eq!(wait_duration(arrival, now), Duration::ZERO);
    }

    #[test]
    fn test_work_item_accessors() {
        let arrival = UNIX_EPOCH + Duration::from_secs(42);
        let mut item = WorkItem::with_arrival(String::from("conn"), arrival);
        assert_eq!(item.arrival(), arrival);
        item.payload_mut().push('!');
        assert_eq!(item.payload(), "conn!");
        assert_eq!(item.into_payload(), "conn!");
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = SystemTime::now();
        let item = WorkItem::new(1u8);
        assert!(item.arrival() >= before);
    }

    #[test]
    fn test_wait_micros_saturates() {
        assert_eq!(wait_micros(Duration::from_micros(1500)), 1500);
        assert_eq!(wait_micros(Duration::MAX), u64::MAX);
    }
}
