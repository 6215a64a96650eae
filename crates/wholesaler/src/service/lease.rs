use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// In-process exclusive claims on orders, so a scheduled sweep and a manual
/// single-order run cannot send for the same order at the same time.
#[derive(Clone, Default)]
pub struct OrderLeases {
    held: Arc<Mutex<HashSet<i32>>>,
}

impl OrderLeases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, order_id: i32) -> Option<OrderLease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);

        if !held.insert(order_id) {
            return None;
        }

        Some(OrderLease {
            order_id,
            held: self.held.clone(),
        })
    }
}

/// Released on drop.
pub struct OrderLease {
    order_id: i32,
    held: Arc<Mutex<HashSet<i32>>>,
}

impl Drop for OrderLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.order_id);
    }
}
