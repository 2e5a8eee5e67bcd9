// src/resolve.rs
use crate::ethernet::MacAddress;
use std::cell::OnceCell;
use std::rc::Rc;

/// Creates a one-shot MAC result cell: the sender is held by the resolving
/// task, the receiver by whoever waits for the answer.
pub fn mac_slot() -> (MacSender, MacReceiver) {
    let cell = Rc::new(OnceCell::new());
    (MacSender { cell: cell.clone() }, MacReceiver { cell })
}

/// Write half. The first `resolve` wins; later calls are ignored.
#[derive(Debug)]
pub struct MacSender {
    cell: Rc<OnceCell<MacAddress>>,
}

impl MacSender {
    /// Stores `mac`. Returns false if a value was already there.
    pub fn resolve(&self, mac: MacAddress) -> bool {
        self.cell.set(mac).is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Read half. Clones observe the same cell.
#[derive(Debug, Clone)]
pub struct MacReceiver {
    cell: Rc<OnceCell<MacAddress>>,
}

impl MacReceiver {
    pub fn get(&self) -> Option<MacAddress> {
        self.cell.get().copied()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}
