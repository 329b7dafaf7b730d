//! Confirmation modal gate.
//!
//! At most one order can be under confirmation at a time. Opening while open
//! is refused so the synchronizer is suspended exactly once.

use crate::models::OrderSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    /// Print the receipt, then release the order.
    Release,
    Delete,
    /// Close without touching the order.
    Return,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModalState {
    #[default]
    Closed,
    Open(OrderSummary),
}

#[derive(Debug, Default)]
pub struct ConfirmationModal {
    state: ModalState,
}

impl ConfirmationModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_))
    }

    /// Returns false (and changes nothing) when already open.
    pub fn open(&mut self, order: OrderSummary) -> bool {
        if self.is_open() {
            return false;
        }
        self.state = ModalState::Open(order);
        true
    }

    /// Close and hand back the order that was under confirmation.
    pub fn close(&mut self) -> Option<OrderSummary> {
        match std::mem::take(&mut self.state) {
            ModalState::Open(order) => Some(order),
            ModalState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pending;

    #[test]
    fn second_open_is_refused() {
        let mut modal = ConfirmationModal::new();
        assert!(modal.open(pending("1")));
        assert!(!modal.open(pending("2")));
        assert!(modal.is_open());
        assert_eq!(modal.close().map(|o| o.id), Some("1".to_string()));
    }

    #[test]
    fn close_returns_order_once() {
        let mut modal = ConfirmationModal::new();
        modal.open(pending("1"));
        assert_eq!(modal.close().map(|o| o.id), Some("1".to_string()));
        assert!(modal.close().is_none());
        assert!(!modal.is_open());
    }
}
