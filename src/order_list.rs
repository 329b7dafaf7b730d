//! The displayed list of pending orders.
//!
//! Rows keep arrival order. The list changes only through synchronizer events
//! and the desk's own delete/release handlers.

use crate::models::OrderSummary;
use crate::sync::SyncEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: String,
    pub name: String,
    pub total: String,
    pub display_date: String,
}

impl OrderRow {
    pub fn from_summary(order: &OrderSummary) -> Self {
        Self {
            id: order.id.clone(),
            name: order.name.clone(),
            total: order.total.clone(),
            display_date: order.display_date(),
        }
    }

    /// The three text lines shown for the row.
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Nombre y ID: {} #{}", self.name, self.id),
            format!("Total: {}$", self.total),
            format!("Fecha y Hora: {}", self.display_date),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListChange {
    Inserted(OrderRow),
    Removed(String),
}

#[derive(Debug, Default)]
pub struct OrderListModel {
    rows: Vec<OrderRow>,
}

impl OrderListModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[OrderRow] {
        &self.rows
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.rows.iter().any(|r| r.id == order_id)
    }

    pub fn apply(&mut self, event: &SyncEvent) -> Option<ListChange> {
        match event {
            SyncEvent::Added(order) => {
                if self.contains(&order.id) {
                    return None;
                }
                let row = OrderRow::from_summary(order);
                self.rows.push(row.clone());
                Some(ListChange::Inserted(row))
            }
            SyncEvent::Removed(order) => self.remove(&order.id),
        }
    }

    pub fn remove(&mut self, order_id: &str) -> Option<ListChange> {
        let idx = self.rows.iter().position(|r| r.id == order_id)?;
        let row = self.rows.remove(idx);
        Some(ListChange::Removed(row.id))
    }
}
