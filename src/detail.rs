//! Line-item details of the order currently being consulted.

use crate::error::DeskError;
use crate::models::{format_quantity, OrderLineItem, OrderSummary};

pub const DETAIL_ERROR_TEXT: &str = "Error fetching order details";

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEntry {
    Item {
        product: String,
        quantity_and_unit: String,
        total: String,
    },
    Error(String),
}

impl DetailEntry {
    pub fn lines(&self) -> Vec<String> {
        match self {
            DetailEntry::Item {
                product,
                quantity_and_unit,
                total,
            } => vec![
                format!("Producto: {product}"),
                format!("Cantidad y Unidad: {quantity_and_unit}"),
                format!("Total: ${total}"),
            ],
            DetailEntry::Error(text) => vec![text.clone()],
        }
    }
}

/// Snapshot handed to the presenter when the modal opens.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalView {
    pub header: [String; 3],
    pub entries: Vec<DetailEntry>,
}

#[derive(Debug, Default)]
pub struct DetailView {
    items: Vec<OrderLineItem>,
    entries: Vec<DetailEntry>,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.entries.clear();
    }

    /// Replace whatever was loaded with the result of a detail fetch.
    pub fn load(&mut self, fetched: Result<Vec<OrderLineItem>, DeskError>) {
        self.clear();
        match fetched {
            Ok(items) => {
                self.entries = items
                    .iter()
                    .map(|item| DetailEntry::Item {
                        product: item.product_name.clone(),
                        quantity_and_unit: format!(
                            "{} {}",
                            format_quantity(item.quantity),
                            item.unit_name
                        ),
                        total: item.price.to_string(),
                    })
                    .collect();
                self.items = items;
            }
            Err(_) => {
                self.entries = vec![DetailEntry::Error(DETAIL_ERROR_TEXT.to_string())];
            }
        }
    }

    pub fn modal_view(&self, order: &OrderSummary) -> ModalView {
        ModalView {
            header: [
                format!("ID: {} #{}", order.name, order.id),
                format!("Total: {}", order.total),
                format!("Fecha y Hora: {}", order.display_date()),
            ],
            entries: self.entries.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line_item, pending};

    #[test]
    fn load_builds_entries() {
        let mut view = DetailView::new();
        let mut item = line_item("Taco", "PZA", 12.5);
        item.quantity = 2.0;
        item.price = 25.0;
        view.load(Ok(vec![item]));
        assert_eq!(view.items().len(), 1);
        assert_eq!(
            view.modal_view(&pending("1")).entries[0].lines(),
            vec![
                "Producto: Taco".to_string(),
                "Cantidad y Unidad: 2 PZA".to_string(),
                "Total: $25".to_string(),
            ]
        );
    }

    #[test]
    fn load_replaces_previous_selection() {
        let mut view = DetailView::new();
        view.load(Ok(vec![
            line_item("Taco", "PZA", 12.5),
            line_item("Agua", "LT", 20.0),
        ]));
        view.load(Ok(vec![line_item("Queso", "KG", 180.0)]));
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.modal_view(&pending("1")).entries.len(), 1);
        assert_eq!(view.items()[0].product_name, "Queso");
    }

    #[test]
    fn failed_fetch_shows_error_entry_and_no_items() {
        let mut view = DetailView::new();
        view.load(Ok(vec![line_item("Taco", "PZA", 12.5)]));
        view.load(Err(DeskError::NotFound("/order-detail/order/3".into())));
        assert!(view.items().is_empty());
        assert_eq!(
            view.modal_view(&pending("3")).entries,
            vec![DetailEntry::Error(DETAIL_ERROR_TEXT.to_string())]
        );
    }

    #[test]
    fn modal_view_header() {
        let view = DetailView::new();
        let modal = view.modal_view(&pending("5"));
        assert_eq!(modal.header[0], "ID: Cliente 5 #5");
        assert_eq!(modal.header[1], "Total: 223.20");
        assert!(modal.entries.is_empty());
    }
}
