//! Test doubles for the order service and the printer device.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::OrderApi;
use crate::error::DeskError;
use crate::models::{OrderLineItem, OrderStatus, OrderSummary};
use crate::printer::ReceiptSink;

pub fn order(id: &str, status: OrderStatus) -> OrderSummary {
    OrderSummary {
        id: id.to_string(),
        name: format!("Cliente {id}"),
        total: "223.20".to_string(),
        date: "2021-09-01T12:00:00.000Z".to_string(),
        status,
    }
}

pub fn pending(id: &str) -> OrderSummary {
    order(id, OrderStatus::Pending)
}

pub fn line_item(name: &str, unit: &str, unit_price: f64) -> OrderLineItem {
    OrderLineItem {
        product_name: name.to_string(),
        quantity: 1.0,
        unit_name: unit.to_string(),
        unit_price,
        price: unit_price,
    }
}

/// In-memory order service. Records every call as `"method:arg"`.
pub struct FakeOrderApi {
    orders: Mutex<Vec<OrderSummary>>,
    details: Mutex<HashMap<String, Vec<OrderLineItem>>>,
    listing_fails: AtomicBool,
    release_ok: AtomicBool,
    delete_ok: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeOrderApi {
    pub fn with_orders(orders: Vec<OrderSummary>) -> Self {
        Self {
            orders: Mutex::new(orders),
            details: Mutex::new(HashMap::new()),
            listing_fails: AtomicBool::new(false),
            release_ok: AtomicBool::new(true),
            delete_ok: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_orders(&self, orders: Vec<OrderSummary>) {
        *self.orders.lock().unwrap() = orders;
    }

    pub fn set_details(&self, order_id: &str, items: Vec<OrderLineItem>) {
        self.details
            .lock()
            .unwrap()
            .insert(order_id.to_string(), items);
    }

    pub fn set_listing_fails(&self, fails: bool) {
        self.listing_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_release_ok(&self, ok: bool) {
        self.release_ok.store(ok, Ordering::SeqCst);
    }

    pub fn set_delete_ok(&self, ok: bool) {
        self.delete_ok.store(ok, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(':').next() == Some(method))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OrderApi for FakeOrderApi {
    async fn list_orders(&self) -> Result<Vec<OrderSummary>, DeskError> {
        self.record("list_orders".to_string());
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(DeskError::Network("connection refused".into()));
        }
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn get_order_details(&self, order_id: &str) -> Result<Vec<OrderLineItem>, DeskError> {
        self.record(format!("get_order_details:{order_id}"));
        self.details
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| DeskError::NotFound(format!("/order-detail/order/{order_id}")))
    }

    async fn delete_order_details(&self, order_id: &str) -> bool {
        self.record(format!("delete_order_details:{order_id}"));
        self.delete_ok.load(Ordering::SeqCst)
    }

    async fn release_order(&self, order_id: &str) -> bool {
        self.record(format!("release_order:{order_id}"));
        self.release_ok.load(Ordering::SeqCst)
    }
}

/// Printer that keeps every payload it is handed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub jobs: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ReceiptSink for RecordingSink {
    fn transmit(&self, payload: &[u8]) -> Result<(), DeskError> {
        self.jobs.lock().unwrap().push(payload.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "recording sink".to_string()
    }
}

/// Printer that is never there.
pub struct MissingSink;

impl ReceiptSink for MissingSink {
    fn transmit(&self, _payload: &[u8]) -> Result<(), DeskError> {
        Err(DeskError::Printer("device not found".into()))
    }

    fn describe(&self) -> String {
        "missing printer".to_string()
    }
}
