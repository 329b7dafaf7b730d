//! Order data as the backend sends it and as the desk keeps it.
//!
//! The backend is loose about scalar types: ids and totals arrive as numbers
//! or strings depending on the route, and decimal columns are often strings.
//! Wire records absorb that here so the rest of the crate works with plain
//! `String`/`f64` fields.

use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;

use crate::error::DeskError;

pub const PENDING_STATUS: &str = "PENDING";

const SPANISH_MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OrderStatus {
    Pending,
    Other(String),
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        if value == PENDING_STATUS {
            Self::Pending
        } else {
            Self::Other(value)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub id: String,
    pub name: String,
    /// Decimal total exactly as the backend rendered it.
    pub total: String,
    /// ISO-8601 creation timestamp as received.
    pub date: String,
    pub status: OrderStatus,
}

impl OrderSummary {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Creation date in the counter's display format, or the raw value when it
    /// does not parse.
    pub fn display_date(&self) -> String {
        format_display_date(&self.date).unwrap_or_else(|| self.date.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineItem {
    pub product_name: String,
    pub quantity: f64,
    pub unit_name: String,
    pub unit_price: f64,
    /// Line total as computed by the backend.
    pub price: f64,
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }

    fn as_f64(&self, field: &str) -> Result<f64, DeskError> {
        match self {
            Scalar::Int(n) => Ok(*n as f64),
            Scalar::Float(n) => Ok(*n),
            Scalar::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| DeskError::Data(format!("{field} is not numeric: {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    id: Scalar,
    #[serde(default)]
    name: Option<String>,
    total: Scalar,
    #[serde(default)]
    date: Option<String>,
    status: String,
}

impl From<OrderRecord> for OrderSummary {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.id.into_text(),
            name: record.name.unwrap_or_default(),
            total: record.total.into_text(),
            date: record.date.unwrap_or_default(),
            status: OrderStatus::from(record.status),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct UnitRecord {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    name: String,
    unit: UnitRecord,
    price_unit: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetailRecord {
    product: ProductRecord,
    quantity: Scalar,
    price: Scalar,
}

impl TryFrom<OrderDetailRecord> for OrderLineItem {
    type Error = DeskError;

    fn try_from(record: OrderDetailRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            quantity: record.quantity.as_f64("quantity")?,
            unit_price: record.product.price_unit.as_f64("product.priceUnit")?,
            price: record.price.as_f64("price")?,
            product_name: record.product.name,
            unit_name: record.product.unit.name,
        })
    }
}

/// Parse a `GET /order` body.
pub fn parse_orders(body: &str) -> Result<Vec<OrderSummary>, DeskError> {
    let records: Vec<OrderRecord> = serde_json::from_str(body)?;
    Ok(records.into_iter().map(OrderSummary::from).collect())
}

/// Parse a `GET /order-detail/order/{id}` body.
pub fn parse_order_details(body: &str) -> Result<Vec<OrderLineItem>, DeskError> {
    let records: Vec<OrderDetailRecord> = serde_json::from_str(body)?;
    records.into_iter().map(OrderLineItem::try_from).collect()
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `2021-09-01T12:00:00.000Z` → `01 de Septiembre de 2021, 12:00 PM`.
pub fn format_display_date(iso: &str) -> Option<String> {
    let trimmed = iso.trim().trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    let month = SPANISH_MONTHS[parsed.month0() as usize];
    Some(parsed.format(&format!("%d de {month} de %Y, %I:%M %p")).to_string())
}

/// Quantity without a trailing `.00` for whole numbers.
pub fn format_quantity(value: f64) -> String {
    if (value.round() - value).abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
