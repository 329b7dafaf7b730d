use chrono::NaiveDateTime;

use crate::config::{PrinterSettings, ReceiptSettings};
use crate::error::DeskError;
use crate::escpos::{EscPosBuilder, PaperWidth};
use crate::models::{format_quantity, OrderLineItem, OrderSummary};

pub const COLUMN_HEADER: &str = "ARTICULO    CANT.           TOTAL";

const NAME_WIDTH: usize = 12;
const UNIT_WIDTH: usize = 8;
const TOTAL_WIDTH: usize = 12;
const SHORT_RULE: usize = 32;
const BARCODE_DIGITS: usize = 8;

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub paper_width: PaperWidth,
    pub merchant_name: String,
    pub address: String,
    pub phone: String,
    pub contact_url: String,
    pub thank_you_lines: Vec<String>,
    pub use_item_quantity: bool,
}

impl LayoutConfig {
    pub fn from_settings(receipt: &ReceiptSettings, printer: &PrinterSettings) -> Self {
        Self {
            paper_width: PaperWidth::from_mm(printer.paper_width_mm),
            merchant_name: receipt.merchant_name.clone(),
            address: receipt.address.clone(),
            phone: receipt.phone.clone(),
            contact_url: receipt.contact_url.clone(),
            thank_you_lines: receipt.thank_you_lines.clone(),
            use_item_quantity: receipt.use_item_quantity,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::from_settings(&ReceiptSettings::default(), &PrinterSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One step of the printer's line protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptOp {
    Style { bold: bool, size: u8 },
    Align(Align),
    Line(String),
    Rule(usize),
    Qr(String),
    Ean8(String),
    Cut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub paper_width_chars: usize,
    pub ops: Vec<ReceiptOp>,
}

impl Receipt {
    /// Plain-text rendering, written to the debug log before each print.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for op in &self.ops {
            match op {
                ReceiptOp::Line(text) => lines.push(text.clone()),
                ReceiptOp::Rule(width) => lines.push("-".repeat(*width)),
                ReceiptOp::Qr(data) => lines.push(format!("[QR] {data}")),
                ReceiptOp::Ean8(digits) => lines.push(format!("[EAN-8] {digits}")),
                ReceiptOp::Style { .. } | ReceiptOp::Align(_) | ReceiptOp::Cut => {}
            }
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    pub fn to_escpos(&self) -> Vec<u8> {
        let paper = if self.paper_width_chars <= PaperWidth::Mm58.chars() {
            PaperWidth::Mm58
        } else {
            PaperWidth::Mm80
        };
        let mut builder = EscPosBuilder::new().with_paper(paper);
        builder.init().latin_mode();
        for op in &self.ops {
            match op {
                ReceiptOp::Style { bold, size } => {
                    builder.bold(*bold).text_size(*size, *size);
                }
                ReceiptOp::Align(Align::Left) => {
                    builder.left();
                }
                ReceiptOp::Align(Align::Center) => {
                    builder.center();
                }
                ReceiptOp::Line(text) => {
                    builder.text(text).lf();
                }
                ReceiptOp::Rule(width) if *width == self.paper_width_chars => {
                    builder.separator();
                }
                ReceiptOp::Rule(width) => {
                    builder.rule(*width);
                }
                ReceiptOp::Qr(data) => {
                    builder.qr(data).lf();
                }
                ReceiptOp::Ean8(digits) => {
                    builder.ean8(digits).lf();
                }
                ReceiptOp::Cut => {
                    builder.feed(4).cut();
                }
            }
        }
        builder.build()
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:<width$}")
}

fn pad_left(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:>width$}")
}

/// `Taco        1      PZA      $12.50`
pub fn format_item_line(item: &OrderLineItem, use_item_quantity: bool) -> String {
    let quantity = if use_item_quantity { item.quantity } else { 1.0 };
    let total = quantity * item.unit_price;
    format!(
        "{}{} {}{}",
        pad_right(&item.product_name, NAME_WIDTH),
        format_quantity(quantity),
        pad_left(&item.unit_name, UNIT_WIDTH),
        pad_left(&format!("${total:.2}"), TOTAL_WIDTH),
    )
}

/// First eight characters of the order id, left-padded with zeros.
pub fn ean8_payload(order_id: &str) -> Result<String, DeskError> {
    let clipped: String = order_id.trim().chars().take(BARCODE_DIGITS).collect();
    let digits = format!("{clipped:0>BARCODE_DIGITS$}");
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DeskError::Printer(format!(
            "order id {order_id:?} cannot be encoded as EAN-8"
        )));
    }
    Ok(digits)
}

pub fn format_receipt(
    order: &OrderSummary,
    items: &[OrderLineItem],
    cfg: &LayoutConfig,
    printed_at: NaiveDateTime,
) -> Result<Receipt, DeskError> {
    let full_rule = cfg.paper_width.chars();
    let barcode = ean8_payload(&order.id)?;
    let mut ops = Vec::with_capacity(24 + items.len());

    // Header
    ops.push(ReceiptOp::Style { bold: true, size: 2 });
    ops.push(ReceiptOp::Line(cfg.merchant_name.clone()));
    ops.push(ReceiptOp::Style { bold: false, size: 1 });
    ops.push(ReceiptOp::Line(cfg.address.clone()));
    ops.push(ReceiptOp::Line(cfg.phone.clone()));
    ops.push(ReceiptOp::Line(format!("Orden #{}", order.id)));
    ops.push(ReceiptOp::Line(
        printed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ));
    ops.push(ReceiptOp::Rule(SHORT_RULE));

    // Items
    ops.push(ReceiptOp::Align(Align::Left));
    ops.push(ReceiptOp::Style { bold: true, size: 1 });
    ops.push(ReceiptOp::Line(COLUMN_HEADER.to_string()));
    ops.push(ReceiptOp::Rule(full_rule));
    ops.push(ReceiptOp::Style { bold: false, size: 1 });
    for item in items {
        ops.push(ReceiptOp::Line(format_item_line(item, cfg.use_item_quantity)));
    }
    ops.push(ReceiptOp::Rule(full_rule));
    ops.push(ReceiptOp::Line(String::new()));

    // Total
    ops.push(ReceiptOp::Align(Align::Center));
    ops.push(ReceiptOp::Style { bold: true, size: 2 });
    ops.push(ReceiptOp::Line(format!("Total: ${}", order.total)));
    ops.push(ReceiptOp::Style { bold: false, size: 1 });
    ops.push(ReceiptOp::Rule(SHORT_RULE));
    ops.push(ReceiptOp::Line(String::new()));

    // Footer
    for line in &cfg.thank_you_lines {
        ops.push(ReceiptOp::Line(line.clone()));
    }
    if !cfg.contact_url.trim().is_empty() {
        ops.push(ReceiptOp::Qr(cfg.contact_url.clone()));
    }
    ops.push(ReceiptOp::Ean8(barcode));
    ops.push(ReceiptOp::Cut);

    Ok(Receipt {
        paper_width_chars: full_rule,
        ops,
    })
}
