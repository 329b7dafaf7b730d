//! Receipt printer transports and the print routine.
//!
//! Three transports are supported:
//! - **USB**: a USB printer-class device. The kernel's `usblp` node is found by
//!   vendor/product id under `/sys/class/usbmisc` and written directly.
//!   Linux only; elsewhere use the serial or TCP transport.
//! - **USB serial**: a printer exposing a serial port, located by
//!   vendor/product id through `serialport::available_ports()`.
//! - **TCP**: raw ESC/POS to port 9100 on a network printer.
//!
//! `ReceiptPrinter::print_receipt` never returns an error: every failure is
//! folded into a [`PrintOutcome`] so the release flow can decide what to do.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info};

use crate::config::{PrinterSettings, PrinterTransportKind};
use crate::error::DeskError;
use crate::models::{OrderLineItem, OrderSummary};
use crate::receipt::{format_receipt, LayoutConfig};

/// Timeout for TCP connection to the printer.
const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout for writing a receipt over TCP.
const TCP_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Write timeout on the USB-serial port.
const SERIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// A device that accepts a complete ESC/POS job.
pub trait ReceiptSink: Send + Sync {
    fn transmit(&self, payload: &[u8]) -> Result<(), DeskError>;

    /// Human-readable device identity for logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// USB printer-class transport
// ---------------------------------------------------------------------------

pub struct UsbLinePrinter {
    vendor_id: u16,
    product_id: u16,
    sysfs_root: PathBuf,
    dev_root: PathBuf,
}

impl UsbLinePrinter {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self::with_roots(vendor_id, product_id, "/sys", "/dev")
    }

    pub fn with_roots(
        vendor_id: u16,
        product_id: u16,
        sysfs_root: impl Into<PathBuf>,
        dev_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vendor_id,
            product_id,
            sysfs_root: sysfs_root.into(),
            dev_root: dev_root.into(),
        }
    }

    fn not_found(&self) -> DeskError {
        DeskError::Printer(format!(
            "USB printer {:04x}:{:04x} not found",
            self.vendor_id, self.product_id
        ))
    }

    /// Device node (`/dev/usb/lpN`) of the first printer matching the ids.
    fn find_device(&self) -> Result<PathBuf, DeskError> {
        let class_dir = self.sysfs_root.join("class").join("usbmisc");
        let entries = fs::read_dir(&class_dir).map_err(|_| self.not_found())?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with("lp") {
                continue;
            }
            // `device` links to the USB interface; the ids sit on its parent.
            let Ok(interface) = fs::canonicalize(entry.path().join("device")) else {
                continue;
            };
            let Some(usb_device) = interface.parent() else {
                continue;
            };
            if read_usb_id(&usb_device.join("idVendor")) == Some(self.vendor_id)
                && read_usb_id(&usb_device.join("idProduct")) == Some(self.product_id)
            {
                return Ok(self.dev_root.join("usb").join(name));
            }
        }
        Err(self.not_found())
    }
}

fn read_usb_id(path: &Path) -> Option<u16> {
    let raw = fs::read_to_string(path).ok()?;
    u16::from_str_radix(raw.trim(), 16).ok()
}

impl ReceiptSink for UsbLinePrinter {
    fn transmit(&self, payload: &[u8]) -> Result<(), DeskError> {
        let path = self.find_device()?;
        let mut device = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| DeskError::Printer(format!("failed to open {}: {e}", path.display())))?;
        device
            .write_all(payload)
            .map_err(|e| DeskError::Printer(format!("write to {} failed: {e}", path.display())))?;
        device
            .flush()
            .map_err(|e| DeskError::Printer(format!("flush to {} failed: {e}", path.display())))?;
        info!(device = %path.display(), bytes = payload.len(), "Receipt sent over USB");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("usb printer {:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

// ---------------------------------------------------------------------------
// USB serial transport
// ---------------------------------------------------------------------------

pub struct UsbSerialPrinter {
    vendor_id: u16,
    product_id: u16,
    baud_rate: u32,
}

impl UsbSerialPrinter {
    pub fn new(vendor_id: u16, product_id: u16, baud_rate: u32) -> Self {
        Self {
            vendor_id,
            product_id,
            baud_rate,
        }
    }

    /// Port name of the first USB device matching the configured ids.
    fn find_port(&self) -> Result<String, DeskError> {
        let ports = serialport::available_ports()?;
        ports
            .into_iter()
            .find(|p| match &p.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    usb.vid == self.vendor_id && usb.pid == self.product_id
                }
                _ => false,
            })
            .map(|p| p.port_name)
            .ok_or_else(|| {
                DeskError::Printer(format!(
                    "USB serial printer {:04x}:{:04x} not found",
                    self.vendor_id, self.product_id
                ))
            })
    }
}

impl ReceiptSink for UsbSerialPrinter {
    fn transmit(&self, payload: &[u8]) -> Result<(), DeskError> {
        let port_name = self.find_port()?;
        let mut port = serialport::new(&port_name, self.baud_rate)
            .timeout(SERIAL_TIMEOUT)
            .open()
            .map_err(|e| DeskError::Printer(format!("failed to open {port_name}: {e}")))?;
        port.write_all(payload)
            .map_err(|e| DeskError::Printer(format!("write to {port_name} failed: {e}")))?;
        port.flush()
            .map_err(|e| DeskError::Printer(format!("flush to {port_name} failed: {e}")))?;
        info!(port = %port_name, bytes = payload.len(), "Receipt sent over USB serial");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("usb serial {:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

// ---------------------------------------------------------------------------
// TCP transport
// ---------------------------------------------------------------------------

pub struct TcpPrinter {
    host: String,
    port: u16,
}

impl TcpPrinter {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

impl ReceiptSink for TcpPrinter {
    fn transmit(&self, payload: &[u8]) -> Result<(), DeskError> {
        let addr_str = format!("{}:{}", self.host, self.port);
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| DeskError::Printer(format!("invalid printer address {addr_str}: {e}")))?
            .next()
            .ok_or_else(|| DeskError::Printer(format!("no address for {addr_str}")))?;

        let stream = TcpStream::connect_timeout(&addr, TCP_CONNECT_TIMEOUT)
            .map_err(|e| DeskError::Printer(format!("TCP connect to {addr_str} failed: {e}")))?;
        stream.set_write_timeout(Some(TCP_WRITE_TIMEOUT))?;

        let mut writer = std::io::BufWriter::new(stream);
        writer
            .write_all(payload)
            .map_err(|e| DeskError::Printer(format!("TCP write to {addr_str}: {e}")))?;
        writer
            .flush()
            .map_err(|e| DeskError::Printer(format!("TCP flush to {addr_str}: {e}")))?;

        info!(addr = %addr_str, bytes = payload.len(), "Receipt sent over TCP");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp {}:{}", self.host, self.port)
    }
}

pub fn sink_from_settings(settings: &PrinterSettings) -> Box<dyn ReceiptSink> {
    match settings.transport {
        PrinterTransportKind::Usb => Box::new(UsbLinePrinter::new(
            settings.vendor_id,
            settings.product_id,
        )),
        PrinterTransportKind::UsbSerial => Box::new(UsbSerialPrinter::new(
            settings.vendor_id,
            settings.product_id,
            settings.baud_rate,
        )),
        PrinterTransportKind::Tcp => Box::new(TcpPrinter::new(&settings.host, settings.port)),
    }
}

// ---------------------------------------------------------------------------
// Print routine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
}

pub struct ReceiptPrinter {
    sink: Box<dyn ReceiptSink>,
    layout: LayoutConfig,
}

impl ReceiptPrinter {
    pub fn new(sink: Box<dyn ReceiptSink>, layout: LayoutConfig) -> Self {
        Self { sink, layout }
    }

    pub fn print_receipt(&self, order: &OrderSummary, items: &[OrderLineItem]) -> PrintOutcome {
        self.print_receipt_at(order, items, Local::now().naive_local())
    }

    pub fn print_receipt_at(
        &self,
        order: &OrderSummary,
        items: &[OrderLineItem],
        printed_at: NaiveDateTime,
    ) -> PrintOutcome {
        let result = format_receipt(order, items, &self.layout, printed_at).and_then(|receipt| {
            debug!(order_id = %order.id, "Receipt text:\n{}", receipt.to_text());
            self.sink.transmit(&receipt.to_escpos())
        });
        match result {
            Ok(()) => {
                info!(order_id = %order.id, device = %self.sink.describe(), "Receipt printed");
                PrintOutcome {
                    success: true,
                    message: "Receipt printed successfully.".to_string(),
                }
            }
            Err(e) => {
                error!(order_id = %order.id, device = %self.sink.describe(), error = %e, "Receipt printing failed");
                PrintOutcome {
                    success: false,
                    message: format!("Error printing receipt: {e}"),
                }
            }
        }
    }
}
