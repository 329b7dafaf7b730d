//! Minimal ESC/POS binary command builder for thermal receipt printers.
//!
//! Generates raw byte sequences that are written straight to the printer
//! device. Supports text styling, alignment, Latin-1 Spanish characters via
//! code page PC850, QR codes, EAN-8 barcodes, and paper cutting.

// ESC/POS command bytes
const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// `ESC t 2` selects PC850 (Multilingual) on Epson-compatible printers.
const CODE_PAGE_PC850: u8 = 2;

/// Paper width in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperWidth {
    Mm58,
    Mm80,
}

impl PaperWidth {
    pub fn chars(self) -> usize {
        match self {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }

    pub fn from_mm(mm: i32) -> Self {
        if mm <= 58 {
            PaperWidth::Mm58
        } else {
            PaperWidth::Mm80
        }
    }
}

/// Builder for generating ESC/POS binary command buffers.
///
/// ```rust,ignore
/// let mut b = EscPosBuilder::new();
/// b.init()
///     .latin_mode()
///     .center()
///     .bold(true).text("RECIBO\n").bold(false)
///     .left()
///     .text("Taco        1      PZA      $12.50\n")
///     .feed(3)
///     .cut();
/// let data = b.build();
/// ```
pub struct EscPosBuilder {
    buffer: Vec<u8>,
    paper: PaperWidth,
    latin_mode: bool,
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            paper: PaperWidth::Mm80,
            latin_mode: false,
        }
    }

    pub fn with_paper(mut self, paper: PaperWidth) -> Self {
        self.paper = paper;
        self
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// ESC @: Initialize printer, reset to defaults.
    pub fn init(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x40]);
        self
    }

    /// ESC t n: Select character code page.
    pub fn code_page(&mut self, page: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x74, page]);
        self
    }

    /// Switch the printer to PC850 and encode accented text accordingly.
    pub fn latin_mode(&mut self) -> &mut Self {
        self.code_page(CODE_PAGE_PC850);
        self.latin_mode = true;
        self
    }

    // -----------------------------------------------------------------------
    // Text formatting
    // -----------------------------------------------------------------------

    /// ESC E n: Bold on/off.
    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.buffer
            .extend_from_slice(&[ESC, 0x45, if on { 1 } else { 0 }]);
        self
    }

    /// GS ! n: Set text size (width × height multiplier, 1–8 each).
    pub fn text_size(&mut self, width: u8, height: u8) -> &mut Self {
        let w = width.clamp(1, 8) - 1;
        let h = height.clamp(1, 8) - 1;
        self.buffer.extend_from_slice(&[GS, 0x21, (w << 4) | h]);
        self
    }

    // -----------------------------------------------------------------------
    // Alignment
    // -----------------------------------------------------------------------

    /// ESC a 0: Left-align.
    pub fn left(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 0]);
        self
    }

    /// ESC a 1: Centre-align.
    pub fn center(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 1]);
        self
    }

    // -----------------------------------------------------------------------
    // Text output
    // -----------------------------------------------------------------------

    /// Append text. Characters are encoded as ASCII or PC850 (Latin mode).
    pub fn text(&mut self, s: &str) -> &mut Self {
        if self.latin_mode {
            self.buffer.extend(encode_pc850(s));
        } else {
            for ch in s.chars() {
                let code = ch as u32;
                if code < 0x80 {
                    self.buffer.push(code as u8);
                } else {
                    self.buffer.push(b'?');
                }
            }
        }
        self
    }

    /// Append a line-feed.
    pub fn lf(&mut self) -> &mut Self {
        self.buffer.push(LF);
        self
    }

    /// Print a horizontal separator using dashes, matching paper width.
    pub fn separator(&mut self) -> &mut Self {
        let width = self.paper.chars();
        self.rule(width)
    }

    /// Print a dashed rule of an explicit width.
    pub fn rule(&mut self, width: usize) -> &mut Self {
        self.buffer.extend(std::iter::repeat(b'-').take(width));
        self.buffer.push(LF);
        self
    }

    // -----------------------------------------------------------------------
    // Symbols
    // -----------------------------------------------------------------------

    /// GS ( k: Store and print a QR code (model 2, module size 3, level L).
    pub fn qr(&mut self, data: &str) -> &mut Self {
        let payload = data.as_bytes();
        // Model 2
        self.buffer
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]);
        // Module size
        self.buffer
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x03]);
        // Error correction level L
        self.buffer
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x30]);
        // Store data: pL pH count the 3 function bytes plus the payload
        let len = payload.len() + 3;
        self.buffer.extend_from_slice(&[
            GS,
            0x28,
            0x6B,
            (len & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            0x31,
            0x50,
            0x30,
        ]);
        self.buffer.extend_from_slice(payload);
        // Print stored symbol
        self.buffer
            .extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);
        self
    }

    /// GS k 68 n d1..dn: EAN-8 barcode with human-readable digits below.
    ///
    /// `digits` must already be 7 or 8 ASCII digits; the printer computes or
    /// verifies the check digit.
    pub fn ean8(&mut self, digits: &str) -> &mut Self {
        // Height 64 dots, module width 3, HRI below, font A
        self.buffer.extend_from_slice(&[GS, 0x68, 64]);
        self.buffer.extend_from_slice(&[GS, 0x77, 3]);
        self.buffer.extend_from_slice(&[GS, 0x48, 2]);
        self.buffer.extend_from_slice(&[GS, 0x66, 0]);
        self.buffer
            .extend_from_slice(&[GS, 0x6B, 0x44, digits.len() as u8]);
        self.buffer.extend_from_slice(digits.as_bytes());
        self
    }

    // -----------------------------------------------------------------------
    // Feed / cut
    // -----------------------------------------------------------------------

    /// ESC d n: Feed n lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x64, lines]);
        self
    }

    /// GS V A 16: Partial cut with 16-dot feed.
    pub fn cut(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[GS, 0x56, 0x41, 0x10]);
        self
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// Consume the builder and return the binary ESC/POS payload.
    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

// ---------------------------------------------------------------------------
// PC850 encoding
// ---------------------------------------------------------------------------

/// Encode a string to PC850 bytes. ASCII passes through; the Spanish accented
/// letters and punctuation are mapped; anything else becomes `?`.
fn encode_pc850(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        if code < 0x80 {
            bytes.push(code as u8);
            continue;
        }
        bytes.push(latin_to_pc850(ch).unwrap_or(b'?'));
    }
    bytes
}

fn latin_to_pc850(ch: char) -> Option<u8> {
    match ch {
        'á' => Some(0xA0),
        'é' => Some(0x82),
        'í' => Some(0xA1),
        'ó' => Some(0xA2),
        'ú' => Some(0xA3),
        'ñ' => Some(0xA4),
        'ü' => Some(0x81),
        'Á' => Some(0xB5),
        'É' => Some(0x90),
        'Í' => Some(0xD6),
        'Ó' => Some(0xE0),
        'Ú' => Some(0xE9),
        'Ñ' => Some(0xA5),
        'Ü' => Some(0x9A),
        '¡' => Some(0xAD),
        '¿' => Some(0xA8),
        '°' => Some(0xF8),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
