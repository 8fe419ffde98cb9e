//! Diagnostic mailbox at $6000–$6FFF.
//!
//! Test ROMs report progress here: a status byte at $6000, the signature `DE B0 61` at
//! $6001–$6003, and a NUL-terminated message from $6004. The mailbox is write-only from the
//! program's point of view; the testbench only surfaces what was written.

use log::info;

/// First CPU address backed by the mailbox.
pub const MAILBOX_BASE: u16 = 0x6000;
/// Mailbox size: 4 KiB.
pub const MAILBOX_LEN: usize = 0x1000;
/// Offset of the status text.
pub const MESSAGE_OFFSET: usize = 4;
/// Signature written at offsets 1–3 once the status text is valid.
pub const SIGNATURE: [u8; 3] = [0xDE, 0xB0, 0x61];

pub struct Mailbox {
    bytes: Box<[u8; MAILBOX_LEN]>,
    last_message: String,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; MAILBOX_LEN]),
            last_message: String::new(),
        }
    }

    /// True when `addr` falls in the mailbox window.
    pub fn contains(addr: u16) -> bool {
        (addr as usize).wrapping_sub(MAILBOX_BASE as usize) < MAILBOX_LEN
    }

    /// Store a byte at `offset` (already relative to $6000). Logs the status text when it changes.
    pub fn write(&mut self, offset: usize, data: u8) {
        let offset = offset % MAILBOX_LEN;
        self.bytes[offset] = data;
        if offset < MESSAGE_OFFSET {
            return;
        }

        let message = self.message();
        if message != self.last_message {
            if !message.is_empty() {
                info!("mailbox: {message}");
            }
            self.last_message = message;
        }
    }

    pub fn byte(&self, offset: usize) -> u8 {
        self.bytes[offset % MAILBOX_LEN]
    }

    /// Status byte at $6000: $80 while running, $81 when a reset is requested, else a result code.
    pub fn status(&self) -> u8 {
        self.bytes[0]
    }

    pub fn has_signature(&self) -> bool {
        self.bytes[1..4] == SIGNATURE
    }

    /// NUL-terminated text from $6004. Bytes other than printable ASCII show as `\xNN`.
    pub fn message(&self) -> String {
        let mut text = String::new();
        for &b in self.bytes[MESSAGE_OFFSET..].iter().take_while(|&&b| b != 0) {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                text.push(b as char);
            } else {
                text.push_str(&format!("\\x{b:02X}"));
            }
        }
        text
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
