//! Controller port at $4016.
//!
//! The testbench plugs in a pad with nothing pressed. Reads return the open-bus pattern with
//! every button bit clear and advance the poll index the way a shift register would; a write
//! (strobe) rewinds the index. See [Controller reading](https://www.nesdev.org/wiki/Controller_reading).

/// Value of every $4016 read: open bus ($40) with button bit 0 clear.
pub const IDLE_PATTERN: u8 = 0x40;

/// Standard pad on port 1 ($4016) with no buttons held.
#[derive(Debug, Default, Clone)]
pub struct Controller {
    /// Index of the next button to be shifted out (A, B, Select, Start, Up, Down, Left, Right).
    pub poll_index: usize,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one button state from $4016 and advance to the next button.
    pub fn read(&mut self) -> u8 {
        self.poll_index += 1;
        IDLE_PATTERN
    }

    /// Write to $4016: the strobe restarts the button sequence.
    pub fn strobe(&mut self) {
        self.poll_index = 0;
    }
}
