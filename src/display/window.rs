//! minifb window showing the PPU output.

use std::thread;
use std::time::Duration;

use log::warn;
use minifb::{KeyRepeat, Scale, ScaleMode, Window, WindowOptions};

use crate::display::{DisplayEvent, DisplaySink};
use crate::frame::{FrameBuffer, HEIGHT, WIDTH};

/// Redraw period of the idle loop, ~60 Hz.
const IDLE_INTERVAL: Duration = Duration::from_nanos(16_666_667);

pub struct WindowSink {
    window: Window,
}

impl WindowSink {
    /// Open a 256×240 window scaled by `scale` (1, 2, 4, 8; anything else fits the screen).
    pub fn open(title: &str, scale: u32) -> Result<Self, minifb::Error> {
        let scale = match scale {
            1 => Scale::X1,
            2 => Scale::X2,
            4 => Scale::X4,
            8 => Scale::X8,
            _ => Scale::FitScreen,
        };
        let mut window = Window::new(
            title,
            WIDTH,
            HEIGHT,
            WindowOptions {
                resize: true,
                scale,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )?;
        // The simulation is far slower than 60 fps; never hold it back.
        window.set_target_fps(0);
        Ok(Self { window })
    }
}

impl DisplaySink for WindowSink {
    fn present(&mut self, frame: &FrameBuffer) {
        if !self.window.is_open() {
            return;
        }
        if let Err(err) = self.window.update_with_buffer(frame.as_slice(), WIDTH, HEIGHT) {
            warn!("could not present frame: {err}");
        }
    }

    /// Polls once per ~16 ms; anything short of a quit is a `Redraw` so minifb keeps pumping
    /// window events.
    fn wait_event(&mut self) -> DisplayEvent {
        thread::sleep(IDLE_INTERVAL);
        // any key press quits
        if !self.window.is_open() || !self.window.get_keys_pressed(KeyRepeat::No).is_empty() {
            DisplayEvent::Quit
        } else {
            DisplayEvent::Redraw
        }
    }
}
