//! Presentation of completed frames.
//!
//! - **window**: a minifb window scaled up from 256×240.
//! - **capture**: PNG screenshots of a frame.
//!
//! Presentation is synchronous: simulation waits while a frame is shown, so frames reach the
//! sink in completion order.

pub mod capture;
pub mod window;

pub use window::WindowSink;

use crate::frame::FrameBuffer;

/// What the user asked for while the testbench is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    Redraw,
    Quit,
}

/// Receiver of completed frames.
pub trait DisplaySink {
    fn present(&mut self, frame: &FrameBuffer);
    /// Next request from the user. A sink may block for one, or poll briefly and answer
    /// `Redraw` when there is nothing else to report, as the window does every ~16 ms.
    fn wait_event(&mut self) -> DisplayEvent;
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn present(&mut self, frame: &FrameBuffer) {
        (**self).present(frame)
    }

    fn wait_event(&mut self) -> DisplayEvent {
        (**self).wait_event()
    }
}

/// Sink for runs without a screen: counts frames and keeps the latest one.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    pub frames_presented: u64,
    pub last: Option<FrameBuffer>,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for HeadlessSink {
    fn present(&mut self, frame: &FrameBuffer) {
        self.frames_presented += 1;
        match &mut self.last {
            Some(last) => last.clone_from(frame),
            None => self.last = Some(frame.clone()),
        }
    }

    fn wait_event(&mut self) -> DisplayEvent {
        DisplayEvent::Quit
    }
}

/// Re-present `frame` on every `Redraw` until the sink asks to quit. With a polling sink this
/// refreshes the frame at the polling rate.
pub fn idle<S: DisplaySink + ?Sized>(sink: &mut S, frame: &FrameBuffer) {
    while sink.wait_event() == DisplayEvent::Redraw {
        sink.present(frame);
    }
}
