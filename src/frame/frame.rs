//! Frame assembly from the video unit's pixel stream.
//!
//! Every master tick the PPU outputs one dot. Dots inside the 256×240 visible raster are
//! palette-mapped through palette RAM ($3F00 + colour, i.e. VRAM $1F00) and stored; when the
//! raster reaches the pre-render line (dot 0 of scanline 261) the frame is complete and goes to
//! the display. The buffer is reused in place: anything the next frame does not overwrite stays,
//! as it would on a real screen.

use log::debug;

use crate::bus::PpuBus;
use crate::context::RunContext;
use crate::display::DisplaySink;
use crate::frame::palette;
use crate::model::RasterPosition;

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;
/// Dot at which a frame counts as complete.
pub const FRAME_END: RasterPosition = RasterPosition { x: 0, y: 261 };

/// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<u32>,
}

impl FrameBuffer {
    /// A frame filled with palette black.
    pub fn new() -> Self {
        Self {
            pixels: vec![palette::BLACK; WIDTH * HEIGHT],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * WIDTH + x]
    }

    pub fn set(&mut self, x: usize, y: usize, pixel: u32) {
        self.pixels[y * WIDTH + x] = pixel;
    }

    /// (r, g, b) at `(x, y)`.
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        palette::channels(self.get(x, y))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.pixels.chunks_exact(WIDTH)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({WIDTH}x{HEIGHT})")
    }
}

pub struct FrameAssembler {
    frame: FrameBuffer,
    last: RasterPosition,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
            // anything but FRAME_END, so a model starting there still completes a frame
            last: RasterPosition { x: u16::MAX, y: u16::MAX },
        }
    }

    /// Take one dot of video output. Returns true when this dot completed a frame, in which case
    /// the frame has been presented to `sink` and `ctx.frame_count` advanced.
    pub fn sample<S: DisplaySink + ?Sized>(
        &mut self,
        raster: RasterPosition,
        color: u8,
        ppu: &PpuBus,
        ctx: &mut RunContext,
        sink: &mut S,
    ) -> bool {
        let (x, y) = (raster.x as usize, raster.y as usize);
        if x < WIDTH && y < HEIGHT {
            let code = ppu.palette_entry(color & 0x3F);
            self.frame.set(x, y, palette::rgb(code));
        }

        let entered_end = raster == FRAME_END && self.last != FRAME_END;
        self.last = raster;
        if !entered_end {
            return false;
        }

        ctx.frame_count += 1;
        debug!("frame {} complete at master cycle {}", ctx.frame_count, ctx.master_cycles);
        sink.present(&self.frame);
        true
    }

    /// The frame being drawn; after a completion, the last completed frame.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
