//! PNG screenshots.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use thiserror::Error;

use crate::frame::{FrameBuffer, HEIGHT, WIDTH};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Encode(#[from] png::EncodingError),
}

/// Save `frame` as an 8-bit RGB PNG.
pub fn save_png(frame: &FrameBuffer, path: impl AsRef<Path>) -> Result<(), CaptureError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), WIDTH as u32, HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let rgb: Vec<u8> = frame
        .rows()
        .flatten()
        .flat_map(|&pixel| crate::frame::palette::channels(pixel))
        .collect();
    writer.write_image_data(&rgb)?;
    Ok(())
}
