//! Window icon loaded from the UI's PNG assets.

use std::path::Path;

use winit::window::{BadIcon, Icon};

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("failed to read icon: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode icon: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("unsupported icon color type: {0:?}")]
    ColorType(png::ColorType),

    #[error("invalid icon: {0}")]
    Icon(#[from] BadIcon),
}

pub fn load_icon(path: &Path) -> Result<Icon, IconError> {
    let bytes = std::fs::read(path)?;
    let (rgba, width, height) = decode_rgba(&bytes)?;
    Ok(Icon::from_rgba(rgba, width, height)?)
}

/// Decode a PNG into 8-bit RGBA pixels.
fn decode_rgba(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), IconError> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    buf.truncate(frame.buffer_size());

    let rgba = match frame.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 0xff])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 0xff]).collect(),
        other => return Err(IconError::ColorType(other)),
    };
    Ok((rgba, frame.width, frame.height))
}
