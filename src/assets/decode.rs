use std::sync::Arc;

use crate::foundation::core::Location;

/// Decoded image in straight-alpha RGBA8.
///
/// Cloning shares the pixel buffer.
#[derive(Clone, Debug)]
pub struct Raster {
    image: Arc<image::RgbaImage>,
}

impl Raster {
    pub fn new(image: image::RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Row-major, tightly packed RGBA8 bytes.
    pub fn rgba8(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// `true` when both rasters share the same pixel buffer.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.image, &b.image)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("read image bytes: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Turns a [`Location`] into a [`Raster`].
pub trait Decode: Send + Sync {
    fn decode(&self, location: &Location) -> Result<Raster, DecodeError>;
}

/// Default decoder: reads files from disk (or uses in-memory bytes) and decodes them with `image`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsDecoder;

impl Decode for FsDecoder {
    fn decode(&self, location: &Location) -> Result<Raster, DecodeError> {
        match location {
            Location::Path(path) => {
                let bytes = std::fs::read(path)?;
                decode_image(&bytes)
            }
            Location::Memory { bytes, .. } => decode_image(bytes),
        }
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    let dyn_img = image::load_from_memory(bytes)?;
    Ok(Raster::new(dyn_img.to_rgba8()))
}
