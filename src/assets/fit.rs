use image::imageops::FilterType;

use crate::{
    assets::decode::Raster,
    foundation::{
        core::{Point, Rect, Size},
        error::{SortError, SortResult},
    },
};

/// Share of the render bounds a fitted image may occupy.
pub const DEFAULT_FILL_RATIO: f64 = 0.75;

/// Largest fitted raster, in pixels, that [`fit_to_bounds`] will allocate.
pub const MAX_FITTED_PIXELS: u64 = 1 << 26;

/// A raster scaled for display, plus where to place it.
#[derive(Clone, Debug)]
pub struct Fitted {
    pub raster: Raster,
    /// Placement rectangle in render space, centred on the requested centre point.
    pub placement: Rect,
}

pub(crate) fn validate_render_target(bounds: Size, center: Point) -> SortResult<()> {
    if !bounds.is_finite() || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Err(SortError::validation(
            "render bounds must be finite with width/height > 0",
        ));
    }
    if !center.is_finite() {
        return Err(SortError::validation("render center must be finite"));
    }
    Ok(())
}

/// Uniform scale factor that fits `src` inside `bounds`, shrunk by `fill_ratio`.
pub fn fit_scale(src: Size, bounds: Size, fill_ratio: f64) -> f64 {
    (bounds.width / src.width).min(bounds.height / src.height) * fill_ratio
}

fn fitted_dimensions(src: Size, scale: f64) -> SortResult<(u32, u32)> {
    let w = (src.width * scale).round().max(1.0);
    let h = (src.height * scale).round().max(1.0);
    if !w.is_finite() || !h.is_finite() || w * h > MAX_FITTED_PIXELS as f64 {
        return Err(SortError::fit(format!(
            "fitted size {w}x{h} exceeds {MAX_FITTED_PIXELS} pixels"
        )));
    }
    Ok((w as u32, h as u32))
}

/// Scale `raster` (aspect preserved) to fit `bounds` and centre it on `center`.
pub fn fit_to_bounds(
    raster: &Raster,
    bounds: Size,
    center: Point,
    fill_ratio: f64,
) -> SortResult<Fitted> {
    validate_render_target(bounds, center)?;
    if !fill_ratio.is_finite() || fill_ratio <= 0.0 {
        return Err(SortError::fit("fill ratio must be finite and > 0"));
    }
    if raster.width() == 0 || raster.height() == 0 {
        return Err(SortError::fit("cannot fit an empty raster"));
    }

    let src = Size::new(f64::from(raster.width()), f64::from(raster.height()));
    let scale = fit_scale(src, bounds, fill_ratio);
    let (w, h) = fitted_dimensions(src, scale)?;

    let scaled = if w == raster.width() && h == raster.height() {
        raster.clone()
    } else {
        Raster::new(image::imageops::resize(
            raster.as_rgba(),
            w,
            h,
            FilterType::Triangle,
        ))
    };

    let size = Size::new(f64::from(w), f64::from(h));
    let origin = center - size.to_vec2() / 2.0;
    Ok(Fitted {
        raster: scaled,
        placement: Rect::from_origin_size(origin, size),
    })
}
