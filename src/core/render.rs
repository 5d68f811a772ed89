//! Session-scoped rendering context.
//!
//! Rasterizing the pipeline output back into the source extent is the
//! one piece of shared machinery every recompute needs. The context is
//! created once per chain (or once per process, when the caller injects
//! a shared handle into several chains) and reused across recomputes;
//! it owns a staging buffer that survives between calls.

use crate::core::types::{Bitmap, Extent};
use image::RgbaImage;
use log::trace;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to a [`RenderContext`], injectable at chain construction.
pub type RenderHandle = Arc<Mutex<RenderContext>>;

/// Reusable rasterizer for pipeline output.
#[derive(Debug, Default)]
pub struct RenderContext {
    staging: Vec<u8>,
    renders: u64,
}

impl RenderContext {
    /// Create a fresh context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context behind a shareable handle.
    pub fn shared() -> RenderHandle {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Number of render passes this context has served.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Rasterize `image` into `extent`.
    ///
    /// The pipeline result must always land back in the source image's
    /// coordinate space: a matching extent passes the buffer through
    /// untouched, a differing one is cropped or padded against the
    /// top-left origin. Never a resample.
    pub fn render(&mut self, image: &Bitmap, extent: Extent) -> Bitmap {
        self.renders += 1;
        if image.extent() == extent {
            trace!("render #{}: extent {extent} unchanged, passing through", self.renders);
            return image.clone();
        }
        trace!(
            "render #{}: fitting {} into {extent}",
            self.renders,
            image.extent()
        );

        let width = extent.width as usize;
        let src = image.pixels();
        self.staging.clear();
        self.staging.resize(width * extent.height as usize * 4, 0);

        let copy_width = extent.width.min(src.width()) as usize * 4;
        let src_stride = src.width() as usize * 4;
        let src_raw = src.as_raw();
        for y in 0..extent.height.min(src.height()) as usize {
            let dst_offset = y * width * 4;
            self.staging[dst_offset..dst_offset + copy_width]
                .copy_from_slice(&src_raw[y * src_stride..y * src_stride + copy_width]);
        }

        match RgbaImage::from_raw(extent.width, extent.height, self.staging.clone()) {
            Some(buffer) => Bitmap::new(buffer),
            // Unreachable with a correctly sized staging buffer.
            None => Bitmap::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_extent_passes_through() {
        let mut ctx = RenderContext::new();
        let image = Bitmap::solid(4, 4, [9, 8, 7, 255]);
        let rendered = ctx.render(&image, Extent::new(4, 4));
        assert!(rendered.ptr_eq(&image));
        assert_eq!(ctx.renders(), 1);
    }

    #[test]
    fn test_crop_to_smaller_extent() {
        let mut ctx = RenderContext::new();
        let mut buffer = RgbaImage::new(4, 4);
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            *pixel = image::Rgba([x as u8, y as u8, 0, 255]);
        }
        let rendered = ctx.render(&Bitmap::new(buffer), Extent::new(2, 2));
        assert_eq!(rendered.extent(), Extent::new(2, 2));
        assert_eq!(rendered.pixels().get_pixel(1, 1), &image::Rgba([1, 1, 0, 255]));
    }

    #[test]
    fn test_pad_to_larger_extent() {
        let mut ctx = RenderContext::new();
        let image = Bitmap::solid(2, 2, [50, 60, 70, 255]);
        let rendered = ctx.render(&image, Extent::new(4, 3));
        assert_eq!(rendered.extent(), Extent::new(4, 3));
        assert_eq!(rendered.pixels().get_pixel(0, 0), &image::Rgba([50, 60, 70, 255]));
        assert_eq!(rendered.pixels().get_pixel(3, 2), &image::Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_context_is_reused_across_passes() {
        let handle = RenderContext::shared();
        let image = Bitmap::solid(2, 2, [1, 2, 3, 255]);
        handle.lock().render(&image, Extent::new(2, 2));
        handle.lock().render(&image, Extent::new(3, 3));
        assert_eq!(handle.lock().renders(), 2);
    }
}
