//! Display Sink
//!
//! Turns processed images into egui textures, fitted to the space available
//! while keeping their aspect ratio.

use egui::{ColorImage, TextureHandle, TextureOptions, Vec2};
use image::{DynamicImage, GrayImage};
use opencv::{core, core::Mat, imgproc, prelude::*};

/// Scale factor that fits `size` inside `bounds`.
///
/// With `allow_upscale == false` the factor never exceeds 1.0, so small images
/// are shown at their natural size.
pub fn fit_scale(size: Vec2, bounds: Vec2, allow_upscale: bool) -> f32 {
    if size.x <= 0.0 || size.y <= 0.0 || bounds.x <= 0.0 || bounds.y <= 0.0 {
        return 0.0;
    }

    let scale = (bounds.x / size.x).min(bounds.y / size.y);
    if allow_upscale {
        scale
    } else {
        scale.min(1.0)
    }
}

/// Size of `size` after fitting it inside `bounds`, rounded down to whole pixels
pub fn fit_size(size: Vec2, bounds: Vec2, allow_upscale: bool) -> Vec2 {
    let scale = fit_scale(size, bounds, allow_upscale);
    Vec2::new((size.x * scale).floor(), (size.y * scale).floor())
}

/// Convert an OpenCV image (BGR, BGRA or gray, 8-bit) to an RGB egui image
pub fn mat_to_color_image(mat: &Mat) -> opencv::Result<ColorImage> {
    if mat.depth() != core::CV_8U {
        return Err(opencv::Error::new(
            core::StsUnsupportedFormat,
            format!("expected an 8-bit image, got depth {}", mat.depth()),
        ));
    }

    let code = match mat.channels() {
        1 => imgproc::COLOR_GRAY2RGB,
        3 => imgproc::COLOR_BGR2RGB,
        4 => imgproc::COLOR_BGRA2RGB,
        n => {
            return Err(opencv::Error::new(
                core::StsUnsupportedFormat,
                format!("unsupported channel count {}", n),
            ))
        }
    };

    let mut rgb = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb, code)?;
    let rgb = if rgb.is_continuous() { rgb } else { rgb.try_clone()? };

    let size = [rgb.cols() as usize, rgb.rows() as usize];
    Ok(ColorImage::from_rgb(size, rgb.data_bytes()?))
}

/// Convert a decoded image file to an egui image
pub fn dynamic_to_color_image(image: &DynamicImage) -> ColorImage {
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}

/// Convert a single-channel image to an egui image
pub fn gray_to_color_image(image: &GrayImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_gray(size, image.as_raw())
}

/// One on-screen image slot whose texture is replaced on every update
pub struct DisplaySink {
    name: String,
    texture: Option<TextureHandle>,
}

impl std::fmt::Debug for DisplaySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySink")
            .field("name", &self.name)
            .field("texture", &self.texture.as_ref().map(|_| "<texture>"))
            .finish()
    }
}

impl DisplaySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: None,
        }
    }

    /// Replace the shown image
    pub fn show(&mut self, ctx: &egui::Context, image: ColorImage) {
        match self.texture.as_mut() {
            Some(texture) if texture.size() == image.size => {
                texture.set(image, TextureOptions::LINEAR);
            }
            _ => {
                // Dropping the old handle frees its texture
                self.texture = Some(ctx.load_texture(&self.name, image, TextureOptions::LINEAR));
            }
        }
    }

    /// Convert and show an OpenCV image
    pub fn show_mat(&mut self, ctx: &egui::Context, mat: &Mat) -> opencv::Result<()> {
        let image = mat_to_color_image(mat)?;
        self.show(ctx, image);
        Ok(())
    }

    /// Drop the current image
    pub fn clear(&mut self) {
        self.texture = None;
    }

    pub fn has_image(&self) -> bool {
        self.texture.is_some()
    }

    /// Paint the image fitted into `bounds`. Returns false when empty.
    pub fn paint(&self, ui: &mut egui::Ui, bounds: Vec2, allow_upscale: bool) -> bool {
        let Some(texture) = &self.texture else {
            return false;
        };

        let size = fit_size(texture.size_vec2(), bounds, allow_upscale);
        ui.image((texture.id(), size));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1, CV_8UC3};

    fn aspect(v: Vec2) -> f32 {
        v.x / v.y
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        let cases = [
            (Vec2::new(1920.0, 1080.0), Vec2::new(800.0, 600.0)),
            (Vec2::new(640.0, 480.0), Vec2::new(300.0, 900.0)),
            (Vec2::new(333.0, 777.0), Vec2::new(150.0, 150.0)),
            (Vec2::new(4000.0, 30.0), Vec2::new(1000.0, 700.0)),
        ];

        for (size, bounds) in cases {
            let fitted = fit_size(size, bounds, false);
            assert!(fitted.x <= bounds.x && fitted.y <= bounds.y);
            // Flooring changes each side by less than one pixel
            let tolerance = 1.0 / fitted.y.max(1.0) + 1.0 / fitted.x.max(1.0);
            assert!(
                (aspect(fitted) - aspect(size)).abs() / aspect(size) < tolerance,
                "{:?} -> {:?}",
                size,
                fitted
            );
        }
    }

    #[test]
    fn test_fit_fills_one_dimension() {
        let fitted = fit_size(Vec2::new(1920.0, 1080.0), Vec2::new(800.0, 600.0), false);
        assert_eq!(fitted.x, 800.0);
        assert_eq!(fitted.y, 450.0);
    }

    #[test]
    fn test_fit_never_upscales_when_disallowed() {
        let size = Vec2::new(320.0, 240.0);
        assert_eq!(fit_size(size, Vec2::new(1000.0, 1000.0), false), size);
    }

    #[test]
    fn test_thumbnail_upscales() {
        let fitted = fit_size(Vec2::new(50.0, 100.0), Vec2::new(150.0, 150.0), true);
        assert_eq!(fitted, Vec2::new(75.0, 150.0));
    }

    #[test]
    fn test_fit_degenerate_sizes() {
        assert_eq!(fit_scale(Vec2::ZERO, Vec2::new(100.0, 100.0), false), 0.0);
        assert_eq!(fit_scale(Vec2::new(10.0, 10.0), Vec2::new(0.0, 100.0), true), 0.0);
    }

    #[test]
    fn test_mat_bgr_to_rgb() {
        let mat = Mat::new_rows_cols_with_default(2, 3, CV_8UC3, Scalar::new(255.0, 0.0, 0.0, 0.0))
            .unwrap();

        let image = mat_to_color_image(&mat).unwrap();
        assert_eq!(image.size, [3, 2]);
        assert!(image
            .pixels
            .iter()
            .all(|p| *p == egui::Color32::from_rgb(0, 0, 255)));
    }

    #[test]
    fn test_mat_gray_to_rgb() {
        let mat = Mat::new_rows_cols_with_default(4, 4, CV_8UC1, Scalar::all(200.0)).unwrap();

        let image = mat_to_color_image(&mat).unwrap();
        assert_eq!(image.pixels[0], egui::Color32::from_rgb(200, 200, 200));
    }

    #[test]
    fn test_sink_replaces_and_releases_texture() {
        let ctx = egui::Context::default();
        let mut sink = DisplaySink::new("test_sink");
        assert!(!sink.has_image());

        sink.show(&ctx, ColorImage::new([4, 3], egui::Color32::RED));
        let first = sink.texture.as_ref().map(|t| t.id()).unwrap();

        // Same size updates the existing texture in place
        sink.show(&ctx, ColorImage::new([4, 3], egui::Color32::BLUE));
        assert_eq!(sink.texture.as_ref().map(|t| t.id()), Some(first));

        // A new size allocates a new texture and frees the old one
        sink.show(&ctx, ColorImage::new([8, 6], egui::Color32::GREEN));
        let second = sink.texture.as_ref().map(|t| t.id()).unwrap();
        assert_ne!(second, first);
        assert_eq!(sink.texture.as_ref().map(|t| t.size()), Some([8, 6]));
        assert!(ctx.tex_manager().read().meta(first).is_none());

        sink.clear();
        assert!(!sink.has_image());
        assert!(ctx.tex_manager().read().meta(second).is_none());
    }

    #[test]
    fn test_gray_image_conversion() {
        let gray = GrayImage::from_pixel(5, 3, image::Luma([0u8]));
        let image = gray_to_color_image(&gray);
        assert_eq!(image.size, [5, 3]);
        assert_eq!(image.pixels.len(), 15);
    }
}
