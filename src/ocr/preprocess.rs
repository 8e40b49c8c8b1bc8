/// Image preprocessing for text recognition
///
/// Turns a raw screen capture into a clean black-and-white image that the
/// OCR engine reads reliably, even for stylized comic lettering on noisy
/// backgrounds. The steps always run in this order:
///
/// 1. Grayscale conversion
/// 2. 2x upscale (linear interpolation)
/// 3. Bilateral smoothing (edge preserving)
/// 4. Inverted adaptive Gaussian threshold (text -> white, background -> black)
/// 5. Morphological closing with a 2x2 kernel
///
/// Everything here is deterministic: identical input bytes always produce
/// identical output bytes.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::capture::CapturedImage;
use crate::error::PreprocessError;

/// Small glyphs fall below the engine's resolution floor without this
pub const UPSCALE_FACTOR: u32 = 2;

/// Bilateral filter neighbourhood diameter (pixels)
pub const BILATERAL_DIAMETER: u32 = 11;
pub const BILATERAL_SIGMA_COLOR: f32 = 17.0;
pub const BILATERAL_SIGMA_SPACE: f32 = 17.0;

/// Adaptive threshold window (odd, pixels)
pub const THRESHOLD_BLOCK_SIZE: u32 = 15;
/// Subtracted from the local mean before comparing
pub const THRESHOLD_OFFSET: i32 = 10;

/// Side of the square structuring element used for closing
pub const CLOSING_KERNEL_SIZE: u32 = 2;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// A binarized image ready for recognition, stored on disk for the OCR tool
///
/// Never modified after creation; handed to the extractor by value.
#[derive(Debug)]
pub struct ProcessedImage {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl ProcessedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Run the full pipeline on a decoded image
pub fn preprocess(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return gray;
    }

    let upscaled = upscale(&gray, UPSCALE_FACTOR);
    let smoothed = bilateral_filter(
        &upscaled,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    let binary = adaptive_threshold_inverted(&smoothed, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET);
    close(&binary, CLOSING_KERNEL_SIZE)
}

/// Decode a captured image, preprocess it and write the result as PNG
///
/// The decode runs on a blocking thread since it's CPU heavy.
pub async fn preprocess_capture(
    captured: &CapturedImage,
    output: PathBuf,
) -> Result<ProcessedImage, PreprocessError> {
    let input = captured.path().to_path_buf();
    tokio::task::spawn_blocking(move || preprocess_file(&input, output)).await?
}

/// Blocking implementation of `preprocess_capture`
pub fn preprocess_file(input: &Path, output: PathBuf) -> Result<ProcessedImage, PreprocessError> {
    let image = image::open(input).map_err(|source| PreprocessError::Decode {
        path: input.to_path_buf(),
        source,
    })?;

    let processed = preprocess(&image);
    let (width, height) = processed.dimensions();

    processed.save(&output).map_err(|source| PreprocessError::Write {
        path: output.clone(),
        source,
    })?;

    debug!(
        from = ?(image.width(), image.height()),
        to = ?(width, height),
        path = %output.display(),
        "Preprocessed capture"
    );

    Ok(ProcessedImage {
        path: output,
        width,
        height,
    })
}

/// Scale both axes by `factor` using bilinear interpolation
pub fn upscale(image: &GrayImage, factor: u32) -> GrayImage {
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        FilterType::Triangle,
    )
}

/// Edge-preserving smoothing
///
/// Each output pixel is a weighted mean over a circular window where the
/// weight falls off with both spatial distance and intensity difference, so
/// texture gets flattened but glyph outlines stay sharp. Borders are
/// reflected (`dcb|abcd|cba` without repeating the edge pixel).
pub fn bilateral_filter(
    image: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    let radius = (diameter / 2) as i64;

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    // Intensity differences are bounded to 0..=255, so precompute them all
    let color_weights: Vec<f32> = (0..256u32)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut window = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = dx * dx + dy * dy;
            if dist_sq > radius * radius {
                continue;
            }
            window.push((dx, dy, (dist_sq as f32 * space_coeff).exp()));
        }
    }

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let center = image.get_pixel(x, y).0[0];
            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            for &(dx, dy, space_weight) in &window {
                let nx = reflect_101(x as i64 + dx, width);
                let ny = reflect_101(y as i64 + dy, height);
                let value = image.get_pixel(nx, ny).0[0];

                let weight = space_weight * color_weights[center.abs_diff(value) as usize];
                sum += weight * value as f32;
                weight_sum += weight;
            }

            // The center always contributes weight 1, so weight_sum > 0
            let smoothed = (sum / weight_sum).round().clamp(0.0, 255.0) as u8;
            output.put_pixel(x, y, Luma([smoothed]));
        }
    }

    output
}

/// Local-mean binarization with inverted polarity
///
/// The local mean is a Gaussian-weighted average over a `block_size` square
/// window (edges replicated). A pixel becomes white when it is at least
/// `offset` darker than that mean, black otherwise.
pub fn adaptive_threshold_inverted(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mean = gaussian_blur_replicate(image, block_size);

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let local_mean = mean.get_pixel(x, y).0[0] as i32;
        let value = if pixel.0[0] as i32 - local_mean <= -offset {
            WHITE
        } else {
            BLACK
        };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Closing: dilation followed by erosion with a `size` x `size` square
///
/// Erosion uses the reflected element so the result never shifts and is
/// always a superset of the input's white pixels. Pixels outside the image
/// are ignored.
pub fn close(image: &GrayImage, size: u32) -> GrayImage {
    let reach = size.saturating_sub(1) as i64;
    let dilated = morph(image, -reach, 0, u8::max, BLACK);
    morph(&dilated, 0, reach, u8::min, WHITE)
}

/// Apply `combine` over the square of offsets `from..=to` on both axes
fn morph(image: &GrayImage, from: i64, to: i64, combine: fn(u8, u8) -> u8, identity: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut acc = identity;
            for dy in from..=to {
                for dx in from..=to {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    acc = combine(acc, image.get_pixel(nx as u32, ny as u32).0[0]);
                }
            }
            output.put_pixel(x, y, Luma([acc]));
        }
    }

    output
}

/// Separable Gaussian blur with replicated borders
fn gaussian_blur_replicate(image: &GrayImage, block_size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let kernel = gaussian_kernel(block_size);
    let radius = (kernel.len() / 2) as i64;

    let clamp = |i: i64, len: u32| i.clamp(0, len as i64 - 1) as u32;

    let mut horizontal = vec![0.0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp(x as i64 + k as i64 - radius, width);
                acc += weight * image.get_pixel(sx, y).0[0] as f32;
            }
            horizontal[(y * width + x) as usize] = acc;
        }
    }

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp(y as i64 + k as i64 - radius, height);
                acc += weight * horizontal[(sy * width + x) as usize];
            }
            output.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }

    output
}

/// Normalized 1-D Gaussian; sigma derived from the size the way OpenCV does
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as i32;
    let scale = -0.5 / (sigma * sigma);

    let raw: Vec<f32> = (-radius..=radius)
        .map(|i| ((i * i) as f32 * scale).exp())
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Reflect an index into `0..len` without repeating the edge pixel
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let wrapped = index.rem_euclid(period);
    if wrapped >= len {
        (period - wrapped) as u32
    } else {
        wrapped as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Light noisy background with a thin dark vertical stroke at x = 10..13
    fn sample_capture() -> DynamicImage {
        let mut img = RgbImage::from_pixel(40, 20, Rgb([200, 200, 200]));
        for y in 0..20 {
            for x in 0..40 {
                // Deterministic low-amplitude texture
                let jitter = ((x * 7 + y * 13) % 5) as u8;
                img.put_pixel(x, y, Rgb([198 + jitter, 196 + jitter, 200]));
            }
        }
        for y in 2..18 {
            for x in 10..13 {
                img.put_pixel(x, y, Rgb([30, 20, 40]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_output_is_upscaled_and_binary() {
        let processed = preprocess(&sample_capture());

        assert_eq!(processed.dimensions(), (80, 40));
        assert!(processed.pixels().all(|p| p.0[0] == WHITE || p.0[0] == BLACK));
    }

    #[test]
    fn test_dark_text_becomes_white_on_black() {
        let processed = preprocess(&sample_capture());

        // Middle of the stroke after 2x upscaling
        assert_eq!(processed.get_pixel(23, 20).0[0], WHITE);
        // Plain background far from the stroke
        assert_eq!(processed.get_pixel(2, 2).0[0], BLACK);
        assert_eq!(processed.get_pixel(70, 30).0[0], BLACK);
    }

    #[test]
    fn test_deterministic_for_identical_bytes() {
        let bytes = png_bytes(&sample_capture());

        let first = preprocess(&image::load_from_memory(&bytes).unwrap());
        let second = preprocess(&image::load_from_memory(&bytes).unwrap());

        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_empty_image_passes_through() {
        let processed = preprocess(&DynamicImage::new_luma8(0, 0));
        assert_eq!(processed.dimensions(), (0, 0));
    }

    #[test]
    fn test_bilateral_keeps_hard_edges() {
        let mut img = GrayImage::from_pixel(20, 10, Luma([220]));
        for y in 0..10 {
            for x in 0..10 {
                img.put_pixel(x, y, Luma([20]));
            }
        }

        let smoothed = bilateral_filter(&img, 11, 17.0, 17.0);

        assert_eq!(smoothed.get_pixel(9, 5).0[0], 20);
        assert_eq!(smoothed.get_pixel(10, 5).0[0], 220);
    }

    #[test]
    fn test_uniform_region_thresholds_to_black() {
        let img = GrayImage::from_pixel(30, 30, Luma([90]));
        let binary = adaptive_threshold_inverted(&img, 15, 10);
        assert!(binary.pixels().all(|p| p.0[0] == BLACK));
    }

    #[test]
    fn test_closing_bridges_single_pixel_gap() {
        let mut img = GrayImage::new(7, 3);
        img.put_pixel(2, 1, Luma([WHITE]));
        img.put_pixel(4, 1, Luma([WHITE]));

        let closed = close(&img, 2);

        assert_eq!(closed.get_pixel(3, 1).0[0], WHITE);
        // Closing only ever adds white pixels
        for (x, y, p) in img.enumerate_pixels() {
            if p.0[0] == WHITE {
                assert_eq!(closed.get_pixel(x, y).0[0], WHITE);
            }
        }
        assert_eq!(closed.get_pixel(0, 0).0[0], BLACK);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn test_gaussian_kernel_is_normalized() {
        let kernel = gaussian_kernel(15);
        assert_eq!(kernel.len(), 15);
        let total: f32 = kernel.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(kernel[7] > kernel[0]);
    }

    #[test]
    fn test_undecodable_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("screen.png");
        std::fs::write(&input, b"not an image").unwrap();

        let err = preprocess_file(&input, dir.path().join("processed.png")).unwrap_err();
        assert!(matches!(err, PreprocessError::Decode { .. }));
    }

    #[test]
    fn test_preprocess_file_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("screen.png");
        sample_capture().save(&input).unwrap();

        let processed = preprocess_file(&input, dir.path().join("processed.png")).unwrap();

        assert_eq!(processed.dimensions(), (80, 40));
        assert!(processed.path().exists());
    }
}
