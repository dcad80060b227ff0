use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use ndarray::{Array4, ArrayView4};

use super::classifier::ClassifyError;

pub const INPUT_SIZE: u32 = 32;
pub const INPUT_CHANNELS: usize = 3;
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];

/// Batch of one 32x32 RGB image, channels last, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(Array4<f32>);

impl InputTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    /// Row-major (N, H, W, C) data.
    pub fn as_slice(&self) -> &[f32] {
        // Built by from_shape_fn, so always standard layout.
        self.0.as_slice().unwrap_or(&[])
    }
}

/// Decodes JPEG or PNG bytes into an RGB raster, dropping alpha and
/// replicating grayscale into three channels.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ClassifyError> {
    if bytes.is_empty() {
        return Err(ClassifyError::Decode("empty image data".into()));
    }

    let format = image::guess_format(bytes)
        .map_err(|_| ClassifyError::Decode("unrecognized image encoding".into()))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(ClassifyError::Decode(format!(
            "unsupported image encoding: {:?}",
            format
        )));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ClassifyError::Decode(e.to_string()))?;
    Ok(decoded.to_rgb8())
}

/// Resizes without preserving aspect ratio and scales channels by 1/255.
pub fn normalize(image: &RgbImage, filter: FilterType) -> InputTensor {
    let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, filter);
    let tensor = Array4::from_shape_fn(INPUT_SHAPE, |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });
    InputTensor(tensor)
}

pub fn preprocess(bytes: &[u8], filter: FilterType) -> Result<InputTensor, ClassifyError> {
    let image = decode_rgb(bytes)?;
    log::debug!(
        "Decoded {}x{} image, resizing to {}x{}",
        image.width(),
        image.height(),
        INPUT_SIZE,
        INPUT_SIZE
    );
    Ok(normalize(&image, filter))
}


#[cfg(test)]
mod tests {
    use super::test_images::*;
    use super::*;

    #[test]
    fn test_shape_is_fixed_for_any_source_size() {
        for (w, h) in [(1, 1), (32, 32), (64, 64), (300, 17), (5, 640)] {
            let bytes = solid_rgb_png(w, h, [10, 20, 30]);
            let tensor = preprocess(&bytes, FilterType::Triangle).unwrap();
            assert_eq!(tensor.shape(), &[1, 32, 32, 3]);
            assert_eq!(tensor.as_slice().len(), 32 * 32 * 3);
        }
    }

    #[test]
    fn test_black_image_normalizes_to_zeros() {
        let bytes = solid_rgb_png(64, 64, [0, 0, 0]);
        let tensor = preprocess(&bytes, FilterType::Triangle).unwrap();
        assert!(tensor.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_values_scaled_to_unit_interval() {
        let bytes = solid_rgb_png(40, 40, [255, 0, 51]);
        let tensor = preprocess(&bytes, FilterType::Nearest).unwrap();
        let view = tensor.view();
        assert_eq!(view[[0, 5, 5, 0]], 1.0);
        assert_eq!(view[[0, 5, 5, 1]], 0.0);
        assert!((view[[0, 5, 5, 2]] - 0.2).abs() < 1e-6);

        let gradient = gradient_jpeg(100, 80);
        let tensor = preprocess(&gradient, FilterType::Triangle).unwrap();
        assert!(tensor.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_grayscale_replicated_into_rgb() {
        let bytes = solid_gray_png(50, 20, 128);
        let tensor = preprocess(&bytes, FilterType::Nearest).unwrap();
        let view = tensor.view();
        let expected = 128.0 / 255.0;
        for c in 0..3 {
            assert!((view[[0, 10, 10, c]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_alpha_channel_discarded() {
        let bytes = solid_rgba_png(16, 16, [255, 255, 255, 0]);
        let tensor = preprocess(&bytes, FilterType::Nearest).unwrap();
        assert_eq!(tensor.shape(), &[1, 32, 32, 3]);
        assert!(tensor.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_empty_bytes_rejected() {
        assert!(matches!(
            preprocess(&[], FilterType::Triangle),
            Err(ClassifyError::Decode(_))
        ));
    }

    #[test]
    fn test_text_bytes_rejected() {
        let text = b"Speed limit (20km/h), Speed limit (30km/h)\n";
        assert!(matches!(
            preprocess(text, FilterType::Triangle),
            Err(ClassifyError::Decode(_))
        ));
    }

    #[test]
    fn test_non_jpeg_png_encoding_rejected() {
        let mut gif_header = b"GIF89a".to_vec();
        gif_header.extend_from_slice(&[0u8; 32]);
        assert!(matches!(
            preprocess(&gif_header, FilterType::Triangle),
            Err(ClassifyError::Decode(msg)) if msg.contains("unsupported")
        ));
    }

    #[test]
    fn test_truncated_png_rejected() {
        let bytes = solid_rgb_png(64, 64, [200, 10, 10]);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            preprocess(truncated, FilterType::Triangle),
            Err(ClassifyError::Decode(_))
        ));
    }
}
