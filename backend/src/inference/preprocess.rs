use image::ImageReader;
use image::imageops::FilterType;
use std::path::Path;
use tch::{Device, Tensor};

use super::IMG_SIZE;
use super::model::InferenceError;

/// Turns a saved upload into the batched NCHW float tensor the model
/// expects, on the model's device.
pub fn image_to_tensor(path: &Path, device: Device) -> Result<Tensor, InferenceError> {
    let pixels = decode_and_scale(path)?;
    let side = i64::from(IMG_SIZE);
    Ok(Tensor::from_slice(&pixels)
        .view([1, 3, side, side])
        .to_device(device))
}

/// Decodes to 3-channel RGB, resizes to the backbone resolution with
/// bilinear filtering, and rescales each value to [-1, 1], the
/// EfficientNetV2 input contract applied identically at training time.
/// Output is CHW order.
pub fn decode_and_scale(path: &Path) -> Result<Vec<f32>, InferenceError> {
    let img = ImageReader::open(path)
        .map_err(|e| InferenceError::Preprocess(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| InferenceError::Preprocess(e.to_string()))?
        .decode()
        .map_err(|e| InferenceError::Preprocess(e.to_string()))?;

    let rgb = img
        .resize_exact(IMG_SIZE, IMG_SIZE, FilterType::Triangle)
        .to_rgb8();

    let side = IMG_SIZE as usize;
    let raw = rgb.as_raw();
    let mut chw = vec![0.0f32; 3 * side * side];
    for c in 0..3 {
        for i in 0..side * side {
            chw[c * side * side + i] = f32::from(raw[i * 3 + c]) / 127.5 - 1.0;
        }
    }
    Ok(chw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn write_test_png(tag: &str, color: Rgb<u8>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("guava-preprocess-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{tag}.png"));
        let mut img = RgbImage::new(8, 8);
        for pixel in img.pixels_mut() {
            *pixel = color;
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn solid_color_image_scales_to_expected_channels() {
        let path = write_test_png("red", Rgb([255, 0, 0]));
        let pixels = decode_and_scale(&path).unwrap();
        let side = IMG_SIZE as usize;
        assert_eq!(pixels.len(), 3 * side * side);
        // Channel 0 saturated, channels 1 and 2 at the bottom of the range.
        assert!((pixels[0] - 1.0).abs() < 1e-3);
        assert!((pixels[side * side] + 1.0).abs() < 1e-3);
        assert!((pixels[2 * side * side] + 1.0).abs() < 1e-3);
        assert!(pixels.iter().all(|v| (-1.0..=1.0).contains(v)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn tensor_has_unit_batch_dimension() {
        let path = write_test_png("green", Rgb([0, 255, 0]));
        let tensor = image_to_tensor(&path, Device::Cpu).unwrap();
        assert_eq!(
            tensor.size(),
            vec![1, 3, i64::from(IMG_SIZE), i64::from(IMG_SIZE)]
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unreadable_file_is_a_preprocess_error() {
        let result = decode_and_scale(Path::new("/no/such/leaf.png"));
        assert!(matches!(result, Err(InferenceError::Preprocess(_))));
    }

    #[test]
    fn undecodable_bytes_are_a_preprocess_error() {
        let dir = std::env::temp_dir().join(format!("guava-preprocess-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let result = decode_and_scale(&path);
        assert!(matches!(result, Err(InferenceError::Preprocess(_))));
        std::fs::remove_file(&path).ok();
    }
}
