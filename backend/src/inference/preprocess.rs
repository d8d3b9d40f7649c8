use image::imageops::FilterType;
use ndarray::Array4;

pub const INPUT_SIZE: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

#[derive(Debug, thiserror::Error)]
#[error("Could not decode image: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// NHWC float tensor fed to the classifier, values in `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn array(&self) -> &Array4<f32> {
        &self.data
    }

    /// Values in logical (row-major NHWC) order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}

/// Decode, force RGB, stretch to 224x224 and scale to unit range.
pub fn normalize(image_bytes: &[u8]) -> Result<ImageTensor, DecodeError> {
    let rgb = image::load_from_memory(image_bytes)?.to_rgb8();
    let resized = image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let side = INPUT_SIZE as usize;
    let data = Array4::from_shape_fn((1, side, side, INPUT_CHANNELS), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });

    Ok(ImageTensor { data })
}
