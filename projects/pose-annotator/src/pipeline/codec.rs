use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageBuffer, Rgb};
use opencv::core::{Mat, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc};
use std::path::Path;

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("Path is not valid UTF-8: {:?}", path))
}

/// Decode an image file into a 3-channel BGR Mat.
pub fn read_frame(path: &Path) -> Result<Mat> {
    let mat = imgcodecs::imread(path_str(path)?, imgcodecs::IMREAD_COLOR)?;
    // imread signals unreadable or corrupt files with an empty Mat
    if mat.empty() {
        return Err(anyhow!("Unsupported or corrupt image data"));
    }
    Ok(mat)
}

/// Encode a Mat to disk; the format follows the file extension.
pub fn write_frame(path: &Path, frame: &Mat) -> Result<()> {
    let written = imgcodecs::imwrite(path_str(path)?, frame, &Vector::new())?;
    if !written {
        return Err(anyhow!("Encoder refused to write the image"));
    }
    Ok(())
}

/// Swap the R and B channels.
pub fn swap_channel_order(frame: &Mat) -> Result<Mat> {
    let mut swapped = Mat::default();
    imgproc::cvt_color_def(frame, &mut swapped, imgproc::COLOR_RGB2BGR)?;
    Ok(swapped)
}

/// Convert an OpenCV Mat (BGR) to an image::DynamicImage (RGB)
pub fn mat_to_dynamic_image(mat: &Mat) -> Result<DynamicImage> {
    let mut rgb_mat = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB)?;

    let size = rgb_mat.size()?;
    let width = size.width as u32;
    let height = size.height as u32;

    if !rgb_mat.is_continuous() {
        return Err(anyhow!("Mat is not continuous"));
    }

    let buffer = rgb_mat.data_bytes()?.to_vec();
    let img_buffer = ImageBuffer::<Rgb<u8>, _>::from_vec(width, height, buffer)
        .ok_or_else(|| anyhow!("Failed to create ImageBuffer from Mat data"))?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}
