use std::fs;
use std::path::Path;

use image::imageops::FilterType;
use image::GrayImage;

use crate::data::idx::{self, IdxImages};
use crate::error::KilnError;

/// MNIST has ten digit classes.
pub const N_CLASSES: usize = 10;

/// Which half of the standard MNIST file pair to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    fn file_names(&self) -> (&'static str, &'static str) {
        match self {
            Split::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            Split::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

/// An MNIST split loaded into memory: images as flat [0, 1] pixel vectors at
/// the configured resolution, labels one-hot encoded over ten classes.
#[derive(Debug, Clone)]
pub struct MnistDataset {
    pub images: Vec<Vec<f64>>,
    pub labels: Vec<Vec<f64>>,
    pub width: u32,
    pub height: u32,
}

impl MnistDataset {
    /// Loads an image/label IDX pair from `dir`, resampling every image from
    /// its native resolution (28×28 for stock MNIST) to `width × height`.
    pub fn load(dir: &Path, split: Split, width: u32, height: u32) -> Result<MnistDataset, KilnError> {
        if width == 0 || height == 0 {
            return Err(KilnError::Config(format!(
                "dataset dimensions {width}×{height} must be non-zero"
            )));
        }

        let (image_name, label_name) = split.file_names();
        let image_bytes = fs::read(dir.join(image_name)).map_err(|e| {
            KilnError::Dataset(format!(
                "cannot read {} in {}: {e}",
                image_name,
                dir.display()
            ))
        })?;
        let label_bytes = fs::read(dir.join(label_name)).map_err(|e| {
            KilnError::Dataset(format!(
                "cannot read {} in {}: {e}",
                label_name,
                dir.display()
            ))
        })?;

        let raw = idx::parse_idx_images(&image_bytes)?;
        let classes = idx::parse_idx_labels(&label_bytes)?;

        if raw.rows == 0 || raw.cols == 0 {
            return Err(KilnError::Dataset(format!(
                "IDX image file declares zero-sized images ({}×{}).",
                raw.rows, raw.cols
            )));
        }
        if raw.count != classes.len() {
            return Err(KilnError::Dataset(format!(
                "IDX file mismatch: image file declares {} items but label file declares {}.",
                raw.count,
                classes.len()
            )));
        }

        let images = resample_images(&raw, width, height)?;
        let labels = one_hot_labels(&classes)?;

        Ok(MnistDataset { images, labels, width, height })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Length of one flattened input vector.
    pub fn input_len(&self) -> usize {
        (self.width * self.height) as usize
    }
}

/// Normalizes each image plane to [0, 1], resampling to the target
/// resolution first when it differs from the native one.
fn resample_images(raw: &IdxImages, width: u32, height: u32) -> Result<Vec<Vec<f64>>, KilnError> {
    let n_pixels = raw.rows * raw.cols;
    let native = raw.rows as u32 == height && raw.cols as u32 == width;

    raw.pixels
        .chunks_exact(n_pixels)
        .map(|chunk| {
            if native {
                return Ok(chunk.iter().map(|&px| px as f64 / 255.0).collect());
            }
            let plane = GrayImage::from_raw(raw.cols as u32, raw.rows as u32, chunk.to_vec())
                .ok_or_else(|| {
                    KilnError::Dataset("IDX image plane does not match its declared size.".into())
                })?;
            let resized = image::imageops::resize(&plane, width, height, FilterType::Lanczos3);
            Ok(resized.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
        })
        .collect()
}

/// One-hot encodes class indices over `N_CLASSES`, rejecting out-of-range
/// values.
fn one_hot_labels(classes: &[u8]) -> Result<Vec<Vec<f64>>, KilnError> {
    classes
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            let class = class as usize;
            if class >= N_CLASSES {
                return Err(KilnError::Dataset(format!(
                    "IDX label at index {i}: class index {class} is out of range for {N_CLASSES} classes."
                )));
            }
            let mut one_hot = vec![0.0f64; N_CLASSES];
            one_hot[class] = 1.0;
            Ok(one_hot)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::idx::IdxImages;

    #[test]
    fn native_resolution_skips_resampling() {
        let raw = IdxImages {
            count: 2,
            rows: 2,
            cols: 2,
            pixels: vec![0, 51, 102, 255, 255, 0, 0, 255],
        };
        let images = resample_images(&raw, 2, 2).unwrap();
        assert_eq!(images.len(), 2);
        assert!((images[0][1] - 0.2).abs() < 1e-12);
        assert_eq!(images[1], vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn resampling_changes_resolution_and_keeps_range() {
        let raw = IdxImages {
            count: 1,
            rows: 4,
            cols: 4,
            pixels: vec![128; 16],
        };
        let images = resample_images(&raw, 8, 8).unwrap();
        assert_eq!(images[0].len(), 64);
        assert!(images[0].iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn one_hot_sets_exactly_one_bit() {
        let labels = one_hot_labels(&[0, 9, 4]).unwrap();
        for (label, class) in labels.iter().zip([0usize, 9, 4]) {
            assert_eq!(label.iter().sum::<f64>(), 1.0);
            assert_eq!(label[class], 1.0);
        }
    }

    #[test]
    fn one_hot_rejects_out_of_range_class() {
        assert!(one_hot_labels(&[3, 10]).is_err());
    }

    #[test]
    fn load_reports_missing_files() {
        let err = MnistDataset::load(Path::new("/nonexistent"), Split::Train, 32, 32).unwrap_err();
        assert!(matches!(err, KilnError::Dataset(_)));
    }
}
