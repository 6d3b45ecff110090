//! Parsing for the IDX binary format used by MNIST and its derivatives
//! (Fashion-MNIST, EMNIST, …).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```

use crate::error::KilnError;

/// Raw pixel planes from an IDX3 image file, still at native resolution and
/// uint8 depth so resampling can happen downstream.
#[derive(Debug, Clone)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    /// count × rows × cols bytes, image-major then row-major.
    pub pixels: Vec<u8>,
}

fn dataset_err(msg: String) -> KilnError {
    KilnError::Dataset(msg)
}

/// Parses an IDX3 image file, validating the header against the data length.
pub fn parse_idx_images(bytes: &[u8]) -> Result<IdxImages, KilnError> {
    if bytes.len() < 16 {
        return Err(dataset_err(format!(
            "IDX image file too short: expected at least 16 header bytes, got {}.",
            bytes.len()
        )));
    }

    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(dataset_err(format!(
            "IDX image file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(dataset_err(format!(
            "IDX image file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            bytes[2]
        )));
    }
    if bytes[3] != 0x03 {
        return Err(dataset_err(format!(
            "IDX image file: byte 3 (dimensions) must be 3, got {}. \
             This does not appear to be an IDX3 image file.",
            bytes[3]
        )));
    }

    let count = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let rows = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let cols = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        dataset_err(format!(
            "IDX image file: rows * cols overflows usize (rows={rows}, cols={cols})."
        ))
    })?;
    let data_len = count.checked_mul(n_pixels).ok_or_else(|| {
        dataset_err(format!(
            "IDX image file: count * pixels overflows usize (count={count}, pixels={n_pixels})."
        ))
    })?;

    if bytes.len() < 16 + data_len {
        return Err(dataset_err(format!(
            "IDX image file too short: header declares {count} items of {rows}×{cols} pixels \
             ({data_len} data bytes needed after header), but file is only {} bytes total.",
            bytes.len()
        )));
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: bytes[16..16 + data_len].to_vec(),
    })
}

/// Parses an IDX1 label file into raw class indices.
pub fn parse_idx_labels(bytes: &[u8]) -> Result<Vec<u8>, KilnError> {
    if bytes.len() < 8 {
        return Err(dataset_err(format!(
            "IDX label file too short: expected at least 8 header bytes, got {}.",
            bytes.len()
        )));
    }

    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(dataset_err(format!(
            "IDX label file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(dataset_err(format!(
            "IDX label file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            bytes[2]
        )));
    }
    if bytes[3] != 0x01 {
        return Err(dataset_err(format!(
            "IDX label file: byte 3 (dimensions) must be 1, got {}. \
             This does not appear to be an IDX1 label file.",
            bytes[3]
        )));
    }

    let count = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if bytes.len() < 8 + count {
        return Err(dataset_err(format!(
            "IDX label file too short: header declares {count} labels but file is only {} bytes \
             (need at least {}).",
            bytes.len(),
            8 + count
        )));
    }

    Ok(bytes[8..8 + count].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_file(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
        bytes.extend_from_slice(&count.to_be_bytes());
        bytes.extend_from_slice(&rows.to_be_bytes());
        bytes.extend_from_slice(&cols.to_be_bytes());
        bytes.extend_from_slice(pixels);
        bytes
    }

    fn label_file(labels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn parses_a_well_formed_image_file() {
        let pixels: Vec<u8> = (0u8..12).collect();
        let parsed = parse_idx_images(&image_file(2, 2, 3, &pixels)).unwrap();
        assert_eq!(parsed.count, 2);
        assert_eq!(parsed.rows, 2);
        assert_eq!(parsed.cols, 3);
        assert_eq!(parsed.pixels, pixels);
    }

    #[test]
    fn parses_a_well_formed_label_file() {
        let labels = parse_idx_labels(&label_file(&[0, 3, 9])).unwrap();
        assert_eq!(labels, vec![0, 3, 9]);
    }

    #[test]
    fn rejects_wrong_dtype() {
        let mut bytes = image_file(1, 1, 1, &[42]);
        bytes[2] = 0x09;
        assert!(parse_idx_images(&bytes).is_err());
    }

    #[test]
    fn rejects_label_file_passed_as_images() {
        let bytes = label_file(&[1, 2, 3]);
        let err = parse_idx_images(&bytes).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dimensions"), "unexpected message: {msg}");
    }

    #[test]
    fn rejects_truncated_pixel_data() {
        // Header declares 2 images of 2×2 but only 4 pixel bytes follow.
        let bytes = image_file(2, 2, 2, &[1, 2, 3, 4]);
        assert!(parse_idx_images(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_label_data() {
        let mut bytes = label_file(&[1, 2, 3]);
        bytes.truncate(9);
        assert!(parse_idx_labels(&bytes).is_err());
    }

    #[test]
    fn rejects_nonzero_reserved_bytes() {
        let mut bytes = label_file(&[1]);
        bytes[0] = 0xFF;
        assert!(parse_idx_labels(&bytes).is_err());
    }
}
