//! The vector file is a flat array of little-endian `f32`, without any header:
//! `n` values take exactly `4 * n` bytes. This is what `numpy.ndarray.tofile`
//! writes for a `float32` array on little-endian machines.

use crate::BenchError;
use memmap2::MmapOptions;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size in bytes of a single value.
pub const VALUE_SIZE: usize = std::mem::size_of::<f32>();

/// Serializes `values` to the vector file layout.
pub fn encode(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(values));
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Deserializes a vector file buffer. Returns `None` when the length is not a
/// multiple of [VALUE_SIZE].
pub fn decode(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % VALUE_SIZE != 0 {
        return None;
    }
    let values = bytes
        .chunks_exact(VALUE_SIZE)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Some(values)
}

/// Reads the whole vector file at `path`.
///
/// Empty files are rejected with [BenchError::Format], as a zero length vector
/// has no softmax to benchmark.
pub fn read_vector(path: impl AsRef<Path>) -> Result<Vec<f32>, BenchError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => BenchError::NotFound {
            path: path.to_path_buf(),
        },
        _ => BenchError::io(path, err),
    })?;
    let byte_length = file
        .metadata()
        .map_err(|err| BenchError::io(path, err))?
        .len();
    if byte_length == 0 || byte_length % VALUE_SIZE as u64 != 0 {
        return Err(BenchError::Format {
            path: path.to_path_buf(),
            byte_length,
        });
    }

    // SAFETY: the map is only read during this call and copied out.
    let buffer =
        unsafe { MmapOptions::new().map(&file) }.map_err(|err| BenchError::io(path, err))?;
    let values = decode(&buffer).ok_or_else(|| BenchError::Format {
        path: path.to_path_buf(),
        byte_length: buffer.len() as u64,
    })?;
    debug!(path = %path.display(), len = values.len(), "read vector");
    Ok(values)
}

/// Writes `values` to `path`, creating the missing parent directories and
/// replacing any existing file.
///
/// The data goes to a temporary sibling first and is renamed in place, so a
/// failed write never leaves a truncated vector at `path`.
pub fn write_vector(path: impl AsRef<Path>, values: &[f32]) -> Result<(), BenchError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| BenchError::io(parent, err))?;
    }

    let partial = partial_path(path);
    let result = write_partial(&partial, values).and_then(|()| {
        fs::rename(&partial, path).map_err(|err| BenchError::io(path, err))
    });
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result?;
    debug!(path = %path.display(), len = values.len(), "wrote vector");
    Ok(())
}

fn write_partial(partial: &Path, values: &[f32]) -> Result<(), BenchError> {
    let mut file = File::create(partial).map_err(|err| BenchError::io(partial, err))?;
    file.write_all(&encode(values))
        .and_then(|()| file.sync_all())
        .map_err(|err| BenchError::io(partial, err))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_little_endian() {
        assert_eq!(
            encode(&[1.0, -2.5]),
            [0x00u8, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x20, 0xc0]
        );
        assert_eq!(decode(&[0x00, 0x00, 0x80, 0x3f]), Some(vec![1.0]));
        assert_eq!(decode(&[0x00, 0x00, 0x80]), None);
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vector.bin");
        let values = vec![
            0.0,
            -0.0,
            1.5,
            -9.999_999,
            f32::MIN_POSITIVE,
            f32::from_bits(1),
            f32::MAX,
            f32::NEG_INFINITY,
        ];
        write_vector(&path, &values).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 4 * values.len() as u64);

        let read = read_vector(&path).unwrap();
        let bits: Vec<u32> = read.iter().map(|v| v.to_bits()).collect();
        let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits, expected);
    }

    #[test]
    fn creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("vector.bin");
        write_vector(&path, &[1.0, 2.0, 3.0]).unwrap();
        write_vector(&path, &[4.0]).unwrap();
        assert_eq!(read_vector(&path).unwrap(), [4.0]);
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.bin");
        assert!(matches!(
            read_vector(&path),
            Err(BenchError::NotFound { path: p }) if p == path
        ));
    }

    #[test]
    fn misaligned_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.bin");
        fs::write(&path, [0u8; 10]).unwrap();
        assert!(matches!(
            read_vector(&path),
            Err(BenchError::Format { byte_length: 10, .. })
        ));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();
        let err = read_vector(&path).unwrap_err();
        assert!(matches!(err, BenchError::Format { byte_length: 0, .. }));
        assert!(err.to_string().contains("non-zero multiple of 4"));
    }

    #[test]
    fn write_into_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let err = write_vector(blocker.join("vector.bin"), &[1.0]).unwrap_err();
        assert!(matches!(err, BenchError::Io { .. }));
    }
}
