use std::ops::Index;
use std::path::Path;

use crate::CHUNK_LEN;
use crate::codec::ChunkCodec;
use crate::metadata::ArrayMetadata;

/// Number of voxels in one chunk.
pub const CHUNK_VOXELS: usize = CHUNK_LEN * CHUNK_LEN * CHUNK_LEN;

/// A dense cube of [`CHUNK_LEN`]³ `u8` voxels, addressed as `[z][y][x]`.
///
/// Voxel `(z, y, x)` lives at linear offset `z * E * E + y * E + x`.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Box<[u8]>,
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("edge", &CHUNK_LEN)
            .finish_non_exhaustive()
    }
}

impl Chunk {
    /// A chunk with every voxel set to `value`.
    pub fn filled(value: u8) -> Self {
        Self {
            data: vec![value; CHUNK_VOXELS].into_boxed_slice(),
        }
    }

    /// Wrap a linear row-major buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::ChunkDecode`] if `data` is not exactly [`CHUNK_VOXELS`] long.
    pub fn from_vec(data: Vec<u8>) -> crate::Result<Self> {
        if data.len() != CHUNK_VOXELS {
            return Err(crate::Error::decode(
                None,
                format!("chunk buffer has {} bytes, expected {CHUNK_VOXELS}", data.len()),
            ));
        }
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    /// # Panics
    /// Panics if any index is not below [`CHUNK_LEN`].
    pub fn get(&self, z: usize, y: usize, x: usize) -> u8 {
        self[[z, y, x]]
    }

    /// The `y`-by-`x` plane at depth `z`.
    ///
    /// # Panics
    /// Panics if `z` is not below [`CHUNK_LEN`].
    pub fn z_slice(&self, z: usize) -> &[u8] {
        assert!(z < CHUNK_LEN, "z slice {z} out of range");
        let plane = CHUNK_LEN * CHUNK_LEN;
        &self.data[z * plane..(z + 1) * plane]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_vec()
    }
}

impl Index<[usize; 3]> for Chunk {
    type Output = u8;

    fn index(&self, [z, y, x]: [usize; 3]) -> &u8 {
        assert!(
            z < CHUNK_LEN && y < CHUNK_LEN && x < CHUNK_LEN,
            "voxel ({z}, {y}, {x}) out of chunk bounds"
        );
        &self.data[(z * CHUNK_LEN + y) * CHUNK_LEN + x]
    }
}

/// Read and decode the chunk file at `path`.
///
/// # Errors
/// Returns [`crate::Error::ChunkRead`] if the file cannot be read,
/// a validation error if the metadata describes an unsupported layout,
/// or [`crate::Error::ChunkDecode`] if the payload cannot be decompressed.
pub fn decode_chunk(path: &Path, metadata: &ArrayMetadata) -> crate::Result<Chunk> {
    let bytes = read_chunk_file(path)?;
    decode_chunk_bytes(&bytes, metadata).map_err(|e| with_path(e, path))
}

/// Decode an in-memory chunk payload.
///
/// The metadata is validated before any decompression is attempted.
///
/// # Errors
/// See [`decode_chunk`].
pub fn decode_chunk_bytes(bytes: &[u8], metadata: &ArrayMetadata) -> crate::Result<Chunk> {
    metadata.validate_for_decode()?;
    let codec = ChunkCodec::new(metadata.compressor.as_ref())?;
    decode_with(&codec, bytes)
}

/// Read and decode a chunk with a codec built from already validated metadata.
pub(crate) fn read_with(path: &Path, codec: &ChunkCodec) -> crate::Result<Chunk> {
    let bytes = read_chunk_file(path)?;
    decode_with(codec, &bytes).map_err(|e| with_path(e, path))
}

fn read_chunk_file(path: &Path) -> crate::Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|source| crate::Error::ChunkRead {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn decode_with(codec: &ChunkCodec, bytes: &[u8]) -> crate::Result<Chunk> {
    let decoded = codec
        .decode(bytes, CHUNK_VOXELS)
        .map_err(|reason| crate::Error::decode(None, reason))?;
    Chunk::from_vec(decoded)
}

fn with_path(e: crate::Error, path: &Path) -> crate::Error {
    match e {
        crate::Error::ChunkDecode { path: None, reason } => {
            crate::Error::decode(Some(path.to_path_buf()), reason)
        }
        e => e,
    }
}
