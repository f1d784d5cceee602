use std::path::Path;

use rayon::prelude::*;

use crate::CHUNK_LEN;
use crate::chunk::{Chunk, read_with};
use crate::chunk_key_encoding::resolve;
use crate::codec::ChunkCodec;
use crate::metadata::ArrayMetadata;

/// A rectangular grid of chunks addressable as one voxel space.
///
/// Chunks are stored in row-major (z, y, x) grid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    extent: [usize; 3],
    chunks: Vec<Chunk>,
}

impl Volume {
    /// Build a volume from chunks in row-major (z, y, x) grid order.
    ///
    /// # Errors
    /// Returns an error if the number of chunks does not match `extent`.
    pub fn new(extent: [usize; 3], chunks: Vec<Chunk>) -> crate::Result<Self> {
        let expected = chunk_count(extent)?;
        if chunks.len() != expected {
            return Err(crate::Error::general(format!(
                "volume of extent {extent:?} needs {expected} chunks, got {}",
                chunks.len()
            )));
        }
        Ok(Self { extent, chunks })
    }

    /// Number of chunks along (z, y, x).
    pub fn extent(&self) -> [usize; 3] {
        self.extent
    }

    /// Number of voxels along (z, y, x).
    pub fn voxel_shape(&self) -> [u64; 3] {
        self.extent.map(|n| (n * CHUNK_LEN) as u64)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// The chunk at volume-relative grid position `(cz, cy, cx)`.
    pub fn chunk(&self, cz: usize, cy: usize, cx: usize) -> Option<&Chunk> {
        let [ez, ey, ex] = self.extent;
        if cz < ez && cy < ey && cx < ex {
            self.chunks.get((cz * ey + cy) * ex + cx)
        } else {
            None
        }
    }

    /// The voxel at volume-relative coordinate `(z, y, x)`.
    ///
    /// Coordinates outside the volume, including any negative coordinate, read as `0`.
    pub fn voxel(&self, z: i64, y: i64, x: i64) -> u8 {
        let (Some((cz, lz)), Some((cy, ly)), Some((cx, lx))) = (split(z), split(y), split(x))
        else {
            return 0;
        };
        self.chunk(cz, cy, cx).map_or(0, |c| c[[lz, ly, lx]])
    }
}

/// Split a voxel coordinate into chunk-grid and local indices.
fn split(v: i64) -> Option<(usize, usize)> {
    let v = usize::try_from(v).ok()?;
    Some((v / CHUNK_LEN, v % CHUNK_LEN))
}

/// Number of chunks in a box of `extent`.
fn chunk_count(extent: [usize; 3]) -> crate::Result<usize> {
    if extent.contains(&0) {
        return Ok(0);
    }
    extent
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| crate::Error::general(format!("chunk box {extent:?} is too large")))
}

/// Decode the box of chunks `[origin, origin + extent)` into a [`Volume`].
///
/// Chunks are decoded in parallel batches. If any chunk fails, the first failure in
/// row-major order is returned and every chunk decoded so far is dropped.
///
/// # Errors
/// Returns [`crate::Error::VolumeAssembly`] holding the failing chunk-grid coordinate.
pub fn assemble_volume(
    root: &Path,
    metadata: &ArrayMetadata,
    origin: [u64; 3],
    extent: [usize; 3],
) -> crate::Result<Volume> {
    if extent.contains(&0) {
        return Volume::new(extent, Vec::new());
    }
    let mut coords = box_coords(origin, extent)?;

    let at_origin = |source: crate::Error| crate::Error::VolumeAssembly {
        coord: origin,
        source: Box::new(source),
    };
    metadata.validate_for_decode().map_err(at_origin)?;
    let codec = ChunkCodec::new(metadata.compressor.as_ref()).map_err(at_origin)?;

    let batch_len = rayon::current_num_threads().max(1) * 4;
    let mut chunks = Vec::new();
    loop {
        let batch: Vec<[u64; 3]> = coords.by_ref().take(batch_len).collect();
        if batch.is_empty() {
            break;
        }
        let results: Vec<crate::Result<Chunk>> = batch
            .par_iter()
            .map(|&coord| read_with(&resolve(root, metadata, coord), &codec))
            .collect();
        for (coord, result) in batch.into_iter().zip(results) {
            match result {
                Ok(chunk) => chunks.push(chunk),
                Err(source) => {
                    return Err(crate::Error::VolumeAssembly {
                        coord,
                        source: Box::new(source),
                    });
                }
            }
        }
    }
    log::debug!(
        "assembled volume of {} chunks at {origin:?}, extent {extent:?}",
        chunks.len()
    );
    Volume::new(extent, chunks)
}

/// Chunk-grid coordinates of the box in row-major (z, y, x) order.
fn box_coords(
    origin: [u64; 3],
    extent: [usize; 3],
) -> crate::Result<impl Iterator<Item = [u64; 3]>> {
    let count = chunk_count(extent)?;
    for axis in 0..3 {
        origin[axis]
            .checked_add(extent[axis] as u64)
            .ok_or_else(|| crate::Error::general("chunk box exceeds the grid index range"))?;
    }
    let [_, ey, ex] = extent;
    Ok((0..count).map(move |i| {
        let (z, rest) = (i / (ey * ex), i % (ey * ex));
        let (y, x) = (rest / ex, rest % ex);
        [origin[0] + z as u64, origin[1] + y as u64, origin[2] + x as u64]
    }))
}
