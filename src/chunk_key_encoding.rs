use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::CHUNK_LEN;
use crate::metadata::ArrayMetadata;

/// Encode chunk-grid indices in (z, y, x) order as a chunk file name, e.g. `1.2.3`.
pub fn chunk_key(chunk_grid_indices: [u64; 3], separator: char) -> String {
    let mut s = String::with_capacity(chunk_grid_indices.len() * 4);
    for (i, idx) in chunk_grid_indices.iter().enumerate() {
        if i > 0 {
            s.push(separator);
        }
        s.write_fmt(format_args!("{idx}")).unwrap();
    }
    s
}

/// Path of the chunk file at `chunk_grid_indices` under the store root.
///
/// The file is not required to exist.
pub fn resolve(root: &Path, metadata: &ArrayMetadata, chunk_grid_indices: [u64; 3]) -> PathBuf {
    let path = root.join(chunk_key(chunk_grid_indices, metadata.separator()));
    log::debug!("chunk {chunk_grid_indices:?} resolves to {}", path.display());
    path
}

/// Convert a voxel offset to the chunk-grid indices of the chunk starting there.
///
/// # Errors
/// Returns [`crate::Error::UnalignedOffset`] if any axis is not a multiple of [`CHUNK_LEN`].
pub fn voxel_to_chunk_coord(voxel_offset: [u64; 3]) -> crate::Result<[u64; 3]> {
    let len = CHUNK_LEN as u64;
    if voxel_offset.iter().any(|&v| v % len != 0) {
        return Err(crate::Error::UnalignedOffset(voxel_offset));
    }
    Ok(voxel_offset.map(|v| v / len))
}
