use std::path::{Path, PathBuf};

use crate::chunk::{Chunk, decode_chunk};
use crate::chunk_key_encoding::{resolve, voxel_to_chunk_coord};
use crate::metadata::ArrayMetadata;
use crate::volume::{Volume, assemble_volume};

/// Name of the array metadata document at the store root.
pub const ZARRAY_KEY: &str = ".zarray";

/// A store root together with its parsed metadata.
///
/// This is the context value threaded through chunk and volume reads;
/// nothing in the crate holds global state.
#[derive(Debug, Clone)]
pub struct ZarrStore {
    root: PathBuf,
    metadata: ArrayMetadata,
}

impl ZarrStore {
    pub fn new(root: impl Into<PathBuf>, metadata: ArrayMetadata) -> Self {
        Self {
            root: root.into(),
            metadata,
        }
    }

    /// Open the store at `root` by reading and parsing `<root>/.zarray`.
    ///
    /// The chunk shape and dtype are not checked here, only when chunks are decoded.
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataRead`] if the document cannot be read,
    /// or [`crate::Error::MetadataInvalid`] if it is not a JSON object.
    pub fn open(root: impl Into<PathBuf>) -> crate::Result<Self> {
        let root = root.into();
        let path = root.join(ZARRAY_KEY);
        let text = std::fs::read_to_string(&path)
            .map_err(|source| crate::Error::MetadataRead { path, source })?;
        let metadata = ArrayMetadata::try_parse(&text)?;
        log::debug!("opened {}: {metadata:?}", root.display());
        Ok(Self { root, metadata })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Path of the chunk file at chunk-grid coordinate `coord`.
    pub fn chunk_path(&self, coord: [u64; 3]) -> PathBuf {
        resolve(&self.root, &self.metadata, coord)
    }

    /// # Errors
    /// See [`decode_chunk`].
    pub fn read_chunk(&self, coord: [u64; 3]) -> crate::Result<Chunk> {
        decode_chunk(&self.chunk_path(coord), &self.metadata)
    }

    /// Read the chunk whose first voxel is at `voxel_offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnalignedOffset`] if the offset is not on a chunk boundary,
    /// otherwise see [`decode_chunk`].
    pub fn read_chunk_at_voxel(&self, voxel_offset: [u64; 3]) -> crate::Result<Chunk> {
        self.read_chunk(voxel_to_chunk_coord(voxel_offset)?)
    }

    /// # Errors
    /// See [`assemble_volume`].
    pub fn read_volume(&self, origin: [u64; 3], extent: [usize; 3]) -> crate::Result<Volume> {
        assemble_volume(&self.root, &self.metadata, origin, extent)
    }
}
