//! Read chunks and multi-chunk volumes from 3-D `uint8` Zarr v2 stores.
//!
//! A store is a directory holding a `.zarray` metadata document and one file per
//! chunk, named from its chunk-grid indices joined by the dimension separator.
pub mod chunk;
pub mod chunk_key_encoding;
pub mod codec;
mod error;
pub mod metadata;
pub mod storage;
pub mod volume;

pub use zarrs;

pub use chunk::{Chunk, decode_chunk, decode_chunk_bytes};
pub use error::{Error, Result};
pub use metadata::ArrayMetadata;
pub use storage::ZarrStore;
pub use volume::{Volume, assemble_volume};

/// Edge length of every chunk, in voxels.
pub const CHUNK_LEN: usize = 128;
