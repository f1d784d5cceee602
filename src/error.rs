use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid array metadata: {0}")]
    MetadataInvalid(String),
    #[error("could not read array metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read chunk file {path}: {source}")]
    ChunkRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported dtype {0:?}, only \"|u1\" is supported")]
    UnsupportedDtype(String),
    #[error("non-null filters are not supported")]
    UnsupportedFilters,
    #[error("unsupported chunk shape {0:?}, every chunk edge must be {len}", len = crate::CHUNK_LEN)]
    UnsupportedChunkShape([u64; 3]),
    #[error("unsupported compressor {0:?}")]
    UnsupportedCompressor(String),
    #[error("could not decode chunk{}: {reason}", .path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    ChunkDecode {
        path: Option<PathBuf>,
        reason: String,
    },
    #[error("voxel offset {0:?} is not aligned to the chunk edge length {len}", len = crate::CHUNK_LEN)]
    UnalignedOffset([u64; 3]),
    #[error("could not assemble volume, chunk {coord:?} failed: {source}")]
    VolumeAssembly {
        coord: [u64; 3],
        #[source]
        source: Box<Error>,
    },
    #[error("{0}")]
    General(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    pub(crate) fn decode(path: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ChunkDecode {
            path,
            reason: reason.into(),
        }
    }
}
