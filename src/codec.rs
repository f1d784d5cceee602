use std::borrow::Cow;
use std::sync::Arc;

use zarrs::array::codec::{BloscCodec, Bz2Codec, GzipCodec, ZstdCodec};
use zarrs::metadata_ext::codec::blosc::{BloscCompressionLevel, BloscCompressor, BloscShuffleMode};
use zarrs::metadata_ext::codec::bz2::Bz2CompressionLevel;
use zarrs_codec::{BytesRepresentation, BytesToBytesCodecTraits, CodecOptions};

use crate::metadata::Compressor;

/// Decompressor for the chunk payloads of one store.
#[derive(Debug, Clone)]
pub struct ChunkCodec {
    /// `None` for uncompressed chunks.
    inner: Option<Arc<dyn BytesToBytesCodecTraits>>,
}

impl ChunkCodec {
    /// Select the codec described by a `.zarray` compressor record.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedCompressor`] for an unknown compressor id,
    /// or an error if the compressor settings are invalid.
    pub fn new(compressor: Option<&Compressor>) -> crate::Result<Self> {
        let inner = match compressor {
            Some(c) => compressor_to_b2b(c)?,
            None => None,
        };
        Ok(Self { inner })
    }

    pub fn is_raw(&self) -> bool {
        self.inner.is_none()
    }

    /// Decompress `bytes`, which must expand to exactly `expected_len` bytes.
    ///
    /// # Errors
    /// Returns a description of the failure if the payload is corrupt or has the wrong size.
    pub fn decode(&self, bytes: &[u8], expected_len: usize) -> Result<Vec<u8>, String> {
        let decoded = match &self.inner {
            None => Cow::Borrowed(bytes),
            Some(codec) => codec
                .decode(
                    Cow::Borrowed(bytes),
                    &BytesRepresentation::FixedSize(expected_len as u64),
                    &CodecOptions::default(),
                )
                .map_err(|e| e.to_string())?,
        };
        if decoded.len() != expected_len {
            return Err(format!(
                "decoded {} bytes, expected {expected_len}",
                decoded.len()
            ));
        }
        Ok(decoded.into_owned())
    }
}

/// Only the compressor `id` selects the codec; every other setting in the record
/// affects compression only, as each supported format describes itself in its stream.
fn compressor_to_b2b(
    c: &Compressor,
) -> crate::Result<Option<Arc<dyn BytesToBytesCodecTraits>>> {
    match c.id.as_str() {
        "" => Ok(None),
        "blosc" => {
            // blosc frames carry their own compressor, shuffle and type size in the header
            let clevel = BloscCompressionLevel::try_from(0u8)
                .map_err(|_| crate::Error::general("invalid blosc level"))?;
            let codec = BloscCodec::new(
                BloscCompressor::BloscLZ,
                clevel,
                None,
                BloscShuffleMode::NoShuffle,
                None,
            )
            .map_err(|e| crate::Error::general(e.to_string()))?;
            Ok(Some(Arc::new(codec)))
        }
        "gzip" => {
            let codec = GzipCodec::new(6)
                .map_err(|e| crate::Error::general(format!("invalid gzip level: {e}")))?;
            Ok(Some(Arc::new(codec)))
        }
        "zstd" => Ok(Some(Arc::new(ZstdCodec::new(5, false)))),
        "bz2" => {
            let level = Bz2CompressionLevel::try_from(9u8)
                .map_err(|_| crate::Error::general("invalid bz2 level"))?;
            Ok(Some(Arc::new(Bz2Codec::new(level))))
        }
        id => Err(crate::Error::UnsupportedCompressor(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blosc() -> Compressor {
        Compressor {
            blocksize: 0,
            clevel: 5,
            cname: "lz4".into(),
            id: "blosc".into(),
            shuffle: 1,
        }
    }

    #[test]
    fn raw_passthrough() {
        let codec = ChunkCodec::new(None).unwrap();
        assert!(codec.is_raw());
        assert_eq!(codec.decode(&[1, 2, 3], 3).unwrap(), vec![1, 2, 3]);
        assert!(codec.decode(&[1, 2], 3).is_err());
        assert!(codec.decode(&[1, 2, 3, 4], 3).is_err());
    }

    #[test]
    fn blosc_decode() {
        let codec = ChunkCodec::new(Some(&blosc())).unwrap();
        assert!(!codec.is_raw());
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let encoded = blosc_lz4_fixture(&data);
        assert_eq!(codec.decode(&encoded, data.len()).unwrap(), data);
        assert!(codec.decode(&encoded, data.len() * 2).is_err());
        assert!(codec.decode(&encoded[..encoded.len() / 2], data.len()).is_err());
        assert!(codec.decode(&[0u8; 8], data.len()).is_err());
    }

    fn blosc_lz4_fixture(data: &[u8]) -> Vec<u8> {
        BloscCodec::new(
            BloscCompressor::LZ4,
            5.try_into().unwrap(),
            None,
            BloscShuffleMode::Shuffle,
            Some(1),
        )
        .unwrap()
        .encode(Cow::Borrowed(data), &CodecOptions::default())
        .unwrap()
        .into_owned()
    }

    #[test]
    fn blosc_ignores_compression_settings() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 13) as u8).collect();
        let encoded = blosc_lz4_fixture(&data);
        let records = [
            Compressor {
                shuffle: -1,
                ..blosc()
            },
            Compressor {
                cname: String::new(),
                ..blosc()
            },
            Compressor {
                cname: "brotli".into(),
                clevel: 42,
                shuffle: 7,
                blocksize: -3,
                ..blosc()
            },
            Compressor {
                id: "blosc".into(),
                ..Default::default()
            },
        ];
        for record in &records {
            let codec = ChunkCodec::new(Some(record)).unwrap();
            assert_eq!(codec.decode(&encoded, data.len()).unwrap(), data, "{record:?}");
        }
    }

    #[test]
    fn gzip_decode() {
        let c = Compressor {
            id: "gzip".into(),
            clevel: 1,
            ..Default::default()
        };
        let codec = ChunkCodec::new(Some(&c)).unwrap();
        let data = vec![9u8; 1000];
        let encoded = GzipCodec::new(1)
            .unwrap()
            .encode(Cow::Borrowed(&data), &CodecOptions::default())
            .unwrap();
        assert_eq!(codec.decode(&encoded, 1000).unwrap(), data);
        assert!(codec.decode(&encoded[..encoded.len() / 2], 1000).is_err());
    }

    #[test]
    fn zstd_decode() {
        let c = Compressor {
            id: "zstd".into(),
            clevel: 22,
            ..Default::default()
        };
        let codec = ChunkCodec::new(Some(&c)).unwrap();
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 7) as u8).collect();
        let encoded = ZstdCodec::new(3, false)
            .encode(Cow::Borrowed(&data), &CodecOptions::default())
            .unwrap();
        assert_eq!(codec.decode(&encoded, data.len()).unwrap(), data);
        assert!(codec.decode(&encoded, data.len() + 1).is_err());
    }

    #[test]
    fn bz2_decode() {
        let c = Compressor {
            id: "bz2".into(),
            ..Default::default()
        };
        let codec = ChunkCodec::new(Some(&c)).unwrap();
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 11) as u8).collect();
        let encoded = Bz2Codec::new(Bz2CompressionLevel::try_from(1u8).unwrap())
            .encode(Cow::Borrowed(&data), &CodecOptions::default())
            .unwrap();
        assert_eq!(codec.decode(&encoded, data.len()).unwrap(), data);
        assert!(codec.decode(&[1, 2, 3], data.len()).is_err());
    }

    #[test]
    fn unsupported_compressors() {
        let c = Compressor {
            id: "lzma".into(),
            ..Default::default()
        };
        assert!(matches!(
            ChunkCodec::new(Some(&c)),
            Err(crate::Error::UnsupportedCompressor(id)) if id == "lzma"
        ));
    }
}
