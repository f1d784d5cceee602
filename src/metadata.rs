use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::CHUNK_LEN;

/// The only sample encoding this crate decodes: one unsigned byte per voxel.
pub const SUPPORTED_DTYPE: &str = "|u1";

/// Maximum number of characters kept from the `dtype`, `cname` and `id` text fields.
///
/// Longer values are truncated, matching stores written for readers with fixed 32 byte fields.
pub const MAX_TEXT_LEN: usize = 31;

/// The default separator between chunk-grid indices in chunk file names.
pub const DEFAULT_DIMENSION_SEPARATOR: char = '.';

/// Compression settings from the `compressor` record of a `.zarray` document.
///
/// Every field is optional in the document and defaults to zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compressor {
    pub blocksize: i64,
    pub clevel: i64,
    pub cname: String,
    pub id: String,
    pub shuffle: i64,
}

/// How the `filters` key appeared in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filters {
    /// The key was missing.
    #[default]
    Absent,
    /// The key was present and `null`.
    Null,
    /// The key held a non-null value. Filter pipelines are not supported.
    Present,
}

/// Parsed `.zarray` metadata of a single array store.
///
/// [`ArrayMetadata::default`] is the "no metadata" sentinel,
/// with a `format_version` of zero; see [`ArrayMetadata::is_loaded`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayMetadata {
    /// Chunk edge lengths along (z, y, x).
    pub chunk_shape: [u64; 3],
    /// Full array extent along (z, y, x).
    pub array_shape: [u64; 3],
    pub dtype: String,
    /// `None` if the chunks are stored uncompressed.
    pub compressor: Option<Compressor>,
    pub dimension_separator: Option<char>,
    pub fill_value: i64,
    pub filters: Filters,
    pub order: Option<char>,
    pub format_version: u32,
}

impl ArrayMetadata {
    /// Parse a `.zarray` document, falling back to the zero-valued sentinel.
    ///
    /// Callers must check [`ArrayMetadata::is_loaded`] before trusting any other field.
    pub fn parse(text: &str) -> Self {
        Self::try_parse(text).unwrap_or_else(|e| {
            log::warn!("{e}");
            Self::default()
        })
    }

    /// Parse a `.zarray` document.
    ///
    /// Unrecognised keys are ignored and missing keys leave their field at zero.
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataInvalid`] if the text is not a JSON object.
    pub fn try_parse(text: &str) -> crate::Result<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| crate::Error::MetadataInvalid(format!("could not parse JSON: {e}")))?;
        let Value::Object(root) = root else {
            return Err(crate::Error::MetadataInvalid(
                "document root is not an object".into(),
            ));
        };

        let mut out = Self::default();
        for (key, value) in &root {
            match key.as_str() {
                "chunks" => read_triple(value, &mut out.chunk_shape),
                "compressor" => out.compressor = parse_compressor(value),
                "dimension_separator" => {
                    if let Some(c) = first_char(value) {
                        out.dimension_separator = Some(c);
                    }
                }
                "dtype" => {
                    if let Some(s) = value.as_str() {
                        out.dtype = bounded_text(s);
                    }
                }
                "fill_value" => {
                    if let Some(n) = as_int(value) {
                        out.fill_value = n;
                    }
                }
                "filters" => {
                    out.filters = if value.is_null() {
                        Filters::Null
                    } else {
                        Filters::Present
                    }
                }
                "order" => {
                    if let Some(c) = first_char(value) {
                        out.order = Some(c);
                    }
                }
                "shape" => read_triple(value, &mut out.array_shape),
                "zarr_format" => {
                    if let Some(n) = as_int(value) {
                        out.format_version = u32::try_from(n.max(0)).unwrap_or(u32::MAX);
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Whether this holds parsed metadata rather than the sentinel.
    pub fn is_loaded(&self) -> bool {
        self.format_version != 0
    }

    /// The chunk file name separator, `.` if unset.
    pub fn separator(&self) -> char {
        self.dimension_separator
            .unwrap_or(DEFAULT_DIMENSION_SEPARATOR)
    }

    /// # Errors
    /// Returns [`crate::Error::UnsupportedChunkShape`] unless every chunk edge is [`CHUNK_LEN`].
    pub fn validate_chunk_shape(&self) -> crate::Result<()> {
        if self.chunk_shape.iter().all(|&n| n == CHUNK_LEN as u64) {
            Ok(())
        } else {
            Err(crate::Error::UnsupportedChunkShape(self.chunk_shape))
        }
    }

    /// Check everything about the sample layout that must hold before a chunk is decompressed.
    ///
    /// # Errors
    /// Returns an error for an unsupported dtype, a non-null filter list or a chunk shape
    /// other than [`CHUNK_LEN`] cubed, checked in that order.
    pub fn validate_for_decode(&self) -> crate::Result<()> {
        if self.dtype != SUPPORTED_DTYPE {
            return Err(crate::Error::UnsupportedDtype(self.dtype.clone()));
        }
        if self.filters == Filters::Present {
            return Err(crate::Error::UnsupportedFilters);
        }
        self.validate_chunk_shape()
    }

    /// Serialize the recognised fields back to a `.zarray` document.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        let doc = ZarrayDocument {
            chunks: self.chunk_shape,
            compressor: self.compressor.as_ref().map(|c| CompressorDocument {
                blocksize: c.blocksize,
                clevel: c.clevel,
                cname: &c.cname,
                id: &c.id,
                shuffle: c.shuffle,
            }),
            dimension_separator: self.dimension_separator.map(String::from),
            dtype: &self.dtype,
            fill_value: self.fill_value,
            filters: match self.filters {
                Filters::Absent => None,
                Filters::Null => Some(Value::Null),
                Filters::Present => Some(Value::Array(vec![])),
            },
            order: self.order.map(String::from),
            shape: self.array_shape,
            zarr_format: self.format_version,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

impl fmt::Display for ArrayMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_loaded() {
            return write!(f, "no array metadata loaded");
        }
        writeln!(f, "Format: {}", self.format_version)?;
        writeln!(f, "Shape: {:?}", self.array_shape)?;
        writeln!(f, "Chunks: {:?}", self.chunk_shape)?;
        write!(f, "Data Type: {}", self.dtype)?;
        if let Some(c) = &self.compressor {
            write!(
                f,
                "\nCompressor: {} ({}, level {}, shuffle {})",
                c.id, c.cname, c.clevel, c.shuffle
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CompressorDocument<'a> {
    blocksize: i64,
    clevel: i64,
    cname: &'a str,
    id: &'a str,
    shuffle: i64,
}

#[derive(Serialize)]
struct ZarrayDocument<'a> {
    chunks: [u64; 3],
    compressor: Option<CompressorDocument<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension_separator: Option<String>,
    dtype: &'a str,
    fill_value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<String>,
    shape: [u64; 3],
    zarr_format: u32,
}

/// A compressor record without an `id` is treated as "no compression".
fn parse_compressor(value: &Value) -> Option<Compressor> {
    let record = value.as_object()?;
    let mut out = Compressor::default();
    for (key, value) in record {
        match key.as_str() {
            "blocksize" => out.blocksize = as_int(value).unwrap_or(out.blocksize),
            "clevel" => out.clevel = as_int(value).unwrap_or(out.clevel),
            "cname" => {
                if let Some(s) = value.as_str() {
                    out.cname = bounded_text(s);
                }
            }
            "id" => {
                if let Some(s) = value.as_str() {
                    out.id = bounded_text(s);
                }
            }
            "shuffle" => out.shuffle = as_int(value).unwrap_or(out.shuffle),
            _ => {}
        }
    }
    (!out.id.is_empty()).then_some(out)
}

/// Fill up to three slots from a JSON array; non-numeric elements leave their slot untouched.
fn read_triple(value: &Value, out: &mut [u64; 3]) {
    let Some(items) = value.as_array() else {
        return;
    };
    for (slot, item) in out.iter_mut().zip(items) {
        if let Some(n) = as_int(item) {
            *slot = u64::try_from(n).unwrap_or(0);
        }
    }
}

/// Best-effort integer conversion: fractions are truncated toward zero.
fn as_int(value: &Value) -> Option<i64> {
    let n = value.as_number()?;
    n.as_i64()
        .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
        .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
}

fn first_char(value: &Value) -> Option<char> {
    value.as_str()?.chars().next()
}

fn bounded_text(s: &str) -> String {
    s.chars().take(MAX_TEXT_LEN).collect()
}
