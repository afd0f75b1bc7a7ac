//! Save file encoding.
//!
//! Layout: `MAGIC` (4 bytes), encoding byte, compression byte, two reserved
//! zero bytes, then the body.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::data::{WorldSaveData, FORMAT_VERSION};
use crate::{Result, SaveError};

/// File signature.
pub const MAGIC: [u8; 4] = *b"VXTS";

/// Header size in bytes.
pub const HEADER_LEN: usize = 8;

/// Body serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveEncoding {
    /// Human-readable; new optional fields stay readable by older documents.
    #[default]
    Json,
    /// Compact binary.
    Bincode,
}

impl SaveEncoding {
    const fn tag(self) -> u8 {
        match self {
            Self::Json => 0,
            Self::Bincode => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::Json),
            1 => Ok(Self::Bincode),
            other => Err(SaveError::BadHeader(format!("unknown encoding {other}"))),
        }
    }
}

/// Body compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    #[default]
    Lz4,
}

impl Compression {
    const fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Lz4),
            other => Err(SaveError::BadHeader(format!("unknown compression {other}"))),
        }
    }
}

/// Serialize a save document into file bytes.
pub fn encode(data: &WorldSaveData, encoding: SaveEncoding, compression: Compression) -> Result<Vec<u8>> {
    let body = match encoding {
        SaveEncoding::Json => serde_json::to_vec_pretty(data)?,
        SaveEncoding::Bincode => bincode::serialize(data)?,
    };
    let body = match compression {
        Compression::None => body,
        Compression::Lz4 => compress_prepend_size(&body),
    };

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.push(encoding.tag());
    out.push(compression.tag());
    out.extend_from_slice(&[0, 0]);
    out.extend(body);
    Ok(out)
}

/// Parse file bytes back into a save document.
pub fn decode(bytes: &[u8]) -> Result<WorldSaveData> {
    if bytes.len() < HEADER_LEN {
        return Err(SaveError::BadHeader(format!("file is {} bytes", bytes.len())));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(SaveError::BadHeader("missing signature".to_string()));
    }
    let encoding = SaveEncoding::from_tag(header[4])?;
    let compression = Compression::from_tag(header[5])?;

    let body = match compression {
        Compression::None => body.to_vec(),
        Compression::Lz4 => decompress_size_prepended(body)?,
    };
    let data: WorldSaveData = match encoding {
        SaveEncoding::Json => serde_json::from_slice(&body)?,
        SaveEncoding::Bincode => bincode::deserialize(&body)?,
    };

    let major = |v: &str| v.split('.').next().map(str::to_string);
    if major(&data.format_version) != major(FORMAT_VERSION) {
        return Err(SaveError::UnsupportedVersion(data.format_version));
    }
    Ok(data)
}
