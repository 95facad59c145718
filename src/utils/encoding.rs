//! Encoding utilities for converting legacy HTML bytes to UTF-8.
//!
//! Uses encoding_rs for the Windows-1252 and Latin-1 tables instead of
//! hand-written mappings.

use crate::error::ConvertError;
use encoding_rs::WINDOWS_1252;
use std::path::Path;

/// Bytes with no assignment in the Windows-1252 code page.
const WINDOWS_1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

const BOM: char = '\u{feff}';

/// A single text encoding that can be tried on raw file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Utf8,
    Windows1252,
    Latin1,
}

impl Codec {
    /// Look up a codec by its label (case-insensitive).
    pub fn from_label(label: &str) -> Result<Self, ConvertError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Codec::Utf8),
            "windows-1252" | "cp1252" => Ok(Codec::Windows1252),
            "iso-8859-1" | "latin-1" | "latin1" => Ok(Codec::Latin1),
            _ => Err(ConvertError::UnknownEncoding(label.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Utf8 => "UTF-8",
            Codec::Windows1252 => "windows-1252",
            Codec::Latin1 => "ISO-8859-1",
        }
    }

    /// Decode bytes strictly. Returns `None` if the bytes are not valid in this encoding.
    ///
    /// A UTF-8 byte-order mark is dropped so it never reaches the output.
    pub fn decode(&self, data: &[u8]) -> Option<String> {
        match self {
            Codec::Utf8 => {
                let text = std::str::from_utf8(data).ok()?;
                Some(text.strip_prefix(BOM).unwrap_or(text).to_string())
            }
            Codec::Windows1252 => {
                if data.iter().any(|b| WINDOWS_1252_UNDEFINED.contains(b)) {
                    return None;
                }
                let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(data);
                Some(decoded.into_owned())
            }
            Codec::Latin1 => Some(encoding_rs::mem::decode_latin1(data).into_owned()),
        }
    }
}

/// Text produced by a decode chain, with the codec that accepted the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub codec: Codec,
}

/// Ordered list of codecs tried one after another. Always ends with Latin-1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeChain {
    codecs: Vec<Codec>,
}

impl DecodeChain {
    /// Build a chain from encoding labels, appending Latin-1 if it is not already last.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, ConvertError> {
        let mut codecs = labels
            .iter()
            .map(|label| Codec::from_label(label.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if codecs.last() != Some(&Codec::Latin1) {
            codecs.push(Codec::Latin1);
        }

        Ok(Self { codecs })
    }

    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }

    /// Decode with the first codec that accepts the bytes.
    pub fn decode(&self, data: &[u8]) -> Decoded {
        for codec in &self.codecs {
            if let Some(text) = codec.decode(data) {
                return Decoded {
                    text,
                    codec: *codec,
                };
            }
        }

        Decoded {
            text: encoding_rs::mem::decode_latin1(data).into_owned(),
            codec: Codec::Latin1,
        }
    }
}

impl Default for DecodeChain {
    fn default() -> Self {
        Self {
            codecs: vec![Codec::Utf8, Codec::Windows1252, Codec::Latin1],
        }
    }
}

/// Read a file and decode it with a single codec, failing if the bytes don't fit.
pub fn read_file_strict(path: &Path, codec: Codec) -> Result<String, ConvertError> {
    let data = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    codec.decode(&data).ok_or_else(|| ConvertError::Decode {
        path: path.to_path_buf(),
        encoding: codec.name(),
    })
}

/// Read a file and decode it with the fallback chain. Only I/O can fail.
pub fn read_file_with_fallback(path: &Path, chain: &DecodeChain) -> Result<Decoded, ConvertError> {
    let data = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    Ok(chain.decode(&data))
}

/// Write text as UTF-8 without a byte-order mark or newline translation.
pub fn write_utf8(path: &Path, text: &str) -> Result<(), ConvertError> {
    std::fs::write(path, text.as_bytes()).map_err(|e| ConvertError::io(path, e))
}
