//! Reading sales logs from disk.

use thiserror::Error;
use tracing::{debug, info};

use std::{
    fmt::Display,
    fs, io,
    path::{Path, PathBuf},
};

/// Errors that stop a sales log from being read at all.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("file '{}' not found, please check the file path", path.display())]
    NotFound { path: PathBuf },

    #[error("reading '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to decode '{}' with any of the attempted encodings: {tried}", path.display())]
    Undecodable { path: PathBuf, tried: String },
}

/// A text encoding a sales log may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
    Windows1252,
}

/// Encodings tried, in order, when reading a sales log.
pub const FALLBACK_ENCODINGS: [Encoding; 3] =
    [Encoding::Utf8, Encoding::Latin1, Encoding::Windows1252];

/// Characters for bytes 0x80..=0x9F in Windows-1252. `None` marks the five
/// bytes the code page leaves undefined.
#[rustfmt::skip]
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None,             Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None,             Some('\u{017D}'), None,
    None,             Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None,             Some('\u{017E}'), Some('\u{0178}'),
];

impl Encoding {
    /// Decodes `bytes`, or returns `None` if they are not valid in this
    /// encoding.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(String::from),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Windows1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(b - 0x80)],
                    _ => Some(char::from(b)),
                })
                .collect(),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Windows1252 => "cp1252",
        };
        f.write_str(name)
    }
}

/// Decodes `bytes` with the first of `encodings` that accepts them.
#[must_use]
pub fn decode_with_fallback(bytes: &[u8], encodings: &[Encoding]) -> Option<(Encoding, String)> {
    encodings
        .iter()
        .find_map(|&enc| enc.decode(bytes).map(|text| (enc, text)))
}

/// Reads the sales log at `path` and returns its data lines.
///
/// The file is decoded with the first of [`FALLBACK_ENCODINGS`] that fits.
/// Lines may end in `\n`, `\r\n` or a bare `\r`. The first line is a header
/// and is dropped. The remaining lines are trimmed, and blank ones are
/// removed.
///
/// # Errors
///
/// Returns [`InputError::NotFound`] if there is no file at `path`,
/// [`InputError::Io`] if it cannot be read, and [`InputError::Undecodable`]
/// if no encoding can decode it.
pub fn read_sales_data(path: impl AsRef<Path>) -> Result<Vec<String>, InputError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => InputError::NotFound {
            path: path.to_path_buf(),
        },
        _ => InputError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let Some((encoding, text)) = decode_with_fallback(&bytes, &FALLBACK_ENCODINGS) else {
        return Err(InputError::Undecodable {
            path: path.to_path_buf(),
            tried: FALLBACK_ENCODINGS
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        });
    };
    if encoding != Encoding::Utf8 {
        info!(%encoding, path = %path.display(), "decoded with fallback encoding");
    }
    let lines: Vec<String> = text
        .split(['\n', '\r'])
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    debug!(rows = lines.len(), path = %path.display(), "read sales data");
    Ok(lines)
}
