//! Reversible path encoding for the relocation operation.
//!
//! # Overview
//!
//! Moving a duplicate into the flat relocation directory must not lose its
//! original location, so the directory-relative path is folded into the new
//! file name itself:
//!
//! ```text
//! 0042 ::photos¦2019¦beach.jpg    <- was  photos/2019/beach.jpg
//! ```
//!
//! A zero-padded sequence counter, one space, the fixed marker, then the
//! relative path with every separator replaced by the reserved delimiter.
//! Decoding is the exact textual inverse, so move-back can restore every
//! file without any side-channel manifest.
//!
//! Names that cannot be encoded losslessly are refused, never truncated or
//! escaped: paths outside the root, non-UTF-8 paths, paths containing the
//! delimiter or the marker, and encodings that would exceed the maximum
//! filename length. A name that already carries the marker is refused too,
//! so running encode twice can never compound prefixes.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Reserved delimiter substituted for the path separator.
pub const DELIMITER: char = '\u{00A6}'; // '¦', broken bar

/// Marker separating the sequence counter from the encoded path.
pub const MARKER: &str = "::";

/// Width of the zero-padded sequence counter.
pub const SEQ_WIDTH: usize = 4;

/// Maximum encoded filename length in bytes (common filesystem limit).
pub const MAX_ENCODED_LEN: usize = 255;

/// Errors from encoding or decoding a relocated name.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The path is not inside the codec root.
    #[error("path is outside the target root: {0}")]
    OutsideRoot(PathBuf),

    /// The relative path is not valid UTF-8 and cannot be substituted.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8(PathBuf),

    /// The path contains the reserved delimiter character.
    #[error("path contains the reserved delimiter '{DELIMITER}': {0}")]
    DelimiterInPath(PathBuf),

    /// The name already carries the encoding marker.
    #[error("name is already encoded (marker present): {0}")]
    AlreadyEncoded(String),

    /// The encoded name would exceed the maximum filename length.
    #[error("encoded name would be {len} bytes (limit {MAX_ENCODED_LEN}): {path}")]
    TooLong { path: PathBuf, len: usize },

    /// The token carries no marker and cannot be decoded.
    #[error("not an encoded name (no marker): {0}")]
    MissingMarker(String),

    /// The decoded path contains an unsafe component.
    #[error("encoded name decodes to an unsafe path: {0}")]
    InvalidComponent(String),
}

/// Encoder/decoder rooted at a target directory.
#[derive(Debug, Clone)]
pub struct PathCodec {
    root: PathBuf,
}

impl PathCodec {
    /// Create a codec rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Encode a file's root-relative path into a single flat name.
    ///
    /// # Errors
    ///
    /// Refuses (never truncates) anything that would not round-trip; see
    /// the module docs for the cases.
    pub fn encode(&self, seq: usize, path: &Path) -> Result<String, CodecError> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| CodecError::OutsideRoot(path.to_path_buf()))?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(os) => {
                    let segment = os
                        .to_str()
                        .ok_or_else(|| CodecError::NonUtf8(path.to_path_buf()))?;
                    // Marker first: an already-encoded name also carries
                    // the delimiter, and must be reported as re-encoding.
                    if segment.contains(MARKER) {
                        return Err(CodecError::AlreadyEncoded(segment.to_string()));
                    }
                    if segment.contains(DELIMITER) {
                        return Err(CodecError::DelimiterInPath(path.to_path_buf()));
                    }
                    segments.push(segment);
                }
                _ => return Err(CodecError::OutsideRoot(path.to_path_buf())),
            }
        }
        if segments.is_empty() {
            return Err(CodecError::OutsideRoot(path.to_path_buf()));
        }

        let joined = segments.join(&DELIMITER.to_string());
        let width = SEQ_WIDTH;
        let token = format!("{seq:0width$} {MARKER}{joined}");
        if token.len() > MAX_ENCODED_LEN {
            return Err(CodecError::TooLong {
                path: path.to_path_buf(),
                len: token.len(),
            });
        }
        Ok(token)
    }

    /// Decode a flat name back to the absolute path it was encoded from.
    ///
    /// The sequence counter before the marker is ignored; it exists only to
    /// keep the flat names unique.
    ///
    /// # Errors
    ///
    /// Fails when the marker is absent or the decoded path would escape the
    /// root.
    pub fn decode(&self, token: &str) -> Result<PathBuf, CodecError> {
        let marker_at = token
            .find(MARKER)
            .ok_or_else(|| CodecError::MissingMarker(token.to_string()))?;
        let encoded = &token[marker_at + MARKER.len()..];
        if encoded.is_empty() {
            return Err(CodecError::InvalidComponent(token.to_string()));
        }

        let mut path = self.root.clone();
        for segment in encoded.split(DELIMITER) {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('/')
                || segment.contains('\\')
            {
                return Err(CodecError::InvalidComponent(token.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Whether a name already carries the encoding marker.
    #[must_use]
    pub fn is_encoded(token: &str) -> bool {
        token.contains(MARKER)
    }
}
