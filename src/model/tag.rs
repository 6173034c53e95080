use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Token pairing variants across groups into one coherent combination.
///
/// Tags are the two leading ASCII digits of a variant's file name (`"03_smile.png"` has tag
/// `"03"`). [`SequenceTag::WILDCARD`] (`"00"`) matches every tag and never forms a tag of its
/// own. File names without a two-digit prefix fall back to [`SequenceTag::UNTAGGED`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceTag(String);

impl SequenceTag {
    /// Wildcard token, compatible with every tag.
    pub const WILDCARD: &'static str = "00";
    /// Tag assigned to names without a two-digit prefix.
    pub const UNTAGGED: &'static str = "99";

    /// Wrap an explicit token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The wildcard tag.
    pub fn wildcard() -> Self {
        Self(Self::WILDCARD.to_string())
    }

    /// Extract the tag from the file name component of `path`.
    pub fn from_file_name(path: impl AsRef<Path>) -> Self {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = name.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit() {
            return Self(name[..2].to_string());
        }
        Self(Self::UNTAGGED.to_string())
    }

    /// Return `true` for the `"00"` wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    /// Return `true` when a variant carrying `self` is eligible for `requested`.
    pub fn matches(&self, requested: &SequenceTag) -> bool {
        self.is_wildcard() || self == requested
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NaturalChunk {
    Text(String),
    Number(u128, usize),
}

impl PartialOrd for NaturalChunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NaturalChunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a, la), Self::Number(b, lb)) => a.cmp(b).then(la.cmp(lb)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // digits sort before letters
            (Self::Number(..), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(..)) => Ordering::Greater,
        }
    }
}

/// Sort key that orders `"2_x.png"` before `"10_x.png"`.
///
/// Only the file name component takes part; text runs compare case-insensitively.
pub(crate) fn natural_key(path: &str) -> Vec<NaturalChunk> {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();
    for ch in name.chars() {
        if ch.is_ascii_digit() {
            if !text.is_empty() {
                chunks.push(NaturalChunk::Text(std::mem::take(&mut text)));
            }
            digits.push(ch);
        } else {
            if !digits.is_empty() {
                chunks.push(number_chunk(std::mem::take(&mut digits)));
            }
            text.extend(ch.to_lowercase());
        }
    }
    if !text.is_empty() {
        chunks.push(NaturalChunk::Text(text));
    }
    if !digits.is_empty() {
        chunks.push(number_chunk(digits));
    }
    chunks
}

fn number_chunk(digits: String) -> NaturalChunk {
    let value = digits.parse::<u128>().unwrap_or(u128::MAX);
    NaturalChunk::Number(value, digits.len())
}

#[cfg(test)]
#[path = "../../tests/unit/model/tag.rs"]
mod tests;
