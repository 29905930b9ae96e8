//! core type-safe wrappers for the storage layer.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Formatter;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A raw 160-bit content digest.
///
/// Blobs and commits are both keyed by one of these; the typed wrappers
/// below keep the two id spaces from being mixed up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// digest length in bytes
    pub const LEN: usize = 20;

    /// digest length in hex characters
    pub const HEX_LEN: usize = 40;

    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// parse a full-length hex digest
    pub fn from_hex(s: &str) -> Result<Self, InvalidIdError> {
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidIdError(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// short form used in log output
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }

    /// split into the two-character directory and the remaining file name
    pub(crate) fn fanout(&self) -> (String, String) {
        let mut hex = self.to_hex();
        let rest = hex.split_off(2);
        (hex, rest)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ObjectId::from_hex(&hex).map_err(D::Error::custom)
    }
}

/// This makes sure we don't accidentally pass a blob ID where a commit ID
/// is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub(crate) ObjectId);

impl CommitId {
    pub(crate) fn new(oid: ObjectId) -> Self {
        Self(oid)
    }

    /// raw digest (for internal use only)
    pub(crate) fn raw(&self) -> ObjectId {
        self.0
    }

    /// parse CommitId from a full hex string
    pub fn from_hex(hex: &str) -> Result<Self, InvalidIdError> {
        ObjectId::from_hex(hex).map(CommitId)
    }

    /// short form of the commit ID
    pub fn short(&self) -> String {
        self.0.short()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of a stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(pub(crate) ObjectId);

impl BlobId {
    pub(crate) fn new(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub(crate) fn raw(&self) -> ObjectId {
        self.0
    }

    pub fn from_hex(hex: &str) -> Result<Self, InvalidIdError> {
        ObjectId::from_hex(hex).map(BlobId)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated working-tree file name.
///
/// The working tree is flat, so names are a single path component.
///
/// Valid names:
/// - 1-255 bytes
/// - no path separators or NUL bytes
/// - not `.` or `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileName(String);

impl FileName {
    /// names that can never be tracked
    const RESERVED: &'static [&'static str] = &[".", ".."];

    /// create a new FileName, validating the input
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }

        if name.len() > 255 {
            return Err(InvalidNameError::TooLong(name.len()));
        }

        for (i, c) in name.chars().enumerate() {
            if c == '/' || c == '\\' || c == '\0' {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        if Self::RESERVED.contains(&name) {
            return Err(InvalidNameError::Reserved(name.to_string()));
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileName> for String {
    fn from(name: FileName) -> Self {
        name.0
    }
}

/// a branch name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// branch created by `init`
    pub const DEFAULT: &'static str = "master";

    /// create a new BranchName
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }
        if name.contains("..") || name.ends_with('/') || name.starts_with('/') {
            return Err(InvalidNameError::InvalidPath(name));
        }
        for (i, c) in name.chars().enumerate() {
            if c.is_whitespace() || c.is_control() {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }
        Ok(Self(name))
    }

    /// the branch `init` starts on
    pub fn default_branch() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

/// Complete snapshot of tracked files: file name to blob hash.
///
/// A `BTreeMap` keeps serialization order stable, which the commit hash
/// depends on.
pub type FileTable = BTreeMap<FileName, BlobId>;

/// error type for invalid names (files, branches)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidCharacter { char: char, position: usize },
    Reserved(String),
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} bytes", len),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character {:?} at position {}", char, position)
            }
            Self::Reserved(name) => write!(f, "'{}' is a reserved name", name),
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

/// a string that is not a full-length hex digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIdError(pub String);

impl fmt::Display for InvalidIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "invalid object id: '{}'", self.0)
    }
}

impl std::error::Error for InvalidIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_valid() {
        assert!(FileName::new("hello.txt").is_ok());
        assert!(FileName::new("Makefile").is_ok());
        assert!(FileName::new(".env").is_ok());
        assert!(FileName::new(".gitlet").is_ok());
        assert!(FileName::new("with space.md").is_ok());
    }

    #[test]
    fn test_file_name_invalid() {
        assert_eq!(FileName::new(""), Err(InvalidNameError::Empty));
        assert!(FileName::new("dir/file").is_err());
        assert!(FileName::new("..").is_err());
        assert!(FileName::new("a".repeat(256)).is_err());
    }

    #[test]
    fn test_branch_name() {
        assert!(BranchName::new("feature-1").is_ok());
        assert!(BranchName::new("topic/login").is_ok());
        assert!(BranchName::new("").is_err());
        assert!(BranchName::new("a..b").is_err());
        assert!(BranchName::new("has space").is_err());
        assert_eq!(BranchName::default_branch().as_str(), "master");
    }

    #[test]
    fn test_object_id_hex() {
        let hex = "0123456789abcdef0123456789abcdef01234567";
        let id = ObjectId::from_hex(hex).unwrap();
        assert_eq!(id.to_hex(), hex);
        assert_eq!(id.short(), "0123456");

        let (dir, rest) = id.fanout();
        assert_eq!(dir, "01");
        assert_eq!(rest.len(), ObjectId::HEX_LEN - 2);

        assert!(ObjectId::from_hex("abc").is_err());
        assert!(ObjectId::from_hex(&"z".repeat(40)).is_err());
    }

    #[test]
    fn test_serde_as_strings() {
        let mut table = FileTable::new();
        let blob = BlobId::from_hex("ffffffffffffffffffffffffffffffffffffffff").unwrap();
        table.insert(FileName::new("a.txt").unwrap(), blob);

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"a.txt":"ffffffffffffffffffffffffffffffffffffffff"}"#);

        let back: FileTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);

        let bad: Result<FileTable, _> = serde_json::from_str(r#"{"a/b":"ffffffffffffffffffffffffffffffffffffffff"}"#);
        assert!(bad.is_err());
    }
}
