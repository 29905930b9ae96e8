//! SHA-1 hashing primitives for content-addressed storage

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::storage::types::{BlobId, ObjectId};

/// Hash bytes using SHA-1
pub fn hash_bytes(data: &[u8]) -> ObjectId {
    let digest = Sha1::digest(data);
    let mut bytes = [0u8; ObjectId::LEN];
    bytes.copy_from_slice(&digest);
    ObjectId::from_bytes(bytes)
}

/// The id a blob with this content is stored under
pub fn blob_id(content: &[u8]) -> BlobId {
    BlobId::new(hash_bytes(content))
}

/// Hash a file without loading it whole
pub fn hash_file(path: &Path) -> io::Result<BlobId> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha1::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let mut bytes = [0u8; ObjectId::LEN];
    bytes.copy_from_slice(&hasher.finalize());
    Ok(BlobId::new(ObjectId::from_bytes(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_bytes(b"hello world"), hash_bytes(b"hello world"));
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_bytes(b"").to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            hash_bytes(b"abc").to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let content: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        assert_eq!(hash_file(&path).unwrap(), blob_id(&content));
    }
}
