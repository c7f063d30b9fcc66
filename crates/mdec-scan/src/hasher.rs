//! Streaming content digests.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use mdec_core::{ContentHash, DigestKind, ScanError};

const CHUNK_SIZE: usize = 64 * 1024;

enum Digester {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    fn new(kind: DigestKind) -> Self {
        match kind {
            DigestKind::Sha256 => Self::Sha256(Sha256::new()),
            DigestKind::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize(self) -> ContentHash {
        match self {
            Self::Sha256(h) => ContentHash::new(h.finalize().into()),
            Self::Blake3(h) => ContentHash::new(*h.finalize().as_bytes()),
        }
    }
}

/// Stream a reader through the digest.
///
/// Returns the hash and the number of bytes read.
pub fn hash_reader<R: Read>(mut reader: R, kind: DigestKind) -> io::Result<(ContentHash, u64)> {
    let mut digester = Digester::new(kind);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digester.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok((digester.finalize(), total))
}

/// Hash a file on disk.
pub fn hash_file(path: &Path, kind: DigestKind) -> Result<(ContentHash, u64), ScanError> {
    let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    hash_reader(file, kind).map_err(|e| ScanError::io(path, e))
}

/// Hash an in-memory buffer.
pub fn hash_bytes(bytes: &[u8], kind: DigestKind) -> ContentHash {
    let mut digester = Digester::new(kind);
    digester.update(bytes);
    digester.finalize()
}
