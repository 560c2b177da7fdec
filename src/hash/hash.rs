// Hash computation module
// Algorithm registry, resettable incremental hashers and read-buffer tiering

use super::error::HashUtilityError;
use blake2::{Blake2b512, Blake2s256};
use md5::Md5;
use sha1::Sha1;
use sha2::digest::{Digest, FixedOutputReset};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};

/// Files at or below this size are read with the small buffer
pub const SMALL_FILE_THRESHOLD: u64 = 64 * 1024;
/// Read buffer for small files (4KB)
pub const DEFAULT_BUFFER_SIZE: usize = 4096;
/// Read buffer for everything above the threshold (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Trait for incremental hash algorithm implementations
///
/// A hasher is long-lived: workers keep one for their whole lifetime and call
/// `finalize_reset` after each file instead of building a new instance.
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Return the digest and reset the hasher to its initial state
    fn finalize_reset(&mut self) -> Vec<u8>;

    /// Get the output size in bytes
    fn output_size(&self) -> usize;
}

/// Adapter for every RustCrypto digest that supports in-place reset
pub struct DigestHasher<D>(D);

impl<D> Hasher for DigestHasher<D>
where
    D: Digest + FixedOutputReset + Send,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        Digest::finalize_reset(&mut self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        <D as Digest>::output_size()
    }
}

// BLAKE3 is not a RustCrypto digest, so it gets its own wrapper
pub struct Blake3Wrapper(blake3::Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let out = self.0.finalize().as_bytes().to_vec();
        self.0.reset();
        out
    }

    fn output_size(&self) -> usize {
        32 // 256 bits
    }
}

/// Registry for hash algorithms
pub struct HashRegistry;

impl HashRegistry {
    /// Normalize a user-supplied algorithm name to its canonical spelling
    ///
    /// Matching ignores case, `-` and `_`, so `sha-256`, `SHA256` and `sha_256`
    /// are the same algorithm.
    pub fn canonical_name(algorithm: &str) -> Option<&'static str> {
        let key: String = algorithm
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        let name = match key.as_str() {
            "md5" => "MD5",
            "sha1" => "SHA1",
            "sha224" => "SHA224",
            "sha256" => "SHA256",
            "sha384" => "SHA384",
            "sha512" => "SHA512",
            "sha3256" => "SHA3-256",
            "sha3512" => "SHA3-512",
            "blake2b" | "blake2b512" => "BLAKE2b",
            "blake2s" | "blake2s256" => "BLAKE2s",
            "blake3" | "b3" => "BLAKE3",
            _ => return None,
        };
        Some(name)
    }

    /// Get a hasher instance for the specified algorithm
    pub fn get_hasher(algorithm: &str) -> Result<Box<dyn Hasher>, HashUtilityError> {
        let name = Self::canonical_name(algorithm).ok_or_else(|| {
            HashUtilityError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            }
        })?;

        let hasher: Box<dyn Hasher> = match name {
            "MD5" => Box::new(DigestHasher(Md5::new())),
            "SHA1" => Box::new(DigestHasher(Sha1::new())),
            "SHA224" => Box::new(DigestHasher(Sha224::new())),
            "SHA256" => Box::new(DigestHasher(Sha256::new())),
            "SHA384" => Box::new(DigestHasher(Sha384::new())),
            "SHA512" => Box::new(DigestHasher(Sha512::new())),
            "SHA3-256" => Box::new(DigestHasher(Sha3_256::new())),
            "SHA3-512" => Box::new(DigestHasher(Sha3_512::new())),
            "BLAKE2b" => Box::new(DigestHasher(Blake2b512::new())),
            "BLAKE2s" => Box::new(DigestHasher(Blake2s256::new())),
            _ => Box::new(Blake3Wrapper(blake3::Hasher::new())),
        };
        Ok(hasher)
    }

    /// All canonical algorithm names, for help text and validation messages
    pub fn algorithm_names() -> &'static [&'static str] {
        &[
            "MD5", "SHA1", "SHA224", "SHA256", "SHA384", "SHA512", "SHA3-256", "SHA3-512",
            "BLAKE2b", "BLAKE2s", "BLAKE3",
        ]
    }

    /// Hash an in-memory buffer and return lowercase hex
    pub fn digest_hex(algorithm: &str, data: &[u8]) -> Result<String, HashUtilityError> {
        let mut hasher = Self::get_hasher(algorithm)?;
        hasher.update(data);
        Ok(bytes_to_hex(&hasher.finalize_reset()))
    }
}

/// Pick the read buffer size for a file of the given size
pub fn buffer_size_for(file_size: u64) -> usize {
    if file_size > SMALL_FILE_THRESHOLD {
        LARGE_BUFFER_SIZE
    } else {
        DEFAULT_BUFFER_SIZE
    }
}

/// Convert bytes to lowercase hexadecimal string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

// Tests in tests/hash/hash_tests.rs
