//! Encryption key records.
//!
//! Keys are supplied by the caller per call; the codec never persists,
//! caches, or mutates key material. Key bytes are zeroed on drop and never
//! appear in `Debug` output.

use zeroize::ZeroizeOnDrop;

use crate::header::EncryptionType;

/// AES-128 data key size in bytes.
pub const AES128_KEY_SIZE: usize = 16;

/// HMAC-SHA1 integrity key size in bytes.
pub const HMAC_SHA1_KEY_SIZE: usize = 20;

/// Key material for the AES-128-CTR + HMAC-SHA1 suite
#[derive(Clone, ZeroizeOnDrop)]
pub struct CtrSha1Key {
    data_key: [u8; AES128_KEY_SIZE],
    integrity_key: [u8; HMAC_SHA1_KEY_SIZE],
}

impl CtrSha1Key {
    /// Create a key record from raw key bytes
    pub fn from_bytes(
        data_key: [u8; AES128_KEY_SIZE],
        integrity_key: [u8; HMAC_SHA1_KEY_SIZE],
    ) -> Self {
        Self {
            data_key,
            integrity_key,
        }
    }

    /// AES-128 encryption key bytes
    pub fn data_key(&self) -> &[u8; AES128_KEY_SIZE] {
        &self.data_key
    }

    /// HMAC-SHA1 integrity key bytes
    pub fn integrity_key(&self) -> &[u8; HMAC_SHA1_KEY_SIZE] {
        &self.integrity_key
    }
}

impl std::fmt::Debug for CtrSha1Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtrSha1Key").finish_non_exhaustive()
    }
}

/// Key material for the AES-128-EAX suites
#[derive(Clone, ZeroizeOnDrop)]
pub struct EaxKey {
    data_key: [u8; AES128_KEY_SIZE],
}

impl EaxKey {
    /// Create a key record from raw key bytes
    pub fn from_bytes(data_key: [u8; AES128_KEY_SIZE]) -> Self {
        Self { data_key }
    }

    /// AES-128 encryption key bytes
    pub fn data_key(&self) -> &[u8; AES128_KEY_SIZE] {
        &self.data_key
    }
}

impl std::fmt::Debug for EaxKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EaxKey").finish_non_exhaustive()
    }
}

/// Encryption key record, polymorphic over the cipher suites
#[derive(Debug, Clone)]
pub enum EncryptionKey {
    /// Key pair for the legacy CTR+SHA1 suite
    CtrSha1(CtrSha1Key),
    /// Data key for the EAX suites (either tag length)
    Eax(EaxKey),
}

impl EncryptionKey {
    /// Whether this key variant can serve the given encryption type
    pub fn matches_encryption_type(&self, encryption_type: EncryptionType) -> bool {
        match (self, encryption_type) {
            (EncryptionKey::CtrSha1(_), EncryptionType::Aes128CtrSha1) => true,
            (EncryptionKey::Eax(_), EncryptionType::Aes128Eax64) => true,
            (EncryptionKey::Eax(_), EncryptionType::Aes128Eax128) => true,
            _ => false,
        }
    }
}
