//! Cipher suite transforms for the encrypted region.
//!
//! Three interchangeable transforms sit behind the [`CipherSuite`] trait:
//! plaintext pass-through, AES-128-CTR with an HMAC-SHA1 tag (legacy
//! authenticate-then-encrypt), and AES-128-EAX with a 64- or 128-bit tag.
//! Adding a suite means adding one implementation, not editing a chain of
//! conditionals in the facade.
//!
//! The wire format requires the 12-byte EAX nonce from
//! [`crate::nonce::eax_nonce`], while the RustCrypto `eax` crate fixes the
//! nonce to the AES block size. EAX is therefore composed here from the
//! `aes` + `ctr` + `cmac` primitives: `OMAC^t(M) = CMAC([t]_128 ‖ M)`, the
//! CTR keystream starts at `OMAC^0(nonce)`, and the tag is
//! `OMAC^0(nonce) ⊕ OMAC^1(aad) ⊕ OMAC^2(ciphertext)` truncated to the
//! suite's tag length.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use cmac::Cmac;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::error::CodecError;
use crate::key::{CtrSha1Key, EaxKey, AES128_KEY_SIZE};
use crate::nonce::{ctr_initial_counter, eax_nonce};

/// HMAC-SHA1 integrity tag size in bytes (CTR+SHA1 suite).
pub const HMAC_SHA1_TAG_SIZE: usize = 20;

/// EAX authentication tag size for the 64-bit tag suite.
pub const EAX_TAG_SIZE_64: usize = 8;

/// EAX authentication tag size for the 128-bit tag suite.
pub const EAX_TAG_SIZE_128: usize = 16;

const AES_BLOCK_SIZE: usize = 16;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type HmacSha1 = Hmac<Sha1>;
type CmacAes128 = Cmac<Aes128>;

/// Per-message inputs shared by every transform
pub(crate) struct TransformContext<'a> {
    /// Integrity/associated-data buffer; empty for the plaintext suite
    pub pseudo_header: &'a [u8],
    /// Source node id feeding nonce/counter derivation
    pub source_node_id: u64,
    /// Message id feeding nonce/counter derivation
    pub message_id: u32,
}

/// One authenticated-encryption transform over the encrypted region
pub(crate) trait CipherSuite {
    /// Bytes of authentication overhead appended after the payload
    fn overhead(&self) -> usize;

    /// Transform a payload into the wire encrypted region
    fn seal(&self, ctx: &TransformContext<'_>, payload: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Verify and recover the payload from the wire encrypted region
    ///
    /// Fails closed: no plaintext is returned unless verification succeeds.
    fn open(&self, ctx: &TransformContext<'_>, region: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Pass-through transform for unencrypted messages
pub(crate) struct PlainSuite;

impl CipherSuite for PlainSuite {
    fn overhead(&self) -> usize {
        0
    }

    fn seal(&self, _ctx: &TransformContext<'_>, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }

    fn open(&self, _ctx: &TransformContext<'_>, region: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(region.to_vec())
    }
}

/// Legacy AES-128-CTR + HMAC-SHA1 authenticate-then-encrypt transform
pub(crate) struct CtrSha1Suite<'k> {
    pub key: &'k CtrSha1Key,
}

impl CtrSha1Suite<'_> {
    fn tag(&self, pseudo_header: &[u8], payload: &[u8]) -> [u8; HMAC_SHA1_TAG_SIZE] {
        let mut mac = <HmacSha1 as Mac>::new_from_slice(self.key.integrity_key())
            .expect("HMAC accepts any key length");
        mac.update(pseudo_header);
        mac.update(payload);
        mac.finalize().into_bytes().into()
    }
}

impl CipherSuite for CtrSha1Suite<'_> {
    fn overhead(&self) -> usize {
        HMAC_SHA1_TAG_SIZE
    }

    fn seal(&self, ctx: &TransformContext<'_>, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        let tag = self.tag(ctx.pseudo_header, payload);

        let mut block = Vec::with_capacity(payload.len() + HMAC_SHA1_TAG_SIZE);
        block.extend_from_slice(payload);
        block.extend_from_slice(&tag);

        let counter = ctr_initial_counter(ctx.source_node_id, ctx.message_id);
        let mut cipher = Aes128Ctr::new(self.key.data_key().into(), (&counter).into());
        cipher.apply_keystream(&mut block);

        Ok(block)
    }

    fn open(&self, ctx: &TransformContext<'_>, region: &[u8]) -> Result<Vec<u8>, CodecError> {
        if region.len() < HMAC_SHA1_TAG_SIZE {
            return Err(CodecError::MalformedMessage(
                "encrypted region shorter than integrity tag",
            ));
        }

        let counter = ctr_initial_counter(ctx.source_node_id, ctx.message_id);
        let mut block = region.to_vec();
        let mut cipher = Aes128Ctr::new(self.key.data_key().into(), (&counter).into());
        cipher.apply_keystream(&mut block);

        let split = block.len() - HMAC_SHA1_TAG_SIZE;
        let expected = self.tag(ctx.pseudo_header, &block[..split]);
        if !bool::from(expected[..].ct_eq(&block[split..])) {
            return Err(CodecError::IntegrityCheckFailed);
        }

        block.truncate(split);
        Ok(block)
    }
}

/// AES-128-EAX AEAD transform with a selectable tag length
pub(crate) struct EaxSuite<'k> {
    pub key: &'k EaxKey,
    pub tag_size: usize,
}

impl CipherSuite for EaxSuite<'_> {
    fn overhead(&self) -> usize {
        self.tag_size
    }

    fn seal(&self, ctx: &TransformContext<'_>, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        let nonce = eax_nonce(ctx.source_node_id, ctx.message_id);
        Ok(eax_seal(
            self.key.data_key(),
            &nonce,
            ctx.pseudo_header,
            payload,
            self.tag_size,
        ))
    }

    fn open(&self, ctx: &TransformContext<'_>, region: &[u8]) -> Result<Vec<u8>, CodecError> {
        let nonce = eax_nonce(ctx.source_node_id, ctx.message_id);
        eax_open(
            self.key.data_key(),
            &nonce,
            ctx.pseudo_header,
            region,
            self.tag_size,
        )
    }
}

/// `OMAC^t(data) = CMAC([t]_128 ‖ data)` per the EAX definition
fn omac(key: &[u8; AES128_KEY_SIZE], tweak: u8, data: &[u8]) -> [u8; AES_BLOCK_SIZE] {
    let mut mac = <CmacAes128 as Mac>::new(key.into());
    mac.update(&[0u8; AES_BLOCK_SIZE - 1]);
    mac.update(&[tweak]);
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn eax_tag(
    nonce_mac: &[u8; AES_BLOCK_SIZE],
    aad_mac: &[u8; AES_BLOCK_SIZE],
    cipher_mac: &[u8; AES_BLOCK_SIZE],
) -> [u8; AES_BLOCK_SIZE] {
    let mut tag = [0u8; AES_BLOCK_SIZE];
    for (i, t) in tag.iter_mut().enumerate() {
        *t = nonce_mac[i] ^ aad_mac[i] ^ cipher_mac[i];
    }
    tag
}

/// EAX encrypt: returns `ciphertext ‖ tag[..tag_size]`
pub(crate) fn eax_seal(
    key: &[u8; AES128_KEY_SIZE],
    nonce: &[u8],
    aad: &[u8],
    payload: &[u8],
    tag_size: usize,
) -> Vec<u8> {
    let nonce_mac = omac(key, 0, nonce);
    let aad_mac = omac(key, 1, aad);

    let mut out = Vec::with_capacity(payload.len() + tag_size);
    out.extend_from_slice(payload);
    let mut cipher = Aes128Ctr::new(key.into(), (&nonce_mac).into());
    cipher.apply_keystream(&mut out);

    let cipher_mac = omac(key, 2, &out);
    let tag = eax_tag(&nonce_mac, &aad_mac, &cipher_mac);
    out.extend_from_slice(&tag[..tag_size]);
    out
}

/// EAX decrypt: verifies the tag before any plaintext is produced
pub(crate) fn eax_open(
    key: &[u8; AES128_KEY_SIZE],
    nonce: &[u8],
    aad: &[u8],
    region: &[u8],
    tag_size: usize,
) -> Result<Vec<u8>, CodecError> {
    if region.len() < tag_size {
        return Err(CodecError::MalformedMessage(
            "encrypted region shorter than authentication tag",
        ));
    }

    let split = region.len() - tag_size;
    let (ciphertext, wire_tag) = region.split_at(split);

    let nonce_mac = omac(key, 0, nonce);
    let aad_mac = omac(key, 1, aad);
    let cipher_mac = omac(key, 2, ciphertext);
    let tag = eax_tag(&nonce_mac, &aad_mac, &cipher_mac);

    if !bool::from(tag[..tag_size].ct_eq(wire_tag)) {
        return Err(CodecError::AuthenticationFailed);
    }

    let mut payload = ciphertext.to_vec();
    let mut cipher = Aes128Ctr::new(key.into(), (&nonce_mac).into());
    cipher.apply_keystream(&mut payload);
    Ok(payload)
}
