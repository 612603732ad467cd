//! Secure message framing codec for the Weave wire protocol.
//!
//! This crate implements the binary encoding/decoding of the Weave message
//! header and the authenticated-encryption transforms applied to the
//! payload. It is a pure, stateless library: no transport I/O, no key
//! lookup, no session bookkeeping. The session layer supplies a header,
//! key record, and plaintext and receives wire bytes; in the other
//! direction the codec returns a verified message or a typed error.
//!
//! ## Wire Format
//!
//! Little-endian unless noted.
//!
//! ```text
//! +----------------------+--------------------------------------+
//! | u16 header word      | flags:0x0F0F | encType<<4 | ver<<12  |
//! +----------------------+--------------------------------------+
//! | u32 message id       |                                      |
//! +----------------------+--------------------------------------+
//! | u64 source node id   | iff SOURCE_NODE_ID_PRESENT           |
//! +----------------------+--------------------------------------+
//! | u64 dest node id     | iff DEST_NODE_ID_PRESENT             |
//! +----------------------+--------------------------------------+
//! | u16 key id           | iff encryption type != None          |
//! +----------------------+--------------------------------------+
//! | encrypted region     | payload, or payload‖tag(20) for      |
//! |                      | CTR+SHA1, or ciphertext‖tag(8|16)    |
//! |                      | for the EAX suites                   |
//! +----------------------+--------------------------------------+
//! ```
//!
//! ## Cipher Suites
//!
//! - `None`: pass-through, no integrity protection
//! - `Aes128CtrSha1`: legacy authenticate-then-encrypt, HMAC-SHA1 tag
//!   encrypted together with the payload under AES-128-CTR
//! - `Aes128Eax64` / `Aes128Eax128`: AES-128-EAX AEAD with the
//!   pseudo-header as associated data
//!
//! Nonces and counters are derived deterministically from
//! `(source node id, message id)`; the codec consumes these values and
//! never generates randomness itself.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cipher;
pub mod codec;
pub mod error;
pub mod header;
pub mod key;
pub mod nonce;
pub mod pseudo_header;

// Re-export main types
pub use cipher::{EAX_TAG_SIZE_128, EAX_TAG_SIZE_64, HMAC_SHA1_TAG_SIZE};
pub use codec::{decode_message, encode_message, DecodedMessage, MAX_MESSAGE_SIZE};
pub use error::CodecError;
pub use header::{
    EncryptionType, HeaderFlags, MessageHeader, MessageVersion, ANY_NODE_ID, FIXED_HEADER_SIZE,
    HEADER_FLAGS_MASK,
};
pub use key::{
    CtrSha1Key, EaxKey, EncryptionKey, AES128_KEY_SIZE, HMAC_SHA1_KEY_SIZE,
};
pub use nonce::{ctr_initial_counter, eax_nonce, CTR_COUNTER_SIZE, EAX_NONCE_SIZE};
pub use pseudo_header::{
    build_pseudo_header, PseudoHeaderVariant, PSEUDO_HEADER_EXCLUDED_FLAGS, PSEUDO_HEADER_MAX,
};
