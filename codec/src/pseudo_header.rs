//! Pseudo-header construction.
//!
//! The pseudo-header is a derived buffer that is never transmitted: it is
//! the integrity input for the CTR+SHA1 suite and the associated data for
//! the EAX suites. It binds the endpoint node ids and, except in the legacy
//! variant, the masked header word and message id.

use smallvec::SmallVec;

use crate::header::{EncryptionType, HeaderFlags, MessageVersion};

/// Maximum pseudo-header length in bytes.
pub const PSEUDO_HEADER_MAX: usize = 22;

/// Flag bits excluded from the masked header word.
///
/// Toggling these bits on the wire does not change the integrity input;
/// `TUNNELED_DATA` stays covered. This asymmetry is deliberate
/// compatibility behavior, not a simplification opportunity.
pub const PSEUDO_HEADER_EXCLUDED_FLAGS: u16 = HeaderFlags::DEST_NODE_ID_PRESENT
    .union(HeaderFlags::SOURCE_NODE_ID_PRESENT)
    .union(HeaderFlags::MSG_COUNTER_SYNC_REQ)
    .bits();

/// Pseudo-header layout variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoHeaderVariant {
    /// Node ids, masked header word, and message id
    Full,
    /// Node ids only; the V1 CTR+SHA1 wire format predates header binding
    Legacy,
}

impl PseudoHeaderVariant {
    /// Select the variant for a message's version and encryption type
    pub fn for_message(version: MessageVersion, encryption_type: EncryptionType) -> Self {
        if version == MessageVersion::V1 && encryption_type == EncryptionType::Aes128CtrSha1 {
            PseudoHeaderVariant::Legacy
        } else {
            PseudoHeaderVariant::Full
        }
    }
}

/// Build the pseudo-header for one message
pub fn build_pseudo_header(
    source_node_id: u64,
    dest_node_id: u64,
    header_word: u16,
    message_id: u32,
    variant: PseudoHeaderVariant,
) -> SmallVec<[u8; PSEUDO_HEADER_MAX]> {
    let mut buf = SmallVec::new();
    buf.extend_from_slice(&source_node_id.to_le_bytes());
    buf.extend_from_slice(&dest_node_id.to_le_bytes());

    if variant == PseudoHeaderVariant::Full {
        let masked = header_word & !PSEUDO_HEADER_EXCLUDED_FLAGS;
        buf.extend_from_slice(&masked.to_le_bytes());
        buf.extend_from_slice(&message_id.to_le_bytes());
    }

    buf
}
