//! Message header processing for the Weave wire format.
//!
//! This module defines the 16-bit header word plus variable-length trailer
//! that prefixes every message: version and encryption type nibbles, the
//! flag bits, the message id, optional endpoint node ids, and the key id.

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Reserved wildcard node id; never a valid message source.
pub const ANY_NODE_ID: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Mask selecting the flag bits inside the header word (bits 0-3 and 8-11).
///
/// Bits 4-7 carry the encryption type and bits 12-15 the version, so the
/// flags occupy the two remaining nibbles.
pub const HEADER_FLAGS_MASK: u16 = 0x0F0F;

/// Size of the fixed header prefix (header word + message id).
pub const FIXED_HEADER_SIZE: usize = 6;

/// Message format versions
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageVersion {
    /// Legacy format; cannot represent tunneled data
    V1 = 1,
    /// Current format
    V2 = 2,
}

impl TryFrom<u8> for MessageVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageVersion::V1),
            2 => Ok(MessageVersion::V2),
            _ => Err(CodecError::UnsupportedMessageEncoding(
                "unknown message version",
            )),
        }
    }
}

/// Payload encryption suites
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionType {
    /// No encryption, no integrity protection
    None = 0,
    /// AES-128-CTR encryption with an HMAC-SHA1 integrity tag (legacy suite)
    Aes128CtrSha1 = 1,
    /// AES-128-EAX with a 128-bit authentication tag
    Aes128Eax128 = 2,
    /// AES-128-EAX with a 64-bit authentication tag
    Aes128Eax64 = 3,
}

impl TryFrom<u8> for EncryptionType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EncryptionType::None),
            1 => Ok(EncryptionType::Aes128CtrSha1),
            2 => Ok(EncryptionType::Aes128Eax128),
            3 => Ok(EncryptionType::Aes128Eax64),
            _ => Err(CodecError::UnsupportedMessageEncoding(
                "unknown encryption type",
            )),
        }
    }
}

bitflags! {
    /// Header flag bits
    ///
    /// Bits inside [`HEADER_FLAGS_MASK`] that are not defined here are
    /// tolerated and passed through unchanged for compatibility with
    /// deployed peers; they are retained by `from_bits_retain` on decode
    /// and re-emitted verbatim on encode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HeaderFlags: u16 {
        /// Destination node id follows the message id on the wire
        const DEST_NODE_ID_PRESENT = 0x0100;
        /// Source node id follows the message id on the wire
        const SOURCE_NODE_ID_PRESENT = 0x0200;
        /// Payload carries tunneled data
        const TUNNELED_DATA = 0x0400;
        /// Sender requests message counter synchronization
        const MSG_COUNTER_SYNC_REQ = 0x0800;
    }
}

/// Logical header of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Message format version
    pub version: MessageVersion,
    /// Payload encryption suite
    pub encryption_type: EncryptionType,
    /// Flag bits; presence flags must agree with the node id fields
    pub flags: HeaderFlags,
    /// Source node id, on the wire iff `SOURCE_NODE_ID_PRESENT`
    pub source_node_id: Option<u64>,
    /// Destination node id, on the wire iff `DEST_NODE_ID_PRESENT`
    pub dest_node_id: Option<u64>,
    /// Caller-supplied message id; uniqueness is owned by the session layer
    pub message_id: u32,
    /// Key id, on the wire iff the message is encrypted
    pub key_id: u16,
}

impl MessageHeader {
    /// Create a new header with no node ids and no flags set
    pub fn new(version: MessageVersion, encryption_type: EncryptionType, message_id: u32) -> Self {
        Self {
            version,
            encryption_type,
            flags: HeaderFlags::empty(),
            source_node_id: None,
            dest_node_id: None,
            message_id,
            key_id: 0,
        }
    }

    /// Set the source node id and its presence flag together
    pub fn set_source_node_id(&mut self, id: u64) {
        self.source_node_id = Some(id);
        self.flags |= HeaderFlags::SOURCE_NODE_ID_PRESENT;
    }

    /// Set the destination node id and its presence flag together
    pub fn set_dest_node_id(&mut self, id: u64) {
        self.dest_node_id = Some(id);
        self.flags |= HeaderFlags::DEST_NODE_ID_PRESENT;
    }

    /// Pack version, encryption type, and flags into the 16-bit header word
    pub fn header_word(&self) -> u16 {
        (self.flags.bits() & HEADER_FLAGS_MASK)
            | ((self.encryption_type as u16) << 4)
            | ((self.version as u16) << 12)
    }

    /// Size of the unencrypted header region when encoded
    pub fn encoded_size(&self) -> usize {
        let mut size = FIXED_HEADER_SIZE;
        if self.source_node_id.is_some() {
            size += 8;
        }
        if self.dest_node_id.is_some() {
            size += 8;
        }
        if self.encryption_type != EncryptionType::None {
            size += 2;
        }
        size
    }

    /// Encode the header to bytes (little-endian)
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.header_word());
        buf.put_u32_le(self.message_id);
        if let Some(id) = self.source_node_id {
            buf.put_u64_le(id);
        }
        if let Some(id) = self.dest_node_id {
            buf.put_u64_le(id);
        }
        if self.encryption_type != EncryptionType::None {
            buf.put_u16_le(self.key_id);
        }
    }

    /// Decode a header from the front of `buf` (little-endian)
    ///
    /// Consumes exactly the unencrypted header region; the remainder of
    /// `buf` is the encrypted region. Fails with
    /// [`CodecError::MalformedMessage`] when the buffer is shorter than the
    /// fields the flags imply.
    pub fn decode(buf: &mut Bytes) -> Result<Self, CodecError> {
        if buf.len() < FIXED_HEADER_SIZE {
            return Err(CodecError::MalformedMessage(
                "buffer shorter than fixed header",
            ));
        }

        let word = buf.get_u16_le();
        let version = MessageVersion::try_from(((word >> 12) & 0x0F) as u8)?;
        let encryption_type = EncryptionType::try_from(((word >> 4) & 0x0F) as u8)?;
        let flags = HeaderFlags::from_bits_retain(word & HEADER_FLAGS_MASK);
        let message_id = buf.get_u32_le();

        let source_node_id = if flags.contains(HeaderFlags::SOURCE_NODE_ID_PRESENT) {
            if buf.len() < 8 {
                return Err(CodecError::MalformedMessage("truncated source node id"));
            }
            Some(buf.get_u64_le())
        } else {
            None
        };

        let dest_node_id = if flags.contains(HeaderFlags::DEST_NODE_ID_PRESENT) {
            if buf.len() < 8 {
                return Err(CodecError::MalformedMessage("truncated destination node id"));
            }
            Some(buf.get_u64_le())
        } else {
            None
        };

        let key_id = if encryption_type != EncryptionType::None {
            if buf.len() < 2 {
                return Err(CodecError::MalformedMessage("truncated key id"));
            }
            buf.get_u16_le()
        } else {
            0
        };

        Ok(Self {
            version,
            encryption_type,
            flags,
            source_node_id,
            dest_node_id,
            message_id,
            key_id,
        })
    }

    /// Validate header invariants prior to encoding
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.flags.contains(HeaderFlags::SOURCE_NODE_ID_PRESENT) != self.source_node_id.is_some()
        {
            return Err(CodecError::UnsupportedMessageEncoding(
                "source node id presence flag disagrees with field",
            ));
        }

        if self.flags.contains(HeaderFlags::DEST_NODE_ID_PRESENT) != self.dest_node_id.is_some() {
            return Err(CodecError::UnsupportedMessageEncoding(
                "destination node id presence flag disagrees with field",
            ));
        }

        if self.source_node_id == Some(ANY_NODE_ID) {
            return Err(CodecError::UnsupportedMessageEncoding(
                "source node id is the wildcard node id",
            ));
        }

        if self.source_node_id.is_some() && self.source_node_id == self.dest_node_id {
            return Err(CodecError::UnsupportedMessageEncoding(
                "source and destination node ids are equal",
            ));
        }

        if self
            .flags
            .contains(HeaderFlags::TUNNELED_DATA | HeaderFlags::MSG_COUNTER_SYNC_REQ)
        {
            return Err(CodecError::UnsupportedMessageEncoding(
                "tunneled data and counter sync request are mutually exclusive",
            ));
        }

        // The V1 format cannot represent tunneled data.
        if self.version == MessageVersion::V1 && self.flags.contains(HeaderFlags::TUNNELED_DATA) {
            return Err(CodecError::UnsupportedMessageEncoding(
                "tunneled data cannot be encoded in a V1 message",
            ));
        }

        // Nonce and pseudo-header reconstruction on decode needs both ids
        // on the wire.
        if self.encryption_type != EncryptionType::None
            && (self.source_node_id.is_none() || self.dest_node_id.is_none())
        {
            return Err(CodecError::UnsupportedMessageEncoding(
                "encrypted messages must carry source and destination node ids",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> MessageHeader {
        let mut header = MessageHeader::new(MessageVersion::V2, EncryptionType::None, 0x11223344);
        header.set_source_node_id(0x18B4_3000_0000_0001);
        header.set_dest_node_id(0x18B4_3000_0000_0002);
        header
    }

    #[test]
    fn test_version_conversion() {
        assert_eq!(MessageVersion::try_from(1).unwrap(), MessageVersion::V1);
        assert_eq!(MessageVersion::try_from(2).unwrap(), MessageVersion::V2);
        assert!(MessageVersion::try_from(0).is_err());
        assert!(MessageVersion::try_from(15).is_err());
    }

    #[test]
    fn test_encryption_type_conversion() {
        assert_eq!(EncryptionType::try_from(0).unwrap(), EncryptionType::None);
        assert_eq!(
            EncryptionType::try_from(3).unwrap(),
            EncryptionType::Aes128Eax64
        );
        assert!(EncryptionType::try_from(4).is_err());
    }

    #[test]
    fn test_header_word_layout() {
        let mut header = sample_header();
        header.encryption_type = EncryptionType::Aes128Eax128;
        header.flags |= HeaderFlags::MSG_COUNTER_SYNC_REQ;

        let word = header.header_word();
        assert_eq!(word >> 12, 2, "version nibble");
        assert_eq!((word >> 4) & 0x0F, 2, "encryption type nibble");
        assert_eq!(
            word & HEADER_FLAGS_MASK,
            (HeaderFlags::SOURCE_NODE_ID_PRESENT
                | HeaderFlags::DEST_NODE_ID_PRESENT
                | HeaderFlags::MSG_COUNTER_SYNC_REQ)
                .bits()
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let header = sample_header();

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), header.encoded_size());
        assert_eq!(buf.len(), 22);

        let mut bytes = buf.freeze();
        let decoded = MessageHeader::decode(&mut bytes).unwrap();
        assert_eq!(header, decoded);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_encode_decode_with_key_id() {
        let mut header = sample_header();
        header.encryption_type = EncryptionType::Aes128Eax64;
        header.key_id = 0x2001;

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), 24);

        let decoded = MessageHeader::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.key_id, 0x2001);
        assert_eq!(header, decoded);
    }

    #[test]
    fn test_minimal_header() {
        let header = MessageHeader::new(MessageVersion::V1, EncryptionType::None, 7);

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), FIXED_HEADER_SIZE);

        let decoded = MessageHeader::decode(&mut buf.freeze()).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn test_decode_truncated() {
        let header = sample_header();
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        let encoded = buf.freeze();

        for len in 0..encoded.len() {
            let mut short = encoded.slice(..len);
            assert!(
                matches!(
                    MessageHeader::decode(&mut short),
                    Err(CodecError::MalformedMessage(_))
                ),
                "decode should fail at length {len}"
            );
        }
    }

    #[test]
    fn test_unknown_flag_bits_pass_through() {
        let mut header = sample_header();
        header.flags |= HeaderFlags::from_bits_retain(0x0005);

        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        let decoded = MessageHeader::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.flags.bits() & 0x000F, 0x0005);
        assert_eq!(header, decoded);
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample_header().validate().is_ok());
    }

    #[test]
    fn test_validate_wildcard_source() {
        let mut header = sample_header();
        header.source_node_id = Some(ANY_NODE_ID);
        assert!(matches!(
            header.validate(),
            Err(CodecError::UnsupportedMessageEncoding(_))
        ));
    }

    #[test]
    fn test_validate_source_equals_dest() {
        let mut header = sample_header();
        header.dest_node_id = header.source_node_id;
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_validate_v1_tunneled_data() {
        let mut header = sample_header();
        header.version = MessageVersion::V1;
        header.flags |= HeaderFlags::TUNNELED_DATA;
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_validate_exclusive_flags() {
        let mut header = sample_header();
        header.flags |= HeaderFlags::TUNNELED_DATA | HeaderFlags::MSG_COUNTER_SYNC_REQ;
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_validate_presence_flag_mismatch() {
        let mut header = sample_header();
        header.source_node_id = None;
        assert!(header.validate().is_err());

        let mut header = sample_header();
        header.flags.remove(HeaderFlags::DEST_NODE_ID_PRESENT);
        assert!(header.validate().is_err());
    }

    #[test]
    fn test_validate_encrypted_requires_node_ids() {
        let mut header = MessageHeader::new(MessageVersion::V2, EncryptionType::Aes128Eax128, 1);
        assert!(header.validate().is_err());

        header.set_source_node_id(1);
        header.set_dest_node_id(2);
        assert!(header.validate().is_ok());
    }
}
