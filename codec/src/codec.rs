//! Message codec facade.
//!
//! Single entry point pairing [`encode_message`] and [`decode_message`].
//! Encode validates header invariants and the key/encryption-type pairing
//! before any bytes are emitted; decode parses the header first and
//! dispatches on the wire-declared encryption type only, never on caller
//! intent.

use bytes::{Bytes, BytesMut};

use crate::cipher::{
    CipherSuite, CtrSha1Suite, EaxSuite, PlainSuite, TransformContext, EAX_TAG_SIZE_128,
    EAX_TAG_SIZE_64,
};
use crate::error::CodecError;
use crate::header::{EncryptionType, MessageHeader};
use crate::key::EncryptionKey;
use crate::pseudo_header::{build_pseudo_header, PseudoHeaderVariant, PSEUDO_HEADER_MAX};

/// Maximum encoded message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// A decoded message, produced only after verification succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// The parsed header
    pub header: MessageHeader,
    /// The verified payload
    pub payload: Bytes,
}

/// Select the transform for an encryption type, checking the key variant
fn suite_for<'k>(
    encryption_type: EncryptionType,
    key: Option<&'k EncryptionKey>,
) -> Result<Box<dyn CipherSuite + 'k>, CodecError> {
    match (encryption_type, key) {
        (EncryptionType::None, None) => Ok(Box::new(PlainSuite)),
        (EncryptionType::None, Some(_)) => Err(CodecError::UnsupportedMessageEncoding(
            "key supplied for an unencrypted message",
        )),
        (_, None) => Err(CodecError::UnsupportedMessageEncoding(
            "missing key for an encrypted message",
        )),
        (EncryptionType::Aes128CtrSha1, Some(EncryptionKey::CtrSha1(key))) => {
            Ok(Box::new(CtrSha1Suite { key }))
        }
        (EncryptionType::Aes128Eax64, Some(EncryptionKey::Eax(key))) => Ok(Box::new(EaxSuite {
            key,
            tag_size: EAX_TAG_SIZE_64,
        })),
        (EncryptionType::Aes128Eax128, Some(EncryptionKey::Eax(key))) => Ok(Box::new(EaxSuite {
            key,
            tag_size: EAX_TAG_SIZE_128,
        })),
        _ => Err(CodecError::UnsupportedMessageEncoding(
            "key variant does not match encryption type",
        )),
    }
}

/// Pseudo-header plus the source node id for nonce derivation
fn pseudo_header_for(
    header: &MessageHeader,
) -> Result<(smallvec::SmallVec<[u8; PSEUDO_HEADER_MAX]>, u64), CodecError> {
    let source = header
        .source_node_id
        .ok_or(CodecError::UnsupportedMessageEncoding(
            "encrypted message without source node id",
        ))?;
    let dest = header
        .dest_node_id
        .ok_or(CodecError::UnsupportedMessageEncoding(
            "encrypted message without destination node id",
        ))?;

    let variant = PseudoHeaderVariant::for_message(header.version, header.encryption_type);
    let pseudo = build_pseudo_header(
        source,
        dest,
        header.header_word(),
        header.message_id,
        variant,
    );
    Ok((pseudo, source))
}

/// Run a transform with the message's derived context
///
/// Unencrypted messages get an empty pseudo-header; encrypted ones derive
/// it (and the nonce source) from the header fields.
fn with_transform_context<T>(
    header: &MessageHeader,
    f: impl FnOnce(&TransformContext<'_>) -> Result<T, CodecError>,
) -> Result<T, CodecError> {
    if header.encryption_type == EncryptionType::None {
        return f(&TransformContext {
            pseudo_header: &[],
            source_node_id: 0,
            message_id: header.message_id,
        });
    }

    let (pseudo, source) = pseudo_header_for(header)?;
    f(&TransformContext {
        pseudo_header: &pseudo,
        source_node_id: source,
        message_id: header.message_id,
    })
}

/// Encode a message into its wire form
///
/// Validation order: header invariants, key/encryption-type pairing, then
/// the header codec, pseudo-header builder, and selected transform. Any
/// precondition failure returns
/// [`CodecError::UnsupportedMessageEncoding`] without emitting partial
/// output.
pub fn encode_message(
    header: &MessageHeader,
    key: Option<&EncryptionKey>,
    payload: &[u8],
) -> Result<Bytes, CodecError> {
    header.validate()?;
    let suite = suite_for(header.encryption_type, key)?;

    let total = header.encoded_size() + payload.len() + suite.overhead();
    if total > MAX_MESSAGE_SIZE {
        return Err(CodecError::UnsupportedMessageEncoding(
            "message exceeds maximum size",
        ));
    }

    let region = with_transform_context(header, |ctx| suite.seal(ctx, payload))?;

    let mut buf = BytesMut::with_capacity(total);
    header.encode(&mut buf);
    buf.extend_from_slice(&region);
    Ok(buf.freeze())
}

/// Decode and verify a wire message
///
/// The transform is selected from the wire-declared encryption type. On
/// any failure no plaintext is returned; verification completes before the
/// payload is exposed.
pub fn decode_message(
    buf: &[u8],
    key: Option<&EncryptionKey>,
) -> Result<DecodedMessage, CodecError> {
    if buf.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MalformedMessage("message exceeds maximum size"));
    }

    let mut bytes = Bytes::copy_from_slice(buf);
    let header = MessageHeader::decode(&mut bytes)?;
    tracing::trace!(
        encryption_type = ?header.encryption_type,
        message_id = header.message_id,
        region_len = bytes.len(),
        "decoding message"
    );

    let suite = suite_for(header.encryption_type, key)?;
    let payload = with_transform_context(&header, |ctx| suite.open(ctx, &bytes)).map_err(|err| {
        tracing::debug!(%err, encryption_type = ?header.encryption_type, "message verification failed");
        err
    })?;

    Ok(DecodedMessage {
        header,
        payload: Bytes::from(payload),
    })
}
