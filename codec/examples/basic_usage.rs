//! Basic usage example for the Weave message codec.

use weave_codec::{
    decode_message, encode_message, EaxKey, EncryptionKey, EncryptionType, MessageHeader,
    MessageVersion,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Weave Message Codec Example ===\n");

    // 1. Encode an unencrypted message
    println!("1. Encoding an unencrypted message...");
    let mut header = MessageHeader::new(MessageVersion::V2, EncryptionType::None, 1);
    header.set_source_node_id(0x18B4300000000001);
    header.set_dest_node_id(0x18B4300000000002);

    let wire = encode_message(&header, None, b"Hello, Weave!")?;
    println!("   Encoded message size: {} bytes", wire.len());

    let decoded = decode_message(&wire, None)?;
    println!(
        "   Decoded from 0x{:016X}: {:?}",
        decoded.header.source_node_id.unwrap_or(0),
        String::from_utf8_lossy(&decoded.payload)
    );

    // 2. Encode with AES-128-EAX (128-bit tag)
    println!("\n2. Encoding with AES-128-EAX-128...");
    let mut header = MessageHeader::new(MessageVersion::V2, EncryptionType::Aes128Eax128, 2);
    header.set_source_node_id(0x18B4300000000001);
    header.set_dest_node_id(0x18B4300000000002);
    header.key_id = 0x2001;

    let key = EncryptionKey::Eax(EaxKey::from_bytes([0x42; 16]));
    let wire = encode_message(&header, Some(&key), b"sealed payload")?;
    println!("   Encoded message size: {} bytes", wire.len());

    let decoded = decode_message(&wire, Some(&key))?;
    println!(
        "   Verified payload: {:?}",
        String::from_utf8_lossy(&decoded.payload)
    );

    // 3. Tampering is detected
    println!("\n3. Tampering with the ciphertext...");
    let mut tampered = wire.to_vec();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    match decode_message(&tampered, Some(&key)) {
        Err(err) => println!("   Rejected as expected: {err}"),
        Ok(_) => println!("   Unexpectedly accepted!"),
    }

    Ok(())
}
