//! Deterministic nonce and counter derivation.
//!
//! Both cipher suites derive their per-message nonce material from the
//! message identity `(source_node_id, message_id)`. The byte order here is
//! big-endian, opposite of the little-endian header fields.

/// AES-CTR initial counter size in bytes.
pub const CTR_COUNTER_SIZE: usize = 16;

/// EAX nonce size in bytes.
pub const EAX_NONCE_SIZE: usize = 12;

/// Derive the initial AES-CTR counter block for the CTR+SHA1 suite
pub fn ctr_initial_counter(source_node_id: u64, message_id: u32) -> [u8; CTR_COUNTER_SIZE] {
    let mut counter = [0u8; CTR_COUNTER_SIZE];
    counter[0..8].copy_from_slice(&source_node_id.to_be_bytes());
    counter[8..12].copy_from_slice(&message_id.to_be_bytes());
    // counter[12..16] is the BE32(0) block counter
    counter
}

/// Derive the EAX nonce for the EAX suites
pub fn eax_nonce(source_node_id: u64, message_id: u32) -> [u8; EAX_NONCE_SIZE] {
    let mut nonce = [0u8; EAX_NONCE_SIZE];
    nonce[0..8].copy_from_slice(&source_node_id.to_be_bytes());
    nonce[8..12].copy_from_slice(&message_id.to_be_bytes());
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctr_counter_layout() {
        let counter = ctr_initial_counter(0x18B4300000000001, 0x01020304);
        assert_eq!(
            counter,
            [
                0x18, 0xB4, 0x30, 0x00, 0x00, 0x00, 0x00, 0x01, // BE source
                0x01, 0x02, 0x03, 0x04, // BE message id
                0x00, 0x00, 0x00, 0x00, // block counter
            ]
        );
    }

    #[test]
    fn test_eax_nonce_layout() {
        let nonce = eax_nonce(0x18B4300000000001, 0x01020304);
        assert_eq!(nonce[0..8], 0x18B4300000000001u64.to_be_bytes());
        assert_eq!(nonce[8..12], 0x01020304u32.to_be_bytes());
    }

    #[test]
    fn test_nonce_is_counter_prefix() {
        let counter = ctr_initial_counter(7, 9);
        let nonce = eax_nonce(7, 9);
        assert_eq!(&counter[..EAX_NONCE_SIZE], &nonce[..]);
    }
}
