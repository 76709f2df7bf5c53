//! Typed errors for the steganographic bit-stream codec.

/// Failures raised by the bit-stream reader and writer.
///
/// Both `ReaderExhausted` and `MalformedLength` signal the same thing to a
/// caller sweeping for hidden payloads: there is nothing valid under the
/// current mask schedule, move on. They are kept distinct because a length
/// field that overruns capacity is worth flagging separately when diagnosing
/// an encoder mismatch.
#[derive(Debug, thiserror::Error)]
pub enum StegoError {
    /// The cursor ran out of slots mid-read under the active mask schedule.
    #[error("bit stream exhausted after {bits_read} bits (plane {plane})")]
    ReaderExhausted { plane: u8, bits_read: u64 },

    /// The declared payload length cannot fit in the remaining capacity.
    /// Raised before any payload bit is consumed, so a hostile length field
    /// can never drive reads past the image.
    #[error(
        "declared payload of {declared} bytes exceeds remaining capacity of {capacity_bits} bits"
    )]
    MalformedLength { declared: u64, capacity_bits: u64 },

    /// The payload handed to the writer does not fit in the carrier image.
    #[error("payload of {payload_bytes} bytes does not fit: carrier holds {capacity_bits} bits")]
    PayloadTooLarge {
        payload_bytes: usize,
        capacity_bits: u64,
    },
}
