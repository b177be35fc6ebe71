//! Sizing constants for the CTAPHID wire format.
//!
//! See "proposed standard":
//! <https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html#usb>

/// Size of a single HID report/frame, as used by the reference transport.
pub const PACKET_SIZE: usize = 64;

/// Maximum reassembled message size: one initialization frame (7-byte header)
/// plus 128 continuation frames (5-byte header each).
///
/// 64 - 7 + 128 * (64 - 5) = 7609 bytes.
pub const MESSAGE_SIZE: usize = PACKET_SIZE - 7 + 128 * (PACKET_SIZE - 5);

/// Maximum number of simultaneously allocated logical channels.
pub const CHANNEL_TABLE_SIZE: usize = 20;

/// Transaction reassembly timeout, in milliseconds, measured from the
/// initialization frame.
pub const TRANSACTION_TIMEOUT_MS: u64 = 250;

/// The reserved broadcast channel, used for CTAPHID_INIT before a channel
/// has been allocated.
pub const BROADCAST_CID: u32 = 0xFFFF_FFFF;

/// Reserved, invalid channel id.
pub const RESERVED_CID: u32 = 0x0000_0000;

/// Length of the nonce carried in a CTAPHID_INIT request/response.
pub const INIT_NONCE_LENGTH: usize = 8;

/// Length of the serialized CTAPHID_INIT response body.
pub const INIT_RESPONSE_LENGTH: usize = 17;
