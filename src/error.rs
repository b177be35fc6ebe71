//! Error taxonomy for the transport engine and the binary encoder.
//!
//! Both enums are plain, `Copy`-able values with a hand-written `Display`
//! impl: no heap-allocating error crate, so they compose cleanly at
//! `no_std` call sites.

use core::fmt::{self, Display, Formatter};

/// Framing, channel, and dispatch errors produced by [`crate::engine::HidTransactionEngine`].
///
/// Each variant maps to a single wire byte via [`HidError::wire_byte`]; the
/// mapping is one-directional (there is no corresponding `TryFrom<u8>`,
/// since an incoming frame never *carries* one of these as input).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HidError {
    InvalidCommand,
    InvalidParameter,
    InvalidLength,
    InvalidSequence,
    MessageTimeout,
    ChannelBusy,
    LockRequired,
    InvalidChannel,
    Other,
}

impl HidError {
    /// The CTAPHID error-response payload byte for this error kind.
    pub fn wire_byte(self) -> u8 {
        match self {
            HidError::InvalidCommand => 0x01,
            HidError::InvalidParameter => 0x02,
            HidError::InvalidLength => 0x03,
            HidError::InvalidSequence => 0x04,
            HidError::MessageTimeout => 0x05,
            HidError::ChannelBusy => 0x06,
            HidError::LockRequired => 0x0A,
            HidError::InvalidChannel => 0x0B,
            HidError::Other => 0x7F,
        }
    }
}

impl Display for HidError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            HidError::InvalidCommand => "invalid command",
            HidError::InvalidParameter => "invalid parameter",
            HidError::InvalidLength => "invalid length",
            HidError::InvalidSequence => "invalid sequence",
            HidError::MessageTimeout => "message timeout",
            HidError::ChannelBusy => "channel busy",
            HidError::LockRequired => "lock required",
            HidError::InvalidChannel => "invalid channel",
            HidError::Other => "other error",
        };
        f.write_str(text)
    }
}

/// Errors returned by the pure [`crate::attestation`] encoding functions.
///
/// These never reach the CTAPHID wire directly; they are surfaced to
/// whichever caller assembles an attestation object (one level up from
/// this crate).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
    /// A declared length field did not match the actual byte length, or a
    /// value exceeded its wire-format width or buffer capacity.
    InvalidLength,
    /// A flag implied the presence of a substructure (attested credential
    /// data, extensions) that was not supplied, or vice versa.
    InvalidState,
    /// The destination buffer was too small to hold the encoded output.
    BufferTooSmall,
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            EncodeError::InvalidLength => "invalid length",
            EncodeError::InvalidState => "invalid state",
            EncodeError::BufferTooSmall => "buffer too small",
        };
        f.write_str(text)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HidError {}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}
