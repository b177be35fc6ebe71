//! Wire-level and protocol types shared between the transport engine and
//! the attestation encoder.

use bitflags::bitflags;
use core::convert::TryFrom;

/// A 32-bit CTAPHID logical channel identifier.
pub type Cid = u32;

/// The CTAPHID command set.
///
/// The low 7 bits of the command byte identify one of these; bit 7 is the
/// initialization/continuation discriminator and is stripped before
/// conversion.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Ping,
    Msg,
    Init,
    Cbor,
    Cancel,
    Error,
    Wink,
    Lock,
    KeepAlive,
    /// Any command byte this engine does not recognize.
    Unknown(u8),
}

impl Command {
    const PING: u8 = 0x01;
    const MSG: u8 = 0x03;
    const LOCK: u8 = 0x04;
    const INIT: u8 = 0x06;
    const WINK: u8 = 0x08;
    const CBOR: u8 = 0x10;
    const CANCEL: u8 = 0x11;
    const KEEPALIVE: u8 = 0x3B;
    const ERROR: u8 = 0x3F;

    /// The low-7-bit wire value for this command, for framing outbound replies.
    pub fn wire_value(self) -> u8 {
        match self {
            Command::Ping => Self::PING,
            Command::Msg => Self::MSG,
            Command::Lock => Self::LOCK,
            Command::Init => Self::INIT,
            Command::Wink => Self::WINK,
            Command::Cbor => Self::CBOR,
            Command::Cancel => Self::CANCEL,
            Command::KeepAlive => Self::KEEPALIVE,
            Command::Error => Self::ERROR,
            Command::Unknown(byte) => byte,
        }
    }
}

impl From<u8> for Command {
    /// Commands have no invalid representation: anything not in the known
    /// set becomes `Command::Unknown`, which dispatch maps to `invalid_cmd`.
    fn from(byte: u8) -> Self {
        match byte {
            Self::PING => Command::Ping,
            Self::MSG => Command::Msg,
            Self::LOCK => Command::Lock,
            Self::INIT => Command::Init,
            Self::WINK => Command::Wink,
            Self::CBOR => Command::Cbor,
            Self::CANCEL => Command::Cancel,
            Self::KEEPALIVE => Command::KeepAlive,
            Self::ERROR => Command::Error,
            other => Command::Unknown(other),
        }
    }
}

// kept for call sites that prefer the fallible spelling; never actually fails.
impl TryFrom<u8> for Command {
    type Error = core::convert::Infallible;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(Command::from(byte))
    }
}

bitflags! {
    /// AuthenticatorData flag bits, LSB to MSB: UP, RFU, UV, RFU, RFU, RFU, AT, ED.
    pub struct AuthDataFlags: u8 {
        const USER_PRESENT       = 0b0000_0001;
        const USER_VERIFIED      = 0b0000_0100;
        const ATTESTED_CREDENTIAL_DATA = 0b0100_0000;
        const EXTENSION_DATA     = 0b1000_0000;
    }
}

/// Capability flags advertised in the CTAPHID_INIT response.
///
/// Exposed as engine construction configuration (see [`crate::engine::HidTransactionEngine::new`])
/// rather than hard-coded, so embedders can describe what their transport
/// actually supports.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Capabilities {
    pub wink: bool,
    pub cbor: bool,
    /// "Does not implement MSG" — set when CTAP1/U2F MSG is unsupported.
    pub nmsg: bool,
}

impl Capabilities {
    /// Pack into the single capability-flags byte of the INIT response:
    /// `(nmsg << 3) | (cbor << 2) | (wink << 0)`.
    pub fn to_byte(self) -> u8 {
        (u8::from(self.nmsg) << 3) | (u8::from(self.cbor) << 2) | u8::from(self.wink)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            wink: false,
            cbor: true,
            nmsg: false,
        }
    }
}
