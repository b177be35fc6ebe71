#![cfg_attr(not(test), no_std)]

/*!
ctaphid-engine

A CTAPHID packet-framing transaction engine and a WebAuthn Attestation
Object binary encoder, for FIDO2 authenticator implementations.

See "proposed standard":
<https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html#usb>

The crate owns two things, deliberately kept independent of each other:

- [`engine::HidTransactionEngine`]: reassembles multi-packet CTAPHID
  transactions, allocates logical channels, and fragments replies back into
  frames. It is configured with injected [`clock::Clock`], [`rng::Rng`], and
  [`authenticator::Authenticator`] collaborators rather than owning them
  concretely, so it stays testable and transport-agnostic.
- [`attestation`]: pure binary encoding of Attested Credential Data,
  Authenticator Data, and the Attestation Object CBOR envelope. No state, no
  dependency on the engine.

Everything above USB HID framing and below CTAP2 command semantics — the
raw-frame transport and the command handler that actually interprets
`authenticatorMakeCredential`/`authenticatorGetAssertion` bodies — is out of
scope and expected to be supplied by the embedder.
*/

#[cfg(feature = "std")]
extern crate std;

delog::generate_macros!();

pub mod attestation;
pub mod authenticator;
pub mod channel;
pub mod clock;
pub mod constants;
pub mod engine;
pub mod error;
pub mod frame;
pub mod rng;
pub mod types;

pub use authenticator::{Authenticator, Response};
pub use clock::Clock;
pub use engine::HidTransactionEngine;
pub use error::{EncodeError, HidError};
pub use frame::OutboundFrame;
pub use rng::Rng;
pub use types::{Capabilities, Cid, Command};
