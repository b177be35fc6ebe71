//! The external "authenticator core" collaborator.
//!
//! The `HidTransactionEngine` layer handles all low-level CTAPHID protocol
//! detail, leaving it to a separate CTAP2 command handler to interpret
//! CBOR request bodies and produce CBOR response bodies. That handler
//! implements [`Authenticator`] here; this crate never looks inside the
//! bytes it exchanges with it.

/// An authenticator core reachable by CBOR request/response byte buffers.
///
/// `handle` is called synchronously from inside [`crate::engine::HidTransactionEngine::handle`]
/// dispatch; an embedder whose authenticator core does expensive work
/// (signing, persistent storage) is expected to schedule frame delivery
/// accordingly, since there is no internal suspension point here.
pub trait Authenticator {
    /// Interpret `request` (the reassembled CTAPHID_CBOR payload) and
    /// produce a response payload, or a single CTAP2 status byte on
    /// failure. Neither is inspected or validated by the engine.
    fn handle(&mut self, request: &[u8]) -> Result<Response, u8>;
}

/// An authenticator core's reply, owned and bounded to the largest message
/// this engine can ever reassemble or fragment.
pub type Response = heapless::Vec<u8, { crate::constants::MESSAGE_SIZE }>;
