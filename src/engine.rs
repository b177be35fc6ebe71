//! The CTAPHID transaction reassembly and dispatch state machine.
//!
//! A single-transaction-at-a-time engine: one shared reassembly buffer, one
//! `busy` channel at a time. Concurrent transactions are rejected with
//! `channel_busy` rather than multiplexed — this matches the HID device
//! model and keeps error handling simple (see design notes in the crate's
//! top-level documentation).

use heapless::Vec;

use crate::authenticator::Authenticator;
use crate::channel::ChannelTable;
use crate::clock::Clock;
use crate::constants::{
    BROADCAST_CID, INIT_RESPONSE_LENGTH, MESSAGE_SIZE, RESERVED_CID, TRANSACTION_TIMEOUT_MS,
};
use crate::error::HidError;
use crate::frame::{self, FrameIterator};
use crate::rng::Rng;
use crate::types::{Capabilities, Cid, Command};

use crate::{debug_now, info_now, warn_now};

/// Reply payload buffer, bounded to the largest message this engine ever
/// reassembles or fragments.
pub type ResponsePayload = Vec<u8, MESSAGE_SIZE>;

/// A lazily-produced sequence of outbound HID frames.
pub type Reply = FrameIterator<MESSAGE_SIZE>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Idle,
    Collecting {
        cid: Cid,
        cmd: Command,
        bcnt_total: u16,
        bcnt: u16,
        seq: Option<u8>,
        begin_ms: u64,
    },
}

/// The CTAPHID packet-framing engine.
///
/// Constructed with its collaborators injected: a [`Clock`] for the
/// transaction timeout, an [`Rng`] for channel allocation, and an
/// [`Authenticator`] to which CBOR command bodies are forwarded.
pub struct HidTransactionEngine<C, R, A> {
    clock: C,
    rng: R,
    authenticator: A,
    capabilities: Capabilities,
    channels: ChannelTable,
    state: State,
    buffer: ResponsePayload,
}

impl<C, R, A> HidTransactionEngine<C, R, A>
where
    C: Clock,
    R: Rng,
    A: Authenticator,
{
    pub fn new(clock: C, rng: R, authenticator: A, capabilities: Capabilities) -> Self {
        Self {
            clock,
            rng,
            authenticator,
            capabilities,
            channels: ChannelTable::new(),
            state: State::Idle,
            buffer: ResponsePayload::new(),
        }
    }

    /// Release the channel table and any in-flight transaction state.
    pub fn teardown(&mut self) {
        self.channels.clear();
        self.reset();
    }

    /// Process one raw inbound frame.
    ///
    /// Returns `Some(reply)` with a frame iterator ready to be drained by
    /// the transport when a response is ready (including error replies);
    /// returns `None` while more continuation frames are still expected,
    /// or after a `cancel`.
    pub fn handle(&mut self, frame: &[u8]) -> Option<Reply> {
        if let State::Collecting { begin_ms, .. } = self.state {
            if self.clock.now_ms().saturating_sub(begin_ms) > TRANSACTION_TIMEOUT_MS {
                debug_now!("transaction timed out, resetting to idle");
                self.reset();
            }
        }

        match self.state {
            State::Idle => self.handle_idle(frame),
            State::Collecting { .. } => self.handle_collecting(frame),
        }
    }

    fn handle_idle(&mut self, frame: &[u8]) -> Option<Reply> {
        if frame.len() < 7 {
            let cid = frame::readable_cid(frame).unwrap_or(BROADCAST_CID);
            warn_now!("short initialization frame ({} bytes)", frame.len());
            return Some(self.error_reply(cid, HidError::Other));
        }

        if !frame::is_initialization(frame) {
            let cid = frame::readable_cid(frame).unwrap_or(BROADCAST_CID);
            warn_now!("continuation frame received while idle");
            return Some(self.error_reply(cid, HidError::InvalidCommand));
        }

        let header = frame::parse_init_header(frame);
        if header.cid != BROADCAST_CID && !self.channels.contains(header.cid) {
            warn_now!("initialization frame on unknown channel");
            return Some(self.error_reply(header.cid, HidError::InvalidChannel));
        }

        if header.bcnt_total as usize > MESSAGE_SIZE {
            warn_now!("declared bcnt_total {} exceeds MESSAGE_SIZE", header.bcnt_total);
            return Some(self.error_reply(header.cid, HidError::InvalidLength));
        }

        let take = core::cmp::min(header.bcnt_total as usize, frame.len() - 7);
        self.buffer.clear();
        // bcnt_total was just bounded to MESSAGE_SIZE above, so this cannot overflow it.
        let _ = self.buffer.extend_from_slice(&frame[7..7 + take]);

        info_now!(
            "accepted init frame: cid={:x} cmd={:x} bcnt_total={}",
            header.cid,
            header.cmd_byte,
            header.bcnt_total
        );

        self.state = State::Collecting {
            cid: header.cid,
            cmd: Command::from(header.cmd_byte),
            bcnt_total: header.bcnt_total,
            bcnt: take as u16,
            seq: None,
            begin_ms: self.clock.now_ms(),
        };

        if take as u16 >= header.bcnt_total {
            self.dispatch()
        } else {
            None
        }
    }

    fn handle_collecting(&mut self, frame: &[u8]) -> Option<Reply> {
        let (cid, bcnt_total, mut bcnt, seq) = match self.state {
            State::Collecting {
                cid,
                bcnt_total,
                bcnt,
                seq,
                ..
            } => (cid, bcnt_total, bcnt, seq),
            State::Idle => unreachable!("handle_collecting called outside Collecting state"),
        };

        if frame.len() < 5 {
            let interloper = frame::readable_cid(frame).unwrap_or(BROADCAST_CID);
            warn_now!("short continuation frame ({} bytes)", frame.len());
            self.reset();
            return Some(self.error_reply(interloper, HidError::Other));
        }

        let incoming_cid = frame::readable_cid(frame).unwrap();
        if incoming_cid != cid {
            warn_now!("interloping channel {:x} while {:x} is busy", incoming_cid, cid);
            return Some(self.error_reply(incoming_cid, HidError::ChannelBusy));
        }

        if frame::is_initialization(frame) {
            warn_now!("initialization frame received while collecting continuation");
            self.reset();
            return Some(self.error_reply(cid, HidError::InvalidCommand));
        }

        let continuation = frame::parse_continuation_header(frame);
        let expected_seq = seq.map_or(0, |s| s + 1);
        if continuation.seq != expected_seq {
            warn_now!(
                "sequence mismatch: expected {} got {}",
                expected_seq,
                continuation.seq
            );
            self.reset();
            return Some(self.error_reply(cid, HidError::InvalidSequence));
        }

        let remaining = (bcnt_total - bcnt) as usize;
        let take = core::cmp::min(remaining, frame.len() - 5);
        let _ = self.buffer.extend_from_slice(&frame[5..5 + take]);
        bcnt += take as u16;

        if let State::Collecting {
            bcnt: stored_bcnt,
            seq: stored_seq,
            ..
        } = &mut self.state
        {
            *stored_bcnt = bcnt;
            *stored_seq = Some(continuation.seq);
        }

        if bcnt >= bcnt_total {
            self.dispatch()
        } else {
            None
        }
    }

    /// Completion-time dispatch. Always resets back to `Idle` afterwards,
    /// regardless of outcome (§4.2, step 4).
    fn dispatch(&mut self) -> Option<Reply> {
        let (cid, cmd, bcnt) = match self.state {
            State::Collecting { cid, cmd, bcnt, .. } => (cid, cmd, bcnt),
            State::Idle => unreachable!("dispatch called outside Collecting state"),
        };

        // channel-validity recheck (§4.2 Dispatch): broadcast is acceptable
        // only for `init`.
        if cmd != Command::Init && cid == BROADCAST_CID {
            warn_now!("non-init command dispatched on broadcast channel");
            let reply = self.error_reply(cid, HidError::InvalidChannel);
            self.reset();
            return Some(reply);
        }

        info_now!("dispatching {:?} on channel {:x}", cmd, cid);

        let reply = match cmd {
            Command::Init => self.dispatch_init(cid),
            Command::Ping => self.dispatch_ping(cid, bcnt),
            Command::Msg => self.dispatch_msg(cid),
            Command::Cbor => self.dispatch_cbor(cid, bcnt),
            Command::Cancel => None,
            _ => Some(self.error_reply(cid, HidError::InvalidCommand)),
        };

        self.reset();
        reply
    }

    fn dispatch_init(&mut self, cid: Cid) -> Option<Reply> {
        let mut payload = ResponsePayload::new();

        if cid == BROADCAST_CID {
            let new_cid = self.allocate_channel();
            let nonce_len = core::cmp::min(self.buffer.len(), crate::constants::INIT_NONCE_LENGTH);
            let _ = payload.extend_from_slice(&self.buffer[..nonce_len]);
            // pad a short nonce with zero bytes rather than shrink the reply.
            for _ in nonce_len..crate::constants::INIT_NONCE_LENGTH {
                let _ = payload.push(0);
            }
            let _ = payload.extend_from_slice(&new_cid.to_be_bytes());
            let _ = payload.push(0x02); // CTAPHID protocol version
            let _ = payload.push(0xCA); // major device version
            let _ = payload.push(0xFE); // minor device version
            let _ = payload.push(0x01); // build device version
            let _ = payload.push(self.capabilities.to_byte());
            debug_assert_eq!(payload.len(), INIT_RESPONSE_LENGTH);
            Some(FrameIterator::new(BROADCAST_CID, Command::Init.wire_value(), payload))
        } else {
            // rebinding an already-allocated channel: just echo the cid.
            let _ = payload.extend_from_slice(&cid.to_be_bytes());
            Some(FrameIterator::new(cid, Command::Init.wire_value(), payload))
        }
    }

    fn dispatch_ping(&mut self, cid: Cid, bcnt: u16) -> Option<Reply> {
        let mut payload = ResponsePayload::new();
        let _ = payload.extend_from_slice(&self.buffer[..bcnt as usize]);
        Some(FrameIterator::new(cid, Command::Ping.wire_value(), payload))
    }

    fn dispatch_msg(&mut self, cid: Cid) -> Option<Reply> {
        // minimal U2F pass-through: only GET_VERSION (second byte == 3) is
        // recognized. Preserved as-documented rather than extended; see
        // the crate's top-level design notes.
        let get_version = self.buffer.len() >= 2 && self.buffer[1] == 3;
        let mut payload = ResponsePayload::new();
        if get_version {
            let _ = payload.extend_from_slice(b"CTAP2/U2F_V2\x90\x00");
        } else {
            let _ = payload.extend_from_slice(&[0x69, 0x86]);
        }
        Some(FrameIterator::new(cid, Command::Msg.wire_value(), payload))
    }

    fn dispatch_cbor(&mut self, cid: Cid, bcnt: u16) -> Option<Reply> {
        let request = &self.buffer[..bcnt as usize];
        let outcome = self.authenticator.handle(request);
        let mut payload = ResponsePayload::new();
        match outcome {
            Ok(response) => {
                let _ = payload.push(0x00);
                let _ = payload.extend_from_slice(&response);
            }
            Err(status) => {
                let _ = payload.push(status);
            }
        }
        Some(FrameIterator::new(cid, Command::Cbor.wire_value(), payload))
    }

    /// Allocate a fresh channel id, evicting the oldest entry first if the
    /// table is already at [`crate::constants::CHANNEL_TABLE_SIZE`].
    ///
    /// Never hands out [`RESERVED_CID`] or `BROADCAST_CID`: both are
    /// reserved and must never alias a real, allocated channel.
    fn allocate_channel(&mut self) -> Cid {
        let mut new_cid = self.rng.next_u32();
        while new_cid == RESERVED_CID || new_cid == BROADCAST_CID {
            new_cid = self.rng.next_u32();
        }
        self.channels.allocate(new_cid);
        info_now!("allocated channel {:x}", new_cid);
        new_cid
    }

    fn error_reply(&self, cid: Cid, err: HidError) -> Reply {
        let mut payload = ResponsePayload::new();
        let _ = payload.push(err.wire_byte());
        FrameIterator::new(cid, Command::Error.wire_value(), payload)
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.buffer.clear();
    }
}
