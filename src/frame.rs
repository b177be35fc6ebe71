//! Parsing of inbound CTAPHID frames and fragmentation of outbound replies.

use heapless::Vec;

use crate::constants::PACKET_SIZE;
use crate::types::Cid;

/// Bit 7 of the fifth frame byte distinguishes initialization frames
/// (set) from continuation frames (clear).
const INIT_BIT: u8 = 0x80;

/// A parsed initialization-frame header: `cid[4] | cmd|0x80[1] | bcnt_hi[1] | bcnt_lo[1]`.
pub struct InitHeader {
    pub cid: Cid,
    pub cmd_byte: u8,
    pub bcnt_total: u16,
}

/// A parsed continuation-frame header: `cid[4] | seq[1]`.
pub struct ContinuationHeader {
    pub cid: Cid,
    pub seq: u8,
}

/// True if `frame[4]` has the initialization bit set. Caller must ensure
/// `frame` has at least 5 bytes before calling this.
pub fn is_initialization(frame: &[u8]) -> bool {
    frame[4] & INIT_BIT != 0
}

/// Best-effort extraction of the channel id from a possibly-too-short
/// frame, for addressing error replies (§4.2: "emit error `other` ... if
/// the source cid is unreadable").
pub fn readable_cid(frame: &[u8]) -> Option<Cid> {
    if frame.len() >= 4 {
        Some(u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]))
    } else {
        None
    }
}

/// Parse the 7-byte initialization-frame header. Caller must ensure
/// `frame.len() >= 7`.
pub fn parse_init_header(frame: &[u8]) -> InitHeader {
    InitHeader {
        cid: u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]),
        cmd_byte: frame[4] & !INIT_BIT,
        bcnt_total: u16::from_be_bytes([frame[5], frame[6]]),
    }
}

/// Parse the 5-byte continuation-frame header. Caller must ensure
/// `frame.len() >= 5`.
pub fn parse_continuation_header(frame: &[u8]) -> ContinuationHeader {
    ContinuationHeader {
        cid: u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]),
        seq: frame[4],
    }
}

/// One outbound HID frame, unpadded (the transport decides padding).
pub type OutboundFrame = Vec<u8, PACKET_SIZE>;

/// Fragments a `(cid, cmd, payload)` reply into a sequence of outbound
/// frames, per §4.2. Owns the payload so a CBOR reply's bytes stay alive
/// until every frame has been produced.
pub struct FrameIterator<const N: usize> {
    cid: Cid,
    // low 7 bits are the command; bit 7 gets set only on the first frame.
    cmd: u8,
    payload: Vec<u8, N>,
    offset: usize,
    seq: u8,
    emitted_first: bool,
}

impl<const N: usize> FrameIterator<N> {
    pub fn new(cid: Cid, cmd: u8, payload: Vec<u8, N>) -> Self {
        Self {
            cid,
            cmd,
            payload,
            offset: 0,
            seq: 0,
            emitted_first: false,
        }
    }
}

impl<const N: usize> Iterator for FrameIterator<N> {
    type Item = OutboundFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let mut frame = OutboundFrame::new();

        if !self.emitted_first {
            self.emitted_first = true;
            let k1 = core::cmp::min(self.payload.len() - self.offset, PACKET_SIZE - 7);
            let _ = frame.extend_from_slice(&self.cid.to_be_bytes());
            let _ = frame.push(self.cmd | INIT_BIT);
            let _ = frame.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
            let _ = frame.extend_from_slice(&self.payload[self.offset..self.offset + k1]);
            self.offset += k1;
            return Some(frame);
        }

        if self.offset >= self.payload.len() {
            return None;
        }

        let k = core::cmp::min(self.payload.len() - self.offset, PACKET_SIZE - 5);
        let _ = frame.extend_from_slice(&self.cid.to_be_bytes());
        let _ = frame.push(self.seq);
        let _ = frame.extend_from_slice(&self.payload[self.offset..self.offset + k]);
        self.seq += 1;
        self.offset += k;
        Some(frame)
    }
}
