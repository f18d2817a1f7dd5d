//! Frame reassembly engine
//!
//! Collects UDP-sized fragments of an encoded video frame and emits the
//! concatenation once every fragment index has arrived. One live instance,
//! confined to the receive worker; frame sequence numbers are trusted to
//! be monotonic per stream.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};
use wire_protocol::{ProtocolError, ProtocolResult, VideoHeader};

/// Bounds on a partially assembled frame.
///
/// The wire protocol has no per-frame deadline; without these bounds an
/// abandoned partial frame would sit in memory until a newer frame
/// evicts it.
///
/// Both bounds are checked lazily, when the next frame packet arrives —
/// there is no timer. A stalled stream therefore holds an abandoned
/// partial frame until traffic resumes; the byte bound caps how much
/// memory that can be.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Drop a partial frame older than this. `None` disables the bound.
    pub max_frame_age: Option<Duration>,
    /// Drop a partial frame before its buffer grows past this many
    /// bytes. `None` disables the bound.
    pub max_buffered_bytes: Option<usize>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_frame_age: Some(Duration::from_secs(2)),
            max_buffered_bytes: Some(16 * 1024 * 1024),
        }
    }
}

/// Reassembly state for the frame currently in flight
///
/// All buffered fragments belong to `current_frame_sequence`; the buffer
/// is empty whenever no frame is in progress.
pub struct FrameAssembler {
    config: AssemblerConfig,
    current_frame_sequence: u32,
    fragments: BTreeMap<u16, Bytes>,
    buffered_bytes: usize,
    started_at: Option<Instant>,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

impl FrameAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            current_frame_sequence: 0,
            fragments: BTreeMap::new(),
            buffered_bytes: 0,
            started_at: None,
        }
    }

    /// Highest frame sequence accepted so far
    pub fn current_frame_sequence(&self) -> u32 {
        self.current_frame_sequence
    }

    /// Number of distinct fragments held for the frame in flight
    pub fn pending_fragments(&self) -> usize {
        self.fragments.len()
    }

    /// Feed one inbound frame packet. Returns the complete encoded frame
    /// once reassembly finishes.
    pub fn handle_packet(
        &mut self,
        header: &VideoHeader,
        payload: Bytes,
    ) -> ProtocolResult<Option<Bytes>> {
        let sequence = header.frame_sequence;

        if sequence < self.current_frame_sequence {
            debug!(
                sequence,
                current = self.current_frame_sequence,
                "dropping stale frame packet"
            );
            return Ok(None);
        }

        if sequence > self.current_frame_sequence {
            if !self.fragments.is_empty() {
                debug!(
                    sequence,
                    superseded = self.current_frame_sequence,
                    discarded_fragments = self.fragments.len(),
                    "newer frame supersedes partial assembly"
                );
            }
            self.clear();
            self.current_frame_sequence = sequence;
        }

        if header.fragment_total == 0 {
            // Unfragmented. Pending fragments of the same sequence are
            // discarded in favor of the complete payload.
            if !self.fragments.is_empty() {
                warn!(
                    sequence,
                    discarded_fragments = self.fragments.len(),
                    "unfragmented packet arrived with fragments pending"
                );
                self.clear();
            }
            self.current_frame_sequence = sequence.wrapping_add(1);
            return Ok(Some(payload));
        }

        self.evict_if_over_budget(sequence, payload.len());
        self.insert_fragment(header.fragment_index, payload);

        if self.fragments.len() == usize::from(header.fragment_total) {
            return self.reassemble(sequence, header.fragment_total).map(Some);
        }
        Ok(None)
    }

    /// First writer wins; duplicate indices are ignored.
    fn insert_fragment(&mut self, index: u16, payload: Bytes) {
        if self.fragments.contains_key(&index) {
            debug!(index, "ignoring duplicate fragment");
            return;
        }
        if self.fragments.is_empty() {
            self.started_at = Some(Instant::now());
        }
        self.buffered_bytes += payload.len();
        self.fragments.insert(index, payload);
    }

    fn evict_if_over_budget(&mut self, sequence: u32, incoming_len: usize) {
        if self.fragments.is_empty() {
            return;
        }

        if let Some(max_age) = self.config.max_frame_age {
            if self.started_at.is_some_and(|t| t.elapsed() > max_age) {
                warn!(
                    sequence,
                    discarded_fragments = self.fragments.len(),
                    "partial frame exceeded age bound, dropping it"
                );
                self.clear();
                return;
            }
        }

        if let Some(max_bytes) = self.config.max_buffered_bytes {
            if self.buffered_bytes + incoming_len > max_bytes {
                warn!(
                    sequence,
                    buffered_bytes = self.buffered_bytes,
                    "partial frame exceeded byte bound, dropping it"
                );
                self.clear();
            }
        }
    }

    fn reassemble(&mut self, sequence: u32, total: u16) -> ProtocolResult<Bytes> {
        let mut frame = BytesMut::with_capacity(self.buffered_bytes);
        for index in 0..total {
            match self.fragments.get(&index) {
                Some(fragment) => frame.extend_from_slice(fragment),
                None => {
                    // Fragment count matched `total` but an index in
                    // 0..total is absent: an out-of-range index slipped
                    // into the buffer. The frame is unrecoverable; do
                    // not advance the accepted sequence.
                    self.clear();
                    return Err(ProtocolError::MissingFragment {
                        index,
                        frame_sequence: sequence,
                    });
                }
            }
        }

        self.clear();
        self.current_frame_sequence = sequence.wrapping_add(1);
        Ok(frame.freeze())
    }

    fn clear(&mut self) {
        self.fragments.clear();
        self.buffered_bytes = 0;
        self.started_at = None;
    }
}
