//! Pre-sized command-stream memory and the sink abstraction.
//!
//! A pipeline owns exactly one backing block. Its size is decided by a
//! sizing pass that runs every encoder against [`CountSink`]; emission
//! then runs the same encoder code against [`SubStream`] writers carved
//! out of the block. Because both passes share the code, planned and
//! emitted sizes can only diverge through an encoder bug, which
//! [`SubStream::finish`] turns into [`PipelineError::SizingMismatch`].

use slate_regs::limits::INSTR_UNIT_DWORDS;
use slate_regs::pkt::{pkt_cmd_hdr, pkt_reg_hdr, CpOpcode};

use crate::error::PipelineError;

/// Destination of packet emission. The sizing pass and the real emission
/// run identical encoder code against different sinks.
pub trait CsSink {
    fn emit(&mut self, dword: u32);

    fn emit_qw(&mut self, qword: u64) {
        self.emit(qword as u32);
        self.emit((qword >> 32) as u32);
    }

    fn emit_all(&mut self, dwords: &[u32]) {
        for &dword in dwords {
            self.emit(dword);
        }
    }

    /// Header of a register-write burst; `count` value dwords follow.
    fn pkt_reg(&mut self, reg: u16, count: u16) {
        self.emit(pkt_reg_hdr(reg, count));
    }

    /// Header of a command packet; `count` payload dwords follow.
    fn pkt_cmd(&mut self, op: CpOpcode, count: u32) {
        self.emit(pkt_cmd_hdr(op, count));
    }

    /// Single-register write.
    fn write_reg(&mut self, reg: u16, value: u32) {
        self.pkt_reg(reg, 1);
        self.emit(value);
    }
}

/// Sizing-pass sink: counts dwords, stores nothing.
#[derive(Debug, Default)]
pub struct CountSink {
    len: u32,
}

impl CountSink {
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl CsSink for CountSink {
    fn emit(&mut self, _dword: u32) {
        self.len += 1;
    }
}

/// Test sink that records raw dwords so packets can be walked.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordSink(pub Vec<u32>);

#[cfg(test)]
impl CsSink for RecordSink {
    fn emit(&mut self, dword: u32) {
        self.0.push(dword);
    }
}

/// Handle to a finished sub-stream: where it starts and how many dwords
/// the draw-time state gather reads. A zero size means the state group is
/// absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawState {
    pub iova: u64,
    pub size: u32,
}

impl DrawState {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Dword budget of one build, produced by the sizing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamPlan {
    /// Shader binaries, instruction-unit aligned.
    pub binaries: u32,
    /// Named sub-streams, in emission order.
    pub substreams: Vec<(&'static str, u32)>,
    /// Descriptor-prefetch block.
    pub prefetch: u32,
}

impl StreamPlan {
    pub fn push(&mut self, name: &'static str, size: u32) {
        self.substreams.push((name, size));
    }

    pub fn total(&self) -> u32 {
        self.binaries + self.substreams.iter().map(|&(_, s)| s).sum::<u32>() + self.prefetch
    }
}

/// The single backing block of a pipeline: sized once, never grown.
#[derive(Debug)]
pub struct CommandStream {
    words: Vec<u32>,
    cursor: usize,
    base_iova: u64,
}

impl CommandStream {
    /// Reserve exactly `total` dwords, mapped by the caller's allocator at
    /// `base_iova`, which must sit on an instruction-fetch boundary.
    pub fn with_capacity(total: u32, base_iova: u64) -> Result<Self, PipelineError> {
        debug_assert_eq!(base_iova % (INSTR_UNIT_DWORDS as u64 * 4), 0);
        let mut words = Vec::new();
        words
            .try_reserve_exact(total as usize)
            .map_err(|_| PipelineError::OutOfMemory {
                what: "pipeline command stream",
            })?;
        words.resize(total as usize, 0);
        Ok(CommandStream {
            words,
            cursor: 0,
            base_iova,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.words.len() as u32
    }

    pub fn base_iova(&self) -> u64 {
        self.base_iova
    }

    /// Device address of the next dword to be reserved.
    pub fn head_iova(&self) -> u64 {
        self.base_iova + self.cursor as u64 * 4
    }

    /// Copy a shader binary in and return its device address. Binaries
    /// are placed before any sub-stream, so the cursor is still on an
    /// instruction-fetch boundary.
    pub fn upload(&mut self, code: &[u32]) -> u64 {
        debug_assert_eq!(self.cursor % INSTR_UNIT_DWORDS as usize, 0);
        debug_assert_eq!(code.len() % INSTR_UNIT_DWORDS as usize, 0);
        let iova = self.head_iova();
        let end = self.cursor + code.len();
        self.words[self.cursor..end].copy_from_slice(code);
        self.cursor = end;
        iova
    }

    /// Begin a sub-stream of exactly `size` dwords.
    pub fn begin(&mut self, name: &'static str, size: u32) -> SubStream<'_> {
        let start = self.cursor;
        let end = start + size as usize;
        debug_assert!(end <= self.words.len(), "sub-stream {name} over capacity");
        let iova = self.base_iova + start as u64 * 4;
        self.cursor = end;
        SubStream {
            name,
            words: &mut self.words[start..end],
            len: 0,
            iova,
        }
    }

    /// Whole-stream closing check: every planned dword was used.
    pub fn check_full(&self) -> Result<(), PipelineError> {
        if self.cursor != self.words.len() {
            return Err(PipelineError::SizingMismatch {
                substream: "stream total",
                expected: self.words.len() as u32,
                got: self.cursor as u32,
            });
        }
        Ok(())
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Stream contents for the caller's allocator to map at `base_iova`.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }
}

/// Bounded writer over one reserved range of the stream. Must be filled
/// exactly; [`SubStream::finish`] checks the fill against the plan.
#[derive(Debug)]
pub struct SubStream<'a> {
    name: &'static str,
    words: &'a mut [u32],
    len: usize,
    iova: u64,
}

impl SubStream<'_> {
    pub fn iova(&self) -> u64 {
        self.iova
    }

    /// Close the sub-stream, checking the emitted length against the
    /// planned size.
    pub fn finish(self) -> Result<DrawState, PipelineError> {
        if self.len != self.words.len() {
            return Err(PipelineError::SizingMismatch {
                substream: self.name,
                expected: self.words.len() as u32,
                got: self.len as u32,
            });
        }
        Ok(DrawState {
            iova: self.iova,
            size: self.len as u32,
        })
    }
}

impl CsSink for SubStream<'_> {
    fn emit(&mut self, dword: u32) {
        // Overflow is recorded, not written; finish() reports it.
        if let Some(slot) = self.words.get_mut(self.len) {
            *slot = dword;
        }
        self.len += 1;
    }
}
