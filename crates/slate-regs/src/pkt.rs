//! Command-stream packet headers.
//!
//! The S6 command processor consumes a stream of dword packets. Two kinds
//! exist, distinguished by the type nibble in bits [31:28] of the header:
//!
//! | kind           | [31:28] | [27:16]          | [15:0] / [11:0]       |
//! |----------------|---------|------------------|-----------------------|
//! | register write | `0x4`   | reg addr [27:12] | value count [11:0]    |
//! | command        | `0x7`   | opcode [23:16]   | payload count [15:0]  |
//!
//! A register-write packet copies `count` dwords into the register file
//! starting at the 16-bit dword address. A command packet hands `count`
//! payload dwords to the opcode's microcode routine.

use crate::enums::{StateBlock, StateSrc, StateType};

pub const PKT_TYPE_SHIFT: u32 = 28;
pub const PKT_TYPE_REG: u32 = 0x4;
pub const PKT_TYPE_CMD: u32 = 0x7;

/// Command-packet opcodes used by pipeline state objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CpOpcode {
    Nop = 0x10,
    /// Load descriptors/shader words for the shared graphics blocks.
    LoadState = 0x21,
    /// Load state for the geometry-family stages (VS/HS/DS/GS).
    LoadStateGeom = 0x22,
    /// Load state for the fragment and compute stages.
    LoadStateFrag = 0x23,
    /// Payload of (register address, value) pairs; repeated writes to the
    /// same address are kept in order, which FIFO registers rely on.
    RegBunch = 0x2c,
}

impl CpOpcode {
    pub const fn from_u32(v: u32) -> Option<CpOpcode> {
        Some(match v {
            0x10 => CpOpcode::Nop,
            0x21 => CpOpcode::LoadState,
            0x22 => CpOpcode::LoadStateGeom,
            0x23 => CpOpcode::LoadStateFrag,
            0x2c => CpOpcode::RegBunch,
            _ => return None,
        })
    }
}

/// Header for a register-write packet. `count` is the number of value
/// dwords that follow.
#[inline]
pub const fn pkt_reg_hdr(reg: u16, count: u16) -> u32 {
    debug_assert!(count as u32 <= 0xfff);
    (PKT_TYPE_REG << PKT_TYPE_SHIFT) | (reg as u32) << 12 | (count as u32 & 0xfff)
}

/// Header for a command packet. `count` is the number of payload dwords.
#[inline]
pub const fn pkt_cmd_hdr(op: CpOpcode, count: u32) -> u32 {
    debug_assert!(count <= 0xffff);
    (PKT_TYPE_CMD << PKT_TYPE_SHIFT) | (op as u32) << 16 | (count & 0xffff)
}

/// A decoded packet header. Emission never round-trips through this; it
/// exists so tests (and tooling) can walk a finished stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PktHdr {
    Reg { reg: u16, count: u16 },
    Cmd { op: CpOpcode, count: u32 },
}

pub fn decode_hdr(word: u32) -> Option<PktHdr> {
    match word >> PKT_TYPE_SHIFT {
        PKT_TYPE_REG => Some(PktHdr::Reg {
            reg: ((word >> 12) & 0xffff) as u16,
            count: (word & 0xfff) as u16,
        }),
        PKT_TYPE_CMD => {
            let op = CpOpcode::from_u32((word >> 16) & 0xff)?;
            Some(PktHdr::Cmd {
                op,
                count: word & 0xffff,
            })
        }
        _ => None,
    }
}

/// Control word of a `LoadState*` packet (the dword after the header).
///
/// | field      | bits    |
/// |------------|---------|
/// | `dst_off`  | [13:0]  |
/// | `ty`       | [15:14] |
/// | `src`      | [17:16] |
/// | `block`    | [21:18] |
/// | `num_unit` | [31:22] |
///
/// `dst_off` and `num_unit` are in units that depend on `ty`: vec4s for
/// constants, descriptors for resources, instruction groups for shader
/// binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStateControl {
    pub dst_off: u32,
    pub ty: StateType,
    pub src: StateSrc,
    pub block: StateBlock,
    pub num_unit: u32,
}

impl LoadStateControl {
    #[inline]
    pub const fn encode(self) -> u32 {
        (self.dst_off & 0x3fff)
            | (self.ty as u32) << 14
            | (self.src as u32) << 16
            | (self.block as u32) << 18
            | (self.num_unit & 0x3ff) << 22
    }
}

/// Source-address qword of a bindless `LoadState*` packet: descriptor-dword
/// offset in [27:0], bindless base index above it.
#[inline]
pub const fn bindless_src_addr(base: u32, offset_dwords: u32) -> u64 {
    ((offset_dwords & 0x0fff_ffff) | base << 28) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_hdr_round_trip() {
        let hdr = pkt_reg_hdr(0x0b20, 3);
        assert_eq!(hdr >> PKT_TYPE_SHIFT, PKT_TYPE_REG);
        assert_eq!(
            decode_hdr(hdr),
            Some(PktHdr::Reg {
                reg: 0x0b20,
                count: 3
            })
        );
    }

    #[test]
    fn cmd_hdr_round_trip() {
        let hdr = pkt_cmd_hdr(CpOpcode::LoadStateGeom, 3);
        assert_eq!(
            decode_hdr(hdr),
            Some(PktHdr::Cmd {
                op: CpOpcode::LoadStateGeom,
                count: 3
            })
        );
        assert_eq!(decode_hdr(0x1234_5678), None);
    }

    #[test]
    fn load_state_control_fields() {
        let w = LoadStateControl {
            dst_off: 5,
            ty: StateType::Consts,
            src: StateSrc::Direct,
            block: StateBlock::FsShader,
            num_unit: 2,
        }
        .encode();
        assert_eq!(w & 0x3fff, 5);
        assert_eq!((w >> 14) & 0x3, StateType::Consts as u32);
        assert_eq!((w >> 16) & 0x3, StateSrc::Direct as u32);
        assert_eq!((w >> 18) & 0xf, StateBlock::FsShader as u32);
        assert_eq!(w >> 22, 2);
    }

    #[test]
    fn bindless_addr_packs_base_above_offset() {
        assert_eq!(bindless_src_addr(4, 0x40), 0x4000_0040);
        assert_eq!(bindless_src_addr(0, 16), 16);
    }
}
