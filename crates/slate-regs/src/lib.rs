//! Hardware ABI for the Slate S6 tile-based GPU.
//!
//! Everything in this crate is part of the contract with the command
//! processor and register file: packet headers, register dword addresses,
//! register field layouts, and the numeric encodings of hardware enums.
//! Values emitted through these types must be bit-exact; the s6x kernel
//! interface and the hardware itself have no tolerance for drift.
//!
//! Register addresses are dword offsets into the per-context register file,
//! grouped by hardware block:
//!
//! | block | unit                                     |
//! |-------|------------------------------------------|
//! | `SQ`  | sequencer (stage scheduling, const RAM)  |
//! | `SP`  | shader processors                        |
//! | `VC`  | varying cache (inter-stage linkage)      |
//! | `VF`  | vertex fetch                             |
//! | `PA`  | primitive assembler                      |
//! | `RAS` | rasterizer / scan converter              |
//! | `RB`  | render backend                           |
//! | `TP`  | texture pipe (sample-position mirror)    |
//!
//! A handful of fields carry values recovered from the reference blob with
//! no known semantics. They are named `unk*` or documented at their
//! definition site and must be emitted exactly as given.

pub mod enums;
pub mod limits;
pub mod pkt;
pub mod regs;

/// Invalid GPR id. Registers are addressed as `gpr * 4 + component`; the
/// encodable range ends at GPR 62, and `63.x` (0xfc) marks "not present"
/// in every regid field of the register file.
pub const REGID_NONE: u8 = 0xfc;

/// Pack a GPR number and component into a regid field value.
#[inline]
pub const fn regid(gpr: u8, comp: u8) -> u8 {
    (gpr << 2) | (comp & 0x3)
}

/// Pack four regid (or raw byte) fields into one register dword, low byte
/// first. Most `*_CONTROL` registers are laid out this way.
#[inline]
pub const fn pack_regids(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    (b0 as u32) | (b1 as u32) << 8 | (b2 as u32) << 16 | (b3 as u32) << 24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regid_packing() {
        assert_eq!(regid(0, 0), 0x00);
        assert_eq!(regid(1, 2), 0x06);
        assert_eq!(regid(63, 0), REGID_NONE);
    }

    #[test]
    fn regid_bytes_little_endian() {
        assert_eq!(pack_regids(0x01, 0x02, 0x03, 0x04), 0x0403_0201);
        assert_eq!(
            pack_regids(REGID_NONE, REGID_NONE, REGID_NONE, REGID_NONE),
            0xfcfc_fcfc
        );
    }
}
