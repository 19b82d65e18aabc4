//! Inter-stage varying linkage.
//!
//! The last geometry-family stage and the fragment stage were compiled
//! separately; this module reconciles them into the packed varying-cache
//! map the register encoders write. Entries are ordered by fragment-input
//! location, stream-out captures are wired in next (appending anything
//! the fragment stage does not consume), and the special outputs ride at
//! the tail. The finished [`VaryingMap`] also carries the stream-out
//! routing program, which must be computed against the complete map.

use slate_regs::limits::{MAX_LINKED_VARYINGS, MAX_STREAMOUT_BUFFERS, MAX_VARYING_COMPONENTS};
use slate_regs::regs::{VcSoBufCntl, VcSoProg};
use slate_regs::REGID_NONE;

use crate::error::PipelineError;
use crate::shader::{ShaderVariant, Slot};

/// Packed-location value meaning "not present".
pub(crate) const LOC_NONE: u8 = 0xff;

/// One varying-map entry: a producer register routed to a packed cache
/// location. `regid` is [`REGID_NONE`] when no producer output matched
/// the consumed slot; the entry still holds its location so the
/// fragment-side layout stays dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LinkedVarying {
    pub regid: u8,
    pub compmask: u8,
    pub loc: u8,
}

/// In-progress linkage state. Wrapped up into a [`VaryingMap`] by
/// [`link_varyings`].
#[derive(Debug)]
pub(crate) struct Linkage {
    var: Vec<LinkedVarying>,
    varmask: [u32; 4],
    max_loc: u32,
    primid_loc: u8,
}

#[inline]
fn last_bit(mask: u8) -> u32 {
    8 - mask.leading_zeros()
}

impl Linkage {
    pub(crate) fn new() -> Self {
        Linkage {
            var: Vec::new(),
            varmask: [0; 4],
            max_loc: 0,
            primid_loc: LOC_NONE,
        }
    }

    /// Record one entry. Every consumed location gets an entry, matched
    /// or not; the component mask feeds the live-location mask and the
    /// packed stride.
    pub(crate) fn add(&mut self, regid: u8, compmask: u8, loc: u8) {
        self.var.push(LinkedVarying {
            regid,
            compmask,
            loc,
        });
        for j in 0..last_bit(compmask) {
            let comploc = u32::from(loc) + j;
            debug_assert!((comploc as usize) < MAX_VARYING_COMPONENTS);
            if (comploc as usize) < MAX_VARYING_COMPONENTS {
                self.varmask[(comploc / 32) as usize] |= 1 << (comploc % 32);
            }
        }
        self.max_loc = self.max_loc.max(u32::from(loc) + last_bit(compmask));
    }

    /// Walk the fragment inputs and bind each to the producer output with
    /// the same slot. A consumed slot the producer never writes still
    /// lands in the map with an invalid register; the primitive id is
    /// additionally noted so the assembler can be told to pass it
    /// through.
    pub(crate) fn link(&mut self, last: &ShaderVariant, fs: &ShaderVariant) {
        for input in &fs.inputs {
            if input.compmask == 0 {
                continue;
            }
            if u32::from(input.loc) >= fs.total_in {
                continue;
            }
            let regid = match last.find_output(input.slot) {
                Some(out) => out.regid,
                None => {
                    if input.slot == Slot::PrimitiveId {
                        self.primid_loc = input.loc;
                    }
                    REGID_NONE
                }
            };
            self.add(regid, input.compmask, input.loc);
        }
    }

    /// Fold the stream-out captures into the map. Captured outputs the
    /// fragment stage also consumes are widened in place; the rest are
    /// appended past every existing entry. Position and point size are
    /// skipped here: they join the map with the other specials, at the
    /// tail.
    pub(crate) fn wire_stream_out(&mut self, last: &ShaderVariant) {
        for capture in &last.stream_out.captures {
            let out = match last.outputs.get(capture.output as usize) {
                Some(out) => *out,
                None => {
                    debug_assert!(false, "capture names no output");
                    continue;
                }
            };
            if out.slot == Slot::Position || out.slot == Slot::PointSize {
                continue;
            }
            let compmask: u8 =
                ((1u32 << (capture.num_components + capture.start_component)) - 1) as u8;

            let mut nextloc = 0;
            let mut idx = None;
            for (i, entry) in self.var.iter().enumerate() {
                if entry.regid == out.regid {
                    idx = Some(i);
                    break;
                }
                nextloc = nextloc.max(u32::from(entry.loc) + 4);
            }
            let idx = match idx {
                Some(i) => i,
                None => {
                    self.add(out.regid, compmask, nextloc as u8);
                    self.var.len() - 1
                }
            };

            // Streaming out more components than the fragment stage
            // reads: widen the entry. The live-location mask keeps its
            // narrower view; those components exist only for capture.
            if compmask & !self.var[idx].compmask != 0 {
                self.var[idx].compmask |= compmask;
                self.max_loc = self
                    .max_loc
                    .max(u32::from(self.var[idx].loc) + last_bit(self.var[idx].compmask));
            }
        }
    }
}

/// Stream-out routing derived from the finished map: per-buffer component
/// counts and one program word per pair of packed locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SoProgram {
    pub buf_cntl: VcSoBufCntl,
    pub ncomp: [u32; MAX_STREAMOUT_BUFFERS],
    pub prog: Vec<u32>,
}

/// The finished linkage product consumed by the program encoders.
#[derive(Debug)]
pub(crate) struct VaryingMap {
    pub entries: Vec<LinkedVarying>,
    /// Inverted live-location mask, snapshotted before the specials were
    /// appended: the cache rows holding position, point size and layer
    /// stay disabled for interpolation.
    pub var_disable: [u32; 4],
    pub position_loc: u8,
    pub psize_loc: u8,
    pub layer_loc: u8,
    pub primid_loc: u8,
    /// Packed per-vertex stride in scalar components.
    pub max_loc: u32,
    pub so: Option<SoProgram>,
}

impl VaryingMap {
    pub(crate) fn cnt(&self) -> u32 {
        self.entries.len() as u32
    }

    /// The fragment stage reads the primitive id but no earlier stage
    /// produces it, so the assembler must forward its own.
    pub(crate) fn primid_passthru(&self) -> bool {
        self.primid_loc != LOC_NONE
    }
}

/// Link `last` against the fragment stage (absent in position-only
/// programs) and wire in stream-out. The specials are appended in the
/// tail order the varying cache expects: position, then point size, then
/// layer.
pub(crate) fn link_varyings(
    last: &ShaderVariant,
    fs: Option<&ShaderVariant>,
) -> Result<VaryingMap, PipelineError> {
    let mut l = Linkage::new();
    if let Some(fs) = fs {
        l.link(last, fs);
    }
    let has_so = !last.stream_out.is_empty();
    if has_so {
        l.wire_stream_out(last);
    }

    let var_disable = [!l.varmask[0], !l.varmask[1], !l.varmask[2], !l.varmask[3]];

    let position_regid = last.output_regid(Slot::Position);
    let psize_regid = last.output_regid(Slot::PointSize);
    let layer_regid = last.output_regid(Slot::Layer);

    let mut position_loc = LOC_NONE;
    let mut psize_loc = LOC_NONE;
    let mut layer_loc = LOC_NONE;
    if position_regid != REGID_NONE {
        position_loc = l.max_loc as u8;
        l.add(position_regid, 0xf, position_loc);
    }
    if psize_regid != REGID_NONE {
        psize_loc = l.max_loc as u8;
        l.add(psize_regid, 0x1, psize_loc);
    }
    if layer_regid != REGID_NONE {
        layer_loc = l.max_loc as u8;
        l.add(layer_regid, 0x1, layer_loc);
    }

    // Captures may name position or point size, so the routing program
    // needs the specials in place.
    let so = if has_so {
        Some(build_so_program(last, &l))
    } else {
        None
    };

    // An empty map hangs the primitive assembler; park one dummy
    // component at the tail.
    if l.var.is_empty() {
        let loc = l.max_loc as u8;
        l.add(0, 0x1, loc);
    }

    if l.var.len() > MAX_LINKED_VARYINGS {
        return Err(PipelineError::TooManyVaryings {
            used: l.var.len() as u32,
        });
    }

    Ok(VaryingMap {
        entries: l.var,
        var_disable,
        position_loc,
        psize_loc,
        layer_loc,
        primid_loc: l.primid_loc,
        max_loc: l.max_loc,
        so,
    })
}

fn build_so_program(last: &ShaderVariant, l: &Linkage) -> SoProgram {
    let mut ncomp = [0u32; MAX_STREAMOUT_BUFFERS];
    let prog_count = (l.max_loc + 1) / 2;
    let mut prog = vec![0u32; prog_count as usize];

    for capture in &last.stream_out.captures {
        let out = match last.outputs.get(capture.output as usize) {
            Some(out) => *out,
            None => continue,
        };
        // A captured output the compiler never assigned a register.
        if out.regid == REGID_NONE {
            continue;
        }
        ncomp[capture.buffer as usize] += u32::from(capture.num_components);

        // The map is ordered for the fragment stage, so captures have to
        // hunt for their entry.
        let entry = match l.var.iter().find(|e| e.regid == out.regid) {
            Some(entry) => entry,
            None => {
                debug_assert!(false, "capture source missing from the varying map");
                continue;
            }
        };

        for j in 0..capture.num_components {
            let c = j + capture.start_component;
            let loc = u32::from(entry.loc) + u32::from(c);
            let off = u32::from(j) + capture.dword_offset;
            let word = if loc & 1 != 0 {
                VcSoProg {
                    b_en: true,
                    b_buf: u32::from(capture.buffer),
                    b_off_dwords: off,
                    ..Default::default()
                }
            } else {
                VcSoProg {
                    a_en: true,
                    a_buf: u32::from(capture.buffer),
                    a_off_dwords: off,
                    ..Default::default()
                }
            };
            prog[(loc / 2) as usize] |= word.encode();
        }
    }

    SoProgram {
        buf_cntl: VcSoBufCntl {
            enable: true,
            buf: [ncomp[0] > 0, ncomp[1] > 0, ncomp[2] > 0, ncomp[3] > 0],
        },
        ncomp,
        prog,
    }
}

const INTERP_SMOOTH: u8 = 0;
const INTERP_FLAT: u8 = 1;
const INTERP_ZERO: u8 = 2;
const INTERP_ONE: u8 = 3;

const PS_REPL_NONE: u8 = 0;
const PS_REPL_S: u8 = 1;
const PS_REPL_T: u8 = 2;

/// Interpolation and point-sprite replacement selectors for one fragment
/// input. Two bits per *present* component, components packed densely.
/// Returns the mode words plus the number of selector bits used.
fn varying_mode(input: &crate::shader::IoSlot) -> (u8, u8, u32) {
    let compmask = input.compmask;
    let mut interp = INTERP_SMOOTH;
    let mut repl = PS_REPL_NONE;
    let mut shift = 0;
    if input.slot == Slot::PointCoord {
        if compmask & 0x1 != 0 {
            repl |= PS_REPL_S << shift;
            shift += 2;
        }
        if compmask & 0x2 != 0 {
            repl |= PS_REPL_T << shift;
            shift += 2;
        }
        if compmask & 0x4 != 0 {
            interp |= INTERP_ZERO << shift;
            shift += 2;
        }
        if compmask & 0x8 != 0 {
            // The w selector sits at a fixed offset; the reference blob
            // emits it there no matter how the sprite is packed.
            interp |= INTERP_ONE << 6;
            shift += 2;
        }
    } else if input.flat {
        for i in 0..4 {
            if compmask & (1 << i) != 0 {
                interp |= INTERP_FLAT << shift;
                shift += 2;
            }
        }
    }
    (interp, repl, shift)
}

/// Per-location interpolation selectors for the whole fragment program:
/// the interp-mode and sprite-replacement register groups, eight dwords
/// each.
pub(crate) fn varying_modes(fs: Option<&ShaderVariant>) -> ([u32; 8], [u32; 8]) {
    let mut interp_modes = [0u32; 8];
    let mut repl_modes = [0u32; 8];
    let Some(fs) = fs else {
        return (interp_modes, repl_modes);
    };
    for input in &fs.inputs {
        if input.compmask == 0 {
            continue;
        }
        let (interp, repl, bits) = varying_mode(input);

        let bit = u32::from(input.loc) * 2;
        let n = (bit / 32) as usize;
        let shift = bit % 32;
        interp_modes[n] |= u32::from(interp) << shift;
        repl_modes[n] |= u32::from(repl) << shift;
        if shift + bits > 32 && n + 1 < interp_modes.len() {
            let spill = 32 - shift;
            interp_modes[n + 1] |= u32::from(interp) >> spill;
            repl_modes[n + 1] |= u32::from(repl) >> spill;
        }
    }
    (interp_modes, repl_modes)
}
