//! Vertex fetch/decode program (`VF_*`).

use hashbrown::HashMap;

use slate_regs::regs::{self, VfControl0, VfDecodeInstr, VfDestCntl};

use crate::descriptor::VertexInputState;
use crate::shader::{ShaderVariant, Slot};
use crate::stream::CsSink;

/// Binds described attributes to the vertex shader's live inputs. Fetch
/// strides are programmed for every described binding, but decode units
/// are allocated densely over the attributes the shader actually reads,
/// so a shader that ignores an attribute costs nothing at fetch time.
pub(crate) fn emit_vertex_input(cs: &mut impl CsSink, vi: &VertexInputState, vs: &ShaderVariant) {
    let mut instanced = 0u32;
    for binding in &vi.bindings {
        cs.write_reg(regs::vf_fetch_stride(binding.binding), binding.stride);
        if binding.per_instance {
            instanced |= 1 << binding.binding;
        }
    }

    let step_rates: HashMap<u32, u32> = vi
        .divisors
        .iter()
        .map(|d| (d.binding, d.divisor))
        .collect();

    let mut idx = 0u32;
    for attr in &vi.attributes {
        let Some(input) = vs
            .inputs
            .iter()
            .find(|i| i.slot == Slot::Attribute(attr.location as u8))
        else {
            continue;
        };

        cs.pkt_reg(regs::vf_decode_instr(idx), 2);
        cs.emit(
            VfDecodeInstr {
                idx: attr.binding,
                offset: attr.offset,
                instanced: instanced & (1 << attr.binding) != 0,
                format: attr.format,
                byte_swap: 0,
                unk30: true,
                float: !attr.format.is_int(),
            }
            .encode(),
        );
        cs.emit(step_rates.get(&attr.binding).copied().unwrap_or(1));

        cs.write_reg(
            regs::vf_dest_cntl(idx),
            VfDestCntl {
                write_mask: input.compmask,
                regid: input.regid,
            }
            .encode(),
        );
        idx += 1;
    }

    cs.write_reg(
        regs::VF_CONTROL_0,
        VfControl0 {
            fetch_cnt: idx,
            decode_cnt: idx,
        }
        .encode(),
    );
}
