//! Programmable sample positions.

use slate_regs::regs::{self, SAMPLE_CONFIG_LOCATION_ENABLE};

use crate::descriptor::SampleLocation;
use crate::stream::CsSink;

/// The three units that keep a private copy of the sample grid.
const CONSUMERS: [u16; 3] = [
    regs::RAS_SAMPLE_CONFIG,
    regs::RB_SAMPLE_CONFIG,
    regs::TP_SAMPLE_CONFIG,
];

/// Programs custom sample positions into every consumer, or restores the
/// standard grid when `locations` is `None`. One byte per sample, x in
/// the low nibble, 0.4 fixed point.
pub(crate) fn emit_sample_locations(cs: &mut impl CsSink, locations: Option<&[SampleLocation]>) {
    let Some(locations) = locations else {
        for config in CONSUMERS {
            cs.write_reg(config, 0);
        }
        return;
    };

    let mut packed = 0u32;
    for (i, loc) in locations.iter().enumerate() {
        packed |= regs::sample_location_byte(loc.x, loc.y) << (i * 8);
    }
    for config in CONSUMERS {
        cs.pkt_reg(config, 2);
        cs.emit(SAMPLE_CONFIG_LOCATION_ENABLE);
        cs.emit(packed);
    }
}
