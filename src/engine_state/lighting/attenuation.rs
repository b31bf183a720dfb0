//! Fixed-point light attenuation.
//!
//! Light levels are integers in `0..=MAX_LIGHT_LEVEL`. One propagation step
//! multiplies by the target cell's transmittance `(255 - opacity) / 255` and
//! by the drop-off constant 15/16 (0.9375), flooring the result. Anything
//! under `MIN_LIGHT_LEVEL` is dark.

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Brightest light level; the level of open sky and of a full-strength source.
pub const MAX_LIGHT_LEVEL: u8 = 15;

/// Dimmest level that still counts as light.
pub const MIN_LIGHT_LEVEL: u8 = 1;

// 15/16, kept as a fraction so stepping is exact integer math
const DROP_OFF_NUMERATOR: u32 = 15;
const DROP_OFF_DENOMINATOR: u32 = 16;

/// Level arriving in a cell of the given opacity from a neighbour at `level`.
#[inline]
pub fn attenuate(level: u8, opacity: u8) -> u8 {
    let transmitted = level as u32 * (255 - opacity as u32) * DROP_OFF_NUMERATOR
        / (255 * DROP_OFF_DENOMINATOR);
    if transmitted < MIN_LIGHT_LEVEL as u32 {
        0
    } else {
        transmitted as u8
    }
}

/// Sunlight arriving in a cell, where `travel` is the direction of the step.
///
/// Sun moving straight down into a fully clear cell keeps its level, which is
/// what makes an open shaft stay bright all the way down.
#[inline]
pub fn attenuate_sun(level: u8, opacity: u8, travel: BlockSide) -> u8 {
    if travel == BlockSide::BOTTOM && opacity == 0 {
        level
    } else {
        attenuate(level, opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::registry::FULLY_OPAQUE;

    #[test]
    fn clear_cells_drop_one_level_per_step() {
        for level in 1..=MAX_LIGHT_LEVEL {
            assert_eq!(attenuate(level, 0), level - 1);
        }
        assert_eq!(attenuate(0, 0), 0);
    }

    #[test]
    fn opaque_cells_receive_nothing() {
        assert_eq!(attenuate(MAX_LIGHT_LEVEL, FULLY_OPAQUE), 0);
        assert_eq!(attenuate_sun(MAX_LIGHT_LEVEL, FULLY_OPAQUE, BlockSide::BOTTOM), 0);
    }

    #[test]
    fn partial_opacity_attenuates_more() {
        let clear = attenuate(MAX_LIGHT_LEVEL, 0);
        let leafy = attenuate(MAX_LIGHT_LEVEL, 96);
        assert!(leafy < clear);
        assert_eq!(leafy, 8);
    }

    #[test]
    fn sun_shaft_exception_only_applies_downward_through_clear_cells() {
        assert_eq!(attenuate_sun(12, 0, BlockSide::BOTTOM), 12);
        assert_eq!(attenuate_sun(12, 0, BlockSide::TOP), 11);
        assert_eq!(attenuate_sun(12, 0, BlockSide::LEFT), 11);
        assert!(attenuate_sun(12, 16, BlockSide::BOTTOM) < 12);
    }
}
