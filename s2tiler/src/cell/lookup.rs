//! Hilbert curve lookup tables.
//!
//! Two 1024-entry tables translate between 4x4 sub-blocks of the IJ grid and
//! 8-bit Hilbert positions, carrying the curve orientation along:
//!
//! - `pos`: key `iiii jjjj oo` -> value `pppppppp oo`
//! - `ij`:  key `pppppppp oo` -> value `iiii jjjj oo`
//!
//! The tables are built once on first use and shared read-only afterwards.

use std::sync::OnceLock;

/// Bits of i (and of j) consumed per table lookup.
pub(crate) const LOOKUP_BITS: u32 = 4;

/// Orientation flag: i and j are swapped.
pub(crate) const SWAP_MASK: usize = 0x01;

/// Orientation flag: axis directions are inverted.
pub(crate) const INVERT_MASK: usize = 0x02;

/// Orientation change applied when descending into each child position.
const POS_TO_ORIENTATION: [usize; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

/// `(i << 1) | j` of each child position, per orientation.
const POS_TO_IJ: [[usize; 4]; 4] = [[0, 1, 3, 2], [0, 2, 3, 1], [3, 2, 0, 1], [3, 1, 0, 2]];

pub(crate) struct HilbertLookup {
    pub pos: [u16; 1024],
    pub ij: [u16; 1024],
}

/// Returns the process-wide tables, building them on first call.
pub(crate) fn tables() -> &'static HilbertLookup {
    static TABLES: OnceLock<HilbertLookup> = OnceLock::new();
    TABLES.get_or_init(build)
}

fn build() -> HilbertLookup {
    let mut tables = HilbertLookup {
        pos: [0; 1024],
        ij: [0; 1024],
    };
    for orientation in 0..4 {
        fill(&mut tables, 0, 0, 0, orientation, 0, orientation);
    }
    tables
}

/// Walks an order-4 Hilbert curve, recording both directions of the mapping.
///
/// Depth is fixed at four, so plain recursion is fine here.
fn fill(
    tables: &mut HilbertLookup,
    level: u32,
    i: usize,
    j: usize,
    orig_orientation: usize,
    pos: usize,
    orientation: usize,
) {
    if level == LOOKUP_BITS {
        let ij = (i << LOOKUP_BITS) + j;
        tables.pos[(ij << 2) + orig_orientation] = ((pos << 2) + orientation) as u16;
        tables.ij[(pos << 2) + orig_orientation] = ((ij << 2) + orientation) as u16;
        return;
    }

    let (i, j, pos) = (i << 1, j << 1, pos << 2);
    let rule = POS_TO_IJ[orientation];
    for (k, &child) in rule.iter().enumerate() {
        fill(
            tables,
            level + 1,
            i + (child >> 1),
            j + (child & 1),
            orig_orientation,
            pos + k,
            orientation ^ POS_TO_ORIENTATION[k],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_inverse() {
        let t = tables();
        for key in 0..1024usize {
            let orientation = key & 3;
            let value = t.pos[key] as usize;
            let back = t.ij[(value & !3) | orientation] as usize;
            assert_eq!(back & !3, key & !3, "key {:#x}", key);
            assert_eq!(back & 3, value & 3, "orientation mismatch at {:#x}", key);
        }
    }

    #[test]
    fn test_first_entry_matches_curve_start() {
        // Orientation 0 starts at the origin and ends back in orientation 0
        assert_eq!(tables().pos[0], 0);
        assert_eq!(tables().ij[0], 0);
    }

    #[test]
    fn test_positions_are_a_permutation() {
        let t = tables();
        for orientation in 0..4 {
            let mut seen = [false; 256];
            for ij in 0..256usize {
                let pos = (t.pos[(ij << 2) | orientation] >> 2) as usize;
                assert!(!seen[pos], "position {} repeated", pos);
                seen[pos] = true;
            }
        }
    }
}
