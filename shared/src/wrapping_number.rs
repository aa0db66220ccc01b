/// Chunk group ids count up from 0 and wrap, so ordering them needs the
/// half-range rule rather than a plain comparison.
const HALF_RANGE: u32 = 1 << 31;

/// Returns whether or not a wrapping group id is newer than another
/// group_greater_than(2,1) will return true
/// group_greater_than(1,2) will return false
/// group_greater_than(1,1) will return false
pub fn group_greater_than(g1: u32, g2: u32) -> bool {
    ((g1 > g2) && (g1 - g2 <= HALF_RANGE)) || ((g1 < g2) && (g2 - g1 > HALF_RANGE))
}
