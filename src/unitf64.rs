// Every sampling routine in this crate takes its randomness as a UnitF64, a number in the
// half-open interval [0.0, 1.0). The tracker draws these from the history's own random stream,
// tests feed scripted values. The range is not checked in release builds.
//
// During debug builds, a panic will occur if the value is outside of [0.0, 1.0).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct UnitF64(pub f64);

impl UnitF64 {
    #[inline(always)]
    pub fn new_unchecked(val: f64) -> Self {
        debug_assert!(
            (0.0..1.0).contains(&val),
            "UnitF64 must be in [0.0, 1.0), got {}",
            val
        );
        UnitF64(val)
    }

    // Build a draw from the 53 high bits of a 64-bit random integer.
    #[inline(always)]
    pub fn from_bits(raw: u64) -> Self {
        UnitF64((raw >> 11) as f64 * (1.0 / (1u64 << 53) as f64))
    }

    #[inline(always)]
    pub fn value(self) -> f64 {
        self.0
    }

    // Used for -ln(xi) style samples, where xi = 0 must not happen.
    #[inline(always)]
    pub fn open_below(self) -> f64 {
        1.0 - self.0
    }
}
