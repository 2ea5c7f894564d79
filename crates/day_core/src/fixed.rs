/// Lower bound shared by every bounded meter (energy, stress, vectors, resources).
pub const METER_MIN: i32 = 0;

/// Upper bound shared by every bounded meter.
pub const METER_MAX: i32 = 100;

/// Clamp an integer value to the `[METER_MIN, METER_MAX]` range.
pub fn clamp_meter(value: i32) -> i32 {
    value.clamp(METER_MIN, METER_MAX)
}

/// Apply a signed delta to a meter, returning the clamped value.
pub fn commit_meter_delta(current: i32, delta: i32) -> i32 {
    clamp_meter(current.saturating_add(delta))
}

/// Integer division rounded half away from zero.
///
/// All tuning formulas are evaluated in fixed-point (hundredths or tenths) and
/// brought back to whole points through this helper so results stay bit-identical
/// across platforms.
pub fn round_div(numerator: i32, denominator: i32) -> i32 {
    round_div_wide(i64::from(numerator), i64::from(denominator))
}

/// [`round_div`] over a widened numerator, saturating the quotient into `i32`.
///
/// Formula terms are summed in `i64` so that no finite input can overflow
/// before the result reaches [`clamp_meter`].
pub fn round_div_wide(numerator: i64, denominator: i64) -> i32 {
    debug_assert!(denominator > 0);
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        numerator.saturating_add(half) / denominator
    } else {
        numerator.saturating_sub(half) / denominator
    };
    saturate_i32(rounded)
}

/// Narrow to `i32`, pinning out-of-range values to the nearest bound.
pub fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
