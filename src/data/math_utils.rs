//! Numeric helpers for grid and scale computation.

/// Snap `value` to the nearest number of the form `{1, 2, 5} * 10^k`.
///
/// "Nearest" is measured in log space, so the boundaries between candidates
/// are the geometric means sqrt(2), sqrt(10) and sqrt(50) of each decade.
/// A value exactly on a boundary snaps up. Non-positive and non-finite
/// inputs are returned unchanged.
///
/// ```
/// use sigbrowse::data::math_utils::round125;
/// assert_eq!(round125(3.0), 2.0);
/// assert_eq!(round125(150.0), 200.0);
/// assert_eq!(round125(0.7), 0.5);
/// ```
pub fn round125(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return value;
    }

    let mut exponent = value.log10().floor() as i32;
    let mut mantissa = value / 10f64.powi(exponent);
    // log10 can land one ulp off at exact powers of ten
    if mantissa >= 10.0 {
        mantissa /= 10.0;
        exponent += 1;
    } else if mantissa < 1.0 {
        mantissa *= 10.0;
        exponent -= 1;
    }

    let snapped = if mantissa < std::f64::consts::SQRT_2 {
        1.0
    } else if mantissa < 10f64.sqrt() {
        2.0
    } else if mantissa < 50f64.sqrt() {
        5.0
    } else {
        10.0
    };
    snapped * 10f64.powi(exponent)
}
