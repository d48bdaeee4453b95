use crate::error::ValidateError;

/// Speed of light in vacuum, km per millisecond.
pub const SPEED_OF_LIGHT_KM_PER_MS: f64 = 299.792458;

/// Signal speed in optical fiber relative to vacuum.
pub const FIBER_SPEED_FACTOR: f64 = 2.0 / 3.0;

/// Largest one-way displacement in km that an RTT difference allows.
///
/// Half the RTT delta is the one-way time budget on a symmetric path; it is
/// scaled by two thirds of the speed of light. The constants must stay as they
/// are so results remain comparable with earlier measurements.
pub fn estimate_radius(
    current_rtt: Option<f64>,
    previous_rtt: Option<f64>,
) -> Result<f64, ValidateError> {
    let usable = |rtt: Option<f64>| rtt.filter(|value| value.is_finite());
    let (current, previous) = match (usable(current_rtt), usable(previous_rtt)) {
        (Some(current), Some(previous)) => (current, previous),
        _ => return Err(ValidateError::MissingRtt),
    };

    let rtt_diff = (current - previous).abs();
    Ok((rtt_diff / 2.0) * (SPEED_OF_LIGHT_KM_PER_MS * FIBER_SPEED_FACTOR))
}
