//! Unit conversions applied while normalizing provider data.

/// 16-point compass rose, clockwise from north.
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const SECTOR_DEGREES: f64 = 360.0 / COMPASS_POINTS.len() as f64;

/// Kelvin to whole degrees Fahrenheit, rounding half away from zero.
///
/// `None` for NaN or infinite input.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> Option<i64> {
    if !kelvin.is_finite() {
        return None;
    }
    Some((kelvin * 9.0 / 5.0 - 459.67).round() as i64)
}

/// Nearest compass label for a wind bearing in degrees.
///
/// Each label owns a 22.5° sector centred on its bearing. Bearings outside
/// `[0, 360)` wrap. `None` for NaN or infinite input.
pub fn compass_direction(degrees: f64) -> Option<&'static str> {
    if !degrees.is_finite() {
        return None;
    }
    let sector = (degrees / SECTOR_DEGREES + 0.5).floor() as i64;
    let idx = sector.rem_euclid(COMPASS_POINTS.len() as i64) as usize;
    Some(COMPASS_POINTS[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_sample_converts_to_35f() {
        assert_eq!(kelvin_to_fahrenheit(274.81), Some(35));
    }

    #[test]
    fn kelvin_edge_values() {
        assert_eq!(kelvin_to_fahrenheit(273.15), Some(32));
        assert_eq!(kelvin_to_fahrenheit(0.0), Some(-460));
        assert_eq!(kelvin_to_fahrenheit(f64::NAN), None);
    }

    #[test]
    fn compass_known_bearings() {
        assert_eq!(compass_direction(0.0), Some("N"));
        assert_eq!(compass_direction(100.0), Some("E"));
        assert_eq!(compass_direction(103.0), Some("ESE"));
        assert_eq!(compass_direction(220.0), Some("SW"));
        assert_eq!(compass_direction(340.0), Some("NNW"));
    }

    #[test]
    fn compass_wraps_near_north() {
        assert_eq!(compass_direction(349.0), Some("N"));
        assert_eq!(compass_direction(359.9), Some("N"));
        assert_eq!(compass_direction(360.0), Some("N"));
        assert_eq!(compass_direction(-10.0), Some("N"));
        assert_eq!(compass_direction(-12.0), Some("NNW"));
    }

    #[test]
    fn compass_sector_boundaries_round_up() {
        assert_eq!(compass_direction(11.24), Some("N"));
        assert_eq!(compass_direction(11.25), Some("NNE"));
    }

    #[test]
    fn compass_rejects_non_finite() {
        assert_eq!(compass_direction(f64::INFINITY), None);
    }
}
