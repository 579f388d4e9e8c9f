// Degree <-> power mapping for the drive motors
//
// The regulator ramps a linear "degree" at a constant rate and maps it onto
// motor power through a cubic curve. The curve starts at the breakaway power,
// the minimum command magnitude that overcomes static friction.

/// Degrees closer to zero than this produce no power
pub const DEGREE_DEAD_ZONE: f32 = 0.05;

/// Minimum power magnitude that actually moves a motor
pub const BREAKAWAY_POWER: f32 = 0.3;

/// Share of the power range covered by the cubic part of the curve
const CURVE_GAIN: f32 = 1.0 - BREAKAWAY_POWER;

/// +1 for zero and positive values, -1 otherwise
fn sgn(n: f32) -> f32 {
    if n >= 0.0 { 1.0 } else { -1.0 }
}

/// Map a ramp degree to a motor power
///
/// Outside the dead zone: `degree³ · 0.7 ± 0.3`.
pub fn degree_to_power(degree: f32) -> f32 {
    if degree.abs() < DEGREE_DEAD_ZONE {
        0.0
    } else {
        degree * degree * degree * CURVE_GAIN + sgn(degree) * BREAKAWAY_POWER
    }
}

/// Map a motor power to the degree that produces it
///
/// Any power below the breakaway magnitude maps to rest, so the round trip
/// through [`degree_to_power`] is lossy there.
pub fn power_to_degree(power: f32) -> f32 {
    if power.abs() < BREAKAWAY_POWER {
        0.0
    } else {
        ((power - sgn(power) * BREAKAWAY_POWER) / CURVE_GAIN).cbrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    #[test]
    fn test_rest_maps_to_rest() {
        assert_eq!(degree_to_power(0.0), 0.0);
        assert_eq!(power_to_degree(0.0), 0.0);
    }

    #[test]
    fn test_degree_dead_zone() {
        for d in [0.049, -0.049, 0.01, -0.01, 0.0] {
            assert_eq!(degree_to_power(d), 0.0, "degree {} should be dead", d);
        }
        // Just outside the dead zone the breakaway power kicks in
        assert!(degree_to_power(0.05) >= BREAKAWAY_POWER);
        assert!(degree_to_power(-0.05) <= -BREAKAWAY_POWER);
    }

    #[test]
    fn test_power_dead_zone() {
        for p in [0.29, -0.29, 0.1, -0.1, 0.0001] {
            assert_eq!(power_to_degree(p), 0.0, "power {} should map to rest", p);
        }
    }

    #[test]
    fn test_full_power() {
        assert!((degree_to_power(1.0) - 1.0).abs() < TOLERANCE);
        assert!((degree_to_power(-1.0) + 1.0).abs() < TOLERANCE);
        assert!((power_to_degree(1.0) - 1.0).abs() < TOLERANCE);
        assert!((power_to_degree(-1.0) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_breakaway_maps_to_zero_degree() {
        // The inverse branch starts at the breakaway power, where the cubic term vanishes
        assert_eq!(power_to_degree(BREAKAWAY_POWER), 0.0);
        assert_eq!(power_to_degree(-BREAKAWAY_POWER), 0.0);
    }

    #[test]
    fn test_round_trip_above_breakaway() {
        let mut p = 0.3;
        while p <= 1.0 {
            for power in [p, -p] {
                let back = degree_to_power(power_to_degree(power));
                // Degrees inside the degree dead zone collapse to rest even above breakaway
                if power_to_degree(power).abs() >= DEGREE_DEAD_ZONE {
                    assert!(
                        (back - power).abs() < TOLERANCE,
                        "round trip of {} gave {}",
                        power,
                        back
                    );
                }
            }
            p += 0.01;
        }
    }

    #[test]
    fn test_round_trip_below_breakaway_collapses() {
        assert_eq!(degree_to_power(power_to_degree(0.2)), 0.0);
        assert_eq!(degree_to_power(power_to_degree(-0.25)), 0.0);
    }

    #[test]
    fn test_curve_is_odd_and_monotonic() {
        let mut previous = degree_to_power(0.05);
        let mut d = 0.06;
        while d <= 1.0 {
            let power = degree_to_power(d);
            assert!(power > previous);
            assert_eq!(degree_to_power(-d), -power);
            previous = power;
            d += 0.01;
        }
    }

    #[test]
    fn test_out_of_range_is_not_clamped() {
        // Powers beyond 1.0 are mapped by the same formulas
        let degree = power_to_degree(2.0);
        assert!(degree > 1.0);
        assert!((degree - (1.7f32 / 0.7).cbrt()).abs() < TOLERANCE);
        assert!((degree_to_power(degree) - 2.0).abs() < TOLERANCE);
        assert!(degree_to_power(-1.5) < -1.0);
    }
}
