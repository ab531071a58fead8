// ─── Temperature conversion at the HTTP boundary ─────────────

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_points() {
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
        assert_eq!(fahrenheit_to_celsius(212.0), 100.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
        assert_relative_eq!(celsius_to_fahrenheit(37.0), 98.6, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip() {
        for f in [-459.67, -40.0, 0.0, 32.0, 59.0, 68.0, 77.0, 140.5, 212.0, 1.0e4] {
            assert_relative_eq!(
                celsius_to_fahrenheit(fahrenheit_to_celsius(f)),
                f,
                epsilon = 1e-9,
                max_relative = 1e-12
            );
        }
    }
}
