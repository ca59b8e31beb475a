use crate::api::RowError;

/// Validated experience values for one spell and the derived percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReading {
    pub current_xp: f32,
    pub required_xp: f32,
    /// `clamp(round(current / required * 100), 0, 100)`
    pub percent: u8,
}

impl ProgressReading {
    pub fn compute(current_xp: f32, required_xp: f32) -> Result<Self, RowError> {
        if !current_xp.is_finite() || !required_xp.is_finite() {
            return Err(RowError::NonFinite);
        }
        if current_xp < 0.0 {
            return Err(RowError::NegativeCurrent {
                current: current_xp,
            });
        }
        if required_xp <= 0.0 {
            return Err(RowError::NonPositiveRequired {
                required: required_xp,
            });
        }

        let ratio = f64::from(current_xp) / f64::from(required_xp) * 100.0;
        let percent = ratio.round().clamp(0.0, 100.0) as u8;

        Ok(Self {
            current_xp,
            required_xp,
            percent,
        })
    }

    pub fn display_name(&self, original: &str) -> String {
        progress_display_name(original, self.percent)
    }
}

/// `Name` at zero progress, `Name (N%)` otherwise.
pub fn progress_display_name(original: &str, percent: u8) -> String {
    if percent == 0 {
        original.to_string()
    } else {
        format!("{original} ({percent}%)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_to_nearest() {
        assert_eq!(ProgressReading::compute(42.0, 100.0).unwrap().percent, 42);
        assert_eq!(ProgressReading::compute(1.0, 3.0).unwrap().percent, 33);
        assert_eq!(ProgressReading::compute(2.0, 3.0).unwrap().percent, 67);
        assert_eq!(ProgressReading::compute(0.3, 100.0).unwrap().percent, 0);
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(ProgressReading::compute(250.0, 100.0).unwrap().percent, 100);
        assert_eq!(ProgressReading::compute(0.0, 5.0).unwrap().percent, 0);
    }

    #[test]
    fn test_percent_matches_formula_over_grid() {
        for required in [1.0_f32, 7.0, 40.0, 333.0, 1000.0] {
            for step in 0..=60 {
                let current = required * step as f32 / 40.0;
                let expected = (f64::from(current) / f64::from(required) * 100.0)
                    .round()
                    .clamp(0.0, 100.0) as u8;
                assert_eq!(
                    ProgressReading::compute(current, required).unwrap().percent,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_invalid_rows_are_rejected() {
        assert_eq!(
            ProgressReading::compute(-1.0, 10.0),
            Err(RowError::NegativeCurrent { current: -1.0 })
        );
        assert_eq!(
            ProgressReading::compute(1.0, 0.0),
            Err(RowError::NonPositiveRequired { required: 0.0 })
        );
        assert_eq!(
            ProgressReading::compute(f32::NAN, 10.0),
            Err(RowError::NonFinite)
        );
        assert_eq!(
            ProgressReading::compute(1.0, f32::INFINITY),
            Err(RowError::NonFinite)
        );
    }

    #[test]
    fn test_display_name_formats() {
        assert_eq!(progress_display_name("Fireblast", 0), "Fireblast");
        assert_eq!(progress_display_name("Fireblast", 42), "Fireblast (42%)");
        assert_eq!(progress_display_name("Fireblast", 100), "Fireblast (100%)");

        let reading = ProgressReading::compute(10.0, 40.0).unwrap();
        assert_eq!(reading.display_name("Ice Lance"), "Ice Lance (25%)");
    }
}
