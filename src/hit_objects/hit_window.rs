use super::Hit;

/// Timing windows in milliseconds, measured on either side of the start
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitWindow {
    pub x300: f64,
    pub x100: f64,
    pub x50: f64,
}

impl HitWindow {
    pub fn from_od(od: f32) -> Self {
        HitWindow {
            x300: 80.0 - 6.0 * (od as f64),
            x100: 140.0 - 8.0 * (od as f64),
            x50: 200.0 - 10.0 * (od as f64),
        }
    }

    /// Outermost window, rounded like in [`HitWindow::judge`]. Activation is
    /// only possible strictly inside of it
    #[inline]
    pub fn hittable(&self) -> f64 {
        self.x50.round()
    }

    /// Judges an absolute hit error
    pub fn judge(&self, hit_error: f64) -> Hit {
        let hit_error = hit_error.abs();

        if hit_error < self.x300.round() {
            return Hit::X300;
        }

        if hit_error < self.x100.round() {
            return Hit::X100;
        }

        if hit_error < self.x50.round() {
            return Hit::X50;
        }

        Hit::Miss
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::from_od(5.0)
    }
}

#[cfg(test)]
mod tests {
    use test_case::case;

    use super::*;

    #[case(0.0, Hit::X300 ; "perfect")]
    #[case(-49.0, Hit::X300 ; "early inside 300")]
    #[case(50.0, Hit::X100 ; "on the 300 edge")]
    #[case(99.0, Hit::X100 ; "late inside 100")]
    #[case(-149.0, Hit::X50 ; "early inside 50")]
    #[case(150.0, Hit::Miss ; "outside")]
    fn test_judge_od5(hit_error: f64, expected: Hit) {
        assert_eq!(HitWindow::from_od(5.0).judge(hit_error), expected);
    }
}
