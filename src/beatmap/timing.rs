/// Beat length used when a map has no uninherited timing points
pub const DEFAULT_BEAT_LENGTH: f64 = 500.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimingPoint {
    pub time: f64,
    /// Milliseconds per beat for uninherited points, negative
    /// velocity percentage for inherited ones
    pub beat_length: f64,
    pub meter: u32,
    pub uninherited: bool,
}

impl TimingPoint {
    /// `time,beatLength,meter,sampleSet,sampleIndex,volume,uninherited,effects`
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split(',').map(str::trim);

        let time: f64 = parts.next()?.parse().ok()?;
        let beat_length: f64 = parts.next()?.parse().ok()?;

        if !time.is_finite() || !beat_length.is_finite() {
            return None;
        }

        let meter = parts.next()
            .and_then(|x| x.parse().ok())
            .unwrap_or(4);

        // sampleSet, sampleIndex, volume
        let mut rest = parts.skip(3);

        let uninherited = match rest.next() {
            Some(flag) => flag == "1",
            None => beat_length > 0.0,
        };

        if uninherited && beat_length <= 0.0 {
            return None;
        }

        Some(Self {
            time,
            beat_length,
            meter,
            uninherited,
        })
    }

    /// Slider velocity multiplier, always `1` for uninherited points
    pub fn slider_velocity(&self) -> f64 {
        if self.uninherited || self.beat_length >= 0.0 {
            return 1.0;
        }

        (100.0 / -self.beat_length).clamp(0.1, 10.0)
    }
}

/// Timing points ordered by time, only alive while a beatmap is being loaded
#[derive(Debug, Default, Clone)]
pub struct TimingTable {
    points: Vec<TimingPoint>,
}

impl TimingTable {
    /// Points sharing a time keep their file order
    pub fn push(&mut self, point: TimingPoint) {
        let index = self.points.partition_point(|x| x.time <= point.time);
        self.points.insert(index, point);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last point at or before `time`, otherwise the first one
    fn active_point<'a, I>(points: I, time: f64) -> Option<&'a TimingPoint>
    where
        I: Iterator<Item = &'a TimingPoint> + Clone,
    {
        points.clone()
            .take_while(|x| x.time <= time)
            .last()
            .or_else(|| points.clone().next())
    }

    pub fn beat_length_at(&self, time: f64) -> f64 {
        let uninherited = self.points.iter().filter(|x| x.uninherited);

        Self::active_point(uninherited, time)
            .map(|x| x.beat_length)
            .unwrap_or(DEFAULT_BEAT_LENGTH)
    }

    /// A later uninherited point resets the velocity back to `1`
    pub fn slider_velocity_at(&self, time: f64) -> f64 {
        Self::active_point(self.points.iter(), time)
            .map(TimingPoint::slider_velocity)
            .unwrap_or(1.0)
    }

    /// Slider duration in milliseconds for a raw pixel length
    pub fn slider_duration(&self, time: f64, pixel_length: f64, slider_multiplier: f64, repeats: u32) -> f64 {
        let velocity = slider_multiplier * 100.0 * self.slider_velocity_at(time);

        if velocity <= 0.0 {
            return 0.0;
        }

        pixel_length / velocity * self.beat_length_at(time) * repeats as f64
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use test_case::case;

    use super::*;

    fn table(lines: &[&str]) -> TimingTable {
        let mut table = TimingTable::default();

        for line in lines {
            if let Some(point) = TimingPoint::parse(line) {
                table.push(point);
            }
        }

        table
    }

    #[test]
    fn test_slider_duration_single_beat() {
        let table = table(&["0,500,4,2,0,100,1,0", "0,-100,4,2,0,100,0,0"]);

        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.slider_duration(0.0, 100.0, 1.0, 1), 500.0);
    }

    #[case(-50.0, 2.0 ; "double speed")]
    #[case(-200.0, 0.5 ; "half speed")]
    #[case(-5.0, 10.0 ; "clamped high")]
    #[case(-10000.0, 0.1 ; "clamped low")]
    fn test_slider_velocity(beat_length: f64, expected: f64) {
        let point = TimingPoint {
            time: 0.0,
            beat_length,
            meter: 4,
            uninherited: false,
        };

        assert_relative_eq!(point.slider_velocity(), expected);
    }

    #[test]
    fn test_lookup_falls_back_to_first_point() {
        let table = table(&["1000,300,4,2,0,100,1,0", "2000,-50,4,2,0,100,0,0", "3000,400,4,2,0,100,1,0"]);

        assert_eq!(table.beat_length_at(0.0), 300.0);
        assert_eq!(table.beat_length_at(2500.0), 300.0);
        assert_eq!(table.beat_length_at(3000.0), 400.0);

        assert_eq!(table.slider_velocity_at(2500.0), 2.0);
        assert_eq!(table.slider_velocity_at(3500.0), 1.0);
    }

    #[test]
    fn test_empty_table_defaults() {
        let table = TimingTable::default();

        assert_eq!(table.beat_length_at(100.0), DEFAULT_BEAT_LENGTH);
        assert_eq!(table.slider_velocity_at(100.0), 1.0);
    }

    #[test]
    fn test_legacy_line_without_flag() {
        let point = TimingPoint::parse("100,-50").unwrap();
        assert!(!point.uninherited);

        let point = TimingPoint::parse("100,333.33").unwrap();
        assert!(point.uninherited);
        assert_eq!(point.meter, 4);

        assert!(TimingPoint::parse("abc,1").is_none());
    }
}
