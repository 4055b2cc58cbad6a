use crate::{chart::TemplateId, hit_objects::Hit};

/// One judgment per finished object, the score telemetry unit
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct JudgmentRecord {
    pub object: TemplateId,
    /// Time the judgment happened at, not the object start
    pub time: f64,
    pub hit: Hit,
}

#[derive(Default, Debug, Clone)]
pub struct JudgmentLog {
    records: Vec<JudgmentRecord>,
}

impl JudgmentLog {
    pub fn store(&mut self, record: JudgmentRecord) {
        self.records.push(record);
    }

    pub fn last(&self) -> Option<&JudgmentRecord> {
        self.records.last()
    }

    #[inline]
    pub fn records(&self) -> &[JudgmentRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HitStats {
    pub x300: u32,
    pub x100: u32,
    pub x50: u32,
    pub miss: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl HitStats {
    pub fn record(&mut self, hit: Hit) {
        match hit {
            Hit::X300 => self.x300 += 1,
            Hit::X100 => self.x100 += 1,
            Hit::X50 => self.x50 += 1,
            Hit::Miss => self.miss += 1,
        }

        if hit.is_miss() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.x300 + self.x100 + self.x50 + self.miss
    }

    /// osu! accuracy in `[0, 1]`, perfect when nothing was judged yet
    pub fn accuracy(&self) -> f64 {
        let total = self.total();

        if total == 0 {
            return 1.0;
        }

        let points = self.x300 * 300 + self.x100 * 100 + self.x50 * 50;

        points as f64 / (total as f64 * 300.0)
    }
}

impl FromIterator<Hit> for HitStats {
    fn from_iter<T: IntoIterator<Item = Hit>>(iter: T) -> Self {
        let mut stats = HitStats::default();

        for hit in iter {
            stats.record(hit);
        }

        stats
    }
}

#[test]
fn test_stats_combo_and_accuracy() {
    let stats: HitStats = [Hit::X300, Hit::X300, Hit::X100, Hit::Miss, Hit::X50]
        .into_iter()
        .collect();

    assert_eq!(stats.total(), 5);
    assert_eq!(stats.max_combo, 3);
    assert_eq!(stats.combo, 1);
    assert_eq!(stats.accuracy(), 750.0 / 1500.0);
    assert_eq!(HitStats::default().accuracy(), 1.0);
}
