use cgmath::Vector2;

use crate::{curve::{CurveType, PathNode}, math::{approach_time, circle_radius}, hit_objects::hit_window::HitWindow};

/// Index of a template inside [`Chart::objects`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Difficulty {
    pub circle_size: f32,
    pub approach_rate: f32,
    pub hp_drain_rate: f32,
    pub overall_difficulty: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            circle_size: 5.0,
            approach_rate: 5.0,
            hp_drain_rate: 10.0,
            overall_difficulty: 5.0,
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
        }
    }
}

impl Difficulty {
    /// Seconds
    pub fn approach_time(&self) -> f64 {
        approach_time(self.approach_rate)
    }

    pub fn circle_radius(&self) -> f64 {
        circle_radius(self.circle_size)
    }

    pub fn hit_window(&self) -> HitWindow {
        HitWindow::from_od(self.overall_difficulty)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct General {
    pub audio_filename: String,
    pub audio_lead_in: f64,
    pub preview_time: f64,
    pub background: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BreakPeriod {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ComboInfo {
    /// Index into the skin's combo colours
    pub colour_index: usize,
    /// Number drawn on the object, starting from 1
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliderTemplate {
    /// First node is the slider head
    pub path: Vec<PathNode>,
    pub curve: CurveType,
    /// Amount of spans, `1` means no reverse
    pub repeats: u32,
    /// Expected path length in playfield units
    pub length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinnerTemplate {
    pub required_spins: f64,
    pub resistance: f64,
    /// `None` means centered on the playfield
    pub position: Option<Vector2<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateKind {
    Note,
    Slider(SliderTemplate),
    Spinner(SpinnerTemplate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTemplate {
    pub start_time: f64,
    pub end_time: f64,
    pub pos: Vector2<f64>,
    pub new_combo: bool,
    pub combo_end: bool,
    pub combo: ComboInfo,
    pub kind: TemplateKind,
}

impl ObjectTemplate {
    pub fn note(start_time: f64, pos: Vector2<f64>) -> Self {
        Self {
            start_time,
            end_time: start_time,
            pos,
            new_combo: false,
            combo_end: false,
            combo: ComboInfo::default(),
            kind: TemplateKind::Note,
        }
    }

    pub fn slider(start_time: f64, end_time: f64, slider: SliderTemplate) -> Self {
        let pos = slider.path.first().map(|node| node.pos).unwrap_or(Vector2::new(0.0, 0.0));

        Self {
            start_time,
            end_time,
            pos,
            new_combo: false,
            combo_end: false,
            combo: ComboInfo::default(),
            kind: TemplateKind::Slider(slider),
        }
    }

    pub fn spinner(start_time: f64, end_time: f64, spinner: SpinnerTemplate) -> Self {
        Self {
            start_time,
            end_time,
            pos: spinner.position.unwrap_or(Vector2::new(0.0, 0.0)),
            new_combo: false,
            combo_end: false,
            combo: ComboInfo::default(),
            kind: TemplateKind::Spinner(spinner),
        }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Chart data model: map-wide parameters plus templates
/// kept in non-decreasing start time order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    pub general: General,
    pub metadata: Metadata,
    pub difficulty: Difficulty,
    pub breaks: Vec<BreakPeriod>,
    /// md5 hex digest of the file this chart was loaded from
    pub hash: Option<String>,

    objects: Vec<ObjectTemplate>,
}

impl Chart {
    /// Ordered placement, objects sharing a start time keep insertion order
    pub fn insert(&mut self, template: ObjectTemplate) -> TemplateId {
        let index = self.objects
            .partition_point(|x| x.start_time <= template.start_time);

        self.objects.insert(index, template);

        TemplateId(index)
    }

    #[inline]
    pub fn objects(&self) -> &[ObjectTemplate] {
        &self.objects
    }

    #[inline]
    pub fn get(&self, id: TemplateId) -> Option<&ObjectTemplate> {
        self.objects.get(id.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Latest end time among all objects
    pub fn end_time(&self) -> f64 {
        self.objects
            .iter()
            .map(|x| x.end_time)
            .fold(0.0, f64::max)
    }

    pub fn is_break(&self, time: f64) -> bool {
        self.breaks.iter().any(|b| time >= b.start && time <= b.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_at(time: f64) -> ObjectTemplate {
        ObjectTemplate::note(time, Vector2::new(0.0, 0.0))
    }

    fn assert_sorted(chart: &Chart) {
        assert!(chart.objects().windows(2).all(|w| w[0].start_time <= w[1].start_time));
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut chart = Chart::default();

        for time in [500.0, 100.0, 300.0, 300.0, 0.0, 1000.0, 100.0] {
            chart.insert(note_at(time));
            assert_sorted(&chart);
        }

        assert_eq!(chart.len(), 7);
        assert_eq!(chart.objects()[0].start_time, 0.0);
        assert_eq!(chart.end_time(), 1000.0);
    }

    #[test]
    fn test_insert_equal_times_after_existing() {
        let mut chart = Chart::default();

        let mut first = note_at(200.0);
        first.new_combo = true;
        chart.insert(first);

        let id = chart.insert(note_at(200.0));

        assert_eq!(id, TemplateId(1));
        assert!(chart.objects()[0].new_combo);
        assert!(!chart.objects()[1].new_combo);
    }

    #[test]
    fn test_breaks() {
        let chart = Chart {
            breaks: vec![BreakPeriod { start: 1000.0, end: 3000.0 }],
            ..Default::default()
        };

        assert!(chart.is_break(2000.0));
        assert!(!chart.is_break(3500.0));
    }
}
