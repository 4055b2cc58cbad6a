//! `.osu` section format

use std::str::FromStr;

use cgmath::Vector2;

use crate::{
    chart::{BreakPeriod, Chart, Difficulty, ObjectTemplate, SliderTemplate, SpinnerTemplate},
    config::CurveConfig,
    curve::{CurveType, PathNode, SliderPath},
    math::{diff_rate, remap_length, remap_position, OSU_PIXELS_PER_UNIT},
};

use super::{assign_combos, build_chart, finite_or, timing::{TimingPoint, TimingTable}, LoadError};

const TYPE_SLIDER: u32 = 1 << 1;
const TYPE_NEW_COMBO: u32 = 1 << 2;
const TYPE_SPINNER: u32 = 1 << 3;
const TYPE_COLOUR_SKIP: u32 = 0b111 << 4;
const TYPE_HOLD: u32 = 1 << 7;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Section {
    General,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    HitObjects,
    /// Everything we don't care about, `[Editor]`, `[Colours]` etc.
    Other,
}

impl Section {
    fn from_header(line: &str) -> Option<Self> {
        let name = line.strip_prefix('[')?.strip_suffix(']')?;

        Some(match name.trim() {
            "General" => Self::General,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "Events" => Self::Events,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Other,
        })
    }
}

#[derive(Debug)]
enum RawKind {
    Note,
    Slider {
        curve: CurveType,
        path: Vec<PathNode>,
        repeats: u32,
        pixel_length: Option<f64>,
    },
    Spinner {
        end_time: f64,
    },
}

/// Hit object line, timing dependent values are resolved
/// once the whole file was read
#[derive(Debug)]
struct RawObject {
    time: f64,
    pos: Vector2<f64>,
    new_combo: bool,
    colour_skip: u32,
    kind: RawKind,
}

/// Difficulty values as found in the file, defaults are applied in [`Self::finish`]
#[derive(Debug, Default)]
struct RawDifficulty {
    hp_drain_rate: Option<f32>,
    circle_size: Option<f32>,
    overall_difficulty: Option<f32>,
    approach_rate: Option<f32>,
    slider_multiplier: Option<f64>,
    slider_tick_rate: Option<f64>,
}

impl RawDifficulty {
    fn finish(self) -> Difficulty {
        let defaults = Difficulty::default();
        let overall_difficulty = finite_or(self.overall_difficulty, defaults.overall_difficulty);

        Difficulty {
            circle_size: finite_or(self.circle_size, defaults.circle_size),
            // Old maps don't have AR, it used to be the same as OD
            approach_rate: finite_or(self.approach_rate, overall_difficulty),
            hp_drain_rate: finite_or(self.hp_drain_rate, defaults.hp_drain_rate),
            overall_difficulty,
            slider_multiplier: finite_or(self.slider_multiplier, defaults.slider_multiplier),
            slider_tick_rate: finite_or(self.slider_tick_rate, defaults.slider_tick_rate),
        }
    }
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Malformed values are reported and dropped, so the default kicks in
fn parse_value<T: FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.parse().ok();

    if parsed.is_none() {
        tracing::warn!("Malformed value for {key}: `{value}`, using default");
    }

    parsed
}

pub fn parse(text: &str) -> Result<Chart, LoadError> {
    let _span = tracy_client::span!("osu parse");

    let mut chart = Chart::default();
    let mut difficulty = RawDifficulty::default();
    let mut timing = TimingTable::default();
    let mut raw_objects = Vec::new();

    let mut section = None;
    let mut has_hit_objects = false;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some(next) = Section::from_header(line) {
            has_hit_objects |= next == Section::HitObjects;
            section = Some(next);
            continue;
        }

        match section {
            Some(Section::General) => {
                let Some((key, value)) = split_key_value(line) else { continue };

                match key {
                    "AudioFilename" => chart.general.audio_filename = value.to_owned(),
                    "AudioLeadIn" => if let Some(x) = parse_value(key, value) { chart.general.audio_lead_in = x },
                    "PreviewTime" => if let Some(x) = parse_value(key, value) { chart.general.preview_time = x },
                    "Mode" => {
                        let mode = parse_value::<u8>(key, value).unwrap_or(0);

                        if mode != 0 {
                            return Err(LoadError::UnsupportedMode(mode));
                        }
                    }
                    _ => {}
                }
            }
            Some(Section::Metadata) => {
                let Some((key, value)) = split_key_value(line) else { continue };
                let metadata = &mut chart.metadata;

                match key {
                    "Title" => metadata.title = value.to_owned(),
                    "Artist" => metadata.artist = value.to_owned(),
                    "Creator" => metadata.creator = value.to_owned(),
                    "Version" => metadata.version = value.to_owned(),
                    _ => {}
                }
            }
            Some(Section::Difficulty) => {
                let Some((key, value)) = split_key_value(line) else { continue };

                match key {
                    "HPDrainRate" => difficulty.hp_drain_rate = parse_value(key, value),
                    "CircleSize" => difficulty.circle_size = parse_value(key, value),
                    "OverallDifficulty" => difficulty.overall_difficulty = parse_value(key, value),
                    "ApproachRate" => difficulty.approach_rate = parse_value(key, value),
                    "SliderMultiplier" => difficulty.slider_multiplier = parse_value(key, value),
                    "SliderTickRate" => difficulty.slider_tick_rate = parse_value(key, value),
                    _ => {}
                }
            }
            Some(Section::Events) => parse_event(line, &mut chart),
            Some(Section::TimingPoints) => match TimingPoint::parse(line) {
                Some(point) => timing.push(point),
                None => tracing::warn!("Skipping malformed timing point at line {}: `{line}`", i + 1),
            },
            Some(Section::HitObjects) => match parse_hit_object(line) {
                Ok(Some(object)) => raw_objects.push(object),
                Ok(None) => {}
                Err(reason) => tracing::warn!("Skipping hit object at line {}: {reason}", i + 1),
            },
            Some(Section::Other) | None => {}
        }
    }

    if !has_hit_objects {
        return Err(LoadError::MissingSection("HitObjects"));
    }

    chart.difficulty = difficulty.finish();

    let colour_skips: Vec<u32> = raw_objects.iter().map(|x| x.colour_skip).collect();
    let mut objects: Vec<ObjectTemplate> = raw_objects
        .into_iter()
        .map(|raw| resolve(raw, &chart.difficulty, &timing))
        .collect();

    assign_combos(&mut objects, &colour_skips);

    build_chart(chart, objects)
}

/// Background `0,0,"file",x,y` and breaks `2,start,end`
fn parse_event(line: &str, chart: &mut Chart) {
    let mut parts = line.split(',').map(str::trim);

    match parts.next() {
        Some("0") => {
            if let Some(file) = parts.nth(1) {
                chart.general.background = Some(file.trim_matches('"').to_owned());
            }
        }
        Some("2") | Some("Break") => {
            let start = parts.next().and_then(finite);
            let end = parts.next().and_then(finite);

            match (start, end) {
                (Some(start), Some(end)) if end >= start => {
                    chart.breaks.push(BreakPeriod { start, end });
                }
                _ => tracing::warn!("Skipping malformed break: `{line}`"),
            }
        }
        _ => {}
    }
}

fn parse_field<T: FromStr>(parts: &[&str], index: usize, name: &str) -> Result<T, String> {
    let value = parts.get(index).ok_or_else(|| format!("missing {name}"))?;

    value.trim().parse().map_err(|_| format!("malformed {name} `{value}`"))
}

/// Like `parse_field`, but `nan` and `inf` are malformed too
fn parse_float(parts: &[&str], index: usize, name: &str) -> Result<f64, String> {
    let value = parts.get(index).ok_or_else(|| format!("missing {name}"))?;

    finite(value).ok_or_else(|| format!("malformed {name} `{value}`"))
}

fn finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// `x,y,time,type,hitSound,objectParams...`
///
/// `Ok(None)` for objects that don't exist in standard mode
fn parse_hit_object(line: &str) -> Result<Option<RawObject>, String> {
    let parts: Vec<&str> = line.split(',').collect();

    let x = parse_float(&parts, 0, "x")?;
    let y = parse_float(&parts, 1, "y")?;
    let time = parse_float(&parts, 2, "time")?;
    let kind_bits: u32 = parse_field(&parts, 3, "type")?;

    if kind_bits & TYPE_HOLD != 0 {
        return Ok(None);
    }

    let pos = remap_position(x, y);

    let kind = if kind_bits & TYPE_SLIDER != 0 {
        parse_slider(&parts, (x, y))?
    } else if kind_bits & TYPE_SPINNER != 0 {
        let end_time = parse_float(&parts, 5, "spinner end time")?;

        RawKind::Spinner {
            end_time: end_time.max(time),
        }
    } else {
        RawKind::Note
    };

    Ok(Some(RawObject {
        time,
        pos,
        new_combo: kind_bits & TYPE_NEW_COMBO != 0,
        colour_skip: (kind_bits & TYPE_COLOUR_SKIP) >> 4,
        kind,
    }))
}

/// `curveType|curvePoints,slides,length,...`
fn parse_slider(parts: &[&str], head: (f64, f64)) -> Result<RawKind, String> {
    let curve_field = parts.get(5).ok_or("missing slider curve")?;
    let mut curve_parts = curve_field.split('|');

    let curve = CurveType::from_letter(curve_parts.next().unwrap_or_default());

    let mut raw_points = vec![head];

    for point in curve_parts {
        let (px, py) = point.split_once(':').ok_or_else(|| format!("malformed curve point `{point}`"))?;

        let px = finite(px).ok_or_else(|| format!("malformed curve point `{point}`"))?;
        let py = finite(py).ok_or_else(|| format!("malformed curve point `{point}`"))?;

        raw_points.push((px, py));
    }

    if raw_points.len() < 2 {
        return Err("slider has no curve points".to_owned());
    }

    let repeats = parts.get(6)
        .and_then(|x| x.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);

    let pixel_length = parts.get(7)
        .and_then(|x| finite(x))
        .filter(|x| *x > 0.0);

    Ok(RawKind::Slider {
        curve,
        path: build_path(curve, &raw_points),
        repeats,
        pixel_length,
    })
}

/// Head and tail are always anchors, straight paths are anchors only.
/// A point repeated twice splits a bezier into two segments
fn build_path(curve: CurveType, raw_points: &[(f64, f64)]) -> Vec<PathNode> {
    let mut path: Vec<PathNode> = Vec::with_capacity(raw_points.len());
    let mut previous: Option<(f64, f64)> = None;

    for &(x, y) in raw_points {
        if previous == Some((x, y)) {
            if let Some(last) = path.last_mut() {
                last.is_control_point = true;
            }

            continue;
        }

        previous = Some((x, y));
        path.push(PathNode::new(remap_position(x, y), curve == CurveType::Straight));
    }

    if let Some(first) = path.first_mut() {
        first.is_control_point = true;
    }

    if let Some(last) = path.last_mut() {
        last.is_control_point = true;
    }

    path
}

fn resolve(raw: RawObject, difficulty: &Difficulty, timing: &TimingTable) -> ObjectTemplate {
    let mut template = match raw.kind {
        RawKind::Note => ObjectTemplate::note(raw.time, raw.pos),
        RawKind::Slider { curve, path, repeats, pixel_length } => {
            // No length means the natural length of the curve
            let pixel_length = pixel_length.unwrap_or_else(|| {
                SliderPath::bake(curve, &path, None, &CurveConfig::default()).length() * OSU_PIXELS_PER_UNIT
            });

            let duration = timing.slider_duration(raw.time, pixel_length, difficulty.slider_multiplier, repeats);

            ObjectTemplate::slider(
                raw.time,
                raw.time + duration,
                SliderTemplate {
                    path,
                    curve,
                    repeats,
                    length: Some(remap_length(pixel_length)),
                },
            )
        }
        RawKind::Spinner { end_time } => {
            let duration_s = (end_time - raw.time) / 1000.0;
            let spins_per_second = diff_rate(difficulty.overall_difficulty, 3.0, 5.0, 7.5) as f64;

            ObjectTemplate::spinner(
                raw.time,
                end_time,
                SpinnerTemplate {
                    required_spins: (duration_s * spins_per_second).floor(),
                    resistance: 1.0,
                    position: None,
                },
            )
        }
    };

    template.new_combo = raw.new_combo;
    template
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::chart::TemplateKind;

    const MAP: &str = "osu file format v14

[General]
AudioFilename: audio.mp3
AudioLeadIn: 0
PreviewTime: 1000
Mode: 0

[Editor]
DistanceSpacing: 1.2

[Metadata]
Title:Test
Artist:Someone
Creator:Mapper
Version:Hard

[Difficulty]
HPDrainRate:6
CircleSize:4
OverallDifficulty:5
SliderMultiplier:1
SliderTickRate:1

[Events]
//Background and Video events
0,0,\"bg.jpg\",0,0
2,5000,6000

[TimingPoints]
0,500,4,2,0,100,1,0
0,-100,4,2,0,100,0,0

[HitObjects]
256,192,1000,5,0,0:0:0:0:
356,192,2000,2,0,L|456:192,1,100
100,100,3000,1,0,0:0:0:0:
256,192,4000,12,0,6000,0:0:0:0:
";

    #[test]
    fn test_parse_full_map() {
        let chart = parse(MAP).unwrap();

        assert_eq!(chart.metadata.title, "Test");
        assert_eq!(chart.metadata.version, "Hard");
        assert_eq!(chart.general.audio_filename, "audio.mp3");
        assert_eq!(chart.general.background.as_deref(), Some("bg.jpg"));
        assert_eq!(chart.breaks, vec![BreakPeriod { start: 5000.0, end: 6000.0 }]);

        // No AR, falls back to OD
        assert_eq!(chart.difficulty.approach_rate, 5.0);
        assert_eq!(chart.difficulty.circle_size, 4.0);

        assert_eq!(chart.len(), 4);

        let slider = &chart.objects()[1];
        assert_relative_eq!(slider.end_time, 2500.0);

        let TemplateKind::Slider(inner) = &slider.kind else {
            panic!("expected a slider");
        };

        assert_eq!(inner.curve, CurveType::Straight);
        assert_eq!(inner.path.len(), 2);
        assert_relative_eq!(inner.length.unwrap_or_default(), 100.0 / 256.0);

        let spinner = &chart.objects()[3];
        let TemplateKind::Spinner(inner) = &spinner.kind else {
            panic!("expected a spinner");
        };

        assert_eq!(inner.required_spins, 10.0);
        assert!(spinner.new_combo);
    }

    #[test]
    fn test_combo_ends() {
        let chart = parse(MAP).unwrap();
        let ends: Vec<bool> = chart.objects().iter().map(|x| x.combo_end).collect();

        assert_eq!(ends, vec![false, false, true, true]);
    }

    #[test]
    fn test_difficulty_defaults() {
        let map = "osu file format v14\n[Difficulty]\nCircleSize:abc\n[HitObjects]\n256,192,1000,1,0\n";
        let chart = parse(map).unwrap();

        assert_eq!(chart.difficulty, Difficulty::default());
    }

    #[test]
    fn test_other_modes_are_rejected() {
        let map = "osu file format v14\n[General]\nMode: 3\n[HitObjects]\n256,192,1000,1,0\n";
        assert!(matches!(parse(map), Err(LoadError::UnsupportedMode(3))));
    }

    #[test]
    fn test_empty_and_malformed_objects() {
        let map = "osu file format v14\n[HitObjects]\nnot,an,object\n";
        assert!(matches!(parse(map), Err(LoadError::Empty)));
    }

    #[test]
    fn test_unknown_curve_letter_is_straight() {
        let map = "osu file format v14\n[HitObjects]\n0,0,1000,2,0,X|100:0,1,100\n";
        let chart = parse(map).unwrap();

        let TemplateKind::Slider(slider) = &chart.objects()[0].kind else {
            panic!("expected a slider");
        };

        assert_eq!(slider.curve, CurveType::Straight);
    }

    #[test]
    fn test_repeated_point_becomes_anchor() {
        let path = build_path(
            CurveType::Bezier,
            &[(0.0, 0.0), (50.0, 50.0), (100.0, 0.0), (100.0, 0.0), (150.0, 50.0), (200.0, 0.0)],
        );

        let anchors: Vec<bool> = path.iter().map(|x| x.is_control_point).collect();
        assert_eq!(anchors, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_slider_without_length_uses_curve_length() {
        let map = "osu file format v14\n[Difficulty]\nSliderMultiplier:1\n[TimingPoints]\n0,500,4,2,0,100,1,0\n[HitObjects]\n0,0,1000,2,0,L|100:0,1\n";
        let chart = parse(map).unwrap();

        let slider = &chart.objects()[0];
        assert_relative_eq!(slider.end_time, 1500.0, epsilon = 1e-6);

        let TemplateKind::Slider(inner) = &slider.kind else {
            panic!("expected a slider");
        };

        assert_relative_eq!(inner.length.unwrap_or_default(), 100.0 / 256.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let map = "osu file format v14
[Difficulty]
CircleSize:nan
OverallDifficulty:inf
SliderMultiplier:1
[Events]
2,nan,6000
[TimingPoints]
0,500,4,2,0,100,1,0
[HitObjects]
256,192,1000,1,0
256,192,nan,1,0
nan,192,1500,1,0
256,inf,1600,1,0
0,0,1700,2,0,L|inf:0,1,100
0,0,1800,2,0,L|100:0,1,inf
256,192,1900,12,0,inf
256,192,2000,1,0
";
        let chart = parse(map).unwrap();

        assert_eq!(chart.difficulty.circle_size, Difficulty::default().circle_size);
        assert_eq!(chart.difficulty.overall_difficulty, Difficulty::default().overall_difficulty);
        assert!(chart.breaks.is_empty());

        let times: Vec<f64> = chart.objects().iter().map(|x| x.start_time).collect();
        assert_eq!(times, vec![1000.0, 1800.0, 2000.0]);

        for object in chart.objects() {
            assert!(object.end_time.is_finite());
            assert!(object.pos.x.is_finite() && object.pos.y.is_finite());
        }

        // Infinite length falls back to the curve itself
        assert_relative_eq!(chart.objects()[1].end_time, 2300.0, epsilon = 1e-6);
    }
}
