use std::path::PathBuf;

use approx::assert_relative_eq;
use rosu::{
    beatmap::{self, LoadError},
    chart::{Chart, TemplateKind},
    curve::CurveType,
};
use test_case::case;
use testdir::testdir;

fn data_path(file: &str) -> PathBuf {
    PathBuf::from("tests/data/").join(file)
}

#[test]
fn test_native_and_section_formats_agree() {
    let mut section = beatmap::load_from_path(data_path("gameplay/mixed.osu")).unwrap();
    let mut native = beatmap::load_from_path(data_path("gameplay/mixed.txt")).unwrap();

    assert_ne!(section.hash, native.hash);

    section.hash = None;
    native.hash = None;

    assert_eq!(section, native);
}

#[test]
fn test_mixed_map_contents() {
    let chart = beatmap::load_from_path(data_path("gameplay/mixed.osu")).unwrap();

    assert_eq!(chart.len(), 7);
    assert_eq!(chart.metadata.title, "Mixed");
    assert_eq!(chart.general.background.as_deref(), Some("bg.png"));
    assert!(chart.is_break(7000.0));

    let hash = chart.hash.as_deref().unwrap_or_default();
    assert_eq!(hash.len(), 32);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

    let slider = &chart.objects()[2];
    assert_relative_eq!(slider.end_time, 2400.0);

    let colours: Vec<usize> = chart.objects().iter().map(|x| x.combo.colour_index).collect();
    assert_eq!(colours, vec![0, 0, 0, 1, 2, 2, 2]);

    let TemplateKind::Spinner(spinner) = &chart.objects()[3].kind else {
        panic!("expected a spinner");
    };

    // 2 seconds at OD8
    assert_eq!(spinner.required_spins, 13.0);
}

#[case("other/mania.osu" => matches Err(LoadError::UnsupportedMode(3)) ; "other game mode")]
#[case("other/no_objects.osu" => matches Err(LoadError::MissingSection("HitObjects")) ; "no hit objects section")]
#[case("other/does_not_exist.osu" => matches Err(LoadError::Io(_)) ; "missing file")]
#[case("other/slider_with_reverse.osu" => matches Ok(_) ; "valid")]
fn test_load_results(file: &str) -> Result<Chart, LoadError> {
    beatmap::load_from_path(data_path(file))
}

#[test]
fn test_unreadable_path() {
    let dir = testdir!();

    // A directory can't be read as a file
    assert!(matches!(beatmap::load_from_path(&dir), Err(LoadError::Io(_))));
    assert!(matches!(beatmap::load_from_path(dir.join("missing.osu")), Err(LoadError::Io(_))));
}

#[test]
fn test_slider_duration_from_timing_points() {
    let dir = testdir!();
    let path = dir.join("duration.osu");

    std::fs::write(
        &path,
        "osu file format v14

[Difficulty]
SliderMultiplier:1

[TimingPoints]
0,500,4,2,0,100,1,0
0,-100,4,2,0,100,0,0

[HitObjects]
0,0,0,2,0,L|100:0,1,100
",
    )
    .unwrap();

    let chart = beatmap::load_from_path(&path).unwrap();
    let slider = &chart.objects()[0];

    assert_relative_eq!(slider.duration(), 500.0);
    assert!(slider.combo_end);
}

#[test]
fn test_unknown_curve_loads_as_straight() {
    let chart = beatmap::load_from_path(data_path("other/unknown_curve.osu")).unwrap();

    let TemplateKind::Slider(slider) = &chart.objects()[0].kind else {
        panic!("expected a slider");
    };

    assert_eq!(slider.curve, CurveType::Straight);
    assert!(slider.path.iter().all(|x| x.is_control_point));
}

#[test]
fn test_native_file_roundtrip_through_disk() {
    let dir = testdir!();
    let path = dir.join("map.txt");

    std::fs::write(&path, "title: Disk\nnote 500 256 192\nnote 250 0 0 new_combo\n").unwrap();

    let chart = beatmap::load_from_path(&path).unwrap();

    assert_eq!(chart.metadata.title, "Disk");
    assert_eq!(chart.objects()[0].start_time, 250.0);
    assert!(chart.hash.is_some());
}
