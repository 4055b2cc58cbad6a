//! Beatmap loading.
//!
//! Two text formats end up in the same [`Chart`]: the `.osu` section format
//! and a small line based native format. The format is picked by the first
//! non-empty line.

pub mod native;
pub mod osu;
pub mod timing;

use std::{io, path::Path};

use thiserror::Error;

use crate::chart::{Chart, ComboInfo, ObjectTemplate};

const OSU_FILE_HEADER: &str = "osu file format v";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("reading beatmap file: `{0}`")]
    Io(#[from] io::Error),
    #[error("missing required section [{0}]")]
    MissingSection(&'static str),
    #[error("unsupported game mode `{0}`, only standard (0) can be played")]
    UnsupportedMode(u8),
    #[error("beatmap doesn't contain any playable objects")]
    Empty,
}

/// Reads and parses a beatmap, the chart gets the md5 digest of the file
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Chart, LoadError> {
    let path = path.as_ref();
    let _span = tracy_client::span!("beatmap load_from_path");

    let bytes = std::fs::read(path)?;
    let hash = format!("{:x}", md5::compute(&bytes));

    let text = String::from_utf8_lossy(&bytes);
    let mut chart = parse_str(&text)?;
    chart.hash = Some(hash);

    tracing::info!(
        "Loaded {} - {} [{}]: {} objects, {} breaks",
        chart.metadata.artist,
        chart.metadata.title,
        chart.metadata.version,
        chart.len(),
        chart.breaks.len(),
    );

    Ok(chart)
}

pub fn parse_str(text: &str) -> Result<Chart, LoadError> {
    let text = text.trim_start_matches('\u{feff}');

    let is_osu = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(OSU_FILE_HEADER));

    if is_osu {
        osu::parse(text)
    } else {
        native::parse(text)
    }
}

/// Header values that parsed to `nan` or `inf` count as absent
pub(crate) fn finite_or<T: Copy + Into<f64>>(value: Option<T>, default: T) -> T {
    value.filter(|x| (*x).into().is_finite()).unwrap_or(default)
}

/// Assigns combo colours and numbers in file order.
///
/// A new combo moves the colour by `1 + skip`, an object closes its combo
/// when the next one starts a new combo. The last object always closes one.
pub(crate) fn assign_combos(objects: &mut [ObjectTemplate], colour_skips: &[u32]) {
    let mut colour_index = 0;
    let mut number = 0;

    for i in 0..objects.len() {
        if i == 0 || objects[i].new_combo {
            if i > 0 {
                colour_index += 1 + colour_skips.get(i).copied().unwrap_or(0) as usize;
            }

            number = 0;
        }

        number += 1;

        let next_is_new_combo = objects.get(i + 1).map(|x| x.new_combo);

        let object = &mut objects[i];
        object.combo = ComboInfo { colour_index, number };
        object.combo_end = next_is_new_combo.unwrap_or(true);
    }
}

/// Inserts templates in file order, the chart keeps them sorted
pub(crate) fn build_chart(mut chart: Chart, objects: Vec<ObjectTemplate>) -> Result<Chart, LoadError> {
    if objects.is_empty() {
        return Err(LoadError::Empty);
    }

    for object in objects {
        chart.insert(object);
    }

    Ok(chart)
}
