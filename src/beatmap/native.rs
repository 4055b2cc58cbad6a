//! Native line format.
//!
//! ```text
//! # comment
//! title: Song
//! circle_size: 4
//! note <time> <x> <y> [new_combo]
//! slider <time> <end_time> <L|B|C|P> <repeats> <x:y[!]>... [length=<px>] [new_combo]
//! spinner <time> <end_time> <required_spins> [resistance] [x y] [new_combo]
//! break <start> <end>
//! ```
//!
//! Coordinates are playfield pixels like in `.osu` files, end times are
//! explicit so there's no timing table.

use std::str::FromStr;

use crate::{
    chart::{BreakPeriod, Chart, ObjectTemplate, SliderTemplate, SpinnerTemplate},
    curve::{CurveType, PathNode},
    math::{remap_length, remap_position},
};

use super::{assign_combos, build_chart, finite_or, LoadError};

const NEW_COMBO: &str = "new_combo";

#[derive(Debug, Default)]
struct Header {
    circle_size: Option<f32>,
    approach_rate: Option<f32>,
    overall_difficulty: Option<f32>,
    hp_drain_rate: Option<f32>,
    slider_multiplier: Option<f64>,
    slider_tick_rate: Option<f64>,
}

fn parse_number<T: FromStr>(token: Option<&str>, name: &str) -> Result<T, String> {
    let token = token.ok_or_else(|| format!("missing {name}"))?;
    token.parse().map_err(|_| format!("malformed {name} `{token}`"))
}

fn parse_float(token: Option<&str>, name: &str) -> Result<f64, String> {
    let value: f64 = parse_number(token, name)?;

    if !value.is_finite() {
        return Err(format!("non-finite {name} `{value}`"));
    }

    Ok(value)
}

/// Strips a trailing `new_combo` marker
fn take_new_combo<'a>(tokens: &mut Vec<&'a str>) -> bool {
    if tokens.last() == Some(&NEW_COMBO) {
        tokens.pop();
        return true;
    }

    false
}

pub fn parse(text: &str) -> Result<Chart, LoadError> {
    let _span = tracy_client::span!("native parse");

    let mut chart = Chart::default();
    let mut header = Header::default();
    let mut objects = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens: Vec<&str> = line.split_whitespace().collect();

        let object = match tokens[0] {
            "note" => {
                let new_combo = take_new_combo(&mut tokens);
                parse_note(&tokens[1..]).map(|x| (x, new_combo))
            }
            "slider" => {
                let new_combo = take_new_combo(&mut tokens);
                parse_slider(&tokens[1..]).map(|x| (x, new_combo))
            }
            "spinner" => {
                let new_combo = take_new_combo(&mut tokens);
                parse_spinner(&tokens[1..]).map(|x| (x, new_combo))
            }
            "break" => {
                match parse_break(&tokens[1..]) {
                    Ok(period) => chart.breaks.push(period),
                    Err(reason) => tracing::warn!("Skipping break at line {}: {reason}", i + 1),
                }

                continue;
            }
            _ => {
                if let Some((key, value)) = line.split_once(':') {
                    apply_key(key.trim(), value.trim(), &mut chart, &mut header);
                } else {
                    tracing::warn!("Skipping unknown line {}: `{line}`", i + 1);
                }

                continue;
            }
        };

        match object {
            Ok((mut object, new_combo)) => {
                object.new_combo = new_combo;
                objects.push(object);
            }
            Err(reason) => tracing::warn!("Skipping object at line {}: {reason}", i + 1),
        }
    }

    let defaults = chart.difficulty.clone();
    let overall_difficulty = finite_or(header.overall_difficulty, defaults.overall_difficulty);

    chart.difficulty.circle_size = finite_or(header.circle_size, defaults.circle_size);
    chart.difficulty.approach_rate = finite_or(header.approach_rate, overall_difficulty);
    chart.difficulty.overall_difficulty = overall_difficulty;
    chart.difficulty.hp_drain_rate = finite_or(header.hp_drain_rate, defaults.hp_drain_rate);
    chart.difficulty.slider_multiplier = finite_or(header.slider_multiplier, defaults.slider_multiplier);
    chart.difficulty.slider_tick_rate = finite_or(header.slider_tick_rate, defaults.slider_tick_rate);

    // No colour skips in this format
    assign_combos(&mut objects, &[]);

    build_chart(chart, objects)
}

fn apply_key(key: &str, value: &str, chart: &mut Chart, header: &mut Header) {
    fn number<T: FromStr>(key: &str, value: &str) -> Option<T> {
        let parsed = value.parse().ok();

        if parsed.is_none() {
            tracing::warn!("Malformed value for {key}: `{value}`, using default");
        }

        parsed
    }

    match key {
        "title" => chart.metadata.title = value.to_owned(),
        "artist" => chart.metadata.artist = value.to_owned(),
        "creator" => chart.metadata.creator = value.to_owned(),
        "version" => chart.metadata.version = value.to_owned(),
        "audio" => chart.general.audio_filename = value.to_owned(),
        "background" => chart.general.background = Some(value.to_owned()),
        "circle_size" => header.circle_size = number(key, value),
        "approach_rate" => header.approach_rate = number(key, value),
        "overall_difficulty" => header.overall_difficulty = number(key, value),
        "hp_drain_rate" => header.hp_drain_rate = number(key, value),
        "slider_multiplier" => header.slider_multiplier = number(key, value),
        "slider_tick_rate" => header.slider_tick_rate = number(key, value),
        _ => tracing::debug!("Ignoring unknown key `{key}`"),
    }
}

fn parse_break(args: &[&str]) -> Result<BreakPeriod, String> {
    let mut args = args.iter().copied();

    let start = parse_float(args.next(), "start")?;
    let end = parse_float(args.next(), "end")?;

    if end < start {
        return Err(format!("break ends before it starts: {start}..{end}"));
    }

    Ok(BreakPeriod { start, end })
}

fn parse_note(args: &[&str]) -> Result<ObjectTemplate, String> {
    let mut args = args.iter().copied();

    let time = parse_float(args.next(), "time")?;
    let x = parse_float(args.next(), "x")?;
    let y = parse_float(args.next(), "y")?;

    Ok(ObjectTemplate::note(time, remap_position(x, y)))
}

/// `x:y` with an optional trailing `!` for anchors
fn parse_node(token: &str) -> Result<PathNode, String> {
    let (point, anchor) = match token.strip_suffix('!') {
        Some(point) => (point, true),
        None => (token, false),
    };

    let (x, y) = point.split_once(':').ok_or_else(|| format!("malformed node `{token}`"))?;

    let x = parse_float(Some(x), "node x")?;
    let y = parse_float(Some(y), "node y")?;

    Ok(PathNode::new(remap_position(x, y), anchor))
}

fn parse_slider(args: &[&str]) -> Result<ObjectTemplate, String> {
    let mut args = args.iter().copied();

    let time = parse_float(args.next(), "time")?;
    let end_time = parse_float(args.next(), "end time")?;
    let curve = CurveType::from_letter(args.next().ok_or("missing curve type")?);
    let repeats: u32 = parse_number(args.next(), "repeats")?;

    let mut path = Vec::new();
    let mut length = None;

    for token in args {
        if let Some(px) = token.strip_prefix("length=") {
            length = Some(remap_length(parse_float(Some(px), "length")?));
            continue;
        }

        let mut node = parse_node(token)?;
        node.is_control_point |= curve == CurveType::Straight;
        path.push(node);
    }

    if path.len() < 2 {
        return Err("slider needs at least two nodes".to_owned());
    }

    if let Some(first) = path.first_mut() {
        first.is_control_point = true;
    }

    if let Some(last) = path.last_mut() {
        last.is_control_point = true;
    }

    Ok(ObjectTemplate::slider(
        time,
        end_time.max(time),
        SliderTemplate {
            path,
            curve,
            repeats: repeats.max(1),
            length,
        },
    ))
}

fn parse_spinner(args: &[&str]) -> Result<ObjectTemplate, String> {
    let mut args = args.iter().copied();

    let time = parse_float(args.next(), "time")?;
    let end_time = parse_float(args.next(), "end time")?;
    let required_spins = parse_float(args.next(), "required spins")?;

    let resistance = match args.next() {
        Some(token) => parse_float(Some(token), "resistance")?,
        None => 1.0,
    };

    let position = match (args.next(), args.next()) {
        (Some(x), Some(y)) => {
            let x = parse_float(Some(x), "x")?;
            let y = parse_float(Some(y), "y")?;
            Some(remap_position(x, y))
        }
        (None, None) => None,
        _ => return Err("spinner position needs both x and y".to_owned()),
    };

    Ok(ObjectTemplate::spinner(
        time,
        end_time.max(time),
        SpinnerTemplate {
            required_spins,
            resistance,
            position,
        },
    ))
}
