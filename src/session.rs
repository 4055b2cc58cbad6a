use crate::{chart::{Chart, Difficulty}, config::Config, hit_objects::hit_window::HitWindow, osu_input::OsuInput, skin_ini::SkinIni};

/// Timing and size values derived once from the chart difficulty
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlayParams {
    /// Milliseconds before start when an object shows up
    pub approach_ms: f64,
    pub fade_in_ms: f64,
    /// Note radius in playfield units
    pub radius: f64,
    pub hit_window: HitWindow,
    pub overall_difficulty: f32,
}

impl PlayParams {
    pub fn from_difficulty(difficulty: &Difficulty) -> Self {
        let approach_ms = difficulty.approach_time() * 1000.0;

        Self {
            approach_ms,
            fade_in_ms: approach_ms * 2.0 / 3.0,
            radius: difficulty.circle_radius(),
            hit_window: difficulty.hit_window(),
            overall_difficulty: difficulty.overall_difficulty,
        }
    }
}

/// Everything an object may look at during a frame.
///
/// Built fresh every frame by whoever drives the session, nothing in here
/// is global so several sessions can run side by side.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext<'a> {
    /// Milliseconds since the beginning of the map
    pub time: f64,
    pub chart: &'a Chart,
    pub params: &'a PlayParams,
    pub config: &'a Config,
    pub skin: &'a SkinIni,
    pub input: &'a OsuInput,
}

impl<'a> SessionContext<'a> {
    pub fn new(
        time: f64,
        chart: &'a Chart,
        params: &'a PlayParams,
        config: &'a Config,
        skin: &'a SkinIni,
        input: &'a OsuInput,
    ) -> Self {
        Self {
            time,
            chart,
            params,
            config,
            skin,
            input,
        }
    }
}
