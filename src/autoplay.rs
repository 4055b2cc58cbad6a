use std::f64::consts::PI;

use cgmath::Vector2;

use crate::{
    audio::CueSink,
    chart::{Chart, TemplateKind},
    config::Config,
    hit_objects::HitObjectKind,
    osu_input::{InputTracker, KeysDown, OsuInput},
    processor::StandardProcessor,
    session::{PlayParams, SessionContext},
    skin_ini::SkinIni,
};

/// Rotations per second while spinning
const SPIN_RATE: f64 = 10.0;
/// Distance of the cursor from the spinner center
const SPIN_RADIUS: f64 = 0.2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Key {
    K1,
    K2,
}

impl Key {
    fn other(self) -> Self {
        match self {
            Key::K1 => Key::K2,
            Key::K2 => Key::K1,
        }
    }

    fn down(self) -> KeysDown {
        match self {
            Key::K1 => KeysDown { k1: true, ..Default::default() },
            Key::K2 => KeysDown { k2: true, ..Default::default() },
        }
    }
}

/// Plays a chart perfectly: taps notes on time alternating keys,
/// follows slider balls and spins spinners
#[derive(Debug)]
pub struct Autoplay {
    tracker: InputTracker,
    last_key: Key,
    holding: Option<Key>,
}

impl Default for Autoplay {
    fn default() -> Self {
        Self {
            tracker: InputTracker::default(),
            last_key: Key::K2,
            holding: None,
        }
    }
}

impl Autoplay {
    fn press_next(&mut self) -> KeysDown {
        let key = self.last_key.other();
        self.last_key = key;
        key.down()
    }

    fn hold(&mut self) -> KeysDown {
        match self.holding {
            Some(key) => key.down(),
            None => {
                let down = self.press_next();
                self.holding = Some(self.last_key);
                down
            }
        }
    }

    /// Input for `time`, decided from the object states of the previous frame
    pub fn frame(&mut self, time: f64, chart: &Chart, processor: &StandardProcessor) -> &OsuInput {
        let objects = processor.objects();

        let target = objects
            .iter()
            .enumerate()
            .skip(processor.cursor())
            .find(|(_, x)| !x.is_judged());

        let Some((index, object)) = target else {
            self.holding = None;
            return self.tracker.frame(KeysDown::default());
        };

        let Some(template) = chart.objects().get(index) else {
            self.holding = None;
            return self.tracker.frame(KeysDown::default());
        };

        let started = time >= template.start_time;

        let (pos, keys) = match (&template.kind, &object.kind) {
            (TemplateKind::Slider(_), HitObjectKind::Slider(slider)) => {
                let pos = slider.position_at_time(template, time);
                (pos, if started { self.hold() } else { KeysDown::default() })
            }
            (TemplateKind::Spinner(_), _) => {
                let angle = (time - template.start_time) / 1000.0 * SPIN_RATE * 2.0 * PI;
                let pos = template.pos + Vector2::new(angle.cos(), angle.sin()) * SPIN_RADIUS;
                (pos, if started { self.hold() } else { KeysDown::default() })
            }
            _ => {
                self.holding = None;
                (template.pos, if started { self.press_next() } else { KeysDown::default() })
            }
        };

        if !started {
            self.holding = None;
        }

        self.tracker.set_cursor_pos(pos);
        self.tracker.frame(keys)
    }
}

/// Runs a whole chart through the judge loop with autoplay input,
/// one frame every `frame_ms` milliseconds
pub fn run_session(
    chart: &Chart,
    config: &Config,
    skin: &SkinIni,
    frame_ms: f64,
    cues: &mut dyn CueSink,
) -> StandardProcessor {
    let _span = tracy_client::span!("autoplay run_session");

    let params = PlayParams::from_difficulty(&chart.difficulty);
    let mut processor = StandardProcessor::new(chart, config);
    let mut autoplay = Autoplay::default();

    let first = chart.objects().first().map(|x| x.start_time).unwrap_or(0.0);
    let mut time = first - params.approach_ms - frame_ms;

    // Everything is long gone by then, even if some fade out never ends
    let last = chart.end_time() + params.approach_ms + 10_000.0;

    let mut frames = 0usize;

    while !processor.is_done() && time <= last {
        let input = autoplay.frame(time, chart, &processor);
        let ctx = SessionContext::new(time, chart, &params, config, skin, input);

        processor.update(&ctx, cues);

        time += frame_ms;
        frames += 1;
    }

    tracing::debug!("Autoplay finished after {frames} frames at {time:.0}ms");

    processor
}
