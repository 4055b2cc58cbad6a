use judgment_log::{HitStats, JudgmentLog, JudgmentRecord};
use smallvec::SmallVec;

use crate::{
    audio::CueSink,
    chart::{Chart, TemplateId},
    config::Config,
    hit_objects::{HitObject, ObjectState},
    render::DrawRequest,
    session::SessionContext,
};

pub mod judgment_log;

/// What happened during a single [`StandardProcessor::update`]
#[derive(Debug, Default, Clone)]
pub struct FrameReport {
    /// Indexes of every object that got updated, in scan order
    pub scanned: SmallVec<[usize; 16]>,
    /// At most one activation per frame
    pub activated: Option<usize>,
    pub judged: Vec<JudgmentRecord>,
}

/// Standard mode judge loop.
///
/// Runtime objects are kept in the chart's start time order. Everything
/// before `cursor` is fully elapsed and never looked at again, scanning stops
/// at the first object that isn't visible yet.
pub struct StandardProcessor {
    objects: Vec<HitObject>,
    cursor: usize,
    log: JudgmentLog,
    stats: HitStats,
}

impl StandardProcessor {
    pub fn new(chart: &Chart, config: &Config) -> Self {
        let _span = tracy_client::span!("processor new");

        let objects: Vec<HitObject> = chart
            .objects()
            .iter()
            .enumerate()
            .map(|(i, template)| HitObject::new(TemplateId(i), template, config))
            .collect();

        tracing::debug!("Prepared {} objects", objects.len());

        Self {
            objects,
            cursor: 0,
            log: JudgmentLog::default(),
            stats: HitStats::default(),
        }
    }

    #[inline]
    pub fn objects(&self) -> &[HitObject] {
        &self.objects
    }

    /// Index of the first object that isn't fully elapsed yet
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn log(&self) -> &JudgmentLog {
        &self.log
    }

    #[inline]
    pub fn stats(&self) -> &HitStats {
        &self.stats
    }

    /// Every object went through its fade out
    #[inline]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.objects.len()
    }

    fn advance_cursor(&mut self) {
        while self.cursor < self.objects.len() && self.objects[self.cursor].is_finished() {
            self.cursor += 1;
        }
    }

    pub fn update(&mut self, ctx: &SessionContext, cues: &mut dyn CueSink) -> FrameReport {
        let _span = tracy_client::span!("processor update");

        let mut report = FrameReport::default();
        let mut index = self.cursor;

        while index < self.objects.len() {
            // Finished while an earlier object is still going
            if self.objects[index].is_finished() {
                index += 1;
                continue;
            }

            let object = &mut self.objects[index];
            object.update(ctx, cues);
            report.scanned.push(index);

            match object.state() {
                ObjectState::Invisible if object.is_finished() => {
                    if index == self.cursor {
                        self.advance_cursor();
                        index = self.cursor;
                    } else {
                        index += 1;
                    }

                    continue;
                }
                ObjectState::Invisible => break,
                ObjectState::Ready => {
                    if object.can_activate(ctx) {
                        object.activate(ctx, cues);
                        report.activated = Some(index);

                        if object.state() == ObjectState::Pickup {
                            judge(object, ctx, cues, &mut self.log, &mut self.stats, &mut report);
                        }

                        break;
                    }
                }
                ObjectState::Active => {
                    if !object.hit_test(ctx) || !ctx.input.is_keys_hold() {
                        object.deactivate(ctx, cues);
                    }
                }
                ObjectState::Inactive => {
                    if object.hit_test(ctx) && ctx.input.is_keys_hold() {
                        object.reactivate(ctx, cues);
                    }
                }
                ObjectState::Pickup => {
                    judge(object, ctx, cues, &mut self.log, &mut self.stats, &mut report);
                }
                ObjectState::Approaching | ObjectState::Fading => {}
            }

            index += 1;
        }

        report
    }

    /// Render requests for everything between the cursor and the first
    /// object that isn't visible yet. Earlier objects end up on top
    pub fn draw(&self, ctx: &SessionContext, out: &mut Vec<DrawRequest>) {
        let _span = tracy_client::span!("processor draw");

        let window = &self.objects[self.cursor.min(self.objects.len())..];

        let end = window
            .iter()
            .position(|x| !x.is_finished() && x.state() == ObjectState::Invisible)
            .unwrap_or(window.len());

        for object in window[..end].iter().rev() {
            object.draw(ctx, out);
        }
    }
}

fn judge(
    object: &mut HitObject,
    ctx: &SessionContext,
    cues: &mut dyn CueSink,
    log: &mut JudgmentLog,
    stats: &mut HitStats,
    report: &mut FrameReport,
) {
    let Some(hit) = object.judge(ctx, cues) else {
        return;
    };

    let record = JudgmentRecord {
        object: object.template_id(),
        time: ctx.time,
        hit,
    };

    tracing::debug!("[{}] object {} judged {:?}", ctx.time, record.object.0, hit);

    log.store(record);
    stats.record(hit);
    report.judged.push(record);
}

#[cfg(test)]
mod tests {
    use cgmath::Vector2;

    use super::*;
    use crate::{
        audio::Cue,
        chart::ObjectTemplate,
        hit_objects::{tests::{input, Harness}, Hit},
        osu_input::{KeyState, OsuInput},
    };

    fn notes(times: &[f64]) -> Chart {
        let mut chart = Chart::default();

        for &time in times {
            chart.insert(ObjectTemplate::note(time, Vector2::new(0.0, 0.0)));
        }

        chart
    }

    #[test]
    fn test_cursor_is_monotonic_and_skips_finished() {
        let harness = Harness::new(notes(&[1000.0, 1100.0, 1500.0, 3000.0]));
        let mut processor = StandardProcessor::new(&harness.chart, &harness.config);
        let idle = OsuInput::default();

        let mut last_cursor = 0;
        let mut finished_at: Vec<Option<f64>> = vec![None; harness.chart.len()];

        for step in 0..500 {
            let time = step as f64 * 10.0;
            let report = processor.update(&harness.ctx(time, &idle), &mut ());

            assert!(processor.cursor() >= last_cursor);
            last_cursor = processor.cursor();

            for &index in &report.scanned {
                if let Some(at) = finished_at[index] {
                    panic!("object {index} scanned at {time} after finishing at {at}");
                }
            }

            for (i, object) in processor.objects().iter().enumerate() {
                if object.is_finished() && finished_at[i].is_none() {
                    finished_at[i] = Some(time);
                }
            }
        }

        assert!(processor.is_done());
        assert_eq!(processor.stats().miss, 4);
    }

    #[test]
    fn test_scan_stops_at_invisible() {
        let harness = Harness::new(notes(&[1000.0, 5000.0]));
        let mut processor = StandardProcessor::new(&harness.chart, &harness.config);
        let idle = OsuInput::default();

        let report = processor.update(&harness.ctx(0.0, &idle), &mut ());

        assert_eq!(report.scanned.as_slice(), &[0, 1]);
        assert_eq!(processor.objects()[1].state(), ObjectState::Invisible);
    }

    #[test]
    fn test_one_activation_per_frame() {
        let harness = Harness::new(notes(&[1000.0, 1000.0]));
        let mut processor = StandardProcessor::new(&harness.chart, &harness.config);
        let mut cues = Vec::new();

        let idle = OsuInput::default();
        processor.update(&harness.ctx(990.0, &idle), &mut cues);

        let press = input(Vector2::new(0.0, 0.0), KeyState::Pressed);
        let report = processor.update(&harness.ctx(1000.0, &press), &mut cues);

        assert_eq!(report.activated, Some(0));
        assert_eq!(report.judged.len(), 1);
        assert_eq!(report.judged[0].hit, Hit::X300);
        assert_eq!(processor.objects()[1].state(), ObjectState::Ready);
        assert_eq!(cues, vec![Cue::Activate]);

        // Held key doesn't count as another press
        let held = input(Vector2::new(0.0, 0.0), KeyState::Held);
        let report = processor.update(&harness.ctx(1010.0, &held), &mut cues);
        assert_eq!(report.activated, None);

        let press = input(Vector2::new(0.0, 0.0), KeyState::Pressed);
        let report = processor.update(&harness.ctx(1020.0, &press), &mut cues);
        assert_eq!(report.activated, Some(1));
    }

    #[test]
    fn test_draw_covers_visible_window() {
        let harness = Harness::new(notes(&[1000.0, 1100.0, 9000.0]));
        let mut processor = StandardProcessor::new(&harness.chart, &harness.config);
        let idle = OsuInput::default();
        let ctx = harness.ctx(500.0, &idle);

        processor.update(&ctx, &mut ());

        let mut out = Vec::new();
        processor.draw(&ctx, &mut out);

        // Circle plus approach circle for both visible notes
        assert_eq!(out.len(), 4);
    }
}
