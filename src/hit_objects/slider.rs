use cgmath::Vector2;

use crate::{
    audio::{Cue, CueSink},
    chart::{ObjectTemplate, SliderTemplate},
    config::{Config, FadeConfig},
    curve::SliderPath,
    math::{direction_angle, opposite_direction_angle},
    render::{DrawInstance, DrawRequest, Shape},
    rgb::{mix_colors_linear, Rgb},
    session::SessionContext,
};

use super::{Hit, ObjectLogic, Visual};

#[derive(Debug, Clone)]
pub struct Slider {
    path: SliderPath,

    /// Amount of spans
    /// Example:
    /// `*===R===R===*` => 3 repeats
    /// `*===R===*` => 2 repeats
    /// `*===*` => 1 repeats
    repeats: u32,
    span_duration: f64,

    /// Span index seen on the last update, `repeats` once the tail is reached
    span: u32,
    ball_progress: f64,
    ball_pos: Vector2<f64>,
    /// Judgment circle scale, between 1 and the follow radius multiplier
    ball_scale: f64,
    last_update: Option<f64>,

    head_hit: bool,
    /// Head, repeat points and tail passed while active
    checkpoints_hit: u32,
    breaks: u32,
    bounces: u32,

    start_angle: f64,
    end_angle: f64,
}

impl Slider {
    pub fn new(template: &ObjectTemplate, slider: &SliderTemplate, config: &Config) -> Self {
        let path = SliderPath::bake(slider.curve, &slider.path, slider.length, &config.curve);
        let repeats = slider.repeats.max(1);

        let start_angle = direction_angle(path.direction(0.0));
        let end_angle = opposite_direction_angle(path.direction(1.0));
        let ball_pos = path.position(0.0);

        Self {
            path,
            repeats,
            span_duration: template.duration() / repeats as f64,
            span: 0,
            ball_progress: 0.0,
            ball_pos,
            ball_scale: 1.0,
            last_update: None,
            head_hit: false,
            checkpoints_hit: 0,
            breaks: 0,
            bounces: 0,
            start_angle,
            end_angle,
        }
    }

    #[inline]
    pub fn path(&self) -> &SliderPath {
        &self.path
    }

    #[inline]
    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    /// Head plus every repeat point plus the tail
    #[inline]
    pub fn total_checkpoints(&self) -> u32 {
        self.repeats + 1
    }

    #[inline]
    pub fn checkpoints_hit(&self) -> u32 {
        self.checkpoints_hit
    }

    #[inline]
    pub fn head_hit(&self) -> bool {
        self.head_hit
    }

    #[inline]
    pub fn breaks(&self) -> u32 {
        self.breaks
    }

    #[inline]
    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    #[inline]
    pub fn ball_pos(&self) -> Vector2<f64> {
        self.ball_pos
    }

    #[inline]
    pub fn ball_scale(&self) -> f64 {
        self.ball_scale
    }

    /// Decoration angles for the head and the tail
    #[inline]
    pub fn angles(&self) -> (f64, f64) {
        (self.start_angle, self.end_angle)
    }

    /// Span index for `time`, starting at 0, clamped to `repeats`
    pub fn span_at(&self, template: &ObjectTemplate, time: f64) -> u32 {
        let elapsed = time - template.start_time;

        if elapsed < 0.0 {
            return 0;
        }

        if self.span_duration <= 0.0 {
            return self.repeats;
        }

        ((elapsed / self.span_duration).floor() as u32).min(self.repeats)
    }

    /// Path progress of the ball, forward on even spans and backward on odd ones
    pub fn progress_at(&self, template: &ObjectTemplate, time: f64) -> f64 {
        let elapsed = time - template.start_time;

        if elapsed <= 0.0 {
            return 0.0;
        }

        let span = self.span_at(template, time);

        if span >= self.repeats {
            return if self.repeats % 2 == 0 { 0.0 } else { 1.0 };
        }

        let local = ((elapsed - span as f64 * self.span_duration) / self.span_duration).clamp(0.0, 1.0);

        if span % 2 == 0 {
            local
        } else {
            1.0 - local
        }
    }

    pub fn position_at_time(&self, template: &ObjectTemplate, time: f64) -> Vector2<f64> {
        self.path.position(self.progress_at(template, time))
    }

    fn update_ball_scale(&mut self, ctx: &SessionContext, active: bool) {
        let elapsed = self.last_update
            .map(|last| (ctx.time - last).max(0.0))
            .unwrap_or(0.0);

        let step = ctx.config.slider.ball_pulse_rate * elapsed;

        if active {
            self.ball_scale = (self.ball_scale + step).min(ctx.config.slider.follow_radius_multiplier);
        } else {
            self.ball_scale = (self.ball_scale - step).max(1.0);
        }
    }
}

impl ObjectLogic for Slider {
    fn on_begin(&mut self, ctx: &SessionContext, template: &ObjectTemplate, _cues: &mut dyn CueSink) {
        let head_window_end = template.start_time + ctx.params.hit_window.hittable();

        if ctx.input.is_key_hit_no_hold() && ctx.time < head_window_end {
            self.head_hit = true;
            self.checkpoints_hit += 1;
        }
    }

    fn on_raise(&mut self, ctx: &SessionContext, _template: &ObjectTemplate, cues: &mut dyn CueSink) {
        tracing::trace!("[{}] slider break", ctx.time);

        self.breaks += 1;
        cues.play(Cue::SliderBreak);
    }

    fn on_finish(&mut self, _ctx: &SessionContext, _template: &ObjectTemplate, _activated_at: Option<f64>) -> Hit {
        let total = self.total_checkpoints();
        let ratio = self.checkpoints_hit as f64 / total as f64;

        if self.checkpoints_hit >= total && self.breaks == 0 {
            Hit::X300
        } else if ratio >= 0.5 {
            Hit::X100
        } else if ratio > 0.0 {
            Hit::X50
        } else {
            Hit::Miss
        }
    }

    fn on_logic_update(
        &mut self,
        ctx: &SessionContext,
        template: &ObjectTemplate,
        active: bool,
        cues: &mut dyn CueSink,
    ) {
        let span = self.span_at(template, ctx.time);

        while self.span < span {
            self.span += 1;

            if self.span < self.repeats {
                self.bounces += 1;
                cues.play(Cue::SliderBounce);
            }

            if active {
                self.checkpoints_hit += 1;
            }
        }

        self.ball_progress = self.progress_at(template, ctx.time);
        self.ball_pos = self.path.position(self.ball_progress);

        self.update_ball_scale(ctx, active);
        self.last_update = Some(ctx.time);
    }

    fn activation_center(&self, _template: &ObjectTemplate) -> Vector2<f64> {
        self.ball_pos
    }

    fn activation_radius(&self, ctx: &SessionContext) -> f64 {
        ctx.params.radius * self.ball_scale
    }

    fn accepts_held_activation(&self, ctx: &SessionContext, template: &ObjectTemplate) -> bool {
        ctx.time > template.start_time
    }

    fn activation_deadline(&self, _ctx: &SessionContext, template: &ObjectTemplate) -> f64 {
        template.end_time
    }

    fn is_complete(&self, ctx: &SessionContext, template: &ObjectTemplate) -> bool {
        ctx.time >= template.end_time && self.span >= self.repeats
    }

    fn fade_out_ms(&self, fade: &FadeConfig) -> f64 {
        fade.slider_fadeout_ms
    }

    fn draw(&self, ctx: &SessionContext, template: &ObjectTemplate, visual: &Visual, out: &mut Vec<DrawRequest>) {
        let radius = ctx.params.radius;
        let colours = &ctx.skin.colours;

        let body_color = colours.slider_body
            .unwrap_or_else(|| mix_colors_linear(&visual.color, &Rgb::new(0, 0, 0), 0.7));

        let bbox = self.path.bounding_box(radius);
        out.push(DrawRequest::new(
            Shape::SliderBody(visual.id),
            DrawInstance::new(
                bbox.center(),
                Vector2::new(bbox.width() / 2.0, bbox.height() / 2.0),
                0.0,
                &body_color,
                visual.alpha,
            ),
        ));

        let head = self.path.position(0.0);

        if ctx.time < template.start_time {
            out.push(DrawRequest::new(
                Shape::HitCircle,
                DrawInstance::circle(head, radius, &visual.color, visual.alpha),
            ));
        }

        if let Some(scale) = visual.approach_scale {
            out.push(DrawRequest::new(
                Shape::ApproachCircle,
                DrawInstance::circle(head, radius * scale, &visual.color, visual.alpha),
            ));
        }

        // Arrow at the far end of the current span, if the ball turns around there
        if self.span + 1 < self.repeats {
            let (pos, angle) = if self.span % 2 == 0 {
                (self.path.position(1.0), self.end_angle)
            } else {
                (head, self.start_angle)
            };

            out.push(DrawRequest::new(
                Shape::ReverseArrow,
                DrawInstance::new(pos, Vector2::new(radius, radius), angle, &colours.slider_border, visual.alpha),
            ));
        }

        if ctx.time >= template.start_time && ctx.time < template.end_time {
            let mut travel = self.path.direction(self.ball_progress);

            if self.span % 2 == 1 {
                travel = -travel;
            }

            out.push(DrawRequest::new(
                Shape::SliderBall,
                DrawInstance::new(
                    self.ball_pos,
                    Vector2::new(radius * self.ball_scale, radius * self.ball_scale),
                    direction_angle(travel),
                    &visual.color,
                    visual.alpha,
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::Vector2;

    use crate::{
        audio::Cue,
        chart::{Chart, ObjectTemplate, SliderTemplate},
        curve::{CurveType, PathNode},
        hit_objects::{tests::Harness, Hit, HitObjectKind, ObjectLogic},
        osu_input::OsuInput,
    };

    fn slider_chart(repeats: u32) -> Chart {
        let mut chart = Chart::default();

        chart.insert(ObjectTemplate::slider(
            1000.0,
            2000.0,
            SliderTemplate {
                path: vec![
                    PathNode::anchor(Vector2::new(0.0, 0.0)),
                    PathNode::anchor(Vector2::new(0.5, 0.0)),
                ],
                curve: CurveType::Straight,
                repeats,
                length: Some(0.5),
            },
        ));

        chart
    }

    #[test]
    fn test_two_spans_bounce_once_at_half() {
        let harness = Harness::new(slider_chart(2));
        let mut object = harness.object(0);
        let idle = OsuInput::default();

        let mut bounce_times = Vec::new();

        for step in 0..=130 {
            let time = 800.0 + step as f64 * 10.0;
            let mut cues = Vec::new();

            object.update(&harness.ctx(time, &idle), &mut cues);

            if cues.contains(&Cue::SliderBounce) {
                bounce_times.push(time);
            }
        }

        assert_eq!(bounce_times, vec![1500.0]);

        let HitObjectKind::Slider(slider) = &object.kind else {
            panic!("expected a slider");
        };

        assert_eq!(slider.bounces(), 1);
    }

    #[test]
    fn test_ball_reverses_on_odd_span() {
        let harness = Harness::new(slider_chart(2));
        let object = harness.object(0);
        let template = &harness.chart.objects()[0];

        let HitObjectKind::Slider(slider) = &object.kind else {
            panic!("expected a slider");
        };

        assert_relative_eq!(slider.position_at_time(template, 1250.0).x, 0.25, epsilon = 1e-9);
        assert_relative_eq!(slider.position_at_time(template, 1400.0).x, 0.4, epsilon = 1e-9);
        assert_relative_eq!(slider.position_at_time(template, 1600.0).x, 0.4, epsilon = 1e-9);
        assert_relative_eq!(slider.position_at_time(template, 1750.0).x, 0.25, epsilon = 1e-9);

        // Even amount of spans ends back on the head
        assert_relative_eq!(slider.position_at_time(template, 2500.0).x, 0.0, epsilon = 1e-9);
        assert_eq!(slider.span_at(template, 2500.0), 2);
    }

    #[test]
    fn test_checkpoint_judgment() {
        let harness = Harness::new(slider_chart(2));
        let object = harness.object(0);
        let template = &harness.chart.objects()[0];
        let idle = OsuInput::default();
        let ctx = harness.ctx(2000.0, &idle);

        let HitObjectKind::Slider(base) = object.kind else {
            panic!("expected a slider");
        };

        let judge = |hit: u32, breaks: u32| {
            let mut slider = base.clone();
            slider.checkpoints_hit = hit;
            slider.breaks = breaks;
            slider.on_finish(&ctx, template, None)
        };

        assert_eq!(judge(3, 0), Hit::X300);
        assert_eq!(judge(3, 1), Hit::X100);
        assert_eq!(judge(2, 0), Hit::X100);
        assert_eq!(judge(1, 0), Hit::X50);
        assert_eq!(judge(0, 0), Hit::Miss);
    }

    #[test]
    fn test_decoration_angles() {
        let harness = Harness::new(slider_chart(1));
        let object = harness.object(0);

        let HitObjectKind::Slider(slider) = &object.kind else {
            panic!("expected a slider");
        };

        let (start, end) = slider.angles();

        assert_relative_eq!(start, 0.0, epsilon = 1e-9);
        assert_relative_eq!(end.abs(), std::f64::consts::PI, epsilon = 1e-9);
    }
}
