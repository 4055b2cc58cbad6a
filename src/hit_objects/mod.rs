pub mod hit_window;
pub mod note;
pub mod slider;
pub mod spinner;

use cgmath::Vector2;
use note::Note;
use slider::Slider;
use spinner::Spinner;

use crate::{
    audio::{Cue, CueSink},
    chart::{ObjectTemplate, TemplateId, TemplateKind},
    config::{Config, FadeConfig},
    math::{calc_progress, distance},
    render::DrawRequest,
    rgb::Rgb,
    session::SessionContext,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Hit {
    X300,
    X100,
    X50,
    Miss,
}

impl Hit {
    pub fn score(&self) -> u32 {
        match self {
            Hit::X300 => 300,
            Hit::X100 => 100,
            Hit::X50 => 50,
            Hit::Miss => 0,
        }
    }

    #[inline]
    pub fn is_miss(&self) -> bool {
        *self == Hit::Miss
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    pub top_left: Vector2<f64>,
    pub bottom_right: Vector2<f64>,
}

impl Rectangle {
    pub fn width(&self) -> f64 {
        (self.bottom_right - self.top_left).x.abs()
    }

    pub fn height(&self) -> f64 {
        (self.bottom_right - self.top_left).y.abs()
    }

    pub fn center(&self) -> Vector2<f64> {
        (self.top_left + self.bottom_right) / 2.0
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ObjectState {
    /// Not shown yet, or fully elapsed when `finished` is set
    #[default]
    Invisible,
    Approaching,
    /// Inside the hit window, waiting for activation
    Ready,
    Active,
    /// Activated before, but currently let go
    Inactive,
    /// Done, waiting to be judged
    Pickup,
    /// Judged, playing the fade out
    Fading,
}

/// Values every kind needs to produce its render requests
#[derive(Debug, Clone, Copy)]
pub struct Visual {
    pub id: TemplateId,
    pub alpha: f64,
    /// Approach circle scale relative to the note radius, `None` once it's gone
    pub approach_scale: Option<f64>,
    pub color: Rgb,
}

/// Per kind behaviour plugged into the shared [`HitObject`] lifecycle
pub trait ObjectLogic {
    /// Activated from `Ready`
    fn on_begin(&mut self, _ctx: &SessionContext, _template: &ObjectTemplate, _cues: &mut dyn CueSink) {}

    /// Went from `Active` to `Inactive`
    fn on_raise(&mut self, _ctx: &SessionContext, _template: &ObjectTemplate, _cues: &mut dyn CueSink) {}

    /// Went from `Inactive` back to `Active`
    fn on_press(&mut self, _ctx: &SessionContext, _template: &ObjectTemplate, _cues: &mut dyn CueSink) {}

    /// Produces the judgment, called exactly once
    fn on_finish(&mut self, ctx: &SessionContext, template: &ObjectTemplate, activated_at: Option<f64>) -> Hit;

    /// Called every frame before any state transition
    fn on_logic_update(
        &mut self,
        _ctx: &SessionContext,
        _template: &ObjectTemplate,
        _active: bool,
        _cues: &mut dyn CueSink,
    ) {}

    fn activation_center(&self, template: &ObjectTemplate) -> Vector2<f64> {
        template.pos
    }

    fn activation_radius(&self, ctx: &SessionContext) -> f64 {
        ctx.params.radius
    }

    /// Whether a held key (no fresh press) is enough to activate
    fn accepts_held_activation(&self, _ctx: &SessionContext, _template: &ObjectTemplate) -> bool {
        false
    }

    /// Past this time a `Ready` object goes to `Pickup` without activation
    fn activation_deadline(&self, ctx: &SessionContext, template: &ObjectTemplate) -> f64;

    /// Checked while `Active` or `Inactive`
    fn is_complete(&self, ctx: &SessionContext, template: &ObjectTemplate) -> bool;

    fn completes_on_activation(&self) -> bool {
        false
    }

    fn fade_out_ms(&self, fade: &FadeConfig) -> f64;

    fn draw(&self, ctx: &SessionContext, template: &ObjectTemplate, visual: &Visual, out: &mut Vec<DrawRequest>);
}

#[derive(Debug, Clone)]
pub enum HitObjectKind {
    Note(Note),
    Slider(Slider),
    Spinner(Spinner),
}

impl HitObjectKind {
    #[inline]
    pub fn logic(&self) -> &dyn ObjectLogic {
        match self {
            HitObjectKind::Note(note) => note,
            HitObjectKind::Slider(slider) => slider,
            HitObjectKind::Spinner(spinner) => spinner,
        }
    }

    #[inline]
    pub fn logic_mut(&mut self) -> &mut dyn ObjectLogic {
        match self {
            HitObjectKind::Note(note) => note,
            HitObjectKind::Slider(slider) => slider,
            HitObjectKind::Spinner(spinner) => spinner,
        }
    }
}

/// Runtime counterpart of an [`ObjectTemplate`], one per template per session
#[derive(Debug, Clone)]
pub struct HitObject {
    template: TemplateId,
    state: ObjectState,
    activated_at: Option<f64>,
    judged_at: Option<f64>,
    finished: bool,
    result: Option<Hit>,
    pub kind: HitObjectKind,
}

impl HitObject {
    pub fn new(id: TemplateId, template: &ObjectTemplate, config: &Config) -> Self {
        let kind = match &template.kind {
            TemplateKind::Note => HitObjectKind::Note(Note),
            TemplateKind::Slider(slider) => {
                HitObjectKind::Slider(Slider::new(template, slider, config))
            }
            TemplateKind::Spinner(spinner) => {
                HitObjectKind::Spinner(Spinner::new(spinner))
            }
        };

        Self {
            template: id,
            state: ObjectState::Invisible,
            activated_at: None,
            judged_at: None,
            finished: false,
            result: None,
            kind,
        }
    }

    #[inline]
    pub fn template_id(&self) -> TemplateId {
        self.template
    }

    #[inline]
    pub fn state(&self) -> ObjectState {
        self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn result(&self) -> Option<Hit> {
        self.result
    }

    #[inline]
    pub fn activated_at(&self) -> Option<f64> {
        self.activated_at
    }

    #[inline]
    pub fn judged_at(&self) -> Option<f64> {
        self.judged_at
    }

    #[inline]
    pub fn is_judged(&self) -> bool {
        self.result.is_some()
    }

    /// Per frame logic and the input independent transitions
    pub fn update(&mut self, ctx: &SessionContext, cues: &mut dyn CueSink) {
        if self.finished {
            return;
        }

        let Some(template) = ctx.chart.get(self.template) else {
            return;
        };

        let time = ctx.time;
        let before = self.state;
        let active = self.state == ObjectState::Active;

        self.kind.logic_mut().on_logic_update(ctx, template, active, cues);

        // A late first frame falls through several of these at once
        if self.state == ObjectState::Invisible && time >= template.start_time - ctx.params.approach_ms {
            self.state = ObjectState::Approaching;
        }

        if self.state == ObjectState::Approaching
        && time >= template.start_time - ctx.params.hit_window.hittable() {
            self.state = ObjectState::Ready;
        }

        if self.state == ObjectState::Ready
        && time >= self.kind.logic().activation_deadline(ctx, template) {
            self.state = ObjectState::Pickup;
        }

        if matches!(self.state, ObjectState::Active | ObjectState::Inactive)
        && self.kind.logic().is_complete(ctx, template) {
            self.state = ObjectState::Pickup;
        }

        if self.state == ObjectState::Fading {
            let fade_out = self.kind.logic().fade_out_ms(&ctx.config.fade);
            let judged_at = self.judged_at.unwrap_or(time);

            if time >= judged_at + fade_out {
                self.state = ObjectState::Invisible;
                self.finished = true;
            }
        }

        if before != self.state {
            tracing::trace!("[{time}] object {} {:?} -> {:?}", self.template.0, before, self.state);
        }
    }

    /// Cursor is inside the activation circle
    pub fn hit_test(&self, ctx: &SessionContext) -> bool {
        let Some(template) = ctx.chart.get(self.template) else {
            return false;
        };

        let logic = self.kind.logic();
        let center = logic.activation_center(template);

        distance(ctx.input.pos, center) <= logic.activation_radius(ctx)
    }

    /// Activation predicate for a `Ready` object: inside the radius with a
    /// fresh press, or a held key for kinds that allow it. Never on the early
    /// edge of the hit window
    pub fn can_activate(&self, ctx: &SessionContext) -> bool {
        if self.state != ObjectState::Ready || !self.hit_test(ctx) {
            return false;
        }

        let Some(template) = ctx.chart.get(self.template) else {
            return false;
        };

        if ctx.time <= template.start_time - ctx.params.hit_window.hittable() {
            return false;
        }

        if ctx.input.is_key_hit_no_hold() {
            return true;
        }

        ctx.input.is_keys_hold() && self.kind.logic().accepts_held_activation(ctx, template)
    }

    pub fn activate(&mut self, ctx: &SessionContext, cues: &mut dyn CueSink) {
        let Some(template) = ctx.chart.get(self.template) else {
            return;
        };

        if self.state != ObjectState::Ready {
            return;
        }

        self.activated_at.get_or_insert(ctx.time);
        self.state = ObjectState::Active;

        cues.play(Cue::Activate);

        let logic = self.kind.logic_mut();
        logic.on_begin(ctx, template, cues);

        if logic.completes_on_activation() {
            self.state = ObjectState::Pickup;
        }
    }

    pub fn deactivate(&mut self, ctx: &SessionContext, cues: &mut dyn CueSink) {
        let Some(template) = ctx.chart.get(self.template) else {
            return;
        };

        if self.state != ObjectState::Active {
            return;
        }

        self.state = ObjectState::Inactive;
        self.kind.logic_mut().on_raise(ctx, template, cues);
    }

    pub fn reactivate(&mut self, ctx: &SessionContext, cues: &mut dyn CueSink) {
        let Some(template) = ctx.chart.get(self.template) else {
            return;
        };

        if self.state != ObjectState::Inactive {
            return;
        }

        self.state = ObjectState::Active;
        self.kind.logic_mut().on_press(ctx, template, cues);
    }

    /// Judges a `Pickup` object and starts the fade out.
    ///
    /// Returns `None` for objects in any other state, so a judgment can never
    /// be produced twice.
    pub fn judge(&mut self, ctx: &SessionContext, cues: &mut dyn CueSink) -> Option<Hit> {
        let template = ctx.chart.get(self.template)?;

        if self.state != ObjectState::Pickup || self.result.is_some() {
            return None;
        }

        let hit = self.kind.logic_mut().on_finish(ctx, template, self.activated_at);

        if hit.is_miss() {
            cues.play(Cue::Miss);
        }

        self.result = Some(hit);
        self.judged_at = Some(ctx.time);
        self.state = ObjectState::Fading;

        Some(hit)
    }

    /// Fade in over `fade_in_ms` once approaching, fade out once judged
    pub fn alpha(&self, ctx: &SessionContext) -> f64 {
        let Some(template) = ctx.chart.get(self.template) else {
            return 0.0;
        };

        if self.state == ObjectState::Invisible {
            return 0.0;
        }

        let appear = template.start_time - ctx.params.approach_ms;
        let fade_in = calc_progress(ctx.time, appear, appear + ctx.params.fade_in_ms)
            .clamp(0.0, 1.0);

        let fade_out = match self.judged_at {
            Some(judged_at) => {
                let fade_out_ms = self.kind.logic().fade_out_ms(&ctx.config.fade);
                1.0 - calc_progress(ctx.time, judged_at, judged_at + fade_out_ms).clamp(0.0, 1.0)
            }
            None => 1.0,
        };

        fade_in.min(fade_out)
    }

    /// Goes from 4 down to 1 while approaching, `None` after the start or once judged
    pub fn approach_scale(&self, ctx: &SessionContext) -> Option<f64> {
        let template = ctx.chart.get(self.template)?;

        if self.is_judged() || ctx.time >= template.start_time {
            return None;
        }

        let appear = template.start_time - ctx.params.approach_ms;
        let progress = calc_progress(ctx.time, appear, template.start_time).clamp(0.0, 1.0);

        Some(1.0 + 3.0 * (1.0 - progress))
    }

    pub fn draw(&self, ctx: &SessionContext, out: &mut Vec<DrawRequest>) {
        if self.state == ObjectState::Invisible {
            return;
        }

        let Some(template) = ctx.chart.get(self.template) else {
            return;
        };

        let visual = Visual {
            id: self.template,
            alpha: self.alpha(ctx),
            approach_scale: self.approach_scale(ctx),
            color: ctx.skin.combo_color(template.combo.colour_index),
        };

        self.kind.logic().draw(ctx, template, &visual, out);
    }
}
