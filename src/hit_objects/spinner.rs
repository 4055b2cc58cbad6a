use std::f64::consts::PI;

use cgmath::Vector2;

use crate::{
    audio::CueSink,
    chart::{ObjectTemplate, SpinnerTemplate},
    config::FadeConfig,
    math::{angle_delta, calc_progress, direction_angle},
    render::{DrawInstance, DrawRequest, Shape},
    session::SessionContext,
};

use super::{Hit, ObjectLogic, Visual};

/// Spinner size in playfield units
const SPINNER_RADIUS: f64 = 0.75;

#[derive(Debug, Clone)]
pub struct Spinner {
    required_spins: f64,
    resistance: f64,
    spun: f64,
    /// Signed total rotation, only used for drawing
    rotation: f64,
    last_angle: Option<f64>,
}

impl Spinner {
    pub fn new(spinner: &SpinnerTemplate) -> Self {
        let resistance = if spinner.resistance > 0.0 {
            spinner.resistance
        } else {
            1.0
        };

        Self {
            required_spins: spinner.required_spins.max(0.0),
            resistance,
            spun: 0.0,
            rotation: 0.0,
            last_angle: None,
        }
    }

    #[inline]
    pub fn spun(&self) -> f64 {
        self.spun
    }

    #[inline]
    pub fn required_spins(&self) -> f64 {
        self.required_spins
    }

    pub fn ratio(&self) -> f64 {
        if self.required_spins <= 0.0 {
            return 1.0;
        }

        self.spun / self.required_spins
    }
}

impl ObjectLogic for Spinner {
    fn on_finish(&mut self, _ctx: &SessionContext, _template: &ObjectTemplate, activated_at: Option<f64>) -> Hit {
        if self.required_spins <= 0.0 {
            return match activated_at {
                Some(_) => Hit::X300,
                None => Hit::Miss,
            };
        }

        match self.ratio() {
            r if r >= 1.0 => Hit::X300,
            r if r >= 0.9 => Hit::X100,
            r if r >= 0.75 => Hit::X50,
            _ => Hit::Miss,
        }
    }

    fn on_logic_update(
        &mut self,
        ctx: &SessionContext,
        template: &ObjectTemplate,
        active: bool,
        _cues: &mut dyn CueSink,
    ) {
        let spinning = active
            && ctx.time >= template.start_time
            && ctx.time <= template.end_time;

        if !spinning {
            self.last_angle = None;
            return;
        }

        let angle = direction_angle(ctx.input.pos - template.pos);

        if let Some(last) = self.last_angle {
            let delta = angle_delta(last, angle);

            self.rotation += delta;
            self.spun += delta.abs() / (2.0 * PI * self.resistance);
        }

        self.last_angle = Some(angle);
    }

    /// Can be activated from anywhere on the playfield
    fn activation_radius(&self, _ctx: &SessionContext) -> f64 {
        f64::INFINITY
    }

    fn accepts_held_activation(&self, ctx: &SessionContext, template: &ObjectTemplate) -> bool {
        ctx.time > template.start_time
    }

    fn activation_deadline(&self, _ctx: &SessionContext, template: &ObjectTemplate) -> f64 {
        template.end_time
    }

    fn is_complete(&self, ctx: &SessionContext, template: &ObjectTemplate) -> bool {
        self.spun >= self.required_spins || ctx.time >= template.end_time
    }

    fn fade_out_ms(&self, fade: &FadeConfig) -> f64 {
        fade.spinner_fadeout_ms
    }

    fn draw(&self, ctx: &SessionContext, template: &ObjectTemplate, visual: &Visual, out: &mut Vec<DrawRequest>) {
        let scale = Vector2::new(SPINNER_RADIUS, SPINNER_RADIUS);
        let color = &ctx.skin.colours.slider_border;

        out.push(DrawRequest::new(
            Shape::Spinner,
            DrawInstance::new(template.pos, scale, self.rotation, color, visual.alpha),
        ));

        if ctx.time >= template.start_time && ctx.time < template.end_time {
            let left = 1.0 - calc_progress(ctx.time, template.start_time, template.end_time);

            out.push(DrawRequest::new(
                Shape::ApproachCircle,
                DrawInstance::circle(template.pos, SPINNER_RADIUS * left, color, visual.alpha),
            ));
        }
    }
}
