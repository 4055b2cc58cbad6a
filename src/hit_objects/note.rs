use crate::{
    chart::ObjectTemplate,
    config::FadeConfig,
    render::{DrawInstance, DrawRequest, Shape},
    session::SessionContext,
};

use super::{Hit, ObjectLogic, Visual};

/// Single tap circle. Completes the moment it's activated
#[derive(Debug, Default, Copy, Clone)]
pub struct Note;

impl ObjectLogic for Note {
    fn on_finish(&mut self, ctx: &SessionContext, template: &ObjectTemplate, activated_at: Option<f64>) -> Hit {
        match activated_at {
            Some(at) => ctx.params.hit_window.judge(at - template.start_time),
            None => Hit::Miss,
        }
    }

    fn activation_deadline(&self, ctx: &SessionContext, template: &ObjectTemplate) -> f64 {
        template.start_time + ctx.params.hit_window.hittable()
    }

    fn is_complete(&self, _ctx: &SessionContext, _template: &ObjectTemplate) -> bool {
        true
    }

    fn completes_on_activation(&self) -> bool {
        true
    }

    fn fade_out_ms(&self, fade: &FadeConfig) -> f64 {
        fade.note_fadeout_ms
    }

    fn draw(&self, ctx: &SessionContext, template: &ObjectTemplate, visual: &Visual, out: &mut Vec<DrawRequest>) {
        let radius = ctx.params.radius;

        out.push(DrawRequest::new(
            Shape::HitCircle,
            DrawInstance::circle(template.pos, radius, &visual.color, visual.alpha),
        ));

        if let Some(scale) = visual.approach_scale {
            out.push(DrawRequest::new(
                Shape::ApproachCircle,
                DrawInstance::circle(template.pos, radius * scale, &visual.color, visual.alpha),
            ));
        }
    }
}
