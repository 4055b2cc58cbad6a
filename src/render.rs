use cgmath::Vector2;

use crate::{chart::TemplateId, math::transform_2d, rgb::Rgb};

/// What the renderer should put under the instance transform
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shape {
    HitCircle,
    ApproachCircle,
    /// Pre-rendered body of the slider with this template
    SliderBody(TemplateId),
    SliderBall,
    ReverseArrow,
    Spinner,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct DrawInstance {
    /// Column major 2D affine transform of a unit quad
    pub transform: [[f32; 3]; 3],
    pub color: [f32; 3],
    pub alpha: f32,
}

impl DrawInstance {
    pub fn new(
        pos: Vector2<f64>,
        scale: Vector2<f64>,
        angle: f64,
        color: &Rgb,
        alpha: f64,
    ) -> Self {
        Self {
            transform: transform_2d(pos, scale, angle).into(),
            color: color.to_gpu_values(),
            alpha: alpha as f32,
        }
    }

    /// Unrotated, uniformly scaled instance
    pub fn circle(pos: Vector2<f64>, radius: f64, color: &Rgb, alpha: f64) -> Self {
        Self::new(pos, Vector2::new(radius, radius), 0.0, color, alpha)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct DrawRequest {
    pub shape: Shape,
    pub instance: DrawInstance,
}

impl DrawRequest {
    pub fn new(shape: Shape, instance: DrawInstance) -> Self {
        Self { shape, instance }
    }
}

#[test]
fn test_instance_is_plain_data() {
    let instance = DrawInstance::circle(Vector2::new(0.5, -0.25), 0.1, &Rgb::new(255, 0, 0), 0.5);
    let bytes: &[u8] = bytemuck::bytes_of(&instance);

    assert_eq!(bytes.len(), std::mem::size_of::<DrawInstance>());
    assert_eq!(instance.transform[2][0], 0.5);
    assert_eq!(instance.transform[2][1], -0.25);
    assert_eq!(instance.color, [1.0, 0.0, 0.0]);
}
