//! Slider curve engine.
//!
//! A [`SliderPath`] is baked once from a handful of control nodes: the curve
//! is sampled densely, fitted to the expected length, then pruned of points
//! that barely change direction. All queries work on the baked points and take
//! a progress `t` in `[0, 1]` measured along the arc length.

mod sample;

use cgmath::{InnerSpace, Vector2};

use crate::{config::CurveConfig, hit_objects::Rectangle};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CurveType {
    #[default]
    Straight,
    Bezier,
    Catmull,
    Circle,
}

impl CurveType {
    /// Curve letter as used by `.osu` files, anything unknown is `Straight`
    pub fn from_letter(letter: &str) -> Self {
        match letter.trim() {
            "L" => Self::Straight,
            "B" => Self::Bezier,
            "C" => Self::Catmull,
            "P" => Self::Circle,
            other => {
                tracing::warn!("Unknown curve type `{other}`, treating as straight");
                Self::Straight
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathNode {
    pub pos: Vector2<f64>,
    /// Hard anchor, ends one curve segment and starts the next
    pub is_control_point: bool,
}

impl PathNode {
    pub fn new(pos: Vector2<f64>, is_control_point: bool) -> Self {
        Self { pos, is_control_point }
    }

    pub fn anchor(pos: Vector2<f64>) -> Self {
        Self::new(pos, true)
    }
}

/// Drops interior points whose turn is below `threshold`.
///
/// The incoming direction is taken from the last kept point so slow, smooth
/// curves still keep a point every so often. Reversals are always kept, and
/// so are the first and last points.
pub fn simplify(points: &[Vector2<f64>], threshold: f64) -> Vec<Vector2<f64>> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);

    for i in 1..points.len() - 1 {
        let last_kept = out[out.len() - 1];
        let incoming = points[i] - last_kept;
        let outgoing = points[i + 1] - points[i];

        if incoming.magnitude2() == 0.0 || outgoing.magnitude2() == 0.0 {
            continue;
        }

        let incoming = incoming.normalize();
        let outgoing = outgoing.normalize();

        let cross = incoming.x * outgoing.y - incoming.y * outgoing.x;
        let is_reversal = incoming.dot(outgoing) < 0.0;

        if cross.abs() > threshold || is_reversal {
            out.push(points[i]);
        }
    }

    out.push(points[points.len() - 1]);
    out
}

/// Cuts the path at `expected` or extends the last segment up to it
fn fit_length(points: &mut Vec<Vector2<f64>>, expected: f64) {
    if points.len() < 2 {
        return;
    }

    let mut travelled = 0.0;

    for i in 1..points.len() {
        let segment = (points[i] - points[i - 1]).magnitude();

        if travelled + segment >= expected {
            let remaining = expected - travelled;
            let end = if segment > 0.0 {
                points[i - 1] + (points[i] - points[i - 1]) * (remaining / segment)
            } else {
                points[i - 1]
            };

            points.truncate(i);
            points.push(end);
            return;
        }

        travelled += segment;
    }

    let missing = expected - travelled;

    let direction = points
        .windows(2)
        .rev()
        .map(|w| w[1] - w[0])
        .find(|d| d.magnitude2() > 0.0);

    if let (Some(direction), Some(&last)) = (direction, points.last()) {
        points.push(last + direction.normalize() * missing);
    }
}

#[derive(Debug, Clone)]
pub struct SliderPath {
    points: Vec<Vector2<f64>>,
    /// Accumulated arc length up to every point, `lengths[0] == 0`
    lengths: Vec<f64>,
    epsilon: f64,
}

impl SliderPath {
    pub fn bake(
        curve: CurveType,
        nodes: &[PathNode],
        expected_length: Option<f64>,
        config: &CurveConfig,
    ) -> Self {
        let _span = tracy_client::span!("bake slider path");

        let mut points = sample::sample(curve, nodes, config.steps_per_unit);
        let sampled = points.len();

        if let Some(expected) = expected_length.filter(|x| *x > 0.0) {
            fit_length(&mut points, expected);
        }

        let points = simplify(&points, config.angle_threshold);

        tracing::trace!(
            "Baked {:?} slider path: {} nodes, {} samples, {} kept",
            curve, nodes.len(), sampled, points.len()
        );

        Self::from_points(points, config.direction_epsilon)
    }

    pub fn from_points(mut points: Vec<Vector2<f64>>, epsilon: f64) -> Self {
        if points.is_empty() {
            points.push(Vector2::new(0.0, 0.0));
        }

        let mut lengths = Vec::with_capacity(points.len());
        let mut total = 0.0;
        lengths.push(0.0);

        for w in points.windows(2) {
            total += (w[1] - w[0]).magnitude();
            lengths.push(total);
        }

        Self {
            points,
            lengths,
            epsilon,
        }
    }

    #[inline]
    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.lengths[self.lengths.len() - 1]
    }

    /// Position at arc length progress `t`, clamped into `[0, 1]`
    pub fn position(&self, t: f64) -> Vector2<f64> {
        let total = self.length();

        if self.points.len() == 1 || total <= 0.0 {
            return self.points[0];
        }

        let target = t.clamp(0.0, 1.0) * total;

        let i = self.lengths
            .partition_point(|&x| x < target)
            .clamp(1, self.points.len() - 1);

        let (start, end) = (self.lengths[i - 1], self.lengths[i]);
        let segment = end - start;

        let local = if segment > 0.0 {
            (target - start) / segment
        } else {
            0.0
        };

        self.points[i - 1] + (self.points[i] - self.points[i - 1]) * local
    }

    /// Unit direction of travel at `t`
    pub fn direction(&self, t: f64) -> Vector2<f64> {
        let t0 = t.clamp(0.0, 1.0).min(1.0 - self.epsilon).max(0.0);
        let t1 = (t0 + self.epsilon).min(1.0);

        let diff = self.position(t1) - self.position(t0);

        if diff.magnitude2() == 0.0 {
            return Vector2::new(1.0, 0.0);
        }

        diff.normalize()
    }

    /// Left hand perpendicular of [`Self::direction`]
    pub fn normal(&self, t: f64) -> Vector2<f64> {
        let dir = self.direction(t);
        Vector2::new(-dir.y, dir.x)
    }

    pub fn bounding_box(&self, radius: f64) -> Rectangle {
        let mut min = Vector2::new(f64::MAX, f64::MAX);
        let mut max = Vector2::new(f64::MIN, f64::MIN);

        for p in &self.points {
            min.x = min.x.min(p.x - radius);
            min.y = min.y.min(p.y - radius);
            max.x = max.x.max(p.x + radius);
            max.y = max.y.max(p.y + radius);
        }

        Rectangle {
            top_left: Vector2::new(min.x, max.y),
            bottom_right: Vector2::new(max.x, min.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::Config;

    fn nodes(points: &[(f64, f64)]) -> Vec<PathNode> {
        points.iter().map(|&(x, y)| PathNode::anchor(Vector2::new(x, y))).collect()
    }

    fn curve_config() -> CurveConfig {
        Config::default().curve
    }

    #[test]
    fn test_straight_position_and_direction() {
        let path = SliderPath::bake(CurveType::Straight, &nodes(&[(0.0, 0.0), (1.0, 0.0)]), None, &curve_config());

        assert_eq!(path.points().len(), 2);
        assert_relative_eq!(path.length(), 1.0);
        assert_relative_eq!(path.position(0.25).x, 0.25);
        assert_relative_eq!(path.direction(0.5).x, 1.0);
        assert_relative_eq!(path.normal(0.5).y, 1.0);
    }

    #[test]
    fn test_direction_at_end_is_finite() {
        let path = SliderPath::bake(CurveType::Straight, &nodes(&[(0.0, 0.0), (0.0, 1.0)]), None, &curve_config());
        let dir = path.direction(1.0);

        assert_relative_eq!(dir.y, 1.0);
        assert_relative_eq!(dir.magnitude(), 1.0);
    }

    #[test]
    fn test_bezier_midpoint() {
        let mut path_nodes = nodes(&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)]);
        path_nodes[1].is_control_point = false;

        let path = SliderPath::bake(CurveType::Bezier, &path_nodes, None, &curve_config());
        let mid = path.position(0.5);

        assert_relative_eq!(mid.x, 0.5, epsilon = 1e-3);
        assert_relative_eq!(mid.y, 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_circle_quarter_points() {
        let path = SliderPath::bake(
            CurveType::Circle,
            &nodes(&[(-0.5, 0.0), (0.0, 0.5), (0.5, 0.0)]),
            None,
            &curve_config(),
        );

        let top = path.position(0.5);
        assert_relative_eq!(top.x, 0.0, epsilon = 5e-3);
        assert_relative_eq!(top.y, 0.5, epsilon = 5e-3);
        assert_relative_eq!(path.length(), std::f64::consts::PI * 0.5, epsilon = 5e-3);
    }

    #[test]
    fn test_length_fit_truncates_and_extends() {
        let straight = nodes(&[(0.0, 0.0), (1.0, 0.0)]);

        let short = SliderPath::bake(CurveType::Straight, &straight, Some(0.5), &curve_config());
        assert_relative_eq!(short.length(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(short.position(1.0).x, 0.5, epsilon = 1e-9);

        let long = SliderPath::bake(CurveType::Straight, &straight, Some(2.0), &curve_config());
        assert_relative_eq!(long.length(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simplify_keeps_endpoints() {
        let line: Vec<Vector2<f64>> = (0..=100).map(|i| Vector2::new(i as f64 / 100.0, 0.0)).collect();

        for threshold in [0.0, 0.5, 10.0] {
            let kept = simplify(&line, threshold);

            assert_eq!(kept.first(), line.first());
            assert_eq!(kept.last(), line.last());
        }

        assert_eq!(simplify(&line, 0.0).len(), 2);
    }

    #[test]
    fn test_simplify_keeps_reversal() {
        let points = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.5, 0.0),
        ];

        assert_eq!(simplify(&points, 10.0).len(), 3);
    }

    #[test]
    fn test_unknown_letter_is_straight() {
        assert_eq!(CurveType::from_letter("X"), CurveType::Straight);
        assert_eq!(CurveType::from_letter("P"), CurveType::Circle);
    }

    #[test]
    fn test_degenerate_path() {
        let path = SliderPath::from_points(vec![], 0.001);

        assert_eq!(path.position(0.7), Vector2::new(0.0, 0.0));
        assert_eq!(path.direction(0.7), Vector2::new(1.0, 0.0));
    }
}
