//! Dense sampling of control point paths, one routine per curve type.

use std::f64::consts::TAU;

use cgmath::{InnerSpace, Vector2};

use super::{CurveType, PathNode};

#[inline]
fn steps_for(length: f64, steps_per_unit: f64) -> usize {
    ((length * steps_per_unit).ceil() as usize).max(1)
}

fn polygon_length(points: &[Vector2<f64>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).magnitude()).sum()
}

/// Samples the whole path. Output always starts at the first node
/// and ends at the last one.
pub fn sample(curve: CurveType, nodes: &[PathNode], steps_per_unit: f64) -> Vec<Vector2<f64>> {
    let positions: Vec<Vector2<f64>> = nodes.iter().map(|x| x.pos).collect();

    if positions.len() < 2 {
        return positions;
    }

    match curve {
        CurveType::Straight => straight(&positions, steps_per_unit),
        CurveType::Bezier => bezier(nodes, steps_per_unit),
        CurveType::Catmull => catmull(&positions, steps_per_unit),
        CurveType::Circle => {
            if positions.len() != 3 {
                return bezier(nodes, steps_per_unit);
            }

            circle_arc(positions[0], positions[1], positions[2], steps_per_unit)
                .unwrap_or_else(|| straight(&positions, steps_per_unit))
        },
    }
}

fn straight(points: &[Vector2<f64>], steps_per_unit: f64) -> Vec<Vector2<f64>> {
    let mut out = Vec::new();

    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let steps = steps_for((b - a).magnitude(), steps_per_unit);

        for i in 0..steps {
            out.push(a + (b - a) * (i as f64 / steps as f64));
        }
    }

    out.extend(points.last());
    out
}

fn de_casteljau(points: &[Vector2<f64>], t: f64) -> Vector2<f64> {
    let mut temp = points.to_vec();

    for level in (1..points.len()).rev() {
        for i in 0..level {
            temp[i] = temp[i] + (temp[i + 1] - temp[i]) * t;
        }
    }

    temp[0]
}

/// Splits at anchor nodes, every segment is an independent bezier
fn bezier_segments(nodes: &[PathNode]) -> Vec<Vec<Vector2<f64>>> {
    let mut segments = Vec::new();
    let mut current = vec![nodes[0].pos];

    for (i, node) in nodes.iter().enumerate().skip(1) {
        current.push(node.pos);

        let is_last = i == nodes.len() - 1;

        if node.is_control_point && !is_last {
            segments.push(std::mem::replace(&mut current, vec![node.pos]));
        }
    }

    if current.len() > 1 {
        segments.push(current);
    }

    segments
}

fn bezier(nodes: &[PathNode], steps_per_unit: f64) -> Vec<Vector2<f64>> {
    let mut out = Vec::new();

    for segment in bezier_segments(nodes) {
        let steps = steps_for(polygon_length(&segment), steps_per_unit);

        for i in 0..steps {
            out.push(de_casteljau(&segment, i as f64 / steps as f64));
        }
    }

    out.extend(nodes.last().map(|x| x.pos));
    out
}

fn catmull_point(
    p0: Vector2<f64>,
    p1: Vector2<f64>,
    p2: Vector2<f64>,
    p3: Vector2<f64>,
    t: f64,
) -> Vector2<f64> {
    let t2 = t * t;
    let t3 = t2 * t;

    let c0 = -0.5 * t3 + t2 - 0.5 * t;
    let c1 = 1.5 * t3 - 2.5 * t2 + 1.0;
    let c2 = -1.5 * t3 + 2.0 * t2 + 0.5 * t;
    let c3 = 0.5 * t3 - 0.5 * t2;

    p0 * c0 + p1 * c1 + p2 * c2 + p3 * c3
}

fn catmull(points: &[Vector2<f64>], steps_per_unit: f64) -> Vec<Vector2<f64>> {
    let mut out = Vec::new();
    let last = points.len() - 1;

    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        let steps = steps_for((p2 - p1).magnitude(), steps_per_unit);

        for j in 0..steps {
            out.push(catmull_point(p0, p1, p2, p3, j as f64 / steps as f64));
        }
    }

    out.push(points[last]);
    out
}

/// Arc through three points, `None` if they are collinear
fn circle_arc(
    a: Vector2<f64>,
    b: Vector2<f64>,
    c: Vector2<f64>,
    steps_per_unit: f64,
) -> Option<Vec<Vector2<f64>>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));

    if d.abs() < 1e-9 {
        return None;
    }

    let a2 = a.magnitude2();
    let b2 = b.magnitude2();
    let c2 = c.magnitude2();

    let center = Vector2::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );

    let radius = (a - center).magnitude();
    let start_angle = (a.y - center.y).atan2(a.x - center.x);
    let end_angle = (c.y - center.y).atan2(c.x - center.x);

    // Counter clockwise when the middle point is on the left side of a->c
    let ab = b - a;
    let ac = c - a;
    let ccw = ab.x * ac.y - ab.y * ac.x > 0.0;

    let mut sweep = end_angle - start_angle;

    if ccw {
        while sweep <= 0.0 {
            sweep += TAU;
        }
    } else {
        while sweep >= 0.0 {
            sweep -= TAU;
        }
    }

    let steps = steps_for(radius * sweep.abs(), steps_per_unit);
    let mut out = Vec::with_capacity(steps + 1);
    out.push(a);

    for i in 1..steps {
        let angle = start_angle + sweep * (i as f64 / steps as f64);
        out.push(center + Vector2::new(angle.cos(), angle.sin()) * radius);
    }

    out.push(c);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(points: &[(f64, f64)]) -> Vec<PathNode> {
        points.iter().map(|&(x, y)| PathNode::anchor(Vector2::new(x, y))).collect()
    }

    #[test]
    fn test_bezier_segments_split_on_anchor() {
        let mut nodes = anchors(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0)]);
        nodes[1].is_control_point = false;
        nodes[3].is_control_point = false;

        let segments = bezier_segments(&nodes);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 3);
        assert_eq!(segments[1][0], Vector2::new(2.0, 0.0));
    }

    #[test]
    fn test_circle_arc_passes_middle_point() {
        let arc = circle_arc(
            Vector2::new(-1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 0.0),
            50.0,
        ).unwrap();

        // Should go over the top, never below the x axis
        assert!(arc.iter().all(|p| p.y > -1e-9));
        assert!(arc.iter().any(|p| (p.y - 1.0).abs() < 0.01));
    }

    #[test]
    fn test_circle_collinear_falls_back() {
        assert!(circle_arc(
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
            50.0,
        ).is_none());
    }

    #[test]
    fn test_sample_ends_on_nodes() {
        let nodes = anchors(&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)]);

        for curve in [CurveType::Straight, CurveType::Bezier, CurveType::Catmull, CurveType::Circle] {
            let points = sample(curve, &nodes, 40.0);

            assert_eq!(points[0], Vector2::new(0.0, 0.0));
            assert_eq!(*points.last().unwrap(), Vector2::new(1.0, 0.0));
        }
    }

    #[test]
    fn test_arc_starts_exactly_on_head() {
        let a = Vector2::new(-0.3, 0.7);
        let points = circle_arc(a, Vector2::new(0.1, 0.95), Vector2::new(0.45, 0.6), 40.0).unwrap();

        assert_eq!(points[0], a);
        assert_eq!(*points.last().unwrap(), Vector2::new(0.45, 0.6));
        assert!(points.len() > 2);
    }
}
