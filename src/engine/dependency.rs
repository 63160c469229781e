//! Dependency connector geometry.
//!
//! Each connector is a cubic curve whose control points sit 30% of the
//! horizontal span away from each endpoint, so the curve is an S shape
//! whether the successor lies left or right of the predecessor.

use super::bar::BarGeometry;
use super::geometry::Point;
use crate::model::{Dependency, DependencyKind, ItemKey};

/// Fraction of the horizontal span used to offset the control points.
const CONTROL_OFFSET: f32 = 0.3;
const ARROW_LENGTH: f32 = 8.0;
const ARROW_HALF_WIDTH: f32 = 3.0;
/// Radius of the affordance dots at both ends of a connector.
pub const ENDPOINT_RADIUS: f32 = 3.0;

/// A drawable dependency arrow.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub dependency_id: i64,
    pub kind: DependencyKind,
    pub from: Point,
    pub to: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    /// Arrowhead triangle: tip, then the two base corners.
    pub arrow: [Point; 3],
}

impl Connector {
    /// Build the connector between two bars for a dependency kind.
    pub fn between(dependency_id: i64, kind: DependencyKind, from: &BarGeometry, to: &BarGeometry) -> Self {
        let start = if kind.from_finish() {
            from.finish_point()
        } else {
            from.start_point()
        };
        let end = if kind.to_finish() {
            to.finish_point()
        } else {
            to.start_point()
        };

        let offset = (end.x - start.x).abs() * CONTROL_OFFSET;
        let ctrl1 = Point::new(start.x + offset, start.y);
        let ctrl2 = Point::new(end.x - offset, end.y);

        Self {
            dependency_id,
            kind,
            from: start,
            to: end,
            ctrl1,
            ctrl2,
            arrow: arrowhead(ctrl2, end),
        }
    }

    /// Centres of the dots drawn at both ends of the connector.
    pub fn endpoints(&self) -> [Point; 2] {
        [self.from, self.to]
    }

    pub fn control_points(&self) -> [Point; 4] {
        [self.from, self.ctrl1, self.ctrl2, self.to]
    }

    /// Point on the curve at parameter `t` in [0, 1].
    pub fn point_at(&self, t: f32) -> Point {
        let u = 1.0 - t;
        self.from * (u * u * u)
            + self.ctrl1 * (3.0 * u * u * t)
            + self.ctrl2 * (3.0 * u * t * t)
            + self.to * (t * t * t)
    }

    /// Flatten the curve into `segments + 1` points.
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }

    /// Distance from `p` to the flattened curve, for hover hit-testing.
    pub fn distance_to(&self, p: Point) -> f32 {
        self.sample(24)
            .windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }
}

/// Triangle pointing from `from` towards `tip`, with its tip on `tip`.
fn arrowhead(from: Point, tip: Point) -> [Point; 3] {
    let mut dir = tip - from;
    let len = dir.distance(Point::default());
    if len < f32::EPSILON {
        dir = Point::new(1.0, 0.0);
    } else {
        dir = dir * (1.0 / len);
    }
    let normal = Point::new(-dir.y, dir.x);
    let base = tip - dir * ARROW_LENGTH;
    [
        tip,
        base + normal * ARROW_HALF_WIDTH,
        base - normal * ARROW_HALF_WIDTH,
    ]
}

fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq < f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Build connectors for every dependency whose two endpoints are visible.
///
/// `position_of` returns `None` for items hidden under a collapsed ancestor
/// or without usable dates; such edges are skipped silently.
pub fn render<F>(dependencies: &[Dependency], mut position_of: F) -> Vec<Connector>
where
    F: FnMut(ItemKey) -> Option<BarGeometry>,
{
    dependencies
        .iter()
        .filter(|dep| dep.from != dep.to)
        .filter_map(|dep| {
            let from = position_of(dep.from)?;
            let to = position_of(dep.to)?;
            Some(Connector::between(dep.id, dep.kind, &from, &to))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(key: ItemKey, x: f32, width: f32, mid_y: f32) -> BarGeometry {
        BarGeometry {
            key,
            x,
            width,
            y: mid_y - 10.0,
            height: 20.0,
            mid_y,
            progress_width: 0.0,
            overdue: false,
        }
    }

    fn dep(kind: DependencyKind) -> Dependency {
        Dependency {
            id: 1,
            from: ItemKey::task(1),
            to: ItemKey::task(2),
            kind,
        }
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 0.001
    }

    fn lookup(key: ItemKey) -> Option<BarGeometry> {
        match key.id {
            1 => Some(bar(key, 100.0, 50.0, 20.0)),
            2 => Some(bar(key, 300.0, 80.0, 60.0)),
            _ => None,
        }
    }

    #[test]
    fn endpoints_follow_the_dependency_kind() {
        let cases = [
            (DependencyKind::FinishToStart, 150.0, 300.0),
            (DependencyKind::StartToStart, 100.0, 300.0),
            (DependencyKind::FinishToFinish, 150.0, 380.0),
            (DependencyKind::StartToFinish, 100.0, 380.0),
        ];
        for (kind, from_x, to_x) in cases {
            let connectors = render(&[dep(kind)], lookup);
            assert_eq!(connectors.len(), 1);
            let c = &connectors[0];
            assert_eq!(c.from, Point::new(from_x, 20.0), "{kind:?}");
            assert_eq!(c.to, Point::new(to_x, 60.0), "{kind:?}");
        }
    }

    #[test]
    fn endpoint_dots_sit_on_both_bars() {
        let c = &render(&[dep(DependencyKind::FinishToStart)], lookup)[0];
        assert_eq!(c.endpoints(), [Point::new(150.0, 20.0), Point::new(300.0, 60.0)]);
    }

    #[test]
    fn control_points_make_an_s_curve_in_both_directions() {
        let c = &render(&[dep(DependencyKind::FinishToStart)], lookup)[0];
        assert!(close(c.ctrl1, Point::new(195.0, 20.0)));
        assert!(close(c.ctrl2, Point::new(255.0, 60.0)));

        // Successor to the left of the predecessor.
        let backwards = Connector::between(
            9,
            DependencyKind::FinishToStart,
            &bar(ItemKey::task(2), 300.0, 80.0, 60.0),
            &bar(ItemKey::task(1), 100.0, 50.0, 20.0),
        );
        assert!(close(backwards.ctrl1, Point::new(464.0, 60.0)));
        assert!(close(backwards.ctrl2, Point::new(16.0, 20.0)));
    }

    #[test]
    fn hidden_endpoints_drop_the_edge() {
        let mut hidden = dep(DependencyKind::FinishToStart);
        hidden.to = ItemKey::task(3);
        let self_loop = Dependency {
            id: 2,
            from: ItemKey::task(1),
            to: ItemKey::task(1),
            kind: DependencyKind::StartToStart,
        };
        assert!(render(&[hidden, self_loop], lookup).is_empty());
    }

    #[test]
    fn arrowhead_tip_sits_on_the_endpoint() {
        let c = &render(&[dep(DependencyKind::StartToStart)], lookup)[0];
        assert!(close(c.arrow[0], c.to));
        // Horizontal approach: base corners straddle the endpoint's y.
        assert!((c.arrow[1].y - c.arrow[2].y).abs() > 5.0);
        assert!(c.arrow[1].x < c.to.x && c.arrow[2].x < c.to.x);
    }

    #[test]
    fn sampled_curve_starts_and_ends_on_the_endpoints() {
        let c = &render(&[dep(DependencyKind::FinishToFinish)], lookup)[0];
        let points = c.sample(10);
        assert_eq!(points.len(), 11);
        assert!(points[0].distance(c.from) < 0.01);
        assert!(points[10].distance(c.to) < 0.01);
        assert!(c.distance_to(c.from) < 0.01);
        assert!(c.distance_to(Point::new(0.0, 500.0)) > 100.0);
    }
}
