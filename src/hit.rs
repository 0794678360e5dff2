//! Hit testing against the target region.

use crate::geometry::{NormalizedPoint, Rect};
use crate::report;

/// True iff `point` lies inside `region`, bounds inclusive.
///
/// Never panics: a non-finite coordinate or bound (zero-size image box,
/// missing field upstream) is reported through the observability channel and
/// counts as a miss. Pure apart from that reporting, so it is safe to call on
/// every pointer event.
pub fn is_hit(point: NormalizedPoint, region: Rect) -> bool {
    if !point_is_valid(point) {
        report::observe("hit test: click coordinate is not valid");
        return false;
    }
    if !region_is_valid(region) {
        report::observe("hit test: target region is not valid");
        return false;
    }
    if point.x < region.left || point.x > region.right {
        return false;
    }
    if point.y < region.top || point.y > region.bottom {
        return false;
    }
    true
}

fn point_is_valid(p: NormalizedPoint) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

fn region_is_valid(r: Rect) -> bool {
    r.top.is_finite() && r.left.is_finite() && r.right.is_finite() && r.bottom.is_finite()
}
