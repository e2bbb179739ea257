//! Douglas-Peucker importance, ring orientation and line measures.

use super::types::VectorPoint;

/// Assigns every vertex of `line` its Douglas-Peucker importance.
///
/// Endpoints get `1.0`. An interior vertex gets the squared distance at which
/// it was selected, or keeps `0.0` if it never exceeds `sq_tolerance`. Tiles
/// later keep the vertices whose importance beats their own squared
/// tolerance, so one pass serves every zoom.
pub fn build_sq_dists(line: &mut [VectorPoint], sq_tolerance: f64) {
    let len = line.len();
    if len == 0 {
        return;
    }
    line[0].t = 1.0;
    line[len - 1].t = 1.0;
    if len < 3 {
        return;
    }

    let mut stack = vec![(0usize, len - 1)];
    while let Some((first, last)) = stack.pop() {
        let a = line[first];
        let b = line[last];
        let mut max_sq_dist = sq_tolerance;
        let mut index = None;

        for (i, p) in line.iter().enumerate().take(last).skip(first + 1) {
            let sq_dist = sq_seg_dist(p, &a, &b);
            if sq_dist > max_sq_dist {
                index = Some(i);
                max_sq_dist = sq_dist;
            }
        }

        if let Some(i) = index {
            line[i].t = max_sq_dist;
            if i - first > 1 {
                stack.push((first, i));
            }
            if last - i > 1 {
                stack.push((i, last));
            }
        }
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
pub fn sq_seg_dist(p: &VectorPoint, a: &VectorPoint, b: &VectorPoint) -> f64 {
    let (mut x, mut y) = (a.x, a.y);
    let dx = b.x - x;
    let dy = b.y - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - x) * dx + (p.y - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.x;
            y = b.y;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    let dx = p.x - x;
    let dy = p.y - y;
    dx * dx + dy * dy
}

/// Shoelace area; positive when the ring runs counter-clockwise.
pub fn signed_area(ring: &[VectorPoint]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut prev = &ring[ring.len() - 1];
    for p in ring {
        sum += prev.x * p.y - p.x * prev.y;
        prev = p;
    }
    sum / 2.0
}

/// Total length of a polyline.
pub fn line_length(line: &[VectorPoint]) -> f64 {
    line.windows(2)
        .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
        .sum()
}

/// Reverses `ring` unless it already runs in the requested direction.
pub fn rewind(ring: &mut [VectorPoint], clockwise: bool) {
    let area = signed_area(ring);
    if area != 0.0 && (area < 0.0) != clockwise {
        ring.reverse();
    }
}
