// Curve simplification - Visvalingam thinning of the raw memory samples
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::series::SamplePoint;

const NONE: usize = usize::MAX;

/// A candidate removal: the triangle a point formed with its neighbors
/// at the time the entry was pushed. Entries go stale when a neighbor is
/// removed; the main loop detects that and skips them.
#[derive(Debug, PartialEq)]
struct VScore {
    area: f64,
    current: usize,
    left: usize,
    right: usize,
}

impl Eq for VScore {}

// BinaryHeap is a max-heap; order by descending area so the smallest
// triangle surfaces first.
impl Ord for VScore {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .area
            .total_cmp(&self.area)
            .then_with(|| other.current.cmp(&self.current))
    }
}

impl PartialOrd for VScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Simplify a line with the Visvalingam algorithm: repeatedly drop the
/// point whose triangle with its surviving neighbors has area below
/// `eps`. Endpoints are never dropped.
pub fn visvalingam(samples: &[SamplePoint], eps: f64) -> Vec<SamplePoint> {
    if samples.len() <= 2 {
        return samples.to_vec();
    }
    let last = samples.len() - 1;

    // neighbor indices simulate a linked list over the surviving points
    let mut removed = vec![false; samples.len()];
    let mut neighbors: Vec<(usize, usize)> = (0..samples.len())
        .map(|i| {
            let left = if i == 0 { NONE } else { i - 1 };
            let right = if i == last { NONE } else { i + 1 };
            (left, right)
        })
        .collect();

    let mut heap = BinaryHeap::new();
    for (i, win) in samples.windows(3).enumerate() {
        heap.push(VScore {
            area: triangle_area(win[0], win[2], win[1]),
            current: i + 1,
            left: i,
            right: i + 2,
        });
    }

    while heap.peek().is_some_and(|candidate| candidate.area < eps) {
        let Some(candidate) = heap.pop() else { break };
        if removed[candidate.current] {
            continue;
        }
        let (left, right) = neighbors[candidate.current];
        // a neighbor changed after this entry was pushed
        if left != candidate.left || right != candidate.right {
            continue;
        }

        removed[candidate.current] = true;
        let (ll, _) = neighbors[left];
        let (_, rr) = neighbors[right];
        neighbors[left].1 = right;
        neighbors[right].0 = left;

        // recompute the two triangles that lost a corner
        for (a, tip, b) in [(ll, left, right), (left, right, rr)] {
            if a == NONE || b == NONE {
                continue;
            }
            heap.push(VScore {
                area: triangle_area(samples[a], samples[b], samples[tip]),
                current: tip,
                left: a,
                right: b,
            });
        }
    }

    samples
        .iter()
        .zip(&removed)
        .filter_map(|(point, gone)| if *gone { None } else { Some(*point) })
        .collect()
}

// cross product magnitude, i.e. twice the geometric area; thresholds
// are calibrated against this scale
fn triangle_area(a: SamplePoint, b: SamplePoint, tip: SamplePoint) -> f64 {
    ((a.x - tip.x) * (b.y - tip.y) - (b.x - tip.x) * (a.y - tip.y)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(raw: &[(f64, f64)]) -> Vec<SamplePoint> {
        raw.iter().map(|&(x, y)| SamplePoint::new(x, y)).collect()
    }

    #[test]
    fn test_collinear_interior_points_are_dropped() {
        let line = points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let simplified = visvalingam(&line, 1e-9);
        assert_eq!(simplified, points(&[(0.0, 0.0), (3.0, 3.0)]));
    }

    #[test]
    fn test_flat_run_cascades() {
        let line = points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let simplified = visvalingam(&line, 1.0);
        assert_eq!(simplified, points(&[(0.0, 0.0), (3.0, 0.0)]));
    }

    #[test]
    fn test_spike_survives_while_noise_goes() {
        let line = points(&[(0.0, 0.0), (1.0, 0.001), (2.0, 0.0), (3.0, 100.0)]);
        let simplified = visvalingam(&line, 0.1);
        assert_eq!(
            simplified,
            points(&[(0.0, 0.0), (2.0, 0.0), (3.0, 100.0)])
        );
    }

    #[test]
    fn test_zero_epsilon_keeps_everything() {
        let line = points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(visvalingam(&line, 0.0), line);
    }

    #[test]
    fn test_short_inputs_pass_through() {
        let line = points(&[(0.0, 1.0), (5.0, 2.0)]);
        assert_eq!(visvalingam(&line, 1e6), line);
        assert!(visvalingam(&[], 1e6).is_empty());
    }
}
