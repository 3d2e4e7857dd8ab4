// Viewport bounds - y extent of the samples a zoom window actually shows
use super::series::SamplePoint;

/// Min/max of the y values visible in the window `[x_lo, x_hi]`.
///
/// Samples inside the window count directly. The nearest sample on each
/// side of the window also counts when the curve continues into the window
/// from that side, because the connecting segment is partially visible.
/// Returns `(f64::INFINITY, f64::NEG_INFINITY)` when nothing is visible,
/// so callers can fold results from several series without a special case.
pub fn y_bounds(samples: &[SamplePoint], x_lo: f64, x_hi: f64) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    if x_lo > x_hi {
        return (min_y, max_y);
    }

    // nearest sample strictly left of the window, and strictly right of it
    let mut left: Option<SamplePoint> = None;
    let mut right: Option<SamplePoint> = None;
    let mut reaches_lo = false;
    let mut reaches_hi = false;

    for point in samples {
        if !point.x.is_finite() || !point.y.is_finite() {
            continue;
        }
        if point.x >= x_lo {
            reaches_lo = true;
        }
        if point.x <= x_hi {
            reaches_hi = true;
        }
        if point.x < x_lo {
            if left.is_none_or(|best| point.x > best.x) {
                left = Some(*point);
            }
        } else if point.x > x_hi {
            if right.is_none_or(|best| point.x < best.x) {
                right = Some(*point);
            }
        } else {
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }
    }

    if reaches_lo {
        if let Some(point) = left {
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }
    }
    if reaches_hi {
        if let Some(point) = right {
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }
    }
    (min_y, max_y)
}

/// Stretch an upper bound by the given fraction so peaks clear the frame.
pub fn pad_upper(value: f64, fraction: f64) -> f64 {
    value * (1.0 + fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(raw: &[(f64, f64)]) -> Vec<SamplePoint> {
        raw.iter().map(|&(x, y)| SamplePoint::new(x, y)).collect()
    }

    #[test]
    fn test_interior_and_exterior_samples_count() {
        let samples = points(&[(0.0, 1.0), (5.0, 10.0), (10.0, 2.0)]);
        // (5,10) is interior; (0,1) and (10,2) anchor the entering segments
        assert_eq!(y_bounds(&samples, 3.0, 8.0), (1.0, 10.0));
    }

    #[test]
    fn test_window_past_the_data_is_empty() {
        let samples = points(&[(0.0, 1.0), (5.0, 10.0)]);
        let (lo, hi) = y_bounds(&samples, 20.0, 30.0);
        assert_eq!(lo, f64::INFINITY);
        assert_eq!(hi, f64::NEG_INFINITY);
    }

    #[test]
    fn test_window_before_the_data_is_empty() {
        let samples = points(&[(10.0, 1.0), (15.0, 10.0)]);
        let (lo, hi) = y_bounds(&samples, 0.0, 5.0);
        assert_eq!(lo, f64::INFINITY);
        assert_eq!(hi, f64::NEG_INFINITY);
    }

    #[test]
    fn test_window_between_samples_uses_both_neighbors() {
        // no interior samples, but the segment from (2,4) to (9,8) crosses
        let samples = points(&[(2.0, 4.0), (9.0, 8.0)]);
        assert_eq!(y_bounds(&samples, 4.0, 6.0), (4.0, 8.0));
    }

    #[test]
    fn test_full_window_matches_global_extent() {
        let samples = points(&[(0.0, 3.0), (1.0, 7.0), (2.0, 5.0)]);
        assert_eq!(y_bounds(&samples, 0.0, 2.0), (3.0, 7.0));
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let samples = points(&[(0.0, 3.0), (1.0, 7.0)]);
        let (lo, hi) = y_bounds(&samples, 5.0, 2.0);
        assert_eq!(lo, f64::INFINITY);
        assert_eq!(hi, f64::NEG_INFINITY);
    }

    #[test]
    fn test_non_finite_samples_are_ignored() {
        let samples = points(&[(0.0, 1.0), (1.0, f64::NAN), (2.0, 3.0)]);
        assert_eq!(y_bounds(&samples, 0.0, 2.0), (1.0, 3.0));
    }

    #[test]
    fn test_matches_brute_force_scan() {
        let samples = points(&[
            (0.0, 5.0),
            (1.0, 2.0),
            (2.0, 9.0),
            (3.0, 1.0),
            (4.0, 7.0),
            (5.0, 3.0),
            (6.0, 8.0),
        ]);
        let windows = [
            (0.0, 6.0),
            (1.5, 4.5),
            (2.0, 2.0),
            (-3.0, -1.0),
            (0.5, 0.7),
            (4.2, 9.0),
        ];
        for &(lo, hi) in &windows {
            assert_eq!(
                y_bounds(&samples, lo, hi),
                brute_force(&samples, lo, hi),
                "window [{lo}, {hi}]"
            );
        }
    }

    // independently structured reference: collect every sample that is part
    // of a visible segment, then take the extremes
    fn brute_force(samples: &[SamplePoint], lo: f64, hi: f64) -> (f64, f64) {
        let mut visible: Vec<f64> = Vec::new();
        for p in samples {
            if p.x >= lo && p.x <= hi {
                visible.push(p.y);
            }
        }
        let before: Vec<&SamplePoint> = samples.iter().filter(|p| p.x < lo).collect();
        let after: Vec<&SamplePoint> = samples.iter().filter(|p| p.x > hi).collect();
        let reaches_lo = samples.iter().any(|p| p.x >= lo);
        let reaches_hi = samples.iter().any(|p| p.x <= hi);
        if reaches_lo {
            if let Some(p) = before.iter().max_by(|a, b| a.x.total_cmp(&b.x)) {
                visible.push(p.y);
            }
        }
        if reaches_hi {
            if let Some(p) = after.iter().min_by(|a, b| a.x.total_cmp(&b.x)) {
                visible.push(p.y);
            }
        }
        let min = visible.iter().copied().fold(f64::INFINITY, f64::min);
        let max = visible.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }
}
