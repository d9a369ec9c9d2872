//! Sample series generation.

/// Relative slack so that `to` survives float drift (`44.5 + 10 * 0.1`).
const STEP_TOLERANCE: f64 = 1e-9;

/// Ascending timestamps `from, from + step, …` up to and including `to`.
///
/// Element `i` is computed as `from + i * step` rather than by repeated
/// addition, and the last element is clamped to `to`. Returns an empty
/// series for a non-positive step, non-finite input, or `from > to`.
pub fn generate(from: f64, to: f64, step: f64) -> Vec<f64> {
    if !(from.is_finite() && to.is_finite() && step.is_finite()) || step <= 0.0 || from > to {
        return Vec::new();
    }

    let span = (to - from) / step;
    let count = (span + span * STEP_TOLERANCE + STEP_TOLERANCE).floor() as usize + 1;
    (0..count)
        .map(|i| (from + i as f64 * step).min(to))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coarse_series_over_full_duration() {
        assert_eq!(
            generate(0.0, 100.0, 20.0),
            vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
        );
    }

    #[test]
    fn test_series_stops_before_exceeding_to() {
        assert_eq!(generate(0.0, 99.0, 20.0), vec![0.0, 20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_fractional_step_keeps_last_sample() {
        let series = generate(44.5, 45.5, 0.1);
        assert_eq!(series.len(), 11);
        assert_eq!(*series.last().unwrap(), 45.5);
        assert!((series[3] - 44.8).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(generate(5.0, 5.0, 1.0), vec![5.0]);
        assert!(generate(6.0, 5.0, 1.0).is_empty());
        assert!(generate(0.0, 5.0, 0.0).is_empty());
        assert!(generate(0.0, 5.0, -1.0).is_empty());
        assert!(generate(0.0, f64::NAN, 1.0).is_empty());
    }

    proptest! {
        #[test]
        fn series_is_ascending_bounded_and_sized(
            from in 0u32..1000,
            step_idx in 0usize..6,
            k in 0usize..200,
            frac in 0.0f64..0.9,
        ) {
            let step = [0.25, 0.5, 1.0, 2.0, 5.0, 20.0][step_idx];
            let from = from as f64;
            let to = from + k as f64 * step + frac * step;
            let series = generate(from, to, step);

            prop_assert_eq!(series.len(), ((to - from) / step).floor() as usize + 1);
            prop_assert_eq!(series[0], from);
            prop_assert!(series.iter().all(|e| *e >= from && *e <= to));
            prop_assert!(series.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
