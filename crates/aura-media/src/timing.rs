//! Slide duration allocation.

/// Split `total_secs` across segments in proportion to their character
/// lengths.
///
/// Each raw share is floored at `min_secs`, then all shares are rescaled so
/// they sum to exactly `total_secs`. The floor only shapes the relative
/// allocation; after rescaling a slide may end up shorter than `min_secs`.
/// An all-empty input is split equally.
pub fn allocate_durations(char_lens: &[usize], total_secs: f64, min_secs: f64) -> Vec<f64> {
    let n = char_lens.len();
    if n == 0 {
        return Vec::new();
    }
    let total = total_secs.max(0.0);
    let min = min_secs.max(0.0);

    let char_sum: usize = char_lens.iter().sum();
    let floored: Vec<f64> = char_lens
        .iter()
        .map(|&c| {
            let raw = if char_sum == 0 {
                total / n as f64
            } else {
                total * c as f64 / char_sum as f64
            };
            raw.max(min)
        })
        .collect();

    let floored_sum: f64 = floored.iter().sum();
    if floored_sum <= 0.0 {
        return vec![total / n as f64; n];
    }
    floored.iter().map(|d| d * total / floored_sum).collect()
}

/// Whole frame counts per slide at `fps`, cut on cumulative boundaries so the
/// clips together last `round(sum(durations) * fps)` frames. Every slide gets
/// at least one frame.
pub fn frame_counts(durations: &[f64], fps: u32) -> Vec<u64> {
    let mut counts = Vec::with_capacity(durations.len());
    let mut elapsed = 0.0;
    let mut prev_boundary = 0u64;

    for d in durations {
        elapsed += d.max(0.0);
        let boundary = (elapsed * fps as f64).round() as u64;
        let frames = boundary.saturating_sub(prev_boundary).max(1);
        prev_boundary += frames;
        counts.push(frames);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(v: &[f64]) -> f64 {
        v.iter().sum()
    }

    #[test]
    fn test_sum_matches_total() {
        let cases: &[(&[usize], f64, f64)] = &[
            (&[10, 200, 35, 0, 90], 63.7, 5.0),
            (&[1; 40], 12.0, 5.0),
            (&[500], 3.2, 5.0),
            (&[0, 0, 0], 9.0, 5.0),
            (&[3, 7], 100.0, 0.0),
        ];
        for (lens, total, min) in cases {
            let d = allocate_durations(lens, *total, *min);
            assert_eq!(d.len(), lens.len());
            assert!((sum(&d) - total).abs() < 1e-6, "{:?}", lens);
            assert!(d.iter().all(|x| *x >= 0.0));
        }
    }

    #[test]
    fn test_proportional_without_floor_pressure() {
        let d = allocate_durations(&[100, 300], 40.0, 1.0);
        assert!((d[0] - 10.0).abs() < 1e-9);
        assert!((d[1] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_favors_short_segments() {
        // raw: 1.0 / 19.0 -> floored 5.0 / 19.0 -> rescaled to 20s
        let d = allocate_durations(&[5, 95], 20.0, 5.0);
        assert!((d[0] - 5.0 * 20.0 / 24.0).abs() < 1e-9);
        assert!(d[0] > 1.0);
    }

    #[test]
    fn test_equal_split_for_empty_text() {
        let d = allocate_durations(&[0, 0], 10.0, 0.0);
        assert_eq!(d, vec![5.0, 5.0]);
        assert!(allocate_durations(&[], 10.0, 5.0).is_empty());
    }

    #[test]
    fn test_frame_counts_track_cumulative_time() {
        let counts = frame_counts(&[1.01, 1.01, 1.01], 30);
        assert_eq!(counts.iter().sum::<u64>(), 91);
        assert_eq!(counts, vec![30, 31, 30]);
    }

    #[test]
    fn test_frame_counts_minimum_one() {
        let counts = frame_counts(&[0.0, 2.0], 30);
        assert_eq!(counts[0], 1);
        assert!(counts[1] >= 59);
    }
}
