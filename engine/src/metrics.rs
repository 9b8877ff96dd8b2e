//! Per-flight figures derived from the sample sequence.
//!
//! Telemetry clocks are messy.  DJI logs in particular mix epoch placeholder
//! rows with real ones and the occasional wild timestamp, so the duration
//! used in statistics filters outliers with an IQR fence before taking the
//! span.  The raw span stays available for the import gate, which wants the
//! unfiltered value.
//!

use sortie_formats::Sample;

/// Multiplier on the interquartile range.  2.5 rather than the usual 1.5,
/// long gaps between telemetry bursts are legitimate in these logs.
const IQR_FENCE: f64 = 2.5;

// -----

/// Sort samples chronologically.  Raw logs are not guaranteed monotonic.
///
pub fn sort_samples(samples: &mut [Sample]) {
    samples.sort_by_key(|s| s.time);
}

/// Unfiltered span in seconds, `max - min` over all timestamps.
///
pub fn simple_span(samples: &[Sample]) -> f64 {
    if samples.len() < 2 {
        return 0.;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for s in samples {
        let t = s.epoch();
        min = min.min(t);
        max = max.max(t);
    }
    max - min
}

/// Flight duration in seconds with outlier timestamps filtered out.
///
/// Quartiles are taken by index truncation on the sorted timestamps, the
/// fence is `[q1 - 2.5*iqr, q3 + 2.5*iqr]` inclusive.  When filtering leaves
/// fewer than two points the full span is used instead.
///
pub fn robust_duration(samples: &[Sample]) -> f64 {
    if samples.len() < 2 {
        return 0.;
    }

    let mut ts: Vec<f64> = samples.iter().map(Sample::epoch).collect();
    ts.sort_by(f64::total_cmp);

    let n = ts.len();
    if n < 4 {
        return ts[n - 1] - ts[0];
    }

    let q1 = ts[(n as f64 * 0.25) as usize];
    let q3 = ts[(n as f64 * 0.75) as usize];
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    let kept: Vec<f64> = ts
        .iter()
        .copied()
        .filter(|t| (lower..=upper).contains(t))
        .collect();
    if kept.len() < 2 {
        return ts[n - 1] - ts[0];
    }
    kept[kept.len() - 1] - kept[0]
}

/// Fill in `distance_from_start` for every positioned sample, measured from
/// the first sample in sequence order that has both coordinates.  Samples
/// without a fix keep no distance.
///
pub fn fill_distances(samples: &mut [Sample]) {
    let anchor = match samples.iter().find_map(|s| s.position()) {
        Some(p) => p,
        None => return,
    };
    samples.iter_mut().for_each(|s| {
        if let Some(p) = s.position() {
            s.distance_from_start = Some(anchor.distance_to(&p));
        }
    });
}

/// Farthest point reached, 0 when no sample carries a distance.
///
pub fn max_distance(samples: &[Sample]) -> f64 {
    samples
        .iter()
        .filter_map(|s| s.distance_from_start)
        .fold(0., f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn at(secs: i64) -> Sample {
        Sample {
            time: Utc.timestamp_opt(1_718_000_000 + secs, 0).unwrap(),
            latitude: None,
            longitude: None,
            altitude: None,
            speed: None,
            rx_battery: None,
            rssi: None,
            link_quality: None,
            distance_from_start: None,
        }
    }

    fn at_pos(secs: i64, lat: f64, lon: f64) -> Sample {
        Sample {
            latitude: Some(lat),
            longitude: Some(lon),
            ..at(secs)
        }
    }

    #[test]
    fn test_sort_samples_orders_by_time() {
        let mut samples = vec![at(5), at(0), at(3)];
        sort_samples(&mut samples);
        let spans: Vec<i64> = samples
            .windows(2)
            .map(|w| (w[1].time - w[0].time).num_seconds())
            .collect();
        assert_eq!(vec![3, 2], spans);
    }

    #[rstest]
    #[case(vec![], 0.)]
    #[case(vec![at(42)], 0.)]
    #[case(vec![at(0), at(10)], 10.)]
    #[case(vec![at(10), at(0), at(4)], 10.)]
    fn test_simple_span(#[case] samples: Vec<Sample>, #[case] expected: f64) {
        assert_eq!(expected, simple_span(&samples));
    }

    #[rstest]
    #[case(vec![], 0.)]
    #[case(vec![at(42)], 0.)]
    #[case(vec![at(0), at(5), at(10)], 10.)]
    fn test_robust_duration_small_sets(#[case] samples: Vec<Sample>, #[case] expected: f64) {
        assert_eq!(expected, robust_duration(&samples));
    }

    #[test]
    fn test_robust_duration_drops_extreme_outlier() {
        let samples = vec![at(0), at(1), at(2), at(3), at(100_000)];
        let d = robust_duration(&samples);
        assert!((d - 3.).abs() < f64::EPSILON, "got {d}");
    }

    #[test]
    fn test_robust_duration_keeps_regular_sequence() {
        let samples: Vec<Sample> = (0..60).map(at).collect();
        assert_eq!(59., robust_duration(&samples));
    }

    #[test]
    fn test_robust_duration_sorts_internally() {
        let samples = vec![at(100_000), at(3), at(0), at(1), at(2)];
        assert!((robust_duration(&samples) - 3.).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fill_distances_anchors_on_first_fix() {
        let mut samples = vec![
            at(0),
            at_pos(1, 45.0, 7.0),
            at_pos(2, 45.001, 7.0),
            at(3),
        ];
        fill_distances(&mut samples);

        assert_eq!(None, samples[0].distance_from_start);
        assert_eq!(Some(0.), samples[1].distance_from_start);
        let d = samples[2].distance_from_start.unwrap();
        assert!((d - 111.19).abs() < 0.5);
        assert_eq!(None, samples[3].distance_from_start);
    }

    #[test]
    fn test_fill_distances_without_any_fix() {
        let mut samples = vec![at(0), at(1)];
        fill_distances(&mut samples);
        assert!(samples.iter().all(|s| s.distance_from_start.is_none()));
    }

    #[test]
    fn test_max_distance() {
        let mut samples = vec![at_pos(0, 45.0, 7.0), at_pos(1, 45.001, 7.0), at(2)];
        fill_distances(&mut samples);
        assert!((max_distance(&samples) - 111.19).abs() < 0.5);
        assert_eq!(0., max_distance(&[at(0)]));
    }
}
