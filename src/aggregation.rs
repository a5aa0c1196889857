use serde::Deserialize;
use crate::errors::{AggregationError, DataGapError, ValidationError};
use crate::models::forecast::ForecastSeries;
use crate::models::geo::Position;

/// What to do when a merge input holds an absent value at a contributing index
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Fail the merge with a DataGapError
    #[default]
    Reject,
    /// Write an absent value at that index of the merged series
    Propagate,
}

/// Merges forecasts for several locations into one weighted spatial average
#[derive(Clone, Copy, Debug, Default)]
pub struct SeriesAggregator {
    gap_policy: GapPolicy,
}

impl SeriesAggregator {
    pub fn new(gap_policy: GapPolicy) -> SeriesAggregator {
        SeriesAggregator { gap_policy }
    }

    /// Merges several forecasts into one, using optional weights.
    ///
    /// Weights are normalized so only their proportions matter, without weights all
    /// series weigh the same. The merged series keeps the time axis of the first series,
    /// sits at the weighted centroid of the inputs and holds, per attribute and index,
    /// the weighted sum of the input values. Inputs are left untouched.
    ///
    /// At least two series are required, and all of them must share the attribute set
    /// and the exact time stamps of the first one.
    ///
    /// # Arguments
    ///
    /// * 'series' - the forecasts to merge
    /// * 'weights' - one positive weight per forecast, or None for equal weights
    pub fn merge(&self, series: &[ForecastSeries], weights: Option<&[f64]>) -> Result<ForecastSeries, AggregationError> {
        if series.len() < 2 {
            return Err(ValidationError::from("merging requires at least 2 forecasts").into());
        }
        let weights = match weights {
            Some(w) => w.to_vec(),
            None => vec![1.0; series.len()],
        };
        if weights.len() != series.len() {
            return Err(ValidationError(format!(
                "number of forecasts ({}) and weights ({}) must match", series.len(), weights.len())).into());
        }
        let weights = normalize(&weights)?;

        let first = &series[0];
        for s in &series[1..] {
            if s.attributes() != first.attributes() {
                return Err(ValidationError::from("forecasts have different attribute sets").into());
            }
            if s.timestamps() != first.timestamps() {
                return Err(ValidationError::from("non-overlapping forecasts").into());
            }
        }

        let position = centroid(series, &weights);

        let attributes = first.attributes();
        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(attributes.len());
        for (a, attribute) in attributes.iter().enumerate() {
            let mut column: Vec<Option<f64>> = Vec::with_capacity(first.len());
            for t in 0..first.len() {
                let mut sum = Some(0.0);
                for (s, w) in series.iter().zip(weights.iter()) {
                    match s.column(a)[t] {
                        Some(v) => sum = sum.map(|acc| acc + v * w),
                        None if self.gap_policy == GapPolicy::Reject => {
                            return Err(DataGapError {
                                attribute: attribute.name(),
                                timestamp: first.timestamps()[t],
                            }.into());
                        }
                        None => sum = None,
                    }
                }
                column.push(sum);
            }
            columns.push(column);
        }

        Ok(ForecastSeries::from_columns(attributes, position, first.timestamps().to_vec(), columns)?)
    }
}

/// Divides every weight by the sum of all weights
///
/// # Arguments
///
/// * 'weights' - positive, finite weights
pub fn normalize(weights: &[f64]) -> Result<Vec<f64>, ValidationError> {
    if let Some(w) = weights.iter().find(|w| !(**w > 0.0 && w.is_finite())) {
        return Err(ValidationError(format!("weight {} must be a positive number", w)));
    }
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() {
        return Err(ValidationError::from("sum of weights is not finite"));
    }

    Ok(weights.iter().map(|w| w / sum).collect())
}

/// Weighted centroid of the series positions, elevation only when every series has one
fn centroid(series: &[ForecastSeries], weights: &[f64]) -> Position {
    let mut position = Position { lat: 0.0, lon: 0.0, elevation: Some(0.0) };
    for (s, w) in series.iter().zip(weights.iter()) {
        let p = s.position();
        position.lat += p.lat * w;
        position.lon += p.lon * w;
        position.elevation = match (position.elevation, p.elevation) {
            (Some(acc), Some(e)) => Some(acc + e * w),
            _ => None,
        };
    }

    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forecast::tests::{series, ts};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_normalize() {
        let w = normalize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(w.iter().map(|v| (v * 10.0).round() / 10.0).collect::<Vec<f64>>(), vec![0.1, 0.2, 0.3, 0.4]);
        let w = normalize(&[4.0, 2.3, 3.5, 0.2]).unwrap();
        assert_eq!(w.iter().map(|v| (v * 100.0).round() / 100.0).collect::<Vec<f64>>(), vec![0.4, 0.23, 0.35, 0.02]);
        assert!(normalize(&[1.0, 0.0]).is_err());
        assert!(normalize(&[1.0, -2.0]).is_err());
        assert!(normalize(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_merge_equal_weights() {
        let a = series(48.0, 11.0, &["2025-09-17"], &[Some(1.0)]);
        let b = series(49.0, 12.0, &["2025-09-17"], &[Some(2.0)]);

        let merged = SeriesAggregator::default().merge(&[a, b], None).unwrap();
        assert_eq!((merged.position().lat, merged.position().lon), (48.5, 11.5));
        assert_eq!(merged.timestamps(), &[ts("2025-09-17")]);
        assert_eq!(merged.values("temperature_degc").unwrap(), &[Some(1.5)]);
        assert_eq!(merged.values("cloud_cover_perc").unwrap(), &[Some(15.0)]);
    }

    #[test]
    fn test_merge_applies_weights() {
        let a = series(48.0, 11.0, &["2025-09-17"], &[Some(1.0)]);
        let b = series(49.0, 12.0, &["2025-09-17"], &[Some(2.0)]);

        let merged = SeriesAggregator::default().merge(&[a, b], Some(&[3.0, 1.0][..])).unwrap();
        assert_eq!((merged.position().lat, merged.position().lon), (48.25, 11.25));
        assert_eq!(merged.values("temperature_degc").unwrap(), &[Some(1.25)]);
    }

    #[test]
    fn test_merge_longer_forecasts() {
        let a = series(48.0, 11.0, &["2025-09-18", "2025-09-19"], &[Some(1.0), Some(2.0)]);
        let b = series(49.0, 12.0, &["2025-09-18", "2025-09-19"], &[Some(3.0), Some(4.0)]);

        let merged = SeriesAggregator::default().merge(&[a, b], Some(&[1.0, 9.0][..])).unwrap();
        assert_close(merged.position().lat, 48.9);
        assert_close(merged.position().lon, 11.9);
        let t = merged.values("temperature_degc").unwrap();
        assert_close(t[0].unwrap(), 2.8);
        assert_close(t[1].unwrap(), 3.8);
    }

    #[test]
    fn test_merge_rejects_single_series() {
        let a = series(48.0, 11.0, &["2025-09-17"], &[Some(1.0)]);
        let aggregator = SeriesAggregator::default();
        for weights in [None, Some(&[1.0][..]), Some(&[1.0, 2.0][..])] {
            let res = aggregator.merge(&[a.clone()], weights);
            assert!(matches!(res, Err(AggregationError::Validation(_))));
        }
        assert!(matches!(aggregator.merge(&[], None), Err(AggregationError::Validation(_))));
    }

    #[test]
    fn test_merge_rejects_weight_count_mismatch() {
        let a = series(48.0, 11.0, &["2025-09-17"], &[Some(1.0)]);
        let b = series(49.0, 12.0, &["2025-09-17"], &[Some(2.0)]);
        let res = SeriesAggregator::default().merge(&[a, b], Some(&[1.0][..]));
        assert!(matches!(res, Err(AggregationError::Validation(_))));
    }

    #[test]
    fn test_merge_rejects_non_overlapping_forecasts() {
        let a = series(50.0, 13.0, &["2025-09-20"], &[Some(3.0)]);
        let b = series(50.0, 13.0, &["2025-09-21"], &[Some(3.0)]);
        match SeriesAggregator::default().merge(&[a.clone(), b], None) {
            Err(AggregationError::Validation(e)) => assert_eq!(e, ValidationError::from("non-overlapping forecasts")),
            other => panic!("unexpected result {:?}", other),
        }

        // Same length is not enough, stamps have to match point for point
        let c = series(50.0, 13.0, &["2025-09-20", "2025-09-21"], &[Some(3.0), Some(4.0)]);
        let d = series(50.0, 13.0, &["2025-09-20", "2025-09-22"], &[Some(3.0), Some(4.0)]);
        assert!(SeriesAggregator::default().merge(&[c.clone(), d], None).is_err());
        assert!(SeriesAggregator::default().merge(&[a, c], None).is_err());
    }

    #[test]
    fn test_merge_is_scale_invariant() {
        let stamps = ["2025-09-17T00:00", "2025-09-17T01:00", "2025-09-17T02:00"];
        let inputs = [
            series(48.0, 11.0, &stamps, &[Some(1.3), Some(-2.0), Some(7.1)]),
            series(49.5, 12.2, &stamps, &[Some(4.2), Some(0.5), Some(3.3)]),
            series(52.1, 9.7, &stamps, &[Some(-0.7), Some(8.0), Some(5.9)]),
        ];
        let aggregator = SeriesAggregator::default();
        let base = [26.8, 3.5, 11.0];
        let reference = aggregator.merge(&inputs, Some(&base[..])).unwrap();

        for k in [0.001, 0.5, 3.0, 1e6] {
            let scaled = base.iter().map(|w| w * k).collect::<Vec<f64>>();
            let merged = aggregator.merge(&inputs, Some(scaled.as_slice())).unwrap();
            assert_close(merged.position().lat, reference.position().lat);
            assert_close(merged.position().lon, reference.position().lon);
            for a in 0..merged.attributes().len() {
                for (x, y) in merged.column(a).iter().zip(reference.column(a).iter()) {
                    assert_close(x.unwrap(), y.unwrap());
                }
            }
        }
    }

    #[test]
    fn test_merge_is_convex() {
        let stamps = ["2025-09-17T00:00", "2025-09-17T01:00", "2025-09-17T02:00"];
        let inputs = [
            series(48.0, 11.0, &stamps, &[Some(1.3), Some(-2.0), Some(7.1)]),
            series(49.5, 12.2, &stamps, &[Some(4.2), Some(0.5), Some(3.3)]),
            series(52.1, 9.7, &stamps, &[Some(-0.7), Some(8.0), Some(5.9)]),
        ];
        let aggregator = SeriesAggregator::default();

        for weights in [[1.0, 1.0, 1.0], [0.1, 5.0, 2.0], [100.0, 0.01, 0.01]] {
            let merged = aggregator.merge(&inputs, Some(&weights[..])).unwrap();
            for a in 0..merged.attributes().len() {
                for t in 0..merged.len() {
                    let vals = inputs.iter().map(|s| s.column(a)[t].unwrap()).collect::<Vec<f64>>();
                    let min = vals.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let v = merged.column(a)[t].unwrap();
                    assert!(v >= min - 1e-9 && v <= max + 1e-9, "{} not in [{}, {}]", v, min, max);
                }
            }
        }
    }

    #[test]
    fn test_merge_with_itself_is_identity() {
        let stamps = ["2025-09-17T00:00", "2025-09-17T01:00"];
        let s = series(48.3, 11.7, &stamps, &[Some(13.37), Some(-4.2)]);
        let merged = SeriesAggregator::default().merge(&[s.clone(), s.clone()], None).unwrap();

        assert_close(merged.position().lat, s.position().lat);
        assert_close(merged.position().lon, s.position().lon);
        assert_eq!(merged.timestamps(), s.timestamps());
        for a in 0..s.attributes().len() {
            for (x, y) in merged.column(a).iter().zip(s.column(a).iter()) {
                assert_close(x.unwrap(), y.unwrap());
            }
        }
    }

    #[test]
    fn test_merge_leaves_inputs_untouched() {
        let a = series(48.0, 11.0, &["2025-09-17"], &[Some(1.0)]);
        let b = series(49.0, 12.0, &["2025-09-17"], &[Some(2.0)]);
        let inputs = [a.clone(), b.clone()];
        let _ = SeriesAggregator::default().merge(&inputs, Some(&[3.0, 1.0][..])).unwrap();
        assert_eq!(inputs, [a, b]);
    }

    #[test]
    fn test_merge_rejects_gaps_by_default() {
        let a = series(48.0, 11.0, &["2021-06-01T00:00", "2021-06-01T01:00"], &[Some(1.0), None]);
        let b = series(49.0, 12.0, &["2021-06-01T00:00", "2021-06-01T01:00"], &[Some(2.0), Some(3.0)]);

        match SeriesAggregator::default().merge(&[a, b], None) {
            Err(AggregationError::DataGap(e)) => {
                assert_eq!(e.attribute, "temperature_degc");
                assert_eq!(e.timestamp, ts("2021-06-01T01:00"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_merge_propagates_gaps() {
        let a = series(48.0, 11.0, &["2021-06-01T00:00", "2021-06-01T01:00"], &[Some(1.0), None]);
        let b = series(49.0, 12.0, &["2021-06-01T00:00", "2021-06-01T01:00"], &[Some(2.0), Some(3.0)]);

        let merged = SeriesAggregator::new(GapPolicy::Propagate).merge(&[a, b], None).unwrap();
        assert_eq!(merged.values("temperature_degc").unwrap(), &[Some(1.5), None]);
        assert_eq!(merged.values("cloud_cover_perc").unwrap(), &[Some(15.0), None]);
    }

    #[test]
    fn test_centroid_elevation() {
        let a = series(48.0, 11.0, &["2025-09-17"], &[Some(1.0)]);
        let b = series(49.0, 12.0, &["2025-09-17"], &[Some(2.0)]);
        assert_eq!(centroid(&[a.clone(), b.clone()], &[0.5, 0.5]).elevation, None);

        let with_elevation = |s: &ForecastSeries, e: f64| {
            let p = s.position();
            ForecastSeries::from_columns(
                s.attributes(),
                Position::new(p.lat, p.lon, Some(e)).unwrap(),
                s.timestamps().to_vec(),
                (0..s.attributes().len()).map(|i| s.column(i).to_vec()).collect(),
            ).unwrap()
        };
        let merged = SeriesAggregator::default()
            .merge(&[with_elevation(&a, 100.0), with_elevation(&b, 300.0)], Some(&[3.0, 1.0][..]))
            .unwrap();
        assert_eq!(merged.position().elevation, Some(150.0));
    }
}
