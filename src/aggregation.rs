// Pure per-VM aggregation: max/avg per metric, with out-of-range samples
// diverted to the anomaly list instead of skewing the summary.

use crate::models::{Anomaly, Metric, MetricSummaries, MetricSummary, RrdRow};

/// Samples above this rate (u32::MAX, a 4 GiB/s-equivalent) are known RRD
/// glitches on the platform, not real measurements.
pub const SAMPLE_CEILING: f64 = u32::MAX as f64;

/// Summarizes one VM's series. A series with fewer than two rows is
/// unreliable as a whole: every metric gets the sentinel and a single
/// `SingleRow` anomaly is recorded. Metrics whose valid set ends up empty
/// (all samples out of range, or the field absent from every row) also get
/// the sentinel; their out-of-range values stay in the anomaly list.
pub fn summarize(rows: &[RrdRow]) -> (MetricSummaries, Vec<Anomaly>) {
    if rows.len() < 2 {
        return (MetricSummaries::insufficient(), vec![Anomaly::SingleRow]);
    }

    let mut anomalies = Vec::new();
    let summaries = MetricSummaries::from_fn(|metric| {
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for row in rows {
            let Some(value) = row.value(metric) else {
                continue;
            };
            if value > SAMPLE_CEILING {
                anomalies.push(Anomaly::OutOfRange { metric, value });
                continue;
            }
            max = max.max(value);
            sum += value;
            count += 1;
        }
        if count == 0 {
            return MetricSummary::INSUFFICIENT;
        }
        MetricSummary {
            max,
            avg: sum / count as f64,
        }
    });
    (summaries, anomalies)
}
