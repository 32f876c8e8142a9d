// Domain models: tracked metrics, cluster resource entries, RRD rows,
// per-VM summaries, and anomaly records.

use serde::Deserialize;
use std::fmt;

/// The five tracked metrics, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cpu,
    DiskRead,
    DiskWrite,
    NetIn,
    NetOut,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Cpu,
        Metric::DiskRead,
        Metric::DiskWrite,
        Metric::NetIn,
        Metric::NetOut,
    ];

    /// Field name used by the RRD API.
    pub fn api_name(self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::DiskRead => "diskread",
            Metric::DiskWrite => "diskwrite",
            Metric::NetIn => "netin",
            Metric::NetOut => "netout",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Historical window requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consolidation function the API applies when downsampling stored series.
/// Distinct from the max/avg the aggregator computes over the returned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Aggregation {
    #[value(name = "AVERAGE", alias = "average")]
    Average,
    #[value(name = "MAX", alias = "max")]
    Max,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Average => "AVERAGE",
            Aggregation::Max => "MAX",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One VM entry from the cluster resource listing (type "vm").
#[derive(Debug, Clone, Deserialize)]
pub struct VmEntry {
    pub vmid: u32,
    #[serde(default)]
    pub name: String,
    pub node: String,
    pub status: String,
}

/// One RRD time-series row. The API omits metric fields at the leading
/// edge of a window, so every metric is optional; unknown fields are
/// dropped at this boundary and never looked up dynamically.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RrdRow {
    pub time: f64,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub diskread: Option<f64>,
    #[serde(default)]
    pub diskwrite: Option<f64>,
    #[serde(default)]
    pub netin: Option<f64>,
    #[serde(default)]
    pub netout: Option<f64>,
}

impl RrdRow {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::DiskRead => self.diskread,
            Metric::DiskWrite => self.diskwrite,
            Metric::NetIn => self.netin,
            Metric::NetOut => self.netout,
        }
    }
}

/// Max and average of the valid samples for one (VM, metric) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub max: f64,
    pub avg: f64,
}

impl MetricSummary {
    /// Sentinel for "not enough reliable data to summarize".
    pub const INSUFFICIENT: MetricSummary = MetricSummary { max: -1.0, avg: -1.0 };
}

/// One summary per tracked metric, indexed by `Metric` declaration order.
#[derive(Debug, Clone)]
pub struct MetricSummaries([MetricSummary; 5]);

impl MetricSummaries {
    pub fn from_fn(mut f: impl FnMut(Metric) -> MetricSummary) -> Self {
        Self(Metric::ALL.map(|m| f(m)))
    }

    pub fn insufficient() -> Self {
        Self([MetricSummary::INSUFFICIENT; 5])
    }

    pub fn get(&self, metric: Metric) -> MetricSummary {
        self.0[metric as usize]
    }
}

/// A VM together with its aggregated metrics for the run.
#[derive(Debug, Clone)]
pub struct VmUsage {
    pub vm: VmEntry,
    pub summary: MetricSummaries,
}

/// A sample the aggregator refused to trust. Out-of-range values are kept
/// verbatim so the report can show what the platform returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    OutOfRange { metric: Metric, value: f64 },
    SingleRow,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::OutOfRange { metric, value } => write!(f, "{metric}={value}"),
            Anomaly::SingleRow => f.write_str("single_row"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrd_row_tolerates_missing_and_unknown_fields() {
        let row: RrdRow =
            serde_json::from_str(r#"{"time": 1700000000, "cpu": 0.25, "maxcpu": 8}"#).unwrap();
        assert_eq!(row.time, 1_700_000_000.0);
        assert_eq!(row.value(Metric::Cpu), Some(0.25));
        assert_eq!(row.value(Metric::NetIn), None);
    }

    #[test]
    fn metric_order_matches_report_order() {
        let names: Vec<&str> = Metric::ALL.iter().map(|m| m.api_name()).collect();
        assert_eq!(names, ["cpu", "diskread", "diskwrite", "netin", "netout"]);
    }

    #[test]
    fn anomaly_display_keeps_raw_value() {
        let a = Anomaly::OutOfRange {
            metric: Metric::NetIn,
            value: 5_000_000_000.0,
        };
        assert_eq!(a.to_string(), "netin=5000000000");
        assert_eq!(Anomaly::SingleRow.to_string(), "single_row");
    }
}
