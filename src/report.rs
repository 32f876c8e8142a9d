// Report rendering: anomaly summary plus ranked top-N listings per
// (metric, statistic), with rates humanized to a fixed column width.

use crate::fetcher::AnomalyMap;
use crate::models::{Aggregation, Anomaly, Metric, MetricSummary, Timeframe, VmUsage};

const BYTE_UNITS: [&str; 4] = ["GiB/s", "MiB/s", "KiB/s", "B/s"];
const BIT_UNITS: [&str; 4] = ["Gibit/s", "Mibit/s", "Kibit/s", "bit/s"];

/// Widest unit label ("Kibit/s"), so all value columns line up.
const UNIT_WIDTH: usize = 7;

/// Which side of a `MetricSummary` a listing ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Avg,
    Max,
}

impl Stat {
    fn label(self) -> &'static str {
        match self {
            Stat::Avg => "average",
            Stat::Max => "max",
        }
    }

    fn of(self, summary: MetricSummary) -> f64 {
        match self {
            Stat::Avg => summary.avg,
            Stat::Max => summary.max,
        }
    }
}

/// Steps up the ladder (ordered largest unit first) from the smallest
/// unit, dividing by 1024 until the value fits or the ladder runs out.
/// An empty ladder renders the bare value.
pub fn humanize_rate(raw: f64, units: &[&str], multiplier: f64) -> String {
    let mut value = raw * multiplier;
    if units.is_empty() {
        return format!("{value:>6.1} {unit:<UNIT_WIDTH$}", unit = "");
    }
    let mut idx = units.len() - 1;
    while value >= 1024.0 && idx > 0 {
        value /= 1024.0;
        idx -= 1;
    }
    format!("{value:>6.1} {unit:<UNIT_WIDTH$}", unit = units[idx])
}

/// CPU is a fraction of one core-second per second; shown as a percentage
/// at the same width as the rate columns.
pub fn format_percent(raw: f64) -> String {
    format!("{:>6.1} {unit:<UNIT_WIDTH$}", raw * 100.0, unit = "%")
}

fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        Metric::Cpu => format_percent(value),
        Metric::DiskRead | Metric::DiskWrite => humanize_rate(value, &BYTE_UNITS, 1.0),
        Metric::NetIn | Metric::NetOut => humanize_rate(value, &BIT_UNITS, 8.0),
    }
}

/// Full descending re-sort by one (metric, stat), truncated to `top`.
/// The sort is stable, so ties keep the input (API-iteration) order.
pub fn rank(usage: &[VmUsage], metric: Metric, stat: Stat, top: usize) -> Vec<&VmUsage> {
    let mut ordered: Vec<&VmUsage> = usage.iter().collect();
    ordered.sort_by(|a, b| {
        let av = stat.of(a.summary.get(metric));
        let bv = stat.of(b.summary.get(metric));
        bv.partial_cmp(&av).unwrap_or(std::cmp::Ordering::Equal)
    });
    ordered.truncate(top);
    ordered
}

fn anomaly_lines(anomalies: &AnomalyMap, total_vms: usize, top: usize) -> Vec<String> {
    if anomalies.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "ignored anomalous samples on {} of {} VMs:",
        anomalies.len(),
        total_vms
    )];
    let mut ranked: Vec<(&String, &Vec<Anomaly>)> = anomalies.iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    for (name, entries) in ranked.into_iter().take(top) {
        let rendered: Vec<String> = entries.iter().map(|a| a.to_string()).collect();
        lines.push(format!("  {name:<20} {}", rendered.join(", ")));
    }
    lines
}

/// Prints the whole report to stdout.
pub fn print_report(
    usage: &[VmUsage],
    anomalies: &AnomalyMap,
    top: usize,
    timeframe: Timeframe,
    cf: Aggregation,
) {
    println!(
        "resource usage over the last {timeframe} ({cf} samples), {} running VMs",
        usage.len()
    );
    for line in anomaly_lines(anomalies, usage.len(), top) {
        println!("{line}");
    }
    for metric in Metric::ALL {
        for stat in [Stat::Avg, Stat::Max] {
            println!();
            println!("top {top} {metric} by {}", stat.label());
            for (i, entry) in rank(usage, metric, stat, top).iter().enumerate() {
                println!(
                    "{:>3}. {} {:<10} {}",
                    i + 1,
                    format_value(metric, stat.of(entry.summary.get(metric))),
                    entry.vm.node,
                    entry.vm.name
                );
            }
        }
    }
}
