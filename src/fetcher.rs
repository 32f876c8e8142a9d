// Sequential fetch/aggregate loop: one RRD query per running VM, in the
// order the cluster listing returns them. Fail-fast: any API error aborts
// the whole run.

use crate::aggregation;
use crate::models::{Aggregation, Anomaly, Timeframe, VmEntry, VmUsage};
use crate::proxmox_repo::ProxmoxRepo;
use anyhow::bail;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::info;

/// Anomalies per VM, keyed by VM name. Only VMs with at least one entry
/// appear here.
pub type AnomalyMap = BTreeMap<String, Vec<Anomaly>>;

/// Keep VMs whose name matches the filter list; an empty list keeps all.
pub(crate) fn name_matches(name: &str, filter: &[String], partial: bool) -> bool {
    if filter.is_empty() {
        return true;
    }
    if partial {
        filter.iter().any(|f| name.contains(f.as_str()))
    } else {
        filter.iter().any(|f| name == f)
    }
}

/// Lists VMs, filters by name, and aggregates each running VM's series.
/// Stopped VMs are skipped; any other status means the API contract
/// changed under us and the run must not continue.
pub async fn fetch_usage(
    repo: &ProxmoxRepo,
    timeframe: Timeframe,
    cf: Aggregation,
    only_vms: &[String],
    partial_match: bool,
) -> anyhow::Result<(Vec<VmUsage>, AnomalyMap)> {
    let vms = repo.list_vms().await?;
    info!("cluster reports {} VM entries", vms.len());

    let selected: Vec<VmEntry> = vms
        .into_iter()
        .filter(|vm| name_matches(&vm.name, only_vms, partial_match))
        .collect();

    let total = selected.len();
    let mut usage = Vec::with_capacity(total);
    let mut anomalies = AnomalyMap::new();
    for (i, vm) in selected.into_iter().enumerate() {
        match vm.status.as_str() {
            "running" => {
                let rows = repo.rrddata(&vm.node, vm.vmid, timeframe, cf).await?;
                let (summary, vm_anomalies) = aggregation::summarize(&rows);
                if !vm_anomalies.is_empty() {
                    anomalies.insert(vm.name.clone(), vm_anomalies);
                }
                usage.push(VmUsage { vm, summary });
            }
            "stopped" => {}
            other => bail!(
                "VM {} (vmid {}) reports status {:?}; expected running or stopped",
                vm.name,
                vm.vmid,
                other
            ),
        }
        eprint!("\rfetching: {:>3}%", (i + 1) * 100 / total);
        let _ = std::io::stderr().flush();
    }
    if total > 0 {
        eprintln!();
    }
    info!("aggregated {} running VMs", usage.len());
    Ok((usage, anomalies))
}
