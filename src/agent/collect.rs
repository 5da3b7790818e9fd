//! Host sampling through `sysinfo`

use regex::Regex;
use sysinfo::{Disks, System};
use tracing::trace;

/// Used space of one mounted filesystem
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub mount_point: String,
    pub used_percent: f64,
}

/// One snapshot of the host's resource usage
#[derive(Debug, Clone, PartialEq)]
pub struct HostSample {
    pub host_name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disks: Vec<DiskUsage>,
}

/// Sample CPU, memory and disks
///
/// Blocks for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` so the CPU reading is
/// a real delta; call it from a blocking context.
pub fn sample_host(ignore_mounts: &[Regex]) -> HostSample {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let memory_percent = percent(sys.used_memory(), sys.total_memory());

    let disks = Disks::new_with_refreshed_list()
        .list()
        .iter()
        .filter(|disk| disk.total_space() > 0)
        .filter_map(|disk| {
            let mount_point = disk.mount_point().to_string_lossy().into_owned();
            if ignore_mounts.iter().any(|re| re.is_match(&mount_point)) {
                trace!("ignoring mount {}", mount_point);
                return None;
            }

            let used = disk.total_space().saturating_sub(disk.available_space());
            Some(DiskUsage {
                mount_point,
                used_percent: percent(used, disk.total_space()),
            })
        })
        .collect();

    HostSample {
        host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        cpu_percent: f64::from(sys.global_cpu_usage()),
        memory_percent,
        disks,
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}
