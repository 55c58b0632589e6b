//! System metrics snapshot for the `get_system_info` tool.
//!
//! Collection is blocking (sysinfo sleeps between CPU samples), so callers
//! run [`collect_metrics`] on the blocking pool.

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use sysinfo::{Disks, System};

/// Point-in-time machine metrics. Memory and disk sizes are bytes.
#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub system: SystemSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuMetrics {
    pub percent: f32,
    pub cores: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryMetrics {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub percent: f64,
}

/// Usage of the disk holding the system root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiskMetrics {
    pub mount_point: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub os_name: String,
    pub os_version: String,
    pub host_name: String,
    pub processes: usize,
    /// RFC 3339, local time.
    pub boot_time: String,
}

/// Take a metrics snapshot. Blocking.
pub fn collect_metrics() -> SystemMetrics {
    let mut sys = System::new_all();

    // CPU usage is a delta between two refreshes
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

    let total = sys.total_memory();
    let available = sys.available_memory();
    let memory = MemoryMetrics {
        total,
        available,
        used: sys.used_memory(),
        percent: percent_of(total.saturating_sub(available), total),
    };

    let disks = Disks::new_with_refreshed_list();
    let disk = pick_root_disk(&disks);

    SystemMetrics {
        cpu: CpuMetrics {
            percent: sys.global_cpu_usage(),
            cores: sys.cpus().len(),
        },
        memory,
        disk,
        system: SystemSummary {
            os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            host_name: System::host_name().unwrap_or_default(),
            processes: sys.processes().len(),
            boot_time: format_boot_time(System::boot_time()),
        },
    }
}

/// Root (`/`) or system drive (`C:\`); the largest disk otherwise. Zeros
/// when no disk is visible.
fn pick_root_disk(disks: &Disks) -> DiskMetrics {
    let list = disks.list();
    let root = list
        .iter()
        .find(|d| {
            let mount = d.mount_point().to_string_lossy();
            mount == "/" || mount.eq_ignore_ascii_case("C:\\")
        })
        .or_else(|| list.iter().max_by_key(|d| d.total_space()));

    match root {
        Some(d) => {
            let total = d.total_space();
            let free = d.available_space();
            let used = total.saturating_sub(free);
            DiskMetrics {
                mount_point: d.mount_point().to_string_lossy().into_owned(),
                total,
                free,
                used,
                percent: percent_of(used, total),
            }
        }
        None => DiskMetrics::default(),
    }
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}

/// Render a Unix timestamp; falls back to now when out of range.
fn format_boot_time(secs: u64) -> String {
    let boot: Option<DateTime<Local>> = i64::try_from(secs)
        .ok()
        .and_then(|s| Local.timestamp_opt(s, 0).single());
    boot.unwrap_or_else(Local::now).to_rfc3339()
}
