//! System resource monitoring
//!
//! A point-in-time snapshot of CPU, memory, disk and network usage.

use serde::{Deserialize, Serialize};
use sysinfo::{Disks, Networks, System};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuUsage {
    pub usage_percent: f32,
    pub count: usize,
    pub frequency_mhz: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total_gb: f64,
    pub available_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_gb: f64,
    pub free_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub os: String,
    pub os_version: Option<String>,
    pub hostname: Option<String>,
    pub cpu: CpuUsage,
    pub memory: MemoryUsage,
    pub disk: Option<DiskUsage>,
    pub network: NetworkCounters,
}

fn gb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_GB, 2)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `part` as a percentage of `whole`, one decimal; zero when `whole` is zero
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 1)
}

/// Take a snapshot. Blocks for the CPU sampling interval, so async callers
/// should run it on a blocking thread.
pub fn snapshot() -> SystemSnapshot {
    let mut sys = System::new_all();
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

    let cpu = CpuUsage {
        usage_percent: sys.global_cpu_usage(),
        count: sys.cpus().len(),
        frequency_mhz: sys.cpus().first().map(|c| c.frequency()),
    };

    let total = sys.total_memory();
    let used = sys.used_memory();
    let memory = MemoryUsage {
        total_gb: gb(total),
        available_gb: gb(sys.available_memory()),
        used_gb: gb(used),
        percent: percent(used, total),
    };

    SystemSnapshot {
        os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        os_version: System::long_os_version(),
        hostname: System::host_name(),
        cpu,
        memory,
        disk: system_disk(),
        network: network_counters(),
    }
}

/// The disk mounted at the filesystem root, or the largest one
fn system_disk() -> Option<DiskUsage> {
    let disks = Disks::new_with_refreshed_list();
    let is_root = |mount: &std::path::Path| {
        let mount = mount.to_string_lossy();
        mount == "/" || mount.eq_ignore_ascii_case("C:\\")
    };
    let disk = disks
        .list()
        .iter()
        .find(|d| is_root(d.mount_point()))
        .or_else(|| disks.list().iter().max_by_key(|d| d.total_space()))?;

    let total = disk.total_space();
    let free = disk.available_space();
    let used = total.saturating_sub(free);
    Some(DiskUsage {
        mount_point: disk.mount_point().display().to_string(),
        total_gb: gb(total),
        free_gb: gb(free),
        used_gb: gb(used),
        percent: percent(used, total),
    })
}

fn network_counters() -> NetworkCounters {
    let networks = Networks::new_with_refreshed_list();
    networks
        .list()
        .values()
        .fold(NetworkCounters::default(), |mut acc, data| {
            acc.bytes_sent += data.total_transmitted();
            acc.bytes_recv += data.total_received();
            acc.packets_sent += data.total_packets_transmitted();
            acc.packets_recv += data.total_packets_received();
            acc
        })
}
