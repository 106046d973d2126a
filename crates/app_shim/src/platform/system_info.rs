//! CPU and memory queries

use sysinfo::System;

/// Host capabilities relevant to an application at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// Logical CPUs visible to the process
    pub logical_cpus: usize,
    /// Total physical memory in bytes
    pub total_memory: u64,
    /// Memory available for new allocations in bytes
    pub available_memory: u64,
    /// Operating system name, if known
    pub os_name: Option<String>,
    /// Operating system version, if known
    pub os_version: Option<String>,
}

impl SystemInfo {
    /// Query the host
    pub fn query() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();

        let logical_cpus = match system.cpus().len() {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };

        Self {
            logical_cpus,
            total_memory: system.total_memory(),
            available_memory: system.available_memory(),
            os_name: System::name(),
            os_version: System::os_version(),
        }
    }

    /// Share of memory currently in use, between 0 and 1
    pub fn memory_load(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        let used = self.total_memory.saturating_sub(self.available_memory);
        used as f64 / self.total_memory as f64
    }

    /// Log a one-line summary at info level
    pub fn log_summary(&self) {
        log::info!(
            "Host: {} {} | {} logical CPUs | {} MiB total, {} MiB available",
            self.os_name.as_deref().unwrap_or("unknown OS"),
            self.os_version.as_deref().unwrap_or(""),
            self.logical_cpus,
            self.total_memory / (1024 * 1024),
            self.available_memory / (1024 * 1024),
        );
    }
}
