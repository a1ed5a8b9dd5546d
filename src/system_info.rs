use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use sysinfo::System;

use crate::benchmarks::backend::{CliGitClient, Libgit2Client};

const UNKNOWN: &str = "<unknown>";

/// Description of the host and of the git clients being compared
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub system_name: String,
    pub kernel_version: String,
    pub os_version: String,
    pub cpu_arch: String,
    pub cpu: String,
    pub cpu_count: usize,
    pub total_memory: u64,
    pub used_memory: u64,
    pub uptime_seconds: u64,
    pub git_version: String,
    pub libgit2_version: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpus = sys.cpus();
        let cpu = cpus
            .first()
            .map(|c| format!("{} @ {:.2} GHz", c.brand(), c.frequency() as f64 / 1000.0))
            .unwrap_or_else(|| UNKNOWN.to_owned());

        Self {
            system_name: System::name().unwrap_or_else(|| UNKNOWN.to_owned()),
            kernel_version: System::kernel_version().unwrap_or_else(|| UNKNOWN.to_owned()),
            os_version: System::long_os_version().unwrap_or_else(|| UNKNOWN.to_owned()),
            cpu_arch: System::cpu_arch().to_string(),
            cpu,
            cpu_count: cpus.len(),
            total_memory: sys.total_memory(),
            used_memory: sys.used_memory(),
            uptime_seconds: System::uptime(),
            git_version: CliGitClient::version().unwrap_or_else(|_| "git not found".to_owned()),
            libgit2_version: Libgit2Client::version(),
        }
    }

    #[rustfmt::skip]
    pub fn write_to(&self, path: &Path) -> Result<()> {
        info!("Writing system info to {path:?}");
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writeln!(file, "{:<25}{}", "System name:", self.system_name)?;
        writeln!(file, "{:<25}{}", "System kernel version:", self.kernel_version)?;
        writeln!(file, "{:<25}{}", "System OS version:", self.os_version)?;
        writeln!(file, "{:<25}{}", "CPU Arch:", self.cpu_arch)?;
        writeln!(file, "{:<25}{} ({})", "CPU:", self.cpu, self.cpu_count)?;
        writeln!(file, "{:<25}{} bytes", "Total memory:", self.total_memory)?;
        writeln!(file, "{:<25}{} bytes", "Used memory:", self.used_memory)?;
        writeln!(file, "{:<25}{}", "Uptime (seconds):", self.uptime_seconds)?;
        writeln!(file, "{:<25}{}", "git:", self.git_version)?;
        writeln!(file, "{:<25}{}", "libgit2:", self.libgit2_version)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_system_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system_info");
        let info = SystemInfo::collect();
        info.write_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("libgit2:"));
        assert!(contents.contains(&info.libgit2_version));
        assert!(contents.lines().count() >= 10);
    }
}
