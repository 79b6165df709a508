#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

/// Samples this process's CPU and memory between pipeline stages.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: System,
    pid: Option<Pid>,
    start_time: Instant,
    peak_memory: u64,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(pid),
                Err(e) => {
                    tracing::warn!("System monitoring disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut system = System::new_with_specifics(RefreshKind::nothing());
        if pid.is_some() {
            system.refresh_all();
        }

        Self {
            system,
            pid,
            start_time: Instant::now(),
            peak_memory: 0,
        }
    }

    pub fn sample(&mut self) -> Option<SystemStats> {
        let pid = self.pid?;
        self.system.refresh_all();

        let process = self.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_memory = self.system.total_memory() / 1024 / 1024;
        let memory_percent = if total_memory > 0 {
            (memory_mb as f32 / total_memory as f32) * 100.0
        } else {
            0.0
        };

        self.peak_memory = self.peak_memory.max(memory_mb);

        Some(SystemStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            memory_usage_percent: memory_percent,
            peak_memory_mb: self.peak_memory,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&mut self, stage: &str) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                stage,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.memory_usage_percent,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&mut self) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pid.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 建置沒有 sysinfo，監控為空操作
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&mut self, _stage: &str) {}

    pub fn log_final_stats(&mut self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
