use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub phase_elapsed: Duration,
    pub total_elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
}

/// 記錄每個階段（extract / transform / load）耗時與行程記憶體
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    last_mark: Mutex<Instant>,
    #[cfg(feature = "cli")]
    process: Option<(Mutex<System>, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            last_mark: Mutex::new(now),
            #[cfg(feature = "cli")]
            process: if enabled {
                sysinfo::get_current_pid()
                    .ok()
                    .map(|pid| (Mutex::new(System::new()), pid))
            } else {
                None
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn memory_mb(&self) -> Option<u64> {
        let (system, pid) = self.process.as_ref()?;
        let mut system = system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[*pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(*pid).map(|p| p.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn memory_mb(&self) -> Option<u64> {
        None
    }

    /// 結束一個階段並回傳統計；未啟用時回傳 None
    pub fn mark(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let phase_elapsed = {
            let mut last = self.last_mark.lock().ok()?;
            let elapsed = now.duration_since(*last);
            *last = now;
            elapsed
        };

        Some(PhaseStats {
            phase: phase.to_string(),
            phase_elapsed,
            total_elapsed: now.duration_since(self.start_time),
            memory_usage_mb: self.memory_mb(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.mark(phase) {
            match stats.memory_usage_mb {
                Some(mb) => tracing::info!(
                    "📊 {} - took {:?}, memory {}MB, total {:?}",
                    stats.phase,
                    stats.phase_elapsed,
                    mb,
                    stats.total_elapsed
                ),
                None => tracing::info!(
                    "📊 {} - took {:?}, total {:?}",
                    stats.phase,
                    stats.phase_elapsed,
                    stats.total_elapsed
                ),
            }
        }
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
