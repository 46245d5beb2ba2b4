use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub phase_time: Duration,
    pub elapsed_time: Duration,
    pub memory_usage_mb: Option<u64>,
    pub peak_memory_mb: Option<u64>,
    pub cpu_usage: Option<f32>,
}

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: System,
    pid: Pid,
}

#[cfg(feature = "cli")]
impl ProcessProbe {
    fn new() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Resource monitoring unavailable: {}", e);
                return None;
            }
        };
        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();
        Some(Self { system, pid })
    }

    /// (記憶體 MB, CPU %)
    fn sample(&mut self) -> Option<(u64, f32)> {
        self.system.refresh_all();
        let process = self.system.process(self.pid)?;
        Some((process.memory() / 1024 / 1024, process.cpu_usage()))
    }
}

#[cfg(not(feature = "cli"))]
struct ProcessProbe;

#[cfg(not(feature = "cli"))]
impl ProcessProbe {
    fn new() -> Option<Self> {
        None
    }

    fn sample(&mut self) -> Option<(u64, f32)> {
        None
    }
}

struct MonitorState {
    probe: Option<ProcessProbe>,
    last_checkpoint: Instant,
    peak_memory_mb: u64,
    phases: Vec<PhaseStats>,
}

/// 每個階段結束時記錄耗時；啟用時另外記錄本行程的記憶體與 CPU
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    state: Mutex<MonitorState>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            state: Mutex::new(MonitorState {
                probe: if enabled { ProcessProbe::new() } else { None },
                last_checkpoint: now,
                peak_memory_mb: 0,
                phases: Vec::new(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn checkpoint(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let mut state = self.state.lock().ok()?;
        let now = Instant::now();
        let phase_time = now.duration_since(state.last_checkpoint);
        state.last_checkpoint = now;

        let sample = state.probe.as_mut().and_then(|p| p.sample());
        if let Some((memory_mb, _)) = sample {
            state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);
        }

        let stats = PhaseStats {
            phase: phase.to_string(),
            phase_time,
            elapsed_time: self.start_time.elapsed(),
            memory_usage_mb: sample.map(|(m, _)| m),
            peak_memory_mb: sample.map(|_| state.peak_memory_mb),
            cpu_usage: sample.map(|(_, c)| c),
        };

        match (stats.memory_usage_mb, stats.cpu_usage) {
            (Some(memory), Some(cpu)) => tracing::info!(
                "📊 {} - {:?} (CPU: {:.1}%, Memory: {}MB, Peak: {}MB)",
                phase,
                phase_time,
                cpu,
                memory,
                state.peak_memory_mb
            ),
            _ => tracing::info!("📊 {} - {:?}", phase, phase_time),
        }

        state.phases.push(stats.clone());
        Some(stats)
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        self.state
            .lock()
            .map(|s| s.phases.clone())
            .unwrap_or_default()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        if let Ok(state) = self.state.lock() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                self.start_time.elapsed(),
                state.peak_memory_mb
            );
        }
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
