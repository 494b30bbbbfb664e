//! Memory utilization probes used for between-window backpressure.

use std::collections::VecDeque;

use sysinfo::{MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Reports the fraction of available memory currently in use
pub trait MemoryProbe: Send {
    /// Ratio of in-use to maximum memory, `None` when it cannot be measured
    fn utilization(&mut self) -> Option<f64>;
}

/// Probe reading this process's resident memory through `sysinfo`
///
/// Usage is measured against a configured ceiling, or against total host
/// memory when none is set.
pub struct SystemMemoryProbe {
    system: System,
    pid: Option<Pid>,
    ceiling: Option<u64>,
}

impl SystemMemoryProbe {
    /// Probe for the current process; `ceiling` is the allowed maximum in
    /// bytes
    #[must_use]
    pub fn new(ceiling: Option<u64>) -> Self {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| log::warn!("Cannot determine process id, memory probing disabled: {e}"))
            .ok();
        Self {
            system: System::new(),
            pid,
            ceiling,
        }
    }

    fn ceiling(&mut self) -> u64 {
        if let Some(ceiling) = self.ceiling {
            return ceiling;
        }
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::everything());
        let total = self.system.total_memory();
        if total > 0 {
            self.ceiling = Some(total);
        }
        total
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn utilization(&mut self) -> Option<f64> {
        let pid = self.pid?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            false,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let used = self.system.process(pid)?.memory();
        let ceiling = self.ceiling();
        utilization_ratio(used, ceiling)
    }
}

/// Ratio of `used` to `ceiling` bytes, `None` for an unknown ceiling
#[must_use]
pub fn utilization_ratio(used: u64, ceiling: u64) -> Option<f64> {
    (ceiling > 0).then(|| used as f64 / ceiling as f64)
}

/// Probe replaying a fixed sequence of readings, then repeating the last one
#[derive(Debug, Clone, Default)]
pub struct ScriptedMemoryProbe {
    readings: VecDeque<f64>,
    last: Option<f64>,
}

impl ScriptedMemoryProbe {
    #[must_use]
    pub fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: None,
        }
    }

    /// Probe that always reports the same utilization
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }
}

impl MemoryProbe for ScriptedMemoryProbe {
    fn utilization(&mut self) -> Option<f64> {
        if let Some(next) = self.readings.pop_front() {
            self.last = Some(next);
        }
        self.last
    }
}

/// Describe a utilization reading for logging
#[must_use]
pub fn describe_utilization(ratio: f64) -> String {
    format!("memory utilization {:.1}%", ratio * 100.0)
}
