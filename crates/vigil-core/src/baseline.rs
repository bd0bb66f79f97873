//! Baseline families registered on every `Registry::new()`.
//!
//! - process: CPU time, memory and start time via `sysinfo`; threads
//!   (`sysinfo`) and open/max file descriptors (`/proc/self`) on Linux only
//! - runtime: tokio worker and task counts from the current runtime

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::runtime::Handle;

use crate::error::{Result, VigilError};
use crate::metric::{CallbackCollector, ValueSource};

pub fn collectors() -> Vec<CallbackCollector> {
    let mut out = process_collectors();
    out.extend(runtime_collectors());
    out
}

fn runtime_collectors() -> Vec<CallbackCollector> {
    let defs: [(&str, &str, fn(&Handle) -> f64); 2] = [
        (
            "tokio_runtime_workers",
            "Number of worker threads used by the tokio runtime.",
            |h| h.metrics().num_workers() as f64,
        ),
        (
            "tokio_runtime_alive_tasks",
            "Number of tasks currently alive in the tokio runtime.",
            |h| h.metrics().num_alive_tasks() as f64,
        ),
    ];

    defs.into_iter()
        .filter_map(|(name, help, read)| {
            let source = ValueSource::fallible(move || {
                Handle::try_current()
                    .map(|h| read(&h))
                    .map_err(|e| e.to_string())
            });
            CallbackCollector::gauge(name, help, source).ok()
        })
        .collect()
}

/// Refreshes the current process into a fresh `System` and reads one value.
///
/// Each call owns its own `System`, so concurrent scrapes share nothing.
fn with_self<T>(read: impl FnOnce(&Process) -> Result<T>) -> Result<T> {
    let pid: Pid = sysinfo::get_current_pid().map_err(|e| VigilError::Source(e.to_string()))?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::everything(),
    );
    let process = sys
        .process(pid)
        .ok_or_else(|| VigilError::Source(format!("process {pid} not visible")))?;
    read(process)
}

fn cpu_seconds() -> Result<f64> {
    with_self(|p| Ok(p.accumulated_cpu_time() as f64 / 1000.0))
}

fn resident_bytes() -> Result<f64> {
    with_self(|p| Ok(p.memory() as f64))
}

fn virtual_bytes() -> Result<f64> {
    with_self(|p| Ok(p.virtual_memory() as f64))
}

fn start_time() -> Result<f64> {
    with_self(|p| Ok(p.start_time() as f64))
}

#[cfg(target_os = "linux")]
fn threads() -> Result<f64> {
    with_self(|p| {
        p.tasks()
            .map(|t| t.len().max(1) as f64)
            .ok_or_else(|| VigilError::Source("thread list unavailable".into()))
    })
}

fn process_collectors() -> Vec<CallbackCollector> {
    let mut built = vec![
        CallbackCollector::counter(
            "process_cpu_seconds_total",
            "Total user and system CPU time spent in seconds.",
            ValueSource::fallible(cpu_seconds),
        ),
        CallbackCollector::gauge(
            "process_virtual_memory_bytes",
            "Virtual memory size in bytes.",
            ValueSource::fallible(virtual_bytes),
        ),
        CallbackCollector::gauge(
            "process_resident_memory_bytes",
            "Resident memory size in bytes.",
            ValueSource::fallible(resident_bytes),
        ),
        CallbackCollector::gauge(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds.",
            ValueSource::fallible(start_time),
        ),
    ];
    built.extend(linux_collectors());

    built
        .into_iter()
        .filter_map(|c| {
            c.map_err(|e| tracing::warn!(error = %e, "process collector skipped"))
                .ok()
        })
        .collect()
}

/// `sysinfo` lists threads only on Linux and has no descriptor counts.
#[cfg(target_os = "linux")]
fn linux_collectors() -> Vec<Result<CallbackCollector>> {
    vec![
        CallbackCollector::gauge(
            "process_threads",
            "Number of OS threads in the process.",
            ValueSource::fallible(threads),
        ),
        CallbackCollector::gauge(
            "process_open_fds",
            "Number of open file descriptors.",
            ValueSource::fallible(fds::open_fds),
        ),
        CallbackCollector::gauge(
            "process_max_fds",
            "Maximum number of open file descriptors.",
            ValueSource::fallible(fds::max_fds),
        ),
    ]
}

#[cfg(not(target_os = "linux"))]
fn linux_collectors() -> Vec<Result<CallbackCollector>> {
    Vec::new()
}

#[cfg(target_os = "linux")]
mod fds {
    use std::fs;

    use super::{Result, VigilError};

    pub fn open_fds() -> Result<f64> {
        let dir = fs::read_dir("/proc/self/fd")
            .map_err(|e| VigilError::Source(format!("/proc/self/fd: {e}")))?;
        Ok(dir.count() as f64)
    }

    pub fn max_fds() -> Result<f64> {
        let raw = fs::read_to_string("/proc/self/limits")
            .map_err(|e| VigilError::Source(format!("/proc/self/limits: {e}")))?;
        parse_max_fds(&raw)
    }

    pub fn parse_max_fds(raw: &str) -> Result<f64> {
        raw.lines()
            .find_map(|l| l.strip_prefix("Max open files"))
            .and_then(|l| l.split_whitespace().next())
            .map(|soft| match soft {
                "unlimited" => f64::INFINITY,
                n => n.parse::<f64>().unwrap_or(f64::NAN),
            })
            .ok_or_else(|| VigilError::Source("/proc/self/limits: no open files limit".into()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::metric::Collector;

    fn read(name: &str) -> f64 {
        let c = process_collectors()
            .into_iter()
            .find(|c| c.describe().name() == name)
            .unwrap();
        c.collect().unwrap()[0].value
    }

    #[test]
    fn runtime_families_fail_outside_a_runtime() {
        for c in runtime_collectors() {
            assert!(c.collect().is_err(), "{} should fail", c.describe().name());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runtime_families_read_the_current_runtime() {
        let workers = runtime_collectors()
            .into_iter()
            .find(|c| c.describe().name() == "tokio_runtime_workers")
            .unwrap();
        assert_eq!(workers.collect().unwrap()[0].value, 2.0);
    }

    #[test]
    fn start_time_is_in_the_past_and_recent() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        let started = read("process_start_time_seconds");
        assert!(started <= now + 1.0, "start {started} after now {now}");
        assert!(now - started < 24.0 * 3600.0, "start {started} too old");
    }

    #[test]
    fn cpu_time_is_in_seconds() {
        let mut acc = 0u64;
        for i in 0..5_000_000u64 {
            acc = acc.wrapping_mul(31).wrapping_add(i);
        }
        std::hint::black_box(acc);

        let cpu = read("process_cpu_seconds_total");
        assert!(cpu >= 0.0);
        // milliseconds or clock ticks would blow past this
        assert!(cpu < 3600.0, "cpu {cpu} not in seconds");
    }

    #[test]
    fn resident_memory_is_bytes() {
        let rss = read("process_resident_memory_bytes");
        assert!(rss > 1024.0 * 1024.0, "rss {rss} looks like kilobytes");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn parses_open_files_limit() {
        let raw = "Limit                     Soft Limit           Hard Limit           Units\n\
                   Max open files            1024                 4096                 files\n";
        assert_eq!(fds::parse_max_fds(raw).unwrap(), 1024.0);
        let unlimited = "Max open files  unlimited  unlimited  files\n";
        assert_eq!(fds::parse_max_fds(unlimited).unwrap(), f64::INFINITY);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_families_collect_on_linux() {
        let names: Vec<_> = process_collectors()
            .iter()
            .map(|c| c.describe().name().to_string())
            .collect();
        assert_eq!(names.len(), 7, "{names:?}");
        for c in process_collectors() {
            assert!(c.collect().is_ok(), "{} failed", c.describe().name());
        }
    }
}
