//! # System Metrics Probes
//!
//! This module supplies the readings for the SYSTEM_INFO page. All probes sit
//! behind the [`MetricsSource`] trait so the render loop can be exercised with
//! in-memory doubles, and every failure is *transient*: the loop skips one
//! frame and tries again on the next tick, it never dies because a probe
//! hiccupped.
//!
//! ## Probe Sources
//!
//! - **CPU / RAM / network counters**: the `sysinfo` crate. CPU utilisation is
//!   a two-refresh delta measurement (refresh, sleep the sampling window,
//!   refresh again), which is why reading it blocks for up to a second and
//!   dominates the render iteration latency.
//! - **CPU temperature**: `vcgencmd measure_temp`, the Broadcom firmware
//!   query tool present on every Raspberry Pi OS install. Output looks like
//!   `temp=48.3'C`.
//! - **Wireless client count**: a deployment-provided script (the access
//!   point stack varies too much to probe generically); it must print a bare
//!   integer on stdout.

use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::Config;

/// Why a reading could not be produced this tick.
///
/// Every variant is recoverable at the render-loop level: the frame for the
/// current iteration is skipped and the next iteration starts fresh.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// CPU utilisation sampling failed
    #[error("cpu sampling failed: {0}")]
    Sampling(String),

    /// The temperature query tool is missing or returned garbage
    #[error("cpu temperature unavailable: {0}")]
    Unavailable(String),

    /// The configured network interface is not present
    #[error("network interface not found: {0}")]
    InterfaceNotFound(String),

    /// The wireless client count script failed or printed a non-integer
    #[error("client count script failed: {0}")]
    Script(String),
}

/// One reading of an interface's cumulative byte counters.
///
/// Exactly one previous sample is retained across render ticks (owned by the
/// render thread, see [`crate::pages::NetThroughput`]) so throughput can be
/// computed as a delta over the elapsed interval.
#[derive(Clone, Copy, Debug)]
pub struct NetSample {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub taken_at: Instant,
}

/// Supplies current system readings on demand.
pub trait MetricsSource {
    /// Overall CPU utilisation in percent. Blocks for `window` while the
    /// delta measurement accumulates.
    fn cpu_percent(&mut self, window: Duration) -> Result<f32, MetricsError>;

    /// Memory in use as a percentage of total.
    fn mem_percent(&mut self) -> Result<f32, MetricsError>;

    /// SoC temperature in degrees Celsius.
    fn cpu_temperature(&mut self) -> Result<f32, MetricsError>;

    /// Cumulative byte counters for `interface`, stamped with the read time.
    fn network_counters(&mut self, interface: &str) -> Result<NetSample, MetricsError>;

    /// Number of associated wireless clients.
    fn wireless_client_count(&mut self) -> Result<u32, MetricsError>;
}

/// Production metrics backed by `sysinfo` plus the two subprocess probes.
pub struct SystemMetrics {
    system: sysinfo::System,
    networks: sysinfo::Networks,
    client_script: PathBuf,
}

impl SystemMetrics {
    pub fn new(config: &Config) -> Self {
        Self {
            system: sysinfo::System::new(),
            networks: sysinfo::Networks::new_with_refreshed_list(),
            client_script: PathBuf::from(&config.network.client_count_script),
        }
    }
}

impl MetricsSource for SystemMetrics {
    fn cpu_percent(&mut self, window: Duration) -> Result<f32, MetricsError> {
        // Two refreshes bracketing the sampling window; sysinfo needs a
        // minimum interval between them to produce a meaningful delta.
        self.system.refresh_cpu_usage();
        thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();
        Ok(self.system.global_cpu_usage())
    }

    fn mem_percent(&mut self) -> Result<f32, MetricsError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(MetricsError::Sampling("total memory reported as 0".into()));
        }
        Ok(self.system.used_memory() as f32 / total as f32 * 100.0)
    }

    fn cpu_temperature(&mut self) -> Result<f32, MetricsError> {
        let output = Command::new("vcgencmd")
            .arg("measure_temp")
            .output()
            .map_err(|e| MetricsError::Unavailable(format!("vcgencmd: {e}")))?;
        if !output.status.success() {
            return Err(MetricsError::Unavailable(format!(
                "vcgencmd exited with {}",
                output.status
            )));
        }
        parse_vcgencmd_temp(&String::from_utf8_lossy(&output.stdout))
    }

    fn network_counters(&mut self, interface: &str) -> Result<NetSample, MetricsError> {
        self.networks.refresh();
        let data = self
            .networks
            .list()
            .get(interface)
            .ok_or_else(|| MetricsError::InterfaceNotFound(interface.to_string()))?;
        Ok(NetSample {
            bytes_sent: data.total_transmitted(),
            bytes_recv: data.total_received(),
            taken_at: Instant::now(),
        })
    }

    fn wireless_client_count(&mut self) -> Result<u32, MetricsError> {
        let output = Command::new(&self.client_script)
            .output()
            .map_err(|e| MetricsError::Script(format!("{}: {e}", self.client_script.display())))?;
        if !output.status.success() {
            return Err(MetricsError::Script(format!(
                "{} exited with {}",
                self.client_script.display(),
                output.status
            )));
        }
        parse_client_count(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `temp=48.3'C` (vcgencmd output) into degrees Celsius.
fn parse_vcgencmd_temp(raw: &str) -> Result<f32, MetricsError> {
    let trimmed = raw.trim();
    let value = trimmed
        .strip_prefix("temp=")
        .and_then(|rest| rest.split('\'').next())
        .ok_or_else(|| MetricsError::Unavailable(format!("unexpected output '{trimmed}'")))?;
    value
        .parse::<f32>()
        .map_err(|_| MetricsError::Unavailable(format!("unexpected output '{trimmed}'")))
}

/// Parse the client-count script's stdout: a bare integer, whitespace allowed.
fn parse_client_count(raw: &str) -> Result<u32, MetricsError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| MetricsError::Script(format!("expected an integer, got '{}'", raw.trim())))
}
