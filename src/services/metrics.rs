use crate::error::{FleetError, Result};
use crate::models::SystemMetrics;
use crate::services::executor::{CommandClass, CommandRunner, CommandSpec};
use chrono::Utc;
use std::sync::Arc;

/// Host-wide CPU, memory and root disk usage from `top`, `free` and `df`.
pub struct MetricsCollector {
    runner: Arc<dyn CommandRunner>,
}

impl MetricsCollector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn sample(&self) -> Result<SystemMetrics> {
        let (top, free, df) = tokio::try_join!(
            self.runner
                .run(CommandSpec::new("top", CommandClass::Query).arg("-bn1")),
            self.runner
                .run(CommandSpec::new("free", CommandClass::Query).arg("-m")),
            self.runner
                .run(CommandSpec::new("df", CommandClass::Query).args(["-h", "/"])),
        )?;

        Ok(SystemMetrics {
            cpu_percent: parse_cpu_busy(&top.stdout)?,
            memory_percent: parse_memory_used(&free.stdout)?,
            disk_usage: parse_root_disk_usage(&df.stdout)?,
            sampled_at: Utc::now(),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `100 - idle` from the `%Cpu(s):` summary line.
pub fn parse_cpu_busy(top: &str) -> Result<f64> {
    let line = top
        .lines()
        .find(|l| l.contains("Cpu(s)"))
        .ok_or_else(|| FleetError::parse("top output", "no Cpu(s) line"))?;
    let (_, fields) = line
        .split_once(':')
        .ok_or_else(|| FleetError::parse("top output", "malformed Cpu(s) line"))?;

    let idle = fields
        .split(',')
        .map(str::trim)
        .find_map(|field| {
            let (value, label) = field.split_once(char::is_whitespace)?;
            (label.trim() == "id").then(|| value.trim_end_matches('%'))
        })
        .ok_or_else(|| FleetError::parse("top output", "no idle field"))?
        .parse::<f64>()
        .map_err(|e| FleetError::parse("top idle value", e))?;
    Ok(round2(100.0 - idle))
}

/// used / total of the `Mem:` row, as a percentage.
pub fn parse_memory_used(free: &str) -> Result<f64> {
    let row = free
        .lines()
        .find(|l| l.trim_start().starts_with("Mem:"))
        .ok_or_else(|| FleetError::parse("free output", "no Mem: row"))?;
    let columns: Vec<&str> = row.split_whitespace().collect();
    let number = |index: usize| -> Result<f64> {
        columns
            .get(index)
            .ok_or_else(|| FleetError::parse("free output", "short Mem: row"))?
            .parse::<f64>()
            .map_err(|e| FleetError::parse("free output", e))
    };
    let total = number(1)?;
    let used = number(2)?;
    if total <= 0.0 {
        return Err(FleetError::parse("free output", "total memory is zero"));
    }
    Ok(round2(used * 100.0 / total))
}

/// `Use%` column of the first data row of `df -h /`.
pub fn parse_root_disk_usage(df: &str) -> Result<String> {
    df.lines()
        .nth(1)
        .and_then(|row| row.split_whitespace().nth(4))
        .map(str::to_string)
        .ok_or_else(|| FleetError::parse("df output", "no usage column"))
}
