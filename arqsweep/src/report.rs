//! Result aggregation and CSV/JSON writers.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use arqsim::SimReport;

/// Flat per-run CSV row; the csv writer cannot serialize nested records.
#[derive(Debug, Serialize)]
pub struct RunRow {
    window_size: usize,
    frame_payload_size: usize,
    seed: u64,
    goodput: f64,
    utilization: f64,
    avg_rtt: f64,
    retransmissions: u64,
    total_time: f64,
    bytes_delivered: u64,
    completed: bool,
    frames_sent: u64,
    bytes_sent: u64,
    throughput: f64,
    efficiency: f64,
    retransmission_rate: f64,
    buffer_full_events: u64,
    bad_state_ratio: f64,
    frame_error_ratio: f64,
}

impl From<&SimReport> for RunRow {
    fn from(report: &SimReport) -> Self {
        Self {
            window_size: report.window_size,
            frame_payload_size: report.frame_payload_size,
            seed: report.seed,
            goodput: report.goodput,
            utilization: report.utilization,
            avg_rtt: report.avg_rtt,
            retransmissions: report.retransmissions,
            total_time: report.total_time,
            bytes_delivered: report.bytes_delivered,
            completed: report.completed,
            frames_sent: report.frames_sent,
            bytes_sent: report.bytes_sent,
            throughput: report.throughput,
            efficiency: report.efficiency,
            retransmission_rate: report.retransmission_rate,
            buffer_full_events: report.buffer_full_events,
            bad_state_ratio: report.channel.bad_state_ratio(),
            frame_error_ratio: report.channel.frame_error_ratio(),
        }
    }
}

/// Per-configuration averages over all runs of one (window, payload) pair.
#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub window_size: usize,
    pub frame_payload_size: usize,
    pub runs: usize,
    pub completed_runs: usize,
    pub avg_goodput: f64,
    pub avg_utilization: f64,
    pub avg_rtt: f64,
    pub avg_retransmissions: f64,
    pub avg_total_time: f64,
    pub avg_efficiency: f64,
}

/// Group per-run reports by configuration and average the numeric fields.
pub fn summarize(reports: &[SimReport]) -> Vec<ConfigSummary> {
    let mut grouped: BTreeMap<(usize, usize), Vec<&SimReport>> = BTreeMap::new();
    for report in reports {
        grouped
            .entry((report.window_size, report.frame_payload_size))
            .or_default()
            .push(report);
    }

    grouped
        .into_iter()
        .map(|((window_size, frame_payload_size), runs)| {
            let n = runs.len() as f64;
            let mean = |f: &dyn Fn(&SimReport) -> f64| runs.iter().map(|&r| f(r)).sum::<f64>() / n;
            ConfigSummary {
                window_size,
                frame_payload_size,
                runs: runs.len(),
                completed_runs: runs.iter().filter(|r| r.completed).count(),
                avg_goodput: mean(&|r| r.goodput),
                avg_utilization: mean(&|r| r.utilization),
                avg_rtt: mean(&|r| r.avg_rtt),
                avg_retransmissions: mean(&|r| r.retransmissions as f64),
                avg_total_time: mean(&|r| r.total_time),
                avg_efficiency: mean(&|r| r.efficiency),
            }
        })
        .collect()
}

pub fn write_runs_csv(path: &Path, reports: &[SimReport]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for report in reports {
        writer.serialize(RunRow::from(report))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, summaries: &[ConfigSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json(path: &Path, reports: &[SimReport]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, reports)?;
    Ok(())
}
