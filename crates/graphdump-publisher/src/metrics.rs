//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Run counters, updated by the HTTP handler and the pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    deltas_received: AtomicU64,
    runs_started: AtomicU64,
    runs_succeeded: AtomicU64,
    runs_failed: AtomicU64,
    cleanup_failures: AtomicU64,
}

impl Metrics {
    pub fn delta_received(&self) {
        self.deltas_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_succeeded(&self) {
        self.runs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cleanup_failed(&self, count: usize) {
        self.cleanup_failures
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn runs_succeeded(&self) -> u64 {
        self.runs_succeeded.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    /// Format all counters as Prometheus text.
    pub fn render(&self) -> String {
        let mut output = String::new();

        writeln!(
            output,
            "# HELP graphdump_deltas_received_total Delta notifications received"
        )
        .ok();
        writeln!(output, "# TYPE graphdump_deltas_received_total counter").ok();
        writeln!(
            output,
            "graphdump_deltas_received_total {}",
            self.deltas_received.load(Ordering::Relaxed)
        )
        .ok();

        writeln!(output).ok();
        writeln!(
            output,
            "# HELP graphdump_runs_total Dump runs by outcome"
        )
        .ok();
        writeln!(output, "# TYPE graphdump_runs_total counter").ok();
        writeln!(
            output,
            "graphdump_runs_total{{outcome=\"started\"}} {}",
            self.runs_started.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            output,
            "graphdump_runs_total{{outcome=\"success\"}} {}",
            self.runs_succeeded()
        )
        .ok();
        writeln!(
            output,
            "graphdump_runs_total{{outcome=\"failed\"}} {}",
            self.runs_failed()
        )
        .ok();

        writeln!(output).ok();
        writeln!(
            output,
            "# HELP graphdump_cleanup_failures_total Previous revisions that could not be cleaned up"
        )
        .ok();
        writeln!(output, "# TYPE graphdump_cleanup_failures_total counter").ok();
        writeln!(
            output,
            "graphdump_cleanup_failures_total {}",
            self.cleanup_failures.load(Ordering::Relaxed)
        )
        .ok();

        output
    }
}
