//! Output formatting for the final snapshot

use anyhow::Error;
use colored::Colorize;
use serde_json::json;
use turbine_pipeline::MonitorSnapshot;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "causes": chain,
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

/// Print the final snapshot as one JSON document.
pub fn print_snapshot_json(snapshot: &MonitorSnapshot) -> serde_json::Result<()> {
    let output = json!({
        "success": true,
        "snapshot": snapshot,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the final snapshot as a short report.
pub fn print_snapshot_human(snapshot: &MonitorSnapshot) {
    let state = &snapshot.state;
    let flag = |on: bool| if on { "yes".red() } else { "no".green() };

    println!("{}", "Turbine Monitor Summary".bold());
    println!("  Seed:            {}", snapshot.seed);
    println!("  Uptime:          {}", snapshot.taken_at);
    println!("  Health score:    {:.1}", state.anomalies.health_score);
    println!("  Anomalies:       {}", state.anomalies.anomaly_count);
    println!("  Emergency stop:  {}", flag(state.emergency_stop));
    println!(
        "  Network:         {}",
        if state.network_connected {
            "connected".green()
        } else {
            "disconnected".red()
        }
    );

    println!("{}", "Pipeline".bold());
    println!(
        "  Interrupts:      {} captured, {} processed, {} dropped",
        state.isr.interrupt_count, state.isr.processed_count, state.isr.dropped_count
    );
    println!(
        "  Packets:         {} sent, {} failed, {} bytes",
        state.network.packets_sent, state.network.packets_failed, state.network.bytes_sent
    );
    println!("  Alerts:          {} forwarded", state.network.alerts_forwarded);
    println!(
        "  Backpressure:    {} sensor, {} alert",
        state.sensor_send_failures, state.alert_backpressure
    );
    println!(
        "  Lock timeouts:   {} state, {} thresholds",
        snapshot.locks.state.timeouts, snapshot.locks.thresholds.timeouts
    );

    println!("{}", "Resources".bold());
    println!(
        "  Heap:            {} free (minimum {}), {} failed allocations",
        state.memory.current_free, state.memory.minimum_free, state.memory.allocation_failures
    );
    println!(
        "  Stack warnings:  {}",
        state.stack.stats().warnings_issued
    );
    println!(
        "  Idle:            {:.1}% ({:.1}% power saved)",
        state.power.idle_percent, state.power.power_savings_percent
    );

    println!("{}", "Tasks".bold());
    for task in &snapshot.tasks {
        println!(
            "  {:<14} {:>6} cycles  {:>3} missed  {:>7} us p99 late  {:>8} stack words free  {:?}",
            task.task.name(),
            task.cycles,
            task.deadline_misses,
            task.p99_lateness_us,
            task.stack_high_water_words,
            task.state
        );
    }
}
