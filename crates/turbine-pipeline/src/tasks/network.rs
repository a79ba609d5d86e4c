//! Simulated telemetry uplink.
//!
//! One alert is taken off the alert channel per cycle. While the link is
//! down every cycle makes one reconnect attempt and transmits nothing unless
//! it succeeds. A packet buffer is reserved from the simulated heap for the
//! duration of each transmission; when the heap refuses, the cycle is
//! skipped.

use super::{CycleInfo, PipelineTask};
use crate::config::NetworkConfig;
use crate::context::PipelineContext;
use crate::state::EventKind;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use turbine_monitor::MemoryStats;
use turbine_sync::ReadyBits;
use turbine_types::{AnomalyResult, SensorReading, TaskId, Tick};

/// Packet size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketKind {
    /// Small periodic liveness packet.
    Heartbeat,
    /// Routine telemetry.
    SensorData,
    /// Telemetry sent while something is wrong.
    AnomalyReport,
}

impl PacketKind {
    /// Pick the packet for a cycle.
    ///
    /// Heartbeats take precedence on their cycle; otherwise an emergency, a
    /// health score below the report level or a received alert selects an
    /// anomaly report.
    #[must_use]
    pub fn select(
        cycle: u64,
        emergency: bool,
        health_score: f32,
        alert_received: bool,
        config: &NetworkConfig,
    ) -> Self {
        if cycle.is_multiple_of(config.heartbeat_every) {
            PacketKind::Heartbeat
        } else if emergency || health_score < config.report_below_health || alert_received {
            PacketKind::AnomalyReport
        } else {
            PacketKind::SensorData
        }
    }

    /// Body capacity of this packet kind.
    #[must_use]
    pub fn body_bytes(self, config: &NetworkConfig) -> usize {
        match self {
            PacketKind::Heartbeat => config.heartbeat_body_bytes,
            PacketKind::SensorData => config.sensor_body_bytes,
            PacketKind::AnomalyReport => config.anomaly_body_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
struct Heartbeat {
    heartbeat: u64,
}

#[derive(Debug, Serialize)]
struct AnomalyFlags {
    vibration: bool,
    temperature: bool,
    rpm: bool,
}

#[derive(Debug, Serialize)]
struct Telemetry {
    timestamp: u64,
    vibration: f32,
    temperature: f32,
    rpm: f32,
    current: f32,
    health_score: f32,
    anomalies: AnomalyFlags,
    emergency_stop: bool,
}

/// Encode the body of a `kind` packet.
///
/// # Errors
///
/// Returns the serializer error.
pub fn encode_body(
    kind: PacketKind,
    now: Tick,
    reading: &SensorReading,
    anomalies: &AnomalyResult,
    emergency: bool,
) -> serde_json::Result<Vec<u8>> {
    match kind {
        PacketKind::Heartbeat => serde_json::to_vec(&Heartbeat {
            heartbeat: now.as_millis(),
        }),
        PacketKind::SensorData | PacketKind::AnomalyReport => serde_json::to_vec(&Telemetry {
            timestamp: reading.capture_time.as_millis(),
            vibration: reading.vibration,
            temperature: reading.temperature,
            rpm: reading.rpm,
            current: reading.current,
            health_score: anomalies.health_score,
            anomalies: AnomalyFlags {
                vibration: anomalies.vibration_flag,
                temperature: anomalies.temperature_flag,
                rpm: anomalies.rpm_flag,
            },
            emergency_stop: emergency,
        }),
    }
}

/// The telemetry uplink task.
#[derive(Debug, Clone)]
pub struct NetworkTask {
    rng: StdRng,
    config: NetworkConfig,
    /// Releases whose stats update lost the state lock.
    unrecorded_frees: Vec<usize>,
}

impl NetworkTask {
    /// Create the task with its own random source.
    #[must_use]
    pub fn new(ctx: &PipelineContext, rng: StdRng) -> Self {
        Self {
            rng,
            config: ctx.config.network,
            unrecorded_frees: Vec::new(),
        }
    }

    /// Releases not yet counted in the shared memory stats.
    #[must_use]
    pub fn unrecorded_frees(&self) -> usize {
        self.unrecorded_frees.len()
    }

    /// Attempt a reconnect. Returns whether the link is up afterwards.
    fn reconnect(&mut self, ctx: &PipelineContext) -> bool {
        let success = self.rng.random_bool(self.config.reconnect_probability);
        let now = ctx.now();
        let _counted = ctx.update_state(|state| {
            state.network.reconnect_attempts = state.network.reconnect_attempts.saturating_add(1);
            if success {
                state.network_connected = true;
                state.record_event(now, TaskId::Network, EventKind::NetworkRestored);
            }
        });
        if success {
            let bits = ctx.readiness.set(ReadyBits::NETWORK_CONNECTED);
            tracing::info!(?bits, "network reconnected");
        } else {
            tracing::debug!("reconnect attempt failed");
        }
        success
    }

    /// Sleep for the transmission time and roll for failure.
    fn transmit(&mut self, ctx: &PipelineContext, bytes: usize) -> Transmission {
        let duration = Duration::from_millis(self.config.transmission_ms);
        if let Some(deadline) = Instant::now().checked_add(duration)
            && !ctx.shutdown.sleep_until(deadline)
        {
            return Transmission::Aborted;
        }
        if self.rng.random_bool(self.config.failure_rate) {
            Transmission::Failed
        } else {
            Transmission::Delivered(bytes)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transmission {
    Delivered(usize),
    Failed,
    /// Never handed to the link: oversize, unencodable, or shutdown.
    Aborted,
}

impl PipelineTask for NetworkTask {
    fn id(&self) -> TaskId {
        TaskId::Network
    }

    fn run_cycle(&mut self, ctx: &PipelineContext, cycle: &CycleInfo<'_>) {
        let _depth = cycle.probe.sample();

        let alert = ctx.alerts.try_receive(Duration::ZERO).ok();
        if let Some(alert) = alert {
            tracing::debug!(kind = %alert.kind, severity = alert.severity, "alert forwarded");
            let _counted = ctx.update_state(|state| {
                state.network.alerts_forwarded = state.network.alerts_forwarded.saturating_add(1);
            });
        }

        let Some((connected, reading, anomalies, emergency)) = ctx.update_state(|state| {
            (
                state.network_connected,
                state.sensors,
                state.anomalies,
                state.emergency_stop,
            )
        }) else {
            return;
        };
        if !connected && !self.reconnect(ctx) {
            return;
        }

        let kind = PacketKind::select(
            cycle.number,
            emergency,
            anomalies.health_score,
            alert.is_some(),
            &self.config,
        );
        let body_bytes = kind.body_bytes(&self.config);
        let packet_bytes = self.config.header_bytes.saturating_add(body_bytes);

        // Reserve and count under one lock so the stats cannot drift.
        let pending = &mut self.unrecorded_frees;
        let reservation = ctx.update_state(|state| {
            flush_frees(pending, &mut state.memory, ctx.heap.free_bytes());
            match ctx.heap.try_reserve(packet_bytes) {
                Ok(lease) => {
                    state.memory.record_allocation(lease.bytes(), ctx.heap.free_bytes());
                    Ok(lease)
                }
                Err(err) => {
                    state.memory.record_failure();
                    state.network.allocation_skips =
                        state.network.allocation_skips.saturating_add(1);
                    Err(err)
                }
            }
        });
        let lease = match reservation {
            Some(Ok(lease)) => lease,
            Some(Err(err)) => {
                tracing::warn!(error = %err, ?kind, "packet allocation failed, skipping cycle");
                return;
            }
            None => {
                tracing::trace!(?kind, "state lock busy, packet not allocated");
                return;
            }
        };

        let outcome = match encode_body(kind, cycle.now, &reading, &anomalies, emergency) {
            Ok(body) if body.len() <= body_bytes => {
                self.transmit(ctx, self.config.header_bytes.saturating_add(body.len()))
            }
            Ok(body) => {
                tracing::warn!(
                    ?kind,
                    len = body.len(),
                    capacity = body_bytes,
                    "packet body too large"
                );
                let _counted = ctx.update_state(|state| {
                    state.network.oversize_packets =
                        state.network.oversize_packets.saturating_add(1);
                });
                Transmission::Aborted
            }
            Err(err) => {
                tracing::warn!(error = %err, ?kind, "packet encoding failed");
                Transmission::Aborted
            }
        };

        self.unrecorded_frees.push(lease.bytes());
        drop(lease);
        let free_after = ctx.heap.free_bytes();
        let now = ctx.now();
        let pending = &mut self.unrecorded_frees;
        let lost = ctx.update_state(|state| {
            flush_frees(pending, &mut state.memory, free_after);
            match outcome {
                Transmission::Delivered(bytes) => {
                    state.network.last_transmission = Some(now);
                    state.network.packets_sent = state.network.packets_sent.saturating_add(1);
                    state.network.bytes_sent = state
                        .network
                        .bytes_sent
                        .saturating_add(u64::try_from(bytes).unwrap_or(u64::MAX));
                    false
                }
                Transmission::Failed => {
                    state.network.last_transmission = Some(now);
                    state.network.packets_failed = state.network.packets_failed.saturating_add(1);
                    let was_connected = state.network_connected;
                    state.network_connected = false;
                    if was_connected {
                        state.record_event(now, TaskId::Network, EventKind::NetworkLost);
                    }
                    was_connected
                }
                Transmission::Aborted => false,
            }
        });

        match outcome {
            Transmission::Delivered(bytes) => {
                tracing::debug!(cycle = cycle.number, ?kind, bytes, "packet transmitted");
            }
            Transmission::Failed => {
                let bits = ctx.readiness.clear(ReadyBits::NETWORK_CONNECTED);
                if lost == Some(true) {
                    tracing::warn!(?kind, ?bits, "transmission failed, network disconnected");
                }
            }
            Transmission::Aborted => {}
        }
    }
}

fn flush_frees(pending: &mut Vec<usize>, memory: &mut MemoryStats, free_after: usize) {
    for bytes in pending.drain(..) {
        memory.record_free(bytes, free_after);
    }
}
