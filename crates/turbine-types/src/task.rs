//! Task identities and fixed priorities.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Fixed scheduling priority. Larger values preempt smaller ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskPriority(pub u8);

/// The application tasks, plus the interrupt source that feeds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskId {
    /// Highest priority: alarm evaluation and emergency stop.
    Safety,
    /// Relay drain and sensor simulation.
    Sensor,
    /// Statistical anomaly detection.
    Anomaly,
    /// Telemetry transmission.
    Network,
    /// Lowest priority: statistics and resource health checks.
    Dashboard,
    /// The periodic timer that plays the role of the sensor interrupt.
    Interrupt,
}

impl TaskId {
    /// The five application tasks in descending priority order.
    pub const APPLICATION: [TaskId; 5] = [
        TaskId::Safety,
        TaskId::Sensor,
        TaskId::Anomaly,
        TaskId::Network,
        TaskId::Dashboard,
    ];

    /// Thread and log name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TaskId::Safety => "SafetyTask",
            TaskId::Sensor => "SensorTask",
            TaskId::Anomaly => "AnomalyTask",
            TaskId::Network => "NetworkTask",
            TaskId::Dashboard => "DashboardTask",
            TaskId::Interrupt => "ISRTimer",
        }
    }

    /// Fixed priority of the task.
    #[must_use]
    pub const fn priority(self) -> TaskPriority {
        match self {
            TaskId::Interrupt => TaskPriority(7),
            TaskId::Safety => TaskPriority(6),
            TaskId::Sensor => TaskPriority(4),
            TaskId::Anomaly => TaskPriority(3),
            TaskId::Network => TaskPriority(2),
            TaskId::Dashboard => TaskPriority(1),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
