//! Safety gate over actuator command attempts.
//!
//! Every command passes through [`CommandGate::try_command`]; the decision
//! is derived from the safety registry and is authoritative. Commands are
//! opaque here: accepted ones are stamped and queued for the egress
//! channel, nothing else is inspected.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use vigil_common::analysis::{CommandFrame, ControlCommand};
use vigil_telemetry::SafetyRegistry;

use crate::now_millis;

/// Rejection reason when the system-wide safe predicate fails.
pub const REASON_SYSTEM_NOT_SAFE: &str = "system_not_safe";

/// Outcome of a command attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandDecision {
    /// Command stamped and queued for egress.
    Accepted,
    /// Command refused; nothing was queued.
    Rejected {
        /// Machine-readable reason surfaced to the caller.
        reason: String,
    },
}

impl CommandDecision {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Applies the safety predicate to actuator command attempts.
#[derive(Debug)]
pub struct CommandGate {
    safety: Arc<SafetyRegistry>,
    egress: mpsc::Sender<CommandFrame>,
}

impl CommandGate {
    pub fn new(safety: Arc<SafetyRegistry>, egress: mpsc::Sender<CommandFrame>) -> Self {
        Self { safety, egress }
    }

    /// Gate one command attempt.
    ///
    /// Rejects with [`REASON_SYSTEM_NOT_SAFE`] unless every known device
    /// reports safe (and at least one has reported). Accepted commands are
    /// stamped with a millisecond timestamp and handed to egress; a full
    /// egress queue is logged and does not fail the attempt.
    pub fn try_command(&self, command: ControlCommand) -> CommandDecision {
        if !self.safety.system_safe() {
            warn!(
                command_type = %command.command_type,
                "command rejected: system not safe"
            );
            return CommandDecision::Rejected {
                reason: REASON_SYSTEM_NOT_SAFE.to_string(),
            };
        }

        let frame = CommandFrame {
            timestamp: now_millis(),
            command_type: command.command_type,
            parameters: command.parameters,
        };

        info!(command_type = %frame.command_type, "command accepted");
        if let Err(e) = self.egress.try_send(frame) {
            warn!("command egress queue unavailable: {e}");
        }
        CommandDecision::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_common::telemetry::SafetyStatus;

    fn safe_status(device: &str, safe: bool) -> SafetyStatus {
        SafetyStatus {
            timestamp_ms: 1_000,
            device_id: device.to_string(),
            emergency_stop: !safe,
            door_closed: true,
            overload_detected: false,
            temperature_ok: true,
        }
    }

    fn command() -> ControlCommand {
        ControlCommand {
            command_type: "spindle_speed".to_string(),
            parameters: json!({"rpm": 1200}),
        }
    }

    #[test]
    fn empty_registry_rejects() {
        let safety = Arc::new(SafetyRegistry::new());
        let (tx, _rx) = mpsc::channel(4);
        let gate = CommandGate::new(safety, tx);
        let decision = gate.try_command(command());
        assert_eq!(
            decision,
            CommandDecision::Rejected {
                reason: REASON_SYSTEM_NOT_SAFE.to_string()
            }
        );
    }

    #[test]
    fn unsafe_then_safe_flips_decision() {
        let safety = Arc::new(SafetyRegistry::new());
        let (tx, mut rx) = mpsc::channel(4);
        let gate = CommandGate::new(Arc::clone(&safety), tx);

        safety.update(safe_status("a", false));
        assert!(!gate.try_command(command()).is_accepted());
        assert!(rx.try_recv().is_err());

        safety.update(safe_status("a", true));
        assert!(gate.try_command(command()).is_accepted());
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.command_type, "spindle_speed");
        assert!(frame.timestamp > 0);
        assert_eq!(frame.parameters["rpm"], 1200);
    }

    #[test]
    fn rejected_command_is_not_forwarded() {
        let safety = Arc::new(SafetyRegistry::new());
        let (tx, mut rx) = mpsc::channel(4);
        let gate = CommandGate::new(Arc::clone(&safety), tx);
        safety.update(safe_status("a", false));
        gate.try_command(command());
        assert!(rx.try_recv().is_err());
    }
}
