//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (operator
//! panel, serial console, tests) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::SystemConfig;
use crate::control::CircuitOutputs;
use crate::fsm::WpRequest;
use crate::status::OperatingMode;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Switch between off, automatic and manual operation.
    SetMode(OperatingMode),

    /// Request a heat-pump function directly. Manual mode only.
    ManualRequest(WpRequest),

    /// Set heating pump and mixer outputs directly. Manual mode only.
    SetCircuitOutputs(CircuitOutputs),

    /// Hot-reload configuration. Rejected unless it validates.
    UpdateConfig(SystemConfig),

    /// Operator has seen the faults: log them, release a held contactor
    /// fault and clear the history.
    AcknowledgeFaults,
}
