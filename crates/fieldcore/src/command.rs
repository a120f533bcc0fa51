//! Cross-thread tuning boundary.
//!
//! The scheduler owns the parameter store; other threads hold a
//! [`ParamHandle`] and send [`ParamCommand`]s that are applied at the start of
//! the next tick.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use fieldconfig::Easing;

use crate::params::{ParamError, ParamId, ParamValue};

pub const HIGHLIGHT_MIN: f32 = 0.1;
pub const HIGHLIGHT_MAX: f32 = 3.0;

#[derive(Debug, Clone)]
pub enum ParamCommand {
    Set { id: ParamId, value: ParamValue },
    Reset { id: ParamId },
    Query {
        id: ParamId,
        reply: Sender<ParamValue>,
    },
    /// Ease colour intensity to `base * multiple` over `duration`.
    EaseIntensity {
        multiple: f32,
        duration: Duration,
        curve: Easing,
    },
    SoftReset,
}

#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("render loop has shut down")]
    Disconnected,
    #[error("no reply from render loop within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone)]
pub struct ParamHandle {
    tx: Sender<ParamCommand>,
}

#[derive(Debug)]
pub struct ParamInbox {
    rx: Receiver<ParamCommand>,
}

pub fn param_channel() -> (ParamHandle, ParamInbox) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ParamHandle { tx }, ParamInbox { rx })
}

impl ParamHandle {
    pub fn send(&self, command: ParamCommand) -> Result<(), HandleError> {
        self.tx.send(command).map_err(|_| HandleError::Disconnected)
    }

    pub fn set(&self, name: &str, value: ParamValue) -> Result<(), HandleError> {
        let id = ParamId::from_name(name)?;
        self.send(ParamCommand::Set { id, value })
    }

    /// Parses `raw` for the named parameter before sending it.
    pub fn set_text(&self, name: &str, raw: &str) -> Result<(), HandleError> {
        let id = ParamId::from_name(name)?;
        let value = crate::params::parse_value(id, raw)?;
        self.send(ParamCommand::Set { id, value })
    }

    pub fn reset(&self, name: &str) -> Result<(), HandleError> {
        let id = ParamId::from_name(name)?;
        self.send(ParamCommand::Reset { id })
    }

    /// Round-trips through the render loop; blocks for at most `timeout`.
    pub fn get(&self, name: &str, timeout: Duration) -> Result<ParamValue, HandleError> {
        let id = ParamId::from_name(name)?;
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(ParamCommand::Query { id, reply })?;
        rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => HandleError::Timeout(timeout),
            RecvTimeoutError::Disconnected => HandleError::Disconnected,
        })
    }

    pub fn ease_intensity(
        &self,
        multiple: f32,
        duration: Duration,
        curve: Easing,
    ) -> Result<(), HandleError> {
        self.send(ParamCommand::EaseIntensity {
            multiple,
            duration,
            curve,
        })
    }

    pub fn soft_reset(&self) -> Result<(), HandleError> {
        self.send(ParamCommand::SoftReset)
    }
}

impl ParamInbox {
    /// Pops everything queued so far without blocking.
    pub fn drain(&self) -> Vec<ParamCommand> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => out.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}
