//! Modal action workflow: form display, submission, and outcome handling.
//!
//! A controller owns at most one live [`WorkflowInstance`]. Submits are
//! split into `begin_submit` (hands back a ticket for the driver to execute
//! against an [`ActionService`](crate::ActionService)) and `complete_submit`
//! (applies the outcome only if the originating instance is still current,
//! so a response that settles after a dismiss or re-trigger is dropped).

use std::fmt;

use serde_json::Value;
use shared::domain::{Action, FormSubmission};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::SubmitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowPhase {
    FormVisible,
    Submitting,
    Success(Value),
    Error(String),
}

impl WorkflowPhase {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowPhase::FormVisible => "showing the form",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::Success(_) => "showing a result",
            WorkflowPhase::Error(_) => "showing an error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowInstance {
    id: InstanceId,
    action: Action,
    phase: WorkflowPhase,
}

impl WorkflowInstance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn phase(&self) -> &WorkflowPhase {
        &self.phase
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("no active workflow")]
    NoActiveWorkflow,
    #[error("{operation} is not valid while the workflow is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },
}

/// Everything a driver needs to execute one submit: which instance asked,
/// what action it targets, and the collected field values.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub instance: InstanceId,
    pub action: Action,
    pub submission: FormSubmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Rendering target the controller drives. `render` is called after every
/// transition that leaves an instance live, `clear` when the workflow
/// returns to idle.
pub trait PresentationSurface {
    fn render(&mut self, instance: &WorkflowInstance);
    fn clear(&mut self);
}

pub struct WorkflowController<P: PresentationSurface> {
    surface: P,
    instance: Option<WorkflowInstance>,
}

impl<P: PresentationSurface> WorkflowController<P> {
    pub fn new(surface: P) -> Self {
        Self {
            surface,
            instance: None,
        }
    }

    pub fn instance(&self) -> Option<&WorkflowInstance> {
        self.instance.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.instance.is_none()
    }

    /// Opens the form for `action`, replacing any workflow already open.
    pub fn trigger(&mut self, action: Action) -> InstanceId {
        if let Some(previous) = self.instance.take() {
            debug!(previous = %previous.id, ?action, "replacing open workflow");
        }
        let instance = WorkflowInstance {
            id: InstanceId::new(),
            action,
            phase: WorkflowPhase::FormVisible,
        };
        let id = instance.id;
        debug!(%id, ?action, "workflow opened");
        self.surface.render(&instance);
        self.instance = Some(instance);
        id
    }

    /// Moves the open form to `Submitting` and returns the ticket for the
    /// driver to execute. The submission is forwarded as collected; required
    /// field enforcement is the presentation surface's job.
    pub fn begin_submit(
        &mut self,
        submission: FormSubmission,
    ) -> Result<SubmitTicket, WorkflowError> {
        let instance = self
            .instance
            .as_mut()
            .ok_or(WorkflowError::NoActiveWorkflow)?;
        if instance.phase != WorkflowPhase::FormVisible {
            return Err(WorkflowError::InvalidPhase {
                operation: "submit",
                phase: instance.phase.name(),
            });
        }

        instance.phase = WorkflowPhase::Submitting;
        let ticket = SubmitTicket {
            instance: instance.id,
            action: instance.action,
            submission,
        };
        debug!(id = %instance.id, action = ?instance.action, "submit started");
        self.surface.render(instance);
        Ok(ticket)
    }

    /// Applies a settled submit outcome. The outcome lands only when the
    /// originating instance is still current and still submitting; anything
    /// else is reported as `Stale` and leaves the state untouched.
    pub fn complete_submit(
        &mut self,
        instance: InstanceId,
        outcome: Result<Value, SubmitError>,
    ) -> Completion {
        let current = match self.instance.as_mut() {
            Some(current)
                if current.id == instance && current.phase == WorkflowPhase::Submitting =>
            {
                current
            }
            _ => {
                debug!(%instance, "dropping completion for stale workflow instance");
                return Completion::Stale;
            }
        };

        current.phase = match outcome {
            Ok(result) => WorkflowPhase::Success(result),
            Err(error) => WorkflowPhase::Error(error.to_string()),
        };
        debug!(id = %current.id, phase = current.phase.name(), "submit settled");
        self.surface.render(current);
        Completion::Applied
    }

    /// Returns from a result or error view to an empty form. The instance id
    /// is refreshed so a completion from before the reset can never land on
    /// the new form cycle.
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        let instance = self
            .instance
            .as_mut()
            .ok_or(WorkflowError::NoActiveWorkflow)?;
        match instance.phase {
            WorkflowPhase::Success(_) | WorkflowPhase::Error(_) => {
                instance.id = InstanceId::new();
                instance.phase = WorkflowPhase::FormVisible;
                debug!(id = %instance.id, action = ?instance.action, "workflow reset to form");
                self.surface.render(instance);
                Ok(())
            }
            _ => Err(WorkflowError::InvalidPhase {
                operation: "reset",
                phase: instance.phase.name(),
            }),
        }
    }

    /// Closes the workflow from any state. No-op when already idle.
    pub fn dismiss(&mut self) {
        if let Some(instance) = self.instance.take() {
            debug!(id = %instance.id, "workflow dismissed");
            self.surface.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Trigger(Action),
    Dismiss,
}

impl KeyCommand {
    /// Digit keys 1 through 4 open the matching action, escape closes.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '1'..='4' => {
                let index = key as usize - '1' as usize;
                Some(KeyCommand::Trigger(Action::ALL[index]))
            }
            '\u{1b}' => Some(KeyCommand::Dismiss),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
