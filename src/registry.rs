// Op registration
//
// A program binds exactly one routine at startup:
//
//   OpDescriptor::teleop("Tank Drive Example")
//       .with_config("tank_drive")
//       .bind(tank_teleop)
//       .register()?;
//
// The binding lives in a process-wide slot until the runtime takes it to run.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::op::{Op, OpDescriptor, OpKind, Outcome};
use crate::runtime::RuntimeError;

/// A user routine, run once per invocation
pub type Routine = Box<dyn FnOnce(&mut Op) -> Outcome + Send>;

static SLOT: Mutex<Option<Registration>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Registration>> {
    SLOT.lock().unwrap_or_else(|e| e.into_inner())
}

impl OpDescriptor {
    pub fn autonomous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: OpKind::Autonomous,
            config: None,
        }
    }

    pub fn teleop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: OpKind::Teleop,
            config: None,
        }
    }

    /// Name of the robot configuration this op expects
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Attach the routine. Its return value becomes the run's [`Outcome`].
    pub fn bind<F, R>(self, routine: F) -> Registration
    where
        F: FnOnce(&mut Op) -> R + Send + 'static,
        R: Into<Outcome>,
    {
        Registration {
            descriptor: self,
            routine: Box::new(move |op: &mut Op| routine(op).into()),
        }
    }
}

/// A routine together with its descriptor
pub struct Registration {
    descriptor: OpDescriptor,
    routine: Routine,
}

impl Registration {
    pub fn descriptor(&self) -> &OpDescriptor {
        &self.descriptor
    }

    /// Make this the op the next [`Runtime::invoke`](crate::runtime::Runtime::invoke) runs
    pub fn register(self) -> Result<(), RuntimeError> {
        register(self)
    }

    pub(crate) fn into_parts(self) -> (OpDescriptor, Routine) {
        (self.descriptor, self.routine)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Fill the slot. Fails if another op is already waiting to run.
pub fn register(registration: Registration) -> Result<(), RuntimeError> {
    let mut slot = slot();
    if let Some(existing) = slot.as_ref() {
        return Err(RuntimeError::AlreadyRegistered {
            name: existing.descriptor.name.clone(),
        });
    }

    info!(
        "Registered {} op \"{}\"",
        registration.descriptor.kind, registration.descriptor.name
    );
    *slot = Some(registration);
    Ok(())
}

/// Descriptor of the op currently waiting to run
pub fn registered() -> Option<OpDescriptor> {
    slot().as_ref().map(|r| r.descriptor.clone())
}

/// Empty the slot, handing back what was in it
pub fn take() -> Option<Registration> {
    slot().take()
}

pub fn clear() {
    slot().take();
}
