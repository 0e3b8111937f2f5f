//! # Saga
//!
//! Schema changes span the definition store and the physical database
//! without a shared transaction. Each completed step registers the action
//! that undoes it, a failure unwinds them newest first.

use crate::{executor::DdlExecutor, store::DefinitionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteDefinition { id: i64, name: String },
    DropTable { name: String },
}

#[derive(Debug)]
pub struct Saga {
    name: String,
    steps: Vec<Compensation>,
}

impl Saga {
    pub fn new<S: ToString>(name: S) -> Self {
        Self {
            name: name.to_string(),
            steps: vec![],
        }
    }

    pub fn push(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Compensation] {
        &self.steps
    }

    /// Keep every completed step
    pub fn commit(self) {
        log::trace!("Saga `{}` committed with {} steps", self.name, self.steps.len());
    }

    /// Best effort, failures are logged and the next step still runs
    pub async fn unwind(self, store: &dyn DefinitionStore, executor: &dyn DdlExecutor) {
        for step in self.steps.into_iter().rev() {
            log::debug!("Saga `{}` compensating {:?}", self.name, step);

            let res = match &step {
                Compensation::DeleteDefinition { id, .. } => store.delete_definition(*id).await,
                Compensation::DropTable { name } => executor.drop_table(name).await,
            };

            if let Err(e) = res {
                log::warn!(
                    "Saga `{}` compensation {:?} failed: {}",
                    self.name,
                    step,
                    e
                );
            }
        }
    }
}
