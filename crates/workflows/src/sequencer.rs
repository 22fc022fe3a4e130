//! Strictly ordered execution of named workflow stages.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::{error, info};

use crate::error::{Error, Result};

type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;
type StageFn<'a> = Box<dyn FnOnce() -> StageFuture<'a> + 'a>;

/// Where a workflow is in its lifecycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WorkflowState {
    /// `run` has not been called.
    NotStarted,

    /// Stage at this position is executing.
    Running(usize),

    /// Every stage succeeded.
    Completed,

    /// The named stage failed. Terminal.
    Failed(String),
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Running(i) => write!(f, "running stage {i}"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(stage) => write!(f, "failed at {stage}"),
        }
    }
}

/// Summary of a finished workflow.
#[derive(Clone, Debug)]
pub struct WorkflowReport {
    /// Workflow name.
    pub workflow: String,

    /// Stages that completed, in order.
    pub completed: Vec<String>,

    /// Final state.
    pub state: WorkflowState,
}

/// Runs stages one after another; a stage starts only after the previous one
/// has fully settled. There is no rollback.
pub struct Sequencer<'a> {
    name: String,
    stages: Vec<(String, StageFn<'a>)>,
    state: WorkflowState,
}

impl<'a> Sequencer<'a> {
    /// Empty workflow called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            state: WorkflowState::NotStarted,
        }
    }

    /// Append a stage.
    #[must_use]
    pub fn stage<F, Fut>(mut self, name: impl Into<String>, stage: F) -> Self
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future<Output = Result<()>> + 'a,
    {
        let boxed: StageFn<'a> = Box::new(move || -> StageFuture<'a> { Box::pin(stage()) });
        self.stages.push((name.into(), boxed));
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Names of the stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageFailed`] carrying the report up to the failing
    /// stage and that stage's error.
    pub async fn run(mut self) -> Result<WorkflowReport> {
        let stages = std::mem::take(&mut self.stages);
        let mut completed = Vec::with_capacity(stages.len());

        info!("starting workflow {} ({} stages)", self.name, stages.len());

        for (index, (stage_name, stage)) in stages.into_iter().enumerate() {
            self.state = WorkflowState::Running(index);
            info!("{}: stage {} ({stage_name})", self.name, index + 1);

            if let Err(e) = stage().await {
                error!("{}: stage {stage_name} failed: {e}", self.name);
                self.state = WorkflowState::Failed(stage_name);
                return Err(Error::StageFailed {
                    report: WorkflowReport {
                        workflow: self.name,
                        completed,
                        state: self.state,
                    },
                    source: Box::new(e),
                });
            }

            completed.push(stage_name);
        }

        self.state = WorkflowState::Completed;
        info!("workflow {} completed", self.name);

        Ok(WorkflowReport {
            workflow: self.name,
            completed,
            state: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let _ = tracing_subscriber::fmt::try_init();

        let log = Mutex::new(Vec::new());
        let entries = &log;
        let sequencer = Sequencer::new("demo")
            .stage("first", move || async move {
                entries.lock().push("first");
                Ok(())
            })
            .stage("second", move || async move {
                tokio::task::yield_now().await;
                entries.lock().push("second");
                Ok(())
            })
            .stage("third", move || async move {
                entries.lock().push("third");
                Ok(())
            });

        assert_eq!(sequencer.state(), &WorkflowState::NotStarted);
        assert_eq!(sequencer.stage_names(), vec!["first", "second", "third"]);

        let report = sequencer.run().await.unwrap();

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
        assert_eq!(report.workflow, "demo");
        assert_eq!(report.completed, vec!["first", "second", "third"]);
        assert_eq!(report.state, WorkflowState::Completed);
    }

    #[tokio::test]
    async fn test_failure_stops_later_stages() {
        let log = Mutex::new(Vec::new());
        let entries = &log;

        let result = Sequencer::new("demo")
            .stage("ok", move || async move {
                entries.lock().push("ok");
                Ok(())
            })
            .stage("broken", || async { Err(Error::NoMonitorNode) })
            .stage("never", move || async move {
                entries.lock().push("never");
                Ok(())
            })
            .run()
            .await;

        assert_eq!(*log.lock(), vec!["ok"]);
        match result.unwrap_err() {
            Error::StageFailed { report, source } => {
                assert_eq!(report.workflow, "demo");
                assert_eq!(report.completed, vec!["ok"]);
                assert_eq!(report.state, WorkflowState::Failed("broken".to_string()));
                assert!(matches!(*source, Error::NoMonitorNode));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
