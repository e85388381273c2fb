// src/engine.rs
//! Lifecycle orchestrator: owns the poller tasks and the daily digest
//! schedule, broadcasts cancellation, and joins everything on stop.

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::poller::{run_poller, Collaborators};
use crate::schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Created,
    Started,
    Stopping,
    Stopped,
}

/// Lifecycle-contract violations. Per-cycle collaborator failures never
/// surface here; they are contained inside the pollers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine can only be started once, from its initial state")]
    AlreadyStarted,
    #[error("engine is not running")]
    NotRunning,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub struct Engine {
    deps: Collaborators,
    state: EngineState,
    cancel: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Engine {
    pub fn new(deps: Collaborators) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            deps,
            state: EngineState::Created,
            cancel,
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Arm the daily digest schedule, then launch one poller per source
    /// with a stagger pause between launches. Returns once every task is
    /// launched; does not wait for any cycle to complete.
    pub async fn start(&mut self, settings: &Settings) -> Result<(), EngineError> {
        if self.state != EngineState::Created {
            return Err(EngineError::AlreadyStarted);
        }
        let target = settings
            .notification
            .every_day_time()
            .map_err(|e| EngineError::InvalidConfig(format!("{e:#}")))?;

        tracing::info!(sources = settings.sources.len(), "monitoring starting");

        self.handles.push(tokio::spawn(schedule::run_daily(
            target,
            self.deps.notifier.clone(),
            self.cancel.subscribe(),
        )));

        for source in &settings.sources {
            tokio::time::sleep(settings.iteration.stagger()).await;
            self.handles.push(tokio::spawn(run_poller(
                source.clone(),
                self.deps.clone(),
                self.cancel.subscribe(),
            )));
        }

        self.state = EngineState::Started;
        Ok(())
    }

    /// Signal cancellation to every task, then block until all of them
    /// have observed it and exited their loops.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Started {
            return Err(EngineError::NotRunning);
        }
        self.state = EngineState::Stopping;
        tracing::info!("monitoring stopping");

        // Receivers may all be gone if every task already exited.
        let _ = self.cancel.send(true);

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = ?e, "task join failed");
            }
        }

        self.state = EngineState::Stopped;
        tracing::info!("monitoring stopped");
        Ok(())
    }
}
