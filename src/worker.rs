//! Background execution host for a packing run.
//!
//! The orchestrator lives on a blocking thread and only talks to the host
//! through channels. The host asks for one step at a time and receives owned
//! reports, so it never shares mutable state with the run.

use tokio::sync::mpsc;

use crate::error::Result;
use crate::model::{ContainerSpec, PackRequest};
use crate::orchestrator::{Orchestrator, RunSnapshot, StepReport};
use crate::search::PackingConfig;

/// Instructions from the host to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Cancel,
}

/// Replies from the worker to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// One work item was processed. The run may have completed with it.
    Step(StepReport),
    /// The run is terminal. Sent in reply to a step on a finished run or a cancel.
    Finished(RunSnapshot),
}

/// Host side of a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    commands: mpsc::Sender<Command>,
    replies: mpsc::Receiver<WorkerMessage>,
    total_count: usize,
    interior_volume: f64,
}

impl WorkerHandle {
    /// Requests one step and waits for the reply.
    ///
    /// Returns `None` once the worker is gone.
    pub async fn step(&mut self) -> Option<WorkerMessage> {
        self.request(Command::Step).await
    }

    /// Cancels the run and returns the final snapshot.
    pub async fn cancel(&mut self) -> Option<RunSnapshot> {
        match self.request(Command::Cancel).await? {
            WorkerMessage::Finished(snapshot) => Some(snapshot),
            WorkerMessage::Step(_) => None,
        }
    }

    /// Number of work items in the run.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn interior_volume(&self) -> f64 {
        self.interior_volume
    }

    async fn request(&mut self, command: Command) -> Option<WorkerMessage> {
        self.commands.send(command).await.ok()?;
        self.replies.recv().await
    }
}

/// Validates the input and starts a worker for it.
///
/// Must be called from within a tokio runtime. Dropping the returned handle
/// cancels the run before its next step.
pub fn spawn(
    container: ContainerSpec,
    requests: Vec<PackRequest>,
    config: PackingConfig,
) -> Result<WorkerHandle> {
    let mut orchestrator = Orchestrator::new(config);
    orchestrator.start(container, requests)?;

    let total_count = orchestrator.progress().total_count;
    let interior_volume = orchestrator.interior_volume();

    let (command_tx, mut command_rx) = mpsc::channel::<Command>(1);
    let (reply_tx, reply_rx) = mpsc::channel::<WorkerMessage>(1);

    tokio::task::spawn_blocking(move || {
        while let Some(command) = command_rx.blocking_recv() {
            let message = match command {
                Command::Step => match orchestrator.step() {
                    Some(report) => WorkerMessage::Step(report),
                    None => WorkerMessage::Finished(orchestrator.snapshot()),
                },
                Command::Cancel => {
                    orchestrator.cancel();
                    WorkerMessage::Finished(orchestrator.snapshot())
                }
            };
            if reply_tx.blocking_send(message).is_err() {
                break;
            }
        }

        if orchestrator.cancel() {
            tracing::debug!("Worker host disconnected, run cancelled");
        }
    });

    Ok(WorkerHandle {
        commands: command_tx,
        replies: reply_rx,
        total_count,
        interior_volume,
    })
}
