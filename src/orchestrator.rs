//! Packing orchestration.
//!
//! The orchestrator owns one packing run. It expands the request lines into
//! individual work items, sorts them by descending volume (large cartons first
//! to reduce fragmentation) and feeds them one at a time into the placement
//! search. Control returns to the caller after every item so progress can be
//! reported and cancellation observed between steps.
//!
//! State machine: `Idle → Running → (Completed | Cancelled | Failed)`.
//! `Failed` is only reachable from `start`, before any step runs.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{PackError, Result};
use crate::model::{CartonType, ContainerSpec, Orientation, PackRequest, PalletType, PlacedBox};
use crate::search::{PackingConfig, find_position};
use crate::types::{BoundingBox, Dimensional, Vec3};

/// Lifecycle of a packing run.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed { reason: String },
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Failed { .. } => "failed",
        }
    }
}

/// One carton instance waiting in the queue.
#[derive(Clone, Debug)]
struct WorkItem {
    line: usize,
    carton: CartonType,
    pallet: Option<PalletType>,
    volume: f64,
}

/// Progress after a step.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Progress {
    pub processed_count: usize,
    pub total_count: usize,
    pub current_step_label: String,
}

/// Output contract for one placed carton.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacementRecord {
    pub carton_type_id: usize,
    pub orientation: Orientation,
    /// Center of the carton, origin at the container's geometric center.
    pub position: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pallet_type: Option<PalletType>,
}

impl From<&PlacedBox> for PlacementRecord {
    fn from(placed: &PlacedBox) -> Self {
        Self {
            carton_type_id: placed.carton.id,
            orientation: placed.orientation,
            position: placed.position,
            pallet_type: placed.pallet.clone(),
        }
    }
}

/// A carton instance for which no position existed at its attempt.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct NoFitRecord {
    pub carton_type_id: usize,
    pub carton_name: String,
    /// Index of the request line the instance came from.
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pallet_type: Option<PalletType>,
}

/// Aggregate statistics, always derived from the placed list.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingStats {
    pub total_requested: usize,
    pub total_placed: usize,
    pub no_fit_count: usize,
    pub processed_count: usize,
    pub occupied_volume: f64,
    pub interior_volume: f64,
    pub utilization_percent: f64,
}

impl PackingStats {
    fn compute(run: &PackingRun, interior_volume: f64) -> Self {
        let occupied_volume: f64 = run.placed.iter().map(|p| p.volume()).sum();
        let utilization_percent = if interior_volume > 0.0 {
            occupied_volume / interior_volume * 100.0
        } else {
            0.0
        };
        Self {
            total_requested: run.total_requested,
            total_placed: run.placed.len(),
            no_fit_count: run.no_fit.len(),
            processed_count: run.processed,
            occupied_volume,
            interior_volume,
            utilization_percent,
        }
    }
}

/// Result of a single step.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Placed { placement: PlacementRecord },
    NoFit { no_fit: NoFitRecord },
}

/// What the host receives after every step.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct StepReport {
    pub outcome: StepOutcome,
    pub progress: Progress,
    /// Running occupied volume after this step.
    pub occupied_volume: f64,
    pub state: RunState,
}

/// Immutable copy of a run, safe to hand to another thread.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RunSnapshot {
    pub state: RunState,
    pub progress: Progress,
    pub placements: Vec<PlacementRecord>,
    pub no_fit: Vec<NoFitRecord>,
    pub stats: PackingStats,
}

/// Events emitted by [`Orchestrator::run`], suitable for streaming.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// The run was validated and the queue built.
    Started {
        total_count: usize,
        interior_volume: f64,
    },
    /// One work item was processed.
    Step { report: StepReport },
    /// The run reached a terminal state.
    Finished { state: RunState, stats: PackingStats },
}

/// Mutable state of one run. Only the orchestrator writes to it.
#[derive(Clone, Debug, Default)]
struct PackingRun {
    placed: Vec<PlacedBox>,
    no_fit: Vec<NoFitRecord>,
    queue: VecDeque<WorkItem>,
    total_requested: usize,
    processed: usize,
    occupied_volume: f64,
    last_label: String,
}

/// Drives a packing run step by step.
#[derive(Clone, Debug)]
pub struct Orchestrator {
    config: PackingConfig,
    container: Option<ContainerSpec>,
    region: BoundingBox,
    run: PackingRun,
    state: RunState,
}

impl Orchestrator {
    /// Creates an idle orchestrator.
    pub fn new(config: PackingConfig) -> Self {
        Self {
            config,
            container: None,
            region: BoundingBox::new(Vec3::zero(), Vec3::zero()),
            run: PackingRun::default(),
            state: RunState::Idle,
        }
    }

    /// Validates the input and builds the work queue (`Idle → Running`).
    ///
    /// Any invalid container or request line rejects the whole run and moves
    /// the orchestrator to `Failed`. An empty request list completes at once.
    pub fn start(&mut self, container: ContainerSpec, requests: Vec<PackRequest>) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(PackError::NotIdle(self.state.label()));
        }

        if let Err(err) = validate_input(&container, &requests) {
            tracing::warn!(error = %err, "Rejected packing run");
            self.state = RunState::Failed {
                reason: err.to_string(),
            };
            return Err(err);
        }

        let mut queue: Vec<WorkItem> = requests
            .into_iter()
            .enumerate()
            .flat_map(|(line, request)| {
                let volume = request.carton.volume();
                std::iter::repeat_n(
                    WorkItem {
                        line,
                        carton: request.carton,
                        pallet: request.pallet,
                        volume,
                    },
                    request.quantity,
                )
            })
            .collect();

        // Stable sort: equal volumes keep request order.
        queue.sort_by(|a, b| b.volume.partial_cmp(&a.volume).unwrap_or(Ordering::Equal));

        self.region = container.usable_region(self.config.wall_clearance);
        self.container = Some(container);
        self.run = PackingRun {
            total_requested: queue.len(),
            queue: queue.into(),
            ..PackingRun::default()
        };
        self.state = if self.run.queue.is_empty() {
            RunState::Completed
        } else {
            RunState::Running
        };

        tracing::info!(
            total = self.run.total_requested,
            interior_volume = self.interior_volume(),
            "Packing run started"
        );
        Ok(())
    }

    /// Processes exactly one work item.
    ///
    /// Returns `None` if the run is not `Running`.
    pub fn step(&mut self) -> Option<StepReport> {
        if self.state != RunState::Running {
            return None;
        }
        let item = self.run.queue.pop_front()?;

        let placement = find_position(&item.carton, &self.run.placed, &self.region, &self.config);
        self.run.processed += 1;
        self.run.last_label = format!(
            "{} ({}/{})",
            item.carton.name, self.run.processed, self.run.total_requested
        );

        let outcome = match placement {
            Some(placement) => {
                let placed = PlacedBox {
                    carton: item.carton,
                    orientation: placement.orientation,
                    position: placement.center,
                    pallet: item.pallet,
                };
                self.run.occupied_volume += placed.volume();
                let record = PlacementRecord::from(&placed);
                tracing::debug!(
                    carton = record.carton_type_id,
                    x = record.position.x,
                    y = record.position.y,
                    z = record.position.z,
                    "Carton placed"
                );
                self.run.placed.push(placed);
                StepOutcome::Placed { placement: record }
            }
            None => {
                let record = NoFitRecord {
                    carton_type_id: item.carton.id,
                    carton_name: item.carton.name,
                    line: item.line,
                    pallet_type: item.pallet,
                };
                tracing::debug!(carton = record.carton_type_id, "No fit for carton");
                self.run.no_fit.push(record.clone());
                StepOutcome::NoFit { no_fit: record }
            }
        };

        if self.run.queue.is_empty() {
            self.state = RunState::Completed;
            tracing::info!(
                placed = self.run.placed.len(),
                no_fit = self.run.no_fit.len(),
                "Packing run completed"
            );
        }

        Some(StepReport {
            outcome,
            progress: self.progress(),
            occupied_volume: self.run.occupied_volume,
            state: self.state.clone(),
        })
    }

    /// Stops a running run between steps. Placed boxes are kept.
    ///
    /// Returns `false` if the run was not `Running`.
    pub fn cancel(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        self.state = RunState::Cancelled;
        tracing::info!(
            processed = self.run.processed,
            placed = self.run.placed.len(),
            "Packing run cancelled"
        );
        true
    }

    /// Steps until the queue is empty or `cancel` is set, reporting every event.
    ///
    /// The flag is checked before each step, never during one.
    pub fn run(&mut self, cancel: &AtomicBool, mut on_event: impl FnMut(&PackEvent)) -> RunSnapshot {
        if self.state == RunState::Running || self.state == RunState::Completed {
            on_event(&PackEvent::Started {
                total_count: self.run.total_requested,
                interior_volume: self.interior_volume(),
            });
        }

        while self.state == RunState::Running {
            if cancel.load(AtomicOrdering::Relaxed) {
                self.cancel();
                break;
            }
            if let Some(report) = self.step() {
                on_event(&PackEvent::Step { report });
            }
        }

        on_event(&PackEvent::Finished {
            state: self.state.clone(),
            stats: self.stats(),
        });
        self.snapshot()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Boxes placed so far, in placement order.
    pub fn placed(&self) -> &[PlacedBox] {
        &self.run.placed
    }

    /// Usable interior region of the current run.
    pub fn region(&self) -> &BoundingBox {
        &self.region
    }

    /// Number of work items not yet processed.
    pub fn remaining(&self) -> usize {
        self.run.queue.len()
    }

    /// Running occupied volume, updated after every successful step.
    pub fn running_occupied_volume(&self) -> f64 {
        self.run.occupied_volume
    }

    pub fn interior_volume(&self) -> f64 {
        self.container
            .as_ref()
            .map(ContainerSpec::interior_volume)
            .unwrap_or(0.0)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            processed_count: self.run.processed,
            total_count: self.run.total_requested,
            current_step_label: self.run.last_label.clone(),
        }
    }

    /// Statistics recomputed from the placed list.
    pub fn stats(&self) -> PackingStats {
        PackingStats::compute(&self.run, self.interior_volume())
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            state: self.state.clone(),
            progress: self.progress(),
            placements: self.run.placed.iter().map(PlacementRecord::from).collect(),
            no_fit: self.run.no_fit.clone(),
            stats: self.stats(),
        }
    }
}

fn validate_input(container: &ContainerSpec, requests: &[PackRequest]) -> Result<()> {
    container.validate().map_err(PackError::InvalidContainer)?;
    for (line, request) in requests.iter().enumerate() {
        request
            .validate()
            .map_err(|reason| PackError::InvalidRequest { line, reason })?;
    }
    Ok(())
}

/// Runs a whole packing job to completion on the current thread.
pub fn pack(
    container: ContainerSpec,
    requests: Vec<PackRequest>,
    config: PackingConfig,
) -> Result<RunSnapshot> {
    let mut orchestrator = Orchestrator::new(config);
    orchestrator.start(container, requests)?;
    Ok(orchestrator.run(&AtomicBool::new(false), |_| {}))
}
