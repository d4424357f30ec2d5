//! `GroupActor`: Per-group scheduling
//!
//! Hosts one [`GroupWorker`]. A scheduler task asks the actor for a [`Tick`]
//! every [`WORKER_TICK`]; since it waits for each reply, cycles of one group
//! never overlap. Status is read from the worker's [`StatusWatcher`] instead
//! of asking the actor, so it stays readable while a cycle runs.
//!
//! [`StatusWatcher`]: crate::worker::StatusWatcher

use std::time::Instant;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::message::{RunNow, Tick};
use crate::worker::{CycleReport, GroupWorker, WORKER_TICK};

/// Arguments for spawning a `GroupActor`
pub struct GroupActorArgs {
    /// Worker owning the group
    pub worker: GroupWorker,
    /// Start the tick scheduler. Disable to drive the actor by hand.
    pub schedule: bool,
}

/// Per-group actor running the worker's cycles
pub struct GroupActor {
    /// The worker
    worker: GroupWorker,
    /// Scheduler task, if any
    scheduler: Option<JoinHandle<()>>,
}

impl GroupActor {
    /// Output file of the hosted group
    #[must_use]
    pub fn file(&self) -> &str {
        &self.worker.group().file
    }
}

/// Keep sending ticks until the actor is gone
fn spawn_scheduler(actor_ref: WeakActorRef<GroupActor>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(WORKER_TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let Some(actor) = actor_ref.upgrade() else {
                break;
            };
            if actor.ask(Tick).await.is_err() {
                break;
            }
        }
    })
}

impl Actor for GroupActor {
    type Args = GroupActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        let group = args.worker.group();
        info!(
            group = %group.file,
            kind = %group.kind,
            interval = ?group.scan_interval,
            id = %actor_ref.id(),
            "GroupActor starting"
        );

        let scheduler = args
            .schedule
            .then(|| spawn_scheduler(actor_ref.downgrade()));

        Ok(Self {
            worker: args.worker,
            scheduler,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(group = %self.file(), reason = ?reason, "GroupActor stopping");

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.abort();
        }

        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Tick> for GroupActor {
    type Reply = Option<CycleReport>;

    async fn handle(&mut self, _msg: Tick, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if !self.worker.is_due(Instant::now()) {
            return None;
        }
        Some(self.worker.run_cycle().await)
    }
}

impl Message<RunNow> for GroupActor {
    type Reply = CycleReport;

    async fn handle(
        &mut self,
        _msg: RunNow,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        debug!(group = %self.file(), "manual run requested");
        self.worker.run_cycle().await
    }
}
