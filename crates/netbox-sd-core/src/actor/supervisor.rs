//! `SupervisorActor`: Group registry
//!
//! Keeps one `GroupActor` per configured group, keyed by output file. Handlers
//! never wait for a group's cycle: status comes from each worker's watcher and
//! manual runs are answered by a spawned task.

use std::collections::BTreeMap;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use kameo::reply::DelegatedReply;
use tracing::{info, warn};

use crate::actor::group::{GroupActor, GroupActorArgs};
use crate::error::CoreError;
use crate::message::{GetGroup, ListGroups, RegisterGroup, RunGroup, RunNow};
use crate::worker::{CycleReport, GroupStatus, StatusWatcher};

/// Arguments for spawning a `SupervisorActor`
#[derive(Debug, Clone)]
pub struct SupervisorActorArgs {
    /// Start the tick scheduler of every registered group
    pub schedule: bool,
}

impl Default for SupervisorActorArgs {
    fn default() -> Self {
        Self { schedule: true }
    }
}

/// A registered group
struct GroupHandle {
    actor: ActorRef<GroupActor>,
    status: StatusWatcher,
}

/// Registry of all group actors
pub struct SupervisorActor {
    /// Group actors by output file
    groups: BTreeMap<String, GroupHandle>,
    /// Start schedulers for new groups
    schedule: bool,
}

impl SupervisorActor {
    /// Number of registered groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn lookup(&self, file: &str) -> Result<&GroupHandle, CoreError> {
        self.groups
            .get(file)
            .ok_or_else(|| CoreError::GroupNotFound(file.to_string()))
    }
}

impl Actor for SupervisorActor {
    type Args = SupervisorActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(id = %actor_ref.id(), schedule = args.schedule, "SupervisorActor starting");

        Ok(Self {
            groups: BTreeMap::new(),
            schedule: args.schedule,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "SupervisorActor stopping");

        // Stop all group actors
        for (file, handle) in &self.groups {
            info!(group = %file, "stopping GroupActor");
            handle.actor.stop_gracefully().await.ok();
        }

        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RegisterGroup> for SupervisorActor {
    type Reply = Result<(), CoreError>;

    async fn handle(
        &mut self,
        msg: RegisterGroup,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let file = msg.worker.group().file.clone();

        if self.groups.contains_key(&file) {
            return Err(CoreError::GroupAlreadyExists(file));
        }

        let status = msg.worker.subscribe();
        let actor = GroupActor::spawn(GroupActorArgs {
            worker: msg.worker,
            schedule: self.schedule,
        });
        info!(group = %file, "spawned GroupActor");

        self.groups.insert(file, GroupHandle { actor, status });
        Ok(())
    }
}

impl Message<ListGroups> for SupervisorActor {
    type Reply = Vec<GroupStatus>;

    async fn handle(
        &mut self,
        _msg: ListGroups,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.groups
            .values()
            .map(|handle| handle.status.borrow().clone())
            .collect()
    }
}

impl Message<GetGroup> for SupervisorActor {
    type Reply = Result<GroupStatus, CoreError>;

    async fn handle(
        &mut self,
        msg: GetGroup,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.lookup(&msg.file)?.status.borrow().clone())
    }
}

impl Message<RunGroup> for SupervisorActor {
    type Reply = DelegatedReply<Result<CycleReport, CoreError>>;

    async fn handle(
        &mut self,
        msg: RunGroup,
        ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let (delegated, reply_sender) = ctx.reply_sender();
        let actor = self.lookup(&msg.file).map(|handle| handle.actor.clone());

        // The group may be mid-cycle; wait for it outside of this actor
        tokio::spawn(async move {
            let result = match actor {
                Ok(actor) => actor
                    .ask(RunNow)
                    .await
                    .map_err(|e| CoreError::ActorError(e.to_string())),
                Err(e) => Err(e),
            };

            match reply_sender {
                Some(tx) => tx.send(result),
                None => {
                    if let Err(e) = result {
                        warn!(group = %msg.file, error = %e, "manual run failed");
                    }
                }
            }
        });

        delegated
    }
}
