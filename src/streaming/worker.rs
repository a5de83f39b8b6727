use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_tasks::futures_lite::future;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::lod::DetailLevel;

use super::{FeatureProvider, FetchOutcome, FetchTicket};

/// Runs provider requests off the frame loop. Finished requests queue up in
/// the channel until the next frame drains it.
#[derive(Resource)]
pub struct FetchWorker {
    provider: Arc<dyn FeatureProvider>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl FetchWorker {
    pub fn new(provider: Arc<dyn FeatureProvider>) -> Self {
        let (tx, rx) = unbounded();
        FetchWorker { provider, tx, rx }
    }

    pub fn dispatch(&self, commands: &mut Commands, ticket: FetchTicket, level: DetailLevel) {
        let task_pool = AsyncComputeTaskPool::get();
        let provider = self.provider.clone();
        let tx = self.tx.clone();
        let task = task_pool.spawn(async move {
            let result = provider.fetch(ticket.category, &level);
            // The receiver lives as long as the app does.
            let _ = tx.send(FetchOutcome { ticket, result });
        });
        commands.spawn(TaskComponent(task));
    }

    pub fn drain(&self) -> Vec<FetchOutcome> {
        self.rx.try_iter().collect()
    }
}

#[derive(Component)]
pub struct TaskComponent(pub Task<()>);

pub fn cleanup_tasks(mut commands: Commands, mut tasks: Query<(Entity, &mut TaskComponent)>) {
    for (entity, mut task) in tasks.iter_mut() {
        if future::block_on(future::poll_once(&mut task.0)).is_some() {
            commands.entity(entity).despawn();
        }
    }
}
