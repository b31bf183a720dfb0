//! # Task Management
//!
//! Runs the [`ChunkStreamer`] on a single background worker thread.
//!
//! ## Architecture Overview
//! - `ChunkCache`: the handle consumers hold. It owns the streamer inside an
//!   `MtResource`, the sending half of the command channel and the worker.
//! - `WorkerCommand`: what the worker receives. Edits are queued rather than
//!   applied from the caller's thread, which makes the worker the only thread
//!   that ever mutates chunk state or the arena.
//! - The cache center is not a command. It is published through a shared slot
//!   that the streamer re-reads at every stage boundary, so a long sweep
//!   notices a moved viewpoint immediately.
//! - State counts are republished by the worker after every edit batch and
//!   sweep, so reading them never waits on a sweep in progress.
//!
//! ## Worker Lifecycle
//! 1. The worker starts on the first `update_cache_position`.
//! 2. While a sweep still finds work it keeps sweeping, draining queued
//!    commands between sweeps.
//! 3. Once a sweep is idle it blocks on the channel, waking for the next
//!    command or after `idle_timeout_ms`.
//! 4. Dropping the `ChunkCache` sends `Shutdown` and joins the thread.
//!
//! ## Example Usage
//! ```no_run
//! use voxel_streaming::{CacheConfig, ChunkCache};
//!
//! let cache = ChunkCache::from_config(CacheConfig::default()).unwrap();
//! cache.update_cache_position(0.0, 16.0, 0.0);
//! // ... later, on the render thread
//! for event in cache.drain_mesh_events() {
//!     println!("{:?}", event.coordinate());
//! }
//! ```

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Mutex, RwLockReadGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cgmath::Point3;
use log::{info, warn};

use crate::config::CacheConfig;
use crate::core::MtResource;
use crate::engine_state::meshing::MeshEvent;
use crate::engine_state::voxels::{
    block::{Block, Rgb},
    chunk::ChunkState,
    diagnostics::StateCounts,
    streamer::{CenterSlot, ChunkStreamer, Edit},
};
use crate::error::ConfigError;

/// Messages from the cache handle to the worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkerCommand {
    Edit(Edit),
    /// New work may exist; sweep again.
    Wake,
    Shutdown,
}

/// Thread-safe handle to a streaming chunk cache.
pub struct ChunkCache {
    streamer: MtResource<ChunkStreamer>,
    /// Snapshot of `streamer.state_counts()`, written only by the worker.
    counts: MtResource<StateCounts>,
    center: CenterSlot,
    commands: Sender<WorkerCommand>,
    /// Receiving half, held until the worker starts.
    pending_receiver: Mutex<Option<Receiver<WorkerCommand>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    mesh_events: Mutex<Receiver<MeshEvent>>,
    idle_timeout: Duration,
}

impl ChunkCache {
    /// Wraps a streamer. The worker does not start until the first
    /// [`ChunkCache::update_cache_position`].
    pub fn new(mut streamer: ChunkStreamer) -> Self {
        let mesh_events = streamer.subscribe_meshes();
        let center = streamer.center_slot();
        let idle_timeout = Duration::from_millis(streamer.config().idle_timeout_ms);
        let (commands, receiver) = channel();
        ChunkCache {
            counts: MtResource::new(streamer.state_counts()),
            streamer: MtResource::new(streamer),
            center,
            commands,
            pending_receiver: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
            mesh_events: Mutex::new(mesh_events),
            idle_timeout,
        }
    }

    /// A cache over Perlin terrain. Fails on an invalid configuration, before
    /// any thread exists.
    pub fn from_config(config: CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(ChunkStreamer::from_config(config)?))
    }

    /// Moves the cache center and starts the worker on first use.
    pub fn update_cache_position(&self, x: f32, y: f32, z: f32) {
        *self.center.get_mut() = Some(Point3::new(x, y, z));
        self.ensure_worker();
        self.send(WorkerCommand::Wake);
    }

    pub fn add_block(&self, pos: Point3<i32>, block: Block) {
        self.send(WorkerCommand::Edit(Edit::AddBlock(pos, block)));
    }

    pub fn remove_block(&self, pos: Point3<i32>) {
        self.send(WorkerCommand::Edit(Edit::RemoveBlock(pos)));
    }

    pub fn add_light_source(&self, pos: Point3<i32>, rgb: Rgb) {
        self.send(WorkerCommand::Edit(Edit::AddLightSource(pos, rgb)));
    }

    pub fn remove_light_source(&self, pos: Point3<i32>) {
        self.send(WorkerCommand::Edit(Edit::RemoveLightSource(pos)));
    }

    /// Read access to the streamer. Blocks while the worker is mid-sweep.
    pub fn streamer(&self) -> RwLockReadGuard<'_, ChunkStreamer> {
        self.streamer.get()
    }

    /// Resident chunks per pipeline state, as of the worker's last edit batch
    /// or sweep. Does not block on a running sweep.
    pub fn state_counts(&self) -> StateCounts {
        *self.counts.get()
    }

    /// State of the chunk containing `pos`, if resident.
    pub fn chunk_state_at(&self, pos: Point3<i32>) -> Option<ChunkState> {
        self.streamer
            .get()
            .get_chunk_by_world_position(pos)
            .map(|chunk| chunk.state())
    }

    /// Mesh events published since the last call, oldest first.
    pub fn drain_mesh_events(&self) -> Vec<MeshEvent> {
        let events = self
            .mesh_events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let drained = events.try_iter().collect();
        drained
    }

    /// Whether the background worker has been started.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    fn send(&self, command: WorkerCommand) {
        if self.commands.send(command).is_err() {
            warn!("chunk worker is gone; dropped {command:?}");
        }
    }

    fn ensure_worker(&self) {
        let mut worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if worker.is_some() {
            return;
        }
        let Some(receiver) = self
            .pending_receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        else {
            return;
        };

        let streamer = self.streamer.clone();
        let counts = self.counts.clone();
        let idle_timeout = self.idle_timeout;
        let spawned = thread::Builder::new()
            .name("chunk-worker".into())
            .spawn(move || run_worker(streamer, counts, receiver, idle_timeout));
        match spawned {
            Ok(handle) => *worker = Some(handle),
            Err(error) => warn!("could not start chunk worker: {error}"),
        }
    }
}

impl Drop for ChunkCache {
    fn drop(&mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("chunk worker panicked");
            }
        }
    }
}

/// Worker body: apply queued commands, sweep, and block when there is nothing to do.
fn run_worker(
    streamer: MtResource<ChunkStreamer>,
    counts: MtResource<StateCounts>,
    receiver: Receiver<WorkerCommand>,
    idle_timeout: Duration,
) {
    info!("chunk worker started");
    let mut busy = true;
    'work: loop {
        let first = if busy {
            match receiver.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match receiver.recv_timeout(idle_timeout) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        };

        if let Some(first) = first {
            let mut guard = streamer.get_mut();
            for command in std::iter::once(first).chain(receiver.try_iter()) {
                match command {
                    WorkerCommand::Edit(edit) => {
                        guard.apply(edit);
                    }
                    WorkerCommand::Wake => {}
                    WorkerCommand::Shutdown => break 'work,
                }
            }
            *counts.get_mut() = guard.state_counts();
        }

        let mut guard = streamer.get_mut();
        let report = guard.sweep();
        *counts.get_mut() = guard.state_counts();
        drop(guard);
        busy = !report.is_idle();
    }
    info!("chunk worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::engine_state::generation::FlatTerrain;
    use crate::engine_state::meshing::CulledMeshBuilder;
    use crate::engine_state::voxels::block::{block_type::BlockType, registry::BlockRegistry};

    fn flat_cache() -> ChunkCache {
        let registry = Arc::new(BlockRegistry::new());
        let config = CacheConfig {
            view_range: 0,
            cache_range: 1,
            idle_timeout_ms: 20,
            ..CacheConfig::default()
        };
        let streamer = ChunkStreamer::new(
            config,
            registry.clone(),
            Arc::new(FlatTerrain::new(3, BlockType::STONE, &registry)),
            Arc::new(CulledMeshBuilder::new(registry)),
        )
        .unwrap();
        ChunkCache::new(streamer)
    }

    #[test]
    fn state_counts_do_not_wait_for_the_streamer_lock() {
        let cache = flat_cache();
        let held = cache.streamer.get_mut();
        assert_eq!(cache.state_counts().total(), 0);
        drop(held);
    }

    #[test]
    fn published_counts_follow_the_streamer() {
        let cache = flat_cache();
        cache.update_cache_position(1.0, 1.0, 1.0);

        let deadline = Instant::now() + Duration::from_secs(10);
        while cache.state_counts().ready != 1 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        let counts = cache.state_counts();
        assert_eq!(counts.ready, 1);
        assert_eq!(counts.awaiting_lighting, 26);
        assert_eq!(counts, cache.streamer().state_counts());
    }
}
