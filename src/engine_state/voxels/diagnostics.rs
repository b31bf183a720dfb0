//! Read-only statistics for a HUD or overlay.

use std::time::Duration;

use serde::Serialize;

use super::chunk::ChunkState;

/// Number of resident chunks in each pipeline state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub awaiting_generate: usize,
    pub generating: usize,
    pub awaiting_lighting: usize,
    pub lighting: usize,
    pub awaiting_build: usize,
    pub building: usize,
    pub ready: usize,
    pub awaiting_removal: usize,
}

impl StateCounts {
    /// Counts one more chunk in `state`.
    pub fn record(&mut self, state: ChunkState) {
        *self.slot(state) += 1;
    }

    /// Chunks currently in `state`.
    pub fn get(&self, state: ChunkState) -> usize {
        match state {
            ChunkState::AwaitingGenerate => self.awaiting_generate,
            ChunkState::Generating => self.generating,
            ChunkState::AwaitingLighting => self.awaiting_lighting,
            ChunkState::Lighting => self.lighting,
            ChunkState::AwaitingBuild => self.awaiting_build,
            ChunkState::Building => self.building,
            ChunkState::Ready => self.ready,
            ChunkState::AwaitingRemoval => self.awaiting_removal,
        }
    }

    /// All resident chunks.
    pub fn total(&self) -> usize {
        ChunkState::ALL.iter().map(|&state| self.get(state)).sum()
    }

    fn slot(&mut self, state: ChunkState) -> &mut usize {
        match state {
            ChunkState::AwaitingGenerate => &mut self.awaiting_generate,
            ChunkState::Generating => &mut self.generating,
            ChunkState::AwaitingLighting => &mut self.awaiting_lighting,
            ChunkState::Lighting => &mut self.lighting,
            ChunkState::AwaitingBuild => &mut self.awaiting_build,
            ChunkState::Building => &mut self.building,
            ChunkState::Ready => &mut self.ready,
            ChunkState::AwaitingRemoval => &mut self.awaiting_removal,
        }
    }
}

/// What one sweep of the cache did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub generated: usize,
    pub lit: usize,
    pub built: usize,
    pub evicted: usize,
    pub created: usize,
    /// `Ready -> AwaitingBuild` transitions caused by light spilling in from
    /// lit or evicted neighbours.
    pub dirtied: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SweepReport {
    /// `true` if the sweep found nothing to do.
    pub fn is_idle(&self) -> bool {
        self.generated == 0
            && self.lit == 0
            && self.built == 0
            && self.evicted == 0
            && self.created == 0
            && self.dirtied == 0
    }

    /// Stage advances performed, the quantity bounded by the sweep budget.
    pub fn stage_advances(&self) -> usize {
        self.generated + self.lit + self.built
    }
}
