//! Deferred cellular water flow.
//!
//! Edits enqueue the coordinates they affect; each tick a bounded number of
//! queued cells are settled. A liquid cell fills Air below it, otherwise it
//! spreads sideways until its spread level reaches the configured maximum.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use tracing::trace;
use voxterra_core::coords::{ChunkPos, Face, WorldPos};
use voxterra_core::types::Voxel;

use crate::dimension::{Dimension, DimensionEvent};

const HORIZONTAL: [Face; 4] = [Face::NegX, Face::PosX, Face::NegZ, Face::PosZ];

/// Water flow tuning.
#[derive(Debug, Clone, Copy)]
pub struct WaterConfig {
    /// Queue entries processed per tick.
    pub budget_per_tick: usize,
    /// Horizontal steps water travels from a cell with support below it.
    pub max_spread: u8,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            budget_per_tick: 64,
            max_spread: 6,
        }
    }
}

impl WaterConfig {
    pub fn with_budget(mut self, budget_per_tick: usize) -> Self {
        self.budget_per_tick = budget_per_tick;
        self
    }

    pub fn with_max_spread(mut self, max_spread: u8) -> Self {
        self.max_spread = max_spread;
        self
    }
}

/// Work queue for water propagation in one dimension.
#[derive(Debug, Default)]
pub struct WaterSimulator {
    config: WaterConfig,
    queue: VecDeque<WorldPos>,
    pending: HashSet<WorldPos>,
    /// Spread level of flowed cells; cells absent here count as sources.
    levels: HashMap<WorldPos, u8>,
}

impl WaterSimulator {
    pub fn new(config: WaterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &WaterConfig {
        &self.config
    }

    /// Queue a cell for settling. Already queued cells are not duplicated.
    pub fn enqueue(&mut self, pos: WorldPos) {
        if self.pending.insert(pos) {
            self.queue.push_back(pos);
        }
    }

    /// React to an edit at `pos`: the cell itself and every liquid
    /// neighbor may now be able to flow.
    pub fn notify_changed(&mut self, dimension: &Dimension, pos: WorldPos) {
        if dimension.get_voxel(pos).is_liquid() {
            self.enqueue(pos);
        } else {
            self.levels.remove(&pos);
        }
        for face in Face::ALL {
            let neighbor = pos.neighbor(face);
            if dimension.get_voxel(neighbor).is_liquid() {
                self.enqueue(neighbor);
            }
        }
    }

    /// Number of queued cells.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Forget all queued work and levels, e.g. when the dimension changes.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
        self.levels.clear();
    }

    /// Drop queued work and spread levels inside an unloaded chunk.
    ///
    /// Water in a reloaded chunk comes back as sources, since levels are
    /// not part of the diff.
    pub fn forget_chunk(&mut self, chunk: ChunkPos) {
        self.levels.retain(|pos, _| pos.chunk_pos() != chunk);
        let before = self.queue.len();
        self.queue.retain(|pos| pos.chunk_pos() != chunk);
        if self.queue.len() != before {
            self.pending.retain(|pos| pos.chunk_pos() != chunk);
        }
    }

    /// React to dimension events that invalidate tracked cells.
    pub fn handle_events<'a>(&mut self, events: impl IntoIterator<Item = &'a DimensionEvent>) {
        for event in events {
            if let DimensionEvent::ChunkUnloaded(chunk) = event {
                self.forget_chunk(*chunk);
            }
        }
    }

    /// Number of cells carrying a spread level.
    pub fn tracked_levels(&self) -> usize {
        self.levels.len()
    }

    /// Settle up to `budget_per_tick` queued cells. Returns how many were
    /// processed.
    pub fn tick(&mut self, dimension: &mut Dimension) -> usize {
        let mut processed = 0;
        let mut filled = 0;
        while processed < self.config.budget_per_tick {
            let Some(pos) = self.queue.pop_front() else {
                break;
            };
            self.pending.remove(&pos);
            processed += 1;
            filled += self.settle(dimension, pos);
        }
        if processed > 0 {
            trace!(processed, filled, pending = self.queue.len(), "water tick");
        }
        processed
    }

    fn is_loaded(dimension: &Dimension, pos: WorldPos) -> bool {
        dimension.contains(pos.chunk_pos())
    }

    fn flow_into(&mut self, dimension: &mut Dimension, pos: WorldPos, water: Voxel, level: u8) -> bool {
        if !dimension.set_voxel(pos, water) {
            return false;
        }
        self.levels.insert(pos, level);
        self.enqueue(pos);
        true
    }

    fn settle(&mut self, dimension: &mut Dimension, pos: WorldPos) -> usize {
        let water = dimension.get_voxel(pos);
        if !water.is_liquid() {
            self.levels.remove(&pos);
            return 0;
        }
        let level = self.levels.get(&pos).copied().unwrap_or(0);

        let below = pos.neighbor(Face::NegY);
        if !Self::is_loaded(dimension, below) {
            return 0;
        }
        if dimension.get_voxel(below).is_air() {
            return usize::from(self.flow_into(dimension, below, water, level));
        }

        if level >= self.config.max_spread {
            return 0;
        }
        let mut filled = 0;
        for face in HORIZONTAL {
            let side = pos.neighbor(face);
            if Self::is_loaded(dimension, side)
                && dimension.get_voxel(side).is_air()
                && self.flow_into(dimension, side, water, level + 1)
            {
                filled += 1;
            }
        }
        filled
    }
}
