//! # Cellular Lighting Engine
//!
//! Keeps the four light channels of the arena consistent under block edits and
//! light-source toggles with 6-connected flood fill. Nothing here ever
//! recomputes the whole volume; every operation touches only the cells whose
//! light actually changes.
//!
//! ## Channels and queues
//! Sunlight and the RGB bundle are independent. Each has an add queue (cells
//! whose level must be spread) and a remove queue (cells whose old level must
//! be retracted). A neighbour is only raised when the incoming level exceeds
//! its current level, so additions decrease outward from every source and stop
//! on their own.
//!
//! ## Removal
//! Retracting a level `old` from a cell looks at each neighbour: if its level
//! is no greater than what `old` would have delivered to it, that light may
//! have come through the retracted cell, so it is cleared and retracted in
//! turn. A brighter neighbour is lit from elsewhere and is queued for addition
//! so it refills the cleared area. Cleared cells that are themselves sources
//! (sky-exposed or emissive) are re-seeded before the add pass runs.
//!
//! ## Scope
//! Light only enters cells the [`LightingView`] reports as lightable. The
//! streaming cache answers with "inside a resident chunk that is lit or being
//! lit", which also keeps floods from wrapping around the arena.

use std::collections::{HashSet, VecDeque};
use std::mem;
use std::sync::Arc;

use cgmath::Point3;

use crate::engine_state::voxels::{
    arena::BlockArena,
    block::{block_side::BlockSide, registry::BlockRegistry, Block, Rgb},
    chunk::{chunk_iteration::CellIterator, world_to_chunk_coord},
};

pub mod attenuation;
pub mod light_queue;

pub use attenuation::{attenuate, attenuate_sun, MAX_LIGHT_LEVEL, MIN_LIGHT_LEVEL};
use light_queue::LightQueue;

/// What the lighting engine needs to know about the world beyond the arena.
pub trait LightingView {
    /// Whether light may be written to `pos`.
    fn is_lightable(&self, pos: Point3<i32>) -> bool;

    /// Whether `pos` receives open sky from directly above.
    fn is_sky_exposed(&self, pos: Point3<i32>) -> bool;

    /// Explicit light source registered at `pos`, if any.
    fn registered_source(&self, pos: Point3<i32>) -> Option<Rgb>;
}

/// Chunks whose light bytes were written by one operation.
#[derive(Debug, Default, Clone)]
pub struct LightChanges {
    chunks: HashSet<Point3<i32>>,
    cells_written: usize,
}

impl LightChanges {
    fn record(&mut self, pos: Point3<i32>) {
        self.chunks.insert(world_to_chunk_coord(pos));
        self.cells_written += 1;
    }

    /// Chunk coordinates that saw a light write.
    pub fn chunks(&self) -> impl Iterator<Item = &Point3<i32>> {
        self.chunks.iter()
    }

    /// Whether the chunk at `coord` saw a light write.
    pub fn touched(&self, coord: Point3<i32>) -> bool {
        self.chunks.contains(&coord)
    }

    /// Number of light writes, counting repeated writes to one cell.
    pub fn cells_written(&self) -> usize {
        self.cells_written
    }

    /// `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.cells_written == 0
    }
}

/// Incremental flood-fill solver over a [`BlockArena`].
pub struct LightingEngine {
    registry: Arc<BlockRegistry>,
    sun_add: LightQueue,
    rgb_add: LightQueue,
    sun_remove: VecDeque<(Point3<i32>, u8)>,
    rgb_remove: VecDeque<(Point3<i32>, Rgb)>,
    /// Cells cleared by the current removal pass.
    cleared: Vec<Point3<i32>>,
    changes: LightChanges,
}

impl LightingEngine {
    /// Creates an engine for an arena of `cells` cells.
    pub fn new(registry: Arc<BlockRegistry>, cells: usize) -> Self {
        LightingEngine {
            registry,
            sun_add: LightQueue::new(cells),
            rgb_add: LightQueue::new(cells),
            sun_remove: VecDeque::new(),
            rgb_remove: VecDeque::new(),
            cleared: Vec::new(),
            changes: LightChanges::default(),
        }
    }

    /// Lights the box `min..=max` from scratch.
    ///
    /// Clears the box, seeds sky on its top layer and every emitter inside it,
    /// pulls light in from lightable cells bordering the box, then floods.
    pub fn light_region(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        min: Point3<i32>,
        max: Point3<i32>,
    ) -> LightChanges {
        for pos in CellIterator::new(min, max) {
            let cell = arena.get(pos);
            if cell != cell.unlit() {
                arena.set(pos, cell.unlit());
                self.changes.record(pos);
            }
        }

        for pos in CellIterator::new(min, max) {
            let emission = self.emission_at(arena, view, pos);
            self.seed_rgb(arena, pos, emission);
        }

        let top = Point3::new(min.x, max.y, min.z);
        for pos in CellIterator::new(top, max) {
            let sky = self.sky_level(arena, view, pos);
            self.seed_sun(arena, pos, sky);
        }

        for side in BlockSide::all() {
            let (face_min, face_max) = face_of(min, max, side);
            for pos in CellIterator::new(face_min, face_max) {
                let outside = pos + side.offset();
                if view.is_lightable(outside) {
                    self.requeue(arena, outside);
                }
            }
        }

        self.propagate_additions(arena, view);
        self.finish("light_region")
    }

    /// Retracts all light that flowed out of the box `min..=max`.
    ///
    /// The view must already report the box as unlightable. Every border cell
    /// facing a lightable cell is retracted with its last level, so whatever it
    /// lit outside the box goes dark and is refilled from other sources. The
    /// box's own light bytes are left as they are.
    pub fn unlight_region(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        min: Point3<i32>,
        max: Point3<i32>,
    ) -> LightChanges {
        for side in BlockSide::all() {
            let (face_min, face_max) = face_of(min, max, side);
            for pos in CellIterator::new(face_min, face_max) {
                if !view.is_lightable(pos + side.offset()) {
                    continue;
                }
                let cell = arena.get(pos);
                if cell.sun > 0 {
                    self.sun_remove.push_back((pos, cell.sun));
                }
                if cell.rgb() != [0, 0, 0] {
                    self.rgb_remove.push_back((pos, cell.rgb()));
                }
            }
        }
        self.settle(arena, view);
        self.finish("unlight_region")
    }

    /// Withdraws sky light previously seeded on `cells`.
    ///
    /// Used when the chunk above a lit chunk gets lit itself: its top layer no
    /// longer sees open sky, so whatever it derived from that assumption is
    /// retracted and refilled from the real neighbours.
    pub fn revoke_sky(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        cells: &[Point3<i32>],
    ) -> LightChanges {
        for &pos in cells {
            if !view.is_lightable(pos) {
                continue;
            }
            let sun = arena.get(pos).sun;
            if sun > 0 {
                self.write_sun(arena, pos, 0);
                self.sun_remove.push_back((pos, sun));
                self.cleared.push(pos);
            }
        }
        self.settle(arena, view);
        self.finish("revoke_sky")
    }

    /// Seeds sky light on `cells` that the view now reports as sky-exposed.
    pub fn seed_sky(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        cells: &[Point3<i32>],
    ) -> LightChanges {
        for &pos in cells {
            if view.is_lightable(pos) {
                let sky = self.sky_level(arena, view, pos);
                self.seed_sun(arena, pos, sky);
            }
        }
        self.propagate_additions(arena, view);
        self.finish("seed_sky")
    }

    /// Rebalances light after a block was written at `pos`.
    ///
    /// The arena must already hold the new, unlit block; `previous` is the
    /// cell as it was before the edit. Light that passed through the cell is
    /// retracted, then whatever still reaches it (through its new opacity)
    /// and any emission of the new block is spread again.
    pub fn on_block_added(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        pos: Point3<i32>,
        previous: Block,
    ) -> LightChanges {
        if !view.is_lightable(pos) {
            return self.finish("on_block_added");
        }
        self.retract_cell(pos, previous);
        self.run_removals(arena, view);
        for side in BlockSide::all() {
            let neighbor_pos = pos + side.offset();
            if view.is_lightable(neighbor_pos) {
                self.requeue(arena, neighbor_pos);
            }
        }
        self.reseed_cleared(arena, view);
        self.propagate_additions(arena, view);
        self.finish("on_block_added")
    }

    /// Rebalances light after the block at `pos` was removed.
    ///
    /// The arena must already hold the new, unlit air cell. Light the old
    /// block emitted is retracted first; the cell is then seeded with the
    /// brightest level any neighbour delivers through it and flooded.
    pub fn on_block_removed(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        pos: Point3<i32>,
        previous: Block,
    ) -> LightChanges {
        if !view.is_lightable(pos) {
            return self.finish("on_block_removed");
        }
        self.retract_cell(pos, previous);
        self.run_removals(arena, view);

        let opacity = self.registry.opacity(arena.get(pos).block_type());
        let mut sun = self.sky_level(arena, view, pos);
        let mut rgb = self.emission_at(arena, view, pos);
        for side in BlockSide::all() {
            let neighbor_pos = pos + side.offset();
            if !view.is_lightable(neighbor_pos) {
                continue;
            }
            let neighbor = arena.get(neighbor_pos);
            let travel = side.opposite();
            sun = sun.max(attenuate_sun(neighbor.sun, opacity, travel));
            for (channel, level) in rgb.iter_mut().zip(neighbor.rgb()) {
                *channel = (*channel).max(attenuate(level, opacity));
            }
        }
        self.seed_sun(arena, pos, sun);
        self.seed_rgb(arena, pos, rgb);

        self.reseed_cleared(arena, view);
        self.propagate_additions(arena, view);
        self.finish("on_block_removed")
    }

    /// Spreads a newly registered light source at `pos`.
    ///
    /// The view must already report the source.
    pub fn add_light_source(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        pos: Point3<i32>,
        rgb: Rgb,
    ) -> LightChanges {
        if view.is_lightable(pos) {
            self.seed_rgb(arena, pos, rgb);
            self.propagate_additions(arena, view);
        }
        self.finish("add_light_source")
    }

    /// Retracts the light of a source that was unregistered at `pos`.
    ///
    /// The view must no longer report the source. Sunlight is untouched.
    pub fn remove_light_source(
        &mut self,
        arena: &mut BlockArena,
        view: &dyn LightingView,
        pos: Point3<i32>,
    ) -> LightChanges {
        if !view.is_lightable(pos) {
            return self.finish("remove_light_source");
        }
        let old = arena.get(pos).rgb();
        if old.iter().any(|&level| level > 0) {
            self.write_rgb(arena, pos, [0, 0, 0]);
            self.rgb_remove.push_back((pos, old));
            self.cleared.push(pos);
            self.settle(arena, view);
        }
        self.finish("remove_light_source")
    }

    fn retract_cell(&mut self, pos: Point3<i32>, previous: Block) {
        if previous.sun > 0 {
            self.sun_remove.push_back((pos, previous.sun));
        }
        if previous.rgb().iter().any(|&level| level > 0) {
            self.rgb_remove.push_back((pos, previous.rgb()));
        }
        self.cleared.push(pos);
    }

    fn settle(&mut self, arena: &mut BlockArena, view: &dyn LightingView) {
        self.run_removals(arena, view);
        self.reseed_cleared(arena, view);
        self.propagate_additions(arena, view);
    }

    fn run_removals(&mut self, arena: &mut BlockArena, view: &dyn LightingView) {
        while let Some((pos, old)) = self.sun_remove.pop_front() {
            for side in BlockSide::all() {
                let neighbor_pos = pos + side.offset();
                if !view.is_lightable(neighbor_pos) {
                    continue;
                }
                let neighbor = arena.get(neighbor_pos);
                if neighbor.sun == 0 {
                    continue;
                }
                let opacity = self.registry.opacity(neighbor.block_type());
                let contribution = attenuate_sun(old, opacity, side);
                if neighbor.sun <= contribution {
                    self.write_sun(arena, neighbor_pos, 0);
                    self.sun_remove.push_back((neighbor_pos, neighbor.sun));
                    self.cleared.push(neighbor_pos);
                } else {
                    self.sun_add.push(neighbor_pos, arena.index(neighbor_pos));
                }
            }
        }

        while let Some((pos, old)) = self.rgb_remove.pop_front() {
            for side in BlockSide::all() {
                let neighbor_pos = pos + side.offset();
                if !view.is_lightable(neighbor_pos) {
                    continue;
                }
                let neighbor = arena.get(neighbor_pos);
                let current = neighbor.rgb();
                if current == [0, 0, 0] {
                    continue;
                }
                let opacity = self.registry.opacity(neighbor.block_type());
                let mut remaining = current;
                let mut retracted = [0u8; 3];
                let mut lit_elsewhere = false;
                for channel in 0..3 {
                    if current[channel] == 0 {
                        continue;
                    }
                    if current[channel] <= attenuate(old[channel], opacity) {
                        retracted[channel] = current[channel];
                        remaining[channel] = 0;
                    } else {
                        lit_elsewhere = true;
                    }
                }
                if remaining != current {
                    self.write_rgb(arena, neighbor_pos, remaining);
                    self.rgb_remove.push_back((neighbor_pos, retracted));
                    self.cleared.push(neighbor_pos);
                }
                if lit_elsewhere {
                    self.rgb_add.push(neighbor_pos, arena.index(neighbor_pos));
                }
            }
        }
    }

    fn reseed_cleared(&mut self, arena: &mut BlockArena, view: &dyn LightingView) {
        for pos in mem::take(&mut self.cleared) {
            let sky = self.sky_level(arena, view, pos);
            self.seed_sun(arena, pos, sky);
            let emission = self.emission_at(arena, view, pos);
            self.seed_rgb(arena, pos, emission);
        }
    }

    fn propagate_additions(&mut self, arena: &mut BlockArena, view: &dyn LightingView) {
        while let Some(pos) = self.sun_add.pop() {
            let level = arena.get(pos).sun;
            if level == 0 {
                continue;
            }
            for side in BlockSide::all() {
                let neighbor_pos = pos + side.offset();
                if !view.is_lightable(neighbor_pos) {
                    continue;
                }
                let neighbor = arena.get(neighbor_pos);
                let opacity = self.registry.opacity(neighbor.block_type());
                let incoming = attenuate_sun(level, opacity, side);
                if incoming > neighbor.sun {
                    self.write_sun(arena, neighbor_pos, incoming);
                    self.sun_add.push(neighbor_pos, arena.index(neighbor_pos));
                }
            }
        }

        while let Some(pos) = self.rgb_add.pop() {
            let levels = arena.get(pos).rgb();
            if levels == [0, 0, 0] {
                continue;
            }
            for side in BlockSide::all() {
                let neighbor_pos = pos + side.offset();
                if !view.is_lightable(neighbor_pos) {
                    continue;
                }
                let neighbor = arena.get(neighbor_pos);
                let opacity = self.registry.opacity(neighbor.block_type());
                let current = neighbor.rgb();
                let mut raised = current;
                for channel in 0..3 {
                    raised[channel] = current[channel].max(attenuate(levels[channel], opacity));
                }
                if raised != current {
                    self.write_rgb(arena, neighbor_pos, raised);
                    self.rgb_add.push(neighbor_pos, arena.index(neighbor_pos));
                }
            }
        }
    }

    /// Raises the sun level at `pos` to `level` and queues it if that changed anything.
    fn seed_sun(&mut self, arena: &mut BlockArena, pos: Point3<i32>, level: u8) {
        if level > arena.get(pos).sun {
            self.write_sun(arena, pos, level);
            self.sun_add.push(pos, arena.index(pos));
        }
    }

    /// Raises each RGB channel at `pos` to `levels` and queues the cell if any rose.
    fn seed_rgb(&mut self, arena: &mut BlockArena, pos: Point3<i32>, levels: Rgb) {
        let current = arena.get(pos).rgb();
        let raised = [
            current[0].max(levels[0]),
            current[1].max(levels[1]),
            current[2].max(levels[2]),
        ];
        if raised != current {
            self.write_rgb(arena, pos, raised);
            self.rgb_add.push(pos, arena.index(pos));
        }
    }

    /// Queues an already-lit cell so its current levels spread again.
    fn requeue(&mut self, arena: &BlockArena, pos: Point3<i32>) {
        let cell = arena.get(pos);
        let index = arena.index(pos);
        if cell.sun > 0 {
            self.sun_add.push(pos, index);
        }
        if cell.rgb() != [0, 0, 0] {
            self.rgb_add.push(pos, index);
        }
    }

    fn sky_level(&self, arena: &BlockArena, view: &dyn LightingView, pos: Point3<i32>) -> u8 {
        if !view.is_sky_exposed(pos) {
            return 0;
        }
        let opacity = self.registry.opacity(arena.get(pos).block_type());
        attenuate_sun(MAX_LIGHT_LEVEL, opacity, BlockSide::BOTTOM)
    }

    fn emission_at(&self, arena: &BlockArena, view: &dyn LightingView, pos: Point3<i32>) -> Rgb {
        let mut emission = self.registry.emission(arena.get(pos).block_type());
        if let Some(source) = view.registered_source(pos) {
            for (channel, level) in emission.iter_mut().zip(source) {
                *channel = (*channel).max(level);
            }
        }
        emission
    }

    fn write_sun(&mut self, arena: &mut BlockArena, pos: Point3<i32>, level: u8) {
        arena.get_mut(pos).sun = level;
        self.changes.record(pos);
    }

    fn write_rgb(&mut self, arena: &mut BlockArena, pos: Point3<i32>, levels: Rgb) {
        arena.get_mut(pos).set_rgb(levels);
        self.changes.record(pos);
    }

    fn finish(&mut self, operation: &str) -> LightChanges {
        let changes = mem::take(&mut self.changes);
        log::trace!(
            "{operation}: {} light writes across {} chunks",
            changes.cells_written(),
            changes.chunks.len()
        );
        changes
    }
}

/// Cells of the box `min..=max` lying on the given face.
fn face_of(min: Point3<i32>, max: Point3<i32>, side: BlockSide) -> (Point3<i32>, Point3<i32>) {
    let mut face_min = min;
    let mut face_max = max;
    let fixed = if side.is_positive() { max } else { min };
    match side.axis() {
        0 => {
            face_min.x = fixed.x;
            face_max.x = fixed.x;
        }
        1 => {
            face_min.y = fixed.y;
            face_max.y = fixed.y;
        }
        _ => {
            face_min.z = fixed.z;
            face_max.z = fixed.z;
        }
    }
    (face_min, face_max)
}
