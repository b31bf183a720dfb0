//! # Terrain Generation
//!
//! The cache hands each chunk to a [`TerrainGenerator`] once, when the chunk
//! enters the cache range. Generators write through a [`ChunkWriter`], which
//! confines them to their chunk and leaves every cell unlit.
//!
//! Generators must be deterministic in the world position: a chunk that is
//! evicted and later recreated has to come back identical apart from edits.

use std::sync::Arc;

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use crate::engine_state::voxels::{
    block::{block_type::BlockType, registry::BlockRegistry, Block},
    chunk::{chunk_creation::ChunkWriter, CHUNK_DIMENSION},
};

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Height of the terrain surface where the noise is zero.
pub const BASE_HEIGHT: f64 = 8.0;
/// Maximum deviation of the surface from `BASE_HEIGHT`.
pub const HEIGHT_AMPLITUDE: f64 = 24.0;
/// Depth of the dirt layer under the grass.
pub const DIRT_DEPTH: i32 = 3;
/// One surface column in this many carries a lamp.
pub const LAMP_RARITY: u64 = 211;

/// Fills freshly created chunks with blocks.
pub trait TerrainGenerator: Send + Sync {
    /// Writes the blocks of the chunk whose lowest corner is `writer.origin()`.
    fn generate_data_for_chunk(&self, writer: &mut ChunkWriter);
}

/// Rolling heightmap terrain with grass, dirt, stone and the odd lamp.
pub struct PerlinTerrain {
    seed: u32,
    perlin: Perlin,
    /// Source of each block type's tint.
    registry: Arc<BlockRegistry>,
}

impl PerlinTerrain {
    pub fn new(seed: u32, registry: Arc<BlockRegistry>) -> Self {
        PerlinTerrain {
            seed,
            perlin: Perlin::new(seed),
            registry,
        }
    }

    /// Surface height of the column at world `x`, `z`.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let sample = self
            .perlin
            .get([x as f64 * PERLIN_SCALE_FACTOR, z as f64 * PERLIN_SCALE_FACTOR]);
        (BASE_HEIGHT + sample * HEIGHT_AMPLITUDE).floor() as i32
    }

    /// Whether the column at world `x`, `z` carries a lamp on its surface.
    fn has_lamp(&self, x: i32, z: i32) -> bool {
        let column = ((x as u32 as u64) << 32) | z as u32 as u64;
        let mut rng = fastrand::Rng::with_seed(column ^ ((self.seed as u64) << 17));
        rng.u64(..LAMP_RARITY) == 0
    }
}

impl TerrainGenerator for PerlinTerrain {
    fn generate_data_for_chunk(&self, writer: &mut ChunkWriter) {
        let origin = writer.origin();
        for local_z in 0..CHUNK_DIMENSION {
            for local_x in 0..CHUNK_DIMENSION {
                let x = origin.x + local_x;
                let z = origin.z + local_z;
                let height = self.height_at(x, z);
                let lamp = self.has_lamp(x, z);

                for local_y in 0..CHUNK_DIMENSION {
                    let y = origin.y + local_y;
                    let block_type = if y > height + 1 {
                        break;
                    } else if y == height + 1 {
                        if !lamp {
                            break;
                        }
                        BlockType::LAMP
                    } else if y == height {
                        BlockType::GRASS
                    } else if y > height - DIRT_DEPTH - 1 {
                        BlockType::DIRT
                    } else {
                        BlockType::STONE
                    };
                    writer.set_local(local_x, local_y, local_z, self.registry.block(block_type));
                }
            }
        }
    }
}

/// Solid ground up to a fixed height, air above.
pub struct FlatTerrain {
    /// Highest filled `y`; everything at or below it is `ground`.
    pub ground_height: i32,
    pub ground: Block,
}

impl FlatTerrain {
    pub fn new(ground_height: i32, block_type: BlockType, registry: &BlockRegistry) -> Self {
        FlatTerrain {
            ground_height,
            ground: registry.block(block_type),
        }
    }
}

impl TerrainGenerator for FlatTerrain {
    fn generate_data_for_chunk(&self, writer: &mut ChunkWriter) {
        let origin: Point3<i32> = writer.origin();
        if self.ground_height < origin.y || self.ground.is_empty() {
            return;
        }
        // x, then y, then z: a whole layer is pushed before the next one up
        for _local_z in 0..CHUNK_DIMENSION {
            for local_y in 0..CHUNK_DIMENSION {
                let block = if origin.y + local_y <= self.ground_height {
                    self.ground
                } else {
                    Block::AIR
                };
                for _local_x in 0..CHUNK_DIMENSION {
                    writer.push_block(block);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::arena::BlockArena;

    fn registry() -> Arc<BlockRegistry> {
        Arc::new(BlockRegistry::new())
    }

    #[test]
    fn flat_terrain_fills_up_to_ground_height() {
        let mut arena = BlockArena::new(CHUNK_DIMENSION * 2);
        let terrain = FlatTerrain::new(4, BlockType::STONE, &registry());
        terrain.generate_data_for_chunk(&mut ChunkWriter::new(&mut arena, Point3::new(0, 0, 0)));

        assert_eq!(arena.get(Point3::new(0, 4, 0)).block_type(), BlockType::STONE.id());
        assert_eq!(arena.get(Point3::new(31, 0, 31)).block_type(), BlockType::STONE.id());
        assert!(arena.get(Point3::new(0, 5, 0)).is_empty());
        assert_eq!(arena.get(Point3::new(7, 2, 9)).color, registry().block(BlockType::STONE).color);

        // a chunk entirely above the ground stays empty
        terrain.generate_data_for_chunk(&mut ChunkWriter::new(&mut arena, Point3::new(0, 32, 0)));
        assert!(arena.get(Point3::new(0, 32, 0)).is_empty());
    }

    #[test]
    fn perlin_terrain_is_deterministic() {
        let terrain = PerlinTerrain::new(7, registry());
        let origin = Point3::new(-32, 0, 64);

        let mut first = BlockArena::new(CHUNK_DIMENSION);
        terrain.generate_data_for_chunk(&mut ChunkWriter::new(&mut first, origin));
        let mut second = BlockArena::new(CHUNK_DIMENSION);
        PerlinTerrain::new(7, registry()).generate_data_for_chunk(&mut ChunkWriter::new(&mut second, origin));

        assert_eq!(first.chunk_bytes(origin), second.chunk_bytes(origin));
    }

    #[test]
    fn perlin_columns_are_layered() {
        let registry = registry();
        let terrain = PerlinTerrain::new(1, registry.clone());
        let mut arena = BlockArena::new(CHUNK_DIMENSION);
        let origin = Point3::new(0, -16, 0);
        terrain.generate_data_for_chunk(&mut ChunkWriter::new(&mut arena, origin));

        for (x, z) in [(0, 0), (5, 17), (31, 31)] {
            let height = terrain.height_at(x, z);
            if !(-16..16).contains(&height) {
                continue;
            }
            assert_eq!(arena.get(Point3::new(x, height, z)), registry.block(BlockType::GRASS));
            if height - 1 >= -16 {
                assert_eq!(arena.get(Point3::new(x, height - 1, z)).block_type(), BlockType::DIRT.id());
            }
            if height + 2 < 16 {
                assert!(arena.get(Point3::new(x, height + 2, z)).is_empty());
            }
        }
    }
}
