//! Procedural terrain generation.
//!
//! A [`Generator`] is bound to one dimension and is a pure function of its
//! seed: the same chunk coordinate always fills to the same voxels, and the
//! same column always reports the same height and biome.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};
use voxterra_core::constants::CHUNK_SIZE;
use voxterra_core::coords::{ChunkPos, LocalPos};
use voxterra_core::types::{BlockId, BlockPalette, Rgba};
use voxterra_core::{Error, Result};
use voxterra_structure::{StructureKind, StructureRegistry};
use voxterra_voxel::Chunk;

use crate::biome::{classify, Biome, BiomeProfile, Climate, ClimateMode, ClimateSampler, ClimateScales};
use crate::noise::{hash_unit, Fractal, NoiseSampler, NoiseShape};
use crate::placement::{PlacementConfig, PlacementGrid, StructurePlacement};
use crate::WorldSeed;

/// Terrain generator configuration.
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// Water fills open cells up to and including this Y.
    pub sea_level: i32,
    /// Bedrock layer; everything below is void.
    pub floor_y: i32,
    /// Horizontal scale of the detail layer, before the biome multiplier.
    pub terrain_scale: f64,
    /// Horizontal scale of the ridged hill layer at hill frequency 1.
    pub hill_scale: f64,
    /// Octaves of the detail layer.
    pub octaves: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Climate channel scales (larger means larger biomes).
    pub climate: ClimateScales,
    /// Radius of the 8-direction biome blend ring.
    pub blend_radius: f64,
    /// Fraction of differing ring samples above which heights are blended.
    pub blend_threshold: f64,
    /// Depth of the filler layer under the top block.
    pub filler_depth: i32,
    /// Scale of the cave noise.
    pub cave_scale: f64,
    /// Cave carving threshold; values at or above 1 disable caves.
    pub cave_threshold: f64,
    /// Frequency of the sinusoidal depth bias.
    pub cave_depth_frequency: f64,
    /// Amplitude of the sinusoidal depth bias.
    pub cave_depth_bias: f64,
    /// No caves within this many voxels below the surface.
    pub cave_surface_margin: i32,
    /// No caves within this many voxels above the floor.
    pub cave_floor_margin: i32,
    /// Surface height of the flat generator.
    pub flat_height: i32,
    /// Memoized columns before the cache is cleared.
    pub column_cache_capacity: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            sea_level: 40,
            floor_y: 0,
            terrain_scale: 90.0,
            hill_scale: 160.0,
            octaves: 4,
            persistence: 0.5,
            climate: ClimateScales::default(),
            blend_radius: 12.0,
            blend_threshold: 0.1,
            filler_depth: 3,
            cave_scale: 32.0,
            cave_threshold: 0.3,
            cave_depth_frequency: 0.15,
            cave_depth_bias: 0.06,
            cave_surface_margin: 6,
            cave_floor_margin: 4,
            flat_height: 32,
            column_cache_capacity: 1 << 16,
        }
    }
}

impl TerrainConfig {
    /// Set the sea level.
    pub fn with_sea_level(mut self, sea_level: i32) -> Self {
        self.sea_level = sea_level;
        self
    }

    /// Set the bedrock floor.
    pub fn with_floor(mut self, floor_y: i32) -> Self {
        self.floor_y = floor_y;
        self
    }

    /// Set the cave threshold (1.0 or more disables caves).
    pub fn with_cave_threshold(mut self, threshold: f64) -> Self {
        self.cave_threshold = threshold;
        self
    }

    /// Set the flat generator's surface height.
    pub fn with_flat_height(mut self, height: i32) -> Self {
        self.flat_height = height;
        self
    }

    /// Set the biome blend ring radius and threshold.
    pub fn with_blend(mut self, radius: f64, threshold: f64) -> Self {
        self.blend_radius = radius;
        self.blend_threshold = threshold;
        self
    }

    /// Set the column cache capacity.
    pub fn with_column_cache(mut self, capacity: usize) -> Self {
        self.column_cache_capacity = capacity;
        self
    }
}

/// Terrain source bound to a dimension.
pub trait Generator: Send + Sync {
    /// Registry id this generator was created under.
    fn generator_id(&self) -> &str;

    fn seed(&self) -> WorldSeed;

    /// Fill a freshly created chunk with its procedural baseline.
    fn generate_chunk_terrain(&self, chunk: &mut Chunk);

    /// Placement decisions of the grid cells overlapping a chunk's footprint.
    fn structures_for_chunk(&self, pos: ChunkPos) -> Vec<StructurePlacement>;

    /// Placements whose volume may reach into the chunk's column, including
    /// ones decided by cells outside its footprint.
    fn structures_touching_chunk(&self, pos: ChunkPos) -> Vec<StructurePlacement> {
        self.structures_for_chunk(pos)
    }

    /// Ambient sky tint.
    fn sky_color(&self) -> Rgba;

    /// Y of the topmost terrain voxel in a column.
    fn terrain_height(&self, x: i64, z: i64) -> i32;

    /// Biome of a column, for generators that have biomes.
    fn biome_at(&self, _x: i64, _z: i64) -> Option<Biome> {
        None
    }
}

/// Shared inputs every generator is built from.
#[derive(Clone, Debug)]
pub struct GeneratorSettings {
    pub palette: Arc<BlockPalette>,
    pub structures: Arc<StructureRegistry>,
    pub terrain: TerrainConfig,
    pub placement: PlacementConfig,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        let palette = BlockPalette::standard();
        let structures = StructureRegistry::with_builtins(&palette);
        Self {
            palette: Arc::new(palette),
            structures: Arc::new(structures),
            terrain: TerrainConfig::default(),
            placement: PlacementConfig::default(),
        }
    }
}

impl GeneratorSettings {
    pub fn with_terrain(mut self, terrain: TerrainConfig) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_structures(mut self, structures: StructureRegistry) -> Self {
        self.structures = Arc::new(structures);
        self
    }
}

const BLEND_RING: [(f64, f64); 8] = [
    (1.0, 0.0),
    (1.0, 1.0),
    (0.0, 1.0),
    (-1.0, 1.0),
    (-1.0, 0.0),
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
];

/// Climate- and biome-driven terrain with caves and structures.
///
/// Registered as `"overworld"` with the full climate range and as
/// `"grassland"` restricted to temperate land.
pub struct OverworldGenerator {
    id: String,
    seed: WorldSeed,
    config: TerrainConfig,
    palette: Arc<BlockPalette>,
    climate: ClimateSampler,
    detail: NoiseSampler,
    hills: NoiseSampler,
    caves: NoiseSampler,
    cave_detail: NoiseSampler,
    grid: PlacementGrid,
    sky: Rgba,
    columns: RwLock<HashMap<(i64, i64), (i32, Biome)>>,
}

impl OverworldGenerator {
    pub fn new(id: impl Into<String>, seed: WorldSeed, settings: &GeneratorSettings, mode: ClimateMode) -> Self {
        let id = id.into();
        let config = settings.terrain.clone();
        let sky = match mode {
            ClimateMode::Full => Rgba::rgb(135, 185, 235),
            ClimateMode::Temperate => Rgba::rgb(150, 205, 245),
        };
        Self {
            grid: PlacementGrid::new(seed, id.clone(), settings.structures.clone(), settings.placement.clone()),
            climate: ClimateSampler::new(seed, config.climate, mode),
            detail: NoiseSampler::new(seed, 1),
            hills: NoiseSampler::new(seed, 2),
            caves: NoiseSampler::new(seed, 3),
            cave_detail: NoiseSampler::new(seed, 4),
            columns: RwLock::new(HashMap::new()),
            palette: settings.palette.clone(),
            id,
            seed,
            config,
            sky,
        }
    }

    /// The full-climate `"overworld"` preset.
    pub fn overworld(seed: WorldSeed, settings: &GeneratorSettings) -> Self {
        Self::new("overworld", seed, settings, ClimateMode::Full)
    }

    /// The temperate-only `"grassland"` preset.
    pub fn grassland(seed: WorldSeed, settings: &GeneratorSettings) -> Self {
        Self::new("grassland", seed, settings, ClimateMode::Temperate)
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Climate at a column.
    pub fn climate_at(&self, x: i64, z: i64) -> Climate {
        self.climate.climate_at(x as f64, z as f64)
    }

    /// Height a single biome profile produces at a column.
    fn profile_height(&self, x: f64, z: f64, profile: &BiomeProfile, climate: &Climate) -> f64 {
        let cfg = &self.config;
        let detail = self.detail.fractal(
            x,
            z,
            &Fractal::new(cfg.terrain_scale * profile.noise_scale, cfg.octaves, cfg.persistence, NoiseShape::SimplexLike),
        );
        let hills = if profile.hill_frequency > 0.0 {
            self.hills.fractal(
                x,
                z,
                &Fractal::new(cfg.hill_scale / profile.hill_frequency, 3, 0.5, NoiseShape::Ridged),
            )
        } else {
            0.0
        };
        let flatten = 1.0 - profile.erosion_strength * (climate.erosion + 1.0) * 0.5;
        let relief = (detail + hills * 0.6) * profile.height_variation * flatten;
        f64::from(cfg.sea_level) + profile.base_height + relief
    }

    fn compute_column(&self, x: i64, z: i64) -> (i32, Biome) {
        let (fx, fz) = (x as f64, z as f64);
        let climate = self.climate.climate_at(fx, fz);
        let biome = classify(&climate);
        let center = self.profile_height(fx, fz, &biome.profile(), &climate);

        let radius = self.config.blend_radius;
        let mut height = center;
        if radius > 0.0 {
            let ring = BLEND_RING.map(|(dx, dz)| {
                let neighbor = self.climate.biome_at(fx + dx * radius, fz + dz * radius);
                (neighbor, radius * dx.hypot(dz))
            });
            let differing = ring.iter().filter(|(b, _)| *b != biome).count();
            if differing as f64 / BLEND_RING.len() as f64 > self.config.blend_threshold {
                let (mut total, mut weights) = (center, 1.0);
                for (neighbor, distance) in ring {
                    let w = 1.0 / (1.0 + distance / radius);
                    total += w * self.profile_height(fx, fz, &neighbor.profile(), &climate);
                    weights += w;
                }
                height = total / weights;
            }
        }

        let height = (height.floor() as i32).max(self.config.floor_y + 1);
        (height, biome)
    }

    /// Memoized `(height, biome)` of a column.
    pub fn column(&self, x: i64, z: i64) -> (i32, Biome) {
        if let Some(&hit) = self.columns.read().get(&(x, z)) {
            return hit;
        }
        let value = self.compute_column(x, z);
        let mut columns = self.columns.write();
        if columns.len() >= self.config.column_cache_capacity {
            debug!(generator = %self.id, entries = columns.len(), "column cache full, clearing");
            columns.clear();
        }
        columns.insert((x, z), value);
        value
    }

    fn is_cave(&self, x: i64, y: i32, z: i64, height: i32) -> bool {
        let cfg = &self.config;
        if cfg.cave_threshold >= 1.0 || y > height - cfg.cave_surface_margin || y < cfg.floor_y + cfg.cave_floor_margin {
            return false;
        }
        let (fx, fy, fz) = (x as f64, f64::from(y), z as f64);
        let n1 = self.caves.sample3(fx, fy, fz, cfg.cave_scale);
        let n2 = self.cave_detail.sample3(fx, fy, fz, cfg.cave_scale * 0.5);
        let value = n1 * 0.65 + n2 * 0.35 + (fy * cfg.cave_depth_frequency).sin() * cfg.cave_depth_bias;
        value > cfg.cave_threshold
    }

    /// Single-voxel vegetation standing on a land column.
    fn vegetation(&self, x: i64, z: i64, profile: &BiomeProfile) -> BlockId {
        let roll = hash_unit(self.seed, x, z, 0x76_65_67);
        if roll < profile.flower_density {
            BlockId::FLOWER
        } else if roll < profile.flower_density + profile.grass_density {
            BlockId::TALL_GRASS
        } else {
            BlockId::AIR
        }
    }

    fn block_at(&self, x: i64, y: i32, z: i64, height: i32, biome: Biome) -> BlockId {
        let cfg = &self.config;
        let profile = biome.profile();
        if y < cfg.floor_y {
            return BlockId::AIR;
        }
        if y == cfg.floor_y {
            return BlockId::BEDROCK;
        }
        if y <= height {
            if self.is_cave(x, y, z, height) {
                return BlockId::AIR;
            }
            let depth = height - y;
            return if depth == 0 {
                if height < cfg.sea_level {
                    profile.beach_block
                } else {
                    profile.top_block
                }
            } else if depth <= cfg.filler_depth {
                profile.filler_block
            } else {
                profile.stone_block
            };
        }
        if y <= cfg.sea_level {
            return if y == cfg.sea_level && biome.is_frozen() {
                BlockId::ICE
            } else {
                BlockId::WATER
            };
        }
        if y == height + 1 {
            return self.vegetation(x, z, &profile);
        }
        BlockId::AIR
    }

    /// Drop structures that would sit under water, and thin environment
    /// decorations by the biome's tree density.
    fn accepts(&self, placement: &StructurePlacement) -> bool {
        let (x, z) = (placement.origin.x, placement.origin.z);
        let (height, biome) = self.column(x, z);
        if height < self.config.sea_level {
            return false;
        }
        match placement.structure.kind() {
            StructureKind::Architecture => true,
            StructureKind::Environment => {
                let chance = (biome.profile().tree_density * 40.0).clamp(0.05, 1.0);
                hash_unit(self.seed, x, z, 0x74_72_65) < chance
            }
        }
    }
}

impl Generator for OverworldGenerator {
    fn generator_id(&self) -> &str {
        &self.id
    }

    fn seed(&self) -> WorldSeed {
        self.seed
    }

    fn generate_chunk_terrain(&self, chunk: &mut Chunk) {
        let base = chunk.pos().to_world_pos();
        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let (x, z) = (base.x + lx as i64, base.z + lz as i64);
                let (height, biome) = self.column(x, z);
                for ly in 0..CHUNK_SIZE {
                    let y = (base.y + ly as i64) as i32;
                    let block = self.block_at(x, y, z, height, biome);
                    if !block.is_air() {
                        let local = LocalPos::new(lx as u8, ly as u8, lz as u8);
                        chunk.set_generated(local, self.palette.voxel(block));
                    }
                }
            }
        }
    }

    fn structures_for_chunk(&self, pos: ChunkPos) -> Vec<StructurePlacement> {
        let height = |x, z| self.terrain_height(x, z);
        let mut placements = self.grid.for_chunk(pos, &height);
        placements.retain(|p| self.accepts(p));
        placements
    }

    fn structures_touching_chunk(&self, pos: ChunkPos) -> Vec<StructurePlacement> {
        let height = |x, z| self.terrain_height(x, z);
        let mut placements = self.grid.touching_chunk(pos, &height);
        placements.retain(|p| self.accepts(p));
        placements
    }

    fn sky_color(&self) -> Rgba {
        self.sky
    }

    fn terrain_height(&self, x: i64, z: i64) -> i32 {
        self.column(x, z).0
    }

    fn biome_at(&self, x: i64, z: i64) -> Option<Biome> {
        Some(self.column(x, z).1)
    }
}

/// Fixed-height layered terrain without structures.
pub struct FlatGenerator {
    seed: WorldSeed,
    floor_y: i32,
    height: i32,
    palette: Arc<BlockPalette>,
}

impl FlatGenerator {
    pub fn new(seed: WorldSeed, settings: &GeneratorSettings) -> Self {
        Self {
            seed,
            floor_y: settings.terrain.floor_y,
            height: settings.terrain.flat_height,
            palette: settings.palette.clone(),
        }
    }

    fn block_at(&self, y: i32) -> BlockId {
        if y < self.floor_y || y > self.height {
            BlockId::AIR
        } else if y == self.floor_y {
            BlockId::BEDROCK
        } else if y == self.height {
            BlockId::GRASS
        } else if y > self.height - 4 {
            BlockId::DIRT
        } else {
            BlockId::STONE
        }
    }
}

impl Generator for FlatGenerator {
    fn generator_id(&self) -> &str {
        "flat"
    }

    fn seed(&self) -> WorldSeed {
        self.seed
    }

    fn generate_chunk_terrain(&self, chunk: &mut Chunk) {
        let base_y = chunk.pos().to_world_pos().y;
        for ly in 0..CHUNK_SIZE {
            let block = self.block_at((base_y + ly as i64) as i32);
            if block.is_air() {
                continue;
            }
            let voxel = self.palette.voxel(block);
            for lz in 0..CHUNK_SIZE {
                for lx in 0..CHUNK_SIZE {
                    chunk.set_generated(LocalPos::new(lx as u8, ly as u8, lz as u8), voxel);
                }
            }
        }
    }

    fn structures_for_chunk(&self, _pos: ChunkPos) -> Vec<StructurePlacement> {
        Vec::new()
    }

    fn sky_color(&self) -> Rgba {
        Rgba::rgb(170, 190, 215)
    }

    fn terrain_height(&self, _x: i64, _z: i64) -> i32 {
        self.height
    }
}

/// Constructor stored in a [`GeneratorRegistry`].
pub type GeneratorFactory = Box<dyn Fn(WorldSeed, &GeneratorSettings) -> Box<dyn Generator> + Send + Sync>;

/// Maps generator ids to constructors.
pub struct GeneratorRegistry {
    factories: HashMap<String, GeneratorFactory>,
    settings: GeneratorSettings,
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("ids", &self.ids())
            .finish_non_exhaustive()
    }
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            factories: HashMap::new(),
            settings,
        }
    }

    /// A registry with `"overworld"`, `"grassland"` and `"flat"`.
    pub fn with_defaults(settings: GeneratorSettings) -> Self {
        let mut registry = Self::new(settings);
        registry.register("overworld", |seed, s| Box::new(OverworldGenerator::overworld(seed, s)));
        registry.register("grassland", |seed, s| Box::new(OverworldGenerator::grassland(seed, s)));
        registry.register("flat", |seed, s| Box::new(FlatGenerator::new(seed, s)));
        registry
    }

    /// Register (or replace) a constructor.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(WorldSeed, &GeneratorSettings) -> Box<dyn Generator> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.factories.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Build the generator registered under `id`.
    pub fn create(&self, id: &str, seed: WorldSeed) -> Result<Box<dyn Generator>> {
        let Some(factory) = self.factories.get(id) else {
            warn!(generator_id = id, "unknown generator id");
            return Err(Error::UnknownGenerator(id.to_string()));
        };
        debug!(generator_id = id, seed, "creating generator");
        Ok(factory(seed, &self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxterra_core::types::Voxel;

    fn overworld(seed: WorldSeed) -> OverworldGenerator {
        OverworldGenerator::overworld(seed, &GeneratorSettings::default())
    }

    #[test]
    fn heights_and_biomes_are_pure() {
        let a = overworld(12345);
        let b = overworld(12345);
        for x in (-200..200).step_by(13) {
            for z in (-200..200).step_by(17) {
                assert_eq!(a.terrain_height(x, z), a.terrain_height(x, z));
                assert_eq!(a.terrain_height(x, z), b.terrain_height(x, z));
                assert_eq!(a.biome_at(x, z), b.biome_at(x, z));
            }
        }
    }

    #[test]
    fn different_seeds_different_terrain() {
        let a = overworld(12345);
        let b = overworld(54321);
        let differing = (0..100)
            .filter(|&i| a.terrain_height(i * 7, i * 3) != b.terrain_height(i * 7, i * 3))
            .count();
        assert!(differing > 50, "seeds should produce different terrain");
    }

    #[test]
    fn column_cache_never_changes_results() {
        let settings = GeneratorSettings::default().with_terrain(TerrainConfig::default().with_column_cache(4));
        let cached = OverworldGenerator::overworld(9, &settings);
        let fresh = overworld(9);
        for i in 0..40 {
            assert_eq!(cached.column(i, -i), fresh.compute_column(i, -i));
            assert_eq!(cached.column(i, -i), fresh.compute_column(i, -i));
        }
    }

    #[test]
    fn regenerated_chunk_is_identical() {
        let generator = overworld(12345);
        for pos in [ChunkPos::new(0, 2, 0), ChunkPos::new(-3, 1, 7)] {
            let mut first = Chunk::new(pos);
            let mut second = Chunk::new(pos);
            generator.generate_chunk_terrain(&mut first);
            overworld(12345).generate_chunk_terrain(&mut second);
            assert_eq!(first.voxels(), second.voxels());
            assert!(!first.has_modifications());
        }
    }

    #[test]
    fn floor_is_bedrock_and_below_is_void() {
        let generator = overworld(3);
        let bedrock = GeneratorSettings::default().palette.voxel(BlockId::BEDROCK);

        let mut floor = Chunk::new(ChunkPos::new(0, 0, 0));
        generator.generate_chunk_terrain(&mut floor);
        for local in Chunk::local_positions().filter(|p| p.y == 0) {
            assert_eq!(floor.get(local), bedrock);
        }

        let mut void = Chunk::new(ChunkPos::new(0, -1, 0));
        generator.generate_chunk_terrain(&mut void);
        assert!(void.is_empty());
    }

    #[test]
    fn high_chunks_are_empty() {
        let generator = overworld(3);
        let mut sky = Chunk::new(ChunkPos::new(4, 20, -4));
        generator.generate_chunk_terrain(&mut sky);
        assert!(sky.is_empty());
    }

    #[test]
    fn layering_follows_depth_and_sea_level() {
        let generator = overworld(1).with_no_caves();
        // Underwater column: beach block on top, water above up to sea level.
        assert_eq!(generator.block_at(0, 30, 0, 30, Biome::Ocean), BlockId::SAND);
        assert_eq!(generator.block_at(0, 35, 0, 30, Biome::Ocean), BlockId::WATER);
        assert_eq!(generator.block_at(0, 40, 0, 30, Biome::FrozenOcean), BlockId::ICE);
        assert_eq!(generator.block_at(0, 41, 0, 30, Biome::Ocean), BlockId::AIR);
        // Land column: top, filler, stone.
        assert_eq!(generator.block_at(0, 50, 0, 50, Biome::Plains), BlockId::GRASS);
        assert_eq!(generator.block_at(0, 47, 0, 50, Biome::Plains), BlockId::DIRT);
        assert_eq!(generator.block_at(0, 46, 0, 50, Biome::Plains), BlockId::STONE);
        assert!(matches!(
            generator.block_at(5, 51, 9, 50, Biome::Plains),
            BlockId::AIR | BlockId::TALL_GRASS | BlockId::FLOWER
        ));
        assert_eq!(generator.block_at(0, 52, 0, 50, Biome::Plains), BlockId::AIR);
    }

    #[test]
    fn caves_stay_away_from_surface_and_floor() {
        let generator = overworld(8);
        let cfg = generator.config().clone();
        for x in 0..16 {
            for z in 0..16 {
                let height = 60;
                for y in (height - cfg.cave_surface_margin + 1)..=height {
                    assert!(!generator.is_cave(x, y, z, height));
                }
                for y in cfg.floor_y..(cfg.floor_y + cfg.cave_floor_margin) {
                    assert!(!generator.is_cave(x, y, z, height));
                }
            }
        }
    }

    #[test]
    fn grassland_has_no_oceans_or_extremes() {
        let generator = OverworldGenerator::grassland(12345, &GeneratorSettings::default());
        for i in -50..50 {
            let biome = generator.biome_at(i * 97, i * -61).unwrap();
            assert!(!biome.is_aquatic() || matches!(biome, Biome::River), "{biome:?}");
            assert!(!matches!(biome, Biome::Desert | Biome::SnowyPeaks | Biome::Swamp), "{biome:?}");
        }
    }

    #[test]
    fn structures_are_deterministic_and_on_land() {
        let a = overworld(12345);
        let b = overworld(12345);
        for pos in [ChunkPos::new(0, 2, 0), ChunkPos::new(5, 2, -5), ChunkPos::new(-8, 2, 3)] {
            let first = a.structures_touching_chunk(pos);
            assert_eq!(first, b.structures_touching_chunk(pos));
            for p in &first {
                assert!(p.origin.y - 1 >= i64::from(a.config().sea_level));
                assert_eq!(p.origin.y, i64::from(a.terrain_height(p.origin.x, p.origin.z)) + 1);
            }
        }
    }

    #[test]
    fn flat_generator_layers() {
        let settings = GeneratorSettings::default();
        let generator = FlatGenerator::new(7, &settings);
        let mut chunk = Chunk::new(ChunkPos::new(0, 2, 0));
        generator.generate_chunk_terrain(&mut chunk);
        let grass = settings.palette.voxel(BlockId::GRASS);
        // flat_height 32 is local y 0 of chunk y = 2.
        assert_eq!(chunk.get(LocalPos::new(3, 0, 3)), grass);
        assert_eq!(chunk.get(LocalPos::new(3, 1, 3)), Voxel::AIR);
        assert_eq!(generator.terrain_height(1000, -1000), 32);
        assert!(generator.structures_for_chunk(ChunkPos::new(0, 2, 0)).is_empty());
        assert_eq!(generator.biome_at(0, 0), None);
    }

    #[test]
    fn registry_creates_known_and_rejects_unknown() {
        let registry = GeneratorRegistry::with_defaults(GeneratorSettings::default());
        assert_eq!(registry.ids(), vec!["flat", "grassland", "overworld"]);
        for id in registry.ids() {
            let generator = registry.create(&id, 42).unwrap();
            assert_eq!(generator.generator_id(), id);
            assert_eq!(generator.seed(), 42);
        }
        assert_ne!(
            registry.create("overworld", 1).unwrap().sky_color(),
            registry.create("flat", 1).unwrap().sky_color()
        );
        assert!(matches!(registry.create("nether", 1), Err(Error::UnknownGenerator(_))));
    }

    impl OverworldGenerator {
        fn with_no_caves(mut self) -> Self {
            self.config.cave_threshold = 1.0;
            self
        }
    }
}
