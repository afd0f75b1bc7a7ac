//! Climate sampling and biome classification.
//!
//! Four climate channels (temperature, humidity, continentalness, erosion)
//! are sampled from independently seeded noise at their own spatial scale.
//! A fixed decision tree maps them to a [`Biome`]: continentalness gates
//! ocean and shore first, then erosion gates river, mountain and hills, and
//! finally temperature x humidity picks the land biome.

use voxterra_core::types::BlockId;

use crate::noise::{Fractal, NoiseSampler, NoiseShape};
use crate::WorldSeed;

/// Biome tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Biome {
    DeepOcean,
    Ocean,
    FrozenOcean,
    Beach,
    StonyShore,
    River,
    FrozenRiver,
    Mountains,
    SnowyPeaks,
    Hills,
    WoodedHills,
    Plains,
    SunflowerPlains,
    Meadow,
    Forest,
    BirchForest,
    DarkForest,
    Taiga,
    SnowyTundra,
    IceSpikes,
    Desert,
    Savanna,
    Badlands,
    Swamp,
    MangroveSwamp,
    Jungle,
    MushroomFields,
}

/// Terrain and surface parameters of a biome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeProfile {
    /// Height offset from sea level, in voxels.
    pub base_height: f64,
    /// Amplitude of the detail noise, in voxels.
    pub height_variation: f64,
    /// Frequency multiplier for the hill layer (0 disables it).
    pub hill_frequency: f64,
    /// How strongly high erosion flattens the terrain, `0..=1`.
    pub erosion_strength: f64,
    /// Multiplier on the base noise scale.
    pub noise_scale: f64,
    pub top_block: BlockId,
    pub filler_block: BlockId,
    pub stone_block: BlockId,
    /// Surface block under water and along shores.
    pub beach_block: BlockId,
    pub tree_density: f64,
    pub grass_density: f64,
    pub flower_density: f64,
}

impl BiomeProfile {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        base_height: f64,
        height_variation: f64,
        hill_frequency: f64,
        erosion_strength: f64,
        noise_scale: f64,
        top_block: BlockId,
        filler_block: BlockId,
        beach_block: BlockId,
        densities: [f64; 3],
    ) -> Self {
        Self {
            base_height,
            height_variation,
            hill_frequency,
            erosion_strength,
            noise_scale,
            top_block,
            filler_block,
            stone_block: BlockId::STONE,
            beach_block,
            tree_density: densities[0],
            grass_density: densities[1],
            flower_density: densities[2],
        }
    }
}

impl Biome {
    /// Every biome.
    pub const ALL: [Biome; 27] = [
        Biome::DeepOcean,
        Biome::Ocean,
        Biome::FrozenOcean,
        Biome::Beach,
        Biome::StonyShore,
        Biome::River,
        Biome::FrozenRiver,
        Biome::Mountains,
        Biome::SnowyPeaks,
        Biome::Hills,
        Biome::WoodedHills,
        Biome::Plains,
        Biome::SunflowerPlains,
        Biome::Meadow,
        Biome::Forest,
        Biome::BirchForest,
        Biome::DarkForest,
        Biome::Taiga,
        Biome::SnowyTundra,
        Biome::IceSpikes,
        Biome::Desert,
        Biome::Savanna,
        Biome::Badlands,
        Biome::Swamp,
        Biome::MangroveSwamp,
        Biome::Jungle,
        Biome::MushroomFields,
    ];

    /// Whether the surface freezes over at sea level.
    pub const fn is_frozen(self) -> bool {
        matches!(
            self,
            Biome::FrozenOcean | Biome::FrozenRiver | Biome::SnowyTundra | Biome::IceSpikes | Biome::SnowyPeaks
        )
    }

    /// Whether the biome sits below sea level.
    pub const fn is_aquatic(self) -> bool {
        matches!(
            self,
            Biome::DeepOcean | Biome::Ocean | Biome::FrozenOcean | Biome::River | Biome::FrozenRiver
        )
    }

    /// Terrain profile.
    pub const fn profile(self) -> BiomeProfile {
        use BlockId as B;
        match self {
            Biome::DeepOcean => BiomeProfile::new(-22.0, 6.0, 0.0, 0.0, 1.5, B::GRAVEL, B::GRAVEL, B::GRAVEL, [0.0; 3]),
            Biome::Ocean => BiomeProfile::new(-12.0, 5.0, 0.0, 0.0, 1.2, B::SAND, B::SAND, B::SAND, [0.0; 3]),
            Biome::FrozenOcean => BiomeProfile::new(-12.0, 5.0, 0.0, 0.0, 1.2, B::GRAVEL, B::GRAVEL, B::GRAVEL, [0.0; 3]),
            Biome::Beach => BiomeProfile::new(1.0, 1.5, 0.0, 0.5, 1.0, B::SAND, B::SAND, B::SAND, [0.0, 0.02, 0.0]),
            Biome::StonyShore => BiomeProfile::new(2.0, 3.0, 0.5, 0.2, 0.8, B::STONE, B::STONE, B::GRAVEL, [0.0; 3]),
            Biome::River => BiomeProfile::new(-5.0, 1.5, 0.0, 0.8, 1.0, B::SAND, B::DIRT, B::CLAY, [0.0; 3]),
            Biome::FrozenRiver => BiomeProfile::new(-5.0, 1.5, 0.0, 0.8, 1.0, B::GRAVEL, B::DIRT, B::GRAVEL, [0.0; 3]),
            Biome::Mountains => BiomeProfile::new(30.0, 26.0, 1.5, 0.1, 1.4, B::STONE, B::STONE, B::GRAVEL, [0.005, 0.02, 0.0]),
            Biome::SnowyPeaks => BiomeProfile::new(36.0, 28.0, 1.5, 0.1, 1.4, B::SNOW, B::STONE, B::GRAVEL, [0.0; 3]),
            Biome::Hills => BiomeProfile::new(10.0, 12.0, 1.0, 0.3, 1.0, B::GRASS, B::DIRT, B::SAND, [0.01, 0.15, 0.02]),
            Biome::WoodedHills => BiomeProfile::new(11.0, 12.0, 1.0, 0.3, 1.0, B::GRASS, B::DIRT, B::SAND, [0.05, 0.2, 0.02]),
            Biome::Plains => BiomeProfile::new(3.0, 3.0, 0.3, 0.6, 1.0, B::GRASS, B::DIRT, B::SAND, [0.004, 0.3, 0.03]),
            Biome::SunflowerPlains => BiomeProfile::new(3.0, 3.0, 0.3, 0.6, 1.0, B::GRASS, B::DIRT, B::SAND, [0.004, 0.25, 0.12]),
            Biome::Meadow => BiomeProfile::new(6.0, 4.0, 0.5, 0.5, 1.0, B::GRASS, B::DIRT, B::SAND, [0.002, 0.4, 0.08]),
            Biome::Forest => BiomeProfile::new(5.0, 5.0, 0.5, 0.4, 1.0, B::GRASS, B::DIRT, B::SAND, [0.06, 0.2, 0.02]),
            Biome::BirchForest => BiomeProfile::new(5.0, 5.0, 0.5, 0.4, 1.0, B::GRASS, B::DIRT, B::SAND, [0.05, 0.2, 0.03]),
            Biome::DarkForest => BiomeProfile::new(5.0, 4.0, 0.5, 0.4, 1.0, B::PODZOL, B::DIRT, B::SAND, [0.1, 0.1, 0.0]),
            Biome::Taiga => BiomeProfile::new(6.0, 6.0, 0.6, 0.4, 1.0, B::PODZOL, B::DIRT, B::GRAVEL, [0.05, 0.1, 0.0]),
            Biome::SnowyTundra => BiomeProfile::new(3.0, 2.5, 0.3, 0.6, 1.0, B::SNOW, B::DIRT, B::GRAVEL, [0.002, 0.0, 0.0]),
            Biome::IceSpikes => BiomeProfile::new(3.0, 4.0, 0.3, 0.4, 0.8, B::ICE, B::SNOW, B::GRAVEL, [0.0; 3]),
            Biome::Desert => BiomeProfile::new(3.0, 4.0, 0.4, 0.5, 1.2, B::SAND, B::SAND, B::SAND, [0.002, 0.0, 0.0]),
            Biome::Savanna => BiomeProfile::new(4.0, 3.0, 0.4, 0.6, 1.2, B::GRASS, B::DIRT, B::SAND, [0.01, 0.35, 0.0]),
            Biome::Badlands => BiomeProfile::new(12.0, 10.0, 1.0, 0.2, 0.9, B::RED_SAND, B::TERRACOTTA, B::RED_SAND, [0.0; 3]),
            Biome::Swamp => BiomeProfile::new(0.0, 1.5, 0.0, 0.8, 1.0, B::MUD, B::DIRT, B::CLAY, [0.03, 0.2, 0.01]),
            Biome::MangroveSwamp => BiomeProfile::new(-0.5, 1.5, 0.0, 0.8, 1.0, B::MUD, B::MUD, B::MUD, [0.05, 0.1, 0.0]),
            Biome::Jungle => BiomeProfile::new(6.0, 7.0, 0.8, 0.3, 1.0, B::GRASS, B::DIRT, B::SAND, [0.12, 0.4, 0.04]),
            Biome::MushroomFields => BiomeProfile::new(4.0, 3.0, 0.3, 0.5, 1.0, B::MYCELIUM, B::DIRT, B::MYCELIUM, [0.0, 0.0, 0.05]),
        }
    }
}

/// Climate parameters at a column, each in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Climate {
    pub temperature: f64,
    pub humidity: f64,
    pub continentalness: f64,
    pub erosion: f64,
}

/// Map climate parameters to a biome.
pub fn classify(c: &Climate) -> Biome {
    let cold = c.temperature < -0.45;

    if c.continentalness < -0.45 {
        return if cold { Biome::FrozenOcean } else { Biome::DeepOcean };
    }
    if c.continentalness < -0.2 {
        return if cold { Biome::FrozenOcean } else { Biome::Ocean };
    }
    if c.continentalness < -0.1 {
        return if c.erosion < -0.4 { Biome::StonyShore } else { Biome::Beach };
    }
    if c.continentalness > 0.9 && c.humidity > 0.6 {
        return Biome::MushroomFields;
    }

    if c.erosion > 0.8 {
        return if cold { Biome::FrozenRiver } else { Biome::River };
    }
    if c.erosion < -0.6 {
        return if c.temperature < -0.2 { Biome::SnowyPeaks } else { Biome::Mountains };
    }
    if c.erosion < -0.3 {
        return if c.humidity > 0.1 { Biome::WoodedHills } else { Biome::Hills };
    }

    let h = c.humidity;
    if cold {
        if h < -0.5 {
            Biome::IceSpikes
        } else if h < 0.1 {
            Biome::SnowyTundra
        } else {
            Biome::Taiga
        }
    } else if c.temperature < 0.0 {
        if h < -0.3 {
            Biome::Meadow
        } else if h < 0.2 {
            Biome::BirchForest
        } else if h < 0.5 {
            Biome::Forest
        } else {
            Biome::DarkForest
        }
    } else if c.temperature < 0.4 {
        if h < -0.4 {
            Biome::Plains
        } else if h < -0.1 {
            Biome::SunflowerPlains
        } else if h < 0.3 {
            Biome::Forest
        } else if h < 0.6 {
            Biome::DarkForest
        } else {
            Biome::Swamp
        }
    } else if c.temperature < 0.7 {
        if h < -0.3 {
            Biome::Savanna
        } else if h < 0.2 {
            Biome::Plains
        } else if h < 0.5 {
            Biome::Jungle
        } else {
            Biome::MangroveSwamp
        }
    } else if h < -0.2 {
        Biome::Desert
    } else if h < 0.2 {
        Biome::Badlands
    } else {
        Biome::Jungle
    }
}

/// Which part of the climate space a generator uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClimateMode {
    /// Unrestricted.
    #[default]
    Full,
    /// Temperate land only: no oceans, no extreme temperatures or swamps.
    Temperate,
}

/// Spatial scales of the climate channels, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateScales {
    pub temperature: f64,
    pub humidity: f64,
    pub continentalness: f64,
    pub erosion: f64,
}

impl Default for ClimateScales {
    fn default() -> Self {
        Self {
            temperature: 900.0,
            humidity: 700.0,
            continentalness: 1200.0,
            erosion: 500.0,
        }
    }
}

/// Samples [`Climate`] from seeded noise.
#[derive(Clone, Debug)]
pub struct ClimateSampler {
    temperature: NoiseSampler,
    humidity: NoiseSampler,
    continentalness: NoiseSampler,
    erosion: NoiseSampler,
    scales: ClimateScales,
    mode: ClimateMode,
}

impl ClimateSampler {
    pub fn new(seed: WorldSeed, scales: ClimateScales, mode: ClimateMode) -> Self {
        Self {
            temperature: NoiseSampler::new(seed, 101),
            humidity: NoiseSampler::new(seed, 102),
            continentalness: NoiseSampler::new(seed, 103),
            erosion: NoiseSampler::new(seed, 104),
            scales,
            mode,
        }
    }

    /// Climate at a world column.
    pub fn climate_at(&self, x: f64, z: f64) -> Climate {
        // Climate channels are smooth: few octaves, simplex-like blend.
        let channel = |s: &NoiseSampler, scale: f64| {
            // Stretch toward [-1, 1]; fractal sums rarely reach the extremes.
            (s.fractal(x, z, &Fractal::new(scale, 3, 0.5, NoiseShape::SimplexLike)) * 2.0).clamp(-1.0, 1.0)
        };
        let raw = Climate {
            temperature: channel(&self.temperature, self.scales.temperature),
            humidity: channel(&self.humidity, self.scales.humidity),
            continentalness: channel(&self.continentalness, self.scales.continentalness),
            erosion: channel(&self.erosion, self.scales.erosion),
        };
        match self.mode {
            ClimateMode::Full => raw,
            ClimateMode::Temperate => Climate {
                temperature: raw.temperature * 0.19 + 0.2,
                humidity: raw.humidity.min(0.55),
                continentalness: raw.continentalness.abs() * 0.8 + 0.2,
                erosion: raw.erosion,
            },
        }
    }

    /// Biome at a world column.
    pub fn biome_at(&self, x: f64, z: f64) -> Biome {
        classify(&self.climate_at(x, z))
    }
}
