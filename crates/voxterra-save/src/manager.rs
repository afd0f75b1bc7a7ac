//! Named saves in a directory.

use std::fs;
use std::path::PathBuf;

use tracing::{error, info};
use voxterra_world::World;

use crate::data::WorldSaveData;
use crate::format::{decode, encode, Compression, SaveEncoding};
use crate::{Result, SaveError};

/// File extension of save files.
pub const SAVE_EXTENSION: &str = "vxsave";

/// Where and how saves are written.
#[derive(Debug, Clone)]
pub struct SaveConfig {
    pub directory: PathBuf,
    pub encoding: SaveEncoding,
    pub compression: Compression,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("saves"),
            encoding: SaveEncoding::Json,
            compression: Compression::Lz4,
        }
    }
}

impl SaveConfig {
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_encoding(mut self, encoding: SaveEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Outcome of a save or load at the operation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStatus {
    pub success: bool,
    pub message: String,
}

impl SaveStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Reads and writes named saves.
#[derive(Debug, Clone, Default)]
pub struct SaveManager {
    config: SaveConfig,
}

impl SaveManager {
    pub fn new(config: SaveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Path of the file backing `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '));
        if !valid {
            return Err(SaveError::InvalidName(name.to_string()));
        }
        Ok(self.config.directory.join(format!("{name}.{SAVE_EXTENSION}")))
    }

    /// Write a document under `name`, replacing any previous save.
    pub fn write(&self, name: &str, data: &WorldSaveData) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        let bytes = encode(data, self.config.encoding, self.config.compression)?;
        fs::create_dir_all(&self.config.directory)?;
        // Written beside the target, then renamed over it.
        let tmp = path.with_extension(format!("{SAVE_EXTENSION}.tmp"));
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Read the document saved under `name`.
    pub fn read(&self, name: &str) -> Result<WorldSaveData> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        decode(&fs::read(&path)?)
    }

    /// Capture and write `world`; failures are logged and reported.
    pub fn save(&self, name: &str, world: &World) -> SaveStatus {
        let data = WorldSaveData::capture(world);
        let chunks = data.chunk_count();
        match self.write(name, &data) {
            Ok(path) => {
                info!(name, chunks, path = %path.display(), "world saved");
                SaveStatus::ok(format!("saved {chunks} modified chunks to {}", path.display()))
            }
            Err(e) => {
                error!(name, error = %e, "save failed");
                SaveStatus::failed(format!("save '{name}' failed: {e}"))
            }
        }
    }

    /// Read `name` and restore it into `world`; failures are logged and
    /// reported, leaving `world` to the caller to reinitialize.
    pub fn load(&self, name: &str, world: &mut World) -> SaveStatus {
        let result = self.read(name).and_then(|data| data.restore_into(world));
        match result {
            Ok(chunks) => {
                info!(name, chunks, "world loaded");
                SaveStatus::ok(format!("loaded {chunks} modified chunks"))
            }
            Err(e) => {
                error!(name, error = %e, "load failed");
                SaveStatus::failed(format!("load '{name}' failed: {e}"))
            }
        }
    }

    /// Names of existing saves, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.config.directory.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Delete the save `name`.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(SaveError::NotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Whether a save named `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxterra_core::coords::{ChunkPos, WorldPos};
    use voxterra_core::types::{Rgba, Voxel};
    use voxterra_world::{GeneratorRegistry, GeneratorSettings};

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        std::env::temp_dir().join(format!("voxterra-save-{tag}-{}-{nanos}", std::process::id()))
    }

    fn world() -> World {
        World::new(12345, GeneratorRegistry::with_defaults(GeneratorSettings::default()))
    }

    #[test]
    fn save_list_load_delete() {
        let dir = temp_dir("cycle");
        let manager = SaveManager::new(SaveConfig::default().with_directory(dir.clone()));
        let mut w = world();
        let dim = w.create_dimension("main", "flat").unwrap();
        dim.get_or_create_chunk(ChunkPos::new(0, 2, 0));
        dim.set_voxel(WorldPos::new(1, 35, 1), Voxel::solid(Rgba::RED));

        assert!(manager.save("alpha", &w).success);
        assert!(manager.save("beta", &w).success);
        assert_eq!(manager.list().unwrap(), vec!["alpha", "beta"]);

        let mut loaded = World::new(0, GeneratorRegistry::with_defaults(GeneratorSettings::default()));
        let status = manager.load("alpha", &mut loaded);
        assert!(status.success, "{}", status.message);
        assert_eq!(
            loaded.active_dimension().unwrap().get_voxel(WorldPos::new(1, 35, 1)),
            Voxel::solid(Rgba::RED)
        );

        manager.delete("alpha").unwrap();
        assert!(!manager.exists("alpha"));
        assert_eq!(manager.list().unwrap(), vec!["beta"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let dir = temp_dir("missing");
        let manager = SaveManager::new(SaveConfig::default().with_directory(dir.clone()));
        let mut w = world();
        let status = manager.load("nothing", &mut w);
        assert!(!status.success);
        assert!(status.message.contains("nothing"));
        assert!(!manager.save("../escape", &w).success);
        assert!(manager.list().unwrap().is_empty());
    }
}
