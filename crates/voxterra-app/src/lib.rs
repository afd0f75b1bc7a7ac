//! Process-wide context for the Voxterra engine.
//!
//! [`Engine`] owns the world, the chunk streamer, water simulation, the
//! entity store, the geometry backend and the save manager, and advances
//! them together with an explicit [`Engine::update`] call.
//!
//! # Example
//!
//! ```no_run
//! use glam::Vec3;
//! use voxterra_app::{init_logging, Engine, EngineConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging();
//!     let mut engine = Engine::new(EngineConfig::default().with_seed(12345))?;
//!     engine.set_viewer_position(Vec3::new(0.0, 60.0, 0.0));
//!     for _ in 0..100 {
//!         engine.update(1.0 / 30.0);
//!     }
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

mod config;
mod engine;
mod runner;

pub use config::EngineConfig;
pub use engine::{Engine, TickReport};
pub use runner::{init_logging, run_headless, HeadlessSummary};

pub use voxterra_mesh::RecordingBackend;
pub use voxterra_save::SaveStatus;
pub use voxterra_world::{StreamingConfig, Viewer, WaterConfig};
