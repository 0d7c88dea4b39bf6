//! texcrunch - batch texture cruncher
//!
//! Pads textures to dimensions that are multiples of 4 with bilinear
//! resampling, then switches them to crunched compression. Jobs run a few
//! assets per tick against a [`host::TextureHost`] so the caller stays
//! responsive.

pub mod config;
pub mod host;
pub mod job;
pub mod notifier;
pub mod paths;
pub mod session;
pub mod settings;
pub mod textures;

pub use config::{AssetScope, ConfigError, JobConfig, MaxTextureSize};
pub use job::{JobController, JobStatus, Progress, StartError, StepResult};
pub use session::CrunchSession;
