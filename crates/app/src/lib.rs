//! Read-aloud application: playback coordinator, per-context routers,
//! capability resolution, settings, and runtime wiring.

pub mod capability;
pub mod contexts;
pub mod coordinator;
pub mod error;
pub mod runtime;
pub mod settings;

pub use capability::{resolve_playback_target, HostCapabilities, PlaybackTarget};
pub use coordinator::{ContentInjector, NoopInjector, PlaybackCoordinator};
pub use error::CoordinatorError;
pub use runtime::{AppHandle, RuntimeOptions};
pub use settings::{SettingsError, SettingsStore};
