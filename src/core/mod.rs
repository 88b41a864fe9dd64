//! Platform-agnostic core module - shared between WASM dashboard and CLI

pub mod buffer;
pub mod command;
pub mod error;
pub mod message;
pub mod profile;
pub mod settings;
pub mod store;

pub use buffer::{BufferObserver, ProbeBuffer, ProbeSample};
pub use command::Command;
pub use error::{Axis, LevelError};
pub use message::{parse_frame, parse_plugin_message, InboundMessage};
pub use profile::{parse_field, FieldKind, FieldValue, FormValue, Profile, ProfileField, ProfileForm};
pub use settings::{plugin_section, LevelSettings, PcbSettings, SettingsPatch};
pub use store::{ProfileStore, DISABLED_PROFILE};
