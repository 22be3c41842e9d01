//! Spot configuration, resolved parameters, and tool families.

pub mod config;
pub mod params;
pub mod tools;

pub use config::{ExtentMode, SpotConfig, UserMaskConfig, Viewport};
pub use params::{GateSettings, Shape, SpotGeometry, SpotParams, UserMaskSettings};
pub use tools::{ChannelPolicy, Tool, ToolKind, ToolSlot};
