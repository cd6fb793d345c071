pub mod app_id;
pub mod blocked_app;
pub mod config;
pub mod policy;
pub mod setting;

pub use app_id::AppId;
pub use blocked_app::BlockedApp;
pub use config::{ConfigSnapshot, ConfigSource};
pub use policy::{InterventionKind, PolicyParameters};
pub use setting::Setting;
