//! Configuration loading and dot-notation access.

mod builder;
pub(crate) mod directory;
mod env;
mod error;
mod file;
mod lookup;
mod merge;
mod store;
mod validate;

pub use builder::ConfigBuilder;
pub use directory::DirectoryLoader;
pub use env::EnvOverlay;
pub use error::{LoadError, ValidationError};
pub use file::{load_file, Format, TrustedLoader};
pub use merge::{deep_merge, merge_at_path};
pub use store::Config;
pub use validate::validate;
