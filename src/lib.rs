pub mod cache;
pub mod config;
pub mod env;
mod error;
pub mod factory;
pub mod value;

pub use cache::{CacheError, ConfigCache, FileCache};
pub use config::{Config, ConfigBuilder, LoadError, ValidationError};
pub use env::{env, env_exists, load_dotenv, Environment};
pub use error::Error;
pub use factory::{ConfigFactory, ConfigRegistry};
pub use value::{Table, Value};
