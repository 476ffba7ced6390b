use layercfg::{env, Config, ConfigCache, Environment};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct AppConfig {
    app: AppSection,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    name: String,
    url: String,
    debug: bool,
}

fn main() -> Result<(), layercfg::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let environment = Environment::from_env();
    let cache = ConfigCache::in_working_dir(environment.clone())?;
    let config = Config::builder()
        .directory("demos/config")
        .environment(environment.clone())
        .disk_cache(cache.dir())
        .with_env("DEMO", "__")
        .build()?;

    println!("environment: {environment}");
    println!("cache record: {}", cache.record_path().display());
    println!("app.url: {}", config.get_or("app.url", "unset"));
    println!("database.mysql.host: {}", config.get_or("database.mysql.host", "unset"));
    println!("password present: {}", config.has("database.mysql.password"));
    println!("DEMO_VERBOSE: {}", env("DEMO_VERBOSE", false));

    let typed: AppConfig = config.deserialize()?;
    println!("{} (debug={}) at {}", typed.app.name, typed.app.debug, typed.app.url);

    Ok(())
}
