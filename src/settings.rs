use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, RowbindError};

/// File looked up, without extension, in the working directory by [`MapperSettings::load`].
pub const SETTINGS_FILE: &str = "rowbind";
pub const ENV_PREFIX: &str = "ROWBIND";

/// Tunables of a [`Mapper`](crate::populate::Mapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MapperSettings {
    /// Upper bound on the threads populating rows of one table.
    pub max_workers: usize,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self { max_workers: 2 }
    }
}

impl MapperSettings {
    /// Defaults, overridden by an optional `rowbind.toml` (or any format the
    /// `config` crate knows), overridden by `ROWBIND_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::build(File::with_name(SETTINGS_FILE).required(false))
    }

    /// Like [`load`](Self::load) but reads the given file, which must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: MapperSettings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        debug!(max_workers = settings.max_workers, "loaded mapper settings");
        Ok(settings)
    }

    pub fn with_max_workers(max_workers: usize) -> Result<Self> {
        let settings = Self { max_workers };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(RowbindError::Config("max_workers must be at least 1".into()));
        }
        Ok(())
    }
}
