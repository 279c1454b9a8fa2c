use std::{fmt::Debug, fs, path::Path};

use anyhow::{Context, Result};
use bolt_bridge_params::prelude::ProtocolParams;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

/// Reads and parses a TOML file.
pub(crate) fn parse_toml<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: Debug + DeserializeOwned,
{
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    trace!(?raw, "read file");

    let parsed = toml::from_str::<T>(&raw)
        .with_context(|| format!("failed to parse TOML file {}", path.display()))?;
    debug!(?parsed, "parsed TOML file");

    Ok(parsed)
}

/// Loads the protocol parameters from `path`, or the defaults if no path is given.
pub(crate) fn load_params(path: Option<&Path>) -> Result<ProtocolParams> {
    let params = match path {
        Some(path) => parse_toml::<ProtocolParams>(path)?,
        None => ProtocolParams::default(),
    };
    params.validate()?;

    Ok(params)
}
