use anyhow::Result;
use bolt_bridge_params::prelude::ProtocolParams;

/// Handles the default-params command.
pub(crate) fn handle_default_params() -> Result<()> {
    let params = toml::to_string_pretty(&ProtocolParams::default())?;
    println!("{params}");

    Ok(())
}
