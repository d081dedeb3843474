//! Settings and connection selection shared by the commands.

use std::path::Path;

use clap::Args;
use sparqlbook_core::{EndpointConnection, Settings};

/// Ambient endpoint selection for cells without a directive.
#[derive(Args, Debug, Clone, Default)]
pub struct EndpointArgs {
    /// Endpoint URL to use as the active connection
    #[arg(long, conflicts_with = "connection")]
    pub endpoint: Option<String>,

    /// Named connection from the settings file to use as the active connection
    #[arg(long)]
    pub connection: Option<String>,
}

/// Load settings from `--config`, `$SPARQLBOOK_CONFIG` or the per-user file.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = Settings::discover(explicit)?;
    tracing::debug!(
        "Settings: {} connections, active: {:?}",
        settings.connections.len(),
        settings.active_connection
    );
    Ok(settings)
}

/// The connection used for cells that carry no endpoint directive.
///
/// `--endpoint` wins over `--connection`, which wins over `activeConnection`.
pub fn active_connection(
    settings: &Settings,
    args: &EndpointArgs,
) -> anyhow::Result<Option<EndpointConnection>> {
    if let Some(url) = &args.endpoint {
        return Ok(Some(EndpointConnection::anonymous(url.clone())));
    }

    if let Some(name) = &args.connection {
        return match settings.connection(name) {
            Some(connection) => Ok(Some(connection.clone())),
            None => anyhow::bail!("Unknown connection: {}", name),
        };
    }

    if let Some(name) = &settings.active_connection {
        if settings.active_connection().is_none() {
            tracing::warn!("activeConnection '{}' is not a configured connection", name);
        }
    }

    Ok(settings.active_connection().cloned())
}
