use std::path::Path;
use std::sync::Arc;

use memo_core::{RemoteLayout, SyncConfig, SyncEngine, WebDavClient};

use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let Some(config) = SyncConfig::from_env()? else {
        return Err(CliError::SyncNotConfigured);
    };

    let db = open_database(db_path)?;
    let remote = WebDavClient::from_config(&config)?;
    let engine = SyncEngine::new(
        Arc::new(db),
        Arc::new(remote),
        RemoteLayout::new(&config.remote_root),
    );

    match engine.synchronize(|progress| println!("{progress}")).await {
        Ok(report) => {
            println!("{report}");
            for key in &report.degraded_shards {
                eprintln!("Warning: shard {key} could not be read and was left untouched");
            }
            Ok(())
        }
        Err(error) if error.is_authentication() => {
            eprintln!(
                "The WebDAV server rejected the credentials. Check MEMO_WEBDAV_USERNAME and MEMO_WEBDAV_PASSWORD."
            );
            Err(error.into())
        }
        Err(error) => Err(error.into()),
    }
}
