//! cryptfile server - encrypt and decrypt files with a password
//!
//! Serves the client bundle and the `/crypt` endpoint. The deployment salt and
//! `settings.json` live in the data directory; back up `salt.bin`, files
//! encrypted under it cannot be decrypted without it.

use anyhow::Context;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use cryptfile_core::{default_data_dir, FileSaltStore, PasswordFileCipher, SettingsManager};
use cryptfile_server::{AppState, CryptServer};

/// cryptfile - password-based file encryption over HTTP
#[derive(Parser, Debug)]
#[command(name = "cryptfile-server")]
#[command(version)]
#[command(about = "Serve the cryptfile client and its encrypt/decrypt endpoint")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CRYPTFILE_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "CRYPTFILE_PORT", default_value = "5000")]
    port: u16,

    /// Private data directory (salt and settings)
    #[arg(long, env = "CRYPTFILE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory of the built client bundle
    #[arg(long, env = "CRYPTFILE_STATIC_DIR", default_value = "client/build")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    info!("Using data directory {:?}", data_dir);

    let settings = SettingsManager::new(&data_dir);
    if !settings.is_persisted() {
        settings
            .save()
            .await
            .context("failed to write default settings")?;
        info!("Wrote default settings to {:?}", data_dir);
    }

    let store = FileSaltStore::with_dir(data_dir.clone())
        .with_context(|| format!("failed to prepare data directory {:?}", data_dir))?;
    let cipher = Arc::new(PasswordFileCipher::new(Arc::new(store)));

    let state = AppState::new(cipher, settings.get().limits.clone(), args.static_dir);
    let addr = SocketAddr::new(args.host, args.port);

    CryptServer::new(state, addr).run().await?;

    Ok(())
}
