use std::process::ExitCode;

use certmgr_export::{export, Config, OwnedFile};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_init();

    let config = Config::parse();
    let owner = OwnedFile::new(&config.for_user);

    match export(&config, &owner, Local::now().naive_local()) {
        Ok(count) => {
            tracing::info!("Done! exported {count} certificates");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certmgr_export=info".into()),
        )
        .init();
}
