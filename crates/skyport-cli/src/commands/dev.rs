use anyhow::Result;
use colored::Colorize;
use skyport::{Config, DevService};
use std::path::Path;

pub fn execute(root: &Path, config: Config) -> Result<()> {
    use crate::dev::server::start_dev_server;

    println!("{}", "Preparing development environment...".green().bold());
    println!();

    let service = DevService::new(root, config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { start_dev_server(service).await })
}
