pub mod app;
pub mod clipboard;
pub mod config;
pub mod effects;
#[cfg(test)]
mod fake_gateway;
pub mod logging;
pub mod render;

use std::sync::Arc;

use anyhow::Context;
use crawlx_gateway::{AtomicFileWriter, ReqwestGateway};
use crawlx_logging::crawlx_info;

use crate::Cli;

/// Builds the runtime and the gateway, then drives one subcommand to completion.
pub fn run_console(cli: Cli) -> anyhow::Result<()> {
    let config = config::ConsoleConfig::resolve(cli.api_url, cli.output_dir);
    crawlx_info!(
        "crawlx console starting: api={} output_dir={}",
        config.gateway.base_url,
        config.output_dir.display()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let gateway = ReqwestGateway::new(config.gateway.clone())
            .map_err(|err| anyhow::anyhow!(err.user_message()))?;
        let writer = AtomicFileWriter::new(config.output_dir.clone());
        let app = app::ConsoleApp::new(
            Arc::new(gateway),
            writer,
            Arc::new(clipboard::Osc52Clipboard),
        );
        app.run(cli.command).await
    })
}
