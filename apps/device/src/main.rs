use anyhow::Context;
use clap::Parser;
use mbrs_device::Device;
use mbrs_device::config::load_config;
use mbrs_logger::Logger;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mbrs-device", version, about = "Modbus RTU slave device over TCP")]
struct Args {
    /// Configuration file; defaults to an optional `device.*` in the working directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `transport.listen`
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Overrides `slave.address`
    #[arg(short, long)]
    address: Option<u8>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg =
        load_config(args.config.as_deref()).context("Critical: Configuration is malformed")?;
    if let Some(listen) = args.listen {
        cfg.transport.listen = listen;
    }
    if let Some(address) = args.address {
        cfg.slave.address = address;
    }

    let _log = Logger::from_settings(env!("CARGO_PKG_NAME"), &cfg.log)?;

    Device::builder().config(cfg).build().await?.run().await
}
