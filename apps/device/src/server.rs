use crate::config::DeviceConfig;
use crate::registers::RegisterBank;
use anyhow::{Context, Result};
use modbus_rtu_slave::{Reply, Slave, SlaveError};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

const READ_CHUNK: usize = 256;

/// A fluent builder for the [`Device`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    cfg: DeviceConfig,
    bank: Option<RegisterBank>,
}

impl DeviceBuilder {
    pub fn config(mut self, cfg: DeviceConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub const fn listen(mut self, address: SocketAddr) -> Self {
        self.cfg.transport.listen = address;
        self
    }

    /// Serves an existing bank instead of a fresh one sized from the config.
    pub fn bank(mut self, bank: RegisterBank) -> Self {
        self.bank = Some(bank);
        self
    }

    /// Validates the slave settings and binds the listener.
    ///
    /// # Errors
    /// Returns an error if the slave settings are rejected, the frame gap
    /// cannot be derived, or the listen address cannot be bound.
    pub async fn build(self) -> Result<Device> {
        // Fail on a bad slave configuration before opening the port.
        slave_for(&self.cfg, RegisterBank::default())?;
        let frame_gap = self.cfg.transport.frame_gap().context("Invalid transport timing")?;

        let listener = TcpListener::bind(self.cfg.transport.listen)
            .await
            .with_context(|| format!("Failed to bind {}", self.cfg.transport.listen))?;
        let local_addr = listener.local_addr().context("Listener has no local address")?;

        let bank = self.bank.clone().unwrap_or_else(|| RegisterBank::new(&self.cfg.registers));

        info!(
            address = %local_addr,
            slave = self.cfg.slave.address,
            frame_gap_us = frame_gap.as_micros(),
            "Device initialized"
        );

        Ok(Device {
            connections: Arc::new(Semaphore::new(self.cfg.transport.max_connections)),
            cfg: self.cfg,
            bank,
            listener,
            local_addr,
            frame_gap,
        })
    }
}

fn slave_for(cfg: &DeviceConfig, bank: RegisterBank) -> Result<Slave<RegisterBank>, SlaveError> {
    Slave::builder()
        .address(cfg.slave.address)
        .rx_capacity(cfg.slave.rx_capacity)
        .tx_capacity(cfg.slave.tx_capacity)
        .stats_base(cfg.slave.stats_base)
        .handler(bank)
        .build()
}

/// A bound device ready to serve.
///
/// Every TCP connection gets its own [`Slave`] (own buffers and statistics)
/// over the shared [`RegisterBank`].
#[must_use = "call .run().await to start serving"]
#[derive(Debug)]
pub struct Device {
    cfg: DeviceConfig,
    bank: RegisterBank,
    listener: TcpListener,
    local_addr: SocketAddr,
    frame_gap: Duration,
    connections: Arc<Semaphore>,
}

impl Device {
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the served data, for updates from the device side.
    #[must_use]
    pub fn bank(&self) -> RegisterBank {
        self.bank.clone()
    }

    /// Serves until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    /// Returns an error if the signal handlers cannot be installed or the
    /// listener fails.
    pub async fn run(self) -> Result<()> {
        let (signal_tx, mut signal_rx) = watch::channel(false);
        tokio::spawn(async move {
            match shutdown_signal().await {
                Ok(()) => info!("Shutdown signal received, closing connections..."),
                Err(e) => error!("Error while waiting for shutdown signal: {e}"),
            }
            let _ = signal_tx.send(true);
        });

        self.run_until(async move {
            let _ = signal_rx.wait_for(|stop| *stop).await;
        })
        .await
    }

    /// Serves until `shutdown` completes, then closes open connections.
    ///
    /// A frame still being received is dropped; a response already being
    /// written is finished first.
    ///
    /// # Errors
    /// Returns an error if accepting connections fails.
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send) -> Result<()> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        info!(address = %self.local_addr, "Serving Modbus RTU over TCP");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.context("Failed to accept connection")?;

                    let Ok(permit) = Arc::clone(&self.connections).try_acquire_owned() else {
                        warn!(%peer, "Connection limit reached, refusing");
                        continue;
                    };

                    let slave = slave_for(&self.cfg, self.bank.clone())
                        .context("Slave configuration changed after validation")?;
                    let frame_gap = self.frame_gap;
                    let stop = stop_rx.clone();

                    tasks.spawn(async move {
                        debug!(%peer, "Connection opened");
                        if let Err(e) = serve_connection(stream, slave, frame_gap, stop).await {
                            warn!(%peer, error = %e, "Connection failed");
                        }
                        debug!(%peer, "Connection closed");
                        drop(permit);
                    });
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("Connection task panicked: {e}");
                    }
                },
            }
        }

        let _ = stop_tx.send(true);
        while tasks.join_next().await.is_some() {}

        info!("Device shutdown complete");
        Ok(())
    }
}

/// Runs the RTU state machine over one stream.
///
/// A frame is everything received until the line stays silent for
/// `frame_gap`.
async fn serve_connection(
    mut stream: TcpStream,
    mut slave: Slave<RegisterBank>,
    frame_gap: Duration,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let read = tokio::select! {
            read = stream.read(&mut buf) => read.context("Read failed")?,
            _ = stop.wait_for(|stop| *stop) => return Ok(()),
        };
        if read == 0 {
            return Ok(());
        }
        feed(&mut slave, &buf[..read]);

        loop {
            let read = tokio::select! {
                read = timeout(frame_gap, stream.read(&mut buf)) => read,
                _ = stop.wait_for(|stop| *stop) => {
                    slave.discard_frame();
                    return Ok(());
                },
            };
            match read {
                Err(_silence) => break,
                Ok(read) => match read.context("Read failed")? {
                    0 => {
                        slave.discard_frame();
                        return Ok(());
                    },
                    n => feed(&mut slave, &buf[..n]),
                },
            }
        }

        match slave.process() {
            Ok(Reply::Silent) => trace!("Broadcast handled"),
            Ok(reply) => {
                let response = slave.take_response();
                trace!(?reply, len = response.len(), "Sending response");
                stream.write_all(&response).await.context("Write failed")?;
            },
            Err(e) if e.is_critical() => warn!(error = %e, "Frame rejected"),
            Err(e) => debug!(error = %e, "Frame ignored"),
        }
    }
}

fn feed(slave: &mut Slave<RegisterBank>, bytes: &[u8]) {
    if let Err(e) = slave.input(bytes) {
        warn!(error = %e, "Receive buffer overflow, frame discarded");
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
