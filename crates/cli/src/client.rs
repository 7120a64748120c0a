// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket client for talking to pxd.

use anyhow::{anyhow, Context, Result};
use px_daemon::wire::{read_message, write_message};
use px_daemon::{Config, Request, Response};
use tokio::net::UnixStream;

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connect to the daemon socket resolved from the configuration.
    pub async fn connect() -> Result<Self> {
        let config = Config::load().map_err(|e| anyhow!("{e}"))?;
        let stream = UnixStream::connect(&config.socket_path)
            .await
            .with_context(|| {
                format!(
                    "cannot reach pxd at {} (start it with `px daemon start`)",
                    config.socket_path.display()
                )
            })?;
        Ok(Self { stream })
    }

    /// Send one request and await its response.
    pub async fn request(&mut self, request: Request) -> Result<Response> {
        write_message(&mut self.stream, &request).await?;
        read_message(&mut self.stream)
            .await?
            .ok_or_else(|| anyhow!("daemon closed the connection"))
    }
}
