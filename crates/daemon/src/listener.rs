// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Accepts connections and spawns one task per connection; each request
//! runs one pipeline execution. A `Shutdown` request wakes the main loop
//! through the shared notify handle.

use std::sync::Arc;
use std::time::Instant;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::lifecycle::DaemonEngine;
use crate::protocol::{Request, Response, StatusInfo, PROTOCOL_VERSION};
use crate::wire::{read_message, write_message};

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    engine: Arc<DaemonEngine>,
    shutdown: Arc<Notify>,
    start_time: Instant,
}

impl Listener {
    pub fn new(socket: UnixListener, engine: Arc<DaemonEngine>, shutdown: Arc<Notify>) -> Self {
        Self {
            socket,
            engine,
            shutdown,
            start_time: Instant::now(),
        }
    }

    /// Run the accept loop until the socket errors out.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let engine = Arc::clone(&self.engine);
                    let shutdown = Arc::clone(&self.shutdown);
                    let start_time = self.start_time;
                    tokio::spawn(async move {
                        handle_connection(stream, engine, shutdown, start_time).await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    return;
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    engine: Arc<DaemonEngine>,
    shutdown: Arc<Notify>,
    start_time: Instant,
) {
    loop {
        let request: Option<Request> = match read_message(&mut stream).await {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "connection read failed");
                return;
            }
        };
        let Some(request) = request else {
            return; // clean EOF
        };

        let response = match request {
            Request::Ping => Response::Pong,
            Request::Hello { version } => {
                if version != PROTOCOL_VERSION {
                    debug!(client = %version, daemon = PROTOCOL_VERSION, "version skew");
                }
                Response::Hello {
                    version: PROTOCOL_VERSION.to_string(),
                }
            }
            Request::Execute { request } => {
                let response = engine.execute(request).await;
                Response::Execution { response }
            }
            Request::Status => Response::Status {
                status: StatusInfo {
                    version: PROTOCOL_VERSION.to_string(),
                    uptime_secs: start_time.elapsed().as_secs(),
                    prompts: engine.registries().prompts.len(),
                    gates: engine.registries().gates.len(),
                    styles: engine.registries().styles.len(),
                    frameworks: engine.registries().frameworks.len(),
                    active_sessions: engine.store().len(),
                },
            },
            Request::Shutdown => {
                shutdown.notify_one();
                Response::ShuttingDown
            }
        };

        if let Err(e) = write_message(&mut stream, &response).await {
            debug!(error = %e, "connection write failed");
            return;
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
