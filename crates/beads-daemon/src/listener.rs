// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop: one spawned task per connection (spec.md §4.2), matching
//! the teacher's `Listener::run_unix_only` shape.

use std::sync::Arc;
use std::time::Duration;

use beads_wire::{read_request, write_response, ProtocolError};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::dispatch::dispatch;
use crate::lifecycle::DaemonState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the accept loop until `cancel` fires, at which point in-flight
/// connections are allowed to drain naturally (spec.md §4.2: "stop
/// accepting new connections; drain in-flight requests").
pub async fn run(listener: UnixListener, daemon: Arc<DaemonState>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("listener stopping: cancellation requested");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let daemon = Arc::clone(&daemon);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &daemon).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                }
            }
        }
    }
}

async fn handle_connection(mut stream: tokio::net::UnixStream, daemon: &DaemonState) -> Result<(), ProtocolError> {
    loop {
        let request = match read_request(&mut stream, REQUEST_TIMEOUT).await {
            Ok(r) => r,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let is_shutdown = matches!(request, beads_wire::Request::Shutdown);
        let response = dispatch(daemon, request).await;
        write_response(&mut stream, &response).await?;

        if is_shutdown {
            return Ok(());
        }
    }
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("connection closed by peer"),
        other => error!(error = %other, "connection error"),
    }
}
