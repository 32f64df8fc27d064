// Copyright 2023 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the Tokio I/O provider.

// NOTE: In this provider, I/O error handling is generally to exit the
// task. The run_with_respawning function acts as a supervisor that will
// respawn the UDP receivers, after a delay if needed, when they exit
// with an error or a panic.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};

use crate::message::MAX_UDP_MESSAGE_SIZE;
use crate::server::{Response, Server};

/// The size of the buffer datagrams are received into. Queries longer
/// than a UDP message may be are read in full so that the server can
/// decide how to treat them.
const RECEIVE_BUFFER_SIZE: usize = u16::MAX as usize;

/// A Tokio I/O provider serving DNS over UDP.
///
/// The provider runs the server by spawning tasks on a Tokio runtime.
/// Each received datagram is handled in its own task, so a slow
/// response never holds up the receive loop.
///
/// The `TokioIoProvider` supports graceful shutdown. To initiate a
/// graceful shutdown, use the [`TokioShutdownController`] returned by
/// [`TokioIoProvider::start`].
pub struct TokioIoProvider {
    udp_sockets: Vec<Arc<UdpSocket>>,
}

impl TokioIoProvider {
    /// Creates a new `TokioIoProvider`. This call binds the UDP sockets
    /// in preparation, but does not start the server. This function
    /// requires that the Tokio runtime be active.
    pub async fn bind(addrs: impl IntoIterator<Item = SocketAddr>) -> io::Result<Self> {
        let mut udp_sockets = Vec::new();
        for addr in addrs {
            let socket = UdpSocket::bind(addr).await?;
            info!("Listening on UDP {}.", socket.local_addr()?);
            udp_sockets.push(Arc::new(socket));
        }
        Ok(Self { udp_sockets })
    }

    /// Returns the addresses the provider's sockets are bound to. This
    /// is useful when binding to port 0.
    pub fn local_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        self.udp_sockets
            .iter()
            .map(|socket| socket.local_addr())
            .collect()
    }

    /// Starts the server on the active Tokio runtime.
    ///
    /// This spawns tasks on the active Tokio runtime and then returns
    /// a [`TokioShutdownController`] that can be used to shut down the
    /// tasks at a later time. (The [`TokioShutdownController`] must be
    /// held as long as the server should be running, since dropping it
    /// will trigger shutdown.)
    pub fn start(self, server: &Arc<Server>) -> TokioShutdownController {
        let (shutdown_controller, shutdown_handle) = make_shutdown_channels();
        for socket in self.udp_sockets {
            tokio::spawn(run_with_respawning(
                shutdown_handle.clone(),
                server.clone(),
                socket,
            ));
        }
        shutdown_controller
    }
}

/// How long to wait between respawns of a task. This is to prevent
/// tasks that crash immediately from using up significant CPU time.
const TASK_RESPAWN_DELAY: Duration = Duration::from_secs(1);

/// Runs the UDP receiver for `socket`, respawning it if it returns an
/// I/O error, is cancelled, or panics.
async fn run_with_respawning(
    mut shutdown: ShutdownHandle,
    server: Arc<Server>,
    socket: Arc<UdpSocket>,
) {
    loop {
        let last_spawn_time = Instant::now();
        let receiver = run_udp_receiver(shutdown.clone(), server.clone(), socket.clone());
        match tokio::spawn(receiver).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => log_io_error(e),
            Err(_) => (), // The task panicked or was cancelled.
        }

        // If necessary, wait before respawning, but receive shutdown
        // requests immediately.
        let since_last_spawn = Instant::now().duration_since(last_spawn_time);
        if let Some(duration_to_wait) = TASK_RESPAWN_DELAY.checked_sub(since_last_spawn) {
            tokio::select! {
                _ = shutdown.request_receiver.recv() => return,
                _ = tokio::time::sleep(duration_to_wait) => (),
            }
        }
    }
}

/// The UDP receiver loop.
async fn run_udp_receiver(
    mut shutdown: ShutdownHandle,
    server: Arc<Server>,
    socket: Arc<UdpSocket>,
) -> io::Result<()> {
    loop {
        let mut received_buf = vec![0; RECEIVE_BUFFER_SIZE];

        // Receive a DNS message (or a shutdown request).
        let (received_len, src) = tokio::select! {
            _ = shutdown.request_receiver.recv() => return Ok(()),
            res = socket.recv_from(&mut received_buf) => res?,
        };

        // In a new Tokio task, process the DNS message and send the
        // response (if any).
        let shutdown = shutdown.wait_sender.clone();
        let server = server.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            let mut response_buf = [0; MAX_UDP_MESSAGE_SIZE];
            match server.handle_message(&received_buf[..received_len], src, &mut response_buf) {
                Response::Single(response_len) => {
                    if let Err(e) = socket.send_to(&response_buf[..response_len], src).await {
                        log_io_error(e);
                    }
                }
                Response::None => (),
            }

            // This ensures that the shutdown handle is moved into the
            // new task.
            drop(shutdown);
        });
    }
}

/// Controls the shutdown of a server's Tokio tasks.
///
/// This type is used to shut down the Tokio tasks spawned by
/// [`TokioIoProvider::start`]. Use
/// [`TokioShutdownController::shut_down`] or its blocking variant,
/// [`TokioShutdownController::blocking_shut_down`], to initiate
/// shutdown and wait for its completion. Dropping the controller will
/// also trigger shutdown (but will not wait for it to complete).
#[must_use]
pub struct TokioShutdownController {
    request_sender: broadcast::Sender<()>,
    wait_receiver: mpsc::Receiver<()>,
}

impl TokioShutdownController {
    /// Requests that running server tasks shut down, and then waits for
    /// them to terminate.
    pub async fn shut_down(mut self) {
        drop(self.request_sender);
        let _ = self.wait_receiver.recv().await;
    }

    /// The blocking variant of [`TokioShutdownController::shut_down`].
    pub fn blocking_shut_down(mut self) {
        drop(self.request_sender);
        let _ = self.wait_receiver.blocking_recv();
    }
}

/// A handle held by tasks to interact with the graceful shutdown
/// mechanism.
///
/// Tasks listen for shutdown by waiting for every sender attached to
/// `request_receiver` to close, and they hold `wait_sender` so that
/// shutdown does not complete until they are gone.
struct ShutdownHandle {
    request_receiver: broadcast::Receiver<()>,
    wait_sender: mpsc::Sender<()>,
}

impl Clone for ShutdownHandle {
    fn clone(&self) -> Self {
        // A resubscribed receiver misses values already queued, but the
        // shutdown signal is the senders closing, not a value.
        ShutdownHandle {
            request_receiver: self.request_receiver.resubscribe(),
            wait_sender: self.wait_sender.clone(),
        }
    }
}

/// Produces a [`TokioShutdownController`] and an initial
/// [`ShutdownHandle`] connected to it.
fn make_shutdown_channels() -> (TokioShutdownController, ShutdownHandle) {
    let (request_sender, request_receiver) = broadcast::channel(1);
    let (wait_sender, wait_receiver) = mpsc::channel(1);
    let controller = TokioShutdownController {
        request_sender,
        wait_receiver,
    };
    let handle = ShutdownHandle {
        request_receiver,
        wait_sender,
    };
    (controller, handle)
}

/// Logs an I/O error.
fn log_io_error(e: io::Error) {
    error!("I/O error: {e}");
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
