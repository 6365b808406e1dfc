//! TCP bridge exposing the telemetry stream to external observers.
//!
//! Records are broadcast to every connected client as length-prefixed JSON
//! (u32 little-endian length, then the payload). The bridge is a plain
//! subscriber of the in-process stream, so it can never reorder records or
//! stall the simulator; a client that stops reading is dropped on the next
//! write failure.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::telemetry::{TelemetryStream, TelemetrySubscription};

pub struct TelemetryServer {
    local_addr: SocketAddr,
}

impl TelemetryServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Binds the broadcast listener and spawns the fan-out thread. Returns `None`
/// when the bind fails; telemetry streaming is then disabled but the engine
/// keeps running.
pub fn start_telemetry_server(
    bind_addr: SocketAddr,
    stream: &TelemetryStream,
) -> Option<TelemetryServer> {
    let listener = match TcpListener::bind(bind_addr) {
        Ok(listener) => listener,
        Err(err) => {
            warn!(
                %bind_addr,
                %err,
                "telemetry server bind failed; streaming disabled"
            );
            return None;
        }
    };
    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => {
            warn!(%err, "telemetry server local_addr failed; streaming disabled");
            return None;
        }
    };
    if let Err(err) = listener.set_nonblocking(true) {
        warn!(%err, "set_nonblocking failed for telemetry listener");
        return None;
    }

    let subscription = stream.subscribe();
    let clients: Arc<Mutex<Vec<TcpStream>>> = Arc::new(Mutex::new(Vec::new()));
    let accept_clients = Arc::clone(&clients);

    thread::spawn(move || run_fan_out(listener, accept_clients, subscription));
    info!(%local_addr, "telemetry server listening");

    Some(TelemetryServer { local_addr })
}

fn run_fan_out(
    listener: TcpListener,
    clients: Arc<Mutex<Vec<TcpStream>>>,
    subscription: TelemetrySubscription,
) {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(err) = stream.set_nodelay(true) {
                    warn!(%addr, %err, "failed to set TCP_NODELAY for telemetry client");
                }
                let mut guard = clients.lock().expect("telemetry clients mutex poisoned");
                guard.push(stream);
                drop(guard);
                info!(%addr, "telemetry client connected");
            }
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => {
                error!(%err, "error accepting telemetry client");
                thread::sleep(Duration::from_millis(200));
            }
        }

        for record in subscription.drain() {
            match serde_json::to_vec(record.as_ref()) {
                Ok(payload) => broadcast_payload(&clients, &payload),
                Err(err) => warn!(%err, "telemetry record serialization failed"),
            }
        }

        thread::sleep(Duration::from_millis(16));
    }
}

fn broadcast_payload(clients: &Arc<Mutex<Vec<TcpStream>>>, payload: &[u8]) {
    let mut guard = clients.lock().expect("telemetry clients mutex poisoned");
    guard.retain_mut(|stream| {
        let len = payload.len() as u32;
        let mut buffer = Vec::with_capacity(4 + payload.len());
        buffer.extend_from_slice(&len.to_le_bytes());
        buffer.extend_from_slice(payload);
        match stream.write_all(&buffer) {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "dropping telemetry client");
                false
            }
        }
    });
}
