use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{info, warn};

use mission_core::{
    build_engine, build_logistics, stream_server::start_telemetry_server, Expedition,
    MissionConfig, Threat,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = MissionConfig::default();
    let mut simulator = build_engine(config.clone());
    let logistics = build_logistics(config.clone());

    let telemetry_server = start_telemetry_server(config.telemetry_bind, simulator.telemetry());
    let command_rx = spawn_command_listener(config.command_bind);

    info!(
        command_bind = %config.command_bind,
        telemetry_bind = %config.telemetry_bind,
        streaming = telemetry_server.is_some(),
        "mission engine headless server ready"
    );

    while let Ok(command) = command_rx.recv() {
        match command {
            Command::Start(ids) => {
                let expedition: Expedition = ids.into_iter().collect();
                match simulator.start(expedition) {
                    Ok(()) => info!(epoch = simulator.epoch(), "command.applied=start"),
                    Err(err) => warn!(%err, "command.rejected=start"),
                }
            }
            Command::Tick(count) => {
                for _ in 0..count {
                    simulator.tick();
                }
                let snapshot = simulator.state();
                info!(
                    ticks = count,
                    status = ?snapshot.status,
                    leg = snapshot.current_leg,
                    risk_score = snapshot.risk.score,
                    "command.applied=tick"
                );
            }
            Command::Pause => {
                simulator.pause();
                info!("command.applied=pause");
            }
            Command::Resume => {
                simulator.resume();
                info!("command.applied=resume");
            }
            Command::Abort => {
                simulator.abort();
                info!(status = ?simulator.status(), "command.applied=abort");
            }
            Command::Brief(ids) => {
                let expedition: Expedition = ids.into_iter().collect();
                match logistics.generate_brief(&expedition) {
                    Ok(brief) => info!(
                        duration_hours = brief.estimated_duration_hours,
                        risk_score = brief.risk.score,
                        risk_tier = brief.risk.tier.as_str(),
                        gear_items = brief.gear_manifest.len(),
                        "command.applied=brief"
                    ),
                    Err(err) => warn!(%err, "command.rejected=brief"),
                }
            }
            Command::Inject(threat) => {
                simulator.inject_threat(threat);
                info!("command.applied=inject");
            }
            Command::State => {
                match serde_json::to_string(&simulator.state()) {
                    Ok(json) => info!(state = %json, "command.applied=state"),
                    Err(err) => warn!(%err, "state serialization failed"),
                }
            }
        }
    }
}

#[derive(Debug)]
enum Command {
    Start(Vec<String>),
    Tick(u32),
    Pause,
    Resume,
    Abort,
    Brief(Vec<String>),
    Inject(Threat),
    State,
}

fn spawn_command_listener(bind_addr: std::net::SocketAddr) -> Receiver<Command> {
    let listener = TcpListener::bind(bind_addr).expect("command listener bind failed");
    listener
        .set_nonblocking(true)
        .expect("set_nonblocking failed");

    let (sender, receiver) = unbounded::<Command>();
    thread::spawn(move || loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(%addr, "command client connected");
                let sender = sender.clone();
                thread::spawn(move || handle_client(stream, sender));
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(std::time::Duration::from_millis(50));
            }
            Err(err) => {
                warn!(%err, "error accepting command client");
                thread::sleep(std::time::Duration::from_millis(200));
            }
        }
    });

    receiver
}

fn handle_client(stream: std::net::TcpStream, sender: Sender<Command>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_command(trimmed) {
                    Some(cmd) => {
                        if sender.send(cmd).is_err() {
                            break;
                        }
                    }
                    None => warn!(input = trimmed, "invalid command"),
                }
            }
            Err(err) => {
                warn!(%err, "command read error");
                break;
            }
        }
    }
}

fn parse_command(input: &str) -> Option<Command> {
    let mut parts = input.split_whitespace();
    match parts.next()? {
        "start" => {
            let ids: Vec<String> = parts.map(str::to_string).collect();
            Some(Command::Start(ids))
        }
        "tick" => {
            let amount = parts.next().unwrap_or("1").parse().ok()?;
            Some(Command::Tick(amount))
        }
        "pause" => Some(Command::Pause),
        "resume" => Some(Command::Resume),
        "abort" => Some(Command::Abort),
        "brief" => {
            let ids: Vec<String> = parts.map(str::to_string).collect();
            Some(Command::Brief(ids))
        }
        "inject" => {
            let rest = input.strip_prefix("inject")?.trim();
            match serde_json::from_str::<Threat>(rest) {
                Ok(threat) => Some(Command::Inject(threat)),
                Err(err) => {
                    warn!(%err, "invalid threat payload");
                    None
                }
            }
        }
        "state" => Some(Command::State),
        _ => None,
    }
}
