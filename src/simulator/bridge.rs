// simulator/bridge.rs
//
// Client side of the simulator bridge: one JSON object per line in each
// direction, strictly request then reply.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PhaseDefinition, SimulatorClient};
use crate::error::SimulatorError;

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Request<'a> {
    Start { config_path: &'a str },
    SimulationStep,
    MinExpectedNumber,
    TrafficLightIds,
    Program { tl_id: &'a str },
    ControlledLanes { tl_id: &'a str },
    VehicleIds,
    LaneVehicles { lane_id: &'a str },
    VehicleDistance { vehicle_id: &'a str },
    VehicleWaitingTime { vehicle_id: &'a str },
    SetPhase { tl_id: &'a str, phase_index: usize },
    Close,
}

impl Request<'_> {
    fn name(&self) -> &'static str {
        match self {
            Request::Start { .. } => "start",
            Request::SimulationStep => "simulation_step",
            Request::MinExpectedNumber => "min_expected_number",
            Request::TrafficLightIds => "traffic_light_ids",
            Request::Program { .. } => "program",
            Request::ControlledLanes { .. } => "controlled_lanes",
            Request::VehicleIds => "vehicle_ids",
            Request::LaneVehicles { .. } => "lane_vehicles",
            Request::VehicleDistance { .. } => "vehicle_distance",
            Request::VehicleWaitingTime { .. } => "vehicle_waiting_time",
            Request::SetPhase { .. } => "set_phase",
            Request::Close => "close",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply {
    Ok {
        #[serde(default)]
        value: Value,
    },
    Error {
        message: String,
    },
}

/// How to reach (and optionally launch) the bridge process.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub addr: String,
    /// Program started before connecting; it receives `--port <port>`.
    pub launch: Option<String>,
    pub connect_attempts: u32,
    pub connect_delay: Duration,
    /// Longest wait for a single reply; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

pub struct BridgeClient {
    conn: Option<Connection>,
    child: Option<Child>,
}

impl BridgeClient {
    /// Launches the bridge if requested, then connects to it. Connection
    /// attempts are repeated only here, while the process is starting up.
    pub fn connect(options: &BridgeOptions) -> Result<Self, SimulatorError> {
        let child = match &options.launch {
            Some(program) => Some(launch_bridge(program, &options.addr)?),
            None => None,
        };

        let attempts = options.connect_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match TcpStream::connect(&options.addr) {
                Ok(stream) => {
                    log::info!("Connected to simulator bridge at {}", options.addr);
                    return match Connection::open(stream, options.request_timeout) {
                        Ok(conn) => Ok(Self {
                            conn: Some(conn),
                            child,
                        }),
                        Err(e) => {
                            if let Some(child) = child {
                                stop_child(child);
                            }
                            Err(e)
                        }
                    };
                }
                Err(e) => {
                    log::debug!(
                        "Bridge connection attempt {}/{} to {} failed: {}",
                        attempt,
                        attempts,
                        options.addr,
                        e
                    );
                    last_err = Some(e);
                    if attempt < attempts {
                        thread::sleep(options.connect_delay);
                    }
                }
            }
        }

        if let Some(child) = child {
            stop_child(child);
        }
        Err(SimulatorError::Connection(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "no connection attempt made")
        })))
    }

    fn request<T: DeserializeOwned>(&mut self, request: Request<'_>) -> Result<T, SimulatorError> {
        let conn = self.conn.as_mut().ok_or(SimulatorError::AlreadyClosed)?;

        let mut line =
            serde_json::to_string(&request).map_err(|e| SimulatorError::Protocol(e.to_string()))?;
        line.push('\n');
        conn.writer.write_all(line.as_bytes())?;
        conn.writer.flush()?;

        let mut reply = String::new();
        let read = conn.reader.read_line(&mut reply).map_err(|e| match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no reply to '{}' in time", request.name()),
            ),
            _ => e,
        })?;
        if read == 0 {
            return Err(SimulatorError::Connection(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "simulator closed the connection",
            )));
        }

        match serde_json::from_str::<Reply>(reply.trim_end())
            .map_err(|e| SimulatorError::Protocol(e.to_string()))?
        {
            Reply::Ok { value } => {
                serde_json::from_value(value).map_err(|e| SimulatorError::Protocol(e.to_string()))
            }
            Reply::Error { message } => Err(SimulatorError::Command {
                command: request.name().to_string(),
                message,
            }),
        }
    }

    fn reap_child(&mut self) {
        if let Some(child) = self.child.take() {
            stop_child(child);
        }
    }
}

impl Connection {
    fn open(stream: TcpStream, request_timeout: Option<Duration>) -> Result<Self, SimulatorError> {
        stream.set_nodelay(true)?;
        // A stalled simulator surfaces as a fatal error instead of a hang.
        stream.set_read_timeout(request_timeout)?;
        stream.set_write_timeout(request_timeout)?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }
}

/// Kills the bridge process unless it already exited, and waits for it.
fn stop_child(mut child: Child) -> Option<ExitStatus> {
    if let Ok(Some(status)) = child.try_wait() {
        log::debug!("Simulator bridge exited with {}", status);
        return Some(status);
    }
    let _ = child.kill();
    child.wait().ok()
}

fn launch_bridge(program: &str, addr: &str) -> Result<Child, SimulatorError> {
    let port = addr.rsplit(':').next().unwrap_or_default();
    log::info!("Launching simulator bridge: {} --port {}", program, port);
    Command::new(program)
        .arg("--port")
        .arg(port)
        .spawn()
        .map_err(|source| SimulatorError::Launch {
            program: program.to_string(),
            source,
        })
}

impl SimulatorClient for BridgeClient {
    fn start(&mut self, config_path: &str) -> Result<(), SimulatorError> {
        self.request(Request::Start { config_path })
    }

    fn advance_step(&mut self) -> Result<(), SimulatorError> {
        self.request(Request::SimulationStep)
    }

    fn min_expected_vehicles(&mut self) -> Result<u32, SimulatorError> {
        self.request(Request::MinExpectedNumber)
    }

    fn traffic_light_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        self.request(Request::TrafficLightIds)
    }

    fn program(&mut self, tl_id: &str) -> Result<Vec<PhaseDefinition>, SimulatorError> {
        self.request(Request::Program { tl_id })
    }

    fn controlled_lane_groups(&mut self, tl_id: &str) -> Result<Vec<Vec<String>>, SimulatorError> {
        self.request(Request::ControlledLanes { tl_id })
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>, SimulatorError> {
        self.request(Request::VehicleIds)
    }

    fn vehicles_on_lane(&mut self, lane_id: &str) -> Result<Vec<String>, SimulatorError> {
        self.request(Request::LaneVehicles { lane_id })
    }

    fn vehicle_distance_from_stop(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        self.request(Request::VehicleDistance { vehicle_id })
    }

    fn vehicle_waiting_time(&mut self, vehicle_id: &str) -> Result<f64, SimulatorError> {
        self.request(Request::VehicleWaitingTime { vehicle_id })
    }

    fn set_active_phase(&mut self, tl_id: &str, phase_index: usize) -> Result<(), SimulatorError> {
        self.request(Request::SetPhase { tl_id, phase_index })
    }

    fn close(&mut self) -> Result<(), SimulatorError> {
        if self.conn.is_none() {
            return Err(SimulatorError::AlreadyClosed);
        }
        let result = self.request::<()>(Request::Close);
        self.conn = None;
        self.reap_child();
        result
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.reap_child();
    }
}
