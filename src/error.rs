use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the external simulator.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("connection to simulator failed: {0}")]
    Connection(#[from] io::Error),

    #[error("could not launch simulator process '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed reply from simulator: {0}")]
    Protocol(String),

    #[error("simulator rejected '{command}': {message}")]
    Command { command: String, message: String },

    #[error("simulator connection already closed")]
    AlreadyClosed,
}

impl SimulatorError {
    /// Fatal errors mean the connection itself is unusable and the step loop
    /// has to stop. Command rejections only affect the request that caused them.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SimulatorError::Command { .. })
    }
}

/// Failure while processing one traffic light during a step.
#[derive(Debug, Error)]
#[error("traffic light {tl_id}: {source}")]
pub struct TrafficLightError {
    pub tl_id: String,
    #[source]
    pub source: SimulatorError,
}

impl TrafficLightError {
    pub fn is_fatal(&self) -> bool {
        self.source.is_fatal()
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not create results folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write summary: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not render chart: {0}")]
    Chart(String),
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("could not read summary: {0}")]
    Io(#[from] io::Error),

    #[error("could not parse summary: {0}")]
    Csv(#[from] csv::Error),

    #[error("summary has no 'Metric,Value' header")]
    MissingHeader,
}
