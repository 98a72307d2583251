//! Unified error types for the traffic light firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! composition root has exactly one failure path: force the outputs safe
//! and halt. All variants are `Copy`.

use core::fmt;

use crate::fsm::Phase;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is malformed or violates a timing constraint.
    Config(ConfigError),
    /// The phase table could not be constructed.
    Table(TableError),
    /// A task thread could not be created.
    TaskSpawn(&'static str),
    /// A task thread terminated by panicking.
    TaskPanicked(&'static str),
    /// `spawn` was called on a task manager whose tasks already exist.
    TasksAlreadyStarted,
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Table(e) => write!(f, "state table: {e}"),
            Self::TaskSpawn(name) => write!(f, "failed to create task '{name}'"),
            Self::TaskPanicked(name) => write!(f, "task '{name}' panicked"),
            Self::TasksAlreadyStarted => write!(f, "tasks already started"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON could not be parsed into a [`SystemConfig`](crate::config::SystemConfig).
    Malformed { line: usize, column: usize },
    /// A value is out of its permitted range.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { line, column } => {
                write!(f, "malformed config at line {line}, column {column}")
            }
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// State table errors
// ---------------------------------------------------------------------------

/// Reasons a [`StateTable`](crate::fsm::states::StateTable) refuses to build.
/// There is no fallback descriptor: every phase must be given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    MissingPhase(Phase),
    DuplicatePhase(Phase),
    ZeroDuration(Phase),
    /// Both green lines are on in the same pattern.
    ConflictingGo(Phase),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPhase(p) => write!(f, "no descriptor for phase {p:?}"),
            Self::DuplicatePhase(p) => write!(f, "phase {p:?} described twice"),
            Self::ZeroDuration(p) => write!(f, "phase {p:?} has zero duration"),
            Self::ConflictingGo(p) => {
                write!(f, "phase {p:?} turns on both primary and secondary green")
            }
        }
    }
}

impl From<TableError> for Error {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
