//! Status reports published by the monitor task.

use core::fmt::{self, Write};

use crate::fsm::{MachineSnapshot, Phase};

/// Capacity of one rendered status line.
pub const STATUS_LINE_CAPACITY: usize = 128;

/// Everything the monitor task reads in one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub label: &'static str,
    pub time_remaining_ms: u32,
    pub cycle_count: u32,
    pub transitions: u64,
}

impl StatusSnapshot {
    pub fn new(machine: MachineSnapshot, transitions: u64) -> Self {
        Self {
            phase: machine.phase,
            label: machine.label,
            time_remaining_ms: machine.time_remaining_ms,
            cycle_count: machine.cycle_count,
            transitions,
        }
    }

    /// Render into a fixed-capacity line for serial output. Text beyond
    /// [`STATUS_LINE_CAPACITY`] is cut off.
    pub fn to_line(&self) -> heapless::String<STATUS_LINE_CAPACITY> {
        let mut line = heapless::String::new();
        let mut w = Truncating(&mut line);
        // Truncating never reports an error.
        let _ = write!(w, "{self}");
        line
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STATUS | {} | remaining={}.{:03}s | cycle={} | transitions={}",
            self.label,
            self.time_remaining_ms / 1000,
            self.time_remaining_ms % 1000,
            self.cycle_count,
            self.transitions
        )
    }
}

/// Writer that keeps as much text as fits and silently drops the rest.
struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}
