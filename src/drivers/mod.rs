//! Platform helpers for the task layer.

pub mod task_pin;
