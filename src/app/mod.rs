//! Application core: port traits, the shared context both tasks lock, and
//! the status reports they publish.

pub mod events;
pub mod ports;
pub mod shared;
