//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `hardware` | HardwareController | ESP32 GPIO via embedded-hal |
//! | `mock`     | HardwareController | In-memory record (tests)    |
//! | `time`     | Clock              | ESP32 system timer / manual |
//! | `log_sink` | DiagnosticSink     | Serial log output           |

pub mod hardware;
pub mod log_sink;
pub mod mock;
pub mod time;
