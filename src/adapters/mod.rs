//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                | Connects to              |
//! |------------|---------------------------|--------------------------|
//! | `hardware` | SensorPort, ActuatorPort  | ESP32 ADC1, GPIO banks   |
//! | `log_sink` | EventSink                 | Serial log output        |
//! | `time`     | ClockPort                 | ESP-IDF system time      |

pub mod hardware;
pub mod log_sink;
pub mod time;
