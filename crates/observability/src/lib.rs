//! # stillpost-observability
//!
//! Structured Logging via tracing-subscriber (Text oder JSON).
//! Wird einmal im Binary initialisiert; Bibliotheks-Crates loggen nur
//! ueber die `tracing`-Makros.

pub mod logging;

pub use logging::{
    logging_initialisieren, LogEinstellungen, LogFormat, LoggingFehler, ENV_LOG_FORMAT,
    ENV_LOG_LEVEL,
};
