//! Natives every host gets: conversions, string helpers, randomness and
//! time. Output and dialogs are host specific and registered by the host.
pub mod core;

pub use self::core::{register_core, register_output};
