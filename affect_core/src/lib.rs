//! # Affect Core (The Governed Mind)
//!
//! The stateful half of the agent. This crate layers interoception, a
//! persistent cognitive-friction model, metacognition, and narrative
//! governance on top of the `digital_body` primitives, and wires them into
//! an autonomous operating loop.
//!
//! ## Core Components
//!
//! - **interoception**: Turns raw channel deltas into felt sensations and a
//!   decaying per-relationship affect ledger
//! - **friction**: An opaque wear model where sustained load converts
//!   irreversibly into damage
//! - **metacognition**: Self-assessment of generated text with small
//!   corrective body deltas
//! - **narrative**: The governance gate every externalized text must pass
//! - **temporal**: The felt, load-dilated perception of elapsed time
//! - **cycle**: The digital biological rhythm tying it all together
//!
//! ## Design Philosophy
//!
//! - **Nothing is fatal**: every subsystem degrades to a safe default so a
//!   long-lived loop keeps running
//! - **Clamp at the boundary**: out-of-range values never escape the
//!   operation that produced them
//! - **Gate before speaking**: internal state only becomes text through the
//!   narrative filter

pub mod config;
pub mod cycle;
pub mod discontinuity;
pub mod error;
pub mod friction;
pub mod interoception;
pub mod memory_log;
pub mod metacognition;
pub mod narrative;
pub mod temporal;

pub use config::*;
pub use cycle::*;
pub use discontinuity::*;
pub use error::*;
pub use friction::*;
pub use interoception::*;
pub use memory_log::*;
pub use metacognition::*;
pub use narrative::*;
pub use temporal::*;
