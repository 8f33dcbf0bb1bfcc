//! # Digital Body
//!
//! The "body" crate - contains the physiological channel vector, the fixed
//! emotion vocabulary with its delta tables, and the keyword-based emotion
//! classifier. This crate is the single source of truth for bodily state and
//! does not contain any governance or persistence logic.

pub mod emotions;
pub mod physiology;

pub use emotions::*;
pub use physiology::*;
