//! Retained scene-graph contracts & tree for Graft
//!
//! This crate is the scene-graph half of the bridge: an actor arena with
//! container/lifecycle/size-negotiation protocols, a stage that attaches to
//! a foreign native window, typed input events, process-wide settings, and
//! a texture actor that mirrors an externally-owned pixel buffer.

mod actor;
mod event;
mod paint;
mod scene;
pub mod settings;
mod stage;
mod texture;

pub use actor::*;
pub use event::*;
pub use paint::*;
pub use scene::*;
pub use stage::*;
pub use texture::*;
