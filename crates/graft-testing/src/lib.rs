//! Testing utilities and harness for Graft

mod harness;

pub use harness::*;
