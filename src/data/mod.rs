//! Synthetic demo-signal generation for self-tests and the `milag demo` run.

pub mod demo;

pub use demo::*;
