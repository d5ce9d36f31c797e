//! Refund lifecycle and pass-state synchronization engine for a tourist pass
//! commerce platform.
//!
//! The crate owns the one subsystem of the platform with real engineering
//! depth: eligibility screening for refund creation, suspension and
//! reactivation of purchased passes while a refund is in flight, and the
//! admin review state machine with its compensating pass and order
//! mutations. Page rendering, session lookup, and settlement live elsewhere
//! and are reached only through the trait seams in
//! [`workflows::refunds::repository`] and [`workflows::refunds::audit`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
