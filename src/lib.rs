//! Rendezvous relay for the arcdps cooldown HUD.
//!
//! Game clients periodically POST their cooldown state keyed by a room name
//! and GET consolidated snapshots of every peer in that room. The relay is
//! the only thing clients talk to; there is no peer-to-peer traffic.

// core
pub mod domain;
pub mod registry;
pub mod view;

// transport
pub mod server;

// shared library
pub mod common;
