//! Utilities for testing gossip channels: a scriptable overlay, recording and loopback
//!  connections, and a set-union gossiper whose merge is idempotent and commutative by
//!  construction. They are used for testing the core itself, and they are exported so that
//!  applications embedding the core can test their gossipers the same way.

pub mod connection;
pub mod gossiper;
pub mod node;
pub mod overlay;
