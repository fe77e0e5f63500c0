//! Transports that deliver [`HostEvent`](crate::command::HostEvent)s.
//!
//! A host shell (or a replay script) writes newline-delimited JSON events
//! to a byte stream; [`listener::LineSource`] parses them and forwards them
//! to the launcher's event loop.

pub mod listener;
