//! # httpmeter-plugin
//!
//! The query side of httpmeter: answers the topology viewer's plugin
//! protocol over a unix-domain socket.
//!
//! Two request kinds exist. `GET /` returns the static capability
//! handshake; `GET /report` assembles a report document from the most
//! recent rate snapshot. Anything else is a 404.

pub mod handshake;
pub mod report;
pub mod server;
