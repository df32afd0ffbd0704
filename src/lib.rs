//! Ferry - a transparent DNS forwarding relay.
//!
//! Listens for DNS queries over UDP, forwards each one verbatim to a
//! configured upstream resolver, reports the answered address to an
//! injected observer, and relays the raw reply back to the requester.

pub mod config;
pub mod dns;
pub mod error;
pub mod observer;
pub mod pending;
pub mod relay;
pub mod upstream;
