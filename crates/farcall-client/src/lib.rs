//! farcall Client
//!
//! The client proxy: connects, discovers the server's procedures through the
//! introspection exchange, and exposes them through an explicit
//! [`RpcClient::call`] operation. Every call is an independent
//! connect/send/receive/close cycle.

pub mod client;

pub use client::RpcClient;
