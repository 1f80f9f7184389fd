//! farcall Transport Layer
//!
//! Length-prefixed framing over byte streams, plus the blocking TCP transport
//! used for the one-shot connect/send/receive/close cycle of every call.
//!
//! # Wire Format
//!
//! `[4-byte length prefix as u32 big-endian] + [payload]`
//!
//! A zero-length payload is legal: the frame is then just the four header
//! bytes `00 00 00 00`. Every implementation rejects declared lengths above a
//! configurable cap before allocating.

pub mod frame;
pub mod tcp;

pub use frame::{read_frame, write_frame, DEFAULT_MAX_FRAME_LEN};
pub use tcp::{TcpTransport, DEFAULT_TIMEOUT};
