//! Client and server TCP socket engines. The client side exposes a single
//! `TcpSocket` handle shared behind an `Arc`; the server side binds a
//! dual-stack listener and accepts through a cancellable, deadline-aware
//! stream.

pub mod channel;
pub mod config;
pub mod listener;
pub mod resolve;

pub use channel::{ShutdownDirection, TcpSocket};
pub use listener::TcpServerSocket;
