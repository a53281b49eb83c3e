//! Seamless — client-side window-state synchronizer for RemoteApp/RAIL
//! sessions.
//!
//! A remote session host pushes partial window-state updates; the local
//! windowing system renders each remote window as a native one. This crate
//! owns the reconciliation between the two: the window registry, the
//! field-presence merge, the icon cache, and the local move/resize
//! handshake. Wire decoding, transport, and pixel rendering live outside;
//! they meet this crate at the traits in [`rail::backend`].

pub mod error;
pub mod rail;
pub mod settings;
pub mod shared;
pub mod x11;

pub use error::RailError;
pub use rail::RailContext;
pub use settings::RailSettings;
