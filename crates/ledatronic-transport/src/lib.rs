//! Read-only TCP link to a LEDATRONIC oven controller.
//!
//! The controller pushes status frames on its own; this side never writes.
//! Everything above this crate reads from the [`DeviceStream`] returned by
//! [`connect`].

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{connect, ConnectOptions, DeviceAddr, DeviceStream, ShutdownHandle};
