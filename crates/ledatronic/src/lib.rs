//! Read LEDATRONIC oven controller status frames and republish decoded values.
//!
//! # Crate Structure
//!
//! - [`transport`]: Read-only TCP link to the controller
//! - [`frame`]: Start-marker scan and fixed-length payload reader
//! - [`schema`]: Field table and the payload decoder
//! - [`poller`]: Plugin lifecycle and item publishing (behind `poller` feature)

/// Re-export transport types.
pub mod transport {
    pub use ledatronic_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ledatronic_frame::*;
}

/// Re-export schema and decoder types.
pub mod schema {
    pub use ledatronic_schema::*;
}

/// Re-export poller types (requires `poller` feature).
#[cfg(feature = "poller")]
pub mod poller {
    pub use ledatronic_poller::*;
}
