//! Marker-delimited status frames from a LEDATRONIC oven controller.
//!
//! The controller pushes one frame per status update:
//! - A 2-byte start marker `0x0E 0xFF`
//! - A fixed 56-byte payload
//!
//! There is no length field and no checksum. The reader resynchronises by
//! dropping bytes one at a time until it sees the marker again.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{encode_frame, FrameConfig, FRAME_LEN, PAYLOAD_LEN, START1, START2, START_MARKER};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, Frames};
pub use writer::FrameWriter;
