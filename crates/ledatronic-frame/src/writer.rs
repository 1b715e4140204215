use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig, FRAME_LEN};
use crate::error::{FrameError, Result};

/// Writes status frames to any `Write` stream.
///
/// Used by device simulators and tests; the polling side never writes.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(FRAME_LEN),
            config,
        }
    }

    /// Encode and send one payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, self.config.payload_len, &mut self.buf)?;
        write_all_retry(&mut self.inner, &self.buf)?;
        self.inner.flush().map_err(FrameError::Io)
    }

    /// Write raw bytes outside any frame.
    pub fn write_noise(&mut self, bytes: &[u8]) -> Result<()> {
        write_all_retry(&mut self.inner, bytes)?;
        self.inner.flush().map_err(FrameError::Io)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn write_all_retry<T: Write>(inner: &mut T, mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        match inner.write(data) {
            Ok(0) => {
                return Err(FrameError::Io(std::io::Error::from(ErrorKind::WriteZero)));
            }
            Ok(n) => data = &data[n..],
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}
