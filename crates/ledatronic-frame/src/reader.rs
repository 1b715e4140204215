use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use ledatronic_transport::{DeviceStream, ShutdownHandle, TransportError};
use tracing::{debug, trace};

use crate::codec::{FrameConfig, START1, START2};
use crate::error::{FrameError, Result};

/// Reads status frames from any `Read` stream.
///
/// Scanning for the start marker consumes one byte per read and never
/// backtracks: a byte that fails the marker check is gone, even if it would
/// have started the next marker.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
    skipped_bytes: u64,
    frames_read: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            skipped_bytes: 0,
            frames_read: 0,
        }
    }

    /// Read exactly `count` bytes, accumulating partial reads.
    ///
    /// Returns `Err(FrameError::ConnectionInterrupted)` if the stream yields
    /// zero bytes before `count` is reached. Never returns a short buffer.
    pub fn read_exact_bytes(&mut self, count: usize) -> Result<BytesMut> {
        let mut buf = BytesMut::zeroed(count);
        let mut filled = 0;

        while filled < count {
            let read = match self.inner.read(&mut buf[filled..]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionInterrupted {
                    expected: count,
                    received: filled,
                });
            }
            filled += read;
        }

        Ok(buf)
    }

    /// Read the next complete payload (blocking).
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            let first = self.read_exact_bytes(1)?[0];
            if first != START1 {
                self.skipped_bytes += 1;
                trace!(byte = first, "skipping unexpected byte");
                continue;
            }

            let second = self.read_exact_bytes(1)?[0];
            if second != START2 {
                self.skipped_bytes += 2;
                debug!(byte = second, "skipping sequence, unexpected second marker byte");
                continue;
            }

            let payload = self.read_exact_bytes(self.config.payload_len)?.freeze();
            self.frames_read += 1;
            debug!(payload = %hex::encode(&payload), "received complete payload");
            return Ok(payload);
        }
    }

    /// Iterate over payloads until the first error.
    pub fn frames(&mut self) -> Frames<'_, T> {
        Frames {
            reader: self,
            done: false,
        }
    }

    /// Bytes discarded while searching for a start marker.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Complete payloads delivered so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<DeviceStream> {
    /// Handle that aborts a blocked `read_frame` on this reader's socket.
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        self.inner
            .shutdown_handle()
            .map_err(transport_to_frame_error)
    }
}

fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) => FrameError::Io(io),
        TransportError::Connect { source, .. } | TransportError::Resolve { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

/// Lazy sequence of payloads read from a [`FrameReader`].
///
/// Yields the first error and then ends.
pub struct Frames<'a, T> {
    reader: &'a mut FrameReader<T>,
    done: bool,
}

impl<T: Read> Iterator for Frames<'_, T> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.reader.read_frame();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl<T: Read> std::iter::FusedIterator for Frames<'_, T> {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_frame, PAYLOAD_LEN};

    fn payload(fill: u8) -> Vec<u8> {
        vec![fill; PAYLOAD_LEN]
    }

    fn wire(payloads: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for p in payloads {
            encode_frame(p, PAYLOAD_LEN, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[payload(0x42)])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.as_ref(), payload(0x42).as_slice());
        assert_eq!(reader.frames_read(), 1);
        assert_eq!(reader.skipped_bytes(), 0);
    }

    #[test]
    fn read_multiple_frames() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[
            payload(1),
            payload(2),
            payload(3),
        ])));

        for fill in 1..=3u8 {
            assert_eq!(reader.read_frame().unwrap().as_ref(), payload(fill).as_slice());
        }
    }

    #[test]
    fn leading_noise_is_skipped_one_byte_at_a_time() {
        let mut bytes = vec![0x00, 0x13, 0x37];
        bytes.extend(wire(&[payload(7)]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.as_ref(), payload(7).as_slice());
        assert_eq!(reader.skipped_bytes(), 3);
    }

    #[test]
    fn corrupted_first_marker_byte_loses_that_frame() {
        let mut bytes = wire(&[payload(1), payload(2)]);
        bytes[0] = 0x0D;

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        // The first payload is scanned as noise until the second marker.
        assert_eq!(frame.as_ref(), payload(2).as_slice());
        assert_eq!(reader.frames_read(), 1);
    }

    #[test]
    fn corrupted_second_marker_byte_discards_both() {
        let mut bytes = vec![0x0E, 0x00];
        bytes.extend(wire(&[payload(9)]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.as_ref(), payload(9).as_slice());
        assert_eq!(reader.skipped_bytes(), 2);
    }

    #[test]
    fn repeated_first_marker_is_not_backtracked() {
        // 0E 0E FF: the second 0E is consumed as a failed START2, so the
        // following FF is noise and this frame is never delivered.
        let mut bytes = vec![0x0E];
        bytes.extend(wire(&[payload(5)]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();

        assert!(err.is_connection_interrupted());
        assert_eq!(reader.frames_read(), 0);
    }

    #[test]
    fn marker_bytes_inside_payload_do_not_split_frames() {
        let mut inner = payload(0);
        inner[10] = START1;
        inner[11] = START2;

        let mut reader = FrameReader::new(Cursor::new(wire(&[inner.clone(), payload(1)])));
        assert_eq!(reader.read_frame().unwrap().as_ref(), inner.as_slice());
        assert_eq!(reader.read_frame().unwrap().as_ref(), payload(1).as_slice());
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::ConnectionInterrupted {
                expected: 1,
                received: 0
            }
        ));
    }

    #[test]
    fn connection_closed_mid_payload() {
        let mut bytes = vec![0x0E, 0xFF];
        bytes.extend_from_slice(&[0xAA; 20]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::ConnectionInterrupted {
                expected: PAYLOAD_LEN,
                received: 20
            }
        ));
        assert_eq!(reader.frames_read(), 0);
    }

    #[test]
    fn read_exact_bytes_accumulates_partial_reads() {
        let mut reader = FrameReader::new(ByteByByteReader {
            bytes: (0..10).collect(),
            pos: 0,
        });
        let buf = reader.read_exact_bytes(10).unwrap();
        assert_eq!(buf.as_ref(), (0..10).collect::<Vec<u8>>().as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let mut reader = FrameReader::new(ByteByByteReader {
            bytes: wire(&[payload(0x33)]),
            pos: 0,
        });

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.as_ref(), payload(0x33).as_slice());
    }

    #[test]
    fn frames_iterator_ends_after_first_error() {
        let mut bytes = wire(&[payload(1), payload(2)]);
        bytes.extend_from_slice(&[0x0E, 0xFF, 0x01]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let results: Vec<_> = reader.frames().collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(
            results[2],
            Err(FrameError::ConnectionInterrupted { .. })
        ));
    }

    #[test]
    fn custom_payload_length() {
        let mut bytes = vec![0x0E, 0xFF];
        bytes.extend_from_slice(b"abcd");

        let cfg = FrameConfig { payload_len: 4 };
        let mut reader = FrameReader::with_config(Cursor::new(bytes), cfg);
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"abcd");
        assert_eq!(reader.config().payload_len, 4);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(&[payload(8)])),
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.read_frame().unwrap().as_ref(), payload(8).as_slice());
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = FrameReader::new(FailingReader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }
}
