use std::fmt;
use std::io::{ErrorKind, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Host and port of an oven controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddr {
    pub host: String,
    pub port: u16,
}

impl DeviceAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: self.to_string(),
                source,
            })?
            .collect::<Vec<_>>();

        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                addr: self.to_string(),
                source: std::io::Error::new(ErrorKind::NotFound, "no addresses resolved"),
            });
        }
        Ok(addrs)
    }
}

impl fmt::Display for DeviceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Socket options applied when connecting.
///
/// Both timeouts default to `None`, so a stalled controller blocks the
/// reader indefinitely. Setting `read_timeout` turns a stall into an I/O error.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

/// Connect to the controller (blocking).
pub fn connect(addr: &DeviceAddr, options: &ConnectOptions) -> Result<DeviceStream> {
    let mut last_err = None;

    for socket_addr in addr.resolve()? {
        let attempt = match options.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&socket_addr, timeout),
            None => TcpStream::connect(socket_addr),
        };
        match attempt {
            Ok(stream) => {
                stream.set_read_timeout(options.read_timeout)?;
                info!(%addr, peer = %socket_addr, "connected to controller");
                return Ok(DeviceStream {
                    inner: stream,
                    addr: addr.clone(),
                });
            }
            Err(err) => {
                debug!(%socket_addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    match last_err {
        Some(err) if err.kind() == ErrorKind::ConnectionRefused => {
            Err(TransportError::ConnectionRefused {
                addr: addr.to_string(),
            })
        }
        Some(source) => Err(TransportError::Connect {
            addr: addr.to_string(),
            source,
        }),
        None => Err(TransportError::Resolve {
            addr: addr.to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "no addresses resolved"),
        }),
    }
}

/// A connected, read-only stream from the controller.
///
/// The socket is closed when the stream is dropped.
pub struct DeviceStream {
    inner: TcpStream,
    addr: DeviceAddr,
}

impl DeviceStream {
    /// Wrap an already connected socket.
    pub fn from_tcp(inner: TcpStream, addr: DeviceAddr) -> Self {
        Self { inner, addr }
    }

    /// Address this stream was opened against.
    pub fn addr(&self) -> &DeviceAddr {
        &self.addr
    }

    /// Change the read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Handle that can abort a blocked read from another thread.
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        let stream = self.inner.try_clone()?;
        Ok(ShutdownHandle { stream })
    }
}

impl Read for DeviceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        let _ = self.inner.shutdown(Shutdown::Both);
        debug!(addr = %self.addr, "connection closed");
    }
}

impl fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceStream")
            .field("addr", &self.addr.to_string())
            .finish()
    }
}

/// Shuts the shared socket down, unblocking any pending read with EOF.
#[derive(Debug)]
pub struct ShutdownHandle {
    stream: TcpStream,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => debug!("connection shut down"),
            // Already closed by the peer.
            Err(err) if err.kind() == ErrorKind::NotConnected => {}
            Err(err) => debug!(error = %err, "shutdown failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn local_listener() -> (TcpListener, DeviceAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let port = listener.local_addr().expect("local addr").port();
        (listener, DeviceAddr::new("127.0.0.1", port))
    }

    #[test]
    fn display_is_host_colon_port() {
        assert_eq!(DeviceAddr::new("oven.local", 10001).to_string(), "oven.local:10001");
    }

    #[test]
    fn connect_and_read() {
        let (listener, addr) = local_listener();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            stream.write_all(&[0x0E, 0xFF]).expect("write");
        });

        let mut stream = connect(&addr, &ConnectOptions::default()).expect("connect");
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).expect("read");
        assert_eq!(buf, [0x0E, 0xFF]);
        server.join().expect("server thread");
    }

    #[test]
    fn refused_connection_is_classified() {
        let (listener, addr) = local_listener();
        drop(listener);

        let err = connect(&addr, &ConnectOptions::default()).unwrap_err();
        assert!(err.is_connection_refused(), "unexpected error: {err}");
    }

    #[test]
    fn shutdown_handle_unblocks_pending_read() {
        let (listener, addr) = local_listener();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            // Keep the connection open without sending anything.
            thread::sleep(Duration::from_millis(500));
            drop(stream);
        });

        let mut stream = connect(&addr, &ConnectOptions::default()).expect("connect");
        let handle = stream.shutdown_handle().expect("handle");
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.shutdown();
        });

        let mut buf = [0u8; 1];
        let read = stream.read(&mut buf).expect("read after shutdown returns eof");
        assert_eq!(read, 0);

        canceller.join().expect("canceller thread");
        server.join().expect("server thread");
    }

    #[test]
    fn read_timeout_surfaces_as_io_error() {
        let (listener, addr) = local_listener();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let options = ConnectOptions {
            read_timeout: Some(Duration::from_millis(20)),
            ..ConnectOptions::default()
        };
        let mut stream = connect(&addr, &options).expect("connect");
        let mut buf = [0u8; 1];
        let err = stream.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::WouldBlock | ErrorKind::TimedOut
        ));
        server.join().expect("server thread");
    }
}
