//! Byte channel abstraction over serial ports and TCP streams
//!
//! The telemetry pipeline only needs `Read`/`Write` plus a way to ask how
//! many bytes are waiting, so it is written against this trait. Tests drive
//! it over a loopback TCP pair instead of real hardware.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// A bidirectional byte stream that can report pending input
pub trait ByteChannel: Read + Write + Send {
    /// Number of bytes available to read without blocking
    fn bytes_to_read(&mut self) -> io::Result<u32>;
}

/// Serial port wrapper implementing [`ByteChannel`]
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an opened serial port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl ByteChannel for SerialChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

/// TCP stream wrapper implementing [`ByteChannel`]
pub struct TcpChannel {
    stream: TcpStream,
}

impl TcpChannel {
    /// Wrap a connected TCP stream
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl Read for TcpChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl ByteChannel for TcpChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        // TCP has no in_waiting equivalent; a non-blocking peek reports how
        // much is queued without consuming it. A peek of zero bytes is EOF,
        // not idleness; idleness surfaces as WouldBlock.
        self.stream.set_nonblocking(true)?;
        let mut buf = [0u8; 8192];
        let result = self.stream.peek(&mut buf);
        self.stream.set_nonblocking(false)?;

        match result {
            Ok(0) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed")),
            Ok(n) => Ok(n as u32),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn test_tcp_channel_reports_pending_bytes() {
        let (mut tx, rx) = loopback_pair();
        let mut channel = TcpChannel::new(rx);

        assert_eq!(channel.bytes_to_read().unwrap(), 0);

        tx.write_all(b"pending").unwrap();
        // Wait for the loopback to deliver
        for _ in 0..50 {
            if channel.bytes_to_read().unwrap() > 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(channel.bytes_to_read().unwrap(), 7);

        // Peek does not consume
        let mut buf = [0u8; 16];
        let n = channel.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pending");
    }
}
