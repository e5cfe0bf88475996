//! Doing network IO: one TCP connection per query, messages framed by a length prefix.
use std::{
    io::{self, Read, Write},
    net::{Ipv4Addr, SocketAddr, TcpStream},
    time::Duration,
};
use tracing::trace;

pub const DNS_PORT: u16 = 53;

/// Sends one encoded query to a server and returns its encoded response.
pub trait Transport {
    fn exchange(&mut self, server: Ipv4Addr, query: &[u8]) -> io::Result<Vec<u8>>;
}

/// DNS over TCP (RFC 1035 section 4.2.2).
#[derive(Debug, Clone)]
pub struct TcpTransport {
    pub port: u16,
    /// Applies to connecting, reading and writing. `None` blocks forever.
    pub timeout: Option<Duration>,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self {
            port: DNS_PORT,
            timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl Transport for TcpTransport {
    fn exchange(&mut self, server: Ipv4Addr, query: &[u8]) -> io::Result<Vec<u8>> {
        let addr = SocketAddr::from((server, self.port));
        // The stream is closed when it drops, on every path out of here.
        let mut stream = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        trace!(local = %stream.local_addr()?, remote = %addr, "connected");

        write_framed(&mut stream, query)?;
        trace!(bytes = query.len(), "sent query");
        let response = read_framed(&mut stream)?;
        trace!(bytes = response.len(), "received response");
        Ok(response)
    }
}

/// Write `message` preceded by its length as a big-endian u16.
pub fn write_framed<W: Write>(w: &mut W, message: &[u8]) -> io::Result<()> {
    let len = u16::try_from(message.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} byte message is too long to frame", message.len()),
        )
    })?;
    let mut framed = Vec::with_capacity(2 + message.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(message);
    w.write_all(&framed)?;
    w.flush()
}

/// Read one length-prefixed message. A stream that ends before the whole message arrives
/// is an `UnexpectedEof` error.
pub fn read_framed<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let mut len = [0; 2];
    r.read_exact(&mut len)?;
    let mut message = vec![0; usize::from(u16::from_be_bytes(len))];
    r.read_exact(&mut message)?;
    Ok(message)
}
