use std::{
    io::{self, Read, Write},
    mem,
    net::{TcpStream, ToSocketAddrs},
};

use native_tls::TlsStream;

use super::TlsParameters;
use crate::transport::smtp::Error;

/// A TCP stream, upgraded to TLS after STARTTLS
#[derive(Debug)]
pub struct NetworkStream {
    inner: Inner,
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
enum Inner {
    Tcp(TcpStream),
    Tls(TlsStream<TcpStream>),
    /// Lost in a failed TLS upgrade
    Gone,
}

fn gone() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream lost in TLS upgrade")
}

impl NetworkStream {
    /// Opens a plain TCP connection to the first reachable address of `server`
    pub fn connect<T: ToSocketAddrs>(server: T) -> Result<NetworkStream, Error> {
        let mut last_err = None;
        for addr in server.to_socket_addrs()? {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    tracing::debug!(%addr, "connected");
                    return Ok(NetworkStream {
                        inner: Inner::Tcp(stream),
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(Error::Network(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no address to connect to")
        })))
    }

    /// Runs the TLS handshake over a plain connection
    ///
    /// Does nothing on an encrypted one. A failed handshake leaves the
    /// stream unusable.
    pub fn upgrade_tls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        if let Inner::Tcp(_) = self.inner {
            let Inner::Tcp(tcp) = mem::replace(&mut self.inner, Inner::Gone) else {
                return Err(Error::Network(gone()));
            };
            self.inner = Inner::Tls(tls_parameters.handshake(tcp)?);
        }
        Ok(())
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner {
            Inner::Tcp(ref mut s) => s.read(buf),
            Inner::Tls(ref mut s) => s.read(buf),
            Inner::Gone => Err(gone()),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner {
            Inner::Tcp(ref mut s) => s.write(buf),
            Inner::Tls(ref mut s) => s.write(buf),
            Inner::Gone => Err(gone()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner {
            Inner::Tcp(ref mut s) => s.flush(),
            Inner::Tls(ref mut s) => s.flush(),
            Inner::Gone => Err(gone()),
        }
    }
}
