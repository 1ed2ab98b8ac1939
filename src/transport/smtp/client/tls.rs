use std::{
    fmt::{self, Debug, Formatter},
    io,
    net::TcpStream,
};

use native_tls::{Certificate, Protocol, TlsConnector, TlsStream};

use crate::transport::smtp::Error;

/// How the server certificate is checked
#[derive(Clone, Copy, Debug)]
pub enum Verification<'a> {
    /// Against the system roots
    System,
    /// Against the certificates of a PEM bundle only
    Bundle(&'a str),
    /// Not at all, any certificate for any name is accepted
    Disabled,
}

/// Parameters for the STARTTLS upgrade
#[derive(Clone)]
pub struct TlsParameters {
    connector: TlsConnector,
    domain: String,
}

impl TlsParameters {
    /// Creates parameters expecting a certificate for `domain`
    ///
    /// TLS 1.2 is the lowest accepted version.
    pub fn new(domain: String, verification: Verification<'_>) -> Result<Self, Error> {
        let mut builder = TlsConnector::builder();
        builder.min_protocol_version(Some(Protocol::Tlsv12));

        match verification {
            Verification::System => {}
            Verification::Bundle(pem) => {
                builder.disable_built_in_roots(true);
                for cert in pem_certificates(pem)? {
                    builder.add_root_certificate(cert);
                }
            }
            Verification::Disabled => {
                builder
                    .danger_accept_invalid_certs(true)
                    .danger_accept_invalid_hostnames(true);
            }
        }

        Ok(TlsParameters {
            connector: builder.build()?,
            domain,
        })
    }

    /// The domain name expected in the server certificate
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub(super) fn handshake(&self, stream: TcpStream) -> Result<TlsStream<TcpStream>, Error> {
        self.connector
            .connect(&self.domain, stream)
            .map_err(|err| match err {
                native_tls::HandshakeError::Failure(err) => Error::Tls(err),
                native_tls::HandshakeError::WouldBlock(_) => {
                    Error::Network(io::ErrorKind::WouldBlock.into())
                }
            })
    }
}

impl Debug for TlsParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Every certificate of a PEM bundle, other blocks are skipped
fn pem_certificates(pem: &str) -> Result<Vec<Certificate>, Error> {
    let mut reader = pem.as_bytes();
    let certs = rustls_pemfile::certs(&mut reader)
        .map(|der| -> Result<Certificate, Error> {
            let der = der.map_err(|err| Error::Certificate(err.to_string()))?;
            Ok(Certificate::from_der(der.as_ref())?)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    if certs.is_empty() {
        return Err(Error::Certificate("no certificate found".to_owned()));
    }
    Ok(certs)
}
