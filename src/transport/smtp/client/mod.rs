//! SMTP client
//!
//! `SmtpConnection` drives a session one command at a time.
//!
//! ```rust,no_run
//! use email_resource::transport::smtp::{client::SmtpConnection, commands::Rcpt, ClientId};
//!
//! let hello = ClientId::Domain("my_hostname".to_owned());
//! let mut client = SmtpConnection::connect("localhost:25", &hello)?;
//! client.mail("user@example.com")?;
//! client.command(Rcpt::new("user@example.org")?)?;
//! client.data(b"Subject: Test\n\nTest email")?;
//! client.quit()?;
//! # Ok::<(), email_resource::transport::smtp::Error>(())
//! ```

pub use self::{
    connection::SmtpConnection,
    net::NetworkStream,
    tls::{TlsParameters, Verification},
};

mod connection;
mod net;
mod tls;

/// The codec used for transparency
///
/// Lines starting with `.` are escaped and bare `LF` line endings are
/// written as `CRLF`.
#[derive(Default, Clone, Copy, Debug)]
pub struct ClientCodec {
    /// Next byte starts a line
    mid_line: bool,
    /// Last byte was a `CR`
    after_cr: bool,
}

impl ClientCodec {
    /// Creates a new client codec
    pub fn new() -> Self {
        ClientCodec::default()
    }

    /// Adds transparency
    pub fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        for &byte in frame {
            match byte {
                b'\n' => {
                    if !self.after_cr {
                        buf.push(b'\r');
                    }
                    buf.push(b'\n');
                    self.mid_line = false;
                    self.after_cr = false;
                    continue;
                }
                b'.' if !self.mid_line => buf.extend_from_slice(b".."),
                _ => buf.push(byte),
            }
            self.mid_line = true;
            self.after_cr = byte == b'\r';
        }
    }

    /// Appends the end of data marker
    pub fn finish(&mut self, buf: &mut Vec<u8>) {
        if self.mid_line {
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b".\r\n");
        *self = ClientCodec::default();
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
/// Used for debug displays
fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}
