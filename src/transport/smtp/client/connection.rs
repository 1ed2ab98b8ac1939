use std::{
    fmt::Display,
    io::{BufRead, BufReader, Write},
    net::ToSocketAddrs,
};

use lettre::transport::smtp::{
    authentication::{Credentials, Mechanism},
    commands::{Auth, Data, Ehlo, Quit, Starttls},
    extension::{ClientId, Extension, MailBodyParameter, MailParameter, ServerInfo},
    response::Response,
};

use super::{escape_crlf, ClientCodec, NetworkStream, TlsParameters};
use crate::transport::smtp::{
    commands::{Helo, Mail},
    Error,
};

/// Most `334` challenges answered in a single AUTH exchange
const MAX_CHALLENGES: usize = 10;

/// A blocking SMTP client connection
#[derive(Debug)]
pub struct SmtpConnection {
    stream: BufReader<NetworkStream>,
    /// Extensions from the last EHLO, `None` after a HELO
    server_info: Option<ServerInfo>,
}

impl SmtpConnection {
    /// Connects to `server`, reads the greeting and says hello
    pub fn connect<A: ToSocketAddrs>(server: A, hello_name: &ClientId) -> Result<Self, Error> {
        let mut conn = SmtpConnection {
            stream: BufReader::new(NetworkStream::connect(server)?),
            server_info: None,
        };

        let greeting = conn.read_response()?;
        tracing::debug!(greeting = greeting.first_line().unwrap_or_default(), "connected");

        conn.hello(hello_name)?;
        Ok(conn)
    }

    /// Sends EHLO, falls back to HELO when the server rejects it
    fn hello(&mut self, hello_name: &ClientId) -> Result<(), Error> {
        match self.command(Ehlo::new(hello_name.clone())) {
            Ok(response) => {
                let server_info = ServerInfo::from_response(&response)?;
                tracing::debug!(%server_info, "extensions");
                self.server_info = Some(server_info);
            }
            Err(Error::Rejected { code, .. }) => {
                tracing::debug!(%code, "EHLO rejected, trying HELO");
                self.server_info = None;
                self.command(Helo::new(hello_name.clone()))?;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn supports(&self, extension: Extension) -> bool {
        self.server_info
            .as_ref()
            .is_some_and(|info| info.supports_feature(extension))
    }

    /// Upgrades the connection with STARTTLS and says hello again
    pub fn starttls(
        &mut self,
        tls_parameters: &TlsParameters,
        hello_name: &ClientId,
    ) -> Result<(), Error> {
        if !self.supports(Extension::StartTls) {
            return Err(Error::Client("STARTTLS is not supported on this server"));
        }

        self.command(Starttls)?;
        self.stream.get_mut().upgrade_tls(tls_parameters)?;
        tracing::debug!(domain = tls_parameters.domain(), "connection encrypted");

        self.hello(hello_name)
    }

    /// Authenticates with the first of `mechanisms` the server offers
    pub fn auth(
        &mut self,
        mechanisms: &[Mechanism],
        credentials: &Credentials,
    ) -> Result<Response, Error> {
        let mechanism = self
            .server_info
            .as_ref()
            .and_then(|info| info.get_auth_mechanism(mechanisms))
            .ok_or(Error::Client("no compatible authentication mechanism"))?;
        tracing::debug!(">> AUTH {}", mechanism);

        // AUTH lines carry the credentials, they are not logged
        let auth = Auth::new(mechanism, credentials.clone(), None)?;
        let mut response = self.send(auth.to_string().as_bytes())?;

        let mut challenges = 0;
        while response.has_code(334) {
            challenges += 1;
            if challenges > MAX_CHALLENGES {
                return Err(Error::Client("too many authentication challenges"));
            }
            let answer = Auth::new_from_response(mechanism, credentials.clone(), &response)?;
            response = self.send(answer.to_string().as_bytes())?;
        }

        Ok(response)
    }

    /// Sends MAIL FROM
    ///
    /// `BODY=8BITMIME` and `SMTPUTF8` are added when the server offers them.
    pub fn mail(&mut self, from: &str) -> Result<Response, Error> {
        let mut parameters = Vec::new();
        if self.supports(Extension::EightBitMime) {
            parameters.push(MailParameter::Body(MailBodyParameter::EightBitMime));
        }
        if self.supports(Extension::SmtpUtfEight) {
            parameters.push(MailParameter::SmtpUtfEight);
        }
        self.command(Mail::new(from, parameters)?)
    }

    /// Sends DATA, the message and the end of data marker
    pub fn data(&mut self, message: &[u8]) -> Result<Response, Error> {
        self.command(Data)?;

        let mut codec = ClientCodec::new();
        let mut buf = Vec::with_capacity(message.len() + 5);
        codec.encode(message, &mut buf);
        codec.finish(&mut buf);

        tracing::debug!(">> {} bytes of message", buf.len());
        self.send(&buf)
    }

    /// Sends QUIT
    pub fn quit(&mut self) -> Result<Response, Error> {
        self.command(Quit)
    }

    /// Sends an SMTP command and reads the reply
    pub fn command<C: Display>(&mut self, command: C) -> Result<Response, Error> {
        let line = command.to_string();
        tracing::debug!(">> {}", escape_crlf(&line));
        self.send(line.as_bytes())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<Response, Error> {
        let stream = self.stream.get_mut();
        stream.write_all(bytes)?;
        stream.flush()?;
        self.read_response()
    }

    /// Reads a reply, negative ones are returned as [`Error::Rejected`]
    pub fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(128);

        loop {
            let start = buffer.len();
            if self.stream.read_line(&mut buffer)? == 0 {
                return Err(Error::Closed);
            }
            tracing::debug!("<< {}", escape_crlf(&buffer[start..]));

            // `250-` goes on, anything else after the code ends the reply
            if buffer.as_bytes().get(start + 3) != Some(&b'-') {
                break;
            }
        }

        let response: Response = buffer.parse()?;
        if response.is_positive() {
            Ok(response)
        } else {
            Err(Error::Rejected {
                code: response.code(),
                message: response.message().collect::<Vec<_>>().join(" "),
            })
        }
    }
}
