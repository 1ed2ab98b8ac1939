use std::{
    fs,
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    path::Path,
    thread::{self, JoinHandle},
};

use email_resource::{
    execute, execute_with, transport::smtp::ClientId, BuildTokens, Error, NetworkConnector,
    Stage,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const EHLO_PLAIN: &str = "250-fake.example.org\r\n250 8BITMIME\r\n";
const EHLO_UNKNOWN: &str = "502 5.5.2 Command not recognized\r\n";

/// Accepts a single session and returns everything the client wrote
struct FakeServer {
    port: u16,
    handle: JoinHandle<String>,
}

impl FakeServer {
    fn start(ehlo: &'static str, reject_rcpt: Option<&'static str>) -> FakeServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream, ehlo, reject_rcpt)
        });
        FakeServer { port, handle }
    }

    fn transcript(self) -> String {
        self.handle.join().unwrap()
    }
}

fn serve(stream: TcpStream, ehlo: &str, reject_rcpt: Option<&str>) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    let mut transcript = String::new();
    let mut line = String::new();

    writer.write_all(b"220 fake.example.org ESMTP\r\n").unwrap();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => transcript.push_str(&line),
        }

        let verb = line.get(..4).unwrap_or_default().to_ascii_uppercase();
        let reply = match verb.as_str() {
            "EHLO" => ehlo,
            "HELO" => "250 fake.example.org\r\n",
            "MAIL" => "250 2.1.0 Ok\r\n",
            "RCPT" if reject_rcpt.is_some_and(|address| line.contains(address)) => {
                "550 5.1.1 No such user\r\n"
            }
            "RCPT" => "250 2.1.5 Ok\r\n",
            "DATA" => {
                writer.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").unwrap();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 {
                        return transcript;
                    }
                    transcript.push_str(&line);
                    if line == ".\r\n" {
                        break;
                    }
                }
                "250 2.0.0 Queued\r\n"
            }
            "QUIT" => {
                let _ = writer.write_all(b"221 2.0.0 Bye\r\n");
                break;
            }
            _ => "502 5.5.2 Command not recognized\r\n",
        };
        if writer.write_all(reply.as_bytes()).is_err() {
            break;
        }
    }

    transcript
}

/// A port nothing listens on
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn input(port: u16, anonymous: bool, params: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "source": {
            "smtp": {
                "host": "127.0.0.1",
                "port": port.to_string(),
                "username": "ci",
                "password": "secret",
                "anonymous": anonymous,
            },
            "from": "ci@example.org",
            "to": ["a@example.org"],
        },
        "params": params,
    }))
    .unwrap()
}

fn run(source_root: &Path, input: &[u8]) -> Result<Value, Error> {
    let tokens = BuildTokens::default().with("BUILD_ID", "42");
    let connector = NetworkConnector::new(ClientId::Domain("test".to_owned()));
    let output = execute_with(source_root, "1.2.3", input, &tokens, &connector)?;
    Ok(serde_json::from_slice(&output).unwrap())
}

#[test]
fn anonymous_send() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("headers.txt"), "X-Build: ${BUILD_ID}\n").unwrap();
    fs::write(dir.path().join("to.txt"), " b@example.org \n").unwrap();

    let server = FakeServer::start(EHLO_PLAIN, None);
    let output = run(
        dir.path(),
        &input(
            server.port,
            true,
            json!({
                "subject_text": "Build ${BUILD_ID}",
                "body_text": ".hidden dot\nbye",
                "headers": "headers.txt",
                "to": "to.txt",
            }),
        ),
    )
    .unwrap();

    assert_eq!(
        server.transcript(),
        "EHLO test\r\n\
         MAIL FROM:<ci@example.org> BODY=8BITMIME\r\n\
         RCPT TO:<a@example.org>\r\n\
         RCPT TO:<b@example.org>\r\n\
         DATA\r\n\
         To: a@example.org, b@example.org\r\n\
         From: ci@example.org\r\n\
         X-Build: 42\r\n\
         Subject: Build 42\r\n\
         \r\n\
         ..hidden dot\r\n\
         bye\r\n\
         .\r\n\
         QUIT\r\n"
    );
    assert_eq!(
        output["metadata"],
        json!([
            { "name": "smtp_host", "value": "127.0.0.1" },
            { "name": "subject", "value": "Build 42" },
            { "name": "version", "value": "1.2.3" },
        ])
    );
    assert!(output["version"]["time"].is_string());
}

#[test]
fn empty_body_is_not_sent() {
    let dir = tempfile::tempdir().unwrap();

    // Nothing listens, any connection attempt would fail
    let output = run(
        dir.path(),
        &input(closed_port(), true, json!({ "subject_text": "Nothing" })),
    )
    .unwrap();

    assert_eq!(output["metadata"][1]["value"], "Nothing");
}

#[test]
fn empty_body_sent_when_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let server = FakeServer::start(EHLO_PLAIN, None);

    run(
        dir.path(),
        &input(
            server.port,
            true,
            json!({ "subject_text": "Empty", "send_empty_body": true }),
        ),
    )
    .unwrap();

    assert!(server
        .transcript()
        .ends_with("Subject: Empty\r\n\r\n.\r\nQUIT\r\n"));
}

#[test]
fn rejected_recipient() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("to.txt"), "b@example.org,c@example.org").unwrap();

    let server = FakeServer::start(EHLO_PLAIN, Some("b@example.org"));
    let err = run(
        dir.path(),
        &input(
            server.port,
            true,
            json!({ "subject_text": "Hi", "body_text": "Hello", "to": "to.txt" }),
        ),
    )
    .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Rcpt));
    assert!(err.to_string().starts_with("rcpt: "));

    let transcript = server.transcript();
    assert!(transcript.ends_with("RCPT TO:<b@example.org>\r\n"));
    assert!(!transcript.contains("c@example.org"));
    assert!(!transcript.contains("DATA"));
}

#[test]
fn unreachable_server() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(
        dir.path(),
        &input(
            closed_port(),
            true,
            json!({ "subject_text": "Hi", "body_text": "Hello" }),
        ),
    )
    .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Dial));
}

#[test]
fn starttls_not_offered() {
    let dir = tempfile::tempdir().unwrap();
    let server = FakeServer::start(EHLO_PLAIN, None);
    let err = run(
        dir.path(),
        &input(
            server.port,
            false,
            json!({ "subject_text": "Hi", "body_text": "Hello" }),
        ),
    )
    .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Auth));
    assert_eq!(
        err.to_string(),
        "auth: STARTTLS is not supported on this server"
    );
    // No credentials nor envelope on a plain connection
    assert_eq!(server.transcript(), "EHLO test\r\n");
}

#[test]
fn server_without_ehlo() {
    let dir = tempfile::tempdir().unwrap();
    let server = FakeServer::start(EHLO_UNKNOWN, None);
    run(
        dir.path(),
        &input(
            server.port,
            true,
            json!({ "subject_text": "Hi", "body_text": "Hello" }),
        ),
    )
    .unwrap();

    let transcript = server.transcript();
    assert!(transcript.starts_with(
        "EHLO test\r\n\
         HELO test\r\n\
         MAIL FROM:<ci@example.org>\r\n\
         RCPT TO:<a@example.org>\r\n\
         DATA\r\n"
    ));
    assert!(transcript.ends_with("Hello\r\n.\r\nQUIT\r\n"));
}

#[test]
fn missing_headers_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(
        dir.path(),
        &input(
            closed_port(),
            true,
            json!({ "subject_text": "Hi", "body_text": "Hello", "headers": "headers.txt" }),
        ),
    )
    .unwrap_err();

    match err {
        Error::Read { path, .. } => assert_eq!(path, dir.path().join("headers.txt")),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn missing_source_root() {
    let err = execute(Path::new(""), "1.2.3", b"{}").unwrap_err();
    assert!(matches!(err, Error::MissingSourceRoot));
    assert_eq!(
        err.to_string(),
        "expected path to build sources as first argument"
    );
}

#[test]
fn invalid_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let err = execute(dir.path(), "1.2.3", br#"{"source": {"smtp": {"host": "h"}}}"#)
        .unwrap_err();
    assert!(err.is_config());
    assert_eq!(
        err.to_string(),
        r#"missing required field "source.smtp.port""#
    );

    let err = execute(dir.path(), "1.2.3", b"not json").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}
