#![cfg(feature = "cli")]

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thales_frame::{
    decode_handshake_header, TelegramReader, TelegramWriter, APP_CONTROL, CONTROL,
    DISCONNECT_PAYLOAD, HANDSHAKE_HEADER_SIZE, REMOTE_SCRIPT,
};

/// What a fake Term saw during one session.
#[derive(Debug, Default)]
struct Transcript {
    session: String,
    requests: Vec<(u8, String)>,
    disconnected: bool,
}

struct FakeTerm {
    port: u16,
    server: JoinHandle<Transcript>,
}

impl FakeTerm {
    /// Serve one session, answering each request with `respond(request)`.
    fn start(respond: impl Fn(&str) -> Option<String> + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();
        let server = thread::spawn(move || match accept(&listener) {
            Some(stream) => serve(stream, respond),
            None => Transcript::default(),
        });
        Self { port, server }
    }

    fn transcript(self) -> Transcript {
        self.server.join().expect("fake term should not panic")
    }
}

fn accept(listener: &TcpListener) -> Option<TcpStream> {
    listener.set_nonblocking(true).ok()?;
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).ok()?;
                return Some(stream);
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return None,
        }
    }
    None
}

fn serve(mut stream: TcpStream, respond: impl Fn(&str) -> Option<String>) -> Transcript {
    let mut transcript = Transcript::default();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .expect("read timeout");

    let mut header = [0u8; HANDSHAKE_HEADER_SIZE];
    if stream.read_exact(&mut header).is_err() {
        return transcript;
    }
    let mut name = vec![0u8; decode_handshake_header(&header).name_len as usize];
    if stream.read_exact(&mut name).is_err() {
        return transcript;
    }
    transcript.session = String::from_utf8_lossy(&name).into_owned();

    let mut reader = TelegramReader::new(stream.try_clone().expect("clone"));
    let mut writer = TelegramWriter::new(stream);
    loop {
        let telegram = match reader.read_telegram() {
            Ok(telegram) => telegram,
            Err(_) => break,
        };
        if telegram.message_type() == CONTROL {
            transcript.disconnected = telegram.payload().as_ref() == DISCONNECT_PAYLOAD;
            break;
        }
        let text = telegram.text().into_owned();
        transcript.requests.push((telegram.message_type(), text.clone()));
        if let Some(reply) = respond(&text) {
            if writer.send(REMOTE_SCRIPT, reply.as_bytes()).is_err() {
                break;
            }
        }
    }
    transcript
}

fn bare_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_thales-remote"));
    command
        .env_remove("THALES_HOST")
        .env_remove("THALES_PORT")
        .env_remove("THALES_SESSION")
        .args([
            "--settle-delay",
            "0ms",
            "--session-setup-delay",
            "0ms",
            "--log-level",
            "error",
            "--format",
            "json",
        ]);
    command
}

fn thales(port: u16, args: &[&str]) -> Output {
    bare_command()
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(args)
        .output()
        .expect("thales-remote should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

fn texts(transcript: &Transcript) -> Vec<&str> {
    transcript
        .requests
        .iter()
        .map(|(_, text)| text.as_str())
        .collect()
}

fn instrument(request: &str) -> Option<String> {
    let reply = match request {
        "1:POTENTIAL:" => "potential= 1.5e-1V:",
        "1:CURRENT:" => "current=-2.5e-6A:",
        "1:IMPEDANCE:" => "impedance=3.0,-4.0:",
        _ => "ok:",
    };
    Some(reply.to_string())
}

#[test]
fn query_prints_reply_and_disconnects() {
    let term = FakeTerm::start(instrument);
    let output = thales(term.port, &["query", "POTENTIAL"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["command"], "POTENTIAL");
    assert_eq!(lines[0]["reply"], "potential= 1.5e-1V:");

    let transcript = term.transcript();
    assert_eq!(transcript.session, "ScriptRemote");
    assert_eq!(
        transcript.requests,
        vec![(REMOTE_SCRIPT, "1:POTENTIAL:".to_string())]
    );
    assert!(transcript.disconnected);
}

#[test]
fn measure_reports_potential_and_current() {
    let term = FakeTerm::start(instrument);
    let output = thales(term.port, &["measure"]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["potential_v"], 0.15);
    assert_eq!(lines[0]["current_a"], -2.5e-6);

    let transcript = term.transcript();
    assert_eq!(texts(&transcript), vec!["1:POTENTIAL:", "1:CURRENT:"]);
}

#[test]
fn force_remote_script_is_sent_first() {
    let term = FakeTerm::start(instrument);
    let output = thales(term.port, &["--force-remote-script", "measure"]);

    assert!(output.status.success());
    let transcript = term.transcript();
    assert_eq!(
        transcript.requests[0],
        (APP_CONTROL, "<\x02>,ScriptRemote".to_string())
    );
    assert_eq!(transcript.requests.len(), 3);
}

#[test]
fn impedance_applies_excitation_then_measures() {
    let term = FakeTerm::start(instrument);
    let output = thales(
        term.port,
        &["impedance", "--frequency", "2000", "--amplitude", "0.01", "--periods", "3"],
    );

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["frequency_hz"], 2000.0);
    assert_eq!(lines[0]["magnitude_ohm"], 5.0);

    let transcript = term.transcript();
    assert_eq!(
        texts(&transcript),
        vec!["1:Ampl=10:", "1:Nw=3:", "1:Frq=2000:", "1:IMPEDANCE:"]
    );
    assert!(transcript.disconnected);
}

#[test]
fn spectrum_sweeps_from_high_to_low() {
    let term = FakeTerm::start(instrument);
    let output = thales(
        term.port,
        &["spectrum", "--lower", "10", "--upper", "1000", "--points", "3"],
    );

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["frequency_hz"], 1000.0);
    assert_eq!(lines[2]["frequency_hz"], 10.0);

    let transcript = term.transcript();
    let sent = texts(&transcript);
    assert_eq!(sent.len(), 6);
    assert_eq!(sent[0], "1:Frq=1000:");
    assert_eq!(sent[4], "1:Frq=10:");
    assert_eq!(
        sent.iter().filter(|text| **text == "1:IMPEDANCE:").count(),
        3
    );
}

#[test]
fn silent_term_times_out_with_124() {
    let term = FakeTerm::start(|_| None);
    let output = thales(term.port, &["--reply-timeout", "200ms", "query", "POTENTIAL"]);

    assert_eq!(output.status.code(), Some(124));
    assert!(term.transcript().disconnected);
}

#[test]
fn unparseable_reply_is_data_invalid() {
    let term = FakeTerm::start(|_| Some("ERROR:unknown:".to_string()));
    let output = thales(term.port, &["measure"]);

    assert_eq!(output.status.code(), Some(60));
    assert!(term.transcript().disconnected);
}

#[test]
fn refused_connection_exits_1() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let output = thales(port, &["measure"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn missing_host_is_usage_error() {
    let output = bare_command()
        .arg("measure")
        .output()
        .expect("thales-remote should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn environment_supplies_target() {
    let term = FakeTerm::start(instrument);
    let output = bare_command()
        .env("THALES_HOST", "127.0.0.1")
        .env("THALES_PORT", term.port.to_string())
        .env("THALES_SESSION", "EnvSession")
        .args(["query", "CURRENT"])
        .output()
        .expect("thales-remote should run");

    assert!(output.status.success());
    let transcript = term.transcript();
    assert_eq!(transcript.session, "EnvSession");
    assert_eq!(texts(&transcript), vec!["1:CURRENT:"]);
}

#[test]
fn version_prints_name() {
    let output = Command::new(env!("CARGO_BIN_EXE_thales-remote"))
        .args(["version", "--extended"])
        .output()
        .expect("thales-remote should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: thales-remote"));
    assert!(stdout.contains("term_port: 260"));
    assert!(stdout.contains("protocol_version: 02 D0"));
}
