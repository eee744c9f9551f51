//! Process-level tests of the service binary.
#![cfg(unix)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

const BIN: &str = env!("CARGO_BIN_EXE_service-skeleton");

fn free_port() -> u16 {
    TcpListener::bind("0.0.0.0:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn(port: &str) -> Child {
    Command::new(BIN)
        .env("PORT", port)
        .env("APP_ENV", "test")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CONFIG_PATH")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

/// Block until stdout contains `needle`.
fn wait_for_output(child: &mut Child, needle: &'static str) {
    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if line.contains(needle) {
                let _ = tx.send(());
            }
        }
    });
    rx.recv_timeout(Duration::from_secs(15))
        .unwrap_or_else(|_| panic!("timed out waiting for {needle:?}"));
}

/// Plain HTTP/1.1 `GET /ready`; true on a 200.
fn ready_over_http(port: u16) -> bool {
    let Ok(mut stream) = TcpStream::connect(("127.0.0.1", port)) else {
        return false;
    };
    let request = "GET /ready HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
    if stream.write_all(request.as_bytes()).is_err() {
        return false;
    }
    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);
    response.starts_with("HTTP/1.1 200")
}

fn wait_exit_code(child: &mut Child) -> Option<i32> {
    for _ in 0..150 {
        if let Some(status) = child.try_wait().unwrap() {
            return status.code();
        }
        thread::sleep(Duration::from_millis(100));
    }
    let _ = child.kill();
    panic!("process did not exit");
}

#[test]
fn test_sigterm_exits_cleanly() {
    let port = free_port();
    let mut child = spawn(&port.to_string());
    wait_for_output(&mut child, "Server listening");

    assert!(ready_over_http(port));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
    assert_eq!(wait_exit_code(&mut child), Some(0));
}

#[test]
fn test_sigint_exits_cleanly() {
    let port = free_port();
    let mut child = spawn(&port.to_string());
    wait_for_output(&mut child, "Server listening");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
    assert_eq!(wait_exit_code(&mut child), Some(0));
}

#[test]
fn test_sighup_exits_cleanly() {
    let port = free_port();
    let mut child = spawn(&port.to_string());
    wait_for_output(&mut child, "Server listening");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGHUP).unwrap();
    assert_eq!(wait_exit_code(&mut child), Some(0));
}

#[test]
fn test_port_in_use_exits_with_failure() {
    let holder = TcpListener::bind("0.0.0.0:0").unwrap();
    let port = holder.local_addr().unwrap().port();

    let mut child = spawn(&port.to_string());
    assert_eq!(wait_exit_code(&mut child), Some(1));

    let mut output = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut output)
        .unwrap();
    assert!(
        output.contains(&format!("Port {port} is already in use")),
        "missing port conflict message in {output:?}"
    );
}

#[test]
fn test_invalid_environment_exits_with_failure() {
    let mut child = spawn("not-a-port");
    assert_eq!(wait_exit_code(&mut child), Some(1));
}
