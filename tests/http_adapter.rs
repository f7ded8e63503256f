use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use solvra_bridge::builtins::HTTP_CLASS;
use solvra_bridge::{BridgeConfig, BridgeContext, ErrorKind, ScriptValue};

struct OneShot {
    base: String,
    request: JoinHandle<String>,
}

/// Serve exactly one HTTP response and hand back the raw request text.
fn serve_once(status_line: &'static str, body: &'static str) -> OneShot {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let request = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_request(&stream);
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write");
        request
    });
    OneShot {
        base: format!("http://{addr}"),
        request,
    }
}

fn read_request(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    let mut head = String::new();
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).expect("read line");
        if read == 0 || line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    let length = head
        .lines()
        .find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix("content-length:")
                .and_then(|value| value.trim().parse::<usize>().ok())
        })
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).expect("read body");
    head + &String::from_utf8_lossy(&body)
}

fn context() -> BridgeContext {
    BridgeContext::new(BridgeConfig::default())
}

#[test]
fn get_without_path_requests_root() {
    let server = serve_once("200 OK", "hello");
    let mut ctx = context();
    let result = ctx.call_class_method(HTTP_CLASS, "get", &[server.base.clone().into()]);
    assert_eq!(result, ScriptValue::from("hello"));

    let request = server.request.join().expect("server");
    assert!(request.starts_with("GET / HTTP/1.1"), "{request}");
    assert!(
        request.to_ascii_lowercase().contains("user-agent: solvra-bridge/"),
        "{request}"
    );
}

#[test]
fn get_injects_leading_slash() {
    let server = serve_once("200 OK", "foo body");
    let mut ctx = context();
    let result = ctx.call_class_method(
        HTTP_CLASS,
        "get",
        &[server.base.clone().into(), "foo".into()],
    );
    assert_eq!(result, ScriptValue::from("foo body"));
    let request = server.request.join().expect("server");
    assert!(request.starts_with("GET /foo HTTP/1.1"), "{request}");
}

// Non-2xx responses are content, not errors. This permissiveness is intentional.
#[test]
fn non_success_status_returns_body() {
    let server = serve_once("404 Not Found", "missing");
    let mut ctx = context();
    let result = ctx.call_class_method(
        HTTP_CLASS,
        "get",
        &[server.base.clone().into(), "/nope".into()],
    );
    assert_eq!(result, ScriptValue::from("missing"));
    server.request.join().expect("server");

    let server = serve_once("500 Internal Server Error", "boom");
    let result = ctx.call_class_method(
        HTTP_CLASS,
        "post",
        &[server.base.clone().into(), "text/plain".into(), "x".into()],
    );
    assert_eq!(result, ScriptValue::from("boom"));
    server.request.join().expect("server");
}

#[test]
fn post_sends_content_type_and_body() {
    let server = serve_once("201 Created", "created");
    let mut ctx = context();
    let url = format!("{}/items", server.base);
    let result = ctx.call_class_method(
        HTTP_CLASS,
        "post",
        &[url.into(), "application/json".into(), "{\"name\":\"solvra\"}".into()],
    );
    assert_eq!(result, ScriptValue::from("created"));

    let request = server.request.join().expect("server");
    assert!(request.starts_with("POST /items HTTP/1.1"), "{request}");
    assert!(
        request
            .to_ascii_lowercase()
            .contains("content-type: application/json"),
        "{request}"
    );
    assert!(request.ends_with("{\"name\":\"solvra\"}"), "{request}");
}

#[test]
fn post_argument_count_is_checked() {
    let mut ctx = context();
    let two = ctx.call_class_method(
        HTTP_CLASS,
        "post",
        &["http://127.0.0.1:9".into(), "text/plain".into()],
    );
    let err = two.as_error().expect("error");
    assert_eq!(err.kind, ErrorKind::ArgumentError);
    assert_eq!(err.message, "Expect 3 arguments. got=2");

    let four = ctx.call_class_method(
        HTTP_CLASS,
        "post",
        &["a".into(), "b".into(), "c".into(), "d".into()],
    );
    assert_eq!(
        four.as_error().map(|err| err.message.as_str()),
        Some("Expect 3 arguments. got=4")
    );
}

#[test]
fn transport_failure_is_recoverable() {
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let mut ctx = context();
    let result = ctx.call_class_method(HTTP_CLASS, "get", &[format!("http://{closed}").into()]);
    let err = result.as_error().expect("error");
    assert_eq!(err.kind, ErrorKind::InternalError);
    assert!(!err.message.is_empty());

    // The calling thread keeps working after the failure.
    let server = serve_once("200 OK", "still alive");
    let result = ctx.call_class_method(HTTP_CLASS, "get", &[server.base.clone().into()]);
    assert_eq!(result, ScriptValue::from("still alive"));
    server.request.join().expect("server");
}

#[test]
fn unknown_http_method_is_name_error() {
    let mut ctx = context();
    let result = ctx.call_class_method(HTTP_CLASS, "put", &["http://x".into()]);
    assert_eq!(result.as_error().map(|err| err.kind), Some(ErrorKind::NameError));
}
