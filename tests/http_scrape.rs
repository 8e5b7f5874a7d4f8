// tests/http_scrape.rs
//
// End-to-end scrapes against a throwaway HTTP server on localhost.
//
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use page_scrape::{
    start_scrape, AsyncRunner, Fetch, FetchConfig, HttpFetcher, NetworkError, Outcome, Pipeline,
    ScrapeError, ScrapeHandle, ValidationError,
};

/// Serve canned responses by path; report each request head on `seen`.
fn serve(routes: Vec<(&'static str, Vec<u8>)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (seen_tx, seen_rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let head = read_head(&stream);
            let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
            let _ = seen_tx.send(head);

            let reply = routes
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| response(404, "Not Found", "<h1>missing</h1>"));
            let mut stream = stream;
            let _ = stream.write_all(&reply);
        }
    });

    (base, seen_rx)
}

fn read_head(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
        }
    }
    head
}

fn response(status: u16, reason: &str, body: &str) -> Vec<u8> {
    encoded_response(status, reason, "utf-8", body.as_bytes())
}

fn encoded_response(status: u16, reason: &str, charset: &str, body: &[u8]) -> Vec<u8> {
    let mut bytes = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/html; charset={charset}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

fn redirect(location: &str) -> Vec<u8> {
    format!("HTTP/1.1 302 Found\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        .into_bytes()
}

fn fast_runner() -> AsyncRunner {
    let config = FetchConfig {
        timeout_secs: 5,
        ..FetchConfig::default()
    };
    AsyncRunner::new(Pipeline::new(HttpFetcher::new(&config)))
}

fn wait_for(handle: &mut ScrapeHandle) -> Outcome {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(outcome) = handle.try_take() {
            return outcome;
        }
        assert!(Instant::now() < deadline, "no outcome within 10s");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn scrape_by_selector_over_http() {
    let page = r#"<html><body><a href="/one">First</a><a href="/two">Second</a><a>Third</a></body></html>"#;
    let (base, _seen) = serve(vec![("/links", response(200, "OK", page))]);

    let runner = fast_runner();
    let mut handle = start_scrape(&runner, &format!("{base}/links"), Some("a"), "href", false).unwrap();

    let results = wait_for(&mut handle).into_result().unwrap();
    let rows: Vec<(usize, &str, &str, &str)> = results
        .iter()
        .map(|r| (r.index, r.value.as_str(), r.attribute.as_str(), r.snippet.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, "/one", "href", "First"),
            (2, "/two", "href", "Second"),
            (3, "", "href", "Third"),
        ]
    );
    assert!(handle.try_take().is_none());
}

#[test]
fn scrape_full_page_over_http() {
    let (base, _seen) = serve(vec![("/", response(200, "OK", "<div> Hello <span>World</span></div>"))]);

    let runner = fast_runner();
    let mut handle = start_scrape(&runner, &format!("{base}/"), None, "text", true).unwrap();

    let results = wait_for(&mut handle).into_result().unwrap();
    let values: Vec<&str> = results.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, vec!["Hello", "World"]);
}

#[test]
fn not_found_is_network_failure() {
    let (base, _seen) = serve(vec![]);

    let runner = fast_runner();
    let url = format!("{base}/gone");
    let mut handle = start_scrape(&runner, &url, Some("p"), "text", false).unwrap();

    match wait_for(&mut handle) {
        Outcome::Failure(err) => {
            assert_eq!(err, ScrapeError::Network(NetworkError::Status { url, status: 404 }));
            assert!(err.to_string().starts_with("NetworkError: "));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn redirects_are_followed() {
    let (base, _seen) = serve(vec![
        ("/old", redirect("/new")),
        ("/new", response(200, "OK", "<p>moved</p>")),
    ]);

    let results = HttpFetcher::new(&FetchConfig::default())
        .fetch(&format!("{base}/old"))
        .unwrap();
    assert!(results.contains("<p>moved</p>"));
}

#[test]
fn declared_charset_is_decoded() {
    let (base, _seen) = serve(vec![(
        "/latin1",
        encoded_response(200, "OK", "iso-8859-1", b"<p>caf\xe9</p>"),
    )]);

    let body = HttpFetcher::default().fetch(&format!("{base}/latin1")).unwrap();
    assert_eq!(body, "<p>caf\u{e9}</p>");

    let runner = fast_runner();
    let mut handle = start_scrape(&runner, &format!("{base}/latin1"), Some("p"), "text", false).unwrap();
    let results = wait_for(&mut handle).into_result().unwrap();
    assert_eq!(results[0].value, "café");
}

#[test]
fn body_over_limit_is_body_error() {
    let page = format!("<p>{}</p>", "x".repeat(4096));
    let (base, _seen) = serve(vec![("/big", response(200, "OK", &page))]);

    let config = FetchConfig {
        max_body_bytes: 1024,
        ..FetchConfig::default()
    };
    let err = HttpFetcher::new(&config).fetch(&format!("{base}/big")).unwrap_err();
    assert!(matches!(err, NetworkError::Body { .. }));

    let body = HttpFetcher::default().fetch(&format!("{base}/big")).unwrap();
    assert_eq!(body, page);
}

#[test]
fn identifying_headers_are_sent() {
    let (base, seen) = serve(vec![("/", response(200, "OK", "<p>x</p>"))]);

    HttpFetcher::new(&FetchConfig::default()).fetch(&format!("{base}/")).unwrap();

    let head = seen.recv_timeout(Duration::from_secs(5)).unwrap().to_lowercase();
    assert!(head.starts_with("get / http/1.1"));
    assert!(head.contains("user-agent: mozilla/5.0"));
    assert!(head.contains("accept: text/html"));
    assert!(head.contains("accept-language: en-us"));
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

    let err = HttpFetcher::default().fetch(&format!("http://{addr}/")).unwrap_err();
    assert!(matches!(err, NetworkError::Transport { .. }));
}

#[test]
fn validation_happens_before_start() {
    let runner = fast_runner();
    assert_eq!(
        start_scrape(&runner, "", Some("p"), "text", false).err(),
        Some(ValidationError::MissingUrl)
    );
    assert_eq!(
        start_scrape(&runner, "http://127.0.0.1/", None, "text", false).err(),
        Some(ValidationError::MissingSelector)
    );
}
