//! A minimal HTTP/1.1 upstream on a local port.
//!
//! Each connection carries one request and is closed after the answer. The
//! handler sees the zero-based request number and the request target
//! (`/?latitude=..`), and returns a status code and a JSON body.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

type Handler = dyn Fn(usize, &str) -> (u16, String) + Send + Sync;

pub struct StubUpstream {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubUpstream {
    pub fn start<H>(handler: H) -> Self
    where
        H: Fn(usize, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub upstream");
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let seen = Arc::clone(&seen);
                let handler = Arc::clone(&handler);
                thread::spawn(move || serve(stream, &seen, handler.as_ref()));
            }
        });

        Self { addr, requests }
    }

    /// Always answers with the same status and body.
    pub fn constant(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::start(move |_, _| (status, body.clone()))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request targets in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn serve(stream: TcpStream, seen: &Mutex<Vec<String>>, handler: &Handler) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => {}
        }
    }

    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    let hit = {
        let mut seen = seen.lock().unwrap();
        seen.push(target.clone());
        seen.len() - 1
    };

    let (status, body) = handler(hit, &target);
    let response = format!(
        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Value of `key` in a request target's query string.
pub fn query_value<'a>(target: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// A `{"places": [...]}` body with one minimal place record per id.
pub fn places_body(ids: &[i64]) -> String {
    let places: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "wof:id": id,
                "wof:name": format!("place {id}"),
                "wof:placetype": "region",
                "mz:latitude": 37.0,
                "mz:longitude": -122.0,
            })
        })
        .collect();
    serde_json::json!({ "places": places }).to_string()
}
