//! Mock HTTP server for client tests.
//!
//! Accepts one connection per scripted response, records the raw request
//! and answers with a JSON body. Request heads are lower-cased.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Raw request captured by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Request line and headers, lower-cased.
    pub head: String,
    pub body: Vec<u8>,
}

/// Binds a listener on a free local port and returns it with its base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("mock server bind failed: {e}"));
    let port = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("mock server has no address: {e}"))
        .port();
    (listener, format!("http://127.0.0.1:{port}"))
}

/// Answers one request per response, in order.
pub fn serve(listener: TcpListener, responses: Vec<(u16, String)>) -> JoinHandle<Vec<Recorded>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            seen.push(read_request(&mut stream).await);

            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        seen
    })
}

/// Binds and serves static responses in one call.
pub async fn mock_server(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let (listener, url) = bind().await;
    let responses = responses
        .into_iter()
        .map(|(status, body)| (status, body.to_string()))
        .collect();
    (url, serve(listener, responses))
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Recorded {
        head,
        body: buf[header_end..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_body_and_answers_in_order() {
        let (url, handle) = mock_server(vec![(201, r#"{"ok":true}"#), (404, "{}")]).await;
        let addr = url.trim_start_matches("http://");

        let mut first = TcpStream::connect(addr).await.unwrap();
        first
            .write_all(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();
        let mut reply = String::new();
        first.read_to_string(&mut reply).await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 201"));
        assert!(reply.ends_with(r#"{"ok":true}"#));

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"GET /y HTTP/1.1\r\n\r\n").await.unwrap();
        let mut reply = String::new();
        second.read_to_string(&mut reply).await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 404"));

        let seen = handle.await.unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].head.starts_with("post /x"));
        assert_eq!(seen[0].body, b"hello");
        assert!(seen[1].body.is_empty());
    }
}
