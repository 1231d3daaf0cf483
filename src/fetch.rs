use crate::errors::SetupError;
use reqwest::blocking::Client;
use std::io::Read;

/// Bounded so progress callbacks fire often enough to keep the status line
/// moving without flooding the interface with redraws.
const CHUNK_SIZE: usize = 8192;

/// Streamed GET of `url`, fully buffered in memory. `on_progress` is invoked
/// after each received chunk with the byte count so far and the total from
/// the Content-Length header, if the server sent one. Transport errors and
/// non-success statuses come back as `SetupError::Network`; no partial
/// buffer escapes on failure.
pub fn fetch(
    client: &Client,
    url: &str,
    on_progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<Vec<u8>, SetupError> {
    let mut resp = client
        .get(url)
        .send()
        .map_err(|e| SetupError::Network(format!("GET {url}: {e}")))?;
    if !resp.status().is_success() {
        return Err(SetupError::Network(format!(
            "GET {url} returned status {}",
            resp.status()
        )));
    }

    let total = resp.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = resp
            .read(&mut chunk)
            .map_err(|e| SetupError::Network(format!("reading body of {url}: {e}")))?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        on_progress(buf.len() as u64, total);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    /// One-shot HTTP server on a loopback port; answers every connection
    /// with the canned response and then shuts down.
    fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut discard = [0u8; 2048];
                let _ = stream.read(&mut discard);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/archive.zip")
    }

    #[test]
    fn success_buffers_body_and_reports_progress() {
        let url = serve("HTTP/1.1 200 OK\r\nContent-Length: 11\r\nConnection: close\r\n\r\nhello world");
        let client = Client::new();
        let mut seen = Vec::new();
        let body = fetch(&client, &url, &mut |done, total| seen.push((done, total))).unwrap();
        assert_eq!(body, b"hello world");
        assert_eq!(seen.last(), Some(&(11, Some(11))));
    }

    #[test]
    fn non_success_status_is_a_network_error() {
        let url = serve("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let client = Client::new();
        let mut calls = 0u32;
        let err = fetch(&client, &url, &mut |_, _| calls += 1).unwrap_err();
        match err {
            SetupError::Network(msg) => assert!(msg.contains("404")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls, 0, "no progress reported for a failed request");
    }

    #[test]
    fn connection_refused_is_a_network_error() {
        // Bind then drop to get a port nothing is listening on.
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = Client::new();
        let err = fetch(&client, &format!("http://{addr}/x"), &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, SetupError::Network(_)));
    }
}
