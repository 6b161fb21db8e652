use std::net::{Ipv4Addr, SocketAddr};

use anyhow::anyhow;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answers one connection per canned response, in order, and records what it
/// was asked.
pub(crate) struct CannedServer {
    addr: SocketAddr,
    handle: JoinHandle<anyhow::Result<Vec<RecordedRequest>>>,
}

impl CannedServer {
    pub(crate) async fn start(responses: Vec<(u16, &'static str)>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let mut requests = vec![];
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await?;
                requests.push(Self::read_request(&mut stream).await?);
                let response = format!(
                    "HTTP/1.1 {} CANNED\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body,
                );
                stream.write_all(response.as_bytes()).await?;
                let _ = stream.shutdown().await;
            }
            Ok::<_, anyhow::Error>(requests)
        });
        Ok(Self { addr, handle })
    }

    pub(crate) fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Waits until every canned response was served.
    pub(crate) async fn requests(self) -> anyhow::Result<Vec<RecordedRequest>> {
        self.handle.await?
    }

    async fn read_request(stream: &mut TcpStream) -> anyhow::Result<RecordedRequest> {
        let mut buf = vec![];
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos;
            }
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(anyhow!("connection closed before request head"));
            }
            buf.extend_from_slice(&chunk[..n]);
        };
        let head = String::from_utf8(buf[..head_end].to_vec())?;
        let mut lines = head.split("\r\n");
        let line = lines.next().unwrap_or_default().to_string();
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect::<Vec<_>>();
        let content_length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.parse::<usize>())
            .transpose()?
            .unwrap_or(0);
        let mut body = buf[head_end + 4..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok(RecordedRequest {
            line,
            headers,
            body: String::from_utf8(body)?,
        })
    }
}
