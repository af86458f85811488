//! Line-delimited JSON transport
//!
//! Each request is one JSON object on its own line:
//!
//!   {"request_id": "1", "method": "ListRepositories", "args": []}
//!
//! and is answered by exactly one response line, in request order per
//! connection. Blank lines are skipped. A line that is not a valid request
//! envelope gets an `INVALID_REQUEST` response; the connection stays open.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use apk_protocol::{RpcError, RpcRequest, RpcResponse};
use tracing::{debug, warn};

use crate::mock::MockPackageService;

#[cfg(unix)]
mod socket;

#[cfg(unix)]
pub use socket::SocketServer;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cloneable stop flag shared with the accept loop and the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serve requests from `reader` until EOF. Returns the number of
/// responses written.
pub fn serve_connection<R: BufRead, W: Write>(
    service: &MockPackageService,
    mut reader: R,
    mut writer: W,
) -> Result<usize, ServerError> {
    let mut answered = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = trim_line(&buf);
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_slice::<RpcRequest>(line) {
            Ok(request) => service.handle_request(&request),
            Err(e) => {
                debug!(error = %e, "malformed request line");
                RpcResponse::error(
                    String::new(),
                    RpcError::invalid_request(format!("Invalid JSON: {}", e)),
                )
            }
        };
        write_response(&mut writer, &response)?;
        answered += 1;
    }
    Ok(answered)
}

/// Serve a single client on stdin/stdout.
pub fn serve_stdio(service: &MockPackageService) -> Result<usize, ServerError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let answered = serve_connection(service, stdin.lock(), stdout.lock())?;
    debug!(answered, "stdin closed");
    Ok(answered)
}

/// Strip surrounding ASCII whitespace, including the trailing newline.
fn trim_line(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn write_response<W: Write>(writer: &mut W, response: &RpcResponse) -> Result<(), ServerError> {
    let json = serde_json::to_string(response)?;
    if let Err(e) = writeln!(writer, "{}", json).and_then(|_| writer.flush()) {
        warn!(error = %e, request_id = %response.request_id, "failed to write response");
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apk_protocol::{ApiVersion, ErrorCode};
    use std::io::Cursor;

    fn run(service: &MockPackageService, input: &str) -> Vec<RpcResponse> {
        let mut output = Vec::new();
        serve_connection(service, Cursor::new(input.as_bytes()), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_responses_in_request_order() {
        let service = MockPackageService::new(ApiVersion::V2);
        let input = concat!(
            r#"{"request_id":"1","method":"ListRepositories"}"#,
            "\n\n",
            r#"{"request_id":"2","method":"GetPackagesDetails","args":[["ghost"],511]}"#,
            "\n",
        );
        let responses = run(&service, input);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].request_id, "1");
        assert!(responses[0].ok);
        assert_eq!(responses[1].request_id, "2");
        assert_eq!(
            responses[1].result.as_ref().unwrap()[0]["error"],
            "pkg not found!"
        );
    }

    #[test]
    fn test_malformed_line_keeps_connection() {
        let service = MockPackageService::new(ApiVersion::V1);
        let input = "not json\n{\"request_id\":\"ok\",\"method\":\"ListRepositories\"}\n";
        let responses = run(&service, input);
        assert_eq!(responses.len(), 2);
        assert!(!responses[0].ok);
        assert_eq!(responses[0].error.as_ref().unwrap().code, ErrorCode::InvalidRequest);
        assert!(responses[1].ok);
    }

    #[test]
    fn test_invalid_utf8_line_keeps_connection() {
        let service = MockPackageService::new(ApiVersion::V2);
        let mut input = b"{\"request_id\":\"bad\",\"method\":\"Add\xffRepository\"}\n".to_vec();
        input.extend_from_slice(b"{\"request_id\":\"good\",\"method\":\"ListRepositories\"}\n");

        let mut output = Vec::new();
        let answered = serve_connection(&service, Cursor::new(input), &mut output).unwrap();
        assert_eq!(answered, 2);

        let responses: Vec<RpcResponse> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses[0].error.as_ref().unwrap().code, ErrorCode::InvalidRequest);
        assert!(responses[1].ok);
        assert_eq!(responses[1].request_id, "good");
    }

    #[test]
    fn test_trim_line() {
        assert_eq!(trim_line(b"  {}\r\n"), b"{}");
        assert_eq!(trim_line(b" \t\n"), b"");
        assert_eq!(trim_line(b""), b"");
    }

    #[test]
    fn test_last_line_without_newline() {
        let service = MockPackageService::new(ApiVersion::V1);
        let responses = run(&service, r#"{"request_id":"tail","method":"ListRepositories"}"#);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].request_id, "tail");
    }

    #[test]
    fn test_unknown_method_response() {
        let service = MockPackageService::new(ApiVersion::V1);
        let input = concat!(
            r#"{"request_id":"x","method":"SearchFilesOwners","args":[[],1]}"#,
            "\n",
        );
        let responses = run(&service, input);
        let error = responses[0].error.as_ref().unwrap();
        assert_eq!(error.code, ErrorCode::UnknownMethod);
    }

    #[test]
    fn test_shutdown_handle_shared() {
        let handle = ShutdownHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_requested());
        handle.request();
        assert!(clone.is_requested());
    }
}
