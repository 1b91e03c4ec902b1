//! Address lookup against the postcode service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{Address, RawAddressRecord, transform_address};

pub const GENERIC_LOOKUP_ERROR: &str = "An unexpected error has occurred";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("lookup service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("lookup service returned {0} without an error message")]
    Status(u16),
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("lookup ended without a result")]
    Interrupted,
}

impl LookupError {
    /// The text shown to the user. Only messages written by the service are
    /// passed through; transport and parse details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Service { message, .. } => message.clone(),
            _ => GENERIC_LOOKUP_ERROR.to_string(),
        }
    }
}

/// Resolves a postcode and house number to candidate addresses.
pub trait AddressLookup: Send + Sync {
    fn lookup(&self, postcode: &str, house_number: &str) -> Result<Vec<Address>, LookupError>;
}

#[derive(Deserialize)]
struct SuccessBody {
    details: Vec<RawAddressRecord>,
}

#[derive(Deserialize)]
struct FailureBody {
    errormessage: Option<String>,
}

/// Turns a status code and response body into candidates or a failure.
pub fn parse_lookup_response(status: u16, body: &str) -> Result<Vec<Address>, LookupError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<FailureBody>(body)
            .ok()
            .and_then(|failure| failure.errormessage)
            .filter(|message| !message.trim().is_empty());
        return Err(match message {
            Some(message) => LookupError::Service { status, message },
            None => LookupError::Status(status),
        });
    }

    let success: SuccessBody = serde_json::from_str(body)?;
    Ok(success
        .details
        .iter()
        .enumerate()
        .map(|(index, raw)| transform_address(index, raw))
        .collect())
}

/// Blocking HTTP client for `GET /api/getAddresses`.
pub struct HttpLookupClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpLookupClient {
    /// `base_url` is like `http://localhost:3000`; a trailing slash is dropped.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/getAddresses", self.base_url)
    }
}

impl AddressLookup for HttpLookupClient {
    fn lookup(&self, postcode: &str, house_number: &str) -> Result<Vec<Address>, LookupError> {
        let url = self.endpoint();
        info!(url = %url, postcode, house_number, "looking up addresses");

        let mut response = self
            .agent
            .get(&url)
            .query("postcode", postcode)
            .query("streetnumber", house_number)
            .call()?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;

        let result = parse_lookup_response(status, &body);
        match &result {
            Ok(addresses) => info!(count = addresses.len(), "lookup complete"),
            Err(e) => warn!(error = %e, "lookup failed"),
        }
        result
    }
}

/// Parameters of one lookup submission, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub postcode: String,
    pub house_number: String,
}

/// A lookup running on a worker thread.
///
/// Poll it from the UI thread; cancelling drops the result on the worker side.
pub struct PendingLookup {
    seq: u64,
    receiver: Receiver<Result<Vec<Address>, LookupError>>,
    cancelled: Arc<AtomicBool>,
}

impl PendingLookup {
    /// Starts `request` on its own thread. `on_done` runs after a result has
    /// been sent, unless the lookup was cancelled first.
    pub fn spawn<F>(client: Arc<dyn AddressLookup>, request: LookupRequest, on_done: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let seq = request.seq;

        thread::spawn(move || {
            let result = client.lookup(&request.postcode, &request.house_number);
            if worker_cancelled.load(Ordering::Acquire) {
                debug!(seq = request.seq, "dropping result of cancelled lookup");
                return;
            }
            if sender.send(result).is_ok() {
                on_done();
            }
        });

        Self {
            seq,
            receiver,
            cancelled,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// `None` while the lookup is still running.
    pub fn poll(&self) -> Option<Result<Vec<Address>, LookupError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            // Only after cancel or a panicking lookup.
            Err(TryRecvError::Disconnected) => Some(Err(LookupError::Interrupted)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    /// Serves exactly one HTTP response and hands back the request line.
    fn one_shot_server(status_line: &str, body: &str) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            sender.send(request_line.trim_end().to_string()).unwrap();
        });

        (base_url, receiver)
    }

    struct FixedLookup(Vec<Address>);

    impl AddressLookup for FixedLookup {
        fn lookup(&self, _: &str, _: &str) -> Result<Vec<Address>, LookupError> {
            Ok(self.0.clone())
        }
    }

    fn wait_for(pending: &PendingLookup) -> Result<Vec<Address>, LookupError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = pending.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "lookup did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn success_body_maps_every_record() {
        let body = r#"{"details": [
            {"street": "Damrak", "houseNumber": "10", "postcode": "1234AB", "city": "Amsterdam"},
            {"street": "Rokin", "houseNumber": "10", "postcode": "1234AB", "city": "Amsterdam"}
        ]}"#;
        let addresses = parse_lookup_response(200, body).unwrap();
        assert_eq!(addresses.len(), 2);
        assert_ne!(addresses[0].id, addresses[1].id);
        assert_eq!(addresses[1].street, "Rokin");
    }

    #[test]
    fn null_field_in_one_record_keeps_all_candidates() {
        let body = r#"{"details": [
            {"street": "Damrak", "houseNumber": "10", "postcode": "1234AB", "city": "Amsterdam"},
            {"street": "Rokin", "houseNumber": "10", "postcode": "1234AB", "city": null}
        ]}"#;
        let addresses = parse_lookup_response(200, body).unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[1].city, "");
        assert_eq!(addresses[1].label, "Rokin 10, 1234AB");
    }

    #[test]
    fn empty_details_is_not_an_error() {
        assert!(parse_lookup_response(200, r#"{"details": []}"#).unwrap().is_empty());
    }

    #[test]
    fn failure_surfaces_service_message() {
        let err = parse_lookup_response(404, r#"{"errormessage": "Postcode not found"}"#)
            .unwrap_err();
        assert!(matches!(err, LookupError::Service { status: 404, .. }));
        assert_eq!(err.user_message(), "Postcode not found");
    }

    #[test]
    fn failure_without_message_uses_fallback() {
        let err = parse_lookup_response(500, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, LookupError::Status(500)));
        assert_eq!(err.user_message(), GENERIC_LOOKUP_ERROR);

        let err = parse_lookup_response(400, r#"{"errormessage": ""}"#).unwrap_err();
        assert_eq!(err.user_message(), GENERIC_LOOKUP_ERROR);
    }

    #[test]
    fn malformed_success_body_uses_fallback() {
        let err = parse_lookup_response(200, r#"{"results": []}"#).unwrap_err();
        assert!(matches!(err, LookupError::Json(_)));
        assert_eq!(err.user_message(), GENERIC_LOOKUP_ERROR);
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = HttpLookupClient::new("http://localhost:3000/", Duration::from_secs(1));
        assert_eq!(client.endpoint(), "http://localhost:3000/api/getAddresses");
    }

    #[test]
    fn http_lookup_sends_query_and_parses_details() {
        let (base_url, request_line) = one_shot_server(
            "200 OK",
            r#"{"details": [{"street": "Damrak", "houseNumber": "10", "postcode": "1234AB", "city": "Amsterdam"}]}"#,
        );
        let client = HttpLookupClient::new(&base_url, Duration::from_secs(5));

        let addresses = client.lookup("1234AB", "10").unwrap();

        assert_eq!(
            request_line.recv().unwrap(),
            "GET /api/getAddresses?postcode=1234AB&streetnumber=10 HTTP/1.1"
        );
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].label, "Damrak 10, 1234AB Amsterdam");
    }

    #[test]
    fn http_lookup_reads_error_body_on_failure_status() {
        let (base_url, _request_line) =
            one_shot_server("404 Not Found", r#"{"errormessage": "Postcode not found"}"#);
        let client = HttpLookupClient::new(&base_url, Duration::from_secs(5));

        let err = client.lookup("0000XX", "1").unwrap_err();

        assert_eq!(err.user_message(), "Postcode not found");
    }

    #[test]
    fn unreachable_service_uses_fallback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let client = HttpLookupClient::new(&base_url, Duration::from_secs(2));

        let err = client.lookup("1234AB", "10").unwrap_err();

        assert!(matches!(err, LookupError::Http(_)));
        assert_eq!(err.user_message(), GENERIC_LOOKUP_ERROR);
    }

    #[test]
    fn pending_lookup_delivers_result_and_notifies() {
        let address = Address::new(
            "0".into(),
            "1234AB".into(),
            "10".into(),
            "Damrak".into(),
            "Amsterdam".into(),
        );
        let client: Arc<dyn AddressLookup> = Arc::new(FixedLookup(vec![address.clone()]));
        let (notify_tx, notify_rx) = mpsc::channel();
        let request = LookupRequest {
            seq: 7,
            postcode: "1234AB".into(),
            house_number: "10".into(),
        };

        let pending = PendingLookup::spawn(client, request, move || {
            notify_tx.send(()).unwrap();
        });

        assert_eq!(pending.seq(), 7);
        assert_eq!(wait_for(&pending).unwrap(), vec![address]);
        notify_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
