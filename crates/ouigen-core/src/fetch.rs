//! Conditional HTTP fetching of the remote registry.
//!
//! Requests carry the stored validators (`If-None-Match` and
//! `If-Modified-Since`) so an unchanged registry costs one round trip and no
//! body transfer. The fetcher owns transfer decoding: it advertises gzip and
//! deflate and unwraps whichever the server applied, handing the caller a
//! plain-text payload stream.

use std::{io::Read, sync::LazyLock};

use flate2::read::{GzDecoder, ZlibDecoder};
use tracing::debug;
use ureq::{
    http::{
        header::{ACCEPT_ENCODING, IF_MODIFIED_SINCE, IF_NONE_MATCH},
        StatusCode,
    },
    Agent,
};
use url::Url;

use crate::{
    error::{OuigenError, Result},
    validators::{Validators, ETAG, LAST_MODIFIED},
};

static AGENT: LazyLock<Agent> = LazyLock::new(|| {
    Agent::config_builder()
        .user_agent(concat!("ouigen/", env!("CARGO_PKG_VERSION")))
        .build()
        .into()
});

/// Result of a conditional fetch.
pub enum FetchOutcome {
    /// The remote content is unchanged; keep using the existing cache.
    NotModified,
    /// New content was received. `payload` is the decoded (plain-text) body
    /// stream and `validators` the full response header set to store with it.
    Updated {
        validators: Validators,
        payload: Box<dyn Read>,
    },
}

impl std::fmt::Debug for FetchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchOutcome::NotModified => f.write_str("NotModified"),
            FetchOutcome::Updated { validators, .. } => f
                .debug_struct("Updated")
                .field("validators", validators)
                .finish_non_exhaustive(),
        }
    }
}

/// Issues a conditional GET for `url` using the stored `validators`.
///
/// Redirects are followed transparently by the agent. A 304 yields
/// [`FetchOutcome::NotModified`] without consuming the body; any success
/// status yields [`FetchOutcome::Updated`] with the body routed through a
/// gzip or zlib decoder according to its `Content-Encoding`. All response
/// headers are recorded as the new validator set, one value per name.
///
/// Failures leave any existing cache untouched: a malformed URL is
/// [`OuigenError::InvalidUrl`], network and status errors are
/// [`OuigenError::NetworkFailure`].
pub fn fetch(url: &str, validators: &Validators) -> Result<FetchOutcome> {
    Url::parse(url).map_err(|err| {
        OuigenError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        }
    })?;

    let mut req = AGENT.get(url).header(ACCEPT_ENCODING, "gzip, deflate");
    if let Some(etag) = validators.etag() {
        req = req.header(IF_NONE_MATCH, etag);
    }
    if let Some(last_modified) = validators.last_modified() {
        req = req.header(IF_MODIFIED_SINCE, last_modified);
    }

    let resp = req.call().map_err(|err| {
        OuigenError::NetworkFailure {
            url: url.to_string(),
            reason: err.to_string(),
        }
    })?;

    if resp.status() == StatusCode::NOT_MODIFIED {
        return Ok(FetchOutcome::NotModified);
    }
    if !resp.status().is_success() {
        return Err(OuigenError::NetworkFailure {
            url: url.to_string(),
            reason: format!("unexpected status {}", resp.status()),
        });
    }

    let mut fresh = Validators::new();
    for (name, value) in resp.headers() {
        if let Ok(value) = value.to_str() {
            fresh.insert(name.as_str(), value);
        }
    }
    debug!(
        "Fetched {url} (etag: {:?}, last-modified: {:?})",
        fresh.get(ETAG),
        fresh.get(LAST_MODIFIED)
    );

    let encoding = fresh
        .get("content-encoding")
        .unwrap_or_default()
        .to_ascii_lowercase();
    let body = resp.into_body().into_reader();
    let payload: Box<dyn Read> = match encoding.as_str() {
        "gzip" => Box::new(GzDecoder::new(body)),
        "deflate" => Box::new(ZlibDecoder::new(body)),
        _ => Box::new(body),
    };

    Ok(FetchOutcome::Updated {
        validators: fresh,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::Write,
        net::TcpListener,
        sync::mpsc,
        thread,
    };

    use flate2::{write::GzEncoder, write::ZlibEncoder, Compression};

    /// Serves one canned HTTP response on a loopback socket and hands back
    /// the request it received.
    fn serve_once(response: Vec<u8>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            tx.send(String::from_utf8_lossy(&request).into_owned()).unwrap();
            stream.write_all(&response).unwrap();
        });

        (format!("http://{addr}/oui.txt"), rx)
    }

    fn plain_response(headers: &str, body: &[u8]) -> Vec<u8> {
        let mut resp = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n{headers}\r\n",
            body.len()
        )
        .into_bytes();
        resp.extend_from_slice(body);
        resp
    }

    #[test]
    fn test_updated_captures_all_headers() {
        let body = b"0050C2  (base 16)\t\tIEEE REGISTRATION AUTHORITY\n";
        let (url, rx) = serve_once(plain_response(
            "ETag: \"v1\"\r\nLast-Modified: Tue, 01 Jan 2030 00:00:00 GMT\r\nX-Extra: yes\r\n",
            body,
        ));

        let outcome = fetch(&url, &Validators::new()).unwrap();
        let FetchOutcome::Updated {
            validators,
            mut payload,
        } = outcome
        else {
            panic!("expected Updated");
        };

        assert_eq!(validators.etag(), Some("\"v1\""));
        assert_eq!(
            validators.last_modified(),
            Some("Tue, 01 Jan 2030 00:00:00 GMT")
        );
        assert_eq!(validators.get("x-extra"), Some("yes"));

        let mut bytes = Vec::new();
        payload.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, body);

        // No validators were stored, so no conditional headers were sent.
        let request = rx.recv().unwrap().to_ascii_lowercase();
        assert!(request.contains("accept-encoding: gzip, deflate"));
        assert!(!request.contains("if-none-match"));
    }

    #[test]
    fn test_stored_validators_become_conditional_headers() {
        let (url, rx) = serve_once(plain_response("", b"body"));

        let mut validators = Validators::new();
        validators.insert("etag", "\"v1\"");
        validators.insert("last-modified", "Tue, 01 Jan 2030 00:00:00 GMT");
        fetch(&url, &validators).unwrap();

        let request = rx.recv().unwrap().to_ascii_lowercase();
        assert!(request.contains("if-none-match: \"v1\""));
        assert!(request.contains("if-modified-since: tue, 01 jan 2030 00:00:00 gmt"));
    }

    #[test]
    fn test_not_modified_status() {
        let (url, _rx) = serve_once(
            b"HTTP/1.1 304 Not Modified\r\nETag: \"v1\"\r\nConnection: close\r\n\r\n".to_vec(),
        );

        let mut validators = Validators::new();
        validators.insert("etag", "\"v1\"");
        let outcome = fetch(&url, &validators).unwrap();
        assert!(matches!(outcome, FetchOutcome::NotModified));
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        let text = b"001122  (base 16)\t\tAcme Widget Co\n";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text).unwrap();
        let compressed = encoder.finish().unwrap();

        let (url, _rx) = serve_once(plain_response("Content-Encoding: gzip\r\n", &compressed));

        let FetchOutcome::Updated { mut payload, .. } = fetch(&url, &Validators::new()).unwrap()
        else {
            panic!("expected Updated");
        };
        let mut bytes = Vec::new();
        payload.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, text);
    }

    #[test]
    fn test_deflate_body_is_decoded() {
        let text = b"001122  (base 16)\t\tAcme Widget Co\n";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text).unwrap();
        let compressed = encoder.finish().unwrap();

        let (url, _rx) = serve_once(plain_response("Content-Encoding: deflate\r\n", &compressed));

        let FetchOutcome::Updated { mut payload, .. } = fetch(&url, &Validators::new()).unwrap()
        else {
            panic!("expected Updated");
        };
        let mut bytes = Vec::new();
        payload.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, text);
    }

    #[test]
    fn test_malformed_url() {
        let err = fetch("not a url", &Validators::new()).unwrap_err();
        assert!(matches!(err, OuigenError::InvalidUrl { .. }));
    }

    #[test]
    fn test_server_error_is_network_failure() {
        let (url, _rx) = serve_once(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_vec(),
        );
        let err = fetch(&url, &Validators::new()).unwrap_err();
        assert!(matches!(err, OuigenError::NetworkFailure { .. }));
    }

    #[test]
    fn test_connection_refused_is_network_failure() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetch(&format!("http://{addr}/oui.txt"), &Validators::new()).unwrap_err();
        assert!(matches!(err, OuigenError::NetworkFailure { .. }));
    }
}
