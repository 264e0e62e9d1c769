use std::net::SocketAddr;

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity a submission is counted against.
///
/// The peer IP, unless the service sits behind a trusted proxy, in which case
/// the left-most `X-Forwarded-For` entry (the original client) is used when
/// present.
pub fn client_key(peer: SocketAddr, headers: &HeaderMap, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    peer.ip().to_string()
}
