//! Client identification utilities
//!
//! Resolving who is calling from HTTP headers: the client IP for rate
//! limiting and the bearer credential for authentication.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Resolve the client IP used to key rate limits
///
/// The socket peer is authoritative unless it is one of `trusted_proxies`.
/// Behind a trusted proxy, `X-Forwarded-For` is read right to left and the
/// first hop that is not itself a trusted proxy wins; entries further left
/// were written by the client and are ignored.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `peer_ip` - Address of the connected socket
/// * `trusted_proxies` - Reverse proxies allowed to append to `X-Forwarded-For`
///
/// ## Returns
/// The client IP address, or None without a socket address
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer_ip: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<IpAddr> {
    let peer_ip = peer_ip?;
    if !trusted_proxies.contains(&peer_ip) {
        return Some(peer_ip);
    }

    let hops: Vec<IpAddr> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|xff| xff.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .collect();

    hops.into_iter()
        .rev()
        .find(|hop| !trusted_proxies.contains(hop))
        .or(Some(peer_ip))
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively. Anything else, including an
/// empty token, yields `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_forwarded_header_ignored_from_untrusted_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.9"));

        assert_eq!(
            extract_client_ip(&headers, Some(ip("203.0.113.50")), &[]),
            Some(ip("203.0.113.50"))
        );
        assert_eq!(
            extract_client_ip(&headers, Some(ip("203.0.113.50")), &[ip("10.0.0.1")]),
            Some(ip("203.0.113.50"))
        );
    }

    #[test]
    fn test_trusted_proxy_uses_rightmost_untrusted_hop() {
        let proxies = [ip("10.0.0.1"), ip("10.0.0.2")];
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 198.51.100.9, 10.0.0.2"),
        );

        assert_eq!(
            extract_client_ip(&headers, Some(ip("10.0.0.1")), &proxies),
            Some(ip("198.51.100.9"))
        );
    }

    #[test]
    fn test_trusted_proxy_reads_every_forwarded_header() {
        let proxies = [ip("10.0.0.1")];
        let mut headers = HeaderMap::new();
        headers.append("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        headers.append("x-forwarded-for", HeaderValue::from_static("198.51.100.9"));

        assert_eq!(
            extract_client_ip(&headers, Some(ip("10.0.0.1")), &proxies),
            Some(ip("198.51.100.9"))
        );
    }

    #[test]
    fn test_trusted_proxy_without_usable_header_falls_back_to_peer() {
        let proxies = [ip("10.0.0.1")];
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_client_ip(&headers, Some(ip("10.0.0.1")), &proxies),
            Some(ip("10.0.0.1"))
        );

        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(
            extract_client_ip(&headers, Some(ip("10.0.0.1")), &proxies),
            Some(ip("10.0.0.1"))
        );
    }

    #[test]
    fn test_no_peer_address_is_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        assert_eq!(extract_client_ip(&headers, None, &[]), None);
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi".to_string()));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
