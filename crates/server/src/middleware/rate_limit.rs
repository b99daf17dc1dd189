//! Rate limiting for login and signup using governor and `tower_governor`.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor for the client IP.
///
/// Uses the peer address of the TCP connection. Proxy headers are only
/// consulted when `trust_proxy_headers` is set, since any client can send
/// them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = forwarded_ip(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/users/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap_or_else(|e| panic!("{e}"))
    }

    fn with_peer(mut req: Request<()>, peer: Ipv4Addr) -> Request<()> {
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40_000))));
        req
    }

    const PEER: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);

    #[test]
    fn test_proxy_headers_ignored_by_default() {
        let extractor = ClientIpKeyExtractor::default();
        for header in ["x-forwarded-for", "x-real-ip"] {
            let req = with_peer(request(&[(header, "203.0.113.7")]), PEER);
            assert_eq!(extractor.extract(&req).ok(), Some(IpAddr::V4(PEER)), "{header}");
        }
    }

    #[test]
    fn test_forwarded_for_first_hop_when_trusted() {
        let req = with_peer(
            request(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]),
            PEER,
        );
        assert_eq!(
            ClientIpKeyExtractor::new(true).extract(&req).ok(),
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)))
        );
    }

    #[test]
    fn test_real_ip_when_trusted() {
        let req = request(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(
            ClientIpKeyExtractor::new(true).extract(&req).ok(),
            Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 2)))
        );
    }

    #[test]
    fn test_unparseable_header_falls_back_to_peer() {
        let req = with_peer(request(&[("x-forwarded-for", "not-an-ip")]), PEER);
        assert_eq!(
            ClientIpKeyExtractor::new(true).extract(&req).ok(),
            Some(IpAddr::V4(PEER))
        );
    }

    #[test]
    fn test_no_key() {
        assert!(ClientIpKeyExtractor::default().extract(&request(&[])).is_err());
        let req = request(&[("x-forwarded-for", "203.0.113.7")]);
        assert!(ClientIpKeyExtractor::default().extract(&req).is_err());
    }
}
