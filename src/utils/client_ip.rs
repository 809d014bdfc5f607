//! Client IP extraction for rate limiting.

use axum::http::Request;
use std::net::{IpAddr, Ipv4Addr};
use tower_governor::key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor};

/// Determines the client IP of a request.
///
/// When `behind_proxy` is set, [`SmartIpKeyExtractor`] reads `X-Forwarded-For`,
/// `X-Real-IP` and `Forwarded` before falling back to the socket peer. Otherwise
/// only the peer from `ConnectInfo` is trusted. A request with neither maps to
/// `0.0.0.0`, so all such requests share one bucket.
///
/// # Examples
///
/// ```ignore
/// let req = Request::builder()
///     .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
///     .body(())
///     .unwrap();
///
/// assert_eq!(client_ip(&req, true), "203.0.113.7".parse::<IpAddr>().unwrap());
/// ```
pub fn client_ip<B>(req: &Request<B>, behind_proxy: bool) -> IpAddr {
    let extracted = if behind_proxy {
        SmartIpKeyExtractor.extract(req)
    } else {
        PeerIpKeyExtractor.extract(req)
    };

    extracted.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
