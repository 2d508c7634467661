//! Guard for user-supplied manifest URLs.

use crate::error::{Result, SyncError};
use crate::project_identity;
use reqwest::Url;
use std::net::{IpAddr, ToSocketAddrs};

fn rejected(reason: String) -> SyncError {
    SyncError::RemoteFetchError(reason)
}

/// Parse `raw` and refuse anything other than https to a public host.
///
/// Plain http is accepted only with `PKGSYNC_ALLOW_INSECURE_HTTP=1`.
pub(super) fn checked_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| rejected(format!("Invalid URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "https" => {}
        "http" if insecure_http_allowed() => {}
        other => {
            return Err(rejected(format!(
                "URL scheme '{}' is blocked; only https is fetched (set {}=1 to allow http)",
                other,
                project_identity::env_key("ALLOW_INSECURE_HTTP")
            )));
        }
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| rejected(format!("URL has no host: {}", raw)))?;
    if names_private_host(host) {
        return Err(rejected(format!("Refusing to fetch from private host {}", host)));
    }

    let port = url.port_or_known_default().unwrap_or(443);
    let addrs: Vec<IpAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| rejected(format!("Could not resolve '{}': {}", host, e)))?
        .map(|addr| addr.ip())
        .collect();
    if let Some(ip) = addrs.into_iter().find(|ip| is_internal(*ip)) {
        return Err(rejected(format!(
            "Refusing to fetch from private host {} ({})",
            host, ip
        )));
    }

    Ok(url)
}

fn insecure_http_allowed() -> bool {
    project_identity::env_get("ALLOW_INSECURE_HTTP").as_deref() == Some("1")
}

/// Literal private IPs and `localhost`, checked before any DNS lookup.
fn names_private_host(host: &str) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(ip) => is_internal(ip),
        Err(_) => {
            let lower = bare.to_ascii_lowercase();
            lower == "localhost" || lower.ends_with(".localhost")
        }
    }
}

fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal(IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
                    || v6.is_unspecified()
            }
        },
    }
}
