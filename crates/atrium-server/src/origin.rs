//! Callback base URL resolution.
//!
//! External callers are handed a base URL to POST callbacks against. Behind
//! a reverse proxy the request's own host is not the public one, so the
//! resolution order is: manual override, forwarded headers cross-checked
//! against the configured public origin, then the request itself.

use axum::http::{HeaderMap, Uri};

/// Scheme + host of a configured absolute URL.
struct ParsedOrigin {
    scheme: String,
    hostname: String,
    host: String,
}

fn parse_origin(value: &str) -> Option<ParsedOrigin> {
    let uri: Uri = value.parse().ok()?;
    let scheme = uri.scheme_str()?.to_ascii_lowercase();
    let authority = uri.authority()?;
    let hostname = authority.host().to_ascii_lowercase();
    let host = match authority.port_u16() {
        Some(port) => format!("{hostname}:{port}"),
        None => hostname.clone(),
    };
    Some(ParsedOrigin {
        scheme,
        hostname,
        host,
    })
}

/// First non-empty entry of a comma-separated forwarded header value.
fn first_forwarded(value: Option<&str>) -> Option<&str> {
    value?.split(',').map(str::trim).find(|part| !part.is_empty())
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Lowercased host with any port stripped.
fn normalize_host(host: &str) -> String {
    host.split(':').next().unwrap_or(host).to_ascii_lowercase()
}

/// Lowercased protocol with any trailing `:` stripped.
fn clean_protocol(value: &str) -> String {
    value.trim_end_matches(':').to_ascii_lowercase()
}

fn manual_base_url(value: Option<&str>) -> Option<String> {
    let value = value?;
    match parse_origin(value) {
        Some(origin) => Some(format!("{}://{}", origin.scheme, origin.host)),
        None => {
            tracing::warn!(value, "invalid callback base url override, ignoring");
            None
        }
    }
}

/// The configured public origin, but only when its hostname matches the
/// host the request actually arrived on.
fn configured_origin(
    public_origin: Option<&str>,
    forwarded_host: Option<&str>,
    request_host: &str,
) -> Option<ParsedOrigin> {
    let value = public_origin?;
    let Some(configured) = parse_origin(value) else {
        tracing::warn!(value, "invalid public origin, falling back to request origin");
        return None;
    };

    let candidate = normalize_host(forwarded_host.unwrap_or(request_host));
    if configured.hostname == candidate {
        Some(configured)
    } else {
        None
    }
}

/// Resolve the base URL external callers should POST callbacks to.
pub fn resolve_callback_base_url(
    manual_override: Option<&str>,
    public_origin: Option<&str>,
    headers: &HeaderMap,
    request_scheme: &str,
    request_host: &str,
) -> String {
    if let Some(base_url) = manual_base_url(manual_override) {
        return base_url;
    }

    let forwarded_host = first_forwarded(header_str(headers, "x-forwarded-host"));
    let forwarded_proto = first_forwarded(header_str(headers, "x-forwarded-proto"));
    let configured = configured_origin(public_origin, forwarded_host, request_host);

    let protocol = forwarded_proto
        .map(clean_protocol)
        .or_else(|| configured.as_ref().map(|o| o.scheme.clone()))
        .unwrap_or_else(|| clean_protocol(request_scheme));

    let host = forwarded_host
        .map(str::to_string)
        .or_else(|| configured.as_ref().map(|o| o.host.clone()))
        .unwrap_or_else(|| request_host.to_string());

    format!("{protocol}://{host}")
}
