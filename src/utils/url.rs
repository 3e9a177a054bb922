//! Endpoint URL helpers for the chat backends.

/// Strip trailing slashes so endpoints can be appended safely.
///
/// ```
/// use kodeka::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between them.
///
/// ```
/// use kodeka::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.openai.com/v1/", "/chat/completions"),
///     "https://api.openai.com/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Daemon addresses are often given as bare `host:port`; those get `http://`.
pub fn with_default_scheme(address: &str) -> String {
    let address = normalize_base_url(address);
    if address.contains("://") {
        address
    } else {
        format!("http://{address}")
    }
}

/// Append `:port` when an address names no port of its own.
///
/// ```
/// use kodeka::utils::url::with_default_port;
///
/// assert_eq!(with_default_port("http://localhost", 11434), "http://localhost:11434");
/// assert_eq!(with_default_port("http://localhost:8080/api", 11434), "http://localhost:8080/api");
/// ```
pub fn with_default_port(address: &str, port: u16) -> String {
    let address = normalize_base_url(address);
    let authority_start = address.find("://").map_or(0, |i| i + 3);
    let authority_end = address[authority_start..]
        .find('/')
        .map_or(address.len(), |i| authority_start + i);
    let authority = &address[authority_start..authority_end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, rest)| rest);

    let has_port = match host_port.rfind(']') {
        Some(bracket) => host_port[bracket..].starts_with("]:"),
        None => host_port.contains(':'),
    };
    if has_port || host_port.is_empty() {
        return address;
    }
    format!(
        "{}:{port}{}",
        &address[..authority_end],
        &address[authority_end..]
    )
}
