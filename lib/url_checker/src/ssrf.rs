use url::Url;

/// Returns why `raw` must not be probed, or `None` when it is safe. Hosts are
/// matched as literal strings, no DNS resolution happens here.
pub fn blocked_reason(raw: &str, allowed_domains: Option<&[String]>) -> Option<String> {
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(e) => return Some(format!("invalid URL: {}", e)),
    };
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Some(format!("scheme `{}` not allowed", other)),
    }
    let host = match parsed.host_str() {
        Some(host) => host.to_lowercase(),
        None => return Some("missing host".to_string()),
    };
    if is_private_host(&host) {
        return Some(format!("private or loopback host `{}`", host));
    }
    if let Some(domains) = allowed_domains {
        let in_list = domains.iter().any(|domain| {
            let domain = domain.to_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        });
        if !in_list {
            return Some(format!("host `{}` not in the domain allow-list", host));
        }
    }
    None
}

fn is_private_host(host: &str) -> bool {
    let host = host.trim_matches(|c| c == '[' || c == ']');
    if host == "localhost" || host == "0.0.0.0" || host == "::1" {
        return true;
    }
    if host.starts_with("127.")
        || host.starts_with("10.")
        || host.starts_with("192.168.")
        || host.starts_with("169.254.")
        || host.starts_with("fc00:")
        || host.starts_with("fe80:")
    {
        return true;
    }
    // fd00::/8 unique-local addresses: `fd` followed by two hex digits and a
    // colon, so hostnames that merely start with "fd" stay reachable.
    if let Some(rest) = host.strip_prefix("fd") {
        let bytes = rest.as_bytes();
        if bytes.len() >= 3
            && bytes[0].is_ascii_hexdigit()
            && bytes[1].is_ascii_hexdigit()
            && bytes[2] == b':'
        {
            return true;
        }
    }
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some((second, _)) = rest.split_once('.') {
            if let Ok(octet) = second.parse::<u8>() {
                return (16..=31).contains(&octet);
            }
        }
    }
    false
}
