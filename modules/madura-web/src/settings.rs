use axum::http::{header, HeaderMap, HeaderValue};
use url::{form_urlencoded, Url};

pub const API_BASE_COOKIE: &str = "api_base";

/// The API base stored in the visitor's cookie, if any.
pub fn api_base_override(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == API_BASE_COOKIE)
        .and_then(|(_, raw)| decode_cookie_value(raw))
        .filter(|base| validate_api_base(base).is_ok())
}

/// Accept only absolute http(s) URLs. Returns the base without a trailing slash.
pub fn validate_api_base(candidate: &str) -> Result<String, String> {
    let trimmed = candidate.trim();
    let url = Url::parse(trimmed).map_err(|_| format!("{trimmed:?} is not a valid URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err("API base must use http or https".to_string());
    }
    if url.host_str().is_none() {
        return Err("API base must include a host".to_string());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// `Set-Cookie` value storing `base`, or clearing the override when `None`.
pub fn api_base_cookie(base: Option<&str>) -> HeaderValue {
    let cookie = match base {
        Some(base) => {
            let encoded: String = form_urlencoded::byte_serialize(base.as_bytes()).collect();
            format!("{API_BASE_COOKIE}={encoded}; Path=/; SameSite=Lax; Max-Age=31536000")
        }
        None => format!("{API_BASE_COOKIE}=; Path=/; SameSite=Lax; Max-Age=0"),
    };
    // Only URL-safe characters survive encoding.
    HeaderValue::from_str(&cookie)
        .unwrap_or_else(|_| HeaderValue::from_static("api_base=; Path=/; Max-Age=0"))
}

fn decode_cookie_value(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(value, _)| value.into_owned())
}
