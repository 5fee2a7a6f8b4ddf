use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT,
};

use crate::utils::error::FetchError;

/// Default pool of realistic browser identity strings
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Accept-Language used for the Chilean portal
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-CL,es;q=0.9,en;q=0.8";

/// Pick a User-Agent at random from `pool`
///
/// Falls back to the first built-in string when the pool is empty.
pub fn random_user_agent(pool: &[String]) -> &str {
    let mut rng = rand::thread_rng();
    pool.choose(&mut rng)
        .map(String::as_str)
        .unwrap_or(USER_AGENTS[0])
}

/// Build browser-like headers for listing and detail pages
///
/// # Examples
///
/// ```
/// use portal_crawler::crawler::headers::build_browser_headers;
///
/// let headers = build_browser_headers(
///     "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
///     "es-CL,es;q=0.9",
/// ).unwrap();
/// assert!(headers.contains_key("user-agent"));
/// ```
pub fn build_browser_headers(user_agent: &str, accept_language: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, header_value(user_agent)?);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, header_value(accept_language)?);
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    Ok(headers)
}

/// Insert a random User-Agent when the caller did not pin one
pub fn ensure_user_agent(headers: &mut HeaderMap, pool: &[String]) -> Result<(), FetchError> {
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, header_value(random_user_agent(pool))?);
    }
    Ok(())
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader(format!("{value:?}: {e}")))
}
