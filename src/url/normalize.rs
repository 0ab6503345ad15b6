use crate::UrlError;
use url::Url;

/// Trims a submitted URL and prefixes `https://` when it carries no scheme
///
/// This is the form that gets fetched; it keeps the host and path exactly as
/// submitted.
pub fn with_default_scheme(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    Ok(if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    })
}

/// Normalizes a submitted URL into its stored form
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject if nothing is left
/// 2. Default the scheme to `https` when none is given
/// 3. Reject anything that is not HTTP or HTTPS, or has no host
/// 4. Remove the `www.` prefix from the host
/// 5. Remove trailing slashes from the path (the bare root keeps none)
///
/// Query strings and fragments are left untouched.
///
/// # Examples
///
/// ```
/// use sitelens::url::normalize_url;
///
/// let url = normalize_url("http://www.example.com/").unwrap();
/// assert_eq!(url, "http://example.com");
/// ```
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    let with_scheme = with_default_scheme(raw)?;

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_string();
    if let Some(stripped) = host.strip_prefix("www.") {
        url.set_host(Some(stripped))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
    }

    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    let mut normalized = url.to_string();

    // The url crate always serializes an empty path as "/"
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        normalized.pop();
    }

    Ok(normalized)
}
