use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OpenUrlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Check a URL before handing it to the system opener. Only web links with
/// a host are allowed, so a crafted base URL cannot launch local files.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, OpenUrlError> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(OpenUrlError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(OpenUrlError::MissingHost);
    }
    Ok(url)
}
