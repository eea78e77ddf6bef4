//! Remote sources for profile fields

use crate::fetch::{FetchError, FetchRequest};

use super::ProfileField;

/// Sent with every request
pub const USER_AGENT: &str = "GitHub Universe Badge 2025";

/// Only requests to this origin carry the API token
pub const API_ORIGIN: &str = "https://api.github.com";

/// Build the request that fetches `field` for `handle`
///
/// # Arguments
/// * `token` - Personal access token, attached for API requests only
pub fn request_for(
    field: ProfileField,
    handle: &str,
    token: Option<&str>,
) -> Result<FetchRequest, FetchError> {
    let request = match field {
        ProfileField::Stats => FetchRequest::get_fmt(format_args!("{}/users/{}", API_ORIGIN, handle)),
        ProfileField::Contributions => {
            FetchRequest::get_fmt(format_args!("https://github.com/{}.contribs", handle))
        }
        ProfileField::Avatar => FetchRequest::get_fmt(format_args!(
            "https://wsrv.nl/?url=https://github.com/{}.png&w=75&output=png",
            handle
        )),
    }?
    .with_header("User-Agent", USER_AGENT)?;

    match token {
        Some(token) if !token.is_empty() && request.url().starts_with(API_ORIGIN) => {
            request.with_header_fmt("Authorization", format_args!("token {}", token))
        }
        _ => Ok(request),
    }
}
