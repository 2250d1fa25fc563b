use actix_web::HttpRequest;

/// First value of query parameter `name`, percent-decoded
///
/// Repeated keys never fail; later values are ignored.
#[must_use]
pub fn first_query_param(req: &HttpRequest, name: &str) -> Option<String> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Like [`first_query_param`], treating an empty value as absent
#[must_use]
pub fn non_empty_query_param(req: &HttpRequest, name: &str) -> Option<String> {
    first_query_param(req, name).filter(|value| !value.is_empty())
}
