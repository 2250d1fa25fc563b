use actix_web::{cookie::Cookie, http::StatusCode, HttpResponse};

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a redirect response with optional cookies
    pub fn redirect(location: &str, cookies: Option<Vec<Cookie>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();

        if let Some(cookies_vec) = cookies {
            for cookie in cookies_vec {
                builder.cookie(cookie);
            }
        }

        builder
            .append_header(("Location", location))
            .finish()
    }

    /// Create a redirect response with a single cookie
    pub fn redirect_with_cookie(location: &str, cookie: Cookie) -> HttpResponse {
        Self::redirect(location, Some(vec![cookie]))
    }

    /// Short plain-text body with the given status
    pub fn plain_text(status: StatusCode, message: &str) -> HttpResponse {
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(message.to_owned())
    }
}
