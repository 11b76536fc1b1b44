use crate::core::config::AppState;
use crate::core::ctx::Ctx;
use crate::core::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

const MSG_NO_TOKEN: &str = "Not authorized, no token";

pub async fn mw_require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_auth");

    let token = bearer_token(&req).ok_or_else(|| {
        warn!("Rejected {} {}: no bearer token", req.method(), req.uri().path());
        Error::auth(MSG_NO_TOKEN)
    })?;

    let user = state.auth.verify_token(token).await?;

    req.extensions_mut()
        .insert(Ctx::new(user.id, user.username));

    Ok(next.run(req).await)
}

/// Format: "Bearer <token>"
fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/posts");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&request(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&request(Some("Bearer "))), None);
        assert_eq!(bearer_token(&request(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&request(None)), None);
    }
}
