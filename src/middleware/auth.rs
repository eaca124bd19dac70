//! Bearer-token guard.
//!
//! Wrap a handler with [`require_auth`] and it only runs for requests that
//! carry `Authorization: Bearer <token>` with a token the [`Authenticator`]
//! accepts. The decoded claims are inserted into the request extensions:
//!
//! ```rust,ignore
//! async fn handler(req: Request) -> Response {
//!     let claims = req.extension::<Claims>();
//!     …
//! }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::request::Request;
use crate::response::IntoResponse;

/// Verifies a raw token and decodes its claims.
pub trait Authenticator: Send + Sync + 'static {
    type Claims: Clone + Send + Sync + 'static;

    fn authenticate(&self, token: &str) -> Result<Self::Claims>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &Request) -> Result<&str> {
    req.header("authorization")
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("No token provided"))
}

/// Runs `inner` only for authenticated requests; everything else gets `401`.
pub fn require_auth<A, H>(auth: &Arc<A>, inner: H) -> impl Handler + use<A, H>
where
    A: Authenticator,
    H: Handler,
{
    let auth = Arc::clone(auth);
    let inner = inner.into_boxed_handler();
    move |mut req: Request| {
        let verdict = bearer_token(&req).and_then(|token| auth.authenticate(token));
        if let Err(e) = &verdict {
            debug!(path = %req.path(), "rejected unauthenticated request: {e}");
        }
        let inner = Arc::clone(&inner);
        async move {
            match verdict {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    inner.call(req).await
                }
                Err(e) => e.into_response(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::response::Response;
    use crate::router::Router;

    struct Fixed;

    impl Authenticator for Fixed {
        type Claims = String;

        fn authenticate(&self, token: &str) -> Result<String> {
            if token == "good" {
                Ok("alice".to_owned())
            } else {
                Err(Error::unauthorized("Invalid token"))
            }
        }
    }

    async fn whoami(req: Request) -> Response {
        Response::text(req.extension::<String>().cloned().unwrap_or_default())
    }

    fn app() -> Router {
        Router::new().on(Method::Get, "/me", require_auth(&Arc::new(Fixed), whoami))
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let req = Request::new(Method::Get, "/").with_header("authorization", "bearer abc");
        assert_eq!(bearer_token(&req).ok(), Some("abc"));
        let req = Request::new(Method::Get, "/").with_header("authorization", "Basic abc");
        assert!(bearer_token(&req).is_err());
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims() {
        let req = Request::new(Method::Get, "/me").with_header("Authorization", "Bearer good");
        let res = app().respond(req).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"alice");
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_401() {
        let res = app().respond(Request::new(Method::Get, "/me")).await;
        assert_eq!(res.status_code(), 401);
        assert_eq!(res.body(), br#"{"message":"No token provided"}"#);

        let req = Request::new(Method::Get, "/me").with_header("Authorization", "Bearer bad");
        let res = app().respond(req).await;
        assert_eq!(res.status_code(), 401);
    }
}
