use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};

use crate::credential::extract_credential;
use crate::filter::{FilterDecision, RouteFilter};

/// Axum middleware applying [`RouteFilter`] to every request.
///
/// Redirects use 307 so the original method survives the round trip.
pub async fn route_filter(
    State(filter): State<Arc<RouteFilter>>,
    req: Request,
    next: Next,
) -> Response {
    let credential = extract_credential(req.headers(), &filter.config().cookie_name);
    let path = req.uri().path().to_owned();

    match filter.decide(&path, credential.is_some()) {
        FilterDecision::Allow => next.run(req).await,
        FilterDecision::Redirect(target) => {
            let location = target.location();
            tracing::debug!(%path, %location, ?credential, "edge filter redirect");
            Redirect::temporary(&location).into_response()
        }
    }
}

/// Wrap `router` with the edge filter.
pub fn protect(router: Router, filter: RouteFilter) -> Router {
    router.layer(middleware::from_fn_with_state(Arc::new(filter), route_filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use axum::routing::get;
    use tower::ServiceExt;

    fn app() -> Router {
        let router = Router::new()
            .route("/dashboard/payments", get(|| async { "payments" }))
            .route("/login", get(|| async { "login" }));
        protect(router, RouteFilter::new(RouteConfig::default()))
    }

    async fn send(req: axum::http::Request<Body>) -> Response {
        app().oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_is_redirected() {
        let res = send(
            axum::http::Request::get("/dashboard/payments")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            res.headers()[header::LOCATION],
            "/login?redirect=%2Fdashboard%2Fpayments"
        );
    }

    #[tokio::test]
    async fn cookie_credential_passes_through() {
        let res = send(
            axum::http::Request::get("/dashboard/payments")
                .header(header::COOKIE, "auth-token=opaque")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signed_in_user_skips_login_page() {
        let res = send(
            axum::http::Request::get("/login")
                .header(header::AUTHORIZATION, "Bearer opaque")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[header::LOCATION], "/dashboard");
    }
}
