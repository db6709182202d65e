use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, AUTHORIZATION, CONNECTION,
            CONTENT_TYPE, HOST, TRANSFER_ENCODING,
        },
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};
use va_config::ProxyConfig;

use crate::{
    Route,
    error::Result,
    route,
};

/// Upper bound for forwarded request bodies.
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Vanilla AI Playground</title>
</head>
<body>
  <p>Vanilla AI Playground proxy. POST to <code>/{model}</code> to chat.</p>
</body>
</html>
"#;

#[derive(Debug, Clone)]
struct ProxyState {
    config: Arc<ProxyConfig>,
    client: reqwest::Client,
}

/// Build the proxy application.
pub fn router(config: ProxyConfig) -> Router {
    let state = ProxyState {
        config: Arc::new(config),
        client: reqwest::Client::new(),
    };

    Router::new().fallback(handle).with_state(state)
}

/// Run the proxy on the configured address until `shutdown` resolves.
pub async fn serve(
    config: ProxyConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(config.listen.as_str()).await?;
    serve_listener(listener, config, shutdown).await
}

/// Run the proxy on an already bound listener until `shutdown` resolves.
pub async fn serve_listener(
    listener: TcpListener,
    config: ProxyConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!(address = %listener.local_addr()?, "Starting proxy.");
    if config.account_id.is_none() || config.gateway_id.is_none() || config.api_key.is_none() {
        error!("Proxy credentials are not configured, requests will not be forwarded.");
    }

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Proxy stopped.");
    Ok(())
}

async fn handle(State(state): State<ProxyState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let route = route(
        &parts.method,
        parts.uri.path(),
        parts.uri.query(),
        &state.config,
    );
    debug!(method = %parts.method, path = parts.uri.path(), ?route, "Received request.");

    match route {
        Route::Preflight => (StatusCode::NO_CONTENT, cors_headers(true)).into_response(),
        Route::Page => {
            let mut headers = cors_headers(false);
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );

            (headers, PAGE).into_response()
        }
        Route::MissingConfig => {
            error!("Missing proxy credentials.");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Missing environment variables.",
            )
                .into_response()
        }
        Route::Forward { url, authorization } => {
            match forward(&state.client, parts, body, &url, &authorization).await {
                Ok(response) => response,
                Err(error) => {
                    error!(%url, %error, "Failed to forward request.");
                    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
                }
            }
        }
    }
}

async fn forward(
    client: &reqwest::Client,
    parts: Parts,
    body: Body,
    url: &str,
    authorization: &str,
) -> Result<Response> {
    let body = axum::body::to_bytes(body, MAX_BODY_SIZE).await?;

    let mut headers = parts.headers;
    headers.remove(HOST);
    headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization)?);

    trace!(%url, method = %parts.method, "Forwarding request.");
    let upstream = client
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    debug!(status = status.as_u16(), "Received upstream response.");

    let mut headers = upstream.headers().clone();
    headers.remove(TRANSFER_ENCODING);
    headers.remove(CONNECTION);
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    Ok(response)
}

fn cors_headers(preflight: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    if preflight {
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    }

    headers
}
