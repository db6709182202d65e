use axum::http::Method;
use va_config::ProxyConfig;

/// What the proxy does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Answer a CORS preflight.
    Preflight,

    /// Serve the landing page.
    Page,

    /// Forward to the gateway.
    Forward {
        /// The upstream URL, including the query string.
        url: String,

        /// Value of the injected `Authorization` header.
        authorization: String,
    },

    /// The proxy lacks the credentials to forward the request.
    MissingConfig,
}

/// Decide how to handle a request.
#[must_use]
pub fn route(method: &Method, path: &str, query: Option<&str>, config: &ProxyConfig) -> Route {
    if *method == Method::OPTIONS {
        return Route::Preflight;
    }

    if *method == Method::GET {
        return Route::Page;
    }

    let (Some(account), Some(gateway), Some(api_key)) = (
        non_empty(config.account_id.as_deref()),
        non_empty(config.gateway_id.as_deref()),
        non_empty(config.api_key.as_deref()),
    ) else {
        return Route::MissingConfig;
    };

    let mut url = format!(
        "{}/v1/{account}/{gateway}/workers-ai{path}",
        config.upstream.trim_end_matches('/'),
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }

    Route::Forward {
        url,
        authorization: format!("Bearer {api_key}"),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
