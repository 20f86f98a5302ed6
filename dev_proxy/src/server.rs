use {
    crate::{Proxy, ProxyError, ProxyRule, UpstreamResponse},
    bytes::Bytes,
    std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc},
    warp::{
        filters::{path::FullPath, BoxedFilter},
        http::{self, StatusCode},
        reply::Response,
        Filter,
        Rejection,
        Reply,
    },
};

#[cfg(test)]
mod tests;

pub const DEV_HOST: &str = "localhost";
pub const DEV_PORT: u16 = 5173;
pub const PREVIEW_PORT: u16 = 4173;
pub const PREVIEW_STATIC_DIR: &str = "dist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Development: proxy rules, optionally a static directory.
    Serve,
    /// Serves the production build with the same proxy rules.
    Preview,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub mode: Mode,
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub rules: Vec<ProxyRule>,
}

impl ServerConfig {
    /// `localhost:5173`, proxy only.
    pub fn serve(rules: Vec<ProxyRule>) -> Self {
        Self {
            mode: Mode::Serve,
            host: DEV_HOST.to_owned(),
            port: DEV_PORT,
            static_dir: None,
            rules,
        }
    }

    /// `<host>:4173`, serving `dist/` behind the proxy rules.
    pub fn preview(host: impl Into<String>, rules: Vec<ProxyRule>) -> Self {
        Self {
            mode: Mode::Preview,
            host: host.into(),
            port: PREVIEW_PORT,
            static_dir: Some(PREVIEW_STATIC_DIR.into()),
            rules,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<Option<PathBuf>>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to build proxy: {0}")]
    Proxy(#[from] ProxyError),

    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },

    #[error("No address found for {0}")]
    NoAddress(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: warp::Error,
    },
}

/// Resolves the configured host, binds the first address and returns it with
/// the server future. The server stops once `shutdown` resolves.
pub async fn bind(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>), ServerError> {
    let ServerConfig {
        mode,
        host,
        port,
        static_dir,
        rules,
    } = config;

    let proxy = Arc::new(Proxy::new(rules)?);

    for rule in proxy.rules() {
        tracing::info!(context = rule.context(), upstream = %rule.target(), "proxy rule");
    }

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|source| ServerError::Resolve {
            host: host.clone(),
            source,
        })?
        .next()
        .ok_or_else(|| ServerError::NoAddress(host.clone()))?;

    let routes = routes(proxy, static_dir).with(warp::trace::request());

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(?mode, %host, %addr, "dev server listening");

    Ok((addr, server))
}

/// Proxy rules first, then the static directory if any. Anything else is a
/// 404.
pub fn routes(proxy: Arc<Proxy>, static_dir: Option<PathBuf>) -> BoxedFilter<(Response,)> {
    let proxied = proxy_filter(proxy);

    match static_dir {
        Some(dir) => {
            // Client-side routes fall back to the app entry point.
            let index = warp::get()
                .and(warp::fs::file(dir.join("index.html")))
                .map(Reply::into_response);
            let files = warp::fs::dir(dir).map(Reply::into_response);

            proxied.or(files).unify().or(index).unify().boxed()
        }

        None => proxied.boxed(),
    }
}

/// Matches requests covered by a proxy rule and forwards them. Other requests
/// are rejected as not found, leaving them to the rest of the server.
pub fn proxy_filter(
    proxy: Arc<Proxy>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + Send + Sync + 'static {
    warp::path::full()
        .and(optional_raw_query())
        .and(warp::any().map(move || proxy.clone()))
        .and_then(
            |path: FullPath, query: Option<String>, proxy: Arc<Proxy>| async move {
                if proxy.route(path.as_str()).is_none() {
                    return Err(warp::reject::not_found());
                }

                let path_and_query = match query {
                    Some(query) => format!("{}?{query}", path.as_str()),
                    None => path.as_str().to_owned(),
                };

                Ok((proxy, path_and_query))
            },
        )
        .untuple_one()
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .then(
            |proxy: Arc<Proxy>,
             path_and_query: String,
             method: http::Method,
             headers: http::HeaderMap,
             body: Bytes| async move {
                forward(&proxy, &path_and_query, method, headers, body).await
            },
        )
}

pub(crate) fn optional_raw_query(
) -> impl Filter<Extract = (Option<String>,), Error = std::convert::Infallible> + Clone {
    warp::query::raw()
        .map(Some)
        .or(warp::any().map(|| None))
        .unify()
}

async fn forward(
    proxy: &Proxy,
    path_and_query: &str,
    method: http::Method,
    headers: http::HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(method) = reqwest::Method::from_bytes(method.as_str().as_bytes()) else {
        return text_reply(StatusCode::METHOD_NOT_ALLOWED, "Unsupported method");
    };

    match proxy
        .forward(method, path_and_query, upstream_headers(&headers), body)
        .await
    {
        Ok(upstream) => into_reply(upstream),

        Err(err) => {
            tracing::warn!(%err, path = path_and_query, "proxy error");
            text_reply(StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

fn upstream_headers(headers: &http::HeaderMap) -> reqwest::header::HeaderMap {
    let mut converted = reqwest::header::HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let name = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes());
        let value = reqwest::header::HeaderValue::from_bytes(value.as_bytes());

        if let (Ok(name), Ok(value)) = (name, value) {
            converted.append(name, value);
        }
    }

    converted
}

fn into_reply(upstream: UpstreamResponse) -> Response {
    let UpstreamResponse {
        status,
        headers,
        body,
    } = upstream;

    let mut response = Response::new(body.into());
    *response.status_mut() =
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    for (name, value) in &headers {
        let name = http::HeaderName::from_bytes(name.as_str().as_bytes());
        let value = http::HeaderValue::from_bytes(value.as_bytes());

        if let (Ok(name), Ok(value)) = (name, value) {
            response.headers_mut().append(name, value);
        }
    }

    response
}

fn text_reply(status: StatusCode, body: impl Into<String>) -> Response {
    warp::reply::with_status(body.into(), status).into_response()
}
