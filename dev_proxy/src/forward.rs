use {
    crate::ProxyRule,
    bytes::Bytes,
    reqwest::{
        header::{self, HeaderMap, HeaderName},
        redirect,
        Method,
        StatusCode,
    },
};

pub type TransportError = reqwest::Error;

/// Headers meaningful only for a single connection, never forwarded.
static HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to build upstream client: {0}")]
    Client(#[from] TransportError),
}

/// Failure to get any response from upstream. Error statuses returned by the
/// upstream are not errors; they are passed through.
#[derive(Debug, thiserror::Error)]
pub enum ProxyForwardingError {
    #[error("No proxy rule matches {0}")]
    NoRoute(String),

    #[error("Invalid upstream URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Upstream request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Upstream response, as received.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug)]
struct Route {
    rule: ProxyRule,
    client: reqwest::Client,
}

/// Set of proxy rules with one upstream HTTP client each. Stateless per
/// request; share it behind an `Arc`.
#[derive(Debug)]
pub struct Proxy {
    routes: Vec<Route>,
}

impl Proxy {
    pub fn new(rules: impl IntoIterator<Item = ProxyRule>) -> Result<Self, ProxyError> {
        let routes = rules
            .into_iter()
            .map(|rule| upstream_client(&rule).map(|client| Route { rule, client }))
            .collect::<Result<Vec<_>, TransportError>>()?;

        Ok(Self { routes })
    }

    pub fn rules(&self) -> impl Iterator<Item = &ProxyRule> {
        self.routes.iter().map(|route| &route.rule)
    }

    /// First rule whose context prefixes `path`.
    pub fn route(&self, path: &str) -> Option<&ProxyRule> {
        self.find(path).map(|route| &route.rule)
    }

    /// Sends the request upstream once and returns whatever comes back.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, ProxyForwardingError> {
        let route = self
            .find(path_and_query)
            .ok_or_else(|| ProxyForwardingError::NoRoute(path_and_query.to_owned()))?;

        let upstream = route.rule.upstream_url(path_and_query);
        let url = reqwest::Url::parse(&upstream)
            .map_err(|source| ProxyForwardingError::InvalidUrl {
                url: upstream.clone(),
                source,
            })?;

        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);

        if route.rule.change_origin() {
            headers.remove(header::HOST);
        }

        tracing::debug!(%method, from = path_and_query, to = %url, "forwarding request");

        let response = route
            .client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        let body = response.bytes().await?;

        tracing::debug!(%status, len = body.len(), "upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    fn find(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.rule.matches(path))
    }
}

/// Certificate checks are only ever skipped in debug builds.
pub fn accepts_invalid_certs(rule: &ProxyRule) -> bool {
    !rule.secure() && cfg!(debug_assertions)
}

fn upstream_client(rule: &ProxyRule) -> Result<reqwest::Client, TransportError> {
    let accept_invalid_certs = accepts_invalid_certs(rule);

    if accept_invalid_certs {
        tracing::warn!(
            upstream = %rule.target(),
            "upstream certificate verification disabled for development"
        );
    } else if !rule.secure() {
        tracing::warn!(
            upstream = %rule.target(),
            "ignoring insecure proxy rule outside a debug build"
        );
    }

    reqwest::Client::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .redirect(redirect::Policy::none())
        .build()
}

/// Removes the fixed hop-by-hop set plus every header named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect::<Vec<_>>();

    for name in listed.iter().chain(HOP_BY_HOP_HEADERS.iter()) {
        headers.remove(name);
    }
}
