use url::Url;

/// Local path prefix forwarded to the WalletConnect Verify API.
pub const WALLETCONNECT_CONTEXT: &str = "/api/walletconnect";

pub const VERIFY_SERVER_ADDRESS: &str = "https://verify.walletconnect.org";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Proxy context must start with '/': {0}")]
    InvalidContext(String),

    #[error("Invalid proxy target: {0}")]
    InvalidTarget(#[from] url::ParseError),

    #[error("Unsupported proxy target scheme: {0}")]
    UnsupportedScheme(String),
}

/// Forwards every request whose path starts with `context` to `target`, with
/// the prefix removed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    context: String,
    target: Url,
    change_origin: bool,
    secure: bool,
}

impl ProxyRule {
    /// New rule with `change_origin` off and certificate verification on.
    pub fn new(context: impl Into<String>, target: &str) -> Result<Self, RuleError> {
        let context = context.into();

        if !context.starts_with('/') {
            return Err(RuleError::InvalidContext(context));
        }

        let target = Url::parse(target)?;

        if !matches!(target.scheme(), "http" | "https") {
            return Err(RuleError::UnsupportedScheme(target.scheme().to_owned()));
        }

        Ok(Self {
            context,
            target,
            change_origin: false,
            secure: true,
        })
    }

    /// `/api/walletconnect` → `https://verify.walletconnect.org`, with the
    /// `Host` header rewritten and certificate verification relaxed.
    pub fn walletconnect_verify() -> Result<Self, RuleError> {
        Ok(Self::new(WALLETCONNECT_CONTEXT, VERIFY_SERVER_ADDRESS)?
            .with_change_origin(true)
            .with_secure(false))
    }

    /// Sends the upstream host as `Host` instead of the client's.
    pub fn with_change_origin(mut self, change_origin: bool) -> Self {
        self.change_origin = change_origin;
        self
    }

    /// `false` skips upstream certificate verification in debug builds.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.context)
    }

    /// Removes the leading prefix once. Anything else, including the query,
    /// is left as is; non-matching paths are returned unchanged.
    pub fn rewrite<'a>(&self, path_and_query: &'a str) -> &'a str {
        path_and_query
            .strip_prefix(self.context.as_str())
            .unwrap_or(path_and_query)
    }

    /// Upstream URL for a matching request: the target origin and base path
    /// followed by the [`rewrite`](Self::rewrite) output byte for byte. Only a
    /// remainder that doesn't start with `/` (e.g. the empty path or `?x=1`)
    /// gets a `/` in front.
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        let rewritten = self.rewrite(path_and_query);
        let base = self.target.path().trim_end_matches('/');
        let separator = if rewritten.starts_with('/') { "" } else { "/" };

        format!(
            "{}{base}{separator}{rewritten}",
            self.target.origin().ascii_serialization()
        )
    }
}
