use {
    super::*,
    crate::{accepts_invalid_certs, WALLETCONNECT_CONTEXT},
    serde::{Deserialize, Serialize},
    tokio::sync::oneshot,
};

#[derive(Debug, Serialize, Deserialize)]
struct Echo {
    method: String,
    path: String,
    query: Option<String>,
    host: Option<String>,
    headers: Vec<String>,
    body: String,
}

/// Upstream double: `/teapot` answers 418, everything else echoes the
/// request back as JSON.
fn spawn_upstream() -> SocketAddr {
    let teapot = warp::path("teapot").and(warp::path::end()).map(|| {
        warp::reply::with_header(
            warp::reply::with_status("short and stout", StatusCode::IM_A_TEAPOT),
            "x-upstream",
            "teapot",
        )
    });

    let echo = warp::method()
        .and(warp::path::full())
        .and(optional_raw_query())
        .and(warp::header::optional::<String>("host"))
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .map(
            |method: http::Method,
             path: FullPath,
             query: Option<String>,
             host: Option<String>,
             headers: http::HeaderMap,
             body: Bytes| {
                warp::reply::json(&Echo {
                    method: method.to_string(),
                    path: path.as_str().to_owned(),
                    query,
                    host,
                    headers: headers.keys().map(|name| name.to_string()).collect(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                })
            },
        );

    let (addr, server) = warp::serve(teapot.or(echo)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn proxy_to(addr: SocketAddr, change_origin: bool) -> Arc<Proxy> {
    let rule = ProxyRule::new(WALLETCONNECT_CONTEXT, &format!("http://{addr}"))
        .unwrap()
        .with_change_origin(change_origin);

    Arc::new(Proxy::new([rule]).unwrap())
}

fn echo(response: &http::Response<Bytes>) -> Echo {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn prefix_is_stripped_before_forwarding() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), None);

    let response = warp::test::request()
        .path("/api/walletconnect/verify?x=1")
        .header("host", "localhost:5173")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let echo = echo(&response);
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/verify");
    assert_eq!(echo.query.as_deref(), Some("x=1"));
    assert_eq!(echo.host, Some(upstream.to_string()));
}

#[tokio::test]
async fn remainder_reaches_upstream_unchanged() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), None);

    for (path, query) in [
        ("//verify", None),
        ("/a%2Fb/%20c", None),
        ("/it's/%E2%9C%93", None),
        ("/verify", Some("x=%20&y=a+b&x=2")),
    ] {
        let request = match query {
            Some(query) => format!("/api/walletconnect{path}?{query}"),
            None => format!("/api/walletconnect{path}"),
        };

        let response = warp::test::request().path(&request).reply(&routes).await;
        assert_eq!(response.status(), StatusCode::OK, "{request}");

        let echo = echo(&response);
        assert_eq!(echo.path, path, "{request}");
        assert_eq!(echo.query.as_deref(), query, "{request}");
    }
}

#[tokio::test]
async fn connection_listed_headers_are_not_forwarded() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), None);

    let response = warp::test::request()
        .path("/api/walletconnect/headers")
        .header("connection", "x-hop")
        .header("x-hop", "1")
        .header("x-end", "2")
        .reply(&routes)
        .await;

    let echo = echo(&response);
    assert_eq!(echo.path, "/headers");
    assert!(!echo.headers.contains(&"x-hop".to_owned()));
    assert!(echo.headers.contains(&"x-end".to_owned()));
}

#[tokio::test]
async fn host_is_kept_without_change_origin() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, false), None);

    let response = warp::test::request()
        .path("/api/walletconnect/attestation/abc")
        .header("host", "localhost:5173")
        .reply(&routes)
        .await;

    let echo = echo(&response);
    assert_eq!(echo.path, "/attestation/abc");
    assert_eq!(echo.query, None);
    assert_eq!(echo.host.as_deref(), Some("localhost:5173"));
}

#[tokio::test]
async fn method_and_body_are_forwarded() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), None);

    let response = warp::test::request()
        .method("POST")
        .path("/api/walletconnect")
        .header("content-type", "application/json")
        .body(r#"{"attestation":"x"}"#)
        .reply(&routes)
        .await;

    let echo = echo(&response);
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/");
    assert_eq!(echo.body, r#"{"attestation":"x"}"#);
}

#[tokio::test]
async fn upstream_errors_pass_through() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), None);

    let response = warp::test::request()
        .path("/api/walletconnect/teapot")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers()["x-upstream"], "teapot");
    assert_eq!(response.body().as_ref(), b"short and stout");
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let routes = routes(proxy_to(addr, true), None);

    let response = warp::test::request()
        .path("/api/walletconnect/verify")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn other_paths_are_not_proxied() {
    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), None);

    for path in ["/", "/api/other", "/verify", "/x/api/walletconnect"] {
        let response = warp::test::request().path(path).reply(&routes).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn preview_serves_static_files_behind_the_proxy() {
    let dir = std::env::temp_dir().join(format!("dev_proxy_dist_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("assets")).unwrap();
    std::fs::write(dir.join("index.html"), "<div id=app></div>").unwrap();
    std::fs::write(dir.join("assets/app.js"), "console.log(1)").unwrap();

    let upstream = spawn_upstream();
    let routes = routes(proxy_to(upstream, true), Some(dir.clone()));

    let asset = warp::test::request()
        .path("/assets/app.js")
        .reply(&routes)
        .await;
    assert_eq!(asset.body().as_ref(), b"console.log(1)");

    let fallback = warp::test::request().path("/wallet/settings").reply(&routes).await;
    assert_eq!(fallback.body().as_ref(), b"<div id=app></div>");

    let proxied = warp::test::request()
        .path("/api/walletconnect/verify")
        .reply(&routes)
        .await;
    assert_eq!(echo(&proxied).path, "/verify");

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn bound_server_forwards_and_shuts_down() {
    let upstream = spawn_upstream();
    let rule = ProxyRule::new(WALLETCONNECT_CONTEXT, &format!("http://{upstream}"))
        .unwrap()
        .with_change_origin(true);
    let config = ServerConfig::serve(vec![rule])
        .with_host("127.0.0.1")
        .with_port(0);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let (addr, server) = bind(config, async {
        shutdown_rx.await.ok();
    })
    .await
    .unwrap();
    let server = tokio::spawn(server);

    let body = reqwest::get(format!("http://{addr}/api/walletconnect/verify?x=1"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let echo: Echo = serde_json::from_slice(&body).unwrap();
    assert_eq!(echo.path, "/verify");
    assert_eq!(echo.query.as_deref(), Some("x=1"));

    shutdown_tx.send(()).unwrap();
    server.await.unwrap();
}

#[test]
fn config_defaults() {
    let serve = ServerConfig::serve(vec![]);
    assert_eq!(serve.mode, Mode::Serve);
    assert_eq!((serve.host.as_str(), serve.port), ("localhost", 5173));
    assert_eq!(serve.static_dir, None);

    let preview = ServerConfig::preview("abc.ngrok-free.app", vec![]);
    assert_eq!(preview.mode, Mode::Preview);
    assert_eq!((preview.host.as_str(), preview.port), ("abc.ngrok-free.app", 4173));
    assert_eq!(preview.static_dir, Some(PathBuf::from("dist")));
}

#[test]
fn insecure_rule_only_relaxed_in_debug_builds() {
    let rule = ProxyRule::walletconnect_verify().unwrap();
    assert_eq!(accepts_invalid_certs(&rule), cfg!(debug_assertions));

    let secure = rule.with_secure(true);
    assert!(!accepts_invalid_certs(&secure));
}
