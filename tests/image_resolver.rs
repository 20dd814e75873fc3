use kickoff::fetcher::HttpSettings;
use kickoff::resolver::{HttpImageResolver, ImageResolver};
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn resolver(timeout: Duration, max_bytes: u64) -> HttpImageResolver {
    HttpImageResolver::new(&HttpSettings::for_pages(timeout, max_bytes)).unwrap()
}

async fn serve_page(mock_server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_resolves_og_image() {
    let mock_server = MockServer::start().await;
    serve_page(
        &mock_server,
        "/article",
        r#"<html><head>
            <meta name="twitter:image" content="https://cdn.x/twitter.jpg">
            <meta property="og:image" content="https://cdn.x/og.jpg?w=1200&amp;h=630">
        </head><body></body></html>"#
            .to_string(),
    )
    .await;

    let image = resolver(Duration::from_secs(5), 300_000)
        .resolve(&format!("{}/article", mock_server.uri()))
        .await;
    assert_eq!(image, "https://cdn.x/og.jpg?w=1200&h=630");
}

#[tokio::test]
async fn test_resolves_reversed_attributes_and_fallbacks() {
    let mock_server = MockServer::start().await;
    serve_page(
        &mock_server,
        "/reversed",
        r#"<meta content="https://cdn.x/rev.jpg" property="og:image"/>"#.to_string(),
    )
    .await;
    serve_page(
        &mock_server,
        "/twitter",
        r#"<meta name="twitter:image" content="https://cdn.x/tw.jpg">"#.to_string(),
    )
    .await;
    serve_page(
        &mock_server,
        "/image-src",
        r#"<link rel="image_src" href="https://cdn.x/src.jpg">"#.to_string(),
    )
    .await;

    let resolver = resolver(Duration::from_secs(5), 300_000);
    let base = mock_server.uri();
    assert_eq!(resolver.resolve(&format!("{}/reversed", base)).await, "https://cdn.x/rev.jpg");
    assert_eq!(resolver.resolve(&format!("{}/twitter", base)).await, "https://cdn.x/tw.jpg");
    assert_eq!(resolver.resolve(&format!("{}/image-src", base)).await, "https://cdn.x/src.jpg");
}

#[tokio::test]
async fn test_relative_image_resolved_against_page() {
    let mock_server = MockServer::start().await;
    serve_page(
        &mock_server,
        "/news/article",
        r#"<meta property="og:image" content="/uploads/photo.webp">"#.to_string(),
    )
    .await;

    let image = resolver(Duration::from_secs(5), 300_000)
        .resolve(&format!("{}/news/article", mock_server.uri()))
        .await;
    assert_eq!(image, format!("{}/uploads/photo.webp", mock_server.uri()));
}

#[tokio::test]
async fn test_no_image_and_errors_yield_empty() {
    let mock_server = MockServer::start().await;
    serve_page(&mock_server, "/plain", "<html><head></head></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let resolver = resolver(Duration::from_secs(5), 300_000);
    assert_eq!(resolver.resolve(&format!("{}/plain", mock_server.uri())).await, "");
    assert_eq!(resolver.resolve(&format!("{}/gone", mock_server.uri())).await, "");
    assert_eq!(resolver.resolve("").await, "");
    assert_eq!(resolver.resolve("mailto:someone@example.com").await, "");
    assert_eq!(resolver.resolve("http://127.0.0.1:1/unreachable").await, "");
}

#[tokio::test]
async fn test_slow_page_is_bounded_by_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<meta property="og:image" content="https://cdn.x/late.jpg">"#)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let started = Instant::now();
    let image = resolver(Duration::from_millis(300), 300_000)
        .resolve(&format!("{}/slow", mock_server.uri()))
        .await;

    assert_eq!(image, "");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_image_beyond_byte_cap_is_not_found() {
    let mock_server = MockServer::start().await;
    let padding = "<!-- filler -->".repeat(1_000);
    serve_page(
        &mock_server,
        "/late-meta",
        format!(
            r#"<html><head>{}<meta property="og:image" content="https://cdn.x/late.jpg"></head></html>"#,
            padding
        ),
    )
    .await;

    let url = format!("{}/late-meta", mock_server.uri());
    assert_eq!(resolver(Duration::from_secs(5), 4_096).resolve(&url).await, "");
    assert_eq!(
        resolver(Duration::from_secs(5), 300_000).resolve(&url).await,
        "https://cdn.x/late.jpg"
    );
}

// The page never finishes: the resolver must return on the first match and
// hang up instead of waiting for the rest of the body.
#[tokio::test]
async fn test_returns_on_match_and_drops_unfinished_page() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();

        let head = r#"<html><head><meta property="og:image" content="https://cdn.x/early.jpg">"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 1000000\r\n\r\n{}",
            head
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();

        // Read until the client hangs up.
        let mut rest = [0u8; 256];
        let hung_up = loop {
            match socket.read(&mut rest).await {
                Ok(0) | Err(_) => break true,
                Ok(_) => {}
            }
        };
        let _ = closed_tx.send(hung_up);
    });

    let started = Instant::now();
    let image = resolver(Duration::from_secs(10), 300_000)
        .resolve(&format!("http://{}/article", addr))
        .await;

    assert_eq!(image, "https://cdn.x/early.jpg");
    assert!(started.elapsed() < Duration::from_secs(2));

    let hung_up = tokio::time::timeout(Duration::from_secs(2), closed_rx)
        .await
        .expect("connection left open after match")
        .unwrap();
    assert!(hung_up);
}
