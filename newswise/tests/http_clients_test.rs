use mockito::Matcher;
use newswise::context::{ArticleAnalyzer, RemoteContextClient};
use newswise::ingestion::{NewsApiClient, NewsSource};

#[tokio::test]
async fn test_news_api_client_sends_key_and_sources() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/v2/top-headlines")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("apiKey".into(), "secret".into()),
            Matcher::UrlEncoded("sources".into(), "bbc-news".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "status": "ok",
                "totalResults": 2,
                "articles": [
                    {"source": {"id": "bbc-news", "name": "BBC News"}, "title": "One",
                     "url": "https://bbc.co.uk/1", "publishedAt": "2024-05-01T10:00:00Z",
                     "content": "first"},
                    {"source": {"id": null, "name": "BBC News"}, "title": "Two", "content": null}
                ]
            }"#,
        )
        .create_async()
        .await;

    let client = NewsApiClient::new(format!("{}/v2/top-headlines", server.url()), "secret", 5).unwrap();
    let news = client.top_headlines("bbc-news").await.expect("headlines");

    assert_eq!(news.status, "ok");
    assert_eq!(news.total_results, 2);
    assert_eq!(news.articles.len(), 2);
    assert_eq!(news.articles[0].title.as_deref(), Some("One"));
    assert_eq!(news.articles[0].published_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    assert!(news.articles[1].content.is_none());
    assert!(news.articles[1].category.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_news_api_client_null_articles() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "ok", "totalResults": 0, "articles": null}"#)
        .create_async()
        .await;

    let client = NewsApiClient::new(server.url(), "k", 5).unwrap();
    let news = client.top_headlines("nowhere").await.unwrap();
    assert!(news.articles.is_empty());
}

#[tokio::test]
async fn test_news_api_client_error_status() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"status": "error", "code": "apiKeyInvalid"}"#)
        .create_async()
        .await;

    let client = NewsApiClient::new(server.url(), "bad", 5).unwrap();
    let err = client.top_headlines("bbc-news").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_remote_context_client_posts_plain_text() {
    let mut server = mockito::Server::new_async().await;

    let topic = server
        .mock("POST", "/api/context/topic")
        .match_header("content-type", Matcher::Regex("text/plain".to_string()))
        .match_body("Rocket launch")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"topic": "Space"}"#)
        .create_async()
        .await;
    let summary = server
        .mock("POST", "/api/context/summarize")
        .match_body("Rocket launch")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"unexpected": true}"#)
        .create_async()
        .await;

    let client = RemoteContextClient::new(format!("{}/", server.url()), 5).unwrap();

    let reply = client.topic("Rocket launch").await.unwrap();
    assert_eq!(reply.topic.as_deref(), Some("Space"));

    // missing key is tolerated and left to the caller's default
    let reply = client.summarize("Rocket launch").await.unwrap();
    assert!(reply.summary.is_none());

    topic.assert_async().await;
    summary.assert_async().await;
}

#[tokio::test]
async fn test_remote_context_client_error_status() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/context/topic")
        .with_status(503)
        .with_body("Context Service is currently unavailable. Please try again later.")
        .create_async()
        .await;

    let client = RemoteContextClient::new(server.url(), 5).unwrap();
    let err = client.topic("text").await.unwrap_err();
    assert!(err.to_string().contains("503"));
}
