use mockito::Matcher;
use newswise::llm::gemini::GeminiProvider;
use newswise::llm::remote::RemoteLlmProvider;
use newswise::llm::{LlmProvider, LlmRequest};

const GEMINI_PATH: &str = "/models/gemini-2.0-flash:generateContent";

#[tokio::test]
async fn test_gemini_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "fake-api-key".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"contents":[{"parts":[{"text":"Test prompt"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "This is a test response"}], "role": "model"},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 10,
                    "candidatesTokenCount": 5,
                    "totalTokenCount": 15
                },
                "modelVersion": "gemini-2.0-flash-001"
            }"#,
        )
        .create_async()
        .await;

    let provider = GeminiProvider::new(
        format!("{}/models", server.url()),
        "fake-api-key",
        "gemini-2.0-flash",
    );

    let response = provider
        .generate(LlmRequest::prompt("Test prompt"))
        .await
        .expect("generate");

    assert_eq!(response.content, "This is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gemini-2.0-flash-001");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_provider_without_candidates() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(format!("{}/models", server.url()), "k", "gemini-2.0-flash");
    let response = provider.generate(LlmRequest::prompt("Test")).await.unwrap();

    assert_eq!(response.content, "No response generated");
    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.model, "gemini-2.0-flash");
}

#[tokio::test]
async fn test_gemini_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"code": 429, "message": "Resource has been exhausted"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(format!("{}/models", server.url()), "k", "gemini-2.0-flash");
    let result = provider.generate(LlmRequest::prompt("Test")).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("429"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = GeminiProvider::new(format!("{}/models", server.url()), "k", "gemini-2.0-flash");

    let request = LlmRequest {
        timeout_seconds: Some(1),
        ..LlmRequest::prompt("Test")
    };
    let result = provider.generate(request).await;

    assert!(result.unwrap_err().to_string().contains("timed out"));
}

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "model": "gpt-4o-mini",
                "choices": [{
                    "message": {"role": "assistant", "content": "Technology"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
            }"#,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let request = LlmRequest {
        prompt: "Test prompt".to_string(),
        max_tokens: Some(100),
        temperature: Some(0.7),
        timeout_seconds: Some(10),
    };
    let response = provider.generate(request).await.unwrap();

    assert_eq!(response.content, "Technology");
    assert_eq!(response.usage.total_tokens, 11);
    assert_eq!(response.model, "gpt-4o-mini");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_empty_choices() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "k", "gpt-4o-mini");
    let response = provider.generate(LlmRequest::prompt("Test")).await.unwrap();

    assert_eq!(response.content, "No response generated");
    assert_eq!(response.model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(br#"{"choices": []}"#)
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "k", "gpt-4o-mini");

    let request = LlmRequest {
        timeout_seconds: Some(1),
        ..LlmRequest::prompt("Test")
    };
    let result = provider.generate(request).await;

    assert!(result.unwrap_err().to_string().contains("timed out"));
}
