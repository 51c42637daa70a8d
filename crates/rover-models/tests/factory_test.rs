//! End-to-end tests for models built through `ModelFactory`.

use rover_abstraction::{ChatMessage, ModelError, ModelParameters};
use rover_models::{ModelConfig, ModelFactory, ModelType};

#[tokio::test]
async fn test_groq_model_from_config_hits_chat_completions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/v1/chat/completions")
        .match_header("authorization", "Bearer groq-key")
        .with_status(200)
        .with_body(r#"{"choices": [{"message": {"content": "def add(a, b):\n    return a + b"}}]}"#)
        .create_async()
        .await;

    let config = ModelConfig::detect("openai/gpt-oss-120b")
        .unwrap()
        .with_api_key("groq-key".to_string())
        .with_base_url(format!("{}/openai/v1/", server.url()))
        .with_max_retries(1);
    assert_eq!(config.model_type, ModelType::Groq);

    let model = ModelFactory::create(&config).unwrap();
    let response = model
        .generate_text("write add", Some(ModelParameters::new(0.3, 2000)))
        .await
        .unwrap();

    assert_eq!(response.content, "def add(a, b):\n    return a + b");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retry_wrapper_reports_attempt_count() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream down")
        .expect(2)
        .create_async()
        .await;

    let config = ModelConfig::new(ModelType::OpenAI, "gpt-4o".to_string())
        .with_api_key("k".to_string())
        .with_base_url(server.url())
        .with_max_retries(2);
    let model = ModelFactory::create(&config).unwrap();

    let err = model
        .generate_chat_completion(&[ChatMessage::user("hi")], None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ModelError::Other(
            "Generation failed after 2 attempts: Model Response Error: OPENAI API error 500: upstream down"
                .to_string()
        )
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_model_from_config() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.0-flash:generateContent")
        .match_query(mockito::Matcher::UrlEncoded("key".into(), "g-key".into()))
        .with_status(200)
        .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "{\"task\": \"t\"}"}]}}]}"#)
        .create_async()
        .await;

    let config = ModelConfig::detect("gemini-2.0-flash")
        .unwrap()
        .with_api_key("g-key".to_string())
        .with_base_url(server.url());
    let model = ModelFactory::create(&config).unwrap();

    let response = model.generate_text("plan", None).await.unwrap();
    assert_eq!(response.content, r#"{"task": "t"}"#);
    assert_eq!(model.model_id(), "gemini-2.0-flash");
}
