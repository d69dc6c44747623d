use super::*;
use autoengage_protocols::{comment_schema, CommentSuggestion, ImagePayload};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generator(server: &MockServer) -> GeminiGenerator {
    GeminiGenerator::with_options("test-key", Some(&server.uri()), "gemini-2.0-flash", Duration::from_secs(5))
        .unwrap()
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 30, "totalTokenCount": 42 }
    }))
}

#[test]
fn test_empty_key_rejected() {
    let err = GeminiGenerator::new("  ").err().unwrap();
    assert!(matches!(err, GenerationError::NotConfigured(_)));
}

#[test]
fn test_generator_id_and_model() {
    let generator = GeminiGenerator::new("key").unwrap();
    assert_eq!(generator.id(), "gemini");
    assert_eq!(generator.model(), "gemini-2.0-flash");
}

#[test]
fn test_build_request_puts_image_first() {
    let generator = GeminiGenerator::new("key").unwrap().with_temperature(0.7);
    let request = GenerationRequest::new(comment_schema(), "Write a comment")
        .with_image(ImagePayload::png("iVBORw0"));

    let body = serde_json::to_value(generator.build_request(&request)).unwrap();

    assert_eq!(body["contents"][0]["role"], json!("user"));
    assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], json!("image/png"));
    assert_eq!(body["contents"][0]["parts"][1]["text"], json!("Write a comment"));
    assert_eq!(body["generationConfig"]["responseMimeType"], json!("application/json"));
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], json!("ARRAY"));
    assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[test]
fn test_build_request_without_schema() {
    let generator = GeminiGenerator::new("key").unwrap();
    let body = serde_json::to_value(generator.build_request(&GenerationRequest::new(Value::Null, "hi"))).unwrap();
    assert!(body["generationConfig"].get("responseSchema").is_none());
    assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
}

#[test]
fn test_parse_json_text_fenced() {
    let value = parse_json_text("```json\n[{\"comment\": \"Nice\"}]\n```").unwrap();
    assert_eq!(value, json!([{ "comment": "Nice" }]));
    assert_eq!(parse_json_text(" {\"a\":1} ").unwrap(), json!({ "a": 1 }));
    assert!(parse_json_text("not json").is_err());
}

#[tokio::test]
async fn test_generate_returns_structured_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(text_response(
            r#"[{"comment":"That crust looks perfect","viralRate":80,"commentTokenCount":6}]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let value = generator(&server)
        .generate(GenerationRequest::new(comment_schema(), "Comment on this pizza"))
        .await
        .unwrap();

    let suggestions = CommentSuggestion::parse_list(&value);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].comment, "That crust looks perfect");
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(GenerationRequest::new(comment_schema(), "x"))
        .await
        .unwrap_err();

    match err {
        GenerationError::ApiError { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(GenerationRequest::new(comment_schema(), "x"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_blocked_prompt_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(GenerationRequest::new(comment_schema(), "x"))
        .await
        .unwrap_err();

    match err {
        GenerationError::InvalidResponse(msg) => assert!(msg.contains("SAFETY")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_model_text_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("Sure! Here is a comment: lovely"))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(GenerationRequest::new(comment_schema(), "x"))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}
