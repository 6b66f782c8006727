use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use track_renamer::utils::error::ErrorCategory;
use track_renamer::{App, GeminiClient, Settings};

fn ai_settings(server: &MockServer, api_key: Option<&str>) -> Settings {
    Settings {
        ai_api_key: api_key.map(str::to_string),
        ai_endpoint: server.base_url(),
        ai_model: "gemini-test".to_string(),
        ..Settings::default()
    }
}

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            {"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}
        ]
    })
}

/// 測試 Gemini 回覆 (含 code fence) 解析成 ParsedTrack
#[tokio::test]
async fn test_parse_filenames_with_ai() -> Result<()> {
    let server = MockServer::start();
    let ai_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .query_param("key", "config-key")
            .body_contains("01-some_artist-some_title.mp3");
        then.status(200).json_body(gemini_reply(
            "```json\n{\"tracks\": [{\"original_filename\": \"01-some_artist-some_title.mp3\", \"artist\": \"Some Artist\", \"title\": \"Some Title\", \"track_number\": \"01\"}]}\n```",
        ));
    });

    let app = App::new(ai_settings(&server, Some("config-key")))?;
    let parsed = app
        .parse_filenames_with_ai(&["01-some_artist-some_title.mp3".to_string()], None)
        .await?;

    ai_mock.assert();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].original_filename, "01-some_artist-some_title.mp3");
    assert_eq!(parsed[0].artist, "Some Artist");
    assert_eq!(parsed[0].title, "Some Title");
    assert_eq!(parsed[0].track_number, "01");

    Ok(())
}

/// 測試呼叫端提供的金鑰優先於設定
#[tokio::test]
async fn test_explicit_api_key_wins() -> Result<()> {
    let server = MockServer::start();
    let ai_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-test:generateContent")
            .query_param("key", "flag-key");
        then.status(200).json_body(gemini_reply("{\"tracks\": []}"));
    });

    let app = App::new(ai_settings(&server, Some("config-key")))?;
    let parsed = app
        .parse_filenames_with_ai(&["a.mp3".to_string()], Some("flag-key"))
        .await?;

    ai_mock.assert();
    assert!(parsed.is_empty());

    Ok(())
}

/// 測試 API 回傳錯誤狀態
#[tokio::test]
async fn test_ai_api_error_status() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/gemini-test:generateContent");
        then.status(403).body("API key not valid");
    });

    let app = App::new(ai_settings(&server, Some("bad-key")))?;
    let err = app
        .parse_filenames_with_ai(&["a.mp3".to_string()], None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "AI API error: 403 Forbidden - API key not valid");
    assert_eq!(err.category(), ErrorCategory::Network);

    Ok(())
}

/// 測試沒有候選回覆與非 JSON 回覆
#[tokio::test]
async fn test_ai_response_errors() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/empty:generateContent");
        then.status(200).json_body(json!({"candidates": []}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1beta/models/chatty:generateContent");
        then.status(200)
            .json_body(gemini_reply("Sure! Here are your tracks."));
    });

    let client = reqwest::Client::new();

    let err = GeminiClient::new(client.clone(), "key")
        .with_endpoint(server.base_url())
        .with_model("empty")
        .parse_filenames(&["a.mp3".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no response from AI");

    let err = GeminiClient::new(client, "key")
        .with_endpoint(server.base_url())
        .with_model("chatty")
        .parse_filenames(&["a.mp3".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to parse AI response:"));
    assert!(err.to_string().ends_with("Content: Sure! Here are your tracks."));
    assert_eq!(err.category(), ErrorCategory::Data);

    Ok(())
}
