use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use voxdesk_server::{app, config::Config, AppState};

fn setup_state(keys: &[&str]) -> AppState {
    let mut config = Config::default();
    for var in keys {
        config.providers.set(var, "test-key");
    }
    AppState::from_config(&config)
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn put_setting(state: &AppState, key: &str, value: &str) -> (StatusCode, Value) {
    send(
        state,
        "PUT",
        &format!("/api/v1/settings/{}", key),
        Some(json!({ "value": value })),
    )
    .await
}

#[tokio::test]
async fn test_catalog_reflects_configured_keys_and_defaults() {
    let state = setup_state(&["GROQ_API_KEY", "DEEPGRAM_API_KEY"]);
    let (status, json) = send(&state, "GET", "/api/v1/settings", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["environment"], "development");
    assert_eq!(json["llm"]["default_provider"], "groq");
    assert_eq!(json["llm"]["default_model"], "llama-3.3-70b-versatile");
    assert_eq!(json["llm"]["providers"]["groq"]["configured"], true);
    assert_eq!(json["llm"]["providers"]["openai"]["configured"], false);
    assert_eq!(json["tts"]["default_provider"], "deepgram");
    assert_eq!(json["tts"]["default_voice"], "aura-2-andromeda-en");
    assert_eq!(json["search"]["providers"]["duckduckgo"]["configured"], true);
    assert_eq!(json["search"]["providers"]["tavily"]["configured"], false);
    assert!(json["llm"]["providers"]["groq"]["models"]
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m == "llama-3.1-8b-instant"));
}

#[tokio::test]
async fn test_voice_providers_defaults() {
    let state = setup_state(&[]);
    let (status, json) = send(&state, "GET", "/api/v1/settings/voice-providers", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "tts": { "provider": "deepgram", "voice": "aura-2-andromeda-en" },
            "stt": { "provider": "deepgram" },
            "llm": { "provider": "groq", "model": "llama-3.3-70b-versatile" },
        })
    );
}

#[tokio::test]
async fn test_update_is_visible_to_later_reads() {
    let state = setup_state(&["OPENAI_API_KEY"]);

    let (status, json) = put_setting(&state, "tts-provider", "openai").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "key": "tts_provider", "value": "openai" }));

    let (status, _) = put_setting(&state, "tts-voice", "nova").await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&state, "GET", "/api/v1/settings/voice-providers", None).await;
    assert_eq!(json["tts"]["provider"], "openai");
    assert_eq!(json["tts"]["voice"], "nova");

    let (_, json) = send(&state, "GET", "/api/v1/settings", None).await;
    assert_eq!(json["tts"]["default_provider"], "openai");
}

#[tokio::test]
async fn test_llm_provider_and_model_updates() {
    let state = setup_state(&["OPENROUTER_API_KEY"]);

    let (status, json) = put_setting(&state, "llm-provider", "openrouter").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "llm_provider");

    let (status, json) = put_setting(&state, "llm-model", "llama-3.1-8b-instant").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("anthropic/claude-3.5-sonnet"));

    let (status, _) = put_setting(&state, "llm-model", "anthropic/claude-3.5-sonnet").await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&state, "GET", "/api/v1/settings/llm-provider", None).await;
    assert_eq!(
        json,
        json!({ "provider": "openrouter", "model": "anthropic/claude-3.5-sonnet" })
    );
}

#[tokio::test]
async fn test_unconfigured_provider_is_rejected() {
    let state = setup_state(&[]);

    for (key, value, var) in [
        ("llm-provider", "openai", "OPENAI_API_KEY"),
        ("stt-provider", "openai", "OPENAI_API_KEY"),
        ("search-provider", "tavily", "TAVILY_API_KEY"),
        ("tts-provider", "elevenlabs", "ELEVENLABS_API_KEY"),
    ] {
        let (status, json) = put_setting(&state, key, value).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} = {}", key, value);
        assert!(json["error"].as_str().unwrap().contains(var));
    }

    let (status, _) = put_setting(&state, "search-provider", "duckduckgo").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_provider_is_rejected() {
    let state = setup_state(&["OPENAI_API_KEY"]);
    let (status, json) = put_setting(&state, "llm-provider", "anthropic").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("anthropic"));
    assert!(message.contains("openai, groq, openrouter"));
}

#[tokio::test]
async fn test_unknown_key_is_not_found() {
    let state = setup_state(&[]);

    let (status, json) = put_setting(&state, "favourite-colour", "blue").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("favourite-colour"));

    let (status, _) = send(&state, "GET", "/api/v1/settings/tts-voice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_provider_lookup() {
    let state = setup_state(&["BRAVE_API_KEY"]);
    let (_, json) = send(&state, "GET", "/api/v1/settings/search-provider", None).await;
    assert_eq!(json, json!({ "provider": "duckduckgo" }));

    put_setting(&state, "search-provider", "brave").await;
    let (_, json) = send(&state, "GET", "/api/v1/settings/search-provider", None).await;
    assert_eq!(json, json!({ "provider": "brave" }));
}
