use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::{Json, Router};
use quotecard::bot::{callback_handler, BotServices};
use quotecard::card_store::QuoteCard;
use quotecard::config::Config;
use quotecard::dialogue::{CardAction, QuoteDialogue, QuoteDialogueState};
use quotecard::localization::init_localization;
use serde_json::{json, Value};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tempfile::TempDir;

const CHAT: ChatId = ChatId(4242);

type Calls = Arc<Mutex<Vec<String>>>;

/// Bot API double: answers callback queries, rejects every other method
async fn bot_api(State(calls): State<Calls>, uri: Uri) -> (StatusCode, Json<Value>) {
    let method = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    calls.lock().unwrap().push(method.clone());

    if method == "answercallbackquery" {
        (StatusCode::OK, Json(json!({"ok": true, "result": true})))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })),
        )
    }
}

async fn failing_bot() -> (Bot, Calls) {
    let calls: Calls = Arc::default();
    let app = Router::new()
        .fallback(bot_api)
        .with_state(Arc::clone(&calls));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = reqwest::Url::parse(&format!("http://{addr}/")).unwrap();
    (Bot::new("12345:TEST").set_api_url(url), calls)
}

fn services(dir: &TempDir) -> Arc<BotServices> {
    let log_path = dir.path().join("promtreq.json");
    let config = Config::from_lookup(|key| match key {
        "TELEGRAM_APITOKEN2" => Some("12345:TEST".to_string()),
        "YANDEX_API_KEY" => Some("key".to_string()),
        "YANDEX_CATALOG_ID" => Some("catalog".to_string()),
        "YANDEX_API_ART_KEY" => Some("art".to_string()),
        "INTERACTION_LOG_PATH" => Some(log_path.display().to_string()),
        _ => None,
    })
    .unwrap();
    Arc::new(BotServices::from_config(Arc::new(config)).unwrap())
}

fn card_query(action: CardAction) -> CallbackQuery {
    serde_json::from_value(json!({
        "id": "4382bfdwdsb323b2d9",
        "from": {
            "id": 4242,
            "is_bot": false,
            "first_name": "Ann",
            "language_code": "en"
        },
        "chat_instance": "-7781236541",
        "data": action.data()
    }))
    .unwrap()
}

fn answered(calls: &Calls) -> bool {
    calls
        .lock()
        .unwrap()
        .iter()
        .any(|method| method == "answercallbackquery")
}

#[tokio::test]
async fn test_failed_channel_send_still_answers_callback() {
    let _ = init_localization();
    let dir = TempDir::new().unwrap();
    let services = services(&dir);
    services
        .cards
        .remember(
            CHAT,
            QuoteCard {
                file_id: FileId("AgACAgIAAxkBAAI".to_string()),
                caption: "«Courage»".to_string(),
            },
        )
        .await;
    let (bot, calls) = failing_bot().await;
    let dialogue = QuoteDialogue::new(InMemStorage::<QuoteDialogueState>::new(), CHAT);

    let result = callback_handler(
        bot,
        card_query(CardAction::SendToChannel),
        services,
        dialogue,
    )
    .await;

    assert!(result.is_err());
    assert!(calls.lock().unwrap().iter().any(|m| m == "sendphoto"));
    assert!(answered(&calls));
}

#[tokio::test]
async fn test_failed_prompt_still_awaits_fresh_query() {
    let _ = init_localization();
    let dir = TempDir::new().unwrap();
    let (bot, calls) = failing_bot().await;
    let storage = InMemStorage::<QuoteDialogueState>::new();
    let dialogue = QuoteDialogue::new(Arc::clone(&storage), CHAT);

    let result = callback_handler(
        bot,
        card_query(CardAction::GenerateAgain),
        services(&dir),
        dialogue.clone(),
    )
    .await;

    assert!(result.is_err());
    assert!(calls.lock().unwrap().iter().any(|m| m == "sendmessage"));
    assert!(answered(&calls));
    assert_eq!(
        dialogue.get().await.unwrap(),
        Some(QuoteDialogueState::AwaitingFreshQuery)
    );
}

#[tokio::test]
async fn test_send_without_card_answers_without_posting() {
    let _ = init_localization();
    let dir = TempDir::new().unwrap();
    let (bot, calls) = failing_bot().await;
    let dialogue = QuoteDialogue::new(InMemStorage::<QuoteDialogueState>::new(), CHAT);

    let result = callback_handler(
        bot,
        card_query(CardAction::SendToChannel),
        services(&dir),
        dialogue,
    )
    .await;

    assert!(result.is_ok());
    assert!(answered(&calls));
    assert!(!calls.lock().unwrap().iter().any(|m| m == "sendphoto"));
}
