use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures_util::StreamExt as _;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::models_ws::{WsClientMessage, WsServerMessage};
use crate::config::AppConfig;
use crate::db::models::Role;
use crate::db::{service::DbService, DbPool};
use crate::llm::{
    models::{ChatOptions, Message as LlmMessage},
    LlmProvider,
};
use crate::sqlrun;

#[get("/ws/chat")]
pub async fn ws_chat(
    req: HttpRequest,
    body: web::Payload,
    pool: web::Data<DbPool>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, Error> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, body)?;

    info!("WebSocket connection established");

    // web::Data<T> behaves like an Arc<T>. To get the inner Arc out of Data<Arc<T>> we deref and clone.
    let llm_arc = llm.as_ref().clone();
    let pool_arc = pool.as_ref().clone();
    let config = config.as_ref().clone();

    actix_web::rt::spawn(async move {
        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                Message::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        return;
                    }
                }
                Message::Text(text) => {
                    let client_msg: Result<WsClientMessage, _> = serde_json::from_str(&text);
                    if let Ok(msg) = client_msg {
                        if msg.r#type == "message" {
                            handle_chat_message(
                                msg,
                                &config,
                                pool_arc.clone(),
                                llm_arc.clone(),
                                &mut session,
                            )
                            .await;
                        }
                    }
                }
                Message::Close(reason) => {
                    let _ = session.close(reason).await;
                    break;
                }
                _ => {}
            }
        }
        info!("WebSocket connection closed");
    });

    Ok(response)
}

async fn handle_chat_message(
    msg: WsClientMessage,
    config: &AppConfig,
    pool: DbPool,
    llm: Arc<dyn LlmProvider>,
    session: &mut actix_ws::Session,
) {
    let model = msg.model.unwrap_or_else(|| config.groq.default_model.clone());

    // 1. Save user message to database
    let conn = pool.lock().unwrap();
    if let Err(e) = DbService::insert_message(&conn, Role::User.as_str(), &msg.content, Some(&model)) {
        error!("Failed to insert user message: {}", e);
        let err_resp = WsServerMessage {
            r#type: "error".to_string(),
            content: "Database error".to_string(),
        };
        let _ = session.text(serde_json::to_string(&err_resp).unwrap()).await;
        return;
    }

    // 2. Fetch history
    let history = match DbService::recent_messages(&conn, config.chat.max_history_messages as usize) {
        Ok(msgs) => msgs,
        Err(e) => {
            error!("Failed to fetch history: {}", e);
            return;
        }
    };

    let llm_messages: Vec<LlmMessage> = history
        .into_iter()
        .map(|m| LlmMessage {
            role: m.role,
            content: m.content,
        })
        .collect();

    drop(conn);

    // 3. Trigger streaming LLM provider request
    let (tx, mut rx) = mpsc::channel::<String>(100);

    let llm_clone = llm.clone();
    let opts = ChatOptions {
        model: Some(model.clone()),
        system_prompt: Some(config.chat.system_prompt.clone()),
        ..Default::default()
    };

    // Spawn the network request in the background so we can listen on the chunk channel
    tokio::spawn(async move {
        if let Err(e) = llm_clone.chat_streaming(&llm_messages, opts, tx).await {
            error!("LLM Streaming Error: {:?}", e);
        }
    });

    let mut full_assistant_response = String::new();

    // 4. Stream tokens to WS client
    while let Some(chunk) = rx.recv().await {
        full_assistant_response.push_str(&chunk);
        let resp = WsServerMessage {
            r#type: "chunk".to_string(),
            content: chunk,
        };
        if session.text(serde_json::to_string(&resp).unwrap()).await.is_err() {
            // Client likely disconnected
            break;
        }
    }

    // 5. Save the assistant reply and run any SQL blocks it contains
    let conn = pool.lock().unwrap();
    let saved_id = match DbService::insert_message(
        &conn,
        Role::Assistant.as_str(),
        &full_assistant_response,
        Some(&model),
    ) {
        Ok(message) => Some(message.id),
        Err(e) => {
            error!("Failed to insert assistant message: {}", e);
            None
        }
    };

    let mut sql_frames: Vec<String> = Vec::new();
    if config.sql.enabled {
        for outcome in sqlrun::run_reply_blocks(&conn, &full_assistant_response, config.sql.max_rows) {
            let content = match (outcome.output, outcome.error) {
                (Some(output), _) => sqlrun::render_table(&output),
                (None, Some(e)) => format!("SQL error: {}", e),
                (None, None) => continue,
            };
            sql_frames.push(content);
        }
    }
    drop(conn);

    // 6. Send 'done' carrying the saved message id so the client can attach feedback
    let done_msg = WsServerMessage {
        r#type: "done".to_string(),
        content: saved_id.map(|id| id.to_string()).unwrap_or_default(),
    };
    let _ = session.text(serde_json::to_string(&done_msg).unwrap()).await;

    // 7. Deliver SQL results after the reply text is complete
    for content in sql_frames {
        let resp = WsServerMessage {
            r#type: "sql_result".to_string(),
            content,
        };
        let _ = session.text(serde_json::to_string(&resp).unwrap()).await;
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(ws_chat);
}
