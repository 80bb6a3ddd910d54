use actix_web::{delete, get, post, web, HttpResponse, Result as WebResult};
use std::sync::Arc;
use tracing::info;

use crate::api::models::{
    ChatRequest, ChatResponseBody, FeedbackRequest, HistoryQuery, TranscriptionQuery,
};
use crate::config::AppConfig;
use crate::db::models::Role;
use crate::db::{service::DbService, DbPool};
use crate::llm::catalog::ModelCatalog;
use crate::llm::{
    models::{ChatOptions, Message as LlmMessage, TranscriptionRequest},
    LlmProvider,
};
use crate::sqlrun;

// --- Chat ---

#[post("/chat")]
pub async fn post_chat(
    pool: web::Data<DbPool>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    config: web::Data<AppConfig>,
    req: web::Json<ChatRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();

    if req.content.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().body("Message content is empty"));
    }

    let model = req.model.unwrap_or_else(|| config.groq.default_model.clone());

    let conn = pool.lock().unwrap();

    if let Err(e) = DbService::insert_message(&conn, Role::User.as_str(), &req.content, Some(&model)) {
        return Ok(HttpResponse::InternalServerError().body(e.to_string()));
    }

    // Fetch history for LLM context
    let history = match DbService::recent_messages(&conn, config.chat.max_history_messages as usize) {
        Ok(msgs) => msgs,
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };

    let llm_messages: Vec<LlmMessage> = history
        .into_iter()
        .map(|m| LlmMessage {
            role: m.role,
            content: m.content,
        })
        .collect();

    // Drop the DuckDB connection lock so we don't block other threads during the slow LLM network boundary
    drop(conn);

    let chat_options = ChatOptions {
        model: Some(model),
        system_prompt: Some(config.chat.system_prompt.clone()),
        ..Default::default()
    };

    let response = match llm.chat(&llm_messages, chat_options).await {
        Ok(res) => res,
        Err(e) => return Ok(HttpResponse::InternalServerError().body(format!("LLM Error: {}", e))),
    };

    if let Some(usage) = &response.usage {
        info!(
            "Chat completion on {} used {} input + {} output tokens",
            response.model, usage.input_tokens, usage.output_tokens
        );
    }

    // Re-lock the DB pool to insert the assistant's reply
    let conn = pool.lock().unwrap();

    let assistant_msg = match DbService::insert_message(
        &conn,
        Role::Assistant.as_str(),
        &response.content,
        Some(&response.model),
    ) {
        Ok(message) => message,
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };

    let sql_results = if config.sql.enabled {
        sqlrun::run_reply_blocks(&conn, &assistant_msg.content, config.sql.max_rows)
    } else {
        Vec::new()
    };

    Ok(HttpResponse::Created().json(ChatResponseBody {
        message: assistant_msg,
        sql_results,
    }))
}

// --- History ---

#[get("/history")]
pub async fn get_history(
    pool: web::Data<DbPool>,
    query: web::Query<HistoryQuery>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    let result = match query.q.as_deref() {
        Some(q) if !q.trim().is_empty() => DbService::search_messages(&conn, q, query.limit),
        _ => DbService::list_messages(&conn, query.limit, query.offset),
    };

    match result {
        Ok(messages) => Ok(HttpResponse::Ok().json(messages)),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

#[delete("/history")]
pub async fn clear_history(pool: web::Data<DbPool>) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::clear_messages(&conn) {
        Ok(deleted) => Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": deleted }))),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

// --- Feedback ---

#[post("/messages/{id}/feedback")]
pub async fn post_feedback(
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    req: web::Json<FeedbackRequest>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();
    let id = id.into_inner();
    let req = req.into_inner();

    // Check if the message exists first for better 404 handling
    if !DbService::message_exists(&conn, id).unwrap_or(false) {
        return Ok(HttpResponse::NotFound().body("Message not found"));
    }

    match DbService::save_feedback(&conn, id, req.is_positive, req.comment.as_deref()) {
        Ok((feedback, updated)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "feedback": feedback,
            "status": if updated { "updated" } else { "saved" },
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

// --- Models ---

#[get("/models")]
pub async fn get_models(catalog: web::Data<ModelCatalog>) -> WebResult<HttpResponse> {
    match catalog.list().await {
        Ok(entries) => Ok(HttpResponse::Ok().json(entries)),
        Err(e) => Ok(HttpResponse::InternalServerError().body(format!("Model Listing Error: {}", e))),
    }
}

// --- Transcriptions ---

#[post("/transcriptions")]
pub async fn post_transcription(
    llm: web::Data<Arc<dyn LlmProvider>>,
    query: web::Query<TranscriptionQuery>,
    body: web::Bytes,
) -> WebResult<HttpResponse> {
    if body.is_empty() {
        return Ok(HttpResponse::BadRequest().body("Audio payload is empty"));
    }

    let query = query.into_inner();
    let request = TranscriptionRequest {
        file_name: query.filename.unwrap_or_else(|| "audio.wav".to_string()),
        data: body.to_vec(),
        model: query.model,
        language: query.language.filter(|l| !l.trim().is_empty()),
    };

    match llm.transcribe(request).await {
        Ok(text) => Ok(HttpResponse::Ok().json(serde_json::json!({ "text": text }))),
        Err(e) => Ok(HttpResponse::InternalServerError().body(format!("Transcription Error: {}", e))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(post_chat)
        .service(get_history)
        .service(clear_history)
        .service(post_feedback)
        .service(get_models)
        .service(post_transcription);
}
