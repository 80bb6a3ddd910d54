pub mod commands;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::cli::commands::{Commands, HistoryAction};
use crate::config::AppConfig;
use crate::db::models::{ChatMessage, Role};
use crate::db::{get_connection, service::DbService};
use crate::llm::catalog::{load_models_info, ModelCatalog};
use crate::llm::{
    create_provider,
    models::{ChatOptions, Message as LlmMessage, TranscriptionRequest},
};
use crate::sqlrun;

pub async fn run_cli(command: Commands, config_path: String) {
    let config = AppConfig::load(&config_path).expect("Failed to load config");

    match command {
        Commands::Serve => {
            panic!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::History { action } => {
            let pool = get_connection(&config.database).expect("DB error");
            let conn = pool.lock().unwrap();

            match action {
                HistoryAction::Show { limit } => match DbService::list_messages(&conn, limit, 0) {
                    Ok(messages) => print_messages(&messages),
                    Err(e) => eprintln!("Error: {}", e),
                },
                HistoryAction::Search { query } => {
                    match DbService::search_messages(&conn, &query, 50) {
                        Ok(messages) => {
                            if messages.is_empty() {
                                println!("No messages match '{}'.", query);
                            } else {
                                print_messages(&messages);
                            }
                        }
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                HistoryAction::Clear => match DbService::clear_messages(&conn) {
                    Ok(deleted) => println!("Cleared {} messages.", deleted),
                    Err(e) => eprintln!("Error: {}", e),
                },
            }
        }
        Commands::Models => {
            let llm = create_provider(&config).expect("Groq API key is missing in the configuration");
            let catalog = ModelCatalog::new(
                llm,
                load_models_info(&config.models.info_path),
                Duration::from_secs(config.models.cache_ttl_secs),
            );

            match catalog.list().await {
                Ok(entries) => {
                    println!("{:<40} | {}", "MODEL", "DESCRIPTION");
                    println!("{:-<40}-+-{:-<40}", "", "");
                    for entry in entries {
                        let description = entry
                            .description
                            .unwrap_or_else(|| "No description available.".to_string());
                        let first_line = description.lines().next().unwrap_or("");
                        println!("{:<40} | {}", entry.id, first_line);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Commands::Transcribe { path, language, model } => {
            let llm = create_provider(&config).expect("Groq API key is missing in the configuration");

            let data = std::fs::read(&path).expect("Failed to read audio file");
            let file_name = Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "audio".to_string());

            let request = TranscriptionRequest {
                file_name,
                data,
                model,
                language,
            };

            match llm.transcribe(request).await {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Transcription failed: {}", e),
            }
        }
        Commands::Feedback { message_id, rating, comment } => {
            let pool = get_connection(&config.database).expect("DB error");
            let conn = pool.lock().unwrap();

            if !DbService::message_exists(&conn, message_id).unwrap_or(false) {
                eprintln!("Message {} not found.", message_id);
                return;
            }

            match DbService::save_feedback(&conn, message_id, rating.is_positive(), comment.as_deref()) {
                Ok((_, true)) => println!("Feedback updated!"),
                Ok((_, false)) => println!("Feedback saved!"),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Commands::Chat { model } => {
            run_repl(config, model).await;
        }
    }
}

fn print_messages(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("No chat history available.");
        return;
    }

    for (i, m) in messages.iter().enumerate() {
        if i > 0 {
            println!("---");
        }
        println!("#{} [{}] {}", m.id, m.role.to_uppercase(), m.display_time());
        println!("{}", m.content);
    }
}

async fn run_repl(config: AppConfig, model_override: Option<String>) {
    let pool = get_connection(&config.database).expect("DB Error");
    let llm = create_provider(&config).expect("Groq API key is missing in the configuration");
    let model = model_override.unwrap_or_else(|| config.groq.default_model.clone());

    println!("--- LLAMABOT Terminal Chat ---");
    println!("Model: {}", model);
    println!("Type /exit to quit, /new to start over.");
    println!("------------------------------");

    loop {
        print!("\nUser> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        let read = io::stdin().read_line(&mut input).unwrap();
        if read == 0 {
            // stdin closed
            break;
        }
        let text = input.trim();

        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }
        if text == "/new" {
            let conn = pool.lock().unwrap();
            match DbService::clear_messages(&conn) {
                Ok(_) => println!("Started a new chat."),
                Err(e) => eprintln!("Failed to clear history: {}", e),
            }
            continue;
        }

        // Save user message
        {
            let conn = pool.lock().unwrap();
            if let Err(e) = DbService::insert_message(&conn, Role::User.as_str(), text, Some(&model)) {
                eprintln!("Failed to save message: {}", e);
                continue;
            }
        }

        // Fetch history
        let history = {
            let conn = pool.lock().unwrap();
            DbService::recent_messages(&conn, config.chat.max_history_messages as usize)
                .unwrap_or_default()
        };

        let llm_messages: Vec<LlmMessage> = history
            .into_iter()
            .map(|m| LlmMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let (tx, mut rx) = mpsc::channel::<String>(100);
        let llm_clone = llm.clone();
        let opts = ChatOptions {
            model: Some(model.clone()),
            system_prompt: Some(config.chat.system_prompt.clone()),
            ..Default::default()
        };

        print!("Llama> ");
        io::stdout().flush().unwrap();

        tokio::spawn(async move {
            let _ = llm_clone.chat_streaming(&llm_messages, opts, tx).await;
        });

        let mut response_text = String::new();
        while let Some(chunk) = rx.recv().await {
            print!("{}", chunk);
            io::stdout().flush().unwrap();
            response_text.push_str(&chunk);
        }
        println!();

        if response_text.is_empty() {
            eprintln!("No response from the API.");
            continue;
        }

        // Save assistant content
        {
            let conn = pool.lock().unwrap();
            let _ = DbService::insert_message(
                &conn,
                Role::Assistant.as_str(),
                &response_text,
                Some(&model),
            );
        }

        if config.sql.enabled {
            let conn = pool.lock().unwrap();
            for outcome in sqlrun::run_reply_blocks(&conn, &response_text, config.sql.max_rows) {
                match (outcome.output, outcome.error) {
                    (Some(output), _) => println!("\n{}", sqlrun::render_table(&output)),
                    (None, Some(e)) => eprintln!("SQL error: {}", e),
                    (None, None) => {}
                }
            }
        }
    }
}
