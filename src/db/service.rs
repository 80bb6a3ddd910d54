use crate::db::models::{ChatMessage, Feedback};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection, Result as DbResult, Row};

pub struct DbService;

impl DbService {
    // DuckDB timestamps come back as driver-native values we can't read without
    // the chrono feature, so every SELECT casts created_at to VARCHAR and we
    // parse the text here.
    fn parse_timestamp(text: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
            .map(|naive| naive.and_utc())
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_message(row: &Row) -> DbResult<ChatMessage> {
        let created_str: String = row.get(4)?;

        Ok(ChatMessage {
            id: row.get(0)?,
            role: row.get::<_, String>(1)?,
            content: row.get::<_, String>(2)?,
            model: row.get::<_, Option<String>>(3)?,
            created_at: Self::parse_timestamp(&created_str),
        })
    }

    fn row_to_feedback(row: &Row) -> DbResult<Feedback> {
        Ok(Feedback {
            id: row.get(0)?,
            message_id: row.get(1)?,
            is_positive: row.get(2)?,
            comment: row.get::<_, Option<String>>(3)?,
        })
    }

    // --- Message Operations ---

    pub fn insert_message(
        conn: &Connection,
        role: &str,
        content: &str,
        model: Option<&str>,
    ) -> DbResult<ChatMessage> {
        conn.execute(
            "INSERT INTO messages (role, content, model) VALUES (?, ?, ?)",
            params![role, content, model],
        )?;

        // Fetch the message we just inserted (since ID is generated by sequence)
        let mut stmt = conn.prepare(
            "SELECT id, role, content, model, CAST(created_at AS VARCHAR)
             FROM messages
             ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([], Self::row_to_message)?;

        Ok(rows.next().unwrap()?)
    }

    pub fn list_messages(conn: &Connection, limit: usize, offset: usize) -> DbResult<Vec<ChatMessage>> {
        let mut stmt = conn.prepare(
            "SELECT id, role, content, model, CAST(created_at AS VARCHAR)
             FROM messages
             ORDER BY id ASC
             LIMIT ? OFFSET ?",
        )?;

        let rows = stmt.query_map(params![limit as i64, offset as i64], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Last `limit` messages in chronological order, for building LLM context.
    pub fn recent_messages(conn: &Connection, limit: usize) -> DbResult<Vec<ChatMessage>> {
        let mut stmt = conn.prepare(
            "SELECT id, role, content, model, CAST(created_at AS VARCHAR)
             FROM messages
             ORDER BY id DESC
             LIMIT ?",
        )?;

        let rows = stmt.query_map(params![limit as i64], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        messages.reverse();
        Ok(messages)
    }

    pub fn search_messages(conn: &Connection, query: &str, limit: usize) -> DbResult<Vec<ChatMessage>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let mut stmt = conn.prepare(
            "SELECT id, role, content, model, CAST(created_at AS VARCHAR)
             FROM messages
             WHERE lower(content) LIKE ?
             ORDER BY id ASC
             LIMIT ?",
        )?;

        let rows = stmt.query_map(params![pattern, limit as i64], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Deletes the whole conversation and its feedback, returning how many
    /// messages were removed.
    pub fn clear_messages(conn: &Connection) -> DbResult<usize> {
        conn.execute("BEGIN TRANSACTION", [])?;

        // 1. Delete feedback first so no rows point at missing messages
        if let Err(e) = conn.execute("DELETE FROM feedback", []) {
            let _ = conn.execute("ROLLBACK", []);
            return Err(e);
        }

        // 2. Delete the messages
        let deleted = match conn.execute("DELETE FROM messages", []) {
            Ok(n) => n,
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                return Err(e);
            }
        };

        conn.execute("COMMIT", [])?;
        Ok(deleted)
    }

    pub fn message_exists(conn: &Connection, id: i64) -> DbResult<bool> {
        let mut stmt = conn.prepare("SELECT id FROM messages WHERE id = ?")?;
        let mut rows = stmt.query(params![id])?;
        Ok(rows.next()?.is_some())
    }

    // --- Feedback Operations ---

    /// Saves a rating for a message. A second rating for the same message
    /// replaces the first; the returned flag is true when that happened.
    pub fn save_feedback(
        conn: &Connection,
        message_id: i64,
        is_positive: bool,
        comment: Option<&str>,
    ) -> DbResult<(Feedback, bool)> {
        let existing = Self::get_feedback(conn, message_id)?;

        let updated = match existing {
            Some(_) => {
                conn.execute(
                    "UPDATE feedback SET is_positive = ?, comment = ? WHERE message_id = ?",
                    params![is_positive, comment, message_id],
                )?;
                true
            }
            None => {
                conn.execute(
                    "INSERT INTO feedback (message_id, is_positive, comment) VALUES (?, ?, ?)",
                    params![message_id, is_positive, comment],
                )?;
                false
            }
        };

        let feedback = Self::get_feedback(conn, message_id)?.unwrap();
        Ok((feedback, updated))
    }

    pub fn get_feedback(conn: &Connection, message_id: i64) -> DbResult<Option<Feedback>> {
        let mut stmt = conn.prepare(
            "SELECT id, message_id, is_positive, comment FROM feedback WHERE message_id = ?",
        )?;
        let mut rows = stmt.query_map(params![message_id], Self::row_to_feedback)?;

        if let Some(row) = rows.next() {
            Ok(Some(row?))
        } else {
            Ok(None)
        }
    }
}
