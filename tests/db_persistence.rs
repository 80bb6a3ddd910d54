#[cfg(test)]
mod tests {
    use llamabot::db::connection;
    use llamabot::db::service::DbService;

    // In-memory database just for tests, using the real schema
    fn get_test_db() -> duckdb::Connection {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        connection::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_message_lifecycle() {
        let conn = get_test_db();

        // 1. Insert messages
        let msg1 = DbService::insert_message(&conn, "user", "Hello!", Some("llama-3.3-70b-versatile"))
            .unwrap();
        let msg2 =
            DbService::insert_message(&conn, "assistant", "Hi there!", Some("llama-3.3-70b-versatile"))
                .unwrap();

        assert_eq!(msg1.role, "user");
        assert_eq!(msg1.model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert!(msg2.id > msg1.id);

        // 2. Fetch them back
        let history = DbService::list_messages(&conn, 10, 0).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Hello!");
        assert_eq!(history[1].content, "Hi there!");
    }

    #[test]
    fn test_recent_messages_keep_chronological_order() {
        let conn = get_test_db();

        for i in 0..5 {
            DbService::insert_message(&conn, "user", &format!("message {}", i), None).unwrap();
        }

        let recent = DbService::recent_messages(&conn, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "message 2");
        assert_eq!(recent[2].content, "message 4");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let conn = get_test_db();

        DbService::insert_message(&conn, "user", "Tell me about DuckDB", None).unwrap();
        DbService::insert_message(&conn, "assistant", "DuckDB is an in-process database.", None)
            .unwrap();

        let hits = DbService::search_messages(&conn, "duckdb", 10).unwrap();
        assert_eq!(hits.len(), 2);

        let misses = DbService::search_messages(&conn, "postgres", 10).unwrap();
        assert!(misses.is_empty());
    }

    #[test]
    fn test_clear_removes_messages_and_feedback() {
        let conn = get_test_db();

        let msg = DbService::insert_message(&conn, "assistant", "42", None).unwrap();
        DbService::save_feedback(&conn, msg.id, true, None).unwrap();

        let deleted = DbService::clear_messages(&conn).unwrap();
        assert_eq!(deleted, 1);

        assert!(DbService::list_messages(&conn, 10, 0).unwrap().is_empty());
        assert!(DbService::get_feedback(&conn, msg.id).unwrap().is_none());
    }

    #[test]
    fn test_feedback_upsert() {
        let conn = get_test_db();
        let msg = DbService::insert_message(&conn, "assistant", "The answer is 41.", None).unwrap();

        let (first, updated) = DbService::save_feedback(&conn, msg.id, true, None).unwrap();
        assert!(!updated);
        assert!(first.is_positive);

        // A second rating for the same message replaces the first
        let (second, updated) = DbService::save_feedback(&conn, msg.id, false, Some("wrong")).unwrap();
        assert!(updated);
        assert_eq!(second.id, first.id);
        assert!(!second.is_positive);
        assert_eq!(second.comment.as_deref(), Some("wrong"));
    }

    #[test]
    fn test_message_exists() {
        let conn = get_test_db();
        let msg = DbService::insert_message(&conn, "user", "ping", None).unwrap();

        assert!(DbService::message_exists(&conn, msg.id).unwrap());
        assert!(!DbService::message_exists(&conn, msg.id + 100).unwrap());
    }
}
