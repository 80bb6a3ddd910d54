#[cfg(test)]
mod tests {
    use llamabot::sqlrun::{extract_sql_blocks, render_table, run_query, run_reply_blocks};

    fn test_conn() -> duckdb::Connection {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE metrics (name VARCHAR, value INTEGER);
            INSERT INTO metrics VALUES ('requests', 42), ('errors', 3), ('users', 7);
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_extract_sql_blocks() {
        let reply = "Here you go:\n\n```sql\nSELECT 1;\n```\n\nAnd another:\n\n```SQL\nSELECT 2;\n```\n\n```python\nprint(3)\n```\n";
        let blocks = extract_sql_blocks(reply);
        assert_eq!(blocks, vec!["SELECT 1;".to_string(), "SELECT 2;".to_string()]);
    }

    #[test]
    fn test_extract_ignores_unterminated_fence() {
        let reply = "```sql\nSELECT 1;";
        assert!(extract_sql_blocks(reply).is_empty());
    }

    #[test]
    fn test_run_query_returns_rows() {
        let conn = test_conn();
        let output =
            run_query(&conn, "SELECT name, value FROM metrics ORDER BY value DESC", 50).unwrap();

        assert_eq!(output.columns, vec!["name", "value"]);
        assert_eq!(output.rows.len(), 3);
        assert_eq!(output.rows[0], vec!["requests", "42"]);
        assert!(!output.truncated);
    }

    #[test]
    fn test_run_query_truncates() {
        let conn = test_conn();
        let output = run_query(&conn, "SELECT name FROM metrics ORDER BY name", 2).unwrap();

        assert_eq!(output.rows.len(), 2);
        assert!(output.truncated);
    }

    #[test]
    fn test_run_query_propagates_errors() {
        let conn = test_conn();
        assert!(run_query(&conn, "SELECT * FROM missing_table", 50).is_err());
    }

    #[test]
    fn test_run_reply_blocks_collects_outcomes() {
        let conn = test_conn();
        let reply =
            "```sql\nSELECT count(*) AS n FROM metrics;\n```\n\n```sql\nSELECT * FROM missing_table;\n```";
        let outcomes = run_reply_blocks(&conn, reply, 50);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].output.is_some());
        assert!(outcomes[0].error.is_none());
        assert!(outcomes[1].output.is_none());
        assert!(outcomes[1].error.is_some());
    }

    #[test]
    fn test_render_table_alignment() {
        let conn = test_conn();
        let output =
            run_query(&conn, "SELECT name, value FROM metrics ORDER BY value DESC", 50).unwrap();
        let table = render_table(&output);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "name     | value");
        assert_eq!(lines[1], "---------+------");
        assert_eq!(lines[2], "requests | 42");
    }
}
