use duckdb::types::Value;
use duckdb::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SqlBlockOutcome {
    pub query: String,
    pub output: Option<QueryOutput>,
    pub error: Option<String>,
}

/// Pulls the contents of fenced ```sql blocks out of an assistant reply.
/// Unterminated fences are ignored.
pub fn extract_sql_blocks(reply: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for line in reply.lines() {
        let trimmed = line.trim();
        match current.as_mut() {
            None => {
                if trimmed.eq_ignore_ascii_case("```sql") {
                    current = Some(Vec::new());
                }
            }
            Some(lines) => {
                if trimmed.starts_with("```") {
                    let block = lines.join("\n").trim().to_string();
                    if !block.is_empty() {
                        blocks.push(block);
                    }
                    current = None;
                } else {
                    lines.push(line.to_string());
                }
            }
        }
    }

    blocks
}

pub fn run_query(conn: &Connection, sql: &str, max_rows: usize) -> duckdb::Result<QueryOutput> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    // Column names are only readable after the statement has run
    let columns: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names().iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let mut out_rows: Vec<Vec<String>> = Vec::new();
    let mut truncated = false;

    while let Some(row) = rows.next()? {
        if out_rows.len() >= max_rows {
            truncated = true;
            break;
        }
        let mut rendered = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let value: Value = row.get(i)?;
            rendered.push(render_value(&value));
        }
        out_rows.push(rendered);
    }

    Ok(QueryOutput {
        columns,
        rows: out_rows,
        truncated,
    })
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(n) => n.to_string(),
        Value::SmallInt(n) => n.to_string(),
        Value::Int(n) => n.to_string(),
        Value::BigInt(n) => n.to_string(),
        Value::HugeInt(n) => n.to_string(),
        Value::UTinyInt(n) => n.to_string(),
        Value::USmallInt(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::UBigInt(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        other => format!("{:?}", other),
    }
}

/// Plain-text table with aligned columns, for the terminal and the chat page.
pub fn render_table(output: &QueryOutput) -> String {
    let mut widths: Vec<usize> = output.columns.iter().map(|c| c.len()).collect();
    for row in &output.rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    // Last column stays unpadded so rows don't carry trailing spaces
    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i + 1 == cells.len() {
                    cell.clone()
                } else {
                    format!("{:<1$}", cell, widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut lines = vec![format_row(&output.columns)];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &output.rows {
        lines.push(format_row(row));
    }

    if output.rows.is_empty() {
        lines.push("(0 rows)".to_string());
    } else if output.truncated {
        lines.push(format!("({} rows shown, output truncated)", output.rows.len()));
    }

    lines.join("\n")
}

/// Runs every ```sql block in a reply against the connection, collecting
/// one outcome per block. Failures are reported per block, not propagated.
pub fn run_reply_blocks(conn: &Connection, reply: &str, max_rows: usize) -> Vec<SqlBlockOutcome> {
    extract_sql_blocks(reply)
        .into_iter()
        .map(|query| match run_query(conn, &query, max_rows) {
            Ok(output) => SqlBlockOutcome {
                query,
                output: Some(output),
                error: None,
            },
            Err(e) => SqlBlockOutcome {
                query,
                output: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}
