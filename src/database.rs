//! Bulk load of scores into a DuckDB `diet` table
//!
//! Only compiled with the `database` feature.

use crate::metrics::Component;
use crate::output::{result_columns, CATEGORY_COL, PARTICIPANT_COL};
use crate::scorer::DietQualityResult;
use anyhow::{Context, Result};
use duckdb::{params_from_iter, types::Value, Connection};
use std::path::Path;
use tracing::{debug, info};

pub const DIET_TABLE: &str = "diet";

fn create_table_sql() -> String {
    let columns: Vec<String> = result_columns()
        .into_iter()
        .map(|name| match name {
            PARTICIPANT_COL => format!("{} TEXT PRIMARY KEY", name),
            CATEGORY_COL => format!("{} TEXT", name),
            _ => format!("{} DOUBLE", name),
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        DIET_TABLE,
        columns.join(", ")
    )
}

fn insert_sql() -> String {
    let columns = result_columns();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        DIET_TABLE,
        columns.join(", "),
        placeholders
    )
}

fn row_values(result: &DietQualityResult) -> Vec<Value> {
    let optional = |v: Option<f64>| v.map(Value::Double).unwrap_or(Value::Null);

    let mut values = vec![
        Value::Text(result.participant_id.clone()),
        optional(result.total_diet_weight),
        optional(result.food_item_weight),
        Value::Text(result.category.as_str().to_string()),
    ];
    values.extend(Component::ALL.iter().map(|&c| Value::Double(result.component(c))));
    values.push(optional(result.hei_score));
    values
}

/// Load results into the `diet` table, returning the rows written
///
/// With `replace` the table is dropped first; otherwise rows upsert on
/// `participant_id`.
pub fn load_results(results: &[DietQualityResult], path: &Path, replace: bool) -> Result<usize> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    let written = write_results(&mut conn, results, replace)?;
    info!("{} table now holds {} rows", DIET_TABLE, count_rows(&conn)?);
    Ok(written)
}

/// Write results through an open connection, in one transaction
pub fn write_results(conn: &mut Connection, results: &[DietQualityResult], replace: bool) -> Result<usize> {
    let tx = conn.transaction().context("Failed to start transaction")?;

    if replace {
        debug!("Dropping {} table", DIET_TABLE);
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", DIET_TABLE))?;
    }
    tx.execute_batch(&create_table_sql())
        .context("Failed to create diet table")?;

    {
        let mut stmt = tx.prepare(&insert_sql())?;
        for result in results {
            stmt.execute(params_from_iter(row_values(result)))
                .with_context(|| format!("Failed to insert participant {}", result.participant_id))?;
        }
    }

    tx.commit().context("Failed to commit diet table load")?;
    Ok(results.len())
}

/// Row count of the `diet` table
pub fn count_rows(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", DIET_TABLE), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SCORE_COL;
    use crate::scorer::DietScoreCategory;

    fn result(id: &str, score: Option<f64>) -> DietQualityResult {
        DietQualityResult {
            participant_id: id.to_string(),
            total_diet_weight: Some(1200.0),
            food_item_weight: None,
            components: [1.0; Component::COUNT],
            hei_score: score,
            category: DietScoreCategory::Poor,
        }
    }

    #[test]
    fn test_create_table_sql_has_primary_key() {
        let sql = create_table_sql();
        assert!(sql.contains("participant_id TEXT PRIMARY KEY"));
        assert!(sql.contains(&format!("{} DOUBLE", SCORE_COL)));
    }

    #[test]
    fn test_append_upserts_and_replace_resets() {
        let mut conn = Connection::open_in_memory().unwrap();

        write_results(&mut conn, &[result("1", Some(13.0)), result("2", None)], false).unwrap();
        write_results(&mut conn, &[result("2", Some(13.0)), result("3", Some(13.0))], false).unwrap();
        assert_eq!(count_rows(&conn).unwrap(), 3);

        write_results(&mut conn, &[result("9", Some(13.0))], true).unwrap();
        assert_eq!(count_rows(&conn).unwrap(), 1);

        let category: String = conn
            .query_row("SELECT diet_score_category FROM diet WHERE participant_id = '9'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(category, "Poor");
    }

    #[test]
    fn test_load_results_appends_to_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nhanes.duckdb");

        assert_eq!(load_results(&[result("1", Some(13.0))], &path, false).unwrap(), 1);
        assert_eq!(load_results(&[result("2", Some(13.0))], &path, false).unwrap(), 1);

        let conn = Connection::open(&path).unwrap();
        assert_eq!(count_rows(&conn).unwrap(), 2);
    }
}
