use anyhow::Result;
use rusqlite::{params_from_iter, types::Value, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_date, DATE_FORMAT},
};
use crate::models::{DailyTotal, TotalsQuery};

fn row_to_total(row: &Row) -> Result<DailyTotal> {
    let date: String = row.get("date")?;

    Ok(DailyTotal {
        app_name: row.get("app_name")?,
        date: parse_date(&date, "date")?,
        total_seconds: row.get("total_seconds")?,
    })
}

impl Database {
    /// Daily totals matching the filter, newest date first.
    pub async fn query_daily_totals(&self, query: TotalsQuery) -> Result<Vec<DailyTotal>> {
        self.execute(move |conn| {
            let mut sql = String::from(
                "SELECT app_name, date, total_seconds FROM daily_totals WHERE 1=1",
            );
            let mut params: Vec<Value> = Vec::new();

            if let Some(app_name) = query.app_name {
                sql.push_str(" AND app_name = ?");
                params.push(Value::Text(app_name));
            }
            if let Some(start_date) = query.start_date {
                sql.push_str(" AND date >= ?");
                params.push(Value::Text(start_date.format(DATE_FORMAT).to_string()));
            }
            if let Some(end_date) = query.end_date {
                sql.push_str(" AND date <= ?");
                params.push(Value::Text(end_date.format(DATE_FORMAT).to_string()));
            }

            sql.push_str(" ORDER BY date DESC");

            if let Some(limit) = query.limit {
                sql.push_str(" LIMIT ?");
                params.push(Value::Integer(i64::from(limit)));
            }

            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(params))?;
            let mut totals = Vec::new();
            while let Some(row) = rows.next()? {
                totals.push(row_to_total(row)?);
            }

            Ok(totals)
        })
        .await
    }
}
