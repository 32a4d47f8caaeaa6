use std::io::Write;

use anyhow::{Context, Result};

use crate::db::helpers::DATE_FORMAT;
use crate::models::DailyTotal;

/// Writes daily totals as CSV with an `app_name,date,total_seconds`
/// header, one row per total.
pub fn write_totals_csv<W: Write>(out: &mut W, totals: &[DailyTotal]) -> Result<()> {
    writeln!(out, "app_name,date,total_seconds").context("failed to write CSV header")?;

    for total in totals {
        writeln!(
            out,
            "{},{},{}",
            escape_csv_field(&total.app_name),
            total.date.format(DATE_FORMAT),
            total.total_seconds
        )
        .context("failed to write CSV row")?;
    }

    Ok(())
}

/// Writes daily totals as a pretty-printed JSON array.
pub fn write_totals_json<W: Write>(out: &mut W, totals: &[DailyTotal]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, totals).context("failed to serialize totals")?;
    writeln!(out).context("failed to finish JSON output")
}

fn escape_csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn totals() -> Vec<DailyTotal> {
        vec![
            DailyTotal {
                app_name: "Editor".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                total_seconds: 75,
            },
            DailyTotal {
                app_name: "My, \"App\"".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                total_seconds: 30,
            },
        ]
    }

    #[test]
    fn csv_output_escapes_reserved_characters() {
        let mut out = Vec::new();
        write_totals_csv(&mut out, &totals()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "app_name,date,total_seconds\n\
             Editor,2024-03-02,75\n\
             \"My, \"\"App\"\"\",2024-03-01,30\n"
        );
    }

    #[test]
    fn json_output_round_trips() {
        let mut out = Vec::new();
        write_totals_json(&mut out, &totals()).unwrap();

        let parsed: Vec<DailyTotal> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, totals());
    }
}
