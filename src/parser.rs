use std::collections::BTreeMap;

use csv::{ReaderBuilder, Trim};

/// One parsed row keyed by (renamed) header.
pub type CsvRecord = BTreeMap<String, String>;

pub fn field_name(header: &str) -> &str {
    match header {
        "姓名" => "name",
        "类型" => "type",
        "日期" => "date",
        other => other,
    }
}

/// Parses header-led comma separated text. Quotes are treated as ordinary
/// characters; short rows are padded with empty strings.
pub fn parse_csv(text: &str) -> Result<Vec<CsvRecord>, csv::Error> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| field_name(header).to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = CsvRecord::new();
        for (index, header) in headers.iter().enumerate() {
            let value = row.get(index).unwrap_or("");
            record.insert(header.clone(), value.to_string());
        }
        records.push(record);
    }

    Ok(records)
}
