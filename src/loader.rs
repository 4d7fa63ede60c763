use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::models::{Communication, Dataset, Student, StudentKind};
use crate::parser::{self, CsvRecord};

pub const STUDENTS_FILE: &str = "students.csv";
pub const COMMUNICATIONS_FILE: &str = "communications.csv";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Where the two CSV resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Directory(PathBuf),
    Http(Url),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Directory(path) => write!(f, "{}", path.display()),
            DataSource::Http(url) => write!(f, "{url}"),
        }
    }
}

/// A load that stopped partway. `partial` holds whatever was loaded before
/// the failure.
#[derive(Debug)]
pub struct LoadFailure {
    pub partial: Dataset,
    pub error: LoadError,
}

/// Fetches one resource and parses it. A missing resource is an empty
/// dataset rather than an error.
pub async fn load_csv(
    source: &DataSource,
    client: &reqwest::Client,
    file: &str,
) -> Result<Vec<CsvRecord>, LoadError> {
    let bytes = match source {
        DataSource::Directory(dir) => {
            let path = dir.join(file);
            match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!(path = %path.display(), "CSV file not found, treating as empty");
                    return Ok(Vec::new());
                }
                Err(source) => {
                    return Err(LoadError::Io {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }
        DataSource::Http(base) => {
            let url = base.join(file).map_err(|err| LoadError::InvalidUrl {
                url: base.to_string(),
                message: err.to_string(),
            })?;
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| LoadError::Request {
                    url: url.to_string(),
                    source,
                })?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                warn!(%url, "CSV resource not found, treating as empty");
                return Ok(Vec::new());
            }
            if !status.is_success() {
                return Err(LoadError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            response
                .bytes()
                .await
                .map_err(|source| LoadError::Request {
                    url: url.to_string(),
                    source,
                })?
                .to_vec()
        }
    };

    let text = String::from_utf8(bytes).map_err(|_| LoadError::Encoding {
        resource: file.to_string(),
    })?;
    let records = parser::parse_csv(&text).map_err(|source| LoadError::Csv {
        resource: file.to_string(),
        source,
    })?;
    debug!(file, rows = records.len(), "parsed CSV");
    Ok(records)
}

/// Loads students, then communications. Communications come back sorted by
/// date, newest first; the sort is stable so same-day rows keep file order.
pub async fn load_dataset(source: &DataSource) -> Result<Dataset, LoadFailure> {
    let client = reqwest::Client::new();
    let mut dataset = Dataset::default();

    match load_csv(source, &client, STUDENTS_FILE).await {
        Ok(records) => dataset.students = students_from_records(&records),
        Err(error) => {
            return Err(LoadFailure {
                partial: dataset,
                error,
            })
        }
    }

    match load_csv(source, &client, COMMUNICATIONS_FILE).await {
        Ok(records) => {
            let mut communications = communications_from_records(&records);
            sort_newest_first(&mut communications);
            dataset.communications = communications;
        }
        Err(error) => {
            return Err(LoadFailure {
                partial: dataset,
                error,
            })
        }
    }

    info!(
        %source,
        students = dataset.students.len(),
        communications = dataset.communications.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn students_from_records(records: &[CsvRecord]) -> Vec<Student> {
    records
        .iter()
        .map(|record| Student {
            name: field(record, "name").to_string(),
            kind: StudentKind::from_label(field(record, "type")),
        })
        .collect()
}

pub fn communications_from_records(records: &[CsvRecord]) -> Vec<Communication> {
    let mut communications = Vec::with_capacity(records.len());
    for record in records {
        let raw_date = field(record, "date");
        let Some(date) = parse_date(raw_date) else {
            warn!(
                name = field(record, "name"),
                date = raw_date,
                "skipping communication with unparseable date"
            );
            continue;
        };
        communications.push(Communication {
            name: field(record, "name").to_string(),
            channel: field(record, "type").to_string(),
            date,
        });
    }
    communications
}

pub fn sort_newest_first(communications: &mut [Communication]) {
    communications.sort_by(|a, b| b.date.cmp(&a.date));
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|stamp| stamp.date())
        })
}

fn field<'a>(record: &'a CsvRecord, key: &str) -> &'a str {
    record.get(key).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write(dir: &std::path::Path, file: &str, body: &str) {
        std::fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn parses_supported_date_shapes() {
        assert_eq!(parse_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024/3/5"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024.03.05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05 14:30:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T09:00:00+08:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut comms = vec![
            Communication {
                name: "a".into(),
                channel: "email".into(),
                date: date(2024, 1, 1),
            },
            Communication {
                name: "b".into(),
                channel: "call".into(),
                date: date(2024, 2, 1),
            },
            Communication {
                name: "c".into(),
                channel: "visit".into(),
                date: date(2024, 1, 1),
            },
        ];
        sort_newest_first(&mut comms);
        let names: Vec<&str> = comms.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn loads_and_sorts_directory_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            STUDENTS_FILE,
            "姓名,类型\n张三,研究生\n李四,本科生\n",
        );
        write(
            dir.path(),
            COMMUNICATIONS_FILE,
            "姓名,类型,日期\n张三,面谈,2024-01-01\n李四,电话,2024-03-01\n张三,微信,bad\n",
        );

        let source = DataSource::Directory(dir.path().to_path_buf());
        let dataset = load_dataset(&source).await.unwrap();

        assert_eq!(dataset.students.len(), 2);
        assert_eq!(dataset.students[0].kind, StudentKind::Graduate);
        assert_eq!(dataset.students[1].kind, StudentKind::Undergraduate);
        assert_eq!(dataset.communications.len(), 2);
        assert_eq!(dataset.communications[0].name, "李四");
        assert_eq!(dataset.communications[0].channel, "电话");
        assert_eq!(dataset.communications[1].date, date(2024, 1, 1));
    }

    #[tokio::test]
    async fn missing_files_are_empty_datasets() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), STUDENTS_FILE, "姓名,类型\n张三,研究生\n");

        let source = DataSource::Directory(dir.path().to_path_buf());
        let dataset = load_dataset(&source).await.unwrap();
        assert_eq!(dataset.students.len(), 1);
        assert!(dataset.communications.is_empty());

        let empty = DataSource::Directory(dir.path().join("nowhere"));
        let dataset = load_dataset(&empty).await.unwrap();
        assert!(dataset.students.is_empty());
        assert!(dataset.communications.is_empty());
    }

    #[tokio::test]
    async fn unreadable_resource_keeps_partial_data() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), STUDENTS_FILE, "姓名,类型\n张三,研究生\n");
        std::fs::create_dir(dir.path().join(COMMUNICATIONS_FILE)).unwrap();

        let source = DataSource::Directory(dir.path().to_path_buf());
        let failure = load_dataset(&source).await.unwrap_err();
        assert!(matches!(failure.error, LoadError::Io { .. }));
        assert_eq!(failure.partial.students.len(), 1);
        assert!(failure.partial.communications.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STUDENTS_FILE), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let source = DataSource::Directory(dir.path().to_path_buf());
        let failure = load_dataset(&source).await.unwrap_err();
        assert!(matches!(failure.error, LoadError::Encoding { .. }));
        assert!(failure.partial.students.is_empty());
    }

    const STUDENTS_BODY: &str = "姓名,类型\n张三,研究生\n李四,本科生\n";

    fn http_source(server: &httpmock::MockServer) -> DataSource {
        crate::config::parse_source(&server.url("/data")).unwrap()
    }

    #[tokio::test]
    async fn http_dataset_joins_base_without_trailing_slash() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let students = server
            .mock_async(|when, then| {
                when.method(GET).path("/data/students.csv");
                then.status(200).body(STUDENTS_BODY);
            })
            .await;
        let comms = server
            .mock_async(|when, then| {
                when.method(GET).path("/data/communications.csv");
                then.status(200)
                    .body("姓名,类型,日期\n张三,面谈,2024-01-01\n李四,电话,2024-03-01\n");
            })
            .await;

        let dataset = load_dataset(&http_source(&server)).await.unwrap();

        students.assert_async().await;
        comms.assert_async().await;
        assert_eq!(dataset.students.len(), 2);
        assert_eq!(dataset.communications.len(), 2);
        assert_eq!(dataset.communications[0].name, "李四");
        assert_eq!(dataset.communications[1].date, date(2024, 1, 1));
    }

    #[tokio::test]
    async fn http_not_found_is_an_empty_dataset() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/students.csv");
                then.status(200).body(STUDENTS_BODY);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/communications.csv");
                then.status(404);
            })
            .await;

        let dataset = load_dataset(&http_source(&server)).await.unwrap();
        assert_eq!(dataset.students.len(), 2);
        assert!(dataset.communications.is_empty());
    }

    #[tokio::test]
    async fn http_server_error_stops_load_and_keeps_students() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/students.csv");
                then.status(200).body(STUDENTS_BODY);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/communications.csv");
                then.status(500);
            })
            .await;

        let failure = load_dataset(&http_source(&server)).await.unwrap_err();
        assert!(matches!(
            failure.error,
            LoadError::HttpStatus { status: 500, .. }
        ));
        assert_eq!(failure.partial.students.len(), 2);
        assert!(failure.partial.communications.is_empty());
    }
}
