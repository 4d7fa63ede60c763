use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Url;

use crate::loader::DataSource;

pub const DATA_ENV_VAR: &str = "CONTACT_TRACKER_DATA";
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct Config {
    pub source: DataSource,
    /// Reference clock for every day calculation in this run.
    pub now: NaiveDateTime,
}

impl Config {
    /// Flag value wins over the environment, which wins over `data/`.
    pub fn resolve(data: Option<String>, as_of: Option<NaiveDate>) -> anyhow::Result<Self> {
        let location = data
            .or_else(|| std::env::var(DATA_ENV_VAR).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let source = parse_source(&location)?;
        let now = match as_of {
            Some(date) => date.and_time(NaiveTime::MIN),
            None => Local::now().naive_local(),
        };

        Ok(Self { source, now })
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

pub fn parse_source(location: &str) -> anyhow::Result<DataSource> {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        let mut url = Url::parse(location)
            .with_context(|| format!("invalid data URL {location}"))?;
        // Url::join replaces the last segment unless the base ends in '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        return Ok(DataSource::Http(url));
    }

    Ok(DataSource::Directory(PathBuf::from(location)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_become_http_sources_with_trailing_slash() {
        let source = parse_source("https://example.org/dashboard/data").unwrap();
        let DataSource::Http(url) = source else {
            panic!("expected an HTTP source");
        };
        assert_eq!(url.as_str(), "https://example.org/dashboard/data/");
        assert_eq!(
            url.join("students.csv").unwrap().as_str(),
            "https://example.org/dashboard/data/students.csv"
        );
    }

    #[test]
    fn plain_paths_are_directories() {
        assert_eq!(
            parse_source("./exports").unwrap(),
            DataSource::Directory(PathBuf::from("./exports"))
        );
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(parse_source("http://").is_err());
    }

    #[test]
    fn as_of_pins_the_clock_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let config = Config::resolve(Some("fixtures".into()), Some(date)).unwrap();
        assert_eq!(config.now, date.and_time(NaiveTime::MIN));
        assert_eq!(config.today(), date);
        assert_eq!(config.source, DataSource::Directory(PathBuf::from("fixtures")));
    }
}
