use chrono::NaiveDate;
use serde::Serialize;

pub const GRADUATE_THRESHOLD_DAYS: i64 = 14;
pub const UNDERGRADUATE_THRESHOLD_DAYS: i64 = 30;
pub const NEVER_CONTACTED_DAYS: i64 = 999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentKind {
    Graduate,
    Undergraduate,
    Other(String),
}

impl StudentKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "研究生" => StudentKind::Graduate,
            "本科生" => StudentKind::Undergraduate,
            other => StudentKind::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StudentKind::Graduate => "研究生",
            StudentKind::Undergraduate => "本科生",
            StudentKind::Other(label) => label,
        }
    }

    /// Grace period before a student counts as overdue. Anything that is not a
    /// graduate falls under the undergraduate rule.
    pub fn threshold_days(&self) -> i64 {
        match self {
            StudentKind::Graduate => GRADUATE_THRESHOLD_DAYS,
            _ => UNDERGRADUATE_THRESHOLD_DAYS,
        }
    }
}

impl Serialize for StudentKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StudentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Communication {
    pub name: String,
    #[serde(rename = "type")]
    pub channel: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Green => "green",
            Severity::Yellow => "yellow",
            Severity::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StudentKind,
    pub last_comm_date: Option<NaiveDate>,
    pub total_days_since_last_comm: i64,
    pub days_overdue: i64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodStat {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StudentKind,
    pub count: usize,
    pub last_comm: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_students: usize,
    pub graduates: usize,
    pub undergraduates: usize,
    pub overdue_students: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub students: Vec<Student>,
    pub communications: Vec<Communication>,
}
