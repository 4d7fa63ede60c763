use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::{
    Communication, DashboardSummary, OverdueRecord, Severity, Student, StudentKind,
    NEVER_CONTACTED_DAYS,
};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Most recent communication for `name`. Ties on the newest date go to the
/// first one seen.
pub fn latest_communication<'a>(
    name: &str,
    communications: &'a [Communication],
) -> Option<&'a Communication> {
    communications
        .iter()
        .filter(|comm| comm.name == name)
        .fold(None, |latest: Option<&Communication>, current| match latest {
            Some(latest) if current.date <= latest.date => Some(latest),
            _ => Some(current),
        })
}

/// Whole days from `date` (at midnight) to `now`, rounded up.
pub fn days_since(date: NaiveDate, now: NaiveDateTime) -> i64 {
    let elapsed = now - date.and_time(NaiveTime::MIN);
    let millis = elapsed.num_milliseconds();
    -((-millis).div_euclid(MILLIS_PER_DAY))
}

pub fn severity(kind: &StudentKind, total_days: i64) -> Severity {
    let (green, yellow) = match kind {
        StudentKind::Graduate => (21, 28),
        _ => (45, 60),
    };

    match total_days {
        days if days <= green => Severity::Green,
        days if days <= yellow => Severity::Yellow,
        _ => Severity::Red,
    }
}

pub fn overdue_record(
    student: &Student,
    communications: &[Communication],
    now: NaiveDateTime,
) -> OverdueRecord {
    let last_comm_date = latest_communication(&student.name, communications).map(|c| c.date);
    let total_days = match last_comm_date {
        Some(date) => days_since(date, now),
        None => NEVER_CONTACTED_DAYS,
    };
    let days_overdue = (total_days - student.kind.threshold_days()).max(0);

    OverdueRecord {
        name: student.name.clone(),
        kind: student.kind.clone(),
        last_comm_date,
        total_days_since_last_comm: total_days,
        days_overdue,
        severity: severity(&student.kind, total_days),
    }
}

/// One record per student, overdue or not, in student order.
pub fn overdue_records(
    students: &[Student],
    communications: &[Communication],
    now: NaiveDateTime,
) -> Vec<OverdueRecord> {
    students
        .iter()
        .map(|student| overdue_record(student, communications, now))
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OverdueLists {
    pub graduates: Vec<OverdueRecord>,
    pub undergraduates: Vec<OverdueRecord>,
}

pub fn overdue_lists(records: &[OverdueRecord]) -> OverdueLists {
    let mut lists = OverdueLists::default();
    for record in records {
        if record.total_days_since_last_comm <= record.kind.threshold_days() {
            continue;
        }
        match record.kind {
            StudentKind::Graduate => lists.graduates.push(record.clone()),
            StudentKind::Undergraduate => lists.undergraduates.push(record.clone()),
            StudentKind::Other(_) => {}
        }
    }
    lists
}

pub fn summarize(students: &[Student], records: &[OverdueRecord]) -> DashboardSummary {
    DashboardSummary {
        total_students: students.len(),
        graduates: students
            .iter()
            .filter(|s| s.kind == StudentKind::Graduate)
            .count(),
        undergraduates: students
            .iter()
            .filter(|s| s.kind == StudentKind::Undergraduate)
            .count(),
        overdue_students: records.iter().filter(|r| r.days_overdue > 0).count(),
    }
}
