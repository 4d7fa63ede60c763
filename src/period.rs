use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::models::{Communication, PeriodStat, Student};

/// Rolling window used to scope communication counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Total,
    Year,
    #[value(name = "halfyear")]
    HalfYear,
    Month,
}

impl Period {
    pub fn title(self) -> &'static str {
        match self {
            Period::Total => "All time",
            Period::Year => "Past year",
            Period::HalfYear => "Past six months",
            Period::Month => "Past month",
        }
    }
}

/// First day included in the window. The day of month is kept and any
/// overflow carries into the following month, so 31 March minus one month is
/// 2 March (in a leap year) and 29 February minus one year is 1 March.
pub fn window_start(period: Period, today: NaiveDate) -> NaiveDate {
    let months = match period {
        Period::Total => return DateTime::<Utc>::UNIX_EPOCH.date_naive(),
        Period::Year => 12,
        Period::HalfYear => 6,
        Period::Month => 1,
    };

    let target = today.year() * 12 + today.month0() as i32 - months;
    let (year, month0) = (target.div_euclid(12), target.rem_euclid(12));

    NaiveDate::from_ymd_opt(year, month0 as u32 + 1, 1)
        .and_then(|first| first.checked_add_days(Days::new(u64::from(today.day0()))))
        .unwrap_or(NaiveDate::MIN)
}

pub fn stats_by_period(
    students: &[Student],
    communications: &[Communication],
    period: Period,
    today: NaiveDate,
) -> Vec<PeriodStat> {
    let start = window_start(period, today);

    let mut stats: Vec<PeriodStat> = students
        .iter()
        .map(|student| {
            let mut count = 0usize;
            let mut last_comm: Option<NaiveDate> = None;
            for comm in communications
                .iter()
                .filter(|c| c.name == student.name && c.date >= start)
            {
                count += 1;
                last_comm = last_comm.max(Some(comm.date));
            }

            PeriodStat {
                name: student.name.clone(),
                kind: student.kind.clone(),
                count,
                last_comm,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}
