use chrono::{Datelike, NaiveDate};

/// Kind of period a range covers, from the most specific match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl Period {
    pub fn of(start: NaiveDate, end: NaiveDate) -> Self {
        if start == end {
            return Self::Daily;
        }
        let same_year = start.year() == end.year();
        if same_year
            && (start.month(), start.day()) == (1, 1)
            && (end.month(), end.day()) == (12, 31)
        {
            return Self::Yearly;
        }
        if same_year
            && quarter_start(start) == Some(start)
            && quarter_of(start) == quarter_of(end)
            && end.succ_opt().and_then(quarter_start) == end.succ_opt()
        {
            return Self::Quarterly;
        }
        if same_year
            && start.month() == end.month()
            && start.day() == 1
            && end.succ_opt().map(|next| next.day()) == Some(1)
        {
            return Self::Monthly;
        }
        if start.iso_week() == end.iso_week() {
            return Self::Weekly;
        }
        Self::Custom
    }
}

fn quarter_of(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

fn quarter_start(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), (quarter_of(date) - 1) * 3 + 1, 1)
}

/// Heading such as `Weekly Report: 10 - 16 Mar 2025` or `Monthly Report: Mar 2025`.
pub fn report_title(start: NaiveDate, end: NaiveDate) -> String {
    let span = || {
        if start.year() == end.year() && start.month() == end.month() {
            format!("{} - {}", start.format("%d"), end.format("%d %b %Y"))
        } else if start.year() == end.year() {
            format!("{} - {}", start.format("%d %b"), end.format("%d %b %Y"))
        } else {
            format!("{} - {}", start.format("%d %b %Y"), end.format("%d %b %Y"))
        }
    };
    match Period::of(start, end) {
        Period::Daily => format!("Daily Report: {}", start.format("%d %b %Y")),
        Period::Weekly => format!("Weekly Report: {}", span()),
        Period::Monthly => format!("Monthly Report: {}", start.format("%b %Y")),
        Period::Quarterly => format!("Quarterly Report: Q{} {}", quarter_of(start), start.year()),
        Period::Yearly => format!("Yearly Report: {}", start.year()),
        Period::Custom => format!("Report: {}", span()),
    }
}
