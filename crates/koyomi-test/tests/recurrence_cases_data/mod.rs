//! Table-driven recurrence expansion cases.

use koyomi_test::cal::{CalDateTime, RecurrenceIter};
use koyomi_test::rfc::ical::expand::TimeZoneResolver;
use koyomi_test::rfc::ical::parse::{parse_date, parse_datetime, parse_rrule};

pub struct RecurrenceCase {
    pub name: &'static str,
    /// `YYYYMMDD` for all-day anchors, `YYYYMMDDTHHMMSS[Z]` otherwise.
    pub dtstart: &'static str,
    pub rrule: &'static str,
    pub rdates: &'static [&'static str],
    pub exdates: &'static [&'static str],
    /// Expected starts in wall-clock rendering, in order.
    pub expected: &'static [&'static str],
    /// How many values to take (guards unbounded rules).
    pub limit: usize,
}

pub fn parse_anchor(s: &str) -> CalDateTime {
    if s.contains('T') {
        CalDateTime::DateTime(parse_datetime(s, None, 1, 1).expect("valid datetime"))
    } else {
        CalDateTime::Date(parse_date(s, 1, 1).expect("valid date"))
    }
}

pub fn assert_case(case: &RecurrenceCase) {
    let resolver = TimeZoneResolver::new();
    let anchor = parse_anchor(case.dtstart);
    let rule = parse_rrule(case.rrule, 1, 1).expect("valid rrule");
    let rdates: Vec<CalDateTime> = case.rdates.iter().map(|s| parse_anchor(s)).collect();
    let exdates: Vec<CalDateTime> = case.exdates.iter().map(|s| parse_anchor(s)).collect();

    let starts: Vec<String> =
        RecurrenceIter::new(anchor, Some(&rule), &rdates, &exdates, &resolver, 3650)
            .expect("expandable rule")
            .take(case.limit)
            .map(|dt| dt.wall_string())
            .collect();

    assert_eq!(starts, case.expected, "case {}", case.name);
}

pub fn recurrence_cases() -> Vec<RecurrenceCase> {
    vec![
        RecurrenceCase {
            name: "daily_basic",
            dtstart: "20120201T093000Z",
            rrule: "FREQ=DAILY;COUNT=3",
            rdates: &[],
            exdates: &[],
            expected: &["20120201T093000", "20120202T093000", "20120203T093000"],
            limit: 100,
        },
        RecurrenceCase {
            name: "daily_interval_until",
            dtstart: "20120201T093000Z",
            rrule: "FREQ=DAILY;INTERVAL=3;UNTIL=20120210T093000Z",
            rdates: &[],
            exdates: &[],
            expected: &[
                "20120201T093000",
                "20120204T093000",
                "20120207T093000",
                "20120210T093000",
            ],
            limit: 100,
        },
        RecurrenceCase {
            name: "weekly_two_days",
            dtstart: "19970902T090000Z",
            rrule: "FREQ=WEEKLY;COUNT=4;BYDAY=TU,TH",
            rdates: &[],
            exdates: &[],
            expected: &[
                "19970902T090000",
                "19970904T090000",
                "19970909T090000",
                "19970911T090000",
            ],
            limit: 100,
        },
        RecurrenceCase {
            name: "weekly_biweekly_wkst_sunday",
            dtstart: "19970805T090000Z",
            rrule: "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU",
            rdates: &[],
            exdates: &[],
            expected: &[
                "19970805T090000",
                "19970817T090000",
                "19970819T090000",
                "19970831T090000",
            ],
            limit: 100,
        },
        RecurrenceCase {
            name: "monthly_first_friday",
            dtstart: "19970905T090000Z",
            rrule: "FREQ=MONTHLY;COUNT=3;BYDAY=1FR",
            rdates: &[],
            exdates: &[],
            expected: &["19970905T090000", "19971003T090000", "19971107T090000"],
            limit: 100,
        },
        RecurrenceCase {
            name: "monthly_last_day",
            dtstart: "20120131T090000Z",
            rrule: "FREQ=MONTHLY;COUNT=4;BYMONTHDAY=-1",
            rdates: &[],
            exdates: &[],
            expected: &[
                "20120131T090000",
                "20120229T090000",
                "20120331T090000",
                "20120430T090000",
            ],
            limit: 100,
        },
        RecurrenceCase {
            name: "monthly_short_months_skipped",
            dtstart: "20120131T090000Z",
            rrule: "FREQ=MONTHLY;COUNT=3",
            rdates: &[],
            exdates: &[],
            expected: &["20120131T090000", "20120331T090000", "20120531T090000"],
            limit: 100,
        },
        RecurrenceCase {
            name: "monthly_by_month_filter",
            dtstart: "20120115T090000Z",
            rrule: "FREQ=MONTHLY;BYMONTH=1,7;COUNT=4",
            rdates: &[],
            exdates: &[],
            expected: &[
                "20120115T090000",
                "20120715T090000",
                "20130115T090000",
                "20130715T090000",
            ],
            limit: 100,
        },
        RecurrenceCase {
            name: "rdate_and_exdate",
            dtstart: "20120201T093000Z",
            rrule: "FREQ=DAILY;COUNT=3",
            rdates: &["20120210T093000Z"],
            exdates: &["20120202T093000Z"],
            expected: &["20120201T093000", "20120203T093000", "20120210T093000"],
            limit: 100,
        },
        RecurrenceCase {
            name: "all_day_weekly",
            dtstart: "20220703",
            rrule: "FREQ=WEEKLY;COUNT=3",
            rdates: &[],
            exdates: &[],
            expected: &["20220703", "20220710", "20220717"],
            limit: 100,
        },
        RecurrenceCase {
            name: "all_day_exdate",
            dtstart: "20220703",
            rrule: "FREQ=WEEKLY;COUNT=3",
            rdates: &[],
            exdates: &["20220710"],
            expected: &["20220703", "20220717"],
            limit: 100,
        },
        RecurrenceCase {
            name: "unbounded_takes_limit",
            dtstart: "20220829T090000Z",
            rrule: "FREQ=WEEKLY;BYDAY=MO",
            rdates: &[],
            exdates: &[],
            expected: &["20220829T090000", "20220905T090000", "20220912T090000"],
            limit: 3,
        },
    ]
}
