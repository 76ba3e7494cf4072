//! End-to-end scenarios exercising the public surface: codec, store,
//! and timeline together.

use chrono::{TimeZone, Utc};
use koyomi_test::base::{CalendarConfig, FixedClock, SequentialUidFactory};
use koyomi_test::cal::{
    CalDateTime, Calendar, EditScope, Event, EventPatch, EventStore, decode_calendar,
    encode_calendar,
};
use koyomi_test::rfc::ical::core::{Date, DateTime};
use koyomi_test::rfc::ical::expand::TimeZoneResolver;
use koyomi_test::rfc::ical::parse::parse_rrule;

fn floating(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> CalDateTime {
    CalDateTime::DateTime(DateTime::floating(y, mo, d, h, mi, s))
}

fn mock_store(calendar: &mut Calendar) -> EventStore<'_> {
    EventStore::new(calendar)
        .with_clock(FixedClock::new(
            Utc.with_ymd_and_hms(2022, 8, 29, 12, 0, 0).unwrap(),
        ))
        .with_uid_factory(SequentialUidFactory::new("mock-uid"))
}

fn monday_meeting() -> Event {
    let mut event = Event::new(floating(2022, 8, 29, 9, 0, 0));
    event.dtend = Some(floating(2022, 8, 29, 9, 30, 0));
    event.summary = Some("Monday meeting".into());
    event.rrule = Some(parse_rrule("FREQ=WEEKLY;BYDAY=MO", 1, 1).unwrap());
    event
}

/// (uid, start, summary) triples over [2022-08-29, 2022-09-30).
fn september_window(calendar: &Calendar) -> Vec<(String, String, String)> {
    let resolver = TimeZoneResolver::new();
    calendar
        .timeline(&resolver)
        .overlapping(
            &CalDateTime::Date(Date::new(2022, 8, 29)),
            &CalDateTime::Date(Date::new(2022, 9, 30)),
        )
        .unwrap()
        .map(|occ| {
            (
                occ.uid.to_string(),
                occ.start.wall_string(),
                occ.event.summary.clone().unwrap_or_default(),
            )
        })
        .collect()
}

/// S1: parse and re-emit a minimal calendar without touching a byte.
#[test]
fn parse_and_reemit_preserves_properties_and_order() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:19970901T130000Z-123401@example.com\r\n\
DTSTAMP:19970901T130000Z\r\n\
DTSTART:19970903T163000Z\r\n\
DTEND:19970903T190000Z\r\n\
SUMMARY:Annual Employee Review\r\n\
CLASS:PRIVATE\r\n\
CATEGORIES:BUSINESS,HUMAN RESOURCES\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let calendar = decode_calendar(input).unwrap();
    let output = encode_calendar(&calendar);
    assert_eq!(output, input);
    for line in output.split("\r\n") {
        assert!(line.len() <= 75, "line exceeds 75 octets: {line}");
    }
}

/// S2: weekly expansion over a bounded window.
#[test]
fn weekly_expansion() {
    let mut calendar = Calendar::new();
    let mut store = mock_store(&mut calendar);
    store.add(monday_meeting()).unwrap();

    let occurrences = september_window(&calendar);
    let starts: Vec<&str> = occurrences.iter().map(|(_, s, _)| s.as_str()).collect();
    assert_eq!(
        starts,
        vec![
            "20220829T090000",
            "20220905T090000",
            "20220912T090000",
            "20220919T090000",
            "20220926T090000"
        ]
    );
    assert!(occurrences.iter().all(|(uid, _, _)| uid == "mock-uid-1"));

    // Each occurrence carries a RECURRENCE-ID derived from its start.
    let resolver = TimeZoneResolver::new();
    let rids: Vec<String> = calendar
        .timeline(&resolver)
        .overlapping(
            &CalDateTime::Date(Date::new(2022, 8, 29)),
            &CalDateTime::Date(Date::new(2022, 9, 30)),
        )
        .unwrap()
        .map(|occ| occ.recurrence_id.unwrap().wall_string())
        .collect();
    assert_eq!(rids[1], "20220905T090000");
}

/// S3: deleting one instance adds an EXDATE and shrinks the timeline.
#[test]
fn delete_this_instance() {
    let mut calendar = Calendar::new();
    let mut store = mock_store(&mut calendar);
    store.add(monday_meeting()).unwrap();
    store
        .delete(
            "mock-uid-1",
            Some(&floating(2022, 9, 5, 9, 0, 0)),
            EditScope::This,
        )
        .unwrap();

    let master = calendar.master("mock-uid-1").unwrap();
    assert_eq!(master.exdate[0].wall_string(), "20220905T090000");

    let starts: Vec<String> = september_window(&calendar)
        .into_iter()
        .map(|(_, s, _)| s)
        .collect();
    assert_eq!(
        starts,
        vec![
            "20220829T090000",
            "20220912T090000",
            "20220919T090000",
            "20220926T090000"
        ]
    );
}

/// S4: this-and-future edit truncates the series and forks a new UID.
#[test]
fn edit_this_and_future_from_non_first_instance() {
    let mut calendar = Calendar::new();
    let mut store = mock_store(&mut calendar);
    store.add(monday_meeting()).unwrap();

    let patch = EventPatch {
        summary: Some("Team meeting".into()),
        ..EventPatch::default()
    };
    store
        .edit(
            "mock-uid-1",
            Some(&floating(2022, 9, 5, 9, 0, 0)),
            &patch,
            EditScope::ThisAndFuture,
        )
        .unwrap();

    let original = calendar.master("mock-uid-1").unwrap();
    assert_eq!(
        original
            .rrule
            .as_ref()
            .unwrap()
            .until
            .as_ref()
            .map(ToString::to_string),
        Some("20220904T235959".to_string())
    );

    let forked = calendar.master("mock-uid-2").unwrap();
    assert_eq!(forked.dtstart.wall_string(), "20220905T090000");
    assert_eq!(forked.summary.as_deref(), Some("Team meeting"));
    assert_eq!(forked.rrule.as_ref().unwrap().to_string(), "FREQ=WEEKLY;BYDAY=MO");

    let occurrences = september_window(&calendar);
    assert_eq!(
        occurrences,
        vec![
            (
                "mock-uid-1".to_string(),
                "20220829T090000".to_string(),
                "Monday meeting".to_string()
            ),
            (
                "mock-uid-2".to_string(),
                "20220905T090000".to_string(),
                "Team meeting".to_string()
            ),
            (
                "mock-uid-2".to_string(),
                "20220912T090000".to_string(),
                "Team meeting".to_string()
            ),
            (
                "mock-uid-2".to_string(),
                "20220919T090000".to_string(),
                "Team meeting".to_string()
            ),
            (
                "mock-uid-2".to_string(),
                "20220926T090000".to_string(),
                "Team meeting".to_string()
            ),
        ]
    );
}

/// S5: converting a single event to a recurring master.
#[test]
fn convert_single_to_recurring() {
    let mut calendar = Calendar::new();
    let mut store = mock_store(&mut calendar);
    let single = Event::new(floating(2022, 8, 29, 9, 0, 0));
    store.add(single).unwrap();

    let patch = EventPatch {
        rrule: Some(parse_rrule("FREQ=DAILY;COUNT=3", 1, 1).unwrap()),
        ..EventPatch::default()
    };
    store
        .edit("mock-uid-1", None, &patch, EditScope::All)
        .unwrap();

    let resolver = TimeZoneResolver::new();
    let occurrences: Vec<(String, Option<String>)> = calendar
        .timeline(&resolver)
        .iter()
        .unwrap()
        .map(|occ| {
            (
                occ.start.wall_string(),
                occ.recurrence_id.map(|rid| rid.wall_string()),
            )
        })
        .collect();
    assert_eq!(
        occurrences,
        vec![
            (
                "20220829T090000".to_string(),
                Some("20220829T090000".to_string())
            ),
            (
                "20220830T090000".to_string(),
                Some("20220830T090000".to_string())
            ),
            (
                "20220831T090000".to_string(),
                Some("20220831T090000".to_string())
            ),
        ]
    );
}

/// S6: an all-day event sorts before a timed midnight event on the same
/// date.
#[test]
fn all_day_sorts_before_timed() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:timed@example.com\r\n\
DTSTAMP:20220829T000000Z\r\n\
DTSTART:20220829T000000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:allday@example.com\r\n\
DTSTAMP:20220829T000000Z\r\n\
DTSTART;VALUE=DATE:20220829\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let calendar = decode_calendar(input).unwrap();
    let resolver = TimeZoneResolver::new();
    let uids: Vec<String> = calendar
        .timeline(&resolver)
        .on_date(Date::new(2022, 8, 29))
        .unwrap()
        .map(|occ| occ.uid.to_string())
        .collect();
    assert_eq!(uids, vec!["allday@example.com", "timed@example.com"]);
}

/// Sequence bookkeeping: scheduling-significant edits bump SEQUENCE by
/// one, others leave it alone.
#[test]
fn sequence_is_monotonic_per_significant_edit() {
    let mut calendar = Calendar::new();
    let mut store = mock_store(&mut calendar);
    store.add(monday_meeting()).unwrap();
    assert_eq!(calendar.master("mock-uid-1").unwrap().sequence, Some(0));

    let mut store = mock_store(&mut calendar);
    store
        .edit(
            "mock-uid-1",
            None,
            &EventPatch {
                location: Some("Room 5".into()),
                ..EventPatch::default()
            },
            EditScope::All,
        )
        .unwrap();
    assert_eq!(calendar.master("mock-uid-1").unwrap().sequence, Some(1));

    let mut store = mock_store(&mut calendar);
    store
        .edit(
            "mock-uid-1",
            None,
            &EventPatch {
                description: Some("notes".into()),
                ..EventPatch::default()
            },
            EditScope::All,
        )
        .unwrap();
    assert_eq!(calendar.master("mock-uid-1").unwrap().sequence, Some(1));
}

/// Timeline queries stay bounded even for rules with no COUNT or UNTIL.
#[test]
fn unbounded_series_is_clipped_by_max_expansions() {
    let mut calendar = Calendar::new();
    let mut store = mock_store(&mut calendar);
    store.add(monday_meeting()).unwrap();

    let resolver = TimeZoneResolver::new();
    let config = CalendarConfig {
        max_expansions: 25,
        ..CalendarConfig::default()
    };
    let count = calendar
        .timeline_with(&resolver, config)
        .iter()
        .unwrap()
        .count();
    assert_eq!(count, 25);
}
