//! Decode → encode → decode stability at the typed-calendar level.
//!
//! The first re-encode may normalize shapes (repeated EXDATE lines join
//! into one, parameter quoting is canonicalized), so the property under
//! test is that one decode/encode cycle reaches a fixpoint.

use koyomi_test::cal::{Calendar, decode_calendar, encode_calendar};

fn fixpoint(input: &str) -> (Calendar, Calendar) {
    let first = decode_calendar(input).expect("first decode");
    let second = decode_calendar(&encode_calendar(&first)).expect("second decode");
    let third = decode_calendar(&encode_calendar(&second)).expect("third decode");
    assert_eq!(second, third, "decode/encode did not reach a fixpoint");
    (first, second)
}

#[test]
fn minimal_event_is_stable() {
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
    let (first, second) = fixpoint(input);
    assert_eq!(first, second);
}

#[test]
fn repeated_exdate_lines_normalize_once() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:exdates@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220829T090000\r\n\
RRULE:FREQ=DAILY;COUNT=10\r\n\
EXDATE:20220830T090000\r\n\
EXDATE:20220901T090000\r\n\
SUMMARY:Mostly daily\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let (first, second) = fixpoint(input);
    assert_eq!(first.events[0].exdate, second.events[0].exdate);
    assert_eq!(first.events[0].rrule, second.events[0].rrule);
}

#[test]
fn zoned_event_is_stable() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Stockholm\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19961027T040000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:zoned@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART;TZID=Europe/Stockholm:20220829T090000\r\n\
DTEND;TZID=Europe/Stockholm:20220829T100000\r\n\
SUMMARY:Fika\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let (first, second) = fixpoint(input);
    assert_eq!(first, second);
    assert_eq!(second.events[0].dtstart.tzid(), Some("Europe/Stockholm"));
}

#[test]
fn series_with_override_is_stable() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:series@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220829T090000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
SUMMARY:Monday meeting\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:series@example.com\r\n\
RECURRENCE-ID:20220905T090000\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220905T100000\r\n\
SUMMARY:Moved meeting\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let (first, second) = fixpoint(input);
    assert_eq!(first, second);
    assert_eq!(second.events.len(), 2);
    assert!(second.events[1].is_override());
}

#[test]
fn unknown_content_is_stable() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
X-WR-CALNAME:Team calendar\r\n\
BEGIN:X-VVENUE\r\n\
X-VENUE-NAME:Main Hall\r\n\
END:X-VVENUE\r\n\
BEGIN:VEVENT\r\n\
UID:custom@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220829T090000\r\n\
X-MICROSOFT-CDO-BUSYSTATUS:BUSY\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let (first, second) = fixpoint(input);
    assert_eq!(first, second);
    assert_eq!(second.extra_components.len(), 1);
    assert_eq!(second.events[0].extra[0].name, "X-MICROSOFT-CDO-BUSYSTATUS");
}
