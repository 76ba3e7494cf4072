//! The typed calendar container.

use koyomi_core::CalendarConfig;
use koyomi_rfc::ical::core::{Component, Property};
use koyomi_rfc::ical::expand::TimeZoneResolver;

use crate::caldatetime::CalDateTime;
use crate::event::Event;
use crate::timeline::Timeline;
use crate::todo::Todo;

pub const DEFAULT_PRODID: &str = "-//Koyomi//Koyomi Calendar//EN";

/// A calendar: typed events and to-dos, plus the component kinds the
/// core treats as opaque (journals, free/busy, timezones, X-components),
/// preserved for round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub prodid: String,
    pub version: String,
    pub events: Vec<Event>,
    pub todos: Vec<Todo>,
    pub journals: Vec<Component>,
    pub freebusy: Vec<Component>,
    pub timezones: Vec<Component>,
    /// Unknown top-level components, preserved verbatim.
    pub extra_components: Vec<Component>,
    /// Freestanding calendar properties in insertion order.
    pub extra_props: Vec<Property>,
}

impl Calendar {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prodid: DEFAULT_PRODID.to_string(),
            version: "2.0".to_string(),
            events: Vec::new(),
            todos: Vec::new(),
            journals: Vec::new(),
            freebusy: Vec::new(),
            timezones: Vec::new(),
            extra_components: Vec::new(),
            extra_props: Vec::new(),
        }
    }

    /// Returns the series master for a UID: the event without a
    /// `RECURRENCE-ID`. At most one exists per UID.
    #[must_use]
    pub fn master(&self, uid: &str) -> Option<&Event> {
        self.events
            .iter()
            .find(|e| e.uid == uid && !e.is_override())
    }

    #[must_use]
    pub fn master_mut(&mut self, uid: &str) -> Option<&mut Event> {
        self.events
            .iter_mut()
            .find(|e| e.uid == uid && !e.is_override())
    }

    /// Returns the overrides sharing a UID, keyed by their recurrence id.
    #[must_use]
    pub fn overrides(&self, uid: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.uid == uid && e.is_override())
            .collect()
    }

    /// Returns the override addressed by (UID, RECURRENCE-ID), if any.
    #[must_use]
    pub fn override_at(
        &self,
        uid: &str,
        recurrence_id: &CalDateTime,
        resolver: &TimeZoneResolver,
    ) -> Option<&Event> {
        self.events.iter().find(|e| {
            e.uid == uid
                && e.recurrence_id
                    .as_ref()
                    .is_some_and(|rid| rid.matches(recurrence_id, resolver))
        })
    }

    #[must_use]
    pub fn todo(&self, uid: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.uid == uid)
    }

    /// Builds a timeline view over this calendar's events.
    ///
    /// The view borrows the calendar, so it observes a consistent
    /// snapshot: the calendar cannot be mutated while a timeline on it
    /// is alive.
    #[must_use]
    pub fn timeline<'a>(&'a self, resolver: &'a TimeZoneResolver) -> Timeline<'a> {
        Timeline::new(self, resolver, CalendarConfig::default())
    }

    /// Like [`Calendar::timeline`] with explicit configuration.
    #[must_use]
    pub fn timeline_with<'a>(
        &'a self,
        resolver: &'a TimeZoneResolver,
        config: CalendarConfig,
    ) -> Timeline<'a> {
        Timeline::new(self, resolver, config)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koyomi_rfc::ical::core::{Date, DateTime};

    #[test]
    fn master_ignores_overrides() {
        let mut calendar = Calendar::new();

        let mut master = Event::new(CalDateTime::Date(Date::new(2022, 8, 29)));
        master.uid = "series".into();
        calendar.events.push(master);

        let mut override_event = Event::new(CalDateTime::Date(Date::new(2022, 9, 5)));
        override_event.uid = "series".into();
        override_event.recurrence_id = Some(CalDateTime::Date(Date::new(2022, 9, 5)));
        calendar.events.push(override_event);

        assert!(calendar.master("series").is_some());
        assert!(!calendar.master("series").unwrap().is_override());
        assert_eq!(calendar.overrides("series").len(), 1);
    }

    #[test]
    fn override_at_matches_wall_time() {
        let resolver = TimeZoneResolver::new();
        let mut calendar = Calendar::new();

        let mut override_event = Event::new(CalDateTime::DateTime(DateTime::floating(
            2022, 9, 5, 10, 0, 0,
        )));
        override_event.uid = "series".into();
        override_event.recurrence_id = Some(CalDateTime::DateTime(DateTime::floating(
            2022, 9, 5, 9, 0, 0,
        )));
        calendar.events.push(override_event);

        let rid = CalDateTime::DateTime(DateTime::floating(2022, 9, 5, 9, 0, 0));
        assert!(calendar.override_at("series", &rid, &resolver).is_some());
        let other = CalDateTime::DateTime(DateTime::floating(2022, 9, 12, 9, 0, 0));
        assert!(calendar.override_at("series", &other, &resolver).is_none());
    }
}
