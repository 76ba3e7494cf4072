//! Lifecycle management for events and to-dos on a calendar.
//!
//! A store is a manager for items within a [`Calendar`], updating the
//! bookkeeping properties RFC 5545 requires across edits: `DTSTAMP` and
//! `LAST-MODIFIED` from an injected clock, `SEQUENCE` increments on
//! scheduling-significant changes, `EXDATE` for deleted instances,
//! `UNTIL` truncation and series forking for this-and-future edits, and
//! override management keyed by `RECURRENCE-ID`.

use std::collections::HashSet;

use chrono::{Datelike, Timelike};
use koyomi_core::{CalendarConfig, Clock, SystemClock, UidFactory, UuidFactory};
use koyomi_rfc::ical::core::{DateTime, Duration, RRule, RRuleUntil, Date};
use koyomi_rfc::ical::expand::{TimeZoneResolver, convert_to_utc_lenient};

use crate::caldatetime::CalDateTime;
use crate::calendar::Calendar;
use crate::error::{RecurrenceError, StoreError, ValidationError};
use crate::event::{Event, RelationshipType};
use crate::recurrence::RecurrenceIter;
use crate::todo::Todo;

/// Which instances of a recurring series a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Only the addressed instance.
    This,
    /// The addressed instance and everything after it.
    ThisAndFuture,
    /// The whole series.
    All,
}

/// A partial update: only set fields are applied.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub dtstart: Option<CalDateTime>,
    pub dtend: Option<CalDateTime>,
    pub duration: Option<Duration>,
    pub rrule: Option<RRule>,
    pub categories: Option<Vec<String>>,
}

impl EventPatch {
    /// Whether the patch touches a scheduling-significant field.
    #[must_use]
    fn is_significant(&self) -> bool {
        self.dtstart.is_some()
            || self.dtend.is_some()
            || self.duration.is_some()
            || self.rrule.is_some()
            || self.status.is_some()
            || self.location.is_some()
            || self.summary.is_some()
    }
}

/// A partial update for to-dos.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due: Option<CalDateTime>,
    pub duration: Option<Duration>,
    pub percent_complete: Option<i32>,
    pub priority: Option<i32>,
}

impl TodoPatch {
    fn is_significant(&self) -> bool {
        self.due.is_some()
            || self.duration.is_some()
            || self.status.is_some()
            || self.summary.is_some()
    }
}

/// An event store manages the lifecycle of events on a [`Calendar`].
///
/// The calendar itself is a plain container; the store layers on the
/// bookkeeping a correct editor needs. Time and fresh UIDs come from
/// injected sources so tests are deterministic.
pub struct EventStore<'a> {
    calendar: &'a mut Calendar,
    clock: Box<dyn Clock>,
    uids: Box<dyn UidFactory>,
    resolver: TimeZoneResolver,
    config: CalendarConfig,
}

impl<'a> EventStore<'a> {
    #[must_use]
    pub fn new(calendar: &'a mut Calendar) -> Self {
        Self {
            calendar,
            clock: Box::new(SystemClock),
            uids: Box::new(UuidFactory),
            resolver: TimeZoneResolver::new(),
            config: CalendarConfig::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_uid_factory(mut self, uids: impl UidFactory + 'static) -> Self {
        self.uids = Box::new(uids);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: TimeZoneResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: CalendarConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds an event, assigning a UID and bookkeeping defaults as needed.
    ///
    /// ## Errors
    ///
    /// Fails on master UID collisions, orphan overrides, unsupported
    /// relationship types, and structural validation errors.
    pub fn add(&mut self, mut event: Event) -> Result<&Event, StoreError> {
        if event.uid.is_empty() {
            event.uid = self.uids.new_uid();
        }
        check_relationships(&event)?;

        if event.recurrence_id.is_none() {
            if self.calendar.master(&event.uid).is_some() {
                return Err(StoreError::UidExists(event.uid));
            }
        } else {
            self.check_override_slot(&event)?;
        }

        event.validate()?;

        let now = self.now();
        if event.created.is_none() {
            event.created = Some(now.clone());
        }
        if event.sequence.is_none() {
            event.sequence = Some(0);
        }
        event.dtstamp = now;

        tracing::debug!(uid = %event.uid, "Adding event");
        let index = self.calendar.events.len();
        self.calendar.events.push(event);
        Ok(&self.calendar.events[index])
    }

    /// Deletes an event, an instance, or an instance range.
    ///
    /// - `This` with a recurrence id adds an `EXDATE` to the master and
    ///   drops any override at that slot.
    /// - `ThisAndFuture` truncates the master's rule just before the
    ///   instance (or removes the whole series when the instance is the
    ///   first) and drops overrides at or after it.
    /// - `All`, or no recurrence id, removes the series and cascades to
    ///   `RELATED-TO;RELTYPE=PARENT` children.
    ///
    /// ## Errors
    ///
    /// Fails when the UID is unknown or an instance is addressed on a
    /// non-recurring item.
    pub fn delete(
        &mut self,
        uid: &str,
        recurrence_id: Option<&CalDateTime>,
        scope: EditScope,
    ) -> Result<(), StoreError> {
        let master_index = self
            .master_index(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;

        // Deleting this-and-future from the first instance is deleting
        // the whole series.
        let collapses = matches!(scope, EditScope::ThisAndFuture)
            && recurrence_id.is_some_and(|rid| {
                self.calendar.events[master_index]
                    .dtstart
                    .matches(rid, &self.resolver)
            });

        match (scope, recurrence_id) {
            (EditScope::All, _) | (_, None) => {
                self.remove_cascading(uid);
                Ok(())
            }
            _ if collapses => {
                self.remove_cascading(uid);
                Ok(())
            }
            (EditScope::This, Some(rid)) => self.delete_instance(master_index, rid),
            (EditScope::ThisAndFuture, Some(rid)) => {
                self.truncate_series(master_index, rid)?;
                Ok(())
            }
        }
    }

    /// Applies a partial update to an event, an instance, or a range.
    ///
    /// ## Errors
    ///
    /// Fails when the target does not exist, when the addressed instance
    /// is not part of the expansion, or when the patch violates an
    /// invariant.
    pub fn edit(
        &mut self,
        uid: &str,
        recurrence_id: Option<&CalDateTime>,
        patch: &EventPatch,
        scope: EditScope,
    ) -> Result<(), StoreError> {
        let master_index = self
            .master_index(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;

        // Editing this-and-future from the first instance edits the
        // series in place.
        let collapses = recurrence_id.is_some_and(|rid| {
            matches!(scope, EditScope::ThisAndFuture)
                && self.calendar.events[master_index]
                    .dtstart
                    .matches(rid, &self.resolver)
        });

        match (scope, recurrence_id) {
            (EditScope::All, _) | (_, None) => self.edit_all(master_index, patch),
            _ if collapses => self.edit_all(master_index, patch),
            (EditScope::This, Some(rid)) => self.edit_instance(master_index, rid, patch),
            (EditScope::ThisAndFuture, Some(rid)) => self.split_series(master_index, rid, patch),
        }
    }

    // ---- delete helpers ----

    fn delete_instance(&mut self, master_index: usize, rid: &CalDateTime) -> Result<(), StoreError> {
        let uid = self.calendar.events[master_index].uid.clone();
        if !self.calendar.events[master_index].is_recurring() {
            return Err(StoreError::NotRecurring(uid));
        }

        let now = self.now();
        let rid = rid.clone();

        // Drop any override occupying the slot.
        let resolver = &self.resolver;
        self.calendar.events.retain(|e| {
            !(e.uid == uid
                && e.recurrence_id
                    .as_ref()
                    .is_some_and(|r| r.matches(&rid, resolver)))
        });

        let index = self.master_index_unchecked(&uid);
        let master = &mut self.calendar.events[index];
        master.exdate.push(rid);
        touch(master, &now, true);
        Ok(())
    }

    fn truncate_series(&mut self, master_index: usize, rid: &CalDateTime) -> Result<(), StoreError> {
        let uid = self.calendar.events[master_index].uid.clone();
        if self.calendar.events[master_index].rrule.is_none() {
            return Err(StoreError::NotRecurring(uid));
        }

        let now = self.now();
        let until = self.truncation_until(rid);
        let boundary = rid.naive();

        // Overrides at or after the boundary go with the deleted range.
        self.calendar.events.retain(|e| {
            !(e.uid == uid
                && e.recurrence_id
                    .as_ref()
                    .is_some_and(|r| r.naive() >= boundary))
        });

        let index = self.master_index_unchecked(&uid);
        let master = &mut self.calendar.events[index];
        if let Some(rrule) = &mut master.rrule {
            rrule.count = None;
            rrule.until = Some(until);
        }
        master.rdate.retain(|r| r.naive() < boundary);
        touch(master, &now, true);
        Ok(())
    }

    /// The `UNTIL` value that truncates a series just before `rid`.
    ///
    /// All-day series end one day earlier; timed series end at 23:59:59
    /// on the previous day (converted to UTC for zoned anchors, since
    /// `UNTIL` with a zoned `DTSTART` is a UTC instant).
    fn truncation_until(&self, rid: &CalDateTime) -> RRuleUntil {
        match rid {
            CalDateTime::Date(_) => {
                let previous = rid
                    .naive_date()
                    .pred_opt()
                    .unwrap_or_else(|| rid.naive_date());
                RRuleUntil::Date(date_from_naive(previous))
            }
            CalDateTime::DateTime(dt) => {
                let end_of_previous_day = rid
                    .naive_date()
                    .pred_opt()
                    .unwrap_or_else(|| rid.naive_date())
                    .and_hms_opt(23, 59, 59)
                    .unwrap_or_else(|| rid.naive());

                if let Some(tzid) = dt.tzid() {
                    if let Ok(utc) =
                        convert_to_utc_lenient(end_of_previous_day, tzid, &self.resolver)
                    {
                        return RRuleUntil::DateTime(datetime_from_naive_utc(utc.naive_utc()));
                    }
                }
                let wall = end_of_previous_day;
                let value = if dt.is_utc() {
                    datetime_from_naive_utc(wall)
                } else {
                    DateTime {
                        form: koyomi_rfc::ical::core::DateTimeForm::Floating,
                        ..datetime_from_naive_utc(wall)
                    }
                };
                RRuleUntil::DateTime(value)
            }
        }
    }

    /// Removes the item with this UID and every child related to it via
    /// `RELTYPE=PARENT`, walking the UID graph with a visited set.
    fn remove_cascading(&mut self, uid: &str) {
        let mut visited = HashSet::new();
        self.remove_cascading_inner(uid, &mut visited);
    }

    fn remove_cascading_inner(&mut self, uid: &str, visited: &mut HashSet<String>) {
        if !visited.insert(uid.to_string()) {
            return;
        }

        let mut children: Vec<String> = Vec::new();
        for event in &self.calendar.events {
            if event
                .related_to
                .iter()
                .any(|r| r.reltype == RelationshipType::Parent && r.uid == uid)
            {
                children.push(event.uid.clone());
            }
        }
        for todo in &self.calendar.todos {
            if todo
                .related_to
                .iter()
                .any(|r| r.reltype == RelationshipType::Parent && r.uid == uid)
            {
                children.push(todo.uid.clone());
            }
        }

        tracing::debug!(%uid, children = children.len(), "Removing item");
        self.calendar.events.retain(|e| e.uid != uid);
        self.calendar.todos.retain(|t| t.uid != uid);

        for child in children {
            self.remove_cascading_inner(&child, visited);
        }
    }

    // ---- edit helpers ----

    fn edit_all(&mut self, master_index: usize, patch: &EventPatch) -> Result<(), StoreError> {
        let now = self.now();
        let master = &self.calendar.events[master_index];
        let old_anchor = master.dtstart.clone();
        let old_rrule = master.rrule.clone();

        let mut updated = master.clone();
        apply_patch(&mut updated, patch);
        updated.validate()?;

        let expansion_changed =
            updated.dtstart != old_anchor || updated.rrule != old_rrule;
        touch(&mut updated, &now, patch.is_significant());

        let uid = updated.uid.clone();
        self.calendar.events[master_index] = updated;

        // Overrides whose slot no longer exists in the regenerated
        // expansion are dropped, unless the expansion is unchanged.
        if expansion_changed && self.calendar.events[master_index].is_recurring() {
            let master = self.calendar.events[master_index].clone();
            let mut keep: Vec<bool> = Vec::with_capacity(self.calendar.events.len());
            for event in &self.calendar.events {
                let drop = event.uid == uid
                    && event.recurrence_id.as_ref().is_some_and(|rid| {
                        !self.occurrence_exists(&master, rid).unwrap_or(false)
                    });
                keep.push(!drop);
            }
            let mut it = keep.into_iter();
            self.calendar.events.retain(|_| it.next().unwrap_or(true));
        }
        Ok(())
    }

    fn edit_instance(
        &mut self,
        master_index: usize,
        rid: &CalDateTime,
        patch: &EventPatch,
    ) -> Result<(), StoreError> {
        let uid = self.calendar.events[master_index].uid.clone();
        if !self.calendar.events[master_index].is_recurring() {
            return Err(StoreError::NotRecurring(uid));
        }
        if patch.rrule.is_some() {
            return Err(StoreError::RRuleOnInstance);
        }

        let now = self.now();
        let master = self.calendar.events[master_index].clone();
        if !self.occurrence_exists(&master, rid)? {
            return Err(StoreError::Validation(ValidationError::OrphanOverride));
        }

        let existing = self.calendar.events.iter_mut().find(|e| {
            e.uid == uid
                && e.recurrence_id
                    .as_ref()
                    .is_some_and(|r| r.naive() == rid.naive())
        });

        if let Some(override_event) = existing {
            apply_patch(override_event, patch);
            override_event.validate()?;
            touch(override_event, &now, patch.is_significant());
            return Ok(());
        }

        // Materialize the instance as an override inheriting the UID.
        let duration = master.computed_duration();
        let mut override_event = master.clone();
        override_event.rrule = None;
        override_event.undecoded_rrule = None;
        override_event.rdate.clear();
        override_event.exdate.clear();
        override_event.recurrence_id = Some(rid.clone());
        override_event.dtstart = rid.clone();
        if override_event.dtend.is_some() {
            override_event.dtend = Some(rid.shift(duration));
        }
        override_event.created = Some(master.dtstamp.clone());
        override_event.property_order = Vec::new();
        apply_patch(&mut override_event, patch);
        override_event.validate()?;
        touch(&mut override_event, &now, true);

        tracing::debug!(%uid, rid = %rid, "Creating override");
        self.calendar.events.push(override_event);
        Ok(())
    }

    fn split_series(
        &mut self,
        master_index: usize,
        rid: &CalDateTime,
        patch: &EventPatch,
    ) -> Result<(), StoreError> {
        let uid = self.calendar.events[master_index].uid.clone();
        if self.calendar.events[master_index].rrule.is_none() {
            return Err(StoreError::NotRecurring(uid));
        }

        let now = self.now();
        let master = self.calendar.events[master_index].clone();
        if !self.occurrence_exists(&master, rid)? {
            return Err(StoreError::Validation(ValidationError::OrphanOverride));
        }

        // A COUNT-bounded rule keeps counting across the split: the new
        // series' budget is what the old one had not yet spent.
        let consumed = self.occurrences_before(&master, rid)?;
        let boundary = rid.naive();

        let duration = master.computed_duration();
        let mut forked = master.clone();
        forked.uid = self.uids.new_uid();
        forked.recurrence_id = None;
        forked.dtstart = rid.clone();
        if forked.dtend.is_some() {
            forked.dtend = Some(rid.shift(duration));
        }
        if let Some(rrule) = &mut forked.rrule {
            if let Some(count) = rrule.count {
                rrule.count = Some(count.saturating_sub(consumed));
            }
        }
        forked.rdate = master
            .rdate
            .iter()
            .filter(|r| r.naive() >= boundary)
            .cloned()
            .collect();
        forked.exdate = master
            .exdate
            .iter()
            .filter(|x| x.naive() >= boundary)
            .cloned()
            .collect();
        forked.sequence = Some(0);
        forked.created = Some(now.clone());
        forked.property_order = Vec::new();
        apply_patch(&mut forked, patch);
        forked.validate()?;
        forked.dtstamp = now.clone();
        forked.last_modified = Some(now.clone());

        // Overrides at or after the boundary migrate to the new series,
        // their recurrence ids shifted by any time shift in the edit.
        let delta = forked.dtstart.naive() - rid.naive();
        let forked_uid = forked.uid.clone();
        for event in &mut self.calendar.events {
            if event.uid != uid {
                continue;
            }
            let Some(event_rid) = &event.recurrence_id else {
                continue;
            };
            if event_rid.naive() >= boundary {
                let shifted = (!delta.is_zero()).then(|| event_rid.shift(delta));
                event.uid = forked_uid.clone();
                if shifted.is_some() {
                    event.recurrence_id = shifted;
                }
            }
        }

        // Truncate the original series just before the boundary.
        let until = self.truncation_until(rid);
        let master = &mut self.calendar.events[master_index];
        if let Some(rrule) = &mut master.rrule {
            rrule.count = None;
            rrule.until = Some(until);
        }
        master.rdate.retain(|r| r.naive() < boundary);
        master.exdate.retain(|x| x.naive() < boundary);
        touch(master, &now, true);

        tracing::debug!(old = %uid, new = %forked_uid, "Split series");
        self.calendar.events.push(forked);
        Ok(())
    }

    // ---- lookup and expansion helpers ----

    fn master_index(&self, uid: &str) -> Option<usize> {
        self.calendar
            .events
            .iter()
            .position(|e| e.uid == uid && !e.is_override())
    }

    /// Like [`EventStore::master_index`] after mutations that are known
    /// to keep the master; falls back to 0 defensively.
    fn master_index_unchecked(&self, uid: &str) -> usize {
        self.master_index(uid).unwrap_or(0)
    }

    /// Whether `rid` names a candidate of the master's expansion, before
    /// `EXDATE` filtering and before override replacement.
    fn occurrence_exists(&self, master: &Event, rid: &CalDateTime) -> Result<bool, RecurrenceError> {
        let iter = RecurrenceIter::new(
            master.dtstart.clone(),
            master.rrule.as_ref(),
            &master.rdate,
            &[],
            &self.resolver,
            self.config.max_expansions,
        )?;
        let target = rid.naive();
        for candidate in iter {
            if candidate.matches(rid, &self.resolver) {
                return Ok(true);
            }
            if candidate.naive() > target {
                return Ok(false);
            }
        }
        Ok(false)
    }

    /// Counts rule candidates strictly before `rid`.
    fn occurrences_before(&self, master: &Event, rid: &CalDateTime) -> Result<u32, RecurrenceError> {
        let iter = RecurrenceIter::new(
            master.dtstart.clone(),
            master.rrule.as_ref(),
            &[],
            &[],
            &self.resolver,
            self.config.max_expansions,
        )?;
        let target = rid.naive();
        let mut count: u32 = 0;
        for candidate in iter {
            if candidate.naive() >= target {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn check_override_slot(&self, event: &Event) -> Result<(), StoreError> {
        let Some(rid) = &event.recurrence_id else {
            return Ok(());
        };
        let Some(master) = self.calendar.master(&event.uid) else {
            return Err(StoreError::NotFound(event.uid.clone()));
        };
        if !rid.same_value_type(&master.dtstart) {
            return Err(StoreError::Validation(
                ValidationError::RecurrenceIdTypeMismatch,
            ));
        }
        if !self.occurrence_exists(master, rid)? {
            return Err(StoreError::Validation(ValidationError::OrphanOverride));
        }
        if self.calendar.override_at(&event.uid, rid, &self.resolver).is_some() {
            return Err(StoreError::UidExists(event.uid.clone()));
        }
        Ok(())
    }

    fn now(&self) -> DateTime {
        let now = self.clock.now_utc();
        DateTime::utc(
            u16::try_from(now.year()).unwrap_or(1970),
            u8::try_from(now.month()).unwrap_or(1),
            u8::try_from(now.day()).unwrap_or(1),
            u8::try_from(now.hour()).unwrap_or(0),
            u8::try_from(now.minute()).unwrap_or(0),
            u8::try_from(now.second()).unwrap_or(0),
        )
    }
}

/// A to-do store manages the lifecycle of to-dos on a [`Calendar`].
pub struct TodoStore<'a> {
    calendar: &'a mut Calendar,
    clock: Box<dyn Clock>,
    uids: Box<dyn UidFactory>,
}

impl<'a> TodoStore<'a> {
    #[must_use]
    pub fn new(calendar: &'a mut Calendar) -> Self {
        Self {
            calendar,
            clock: Box::new(SystemClock),
            uids: Box::new(UuidFactory),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_uid_factory(mut self, uids: impl UidFactory + 'static) -> Self {
        self.uids = Box::new(uids);
        self
    }

    /// Adds a to-do, assigning a UID and bookkeeping defaults as needed.
    ///
    /// ## Errors
    ///
    /// Fails on UID collisions, unsupported relationship types, and
    /// validation errors.
    pub fn add(&mut self, mut todo: Todo) -> Result<&Todo, StoreError> {
        if todo.uid.is_empty() {
            todo.uid = self.uids.new_uid();
        }
        if todo
            .related_to
            .iter()
            .any(|r| r.reltype != RelationshipType::Parent)
        {
            return Err(StoreError::UnsupportedRelationship(
                "only RELTYPE=PARENT is managed".to_string(),
            ));
        }
        if self.calendar.todo(&todo.uid).is_some() {
            return Err(StoreError::UidExists(todo.uid));
        }
        todo.validate()?;

        let now = self.now();
        if todo.created.is_none() {
            todo.created = Some(now.clone());
        }
        if todo.sequence.is_none() {
            todo.sequence = Some(0);
        }
        todo.dtstamp = now;

        let index = self.calendar.todos.len();
        self.calendar.todos.push(todo);
        Ok(&self.calendar.todos[index])
    }

    /// Deletes a to-do and, recursively, its `RELTYPE=PARENT` children.
    ///
    /// ## Errors
    ///
    /// Fails when the UID is unknown.
    pub fn delete(&mut self, uid: &str) -> Result<(), StoreError> {
        if self.calendar.todo(uid).is_none() {
            return Err(StoreError::NotFound(uid.to_string()));
        }
        let mut visited = HashSet::new();
        self.delete_inner(uid, &mut visited);
        Ok(())
    }

    fn delete_inner(&mut self, uid: &str, visited: &mut HashSet<String>) {
        if !visited.insert(uid.to_string()) {
            return;
        }
        let children: Vec<String> = self
            .calendar
            .todos
            .iter()
            .filter(|t| {
                t.related_to
                    .iter()
                    .any(|r| r.reltype == RelationshipType::Parent && r.uid == uid)
            })
            .map(|t| t.uid.clone())
            .collect();

        self.calendar.todos.retain(|t| t.uid != uid);
        for child in children {
            self.delete_inner(&child, visited);
        }
    }

    /// Applies a partial update to a to-do.
    ///
    /// ## Errors
    ///
    /// Fails when the UID is unknown or the patch violates an invariant.
    pub fn edit(&mut self, uid: &str, patch: &TodoPatch) -> Result<(), StoreError> {
        let now = self.now();
        let Some(todo) = self.calendar.todos.iter_mut().find(|t| t.uid == uid) else {
            return Err(StoreError::NotFound(uid.to_string()));
        };

        if let Some(summary) = &patch.summary {
            todo.summary = Some(summary.clone());
        }
        if let Some(description) = &patch.description {
            todo.description = Some(description.clone());
        }
        if let Some(status) = &patch.status {
            todo.status = Some(status.clone());
        }
        if let Some(due) = &patch.due {
            todo.due = Some(due.clone());
        }
        if let Some(duration) = &patch.duration {
            todo.duration = Some(*duration);
        }
        if let Some(percent) = patch.percent_complete {
            todo.percent_complete = Some(percent);
        }
        if let Some(priority) = patch.priority {
            todo.priority = Some(priority);
        }
        todo.validate()?;

        todo.dtstamp = now.clone();
        todo.last_modified = Some(now);
        if patch.is_significant() {
            todo.sequence = Some(todo.sequence.unwrap_or(0) + 1);
        }
        Ok(())
    }

    fn now(&self) -> DateTime {
        let now = self.clock.now_utc();
        DateTime::utc(
            u16::try_from(now.year()).unwrap_or(1970),
            u8::try_from(now.month()).unwrap_or(1),
            u8::try_from(now.day()).unwrap_or(1),
            u8::try_from(now.hour()).unwrap_or(0),
            u8::try_from(now.minute()).unwrap_or(0),
            u8::try_from(now.second()).unwrap_or(0),
        )
    }
}

/// Refreshes the bookkeeping stamps on a mutated event.
fn touch(event: &mut Event, now: &DateTime, significant: bool) {
    event.dtstamp = now.clone();
    event.last_modified = Some(now.clone());
    if significant {
        event.sequence = Some(event.sequence.unwrap_or(0) + 1);
    }
}

/// Applies the set fields of a patch to an event.
///
/// A start change without an explicit end keeps the event's length by
/// realigning `DTEND`.
fn apply_patch(event: &mut Event, patch: &EventPatch) {
    if let Some(dtstart) = &patch.dtstart {
        let duration = event.computed_duration();
        event.dtstart = dtstart.clone();
        if patch.dtend.is_none() && event.dtend.is_some() {
            event.dtend = Some(dtstart.shift(duration));
        }
    }
    if let Some(dtend) = &patch.dtend {
        event.dtend = Some(dtend.clone());
        event.duration = None;
    }
    if let Some(duration) = &patch.duration {
        event.duration = Some(*duration);
        event.dtend = None;
    }
    if let Some(rrule) = &patch.rrule {
        event.rrule = Some(rrule.clone());
        event.undecoded_rrule = None;
    }
    if let Some(summary) = &patch.summary {
        event.summary = Some(summary.clone());
    }
    if let Some(description) = &patch.description {
        event.description = Some(description.clone());
    }
    if let Some(location) = &patch.location {
        event.location = Some(location.clone());
    }
    if let Some(status) = &patch.status {
        event.status = Some(status.clone());
    }
    if let Some(categories) = &patch.categories {
        event.categories = categories.clone();
    }
}

fn check_relationships(event: &Event) -> Result<(), StoreError> {
    if event
        .related_to
        .iter()
        .any(|r| r.reltype != RelationshipType::Parent)
    {
        return Err(StoreError::UnsupportedRelationship(
            "only RELTYPE=PARENT is managed".to_string(),
        ));
    }
    Ok(())
}

fn date_from_naive(date: chrono::NaiveDate) -> Date {
    Date {
        year: u16::try_from(date.year()).unwrap_or(0),
        month: u8::try_from(date.month()).unwrap_or(1),
        day: u8::try_from(date.day()).unwrap_or(1),
    }
}

fn datetime_from_naive_utc(naive: chrono::NaiveDateTime) -> DateTime {
    DateTime::utc(
        u16::try_from(naive.date().year()).unwrap_or(1970),
        u8::try_from(naive.date().month()).unwrap_or(1),
        u8::try_from(naive.date().day()).unwrap_or(1),
        u8::try_from(naive.time().hour()).unwrap_or(0),
        u8::try_from(naive.time().minute()).unwrap_or(0),
        u8::try_from(naive.time().second()).unwrap_or(0),
    )
}
