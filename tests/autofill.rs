#![forbid(unsafe_code)]
mod common;

use anyhow::bail;
use caresched::scheduler::{DisqualifyReason, UnfilledReason};
use caresched::{
    AvailabilityStatus, CareTypeId, Caregiver, CaregiverId, Client, ClientId, CompletedVisit,
    Dataset, Engine, EngineError, OpenShift, ScheduleEntry, ScheduleId, ScheduleStore,
    ShiftId, ShiftOutcome, ShiftStatus, Urgency,
};
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    care_type, caregiver, caregiver_at, certified, client, d, dataset, entry, noon, open_shift,
};
use std::collections::BTreeSet;

const WEEK_START: (i32, u32, u32) = (2024, 6, 9);
const WEEK_END: (i32, u32, u32) = (2024, 6, 15);

fn week() -> (NaiveDate, NaiveDate) {
    (
        d(WEEK_START.0, WEEK_START.1, WEEK_START.2),
        d(WEEK_END.0, WEEK_END.1, WEEK_END.2),
    )
}

/// A : 38 h, 2 mi, 5 visites. B : 10 h, 25 mi. Créneau mercredi 09-13 exigeant CNA.
fn busy_week() -> Dataset {
    let mut ds = dataset();
    ds.care_types.push(care_type("personal", &["CNA"]));
    let mut c1 = client("c1");
    c1.care_type_id = Some(CareTypeId::new("personal"));
    ds.clients.push(c1);
    ds.clients.push(client("c2"));
    ds.caregivers.push(certified(caregiver_at("a", 2.0), &["CNA"]));
    ds.caregivers.push(certified(caregiver_at("b", 25.0), &["CNA"]));

    ds.schedules.push(entry("a", "c2", d(2024, 6, 10), 8, 18));
    ds.schedules.push(entry("a", "c2", d(2024, 6, 11), 8, 18));
    ds.schedules.push(entry("a", "c2", d(2024, 6, 13), 8, 18));
    ds.schedules.push(entry("a", "c2", d(2024, 6, 14), 8, 16));
    ds.schedules.push(entry("b", "c2", d(2024, 6, 13), 8, 18));
    for day in 1..=5 {
        ds.visits.push(CompletedVisit {
            caregiver_id: CaregiverId::new("a"),
            client_id: ClientId::new("c1"),
            date: d(2024, 5, day),
        });
    }
    ds.open_shifts
        .push(open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::Normal));
    ds
}

#[test]
fn hours_cap_disqualifies_the_familiar_nearby_caregiver() {
    let (start, end) = week();
    let mut engine = Engine::new(busy_week());
    let report = engine
        .auto_fill(start, end, true, noon(d(2024, 6, 1)))
        .unwrap();

    assert_eq!((report.total, report.filled, report.failed), (1, 1, 0));
    match &report.results[0] {
        ShiftOutcome::Assigned {
            caregiver_id,
            score,
            familiarity,
            schedule_id,
            ..
        } => {
            assert_eq!(caregiver_id.as_str(), "b");
            assert!((score - 95.0).abs() < 1e-6, "score {score}");
            assert_eq!(*familiarity, 0);
            assert!(schedule_id.is_none());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn dry_run_is_idempotent_and_writes_nothing() {
    let (start, end) = week();
    let mut engine = Engine::new(busy_week());
    let before = serde_json::to_string(engine.store()).unwrap();

    let first = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    let second = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert_eq!(first, second);
    assert!(first.dry_run);
    assert_eq!(serde_json::to_string(engine.store()).unwrap(), before);
}

#[test]
fn committed_run_persists_entry_and_fills_shift() {
    let (start, end) = week();
    let now = noon(d(2024, 6, 1));
    let mut engine = Engine::new(busy_week());
    let report = engine.auto_fill(start, end, false, now).unwrap();
    assert_eq!(report.filled, 1);

    let ShiftOutcome::Assigned {
        schedule_id: Some(schedule_id),
        ..
    } = &report.results[0]
    else {
        panic!("expected a committed assignment");
    };
    let ds = engine.store();
    let created = ds.schedules.iter().find(|e| &e.id == schedule_id).unwrap();
    assert_eq!(created.caregiver_id.as_str(), "b");
    assert_eq!(created.window(), common::w(9, 13));

    let shift = &ds.open_shifts[0];
    assert_eq!(shift.status, ShiftStatus::Filled);
    assert_eq!(shift.filled_by, Some(CaregiverId::new("b")));
    assert_eq!(shift.filled_at, Some(now));

    // le créneau n'est plus ouvert : un second passage n'a rien à faire
    let again = engine.auto_fill(start, end, false, now).unwrap();
    assert_eq!(again.total, 0);
}

#[test]
fn batch_never_double_books_a_caregiver() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.clients.push(client("c2"));
    ds.caregivers.push(caregiver("solo"));
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::Normal));
    ds.open_shifts.push(open_shift("c2", d(2024, 6, 12), 10, 12, Urgency::Normal));

    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert_eq!(report.filled, 1);
    assert!(report.results[0].is_assigned());
    match &report.results[1] {
        ShiftOutcome::Unfilled {
            reason,
            top_disqualified,
            ..
        } => {
            assert_eq!(*reason, UnfilledReason::AllDisqualified);
            assert_eq!(top_disqualified[0].reason, DisqualifyReason::Conflict);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn tentative_hours_count_toward_the_cap() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.caregivers.push(caregiver("solo"));
    ds.schedules.push(entry("solo", "c1", d(2024, 6, 9), 8, 16));
    ds.schedules.push(entry("solo", "c1", d(2024, 6, 15), 8, 16));
    ds.schedules.push(entry("solo", "c1", d(2024, 6, 10), 14, 22));
    ds.schedules.push(entry("solo", "c1", d(2024, 6, 11), 14, 22));
    for day in [12, 13, 14] {
        ds.open_shifts.push(open_shift("c1", d(2024, 6, day), 8, 12, Urgency::Normal));
    }

    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    // 32 + 4 = 36, 36 + 4 = 40 (plafond atteint, pas dépassé), puis 44
    assert_eq!(report.filled, 2);
    assert!(report.results[0].is_assigned());
    assert!(report.results[1].is_assigned());
    match &report.results[2] {
        ShiftOutcome::Unfilled { top_disqualified, .. } => {
            assert_eq!(top_disqualified.len(), 1);
            assert_eq!(top_disqualified[0].reason, DisqualifyReason::ExceedsHours);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn ledgers_are_kept_per_week() {
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.caregivers.push(caregiver("solo"));
    ds.schedules.push(entry("solo", "c1", d(2024, 6, 10), 0, 23));
    ds.schedules.push(entry("solo", "c1", d(2024, 6, 11), 8, 23));
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 12), 8, 12, Urgency::Normal));
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 19), 8, 12, Urgency::Normal));

    let mut engine = Engine::new(ds);
    let report = engine
        .auto_fill(d(2024, 6, 9), d(2024, 6, 22), true, noon(d(2024, 6, 1)))
        .unwrap();
    // semaine 1 : 38 + 4 > 40 ; semaine 2 : vierge
    assert!(!report.results[0].is_assigned());
    assert!(report.results[1].is_assigned());
}

#[test]
fn urgency_orders_the_batch() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.caregivers.push(caregiver("solo"));
    let low = open_shift("c1", d(2024, 6, 10), 9, 13, Urgency::Low);
    let critical = open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::Critical);
    let overlapping_high = open_shift("c1", d(2024, 6, 12), 10, 11, Urgency::High);
    let critical_id = critical.id.clone();
    let high_id = overlapping_high.id.clone();
    ds.open_shifts.extend([low, overlapping_high, critical]);

    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert_eq!(report.results[0].shift_id(), &critical_id);
    assert!(report.results[0].is_assigned());
    assert_eq!(report.results[1].shift_id(), &high_id);
    assert!(!report.results[1].is_assigned());
    assert!(report.results[2].is_assigned());
}

#[test]
fn unfilled_reports_top_three_disqualified() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.care_types.push(care_type("skilled", &["RN"]));
    let mut c1 = client("c1");
    c1.care_type_id = Some(CareTypeId::new("skilled"));
    ds.clients.push(c1);
    for id in ["e", "d", "c", "b", "a"] {
        ds.caregivers.push(caregiver(id));
    }
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::High));

    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert_eq!(report.failed, 1);
    let ShiftOutcome::Unfilled {
        reason,
        top_disqualified,
        ..
    } = &report.results[0]
    else {
        panic!("expected an unfilled shift");
    };
    assert_eq!(*reason, UnfilledReason::AllDisqualified);
    let ids: Vec<&str> = top_disqualified.iter().map(|r| r.caregiver_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(top_disqualified
        .iter()
        .all(|r| r.reason == DisqualifyReason::MissingCerts && (r.score - 60.0).abs() < 1e-9));
}

#[test]
fn unavailable_caregivers_are_not_candidates() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    let mut off = caregiver("off");
    off.availability = AvailabilityStatus::Unavailable;
    ds.caregivers.push(off);
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::Normal));

    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert!(matches!(
        report.results[0],
        ShiftOutcome::Unfilled {
            reason: UnfilledReason::NoCaregivers,
            ..
        }
    ));
}

#[test]
fn expired_certification_disqualifies() {
    let (start, end) = week();
    let mut ds = busy_week();
    ds.schedules.clear();
    for c in &mut ds.caregivers {
        c.certifications = vec![caresched::Certification::expiring("CNA", d(2024, 5, 31))];
    }
    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert_eq!(report.filled, 0);

    let report = engine.auto_fill(start, end, true, noon(d(2024, 5, 31))).unwrap();
    assert_eq!(report.filled, 1);
}

#[test]
fn inverted_range_is_rejected() {
    let mut engine = Engine::new(busy_week());
    let err = engine
        .auto_fill(d(2024, 6, 15), d(2024, 6, 9), true, noon(d(2024, 6, 1)))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

/// Store dont une des deux écritures échoue toujours.
struct FailingStore {
    inner: Dataset,
    fail_insert: bool,
    fail_mark: bool,
}

impl FailingStore {
    fn on_insert(inner: Dataset) -> Self {
        Self {
            inner,
            fail_insert: true,
            fail_mark: false,
        }
    }

    fn on_mark_filled(inner: Dataset) -> Self {
        Self {
            inner,
            fail_insert: false,
            fail_mark: true,
        }
    }
}

impl ScheduleStore for FailingStore {
    fn caregivers(&self) -> anyhow::Result<Vec<Caregiver>> {
        self.inner.caregivers()
    }
    fn caregiver(&self, id: &CaregiverId) -> anyhow::Result<Option<Caregiver>> {
        self.inner.caregiver(id)
    }
    fn clients(&self) -> anyhow::Result<Vec<Client>> {
        self.inner.clients()
    }
    fn client(&self, id: &ClientId) -> anyhow::Result<Option<Client>> {
        self.inner.client(id)
    }
    fn required_certifications(&self, client: &Client) -> anyhow::Result<BTreeSet<String>> {
        self.inner.required_certifications(client)
    }
    fn schedule_entries(&self) -> anyhow::Result<Vec<ScheduleEntry>> {
        self.inner.schedule_entries()
    }
    fn completed_visit_count(
        &self,
        caregiver: &CaregiverId,
        client: &ClientId,
    ) -> anyhow::Result<u32> {
        self.inner.completed_visit_count(caregiver, client)
    }
    fn open_shifts(&self, start: NaiveDate, end: NaiveDate) -> anyhow::Result<Vec<OpenShift>> {
        self.inner.open_shifts(start, end)
    }
    fn insert_schedule(&mut self, entry: ScheduleEntry) -> anyhow::Result<ScheduleId> {
        if self.fail_insert {
            bail!("disk full");
        }
        self.inner.insert_schedule(entry)
    }
    fn mark_shift_filled(
        &mut self,
        shift: &ShiftId,
        filled_by: &CaregiverId,
        filled_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if self.fail_mark {
            bail!("queue down");
        }
        self.inner.mark_shift_filled(shift, filled_by, filled_at)
    }
}

#[test]
fn insert_failures_are_reported_per_shift() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.caregivers.push(caregiver("solo"));
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::Normal));
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 13), 9, 13, Urgency::Normal));

    let mut engine = Engine::new(FailingStore::on_insert(ds));
    let report = engine.auto_fill(start, end, false, noon(d(2024, 6, 1))).unwrap();
    assert_eq!((report.total, report.filled, report.failed), (2, 0, 2));
    for outcome in &report.results {
        match outcome {
            ShiftOutcome::Error {
                caregiver_id,
                schedule_id,
                error,
                ..
            } => {
                assert_eq!(caregiver_id.as_ref().map(|c| c.as_str()), Some("solo"));
                assert!(schedule_id.is_none());
                assert!(error.contains("disk full"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    let store = &engine.store().inner;
    assert!(store.schedules.is_empty());
    assert!(store.open_shifts.iter().all(|s| s.status == ShiftStatus::Open));
}

#[test]
fn written_entry_still_blocks_the_batch_when_fill_transition_fails() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.caregivers.push(caregiver("solo"));
    let first = open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::High);
    let first_id = first.id.clone();
    ds.open_shifts.push(first);
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 12), 10, 12, Urgency::Normal));

    let mut engine = Engine::new(FailingStore::on_mark_filled(ds));
    let report = engine.auto_fill(start, end, false, noon(d(2024, 6, 1))).unwrap();
    assert_eq!((report.total, report.filled, report.failed), (2, 0, 2));

    let ShiftOutcome::Error {
        shift_id,
        caregiver_id,
        schedule_id: Some(schedule_id),
        error,
    } = &report.results[0]
    else {
        panic!("expected an error carrying the written entry");
    };
    assert_eq!(shift_id, &first_id);
    assert_eq!(caregiver_id, &Some(CaregiverId::new("solo")));
    assert!(error.contains("queue down"));

    match &report.results[1] {
        ShiftOutcome::Unfilled {
            reason,
            top_disqualified,
            ..
        } => {
            assert_eq!(*reason, UnfilledReason::AllDisqualified);
            assert_eq!(top_disqualified.len(), 1);
            assert_eq!(top_disqualified[0].reason, DisqualifyReason::Conflict);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let store = &engine.store().inner;
    assert_eq!(store.schedules.len(), 1);
    assert_eq!(&store.schedules[0].id, schedule_id);
    assert!(store.open_shifts.iter().all(|s| s.status == ShiftStatus::Open));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    caresched::io::export_autofill_csv(&path, &report).unwrap();
    let csv = std::fs::read_to_string(&path).unwrap();
    assert!(csv.contains(&format!(",error,solo,{schedule_id},")));
}

#[test]
fn inverted_shift_window_is_reported_and_the_batch_continues() {
    let (start, end) = week();
    let mut ds = dataset();
    ds.clients.push(client("c1"));
    ds.caregivers.push(caregiver("solo"));
    let mut broken = open_shift("c1", d(2024, 6, 12), 9, 13, Urgency::Critical);
    std::mem::swap(&mut broken.start_time, &mut broken.end_time);
    assert!(broken.window().is_err());
    ds.open_shifts.push(broken);
    ds.open_shifts.push(open_shift("c1", d(2024, 6, 13), 9, 13, Urgency::Normal));

    let mut engine = Engine::new(ds);
    let report = engine.auto_fill(start, end, true, noon(d(2024, 6, 1))).unwrap();
    assert!(matches!(
        &report.results[0],
        ShiftOutcome::Error {
            caregiver_id: None,
            schedule_id: None,
            error,
            ..
        } if error.contains("end time must be strictly after start time")
    ));
    assert!(report.results[1].is_assigned());
}
