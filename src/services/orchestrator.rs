use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{
    CorrectionAction, CorrectionProposal, CorrectionRecord, CorrectionResult,
    CurrentBookingChild, ProposalState, RecordStatus,
};
use crate::services::scheduling::{CreateAppointmentRequest, SchedulingSystem};
use crate::timefmt;

/// Proposals left neither confirmed nor discarded are dropped after this
/// long.
const PROPOSAL_TTL_MIN: i64 = 30;

/// Executes corrective writes against the scheduling system.
///
/// Guarantees:
/// - at most one action in flight per child (patient GUID, falling back to
///   child name);
/// - no write goes out without an explicit propose → confirm step;
/// - every dispatched attempt, success or failure, appends exactly one
///   audit record;
/// - after any success the patient's cached schedule state is dropped and
///   refetched before further classification.
///
/// No method returns `Err`: remote failures are folded into
/// `CorrectionResult { success: false }`.
pub struct CorrectionOrchestrator {
    scheduling: Arc<dyn SchedulingSystem>,
    db: Arc<Mutex<Connection>>,
    in_flight: Mutex<HashSet<String>>,
    proposals: Mutex<HashMap<String, CorrectionProposal>>,
    cache: Mutex<HashMap<String, CurrentBookingChild>>,
}

/// Removes its key from the in-flight set on drop, so a panic or early
/// return never wedges a child.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, key: &str) -> Option<Self> {
        let mut held = set.lock().unwrap();
        if !held.insert(key.to_string()) {
            return None;
        }
        Some(Self {
            set,
            key: key.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.key);
    }
}

impl CorrectionOrchestrator {
    pub fn new(scheduling: Arc<dyn SchedulingSystem>, db: Arc<Mutex<Connection>>) -> Self {
        Self {
            scheduling,
            db,
            in_flight: Mutex::new(HashSet::new()),
            proposals: Mutex::new(HashMap::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// First half of the two-step gate. Nothing is sent anywhere; the
    /// returned proposal must be confirmed explicitly.
    pub fn propose(&self, session_id: &str, action: CorrectionAction) -> CorrectionProposal {
        let now = Utc::now().naive_utc();
        let proposal = CorrectionProposal {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            action,
            state: ProposalState::Proposed,
            created_at: now,
        };
        let mut proposals = self.proposals.lock().unwrap();
        // Abandoned proposals (never confirmed or discarded) are swept on
        // insert so the map cannot grow without bound.
        proposals.retain(|_, p| now - p.created_at < Duration::minutes(PROPOSAL_TTL_MIN));
        proposals.insert(proposal.id.clone(), proposal.clone());
        proposal
    }

    /// Drops a proposal that the reviewer backed out of. Returns false if
    /// it was unknown (or already confirmed).
    pub fn discard(&self, proposal_id: &str) -> bool {
        self.proposals.lock().unwrap().remove(proposal_id).is_some()
    }

    /// Second half of the gate: consumes the proposal and dispatches it.
    /// A proposal confirms at most once.
    pub async fn confirm(&self, proposal_id: &str) -> CorrectionResult {
        let proposal = self.proposals.lock().unwrap().remove(proposal_id);
        let mut proposal = match proposal {
            Some(p) => p,
            None => {
                return CorrectionResult::failure(
                    "unknown or already-executed correction proposal",
                )
            }
        };
        proposal.state = ProposalState::Confirmed;

        self.execute(&proposal.session_id, proposal.action).await
    }

    /// Current schedule state for the given patients, cache-or-fetch.
    /// Patients whose fetch fails are omitted (and logged); the remote
    /// system stays the source of truth either way.
    pub async fn current_children(&self, patient_guids: &[String]) -> Vec<CurrentBookingChild> {
        let mut found: HashMap<String, CurrentBookingChild> = HashMap::new();
        let mut misses: Vec<String> = Vec::new();
        {
            let cache = self.cache.lock().unwrap();
            for guid in patient_guids {
                if found.contains_key(guid) {
                    continue;
                }
                match cache.get(guid) {
                    Some(child) => {
                        found.insert(guid.clone(), child.clone());
                    }
                    None => {
                        if !misses.contains(guid) {
                            misses.push(guid.clone());
                        }
                    }
                }
            }
        }

        for guid in misses {
            match self.scheduling.get_appointments_by_patient(&guid).await {
                Ok(child) => {
                    self.cache
                        .lock()
                        .unwrap()
                        .insert(guid.clone(), child.clone());
                    found.insert(guid, child);
                }
                Err(e) => {
                    tracing::warn!(patient_guid = %guid, error = %e, "failed to fetch schedule state");
                }
            }
        }

        // Preserve caller order, one entry per distinct GUID.
        let mut seen = HashSet::new();
        patient_guids
            .iter()
            .filter(|g| seen.insert((*g).clone()))
            .filter_map(|g| found.get(g).cloned())
            .collect()
    }

    async fn execute(&self, session_id: &str, action: CorrectionAction) -> CorrectionResult {
        let key = action.child_key();
        let _guard = match InFlightGuard::acquire(&self.in_flight, &key) {
            Some(guard) => guard,
            None => {
                // Never reached the remote system, so no audit record.
                return CorrectionResult::failure(
                    "another correction is already in progress for this child",
                );
            }
        };

        tracing::info!(session = session_id, action = action.kind(), child = %key, "executing correction");

        // `remote_write_landed` is true as soon as any remote mutation went
        // through, even when the composite operation ends up a failure
        // (reschedule whose cancel landed but rebook did not).
        let (result, slot_after, remote_write_landed) = match &action {
            CorrectionAction::Book {
                patient_guid,
                start_time,
                schedule_view_guid,
                schedule_column_guid,
                appointment_type_guid,
                ..
            } => {
                let (result, slot_after) = self
                    .do_book(
                        patient_guid,
                        start_time,
                        schedule_view_guid,
                        schedule_column_guid,
                        appointment_type_guid,
                    )
                    .await;
                let landed = result.success;
                (result, slot_after, landed)
            }
            CorrectionAction::Cancel {
                appointment_guid, ..
            } => {
                let result = self.do_cancel(appointment_guid).await;
                let landed = result.success;
                (result, None, landed)
            }
            CorrectionAction::Reschedule {
                old_appointment_guid,
                patient_guid,
                new_start_time,
                schedule_view_guid,
                schedule_column_guid,
                appointment_type_guid,
                ..
            } => {
                self.do_reschedule(
                    old_appointment_guid,
                    patient_guid,
                    new_start_time,
                    schedule_view_guid,
                    schedule_column_guid,
                    appointment_type_guid,
                )
                .await
            }
        };

        self.append_record(session_id, &action, &result, slot_after);

        // Anything that changed remote state invalidates the local copy,
        // not just fully-successful operations.
        if remote_write_landed {
            if let Some(guid) = patient_guid_of(&action) {
                self.refresh_child(guid).await;
            }
        }

        result
    }

    async fn do_book(
        &self,
        patient_guid: &str,
        start_time: &str,
        schedule_view_guid: &str,
        schedule_column_guid: &str,
        appointment_type_guid: &str,
    ) -> (CorrectionResult, Option<String>) {
        let start = canonical_slot(start_time);
        let req = CreateAppointmentRequest {
            patient_guid: patient_guid.to_string(),
            start_time: start.clone(),
            schedule_view_guid: schedule_view_guid.to_string(),
            schedule_column_guid: schedule_column_guid.to_string(),
            appointment_type_guid: appointment_type_guid.to_string(),
        };

        match self.scheduling.create_appointment(&req).await {
            Ok(appointment_guid) => (
                CorrectionResult {
                    success: true,
                    message: format!("booked {start}"),
                    appointment_guid: Some(appointment_guid),
                },
                Some(start),
            ),
            Err(e) => (
                CorrectionResult::failure(format!("booking failed: {e}")),
                Some(start),
            ),
        }
    }

    async fn do_cancel(&self, appointment_guid: &str) -> CorrectionResult {
        match self.scheduling.cancel_appointment(appointment_guid).await {
            Ok(()) => CorrectionResult {
                success: true,
                message: "appointment cancelled".to_string(),
                appointment_guid: None,
            },
            Err(e) => CorrectionResult::failure(format!("cancellation failed: {e}")),
        }
    }

    /// Cancel-then-book against the remote system. If the book half fails
    /// after the cancel succeeded, that is a failure which reflects the
    /// already-cancelled state; no compensating retry is attempted here.
    /// The third element reports whether any remote write landed: true from
    /// the moment the cancel goes through, so the caller invalidates the
    /// cached schedule state even on the partial-failure path.
    async fn do_reschedule(
        &self,
        old_appointment_guid: &str,
        patient_guid: &str,
        new_start_time: &str,
        schedule_view_guid: &str,
        schedule_column_guid: &str,
        appointment_type_guid: &str,
    ) -> (CorrectionResult, Option<String>, bool) {
        let start = canonical_slot(new_start_time);

        if let Err(e) = self.scheduling.cancel_appointment(old_appointment_guid).await {
            return (
                CorrectionResult::failure(format!(
                    "reschedule aborted: could not cancel the existing appointment: {e}"
                )),
                None,
                false,
            );
        }

        let req = CreateAppointmentRequest {
            patient_guid: patient_guid.to_string(),
            start_time: start.clone(),
            schedule_view_guid: schedule_view_guid.to_string(),
            schedule_column_guid: schedule_column_guid.to_string(),
            appointment_type_guid: appointment_type_guid.to_string(),
        };

        match self.scheduling.create_appointment(&req).await {
            Ok(appointment_guid) => (
                CorrectionResult {
                    success: true,
                    message: format!("rescheduled to {start}"),
                    appointment_guid: Some(appointment_guid),
                },
                Some(start),
                true,
            ),
            Err(e) => (
                CorrectionResult::failure(format!(
                    "original appointment {old_appointment_guid} was cancelled, but rebooking failed: {e}"
                )),
                Some(start),
                true,
            ),
        }
    }

    fn append_record(
        &self,
        session_id: &str,
        action: &CorrectionAction,
        result: &CorrectionResult,
        slot_after: Option<String>,
    ) {
        let record = CorrectionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            action: action.kind().to_string(),
            child_name: action.child_name().map(|s| s.to_string()),
            slot_after: if result.success { slot_after } else { None },
            appointment_guid_after: result.appointment_guid.clone(),
            status: if result.success {
                RecordStatus::Success
            } else {
                RecordStatus::Failure
            },
            message: Some(result.message.clone()),
            performed_at: Utc::now().naive_utc(),
        };

        let db = self.db.lock().unwrap();
        if let Err(e) = queries::append_correction_record(&db, &record) {
            tracing::error!(error = %e, session = session_id, "failed to append correction record");
        }
    }

    /// Drop-and-refetch, never patch: the remote system owns this state.
    async fn refresh_child(&self, patient_guid: &str) {
        self.cache.lock().unwrap().remove(patient_guid);

        match self.scheduling.get_appointments_by_patient(patient_guid).await {
            Ok(child) => {
                self.cache
                    .lock()
                    .unwrap()
                    .insert(patient_guid.to_string(), child);
            }
            Err(e) => {
                // Entry stays absent; the next read refetches.
                tracing::warn!(patient_guid, error = %e, "post-correction refetch failed");
            }
        }
    }
}

fn patient_guid_of(action: &CorrectionAction) -> Option<&str> {
    match action {
        CorrectionAction::Book { patient_guid, .. } => Some(patient_guid),
        CorrectionAction::Cancel { patient_guid, .. } => patient_guid.as_deref(),
        CorrectionAction::Reschedule { patient_guid, .. } => Some(patient_guid),
    }
}

/// Requests always go out in "MM/DD/YYYY h:mm AM/PM". Strings that do not
/// parse are passed through untouched for the remote system to judge.
fn canonical_slot(s: &str) -> String {
    timefmt::parse_slot(s)
        .map(timefmt::format_slot)
        .unwrap_or_else(|| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::ScheduledAppointment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Programmable fake scheduling system with call counters.
    struct FakeScheduling {
        create_calls: AtomicUsize,
        cancel_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        fail_create: AtomicBool,
        fail_cancel: AtomicBool,
        slow_create: AtomicBool,
    }

    impl FakeScheduling {
        fn new() -> Self {
            Self {
                create_calls: AtomicUsize::new(0),
                cancel_calls: AtomicUsize::new(0),
                fetch_calls: AtomicUsize::new(0),
                fail_create: AtomicBool::new(false),
                fail_cancel: AtomicBool::new(false),
                slow_create: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SchedulingSystem for FakeScheduling {
        async fn get_appointments_by_patient(
            &self,
            patient_guid: &str,
        ) -> anyhow::Result<CurrentBookingChild> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CurrentBookingChild {
                patient_guid: patient_guid.to_string(),
                name: "Alice".to_string(),
                dob: None,
                appointments: vec![ScheduledAppointment {
                    appointment_guid: "a1".to_string(),
                    date_time: "01/15/2025 10:00 AM".to_string(),
                    status: "Scheduled".to_string(),
                    appt_type: None,
                }],
            })
        }

        async fn get_available_slots(
            &self,
            _date: &str,
            _patient_guid: &str,
            _schedule_view_guid: Option<&str>,
        ) -> anyhow::Result<Vec<crate::models::SlotAlternative>> {
            Ok(vec![])
        }

        async fn create_appointment(
            &self,
            _req: &CreateAppointmentRequest,
        ) -> anyhow::Result<String> {
            if self.slow_create.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_create.load(Ordering::SeqCst) {
                anyhow::bail!("slot already taken");
            }
            Ok("new-appt".to_string())
        }

        async fn cancel_appointment(&self, _appointment_guid: &str) -> anyhow::Result<()> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_cancel.load(Ordering::SeqCst) {
                anyhow::bail!("remote refused cancellation");
            }
            Ok(())
        }
    }

    fn orchestrator(fake: Arc<FakeScheduling>) -> CorrectionOrchestrator {
        let conn = db::init_db(":memory:").unwrap();
        CorrectionOrchestrator::new(fake, Arc::new(Mutex::new(conn)))
    }

    fn book_action(patient: &str) -> CorrectionAction {
        CorrectionAction::Book {
            patient_guid: patient.to_string(),
            child_name: Some("Alice".to_string()),
            start_time: "01/15/2025 10:00 AM".to_string(),
            schedule_view_guid: "view-1".to_string(),
            schedule_column_guid: "col-1".to_string(),
            appointment_type_guid: "type-1".to_string(),
        }
    }

    fn history(orch: &CorrectionOrchestrator, session: &str) -> Vec<CorrectionRecord> {
        let db = orch.db.lock().unwrap();
        queries::get_correction_history(&db, session).unwrap()
    }

    #[tokio::test]
    async fn test_confirm_required_before_any_network_call() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose("s1", book_action("p1"));
        assert_eq!(proposal.state, ProposalState::Proposed);
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 0);

        let result = orch.confirm(&proposal.id).await;
        assert!(result.success);
        assert_eq!(result.appointment_guid.as_deref(), Some("new-appt"));
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_proposal_confirms_at_most_once() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose("s1", book_action("p1"));
        assert!(orch.confirm(&proposal.id).await.success);

        let second = orch.confirm(&proposal.id).await;
        assert!(!second.success);
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_discarded_proposal_cannot_execute() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose("s1", book_action("p1"));
        assert!(orch.discard(&proposal.id));
        assert!(!orch.discard(&proposal.id));

        let result = orch.confirm(&proposal.id).await;
        assert!(!result.success);
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_book_appends_success_record_and_refetches() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose("s1", book_action("p1"));
        let result = orch.confirm(&proposal.id).await;
        assert!(result.success);

        let records = history(&orch, "s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Success);
        assert_eq!(records[0].action, "book");
        assert_eq!(records[0].slot_after.as_deref(), Some("01/15/2025 10:00 AM"));
        assert_eq!(records[0].appointment_guid_after.as_deref(), Some("new-appt"));

        // Post-success refetch happened.
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_book_appends_exactly_one_failure_record() {
        let fake = Arc::new(FakeScheduling::new());
        fake.fail_create.store(true, Ordering::SeqCst);
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose("s1", book_action("p1"));
        let result = orch.confirm(&proposal.id).await;
        assert!(!result.success);
        assert!(result.message.contains("slot already taken"));

        let records = history(&orch, "s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Failure);
        assert!(records[0].slot_after.is_none());

        // No refetch after a failure.
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_books_for_same_child_do_not_both_dispatch() {
        let fake = Arc::new(FakeScheduling::new());
        fake.slow_create.store(true, Ordering::SeqCst);
        let orch = Arc::new(orchestrator(Arc::clone(&fake)));

        let p1 = orch.propose("s1", book_action("p1"));
        let p2 = orch.propose("s1", book_action("p1"));

        let (r1, r2) = tokio::join!(orch.confirm(&p1.id), orch.confirm(&p2.id));

        assert_ne!(r1.success, r2.success);
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 1);

        // Only the dispatched attempt is audited.
        assert_eq!(history(&orch, "s1").len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_books_for_different_children_both_dispatch() {
        let fake = Arc::new(FakeScheduling::new());
        fake.slow_create.store(true, Ordering::SeqCst);
        let orch = Arc::new(orchestrator(Arc::clone(&fake)));

        let p1 = orch.propose("s1", book_action("p1"));
        let p2 = orch.propose("s1", book_action("p2"));

        let (r1, r2) = tokio::join!(orch.confirm(&p1.id), orch.confirm(&p2.id));
        assert!(r1.success && r2.success);
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 2);
        assert_eq!(history(&orch, "s1").len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_appends_record() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose(
            "s1",
            CorrectionAction::Cancel {
                appointment_guid: "a1".to_string(),
                patient_guid: Some("p1".to_string()),
                child_name: Some("Alice".to_string()),
            },
        );
        let result = orch.confirm(&proposal.id).await;
        assert!(result.success);
        assert_eq!(fake.cancel_calls.load(Ordering::SeqCst), 1);

        let records = history(&orch, "s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "cancel");
    }

    #[tokio::test]
    async fn test_reschedule_cancel_failure_leaves_appointment_untouched() {
        let fake = Arc::new(FakeScheduling::new());
        fake.fail_cancel.store(true, Ordering::SeqCst);
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose(
            "s1",
            CorrectionAction::Reschedule {
                old_appointment_guid: "a1".to_string(),
                patient_guid: "p1".to_string(),
                child_name: Some("Alice".to_string()),
                new_start_time: "01/16/2025 2:00 PM".to_string(),
                schedule_view_guid: "view-1".to_string(),
                schedule_column_guid: "col-1".to_string(),
                appointment_type_guid: "type-1".to_string(),
            },
        );
        let result = orch.confirm(&proposal.id).await;
        assert!(!result.success);
        assert!(result.message.contains("could not cancel"));
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 0);

        let records = history(&orch, "s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Failure);
    }

    #[tokio::test]
    async fn test_reschedule_partial_failure_reports_cancelled_state() {
        let fake = Arc::new(FakeScheduling::new());
        fake.fail_create.store(true, Ordering::SeqCst);
        let orch = orchestrator(Arc::clone(&fake));

        let proposal = orch.propose(
            "s1",
            CorrectionAction::Reschedule {
                old_appointment_guid: "a1".to_string(),
                patient_guid: "p1".to_string(),
                child_name: Some("Alice".to_string()),
                new_start_time: "01/16/2025 2:00 PM".to_string(),
                schedule_view_guid: "view-1".to_string(),
                schedule_column_guid: "col-1".to_string(),
                appointment_type_guid: "type-1".to_string(),
            },
        );
        let result = orch.confirm(&proposal.id).await;

        // Cancel went through, rebook did not: this is a failure that
        // names the lost appointment, never a success.
        assert!(!result.success);
        assert!(result.message.contains("a1"));
        assert!(result.message.contains("was cancelled"));
        assert_eq!(fake.cancel_calls.load(Ordering::SeqCst), 1);

        let records = history(&orch, "s1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Failure);
        assert_eq!(records[0].action, "reschedule");
    }

    #[tokio::test]
    async fn test_reschedule_partial_failure_still_refreshes_schedule_state() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        // Warm the cache with the pre-correction state.
        let guids = vec!["p1".to_string()];
        let _ = orch.current_children(&guids).await;
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);

        fake.fail_create.store(true, Ordering::SeqCst);
        let proposal = orch.propose(
            "s1",
            CorrectionAction::Reschedule {
                old_appointment_guid: "a1".to_string(),
                patient_guid: "p1".to_string(),
                child_name: Some("Alice".to_string()),
                new_start_time: "01/16/2025 2:00 PM".to_string(),
                schedule_view_guid: "view-1".to_string(),
                schedule_column_guid: "col-1".to_string(),
                appointment_type_guid: "type-1".to_string(),
            },
        );
        let result = orch.confirm(&proposal.id).await;
        assert!(!result.success);
        assert_eq!(fake.cancel_calls.load(Ordering::SeqCst), 1);

        // The cancel landed remotely even though the composite operation
        // failed, so the cached schedule state must have been refetched;
        // serving the old appointment as still scheduled would be a stale
        // read after a write.
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 2);
        let _ = orch.current_children(&guids).await;
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reschedule_cancel_failure_does_not_refetch() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let guids = vec!["p1".to_string()];
        let _ = orch.current_children(&guids).await;
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);

        // Nothing landed remotely: the cached state is still accurate.
        fake.fail_cancel.store(true, Ordering::SeqCst);
        let proposal = orch.propose(
            "s1",
            CorrectionAction::Reschedule {
                old_appointment_guid: "a1".to_string(),
                patient_guid: "p1".to_string(),
                child_name: Some("Alice".to_string()),
                new_start_time: "01/16/2025 2:00 PM".to_string(),
                schedule_view_guid: "view-1".to_string(),
                schedule_column_guid: "col-1".to_string(),
                appointment_type_guid: "type-1".to_string(),
            },
        );
        assert!(!orch.confirm(&proposal.id).await.success);
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_proposals_expire() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let stale = orch.propose("s1", book_action("p1"));
        {
            let mut proposals = orch.proposals.lock().unwrap();
            proposals.get_mut(&stale.id).unwrap().created_at =
                Utc::now().naive_utc() - chrono::Duration::minutes(PROPOSAL_TTL_MIN + 1);
        }

        // The next propose sweeps anything past the horizon.
        let fresh = orch.propose("s1", book_action("p2"));
        assert!(!orch.proposals.lock().unwrap().contains_key(&stale.id));

        let result = orch.confirm(&stale.id).await;
        assert!(!result.success);
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 0);

        // The fresh one still confirms normally.
        assert!(orch.confirm(&fresh.id).await.success);
    }

    #[tokio::test]
    async fn test_current_children_caches_until_invalidated() {
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let guids = vec!["p1".to_string()];
        let first = orch.current_children(&guids).await;
        assert_eq!(first.len(), 1);
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);

        // Cached: no second remote call.
        let _ = orch.current_children(&guids).await;
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 1);

        // A successful correction invalidates and refetches.
        let proposal = orch.propose("s1", book_action("p1"));
        assert!(orch.confirm(&proposal.id).await.success);
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 2);

        let _ = orch.current_children(&guids).await;
        assert_eq!(fake.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slot_string_is_canonicalized_for_requests() {
        // Zero-padded hour in, canonical non-padded hour recorded.
        let fake = Arc::new(FakeScheduling::new());
        let orch = orchestrator(Arc::clone(&fake));

        let mut action = book_action("p1");
        if let CorrectionAction::Book { start_time, .. } = &mut action {
            *start_time = "01/15/2025 09:00 AM".to_string();
        }
        let proposal = orch.propose("s1", action);
        assert!(orch.confirm(&proposal.id).await.success);

        let records = history(&orch, "s1");
        assert_eq!(records[0].slot_after.as_deref(), Some("01/15/2025 9:00 AM"));
    }
}
