//! Batch re-derivation of document states.
//!
//! [`reconcile`] compares each document's cached state with the state its
//! expiry date demands today and returns only the differences. It performs
//! no I/O; the caller applies the [`Changeset`] to storage.

use serde::Serialize;

use crate::document::DocumentRecord;
use crate::expiry::DocumentState;
use crate::types::{CalendarDate, DbId};

/// One document whose stored state must change.
///
/// `expiry_date` and `alert_window_days` are the inputs `new_state` was
/// derived from. Storage applies the transition only while the row still
/// holds them, so an edit landing between load and apply is never
/// overwritten with a state computed from the old dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub id: DbId,
    /// Stored state before reconciliation (`None` if never classified).
    pub old_state: Option<DocumentState>,
    pub new_state: DocumentState,
    pub expiry_date: CalendarDate,
    /// Effective window at load time.
    pub alert_window_days: i32,
}

impl StateTransition {
    /// Whether `doc` still holds the snapshot this transition was derived from.
    pub fn matches(&self, doc: &DocumentRecord) -> bool {
        doc.id == self.id
            && doc.state == self.old_state
            && doc.expiry_date == self.expiry_date
            && doc.alert_window_days == self.alert_window_days
    }
}

/// The set of state transitions produced by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changeset {
    pub to_update: Vec<StateTransition>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.to_update.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_update.len()
    }

    /// Apply the transitions to an in-memory snapshot.
    ///
    /// Records not named in the changeset are left untouched.
    pub fn apply_to(&self, documents: &mut [DocumentRecord]) {
        for transition in &self.to_update {
            if let Some(doc) = documents.iter_mut().find(|d| d.id == transition.id) {
                doc.state = Some(transition.new_state);
            }
        }
    }
}

/// Outcome of reconciling the stored documents against today.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Documents classified.
    pub examined: usize,
    /// Documents whose state diverged.
    pub changed: usize,
    /// Rows actually updated in storage.
    pub applied: u64,
    pub transitions: Vec<StateTransition>,
}

/// Classify every document and collect those whose stored state diverges.
pub fn reconcile(documents: &[DocumentRecord], today: CalendarDate) -> Changeset {
    let to_update = documents
        .iter()
        .filter_map(|doc| {
            let computed = doc.computed_state(today);
            (doc.state != Some(computed)).then_some(StateTransition {
                id: doc.id,
                old_state: doc.state,
                new_state: computed,
                expiry_date: doc.expiry_date,
                alert_window_days: doc.alert_window_days,
            })
        })
        .collect();
    Changeset { to_update }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, NaiveDate, Utc};

    use super::*;
    use crate::document::SubjectRef;

    fn today() -> CalendarDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn doc(id: DbId, expiry_in_days: i64, state: Option<DocumentState>) -> DocumentRecord {
        let now = Utc::now();
        DocumentRecord {
            id,
            subject: SubjectRef::vehicle(1),
            document_type_id: 1,
            document_number: format!("DOC-{id}"),
            issue_date: None,
            expiry_date: today() + Duration::days(expiry_in_days),
            alert_window_days: 30,
            alert_window_override: None,
            state,
            attachment: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_diverging_documents_included() {
        let docs = vec![
            doc(1, 100, Some(DocumentState::Vigente)),
            doc(2, 10, Some(DocumentState::Vigente)),
            doc(3, -1, Some(DocumentState::Vencido)),
        ];
        let changeset = reconcile(&docs, today());
        assert_eq!(
            changeset.to_update,
            vec![StateTransition {
                id: 2,
                old_state: Some(DocumentState::Vigente),
                new_state: DocumentState::PorVencer,
                expiry_date: today() + Duration::days(10),
                alert_window_days: 30,
            }]
        );
    }

    #[test]
    fn unset_state_is_always_classified() {
        let docs = vec![doc(1, 100, None), doc(2, 0, None)];
        let changeset = reconcile(&docs, today());
        assert_eq!(changeset.len(), 2);
        assert_eq!(changeset.to_update[0].new_state, DocumentState::Vigente);
        assert_eq!(changeset.to_update[1].new_state, DocumentState::Vencido);
        assert_eq!(changeset.to_update[1].old_state, None);
    }

    #[test]
    fn second_pass_after_apply_is_empty() {
        let mut docs = vec![
            doc(1, 100, None),
            doc(2, 5, Some(DocumentState::Vigente)),
            doc(3, -3, Some(DocumentState::PorVencer)),
            doc(4, 40, Some(DocumentState::Vencido)),
        ];
        let first = reconcile(&docs, today());
        assert_eq!(first.len(), 4);
        first.apply_to(&mut docs);
        assert!(reconcile(&docs, today()).is_empty());
    }

    #[test]
    fn changeset_ids_come_from_input() {
        let docs: Vec<_> = (10..30)
            .map(|id| doc(id, id - 20, Some(DocumentState::Vigente)))
            .collect();
        let input_ids: HashSet<_> = docs.iter().map(|d| d.id).collect();
        let changeset = reconcile(&docs, today());
        assert!(changeset.to_update.iter().all(|t| input_ids.contains(&t.id)));
    }

    #[test]
    fn jump_past_expiry_skips_por_vencer() {
        // 40 days of validity, 30-day window: the window opens on day 10 and
        // reconciliation next runs 35 days after that.
        let docs = vec![doc(1, 40, Some(DocumentState::Vigente))];
        let later = today() + Duration::days(45);
        let changeset = reconcile(&docs, later);
        assert_eq!(
            changeset.to_update,
            vec![StateTransition {
                id: 1,
                old_state: Some(DocumentState::Vigente),
                new_state: DocumentState::Vencido,
                expiry_date: today() + Duration::days(40),
                alert_window_days: 30,
            }]
        );
    }

    #[test]
    fn transition_no_longer_matches_edited_record() {
        let docs = vec![doc(1, 10, Some(DocumentState::Vigente))];
        let transition = reconcile(&docs, today()).to_update[0];
        assert!(transition.matches(&docs[0]));

        let mut moved = docs[0].clone();
        moved.expiry_date = today() + Duration::days(400);
        assert!(!transition.matches(&moved));

        let mut rewindowed = docs[0].clone();
        rewindowed.alert_window_days = 5;
        assert!(!transition.matches(&rewindowed));
    }

    #[test]
    fn empty_input_gives_empty_changeset() {
        assert!(reconcile(&[], today()).is_empty());
    }

    #[test]
    fn apply_ignores_unknown_ids() {
        let mut docs = vec![doc(1, 100, Some(DocumentState::Vigente))];
        let changeset = Changeset {
            to_update: vec![StateTransition {
                id: 99,
                old_state: None,
                new_state: DocumentState::Vencido,
                expiry_date: today(),
                alert_window_days: 30,
            }],
        };
        changeset.apply_to(&mut docs);
        assert_eq!(docs[0].state, Some(DocumentState::Vigente));
    }
}
