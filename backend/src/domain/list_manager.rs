//! # Entity List Manager
//!
//! One list screen's worth of state for a single entity kind: the fetched
//! list, an optional search query, a create/edit modal and a delete
//! confirmation.
//!
//! ## Key Responsibilities
//! - **Fetching**: loads every document of the kind owned by the signed-in
//!   user (or matching an explicit scope) and keeps it in display order
//! - **Editing**: validates the modal's form and writes it through the
//!   document store, then refetches
//! - **Deleting**: only after an explicit confirmation
//! - **Feedback**: queues success and error alerts for the UI
//!
//! ## State
//! ```text
//! Loading --fetch completes (ok or not)--> Ready
//!
//! modal:  Closed --open_create--> Creating --submit ok / cancel--> Closed
//!         Closed --open_edit----> Editing  --submit ok / cancel--> Closed
//! ```
//! Store failures never leave the manager in `Loading`; a failed fetch shows
//! an empty list.

use log::{debug, error, info, warn};
use shared::{Alert, Identity};
use std::collections::VecDeque;
use std::sync::Arc;

use super::entity::EntityKind;
use super::errors::ManagerError;
use crate::storage::document::{Document, EqualityFilter, FieldValue};
use crate::storage::mappers::OWNER_FIELD;
use crate::storage::traits::DocumentStore;

/// Whether the first fetch has completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

/// The create/edit modal
#[derive(Debug, Clone, PartialEq)]
pub enum Modal<F> {
    Closed,
    Creating { form: F },
    Editing { id: String, form: F },
}

/// Answer to a delete confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { id: String },
    Updated { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { id: String },
    Cancelled,
}

/// List, modal and delete state for one entity kind
pub struct EntityListManager<K: EntityKind> {
    store: Arc<dyn DocumentStore>,
    owner_id: Option<String>,
    /// Replaces the owner filter when set
    scope: Option<EqualityFilter>,
    phase: Phase,
    items: Vec<K>,
    modal: Modal<K::Form>,
    pending_delete: Option<String>,
    search_query: String,
    alerts: VecDeque<Alert>,
}

impl<K: EntityKind> EntityListManager<K> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            owner_id: None,
            scope: None,
            phase: Phase::Loading,
            items: Vec::new(),
            modal: Modal::Closed,
            pending_delete: None,
            search_query: String::new(),
            alerts: VecDeque::new(),
        }
    }

    /// Set the signed-in user and fetch their list
    pub async fn attach(&mut self, identity: &Identity) -> Result<(), ManagerError> {
        self.set_owner(identity);
        self.refresh().await
    }

    /// Set the signed-in user without fetching
    pub fn set_owner(&mut self, identity: &Identity) {
        if self.owner_id.as_deref() != Some(identity.uid.as_str()) {
            self.reset();
        }
        self.owner_id = Some(identity.uid.clone());
    }

    /// Forget the user and everything fetched for them
    pub fn detach(&mut self) {
        self.owner_id = None;
        self.reset();
    }

    /// Fetch documents where `field == value` instead of the owner's
    /// documents. The current list is dropped until the next refresh.
    pub fn scope_to(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.scope = Some(EqualityFilter::new(field, value));
        self.reset();
    }

    pub fn clear_scope(&mut self) {
        self.scope = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = Phase::Loading;
        self.items.clear();
        self.modal = Modal::Closed;
        self.pending_delete = None;
    }

    fn filter(&self) -> Result<EqualityFilter, ManagerError> {
        let owner = self.owner_id.as_deref().ok_or(ManagerError::NotSignedIn)?;
        Ok(self
            .scope
            .clone()
            .unwrap_or_else(|| EqualityFilter::new(OWNER_FIELD, owner)))
    }

    fn decode(documents: Vec<Document>) -> Vec<K> {
        documents
            .iter()
            .filter_map(|doc| match K::from_document(doc) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!("Skipping malformed {} document {}: {:#}", K::COLLECTION, doc.id, e);
                    None
                }
            })
            .collect()
    }

    /// Refetch the list. A failed fetch leaves an empty, ready list.
    pub async fn refresh(&mut self) -> Result<(), ManagerError> {
        let filter = self.filter()?;
        debug!("Fetching {} where {} == {:?}", K::COLLECTION, filter.field, filter.value);

        match self.store.query(K::COLLECTION, &filter).await {
            Ok(documents) => {
                let mut items = Self::decode(documents);
                items.sort_by(K::display_order);
                self.items = items;
                self.phase = Phase::Ready;
                debug!("Loaded {} {} items", self.items.len(), K::LABEL);
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch {}: {:#}", K::COLLECTION, e);
                self.items.clear();
                self.phase = Phase::Ready;
                self.alerts
                    .push_back(Alert::error(format!("Could not load {} list: {:#}", K::LABEL.to_lowercase(), e)));
                Err(ManagerError::Store(e))
            }
        }
    }

    /// Open an empty create form
    pub fn open_create(&mut self) {
        self.open_create_with(K::Form::default());
    }

    /// Open the create form with some fields preset
    pub fn open_create_with(&mut self, form: K::Form) {
        self.modal = Modal::Creating { form };
    }

    /// Open the edit form pre-filled from a listed item
    pub fn open_edit(&mut self, id: &str) -> Result<(), ManagerError> {
        let form = self.get(id).ok_or_else(|| Self::not_found(id))?.to_form();
        self.modal = Modal::Editing {
            id: id.to_string(),
            form,
        };
        Ok(())
    }

    /// The open form, for the UI to write typed input into
    pub fn form_mut(&mut self) -> Option<&mut K::Form> {
        match &mut self.modal {
            Modal::Closed => None,
            Modal::Creating { form } | Modal::Editing { form, .. } => Some(form),
        }
    }

    pub fn form(&self) -> Option<&K::Form> {
        match &self.modal {
            Modal::Closed => None,
            Modal::Creating { form } | Modal::Editing { form, .. } => Some(form),
        }
    }

    /// Close the modal without saving
    pub fn cancel(&mut self) {
        self.modal = Modal::Closed;
    }

    /// Validate and save the open form, refetch, then close the modal.
    ///
    /// Validation and store failures keep the modal open and queue an error
    /// alert. A failed refetch after a successful write still closes it.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ManagerError> {
        let (editing_id, validated) = match &self.modal {
            Modal::Closed => return Err(ManagerError::EditorClosed),
            Modal::Creating { form } => (None, K::validate(form)),
            Modal::Editing { id, form } => (Some(id.clone()), K::validate(form)),
        };

        let draft = match validated {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Rejected {} form: {}", K::LABEL, e);
                self.alerts.push_back(Alert::error(e.to_string()));
                return Err(e.into());
            }
        };

        let written = match editing_id {
            None => {
                let owner = self.owner_id.clone().ok_or(ManagerError::NotSignedIn)?;
                self.store
                    .insert(K::COLLECTION, K::create_fields(&draft, &owner))
                    .await
                    .map(|id| SubmitOutcome::Created { id })
            }
            Some(id) => self
                .store
                .update(K::COLLECTION, &id, K::update_fields(&draft))
                .await
                .map(|_| SubmitOutcome::Updated { id }),
        };

        let outcome = match written {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to save {}: {:#}", K::LABEL, e);
                self.alerts
                    .push_back(Alert::error(format!("Could not save {}: {:#}", K::LABEL.to_lowercase(), e)));
                return Err(ManagerError::Store(e));
            }
        };

        // Already alerted and logged by refresh
        let _ = self.refresh().await;
        self.modal = Modal::Closed;

        let message = match &outcome {
            SubmitOutcome::Created { id } => {
                info!("Created {} {}", K::LABEL, id);
                K::created_message()
            }
            SubmitOutcome::Updated { id } => {
                info!("Updated {} {}", K::LABEL, id);
                K::updated_message()
            }
        };
        self.alerts.push_back(Alert::success(message));
        Ok(outcome)
    }

    /// Ask for confirmation before deleting a listed item
    pub fn request_delete(&mut self, id: &str) -> Result<(), ManagerError> {
        if self.get(id).is_none() {
            return Err(Self::not_found(id));
        }
        self.pending_delete = Some(id.to_string());
        Ok(())
    }

    /// Question to show while a deletion awaits confirmation
    pub fn confirmation_prompt(&self) -> Option<String> {
        self.pending_delete.as_ref().map(|_| {
            format!("Are you sure you want to delete this {}?", K::LABEL.to_lowercase())
        })
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Answer the confirmation prompt. Cancelling never reaches the store.
    pub async fn resolve_delete(&mut self, answer: Confirmation) -> Result<DeleteOutcome, ManagerError> {
        let id = self.pending_delete.take().ok_or(ManagerError::NoPendingDeletion)?;

        if answer == Confirmation::Cancel {
            debug!("Deletion of {} {} cancelled", K::LABEL, id);
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(e) = self.store.delete(K::COLLECTION, &id).await {
            error!("Failed to delete {} {}: {:#}", K::LABEL, id, e);
            self.alerts
                .push_back(Alert::error(format!("Could not delete {}: {:#}", K::LABEL.to_lowercase(), e)));
            return Err(ManagerError::Store(e));
        }

        let _ = self.refresh().await;
        info!("Deleted {} {}", K::LABEL, id);
        self.alerts.push_back(Alert::success(K::deleted_message()));
        Ok(DeleteOutcome::Deleted { id })
    }

    /// Filter the displayed list locally; the store is not queried again
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Items to display: the fetched list narrowed by the search query
    pub fn visible_items(&self) -> Vec<&K> {
        if !K::SEARCHABLE || self.search_query.is_empty() {
            return self.items.iter().collect();
        }

        let needle = self.search_query.to_lowercase();
        self.items
            .iter()
            .filter(|item| {
                item.search_text()
                    .iter()
                    .any(|text| text.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Every fetched item, ignoring the search query
    pub fn items(&self) -> &[K] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&K> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn modal(&self) -> &Modal<K::Form> {
        &self.modal
    }

    pub fn is_editor_open(&self) -> bool {
        !matches!(self.modal, Modal::Closed)
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// Next alert to show, oldest first
    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    fn not_found(id: &str) -> ManagerError {
        ManagerError::NotFound {
            kind: K::LABEL,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::document::FieldWrites;
    use crate::storage::mappers::{cow_mapper, scale_mapper, ScaleMapper};
    use crate::storage::test_utils::{stepping_store, FailingStore, RecordingStore, StoreCall};
    use shared::{AlertKind, Cow, CowForm, Scale, ScaleForm};

    fn farmer() -> Identity {
        Identity {
            uid: "farmer-1".to_string(),
            email: "farmer@example.com".to_string(),
        }
    }

    fn cow_form(name: &str, lot: &str) -> CowForm {
        CowForm {
            name: name.to_string(),
            last_calving_date: "2024-02-10".to_string(),
            lot: lot.to_string(),
        }
    }

    async fn cows_with(store: &RecordingStore, forms: &[CowForm]) -> EntityListManager<Cow> {
        let mut manager = EntityListManager::<Cow>::new(Arc::new(store.clone()));
        manager.attach(&farmer()).await.expect("attach");
        for form in forms {
            manager.open_create_with(form.clone());
            manager.submit().await.expect("create");
        }
        while manager.take_alert().is_some() {}
        manager
    }

    #[tokio::test]
    async fn test_attach_fetches_only_own_documents() {
        let store = RecordingStore::new();
        let mut foreign = FieldWrites::new();
        foreign.insert(cow_mapper::NAME.to_string(), "Stranger".into());
        foreign.insert(cow_mapper::LAST_CALVING_DATE.to_string(), "2023-01-01".into());
        foreign.insert(cow_mapper::LOT.to_string(), "B".into());
        foreign.insert(OWNER_FIELD.to_string(), "someone-else".into());
        store.inner.insert(cow_mapper::COLLECTION, foreign).await.expect("seed");

        let mut manager = EntityListManager::<Cow>::new(Arc::new(store.clone()));
        assert!(manager.is_loading());
        manager.attach(&farmer()).await.expect("attach");

        assert_eq!(manager.phase(), Phase::Ready);
        assert!(manager.items().is_empty());
        assert_eq!(store.calls(), vec![StoreCall::Query(cow_mapper::COLLECTION.to_string())]);
    }

    #[tokio::test]
    async fn test_refresh_requires_owner() {
        let mut manager = EntityListManager::<Cow>::new(Arc::new(RecordingStore::new()));
        assert!(matches!(manager.refresh().await, Err(ManagerError::NotSignedIn)));
        assert!(manager.is_loading());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_ready_and_empty() {
        let failing = FailingStore::new();
        let mut manager = EntityListManager::<Cow>::new(Arc::new(failing.clone()));

        let result = manager.attach(&farmer()).await;
        assert!(matches!(result, Err(ManagerError::Store(_))));
        assert_eq!(manager.phase(), Phase::Ready);
        assert!(manager.items().is_empty());
        assert_eq!(failing.attempts(), 1);

        let alert = manager.take_alert().expect("error alert");
        assert_eq!(alert.kind, AlertKind::Error);
    }

    #[tokio::test]
    async fn test_create_with_empty_field_makes_no_store_call() {
        let store = RecordingStore::new();
        let mut manager = cows_with(&store, &[]).await;
        let calls_before = store.call_count();

        manager.open_create();
        manager.form_mut().expect("form open").name = "Mimosa".to_string();
        let result = manager.submit().await;

        assert!(matches!(result, Err(ManagerError::Validation(_))));
        assert_eq!(store.call_count(), calls_before);
        assert!(manager.is_editor_open());
        assert!(manager.take_alert().expect("alert").is_error());
    }

    #[tokio::test]
    async fn test_scale_create_with_empty_field_makes_no_store_call() {
        let store = RecordingStore::new();
        let mut manager = EntityListManager::<Scale>::new(Arc::new(store.clone()));
        manager.attach(&farmer()).await.expect("attach");

        manager.open_create_with(ScaleForm {
            name: "Parlour".to_string(),
            capacity: "50".to_string(),
            ip_address: "  ".to_string(),
        });
        assert!(manager.submit().await.is_err());
        assert!(store.writes().is_empty());
        assert!(manager.take_alert().expect("alert").is_error());
    }

    #[tokio::test]
    async fn test_create_adds_one_matching_item_and_closes_modal() {
        let store = RecordingStore::new();
        let mut manager = cows_with(&store, &[cow_form("Estrela", "Lot B")]).await;
        assert_eq!(manager.items().len(), 1);

        manager.open_create();
        *manager.form_mut().expect("form open") = cow_form(" Mimosa ", "Lot A");
        let outcome = manager.submit().await.expect("submit");

        let SubmitOutcome::Created { id } = outcome else {
            panic!("expected a created outcome");
        };
        assert_eq!(manager.items().len(), 2);
        let created = manager.get(&id).expect("created cow listed");
        assert_eq!(created.name, "Mimosa");
        assert_eq!(created.lot, "Lot A");
        assert_eq!(created.owner_id, "farmer-1");
        assert_eq!(manager.modal(), &Modal::Closed);

        let alert = manager.take_alert().expect("success alert");
        assert_eq!(alert.kind, AlertKind::Success);
        assert_eq!(alert.message, "Cow registered successfully");
    }

    #[tokio::test]
    async fn test_edit_prefills_and_overwrites_fields() {
        let store = RecordingStore::new();
        let mut manager = cows_with(&store, &[cow_form("Mimosa", "Lot A")]).await;
        let id = manager.items()[0].id.clone();

        manager.open_edit(&id).expect("open edit");
        assert_eq!(manager.form(), Some(&cow_form("Mimosa", "Lot A")));
        manager.form_mut().expect("form").lot = "Lot C".to_string();

        assert_eq!(manager.submit().await.expect("submit"), SubmitOutcome::Updated { id: id.clone() });
        assert_eq!(manager.get(&id).expect("still listed").lot, "Lot C");
        assert_eq!(manager.items().len(), 1);
        assert!(store.writes().contains(&StoreCall::Update(cow_mapper::COLLECTION.to_string(), id)));
    }

    #[tokio::test]
    async fn test_open_edit_unknown_item() {
        let mut manager = cows_with(&RecordingStore::new(), &[]).await;
        assert!(matches!(manager.open_edit("nope"), Err(ManagerError::NotFound { kind: "Cow", .. })));
        assert!(!manager.is_editor_open());
    }

    #[tokio::test]
    async fn test_cancel_closes_without_store_call() {
        let store = RecordingStore::new();
        let mut manager = cows_with(&store, &[]).await;
        let calls_before = store.call_count();

        manager.open_create();
        manager.cancel();
        assert_eq!(manager.modal(), &Modal::Closed);
        assert!(matches!(manager.submit().await, Err(ManagerError::EditorClosed)));
        assert_eq!(store.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_item() {
        let store = RecordingStore::new();
        let mut manager =
            cows_with(&store, &[cow_form("Mimosa", "Lot A"), cow_form("Estrela", "Lot B")]).await;
        let id = manager.items()[0].id.clone();

        manager.request_delete(&id).expect("request");
        assert_eq!(
            manager.confirmation_prompt().as_deref(),
            Some("Are you sure you want to delete this cow?")
        );
        let outcome = manager.resolve_delete(Confirmation::Confirm).await.expect("delete");

        assert_eq!(outcome, DeleteOutcome::Deleted { id: id.clone() });
        assert!(manager.get(&id).is_none());
        assert_eq!(manager.items().len(), 1);
        assert_eq!(manager.pending_delete(), None);
        assert_eq!(manager.take_alert().expect("alert").message, "Cow deleted successfully");
    }

    #[tokio::test]
    async fn test_cancelled_delete_makes_no_store_call() {
        let store = RecordingStore::new();
        let mut manager = cows_with(&store, &[cow_form("Mimosa", "Lot A")]).await;
        let before: Vec<Cow> = manager.items().to_vec();
        let calls_before = store.call_count();

        manager.request_delete(&before[0].id).expect("request");
        let outcome = manager.resolve_delete(Confirmation::Cancel).await.expect("cancel");

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(manager.items(), before.as_slice());
        assert_eq!(store.call_count(), calls_before);
        assert!(matches!(
            manager.resolve_delete(Confirmation::Confirm).await,
            Err(ManagerError::NoPendingDeletion)
        ));
    }

    #[tokio::test]
    async fn test_search_by_name_or_lot_case_insensitively() {
        let store = RecordingStore::new();
        let mut manager = cows_with(
            &store,
            &[
                cow_form("Mimosa", "Lot A"),
                cow_form("Estrela", "LOT A-2"),
                cow_form("Malhada", "Lot B"),
                cow_form("Lotta", "Pasture"),
            ],
        )
        .await;
        let calls_before = store.call_count();

        manager.set_search_query("Lot A");
        let names: Vec<&str> = manager.visible_items().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Mimosa", "Estrela"]);

        manager.set_search_query("mal");
        assert_eq!(manager.visible_items().len(), 1);

        manager.clear_search();
        assert_eq!(manager.visible_items().len(), 4);
        assert_eq!(store.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_scales_ignore_search_query() {
        let store = RecordingStore::wrap(stepping_store());
        let mut manager = EntityListManager::<Scale>::new(Arc::new(store.clone()));
        manager.attach(&farmer()).await.expect("attach");
        manager.open_create_with(ScaleForm {
            name: "Parlour".to_string(),
            capacity: "50".to_string(),
            ip_address: "192.168.0.20".to_string(),
        });
        manager.submit().await.expect("create");

        manager.set_search_query("no match");
        assert_eq!(manager.visible_items().len(), 1);
    }

    #[tokio::test]
    async fn test_scale_calibration_restamped_on_edit() {
        let store = RecordingStore::wrap(stepping_store());
        let mut manager = EntityListManager::<Scale>::new(Arc::new(store.clone()));
        manager.attach(&farmer()).await.expect("attach");
        manager.open_create_with(ScaleForm {
            name: "Parlour".to_string(),
            capacity: "50".to_string(),
            ip_address: "192.168.0.20".to_string(),
        });
        manager.submit().await.expect("create");
        let created = manager.items()[0].clone();

        manager.open_edit(&created.id).expect("edit");
        manager.submit().await.expect("update");
        let edited = manager.get(&created.id).expect("listed");
        assert!(edited.calibrated_at > created.calibrated_at);
        assert_eq!(edited.owner_id, created.owner_id);
    }

    #[tokio::test]
    async fn test_store_failure_on_submit_keeps_modal_open() {
        let mut manager = EntityListManager::<Cow>::new(Arc::new(FailingStore::new()));
        let _ = manager.attach(&farmer()).await;
        manager.take_alert();

        manager.open_create_with(cow_form("Mimosa", "Lot A"));
        assert!(matches!(manager.submit().await, Err(ManagerError::Store(_))));
        assert!(manager.is_editor_open());
        assert!(manager.take_alert().expect("alert").is_error());
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let store = RecordingStore::new();
        let mut broken = FieldWrites::new();
        broken.insert(scale_mapper::NAME.to_string(), "No timestamp".into());
        broken.insert(OWNER_FIELD.to_string(), "farmer-1".into());
        store.inner.insert(scale_mapper::COLLECTION, broken).await.expect("seed");

        let good = ScaleMapper::create_fields(
            &ScaleForm {
                name: "Parlour".to_string(),
                capacity: "50".to_string(),
                ip_address: "10.0.0.2".to_string(),
            },
            "farmer-1",
        );
        store.inner.insert(scale_mapper::COLLECTION, good).await.expect("seed");

        let mut manager = EntityListManager::<Scale>::new(Arc::new(store));
        manager.attach(&farmer()).await.expect("attach");
        assert_eq!(manager.items().len(), 1);
        assert_eq!(manager.items()[0].name, "Parlour");
    }

    #[tokio::test]
    async fn test_detach_forgets_list() {
        let mut manager = cows_with(&RecordingStore::new(), &[cow_form("Mimosa", "Lot A")]).await;
        manager.detach();
        assert!(manager.items().is_empty());
        assert!(manager.is_loading());
        assert_eq!(manager.owner_id(), None);
    }
}
