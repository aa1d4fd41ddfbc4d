use log::{debug, info};
use shared::{Alert, Cow, Identity, MilkWeighing, MilkWeighingForm};
use std::sync::Arc;

use super::errors::ManagerError;
use super::list_manager::{EntityListManager, SubmitOutcome};
use crate::storage::mappers::milk_weighing_mapper;
use crate::storage::traits::DocumentStore;

/// The milk weighing screen: the user's cows, and the weighings of one
/// selected cow.
///
/// Weighings are fetched by cow only, newest first. Recording opens the
/// weighing editor with the cow preset; editing a weighing changes its
/// weight and nothing else.
pub struct MilkWeighingManager {
    cows: EntityListManager<Cow>,
    weighings: EntityListManager<MilkWeighing>,
    selected_cow: Option<String>,
}

impl MilkWeighingManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            cows: EntityListManager::new(store.clone()),
            weighings: EntityListManager::new(store),
            selected_cow: None,
        }
    }

    /// Set the signed-in user and fetch their cows
    pub async fn attach(&mut self, identity: &Identity) -> Result<(), ManagerError> {
        if self.weighings.owner_id() != Some(identity.uid.as_str()) {
            self.selected_cow = None;
            self.weighings.clear_scope();
        }
        self.weighings.set_owner(identity);
        self.cows.attach(identity).await
    }

    pub fn detach(&mut self) {
        self.selected_cow = None;
        self.cows.detach();
        self.weighings.detach();
    }

    fn select(&mut self, cow_id: &str) -> Result<(), ManagerError> {
        if self.cows.get(cow_id).is_none() {
            return Err(ManagerError::NotFound {
                kind: "Cow",
                id: cow_id.to_string(),
            });
        }
        if self.selected_cow.as_deref() != Some(cow_id) {
            self.weighings.scope_to(milk_weighing_mapper::COW_ID, cow_id);
            self.selected_cow = Some(cow_id.to_string());
        }
        Ok(())
    }

    /// Open the weighing editor for a new weighing of `cow_id`
    pub fn open_record(&mut self, cow_id: &str) -> Result<(), ManagerError> {
        self.select(cow_id)?;
        debug!("Recording a weighing for cow {}", cow_id);
        self.weighings.open_create_with(MilkWeighingForm {
            cow_id: Some(cow_id.to_string()),
            weight: String::new(),
        });
        Ok(())
    }

    /// Fetch the weighings of `cow_id` for the drill-down
    pub async fn view_weighings(&mut self, cow_id: &str) -> Result<(), ManagerError> {
        self.select(cow_id)?;
        info!("Viewing weighings of cow {}", cow_id);
        self.weighings.refresh().await
    }

    /// Open the editor for one weighing in the drill-down
    pub fn open_edit_weighing(&mut self, weighing_id: &str) -> Result<(), ManagerError> {
        self.weighings.open_edit(weighing_id)
    }

    /// Save the open weighing editor; the drill-down is refetched
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ManagerError> {
        self.weighings.submit().await
    }

    pub fn cancel(&mut self) {
        self.weighings.cancel();
    }

    /// Leave the drill-down
    pub fn close_drill_down(&mut self) {
        self.selected_cow = None;
        self.weighings.clear_scope();
    }

    /// Weighings of the selected cow, newest first, once fetched
    pub fn drill_down(&self) -> Option<&[MilkWeighing]> {
        if self.selected_cow.is_none() || self.weighings.is_loading() {
            return None;
        }
        Some(self.weighings.items())
    }

    pub fn selected_cow(&self) -> Option<&Cow> {
        self.selected_cow.as_deref().and_then(|id| self.cows.get(id))
    }

    pub fn cows(&self) -> &EntityListManager<Cow> {
        &self.cows
    }

    pub fn cows_mut(&mut self) -> &mut EntityListManager<Cow> {
        &mut self.cows
    }

    pub fn weighings(&self) -> &EntityListManager<MilkWeighing> {
        &self.weighings
    }

    pub fn weighings_mut(&mut self) -> &mut EntityListManager<MilkWeighing> {
        &mut self.weighings
    }

    /// Next alert from either list
    pub fn take_alert(&mut self) -> Option<Alert> {
        self.weighings.take_alert().or_else(|| self.cows.take_alert())
    }
}
