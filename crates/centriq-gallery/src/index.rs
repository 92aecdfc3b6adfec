//! In-memory gallery index
//!
//! One entry per [`GalleryScope`], holding exactly the most recently loaded
//! page for that scope. Every fetch is tagged with the scope's generation;
//! a response whose generation is no longer current is discarded, so a late
//! reply can never overwrite newer state.
//!
//! Favorite changes go through a [`FavoriteMutation`]: `begin_favorite`
//! applies the tentative value, then the caller either confirms it with the
//! backend's answer or reverts it.

use std::collections::{BTreeMap, HashSet};

use centriq_core::models::{GalleryScope, MediaPage, MediaRecord};
use centriq_core::AppError;
use serde::Serialize;
use uuid::Uuid;

/// Load state of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PageState {
    Idle,
    Loading { page: u32 },
    Loaded { page: u32, total: u64, pages: u32 },
    Failed { page: u32, reason: String },
}

/// Proof that a fetch was started; required to apply its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub scope: GalleryScope,
    pub page: u32,
    pub page_size: u32,
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationPhase {
    Tentative,
    Confirmed,
    Reverted,
}

/// A favorite change in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteMutation {
    pub media_id: Uuid,
    pub previous: bool,
    pub tentative: bool,
    phase: MutationPhase,
}

impl FavoriteMutation {
    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    fn ensure_tentative(&self) -> Result<(), AppError> {
        if self.phase != MutationPhase::Tentative {
            return Err(AppError::InvalidState(format!(
                "favorite change for {} already settled ({:?})",
                self.media_id, self.phase
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ScopeEntry {
    generation: u64,
    state: PageState,
    items: Vec<MediaRecord>,
}

impl Default for ScopeEntry {
    fn default() -> Self {
        Self {
            generation: 0,
            state: PageState::Idle,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct GalleryIndex {
    scopes: BTreeMap<GalleryScope, ScopeEntry>,
}

impl GalleryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `page` of `scope`. Any earlier in-flight fetch for the
    /// scope becomes stale.
    pub fn begin_fetch(&mut self, scope: GalleryScope, page: u32, page_size: u32) -> FetchTicket {
        let entry = self.scopes.entry(scope).or_default();
        entry.generation += 1;
        entry.state = PageState::Loading { page };
        FetchTicket {
            scope,
            page,
            page_size,
            generation: entry.generation,
        }
    }

    /// Apply a fetch result. Returns false, leaving the index untouched, when
    /// the ticket is stale.
    ///
    /// A successful page replaces the scope's items entirely. A failure clears
    /// them and marks the scope as failed.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<MediaPage, String>,
    ) -> bool {
        let Some(entry) = self.scopes.get_mut(&ticket.scope) else {
            return false;
        };
        if entry.generation != ticket.generation {
            tracing::warn!(
                scope = %ticket.scope,
                page = ticket.page,
                ticket_generation = ticket.generation,
                current_generation = entry.generation,
                "Discarding stale page response"
            );
            return false;
        }

        match result {
            Ok(page) => {
                entry.state = PageState::Loaded {
                    page: ticket.page,
                    total: page.total,
                    pages: page.pages,
                };
                entry.items = page.items;
            }
            Err(reason) => {
                entry.state = PageState::Failed {
                    page: ticket.page,
                    reason,
                };
                entry.items.clear();
            }
        }
        true
    }

    /// Make every in-flight fetch for `scope` stale (the user navigated away).
    pub fn invalidate(&mut self, scope: GalleryScope) {
        if let Some(entry) = self.scopes.get_mut(&scope) {
            entry.generation += 1;
            if matches!(entry.state, PageState::Loading { .. }) {
                entry.state = PageState::Idle;
            }
        }
    }

    /// Drop a scope's items and make its in-flight fetches stale (the trip
    /// was deleted). Returns the number of records dropped.
    pub fn forget(&mut self, scope: GalleryScope) -> usize {
        let Some(entry) = self.scopes.get_mut(&scope) else {
            return 0;
        };
        entry.generation += 1;
        entry.state = PageState::Idle;
        let dropped = entry.items.len();
        entry.items.clear();
        dropped
    }

    pub fn page_state(&self, scope: GalleryScope) -> PageState {
        self.scopes
            .get(&scope)
            .map(|entry| entry.state.clone())
            .unwrap_or(PageState::Idle)
    }

    pub fn items(&self, scope: GalleryScope) -> &[MediaRecord] {
        self.scopes
            .get(&scope)
            .map(|entry| entry.items.as_slice())
            .unwrap_or(&[])
    }

    fn all_records(&self) -> impl Iterator<Item = &MediaRecord> {
        self.scopes.values().flat_map(|entry| entry.items.iter())
    }

    fn distinct<'a>(records: impl Iterator<Item = &'a MediaRecord>) -> Vec<&'a MediaRecord> {
        let mut seen = HashSet::new();
        records.filter(|record| seen.insert(record.id)).collect()
    }

    pub fn find(&self, media_id: Uuid) -> Option<&MediaRecord> {
        self.all_records().find(|record| record.id == media_id)
    }

    pub fn is_favorite(&self, media_id: Uuid) -> Option<bool> {
        self.find(media_id).map(|record| record.is_favorite)
    }

    /// Set the flag on every loaded copy of the record.
    fn set_favorite_flag(&mut self, media_id: Uuid, value: bool) -> usize {
        let mut touched = 0;
        for entry in self.scopes.values_mut() {
            for record in entry.items.iter_mut().filter(|r| r.id == media_id) {
                record.is_favorite = value;
                touched += 1;
            }
        }
        touched
    }

    /// Apply `tentative` to a loaded record. `None` when the record is not loaded.
    pub fn begin_favorite(&mut self, media_id: Uuid, tentative: bool) -> Option<FavoriteMutation> {
        let previous = self.is_favorite(media_id)?;
        self.set_favorite_flag(media_id, tentative);
        Some(FavoriteMutation {
            media_id,
            previous,
            tentative,
            phase: MutationPhase::Tentative,
        })
    }

    /// Settle a mutation with the value the backend reports. Like
    /// [`revert_favorite`](Self::revert_favorite), the flag is only written
    /// while it still shows this mutation's tentative value.
    pub fn confirm_favorite(
        &mut self,
        mutation: &mut FavoriteMutation,
        confirmed: bool,
    ) -> Result<(), AppError> {
        mutation.ensure_tentative()?;
        if self.is_favorite(mutation.media_id) == Some(mutation.tentative) {
            self.set_favorite_flag(mutation.media_id, confirmed);
        }
        mutation.phase = MutationPhase::Confirmed;
        Ok(())
    }

    /// Restore the pre-toggle value, unless a newer change already replaced
    /// the tentative one.
    pub fn revert_favorite(&mut self, mutation: &mut FavoriteMutation) -> Result<(), AppError> {
        mutation.ensure_tentative()?;
        if self.is_favorite(mutation.media_id) == Some(mutation.tentative) {
            self.set_favorite_flag(mutation.media_id, mutation.previous);
        }
        mutation.phase = MutationPhase::Reverted;
        Ok(())
    }

    /// Set the flag without a round trip. Returns false if the record is not loaded.
    pub fn force_favorite(&mut self, media_id: Uuid, value: bool) -> bool {
        self.set_favorite_flag(media_id, value) > 0
    }

    /// Add upload results to their scopes, skipping ids already present.
    pub fn merge_uploaded(&mut self, records: Vec<MediaRecord>) -> usize {
        let mut added = 0;
        for record in records {
            let entry = self.scopes.entry(record.scope()).or_default();
            if entry.items.iter().any(|existing| existing.id == record.id) {
                continue;
            }
            entry.items.push(record);
            added += 1;
        }
        added
    }

    /// Drop a record from every scope.
    pub fn remove(&mut self, media_id: Uuid) -> bool {
        let mut removed = false;
        for entry in self.scopes.values_mut() {
            let before = entry.items.len();
            entry.items.retain(|record| record.id != media_id);
            removed |= entry.items.len() != before;
        }
        removed
    }

    /// Distinct uploader names in first-seen order.
    pub fn uploaders(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.all_records()
            .filter_map(|record| record.uploader.as_deref())
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    pub fn by_uploader(&self, name: &str) -> Vec<&MediaRecord> {
        Self::distinct(
            self.all_records()
                .filter(|record| record.uploader.as_deref() == Some(name)),
        )
    }

    /// Favorite records across every loaded scope.
    pub fn favorites(&self) -> Vec<&MediaRecord> {
        Self::distinct(self.all_records().filter(|record| record.is_favorite))
    }
}
