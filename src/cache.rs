//! Process-lifetime memo tables.
//!
//! Entries are only ever inserted or replaced as whole values, never
//! removed or expired: upstream data is near-static reference data, so the
//! cache trades freshness for zero repeat traffic. Locks are never held
//! across an await point.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::domain::{EntityKey, GenerationNumber};
use crate::view::{DamageRelations, EntityView, SearchIndexEntry};

pub type Generation = Arc<Vec<Arc<EntityView>>>;
pub type SearchIndex = Arc<Vec<SearchIndexEntry>>;

#[derive(Debug, Default)]
pub struct DexCache {
    entities: RwLock<HashMap<String, Arc<EntityView>>>,
    generations: RwLock<HashMap<GenerationNumber, Generation>>,
    types: RwLock<HashMap<String, Arc<DamageRelations>>>,
    search_index: RwLock<Option<SearchIndex>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entity_keys: usize,
    pub entities: usize,
    pub generations: usize,
    pub types: usize,
    pub search_index: Option<usize>,
}

impl DexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, key: &EntityKey) -> Option<Arc<EntityView>> {
        read(&self.entities).get(key.as_str()).cloned()
    }

    /// Indexes the view under the requested key, its numeric id and its
    /// upstream name so later lookups by any of them hit the same entry.
    /// A view already annotated with its generation wins over a fresh one.
    pub fn store_entity(
        &self,
        key: &EntityKey,
        raw_name: &str,
        view: EntityView,
    ) -> Arc<EntityView> {
        let mut entities = write(&self.entities);
        let annotated = entities
            .get(&view.id.to_string())
            .filter(|existing| existing.generation.is_some())
            .cloned();
        let view = annotated.unwrap_or_else(|| Arc::new(view));
        entities.insert(key.as_str().to_string(), view.clone());
        entities.insert(view.id.to_string(), view.clone());
        entities.insert(raw_name.to_lowercase(), view.clone());
        view
    }

    /// Records the generation on each view, replacing every cache slot that
    /// holds the same entity so both call paths keep sharing one value.
    pub fn annotate_generation(
        &self,
        views: Vec<Arc<EntityView>>,
        generation: GenerationNumber,
    ) -> Vec<Arc<EntityView>> {
        let number = generation.get();
        let mut entities = write(&self.entities);
        views
            .into_iter()
            .map(|view| {
                if view.generation == Some(number) {
                    return view;
                }
                let annotated = Arc::new(EntityView {
                    generation: Some(number),
                    ..(*view).clone()
                });
                for slot in entities.values_mut() {
                    if Arc::ptr_eq(slot, &view) {
                        *slot = annotated.clone();
                    }
                }
                annotated
            })
            .collect()
    }

    pub fn generation(&self, generation: GenerationNumber) -> Option<Generation> {
        read(&self.generations).get(&generation).cloned()
    }

    pub fn store_generation(
        &self,
        generation: GenerationNumber,
        views: Vec<Arc<EntityView>>,
    ) -> Generation {
        let views = Arc::new(views);
        write(&self.generations).insert(generation, views.clone());
        views
    }

    pub fn damage_relations(&self, type_name: &str) -> Option<Arc<DamageRelations>> {
        read(&self.types).get(type_name).cloned()
    }

    pub fn store_damage_relations(
        &self,
        type_name: &str,
        relations: DamageRelations,
    ) -> Arc<DamageRelations> {
        let relations = Arc::new(relations);
        write(&self.types).insert(type_name.to_string(), relations.clone());
        relations
    }

    pub fn search_index(&self) -> Option<SearchIndex> {
        read(&self.search_index).clone()
    }

    pub fn store_search_index(&self, entries: Vec<SearchIndexEntry>) -> SearchIndex {
        let entries = Arc::new(entries);
        *write(&self.search_index) = Some(entries.clone());
        entries
    }

    pub fn stats(&self) -> CacheStats {
        let entities = read(&self.entities);
        let mut distinct: Vec<*const EntityView> = entities.values().map(Arc::as_ptr).collect();
        distinct.sort_unstable();
        distinct.dedup();
        CacheStats {
            entity_keys: entities.len(),
            entities: distinct.len(),
            generations: read(&self.generations).len(),
            types: read(&self.types).len(),
            search_index: read(&self.search_index).as_ref().map(|index| index.len()),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
