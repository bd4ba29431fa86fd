use std::sync::Arc;

use futures::future::{join, join_all};
use tracing::{debug, warn};

use crate::cache::{DexCache, Generation, SearchIndex};
use crate::config::{DEFAULT_MAX_RESULTS, ResolvedConfig};
use crate::domain::{EntityKey, GenerationNumber, ResourceKind, ResourceRef};
use crate::error::DexError;
use crate::extract::{self, PrimaryRecord, SpeciesRecord, Variety};
use crate::naming;
use crate::upstream::UpstreamClient;
use crate::view::{DamageRelations, EntityView, FormView, Matchups};

/// Aggregation engine: fans out upstream calls, merges the results into
/// view models and memoizes them in the injected cache.
pub struct Engine<U: UpstreamClient> {
    pub(crate) upstream: U,
    pub(crate) cache: Arc<DexCache>,
    pub(crate) config: ResolvedConfig,
}

impl<U: UpstreamClient> Engine<U> {
    pub fn new(upstream: U, cache: Arc<DexCache>, config: ResolvedConfig) -> Self {
        Self {
            upstream,
            cache,
            config,
        }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub fn cache(&self) -> &Arc<DexCache> {
        &self.cache
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub async fn get_entity(&self, identifier: &str) -> Result<Arc<EntityView>, DexError> {
        let key: EntityKey = identifier.parse()?;
        self.entity_by_key(&key).await
    }

    /// Alternate forms are addressed by their upstream name
    /// (`charizard-mega-x`, `vulpix-alola`) and share the entity cache.
    pub async fn get_form(&self, name: &str) -> Result<Arc<EntityView>, DexError> {
        let key: EntityKey = name.parse()?;
        if key.numeric_id().is_some() {
            return Err(DexError::InvalidIdentifier(name.to_string()));
        }
        self.entity_by_key(&key).await
    }

    pub async fn get_generation(
        &self,
        generation: GenerationNumber,
    ) -> Result<Generation, DexError> {
        if let Some(hit) = self.cache.generation(generation) {
            debug!(%generation, "generation cache hit");
            return Ok(hit);
        }

        let raw = self
            .upstream
            .fetch(ResourceKind::Generation, &ResourceRef::Id(generation.get()))
            .await
            .map_err(|err| {
                warn!(%generation, error = %err, "generation fetch failed");
                DexError::UpstreamUnavailable(format!("generation {generation}"))
            })?;
        let members = extract::generation_members(&raw).map_err(|err| {
            warn!(%generation, error = %err, "generation listing unreadable");
            DexError::UpstreamUnavailable(format!("generation {generation}"))
        })?;
        debug!(%generation, members = members.len(), "resolving generation members");

        let results = join_all(members.iter().map(|name| self.get_entity(name))).await;
        let mut views = Vec::with_capacity(results.len());
        for (name, result) in members.iter().zip(results) {
            match result {
                Ok(view) => views.push(view),
                Err(err) => warn!(%generation, member = %name, error = %err, "member dropped"),
            }
        }

        let mut views = self.cache.annotate_generation(views, generation);
        views.sort_by_key(|view| view.id);
        Ok(self.cache.store_generation(generation, views))
    }

    /// Case-insensitive substring match on name or decimal id, in index
    /// order, resolved to full views. Unresolvable matches are dropped.
    pub async fn search(&self, query: &str) -> Result<Vec<Arc<EntityView>>, DexError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(DexError::InvalidIdentifier(query.to_string()));
        }
        let index = self.search_index().await?;
        let matches: Vec<&str> = index
            .iter()
            .filter(|entry| entry.matches(&needle))
            .take(self.config.search.max_results.min(DEFAULT_MAX_RESULTS))
            .map(|entry| entry.name.as_str())
            .collect();
        debug!(query = %needle, matches = matches.len(), "search matches");

        let results = join_all(matches.iter().map(|name| self.get_entity(name))).await;
        Ok(results
            .into_iter()
            .zip(&matches)
            .filter_map(|(result, name)| match result {
                Ok(view) => Some(view),
                Err(err) => {
                    warn!(match_name = %name, error = %err, "search match dropped");
                    None
                }
            })
            .collect())
    }

    /// Builds the index on first use. A failed build is not remembered, so
    /// the next search tries again.
    async fn search_index(&self) -> Result<SearchIndex, DexError> {
        if let Some(index) = self.cache.search_index() {
            return Ok(index);
        }
        let raw = self
            .upstream
            .fetch(
                ResourceKind::SpeciesIndex,
                &ResourceRef::Id(self.config.search.index_limit),
            )
            .await
            .map_err(|err| {
                warn!(error = %err, "search index build failed");
                DexError::IndexUnavailable
            })?;
        let entries = extract::species_index(&raw).map_err(|err| {
            warn!(error = %err, "search index unreadable");
            DexError::IndexUnavailable
        })?;
        debug!(entries = entries.len(), "search index built");
        Ok(self.cache.store_search_index(entries))
    }

    pub(crate) async fn entity_by_key(&self, key: &EntityKey) -> Result<Arc<EntityView>, DexError> {
        if let Some(hit) = self.cache.entity(key) {
            debug!(%key, "entity cache hit");
            return Ok(hit);
        }
        debug!(%key, "entity cache miss");

        // Species only depends on the identifier, so it travels alongside
        // the primary fetch.
        let (primary, species) = join(self.fetch_primary(key), async {
            if key.is_variant() {
                None
            } else {
                self.fetch_species(key).await
            }
        })
        .await;
        let primary = primary?;

        let (relations, (mega_evolutions, regional_forms)) = join(
            self.fetch_type_relations(&primary.types),
            self.fetch_forms(species.as_ref()),
        )
        .await;

        let view = build_view(
            &primary,
            species.as_ref(),
            &relations,
            mega_evolutions,
            regional_forms,
        );
        Ok(self.cache.store_entity(key, &primary.name, view))
    }

    async fn fetch_primary(&self, key: &EntityKey) -> Result<PrimaryRecord, DexError> {
        let raw = self
            .upstream
            .fetch(ResourceKind::Entity, &key.to_resource_ref())
            .await
            .map_err(|err| {
                debug!(%key, error = %err, "entity fetch failed");
                DexError::NotFound(key.to_string())
            })?;
        extract::primary_record(&raw).map_err(|err| {
            warn!(%key, error = %err, "entity resource unreadable");
            DexError::NotFound(key.to_string())
        })
    }

    async fn fetch_species(&self, key: &EntityKey) -> Option<SpeciesRecord> {
        match self
            .upstream
            .fetch(ResourceKind::Species, &key.to_resource_ref())
            .await
        {
            Ok(raw) => Some(extract::species_record(&raw, &self.config.language)),
            Err(err) => {
                warn!(%key, error = %err, "species fetch failed, continuing without it");
                None
            }
        }
    }

    async fn fetch_type_relations(&self, types: &[String]) -> Vec<Arc<DamageRelations>> {
        join_all(types.iter().map(|name| self.type_relations(name)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn type_relations(&self, type_name: &str) -> Option<Arc<DamageRelations>> {
        if let Some(hit) = self.cache.damage_relations(type_name) {
            return Some(hit);
        }
        let result = self
            .upstream
            .fetch(ResourceKind::Type, &ResourceRef::Name(type_name.to_string()))
            .await
            .and_then(|raw| extract::damage_relations(&raw));
        match result {
            Ok(relations) => Some(self.cache.store_damage_relations(type_name, relations)),
            Err(err) => {
                warn!(type_name = %type_name, error = %err, "type relations skipped");
                None
            }
        }
    }

    async fn fetch_forms(&self, species: Option<&SpeciesRecord>) -> (Vec<FormView>, Vec<FormView>) {
        let Some(species) = species else {
            return (Vec::new(), Vec::new());
        };
        let alternates = species.varieties.iter().filter(|variety| !variety.is_default);
        let (mega, regional): (Vec<&Variety>, Vec<&Variety>) = alternates
            .filter(|variety| {
                naming::is_mega(&variety.name) || naming::regional_marker(&variety.name).is_some()
            })
            .partition(|variety| naming::is_mega(&variety.name));

        join(self.fetch_form_views(&mega), self.fetch_form_views(&regional)).await
    }

    async fn fetch_form_views(&self, varieties: &[&Variety]) -> Vec<FormView> {
        join_all(varieties.iter().map(|variety| self.form_view(variety)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn form_view(&self, variety: &Variety) -> Option<FormView> {
        let target = if variety.url.is_empty() {
            ResourceRef::Name(variety.name.clone())
        } else {
            ResourceRef::Link(variety.url.clone())
        };
        let result = self
            .upstream
            .fetch(ResourceKind::Form, &target)
            .await
            .and_then(|raw| extract::primary_record(&raw));
        match result {
            Ok(record) => Some(FormView {
                name: naming::display_name(&record.name),
                raw_name: record.name,
                image_url: record.image_url,
                types: record.types,
            }),
            Err(err) => {
                warn!(form = %variety.name, error = %err, "form dropped");
                None
            }
        }
    }
}

fn build_view(
    primary: &PrimaryRecord,
    species: Option<&SpeciesRecord>,
    relations: &[Arc<DamageRelations>],
    mega_evolutions: Vec<FormView>,
    regional_forms: Vec<FormView>,
) -> EntityView {
    let mut moves: Vec<String> = primary
        .moves
        .iter()
        .map(|name| naming::display_label(name))
        .collect();
    moves.sort();

    EntityView {
        id: primary.id,
        name: naming::display_name(&primary.name),
        image_url: primary.image_url.clone(),
        types: primary.types.clone(),
        height: primary.height,
        weight: primary.weight,
        stats: primary.stats.clone(),
        abilities: primary
            .abilities
            .iter()
            .map(|name| naming::display_label(name))
            .collect(),
        moves,
        species: naming::species_label(species.and_then(|s| s.genus.as_deref())),
        generation: None,
        matchups: relations.iter().map(|relations| &**relations).collect::<Matchups>(),
        mega_evolutions,
        regional_forms,
        gender_rate: species.and_then(|s| s.gender_rate),
        egg_groups: species.map(|s| s.egg_groups.clone()),
        hatch_counter: species.and_then(|s| s.hatch_counter),
    }
}
