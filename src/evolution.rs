//! Evolution trees: parse the upstream chain into an owned skeleton, then
//! decorate every node with a display name and image in a second pass that
//! produces a new tree.

use futures::FutureExt;
use futures::future::{BoxFuture, join, join_all};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{EntityKey, ResourceKind, ResourceRef};
use crate::engine::Engine;
use crate::error::DexError;
use crate::extract::{self, id_from_link};
use crate::naming;
use crate::upstream::UpstreamClient;
use crate::view::EvolutionNode;

impl<U: UpstreamClient> Engine<U> {
    /// Species, chain link and chain body are all required; decoration
    /// failures only cost the affected node its image.
    pub async fn get_evolution_tree(&self, identifier: &str) -> Result<EvolutionNode, DexError> {
        let key: EntityKey = identifier.parse()?;

        let species = self
            .upstream
            .fetch(ResourceKind::Species, &key.to_resource_ref())
            .await
            .map_err(|err| {
                warn!(%key, error = %err, "species fetch failed");
                DexError::UpstreamUnavailable(format!("species {key}"))
            })?;
        let link = extract::species_record(&species, &self.config.language)
            .evolution_chain
            .ok_or_else(|| DexError::UpstreamUnavailable(format!("no evolution chain for {key}")))?;

        let chain = self
            .upstream
            .fetch(ResourceKind::EvolutionChain, &ResourceRef::Link(link.clone()))
            .await
            .map_err(|err| {
                warn!(%key, %link, error = %err, "evolution chain fetch failed");
                DexError::UpstreamUnavailable(format!("evolution chain {link}"))
            })?;

        let skeleton = parse_chain(&chain).map_err(|err| {
            warn!(%key, %link, error = %err, "evolution chain unreadable");
            DexError::UpstreamUnavailable(format!("evolution chain {link}"))
        })?;
        debug!(%key, nodes = skeleton.node_count(), "decorating evolution tree");

        Ok(self.decorate(skeleton).await)
    }

    fn decorate(&self, node: EvolutionNode) -> BoxFuture<'_, EvolutionNode> {
        async move {
            let EvolutionNode {
                id,
                name,
                trigger,
                evolves_to,
                ..
            } = node;
            let children = join_all(evolves_to.into_iter().map(|child| self.decorate(child)));
            let (info, evolves_to) = join(self.node_display(id), children).await;
            let (name, image_url) = match info {
                Some((display, image_url)) => (display, image_url),
                None => (name, None),
            };
            EvolutionNode {
                id,
                name,
                trigger,
                image_url,
                evolves_to,
            }
        }
        .boxed()
    }

    /// Display name and image for one node, from the entity cache when it
    /// already holds the id.
    async fn node_display(&self, id: u32) -> Option<(String, Option<String>)> {
        if let Some(view) = self.cache.entity(&EntityKey::from_id(id)) {
            return Some((view.name.clone(), view.image_url.clone()));
        }
        let result = self
            .upstream
            .fetch(ResourceKind::Entity, &ResourceRef::Id(id))
            .await
            .and_then(|raw| extract::primary_record(&raw));
        match result {
            Ok(record) => Some((naming::display_name(&record.name), record.image_url)),
            Err(err) => {
                warn!(id, error = %err, "evolution node left undecorated");
                None
            }
        }
    }
}

/// Parses `{"chain": {...}}` (or a bare chain link) into a skeleton tree.
pub fn parse_chain(raw: &Value) -> Result<EvolutionNode, DexError> {
    let root = raw.get("chain").unwrap_or(raw);
    let mut node = parse_link(root)?;
    node.trigger.clear();
    Ok(node)
}

fn parse_link(link: &Value) -> Result<EvolutionNode, DexError> {
    let species = link
        .get("species")
        .ok_or_else(|| DexError::Malformed("chain link without species".to_string()))?;
    let name = species
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DexError::Malformed("chain species without name".to_string()))?;
    let id = species
        .get("url")
        .and_then(|v| v.as_str())
        .and_then(id_from_link)
        .ok_or_else(|| DexError::Malformed(format!("chain species {name} without id")))?;

    let evolves_to = link
        .get("evolves_to")
        .and_then(|v| v.as_array())
        .map(|children| children.iter().map(parse_link).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    Ok(EvolutionNode {
        id,
        name: name.to_string(),
        trigger: describe_trigger(link.get("evolution_details")),
        image_url: None,
        evolves_to,
    })
}

/// Human-readable condition from the first evolution detail only; further
/// alternative conditions are not shown.
pub fn describe_trigger(details: Option<&Value>) -> String {
    let Some(detail) = details
        .and_then(|v| v.as_array())
        .and_then(|items| items.first())
    else {
        return String::new();
    };
    let named = |field: &str| {
        detail
            .get(field)
            .and_then(|v| v.get("name"))
            .and_then(|v| v.as_str())
            .map(naming::display_label)
    };

    let mut parts = Vec::new();
    if let Some(trigger) = named("trigger") {
        parts.push(trigger);
    }
    if let Some(level) = detail.get("min_level").and_then(|v| v.as_u64()) {
        parts.push(format!("Lvl {level}"));
    }
    if let Some(item) = named("item") {
        parts.push(format!("w/ {item}"));
    }
    if let Some(item) = named("held_item") {
        parts.push(format!("holding {item}"));
    }
    if let Some(known) = named("known_move") {
        parts.push(format!("knowing {known}"));
    }
    if detail.get("min_happiness").is_some_and(|v| !v.is_null()) {
        parts.push("high happiness".to_string());
    }
    if let Some(time) = detail
        .get("time_of_day")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
    {
        parts.push(format!("at {time}"));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("({})", parts.join(" "))
    }
}
