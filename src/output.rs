use std::io::{self, Write};
use std::sync::Arc;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::view::{EntityView, EvolutionNode};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_entity(view: &EntityView) -> io::Result<()> {
        Self::print_json(view)
    }

    pub fn print_entities(views: &[Arc<EntityView>]) -> io::Result<()> {
        let views: Vec<&EntityView> = views.iter().map(|view| view.as_ref()).collect();
        Self::print_json(&views)
    }

    pub fn print_tree(tree: &EvolutionNode) -> io::Result<()> {
        Self::print_json(tree)
    }

    pub fn print_stats(stats: &CacheStats) -> io::Result<()> {
        Self::print_json(stats)
    }

    pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
