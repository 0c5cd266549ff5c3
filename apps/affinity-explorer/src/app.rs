//! Wires storage, cache, HTTP client and the recently viewed list together
//! and runs one command against them.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use affinity_core::domain::{Affinity, AffinityId, RecentlyViewedEntry, UserId};
use affinity_core::ports::{AffinityCatalog, Cache, KeyValueStore};
use affinity_infra::{FileStore, HttpAffinityApi, PersistentCache, RecentlyViewed, RequestExecutor};

use crate::cli::Command;
use crate::config::ExplorerConfig;

pub struct Explorer {
    api: Arc<HttpAffinityApi>,
    recent: RecentlyViewed,
}

impl Explorer {
    /// Open local storage, load the anonymous list and, when `user` is set,
    /// merge it into that user's server list.
    pub async fn open(config: &ExplorerConfig, user: Option<String>) -> anyhow::Result<Self> {
        let path = config.storage_path();
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(&path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        );

        let cache: Arc<dyn Cache> = Arc::new(PersistentCache::new(store.clone()));
        let executor = Arc::new(RequestExecutor::new(&config.client).with_cache(cache));
        let api = Arc::new(HttpAffinityApi::new(executor));

        let recent = RecentlyViewed::new(store, api.clone());
        recent.load().await?;
        if let Some(user) = user {
            recent.sign_in(UserId::new(user)).await?;
        }

        Ok(Self { api, recent })
    }

    pub async fn run(&self, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Affinities { category } => {
                let affinities = self.api.list_all().await?;
                let shown: Vec<&Affinity> = affinities
                    .iter()
                    .filter(|a| match &category {
                        Some(wanted) => a
                            .category
                            .as_deref()
                            .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
                        None => true,
                    })
                    .collect();

                for affinity in &shown {
                    writeln!(out, "{}", summary_line(affinity))?;
                }
                tracing::debug!(total = affinities.len(), shown = shown.len(), "Listed affinities");
            }
            Command::Show { id } => {
                let affinity = self.api.get(&AffinityId::new(id)).await?;
                write_details(out, &affinity)?;

                let entry = RecentlyViewedEntry::from_affinity(&affinity, chrono::Utc::now());
                self.recent.add(entry).await?;
            }
            Command::Recent => {
                write_recent(out, &self.recent.entries().await)?;
            }
            Command::ClearRecent => {
                self.recent.clear().await?;
                writeln!(out, "Recently viewed list cleared")?;
            }
        }
        Ok(())
    }
}

fn summary_line(affinity: &Affinity) -> String {
    let score = affinity
        .average_score
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\t{}\t{}\t{}",
        affinity.id,
        affinity.name,
        affinity.category.as_deref().unwrap_or("-"),
        score
    )
}

fn write_details(out: &mut impl Write, affinity: &Affinity) -> std::io::Result<()> {
    writeln!(out, "{} ({})", affinity.name, affinity.id)?;

    let fields = [
        ("Type", affinity.score_type.clone()),
        ("Category", affinity.category.clone()),
        ("Status", affinity.status.clone()),
        ("Average score", affinity.average_score.map(|s| format!("{s:.1}"))),
        ("Coverage", affinity.coverage.map(|c| format!("{c}%"))),
        ("Definition", affinity.definition.clone()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            writeln!(out, "  {label}: {value}")?;
        }
    }
    if !affinity.applicable_entities.is_empty() {
        writeln!(out, "  Applies to: {}", affinity.applicable_entities.join(", "))?;
    }
    Ok(())
}

fn write_recent(out: &mut impl Write, entries: &[RecentlyViewedEntry]) -> std::io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "No recently viewed affinities");
    }
    for (i, entry) in entries.iter().enumerate() {
        writeln!(
            out,
            "{:>2}. {} {}",
            i + 1,
            entry.id,
            entry.name().unwrap_or("")
        )?;
    }
    Ok(())
}
