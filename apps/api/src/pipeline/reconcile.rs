//! Reconciliation pass — restores consistency between the document store and
//! the vector store.
//!
//! A profile row without a vector (vector upsert failed during ingestion, or
//! the vector database was lost) is repaired by re-running synthesis + upsert.
//! A vector without a profile row (profile removed while the index was
//! unreachable) is evicted. Never silently ignored: everything touched is
//! reported.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pipeline::load_profiles;
use crate::semantic::{IndexError, SemanticIndex, UpsertOutcome};
use crate::synthesis;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Profiles inspected.
    pub checked: usize,
    /// Profile ids whose vector was (re)written.
    pub repaired: Vec<String>,
    /// Profile ids whose vector could not be written (index unavailable).
    pub failed: Vec<String>,
    /// Vector ids with no matching profile, now evicted.
    pub orphans_removed: Vec<String>,
}

/// Re-synthesizes and upserts every profile, then evicts orphan vectors.
/// Upserting is cheap for consistent rows: unchanged search text is not
/// re-embedded.
pub async fn reconcile(
    pool: &SqlitePool,
    index: &SemanticIndex,
) -> Result<ReconcileReport, AppError> {
    let profiles = load_profiles(pool).await?;

    let mut report = ReconcileReport {
        checked: profiles.len(),
        ..ReconcileReport::default()
    };
    let profile_ids: BTreeSet<String> = profiles.iter().map(|p| p.id.clone()).collect();

    for profile in &profiles {
        let search_text = synthesis::synthesize_cv(&profile.record, &profile.raw_text);
        match index.upsert(&profile.id, &search_text).await {
            Ok(UpsertOutcome::Embedded) => report.repaired.push(profile.id.clone()),
            Ok(UpsertOutcome::Unchanged) => {}
            Err(IndexError::Unavailable(reason)) => {
                warn!("cannot repair vector for {}: index unavailable ({reason})", profile.id);
                report.failed.push(profile.id.clone());
            }
            Err(IndexError::Embedding(reason)) => {
                warn!("cannot repair vector for {}: {reason}", profile.id);
                report.failed.push(profile.id.clone());
            }
            Err(e @ IndexError::Database(_)) => return Err(e.into()),
        }
    }

    for vector_id in index.list_ids().await? {
        if !profile_ids.contains(&vector_id) {
            index.remove(&vector_id).await?;
            report.orphans_removed.push(vector_id);
        }
    }

    info!(
        "reconciliation: {} checked, {} repaired, {} failed, {} orphans removed",
        report.checked,
        report.repaired.len(),
        report.failed.len(),
        report.orphans_removed.len()
    );
    Ok(report)
}
