//! Registry collaborators.

pub mod chembl;

use async_trait::async_trait;

use ferroscreen_common::ScreenError;

use crate::models::{ActivityQuery, BioactivityRecord, StructureRecord, TargetRecord};

/// Resolves an external protein accession to registry targets.
#[async_trait]
pub trait TargetSource: Send + Sync {
    /// All targets matching `accession`, in registry order.
    async fn targets_for_accession(&self, accession: &str) -> Result<Vec<TargetRecord>, ScreenError>;
}

#[async_trait]
pub trait BioactivitySource: Send + Sync {
    /// Every activity row matching the query.
    async fn bioactivities(&self, query: &ActivityQuery) -> Result<Vec<BioactivityRecord>, ScreenError>;
}

#[async_trait]
pub trait StructureSource: Send + Sync {
    /// Structure records for the given compound ids. Ids unknown to the
    /// registry are simply absent from the result.
    async fn structures(&self, compound_ids: &[String]) -> Result<Vec<StructureRecord>, ScreenError>;
}
