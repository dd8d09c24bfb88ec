/// Background enrichment of submitted leads
///
/// Once a lead is accepted the submitter is already looking at a success
/// message, so everything here is best-effort:
/// 1. Research the company through the research function
/// 2. Merge whatever came back with the per-field defaults
/// 3. Insert the record into `clientes`
/// 4. If that insert fails, insert once more with all defaults
/// 5. If that fails too, log it and give up
use crate::gateways::{insert_record, PersistenceGateway, ResearchGateway};
use crate::models::{
    Collection, EnrichedClientRecord, EnrichmentAttributes, LeadSubmission, PartialAttributes,
    ResearchRequest, ResearchResponse,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// Fills every attribute the research step did not supply with its default.
pub fn merge_with_defaults(
    partial: &PartialAttributes,
    defaults: &EnrichmentAttributes,
) -> EnrichmentAttributes {
    EnrichmentAttributes {
        setor: partial.setor.clone().unwrap_or_else(|| defaults.setor.clone()),
        tamanho_equipa: partial.tamanho_equipa.unwrap_or(defaults.tamanho_equipa),
        objetivo: partial
            .objetivo
            .clone()
            .unwrap_or_else(|| defaults.objetivo.clone()),
        orcamento_est: partial
            .orcamento_est
            .clone()
            .unwrap_or_else(|| defaults.orcamento_est.clone()),
        urgencia: partial
            .urgencia
            .clone()
            .unwrap_or_else(|| defaults.urgencia.clone()),
        experiencia_ia: partial
            .experiencia_ia
            .clone()
            .unwrap_or_else(|| defaults.experiencia_ia.clone()),
    }
}

/// How a background enrichment ended. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Stored with attributes from the research response.
    Enriched,
    /// Research gave nothing usable; stored with defaults on the first attempt.
    Defaulted,
    /// First insert failed; the all-defaults fallback insert succeeded.
    FallbackPersisted,
    /// Both inserts failed. Nothing was stored.
    Lost,
}

/// Counts enrichment tasks still running so shutdown can wait for them.
#[derive(Debug, Default)]
pub struct JobTracker {
    active: AtomicUsize,
    idle: Notify,
}

impl JobTracker {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn start(self: &Arc<Self>) -> JobGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        JobGuard(Arc::clone(self))
    }

    /// Resolves once no task is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Waits for running tasks, up to `limit`. Returns how many were still running.
    pub async fn drain(&self, limit: Duration) -> usize {
        if tokio::time::timeout(limit, self.wait_idle()).await.is_err() {
            tracing::warn!(
                "Shutdown drain timed out with {} enrichment task(s) still running",
                self.active()
            );
        }
        self.active()
    }
}

struct JobGuard(Arc<JobTracker>);

impl Drop for JobGuard {
    fn drop(&mut self) {
        if self.0.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

#[derive(Clone)]
pub struct LeadEnrichmentPipeline {
    research: Arc<dyn ResearchGateway>,
    store: Arc<dyn PersistenceGateway>,
    jobs: Arc<JobTracker>,
}

impl LeadEnrichmentPipeline {
    pub fn new(research: Arc<dyn ResearchGateway>, store: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            research,
            store,
            jobs: Arc::new(JobTracker::default()),
        }
    }

    pub fn jobs(&self) -> Arc<JobTracker> {
        Arc::clone(&self.jobs)
    }

    /// Runs the pipeline on its own tokio task.
    ///
    /// The task owns a clone of the pipeline and the snapshot, so it keeps
    /// running after the request or form that started it is gone. Dropping the
    /// returned handle does not cancel it.
    pub fn spawn(&self, snapshot: LeadSubmission) -> JoinHandle<EnrichmentOutcome> {
        let pipeline = self.clone();
        let guard = self.jobs.start();
        let lead_ref = Uuid::new_v4();
        let span = tracing::info_span!(
            "lead_enrichment",
            lead_ref = %lead_ref,
            company = %snapshot.company_name
        );

        tokio::spawn(
            async move {
                let _guard = guard;
                pipeline.run(snapshot).await
            }
            .instrument(span),
        )
    }

    /// Researches, merges and persists one lead. Never returns an error:
    /// every failure is logged and absorbed.
    pub async fn run(&self, snapshot: LeadSubmission) -> EnrichmentOutcome {
        tracing::info!("🔍 Starting background research");

        let (attributes, researched) = self.research_attributes(&snapshot).await;
        let record = EnrichedClientRecord::from_submission(&snapshot, attributes);
        tracing::debug!("💾 Inserting client: {:?}", record);

        match insert_record(self.store.as_ref(), Collection::Clientes, &record).await {
            Ok(()) if researched => {
                tracing::info!("✅ Client stored with research data");
                return EnrichmentOutcome::Enriched;
            }
            Ok(()) => {
                tracing::info!("✅ Client stored with default attributes");
                return EnrichmentOutcome::Defaulted;
            }
            Err(e) => {
                tracing::warn!("❌ Failed to insert client: {}", e);
            }
        }

        tracing::info!("🔄 Fallback: inserting with default data");
        let fallback =
            EnrichedClientRecord::from_submission(&snapshot, EnrichmentAttributes::default());

        match insert_record(self.store.as_ref(), Collection::Clientes, &fallback).await {
            Ok(()) => {
                tracing::info!("✅ Client stored by fallback insert");
                EnrichmentOutcome::FallbackPersisted
            }
            Err(e) => {
                tracing::error!(
                    "❌ Fallback insert also failed, lead for {} was not stored: {}",
                    snapshot.company_name,
                    e
                );
                EnrichmentOutcome::Lost
            }
        }
    }

    /// Returns the merged attributes and whether they came from research.
    async fn research_attributes(&self, snapshot: &LeadSubmission) -> (EnrichmentAttributes, bool) {
        let request = ResearchRequest::for_company(&snapshot.company_name);
        let defaults = EnrichmentAttributes::default();

        match self.research.research_company(&request).await {
            Ok(ResearchResponse {
                data: Some(partial),
                ..
            }) => {
                tracing::debug!("📊 Research response: {:?}", partial);
                (merge_with_defaults(&partial, &defaults), true)
            }
            Ok(_) => {
                tracing::warn!("❌ No data returned from research");
                (defaults, false)
            }
            Err(e) => {
                tracing::warn!("❌ Research error: {}", e);
                (defaults, false)
            }
        }
    }
}
