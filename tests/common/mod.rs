//! In-memory gateways shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use callcoach_intake::enrichment::LeadEnrichmentPipeline;
use callcoach_intake::errors::{AppError, PersistError};
use callcoach_intake::gateways::{PersistenceGateway, ResearchGateway};
use callcoach_intake::intake::IntakeService;
use callcoach_intake::models::{Collection, ResearchRequest, ResearchResponse};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// Records every insert. Results are taken from `script` in order, then `Ok`.
#[derive(Default)]
pub struct InMemoryStore {
    inserts: Mutex<Vec<(Collection, Value)>>,
    script: Mutex<VecDeque<Result<(), PersistError>>>,
    changed: Notify,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(results: Vec<Result<(), PersistError>>) -> Arc<Self> {
        let store = Self::default();
        *store.script.lock().unwrap() = results.into();
        Arc::new(store)
    }

    pub fn inserts(&self) -> Vec<(Collection, Value)> {
        self.inserts.lock().unwrap().clone()
    }

    /// Waits until at least `count` insert attempts were made.
    pub async fn wait_for_inserts(&self, count: usize) -> Vec<(Collection, Value)> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.changed.notified();
                if self.inserts.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("timed out waiting for inserts");
        self.inserts()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryStore {
    async fn insert(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> Result<(), PersistError> {
        let result = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        self.inserts
            .lock()
            .unwrap()
            .extend(records.into_iter().map(|r| (collection, r)));
        self.changed.notify_waiters();
        result
    }
}

/// Answers every research call with the same JSON body or error.
/// When built with `gated`, each call blocks until `release` is called.
pub struct ScriptedResearch {
    answer: Result<Value, String>,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
}

impl ScriptedResearch {
    pub fn answering(body: Value) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(body),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(message.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn gated(body: Value) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(body),
            gate: Some(Semaphore::new(0)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchGateway for ScriptedResearch {
    async fn research_company(
        &self,
        _request: &ResearchRequest,
    ) -> Result<ResearchResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("research gate closed")
                .forget();
        }
        match &self.answer {
            Ok(body) => serde_json::from_value(body.clone())
                .map_err(|e| AppError::ExternalApiError(e.to_string())),
            Err(message) => Err(AppError::ExternalApiError(message.clone())),
        }
    }
}

pub fn intake_service(
    research: Arc<ScriptedResearch>,
    store: Arc<InMemoryStore>,
) -> IntakeService {
    let pipeline = LeadEnrichmentPipeline::new(research, store.clone());
    IntakeService::new(pipeline, store)
}
