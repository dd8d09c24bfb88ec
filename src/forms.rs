//! Headless state for the two intake forms.
//!
//! These hold what a browser form would hold: the typed fields, the status
//! banner and the pending redirect. Rendering is somebody else's job.

use crate::intake::{lead_outcome, IntakeService};
use crate::models::{CommercialProfileInput, LeadSubmission, NavigationRequest, SubmitOutcome, View};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Receives navigation requests (e.g. a router in the embedding UI).
pub trait Navigator: Send + Sync {
    fn navigate(&self, view: View);
}

/// Performs `request` now, or after its delay on a separate task.
pub fn schedule_navigation(navigator: Arc<dyn Navigator>, request: NavigationRequest) {
    if request.delay_ms == 0 {
        navigator.navigate(request.to);
        return;
    }

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(request.delay_ms)).await;
        tracing::debug!("Navigating to {}", request.to.path());
        navigator.navigate(request.to);
    });
}

#[derive(Default)]
struct StatusSlot {
    generation: u64,
    current: Option<SubmitOutcome>,
    pending_clear: Option<JoinHandle<()>>,
}

/// Status banner that can hide itself after a delay.
///
/// Every `set` starts a new generation and aborts the clear timer of the
/// previous one, so a stale timer never wipes a newer message.
#[derive(Clone, Default)]
pub struct TransientStatus {
    slot: Arc<Mutex<StatusSlot>>,
}

impl TransientStatus {
    pub fn current(&self) -> Option<SubmitOutcome> {
        lock(&self.slot).current.clone()
    }

    pub fn set(&self, status: Option<SubmitOutcome>, clear_after: Option<Duration>) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(timer) = slot.pending_clear.take() {
            timer.abort();
        }
        slot.current = status;

        if let Some(delay) = clear_after {
            let generation = slot.generation;
            let weak = Arc::downgrade(&self.slot);
            slot.pending_clear = Some(tokio::spawn(clear_later(weak, generation, delay)));
        }
    }
}

async fn clear_later(slot: Weak<Mutex<StatusSlot>>, generation: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let mut slot = lock(&slot);
    if slot.generation == generation {
        slot.current = None;
        slot.pending_clear = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    CompanyName,
    ContactName,
    Email,
}

/// Landing page "book a demo" form.
pub struct LeadIntakeForm {
    service: IntakeService,
    navigator: Arc<dyn Navigator>,
    fields: LeadSubmission,
    status: TransientStatus,
}

impl LeadIntakeForm {
    pub fn new(service: IntakeService, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            service,
            navigator,
            fields: LeadSubmission::default(),
            status: TransientStatus::default(),
        }
    }

    pub fn set_field(&mut self, field: LeadField, value: impl Into<String>) {
        let value = value.into();
        match field {
            LeadField::CompanyName => self.fields.company_name = value,
            LeadField::ContactName => self.fields.contact_name = value,
            LeadField::Email => self.fields.email = value,
        }
    }

    pub fn fields(&self) -> &LeadSubmission {
        &self.fields
    }

    pub fn status(&self) -> Option<SubmitOutcome> {
        self.status.current()
    }

    /// Shows the outcome and, when valid, empties the fields before the
    /// enrichment task is even created.
    pub fn submit(&mut self) -> SubmitOutcome {
        let outcome = lead_outcome(&self.fields);
        self.status.set(
            Some(outcome.clone()),
            outcome.clear_after_ms.map(Duration::from_millis),
        );

        if outcome.is_success() {
            let snapshot = std::mem::take(&mut self.fields);
            self.service.dispatch_enrichment(snapshot);
        }

        outcome
    }

    pub fn open_dashboard(&self) {
        schedule_navigation(
            Arc::clone(&self.navigator),
            NavigationRequest::immediate(View::Dashboard),
        );
    }
}

/// Sales rep onboarding form.
///
/// `submit` takes `&mut self`, so a second submission cannot start while
/// the first insert is still awaited.
pub struct ProfileIntakeForm {
    service: IntakeService,
    navigator: Arc<dyn Navigator>,
    input: CommercialProfileInput,
    status: Option<SubmitOutcome>,
}

impl ProfileIntakeForm {
    pub fn new(service: IntakeService, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            service,
            navigator,
            input: CommercialProfileInput::default(),
            status: None,
        }
    }

    /// Updates a field by its form name. Returns false for unknown names.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
        let target = match name {
            "nome" => &mut self.input.nome,
            "email" => &mut self.input.email,
            "experiencia_anos" => &mut self.input.experiencia_anos,
            "estilo_abordagem" => &mut self.input.estilo_abordagem,
            "pontos_fortes" => &mut self.input.pontos_fortes,
            "pontos_fracos" => &mut self.input.pontos_fracos,
            "estrategia_vendas" => &mut self.input.estrategia_vendas,
            "tipo_clientes_alvo" => &mut self.input.tipo_clientes_alvo,
            _ => return false,
        };
        *target = value.into();
        true
    }

    pub fn input(&self) -> &CommercialProfileInput {
        &self.input
    }

    pub fn status(&self) -> Option<&SubmitOutcome> {
        self.status.as_ref()
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        self.status = None;
        let outcome = self.service.submit_profile(self.input.clone()).await;

        if let Some(request) = outcome.navigate {
            schedule_navigation(Arc::clone(&self.navigator), request);
        }

        self.status = Some(outcome.clone());
        outcome
    }

    pub fn open_dashboard(&self) {
        schedule_navigation(
            Arc::clone(&self.navigator),
            NavigationRequest::immediate(View::Dashboard),
        );
    }
}
