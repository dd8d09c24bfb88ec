//! Submission logic shared by the HTTP handlers and the form models.

use crate::enrichment::LeadEnrichmentPipeline;
use crate::gateways::{insert_record, PersistenceGateway};
use crate::models::{
    Collection, CommercialProfile, CommercialProfileInput, LeadSubmission, NavigationRequest,
    SubmitOutcome, View,
};
use std::sync::Arc;

pub const LEAD_FIELDS_REQUIRED: &str = "Please fill in all fields";
pub const LEAD_RECEIVED: &str = "✅ Thanks! We'll be in touch soon.";
/// How long the lead success banner stays visible.
pub const LEAD_STATUS_CLEAR_MS: u64 = 3000;

pub const PROFILE_FIELDS_REQUIRED: &str = "Nome e email são obrigatórios";
pub const PROFILE_CREATED: &str = "✅ Perfil criado com sucesso!";
pub const PROFILE_EMAIL_TAKEN: &str = "Este email já está registado";
pub const PROFILE_FAILED: &str = "Erro ao criar perfil. Tenta novamente.";
/// Delay before a new profile is sent on to the dashboard.
pub const PROFILE_REDIRECT_MS: u64 = 2000;

/// What the submitter sees for a lead, decided before any I/O.
pub fn lead_outcome(submission: &LeadSubmission) -> SubmitOutcome {
    if submission.is_complete() {
        SubmitOutcome::success(LEAD_RECEIVED).clearing_after(LEAD_STATUS_CLEAR_MS)
    } else {
        tracing::debug!("Lead rejected: missing required field");
        SubmitOutcome::error(LEAD_FIELDS_REQUIRED)
    }
}

#[derive(Clone)]
pub struct IntakeService {
    pipeline: LeadEnrichmentPipeline,
    store: Arc<dyn PersistenceGateway>,
}

impl IntakeService {
    pub fn new(pipeline: LeadEnrichmentPipeline, store: Arc<dyn PersistenceGateway>) -> Self {
        Self { pipeline, store }
    }

    pub fn pipeline(&self) -> &LeadEnrichmentPipeline {
        &self.pipeline
    }

    /// Accepts a lead and answers immediately.
    ///
    /// Success is reported before anything is persisted; research and insert
    /// run on a detached task whose result never comes back here. Must be
    /// called from within a tokio runtime.
    pub fn submit_lead(&self, submission: LeadSubmission) -> SubmitOutcome {
        let outcome = lead_outcome(&submission);
        if outcome.is_success() {
            self.dispatch_enrichment(submission);
        }
        outcome
    }

    /// Hands a validated snapshot to the enrichment pipeline and forgets about it.
    pub fn dispatch_enrichment(&self, snapshot: LeadSubmission) {
        tracing::info!("Lead accepted for {}", snapshot.company_name);
        // Handle dropped on purpose: the task outlives this call.
        drop(self.pipeline.spawn(snapshot));
    }

    /// Creates a sales rep profile and waits for the store to answer.
    /// No fallback insert is ever attempted.
    pub async fn create_profile(
        &self,
        input: CommercialProfileInput,
    ) -> Result<(), ProfileRejection> {
        if input.nome.is_empty() || input.email.is_empty() {
            return Err(ProfileRejection::MissingFields);
        }

        let profile = CommercialProfile::from_input(input);

        match insert_record(self.store.as_ref(), Collection::Comerciais, &profile).await {
            Ok(()) => {
                tracing::info!("Profile created for {}", profile.email);
                Ok(())
            }
            Err(e) if e.is_uniqueness() => {
                tracing::info!("Profile rejected, email already registered: {}", profile.email);
                Err(ProfileRejection::EmailTaken)
            }
            Err(e) => {
                tracing::error!("Error creating profile: {}", e);
                Err(ProfileRejection::Failed)
            }
        }
    }

    /// `create_profile` rendered as the status the form shows.
    pub async fn submit_profile(&self, input: CommercialProfileInput) -> SubmitOutcome {
        profile_outcome(self.create_profile(input).await)
    }
}

/// Why a profile was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRejection {
    MissingFields,
    EmailTaken,
    Failed,
}

impl ProfileRejection {
    pub fn message(&self) -> &'static str {
        match self {
            ProfileRejection::MissingFields => PROFILE_FIELDS_REQUIRED,
            ProfileRejection::EmailTaken => PROFILE_EMAIL_TAKEN,
            ProfileRejection::Failed => PROFILE_FAILED,
        }
    }
}

pub fn profile_outcome(result: Result<(), ProfileRejection>) -> SubmitOutcome {
    match result {
        Ok(()) => SubmitOutcome::success(PROFILE_CREATED)
            .navigating(NavigationRequest::after(View::Dashboard, PROFILE_REDIRECT_MS)),
        Err(rejection) => SubmitOutcome::error(rejection.message()),
    }
}
