use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ============ Lead intake ============

/// Prospect data captured by the landing page form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default)]
    #[schema(example = "Acme")]
    pub company_name: String,
    #[serde(default)]
    #[schema(example = "Ana")]
    pub contact_name: String,
    #[serde(default)]
    #[schema(example = "ana@acme.io")]
    pub email: String,
}

impl LeadSubmission {
    pub fn new(
        company_name: impl Into<String>,
        contact_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            contact_name: contact_name.into(),
            email: email.into(),
        }
    }

    /// All three fields must be non-empty. Whitespace is not trimmed.
    pub fn is_complete(&self) -> bool {
        !self.company_name.is_empty() && !self.contact_name.is_empty() && !self.email.is_empty()
    }
}

pub const DEFAULT_SETOR: &str = "tecnologia";
pub const DEFAULT_TAMANHO_EQUIPA: u32 = 10;
pub const DEFAULT_OBJETIVO: &str = "Melhorar processos de vendas";
pub const DEFAULT_ORCAMENTO_EST: &str = "10k-20k";
pub const DEFAULT_URGENCIA: &str = "média";
pub const DEFAULT_EXPERIENCIA_IA: &str = "básica";

/// The five attributes the research step may fill in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentAttributes {
    pub setor: String,
    pub tamanho_equipa: u32,
    pub objetivo: String,
    pub orcamento_est: String,
    pub urgencia: String,
    pub experiencia_ia: String,
}

impl Default for EnrichmentAttributes {
    fn default() -> Self {
        Self {
            setor: DEFAULT_SETOR.to_string(),
            tamanho_equipa: DEFAULT_TAMANHO_EQUIPA,
            objetivo: DEFAULT_OBJETIVO.to_string(),
            orcamento_est: DEFAULT_ORCAMENTO_EST.to_string(),
            urgencia: DEFAULT_URGENCIA.to_string(),
            experiencia_ia: DEFAULT_EXPERIENCIA_IA.to_string(),
        }
    }
}

/// Attributes as returned by the research function.
///
/// Every field is parsed on its own: `null`, an empty string, a zero team size
/// or a value of the wrong JSON type all count as "not supplied" instead of
/// rejecting the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialAttributes {
    #[serde(default, deserialize_with = "lenient_text")]
    pub setor: Option<String>,
    #[serde(default, deserialize_with = "lenient_team_size")]
    pub tamanho_equipa: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub objetivo: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub orcamento_est: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub urgencia: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub experiencia_ia: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_team_size<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let size = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f > 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(size
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok()))
}

/// Body sent to the research function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub company_name: String,
    pub company_website: String,
}

impl ResearchRequest {
    /// The intake form never asks for a website, so it is always sent empty.
    pub fn for_company(company_name: &str) -> Self {
        Self {
            company_name: company_name.to_string(),
            company_website: String::new(),
        }
    }
}

/// Edge function envelope: `{ "success": true, "data": { ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<PartialAttributes>,
}

/// Row written to `clientes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedClientRecord {
    pub nome: String,
    pub empresa: String,
    pub email: String,
    pub setor: String,
    pub tamanho_equipa: u32,
    pub objetivo: String,
    pub orcamento_est: String,
    pub urgencia: String,
    pub experiencia_ia: String,
}

impl EnrichedClientRecord {
    pub fn from_submission(submission: &LeadSubmission, attributes: EnrichmentAttributes) -> Self {
        Self {
            nome: submission.contact_name.clone(),
            empresa: submission.company_name.clone(),
            email: submission.email.clone(),
            setor: attributes.setor,
            tamanho_equipa: attributes.tamanho_equipa,
            objetivo: attributes.objetivo,
            orcamento_est: attributes.orcamento_est,
            urgencia: attributes.urgencia,
            experiencia_ia: attributes.experiencia_ia,
        }
    }
}

// ============ Commercial profiles ============

/// Sales rep self-assessment as typed into the onboarding form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommercialProfileInput {
    #[serde(default)]
    #[schema(example = "Diogo Costa")]
    pub nome: String,
    #[serde(default)]
    #[schema(example = "diogo@empresa.com")]
    pub email: String,
    /// Free text; numbers are accepted too.
    #[serde(default, deserialize_with = "number_or_text")]
    #[schema(example = "5")]
    pub experiencia_anos: String,
    #[serde(default)]
    pub estilo_abordagem: String,
    #[serde(default)]
    pub pontos_fortes: String,
    #[serde(default)]
    pub pontos_fracos: String,
    #[serde(default)]
    pub estrategia_vendas: String,
    #[serde(default)]
    pub tipo_clientes_alvo: String,
}

fn number_or_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Row written to `comerciais`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialProfile {
    pub nome: String,
    pub email: String,
    pub experiencia_anos: Option<i32>,
    pub estilo_abordagem: String,
    pub pontos_fortes: String,
    pub pontos_fracos: String,
    pub estrategia_vendas: String,
    pub tipo_clientes_alvo: String,
}

impl CommercialProfile {
    pub fn from_input(input: CommercialProfileInput) -> Self {
        Self {
            experiencia_anos: parse_years(&input.experiencia_anos),
            nome: input.nome,
            email: input.email,
            estilo_abordagem: input.estilo_abordagem,
            pontos_fortes: input.pontos_fortes,
            pontos_fracos: input.pontos_fracos,
            estrategia_vendas: input.estrategia_vendas,
            tipo_clientes_alvo: input.tipo_clientes_alvo,
        }
    }
}

/// Integer-prefix parse: `"5"` and `"5 anos"` give 5, `""` and `"abc"` give `None`.
pub fn parse_years(raw: &str) -> Option<i32> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1i64, &trimmed[1..]),
        Some(b'+') => (1i64, &trimmed[1..]),
        _ => (1i64, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits
        .parse::<i64>()
        .ok()
        .and_then(|n| i32::try_from(sign * n).ok())
}

// ============ Outcomes & navigation ============

/// Target views the front-end can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Dashboard,
}

impl View {
    pub fn path(&self) -> &'static str {
        match self {
            View::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
    pub to: View,
    pub delay_ms: u64,
}

impl NavigationRequest {
    pub fn immediate(to: View) -> Self {
        Self { to, delay_ms: 0 }
    }

    pub fn after(to: View, delay_ms: u64) -> Self {
        Self { to, delay_ms }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Error,
}

/// Status shown to the person who submitted a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
    pub message: String,
    /// The banner hides itself after this many milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<NavigationRequest>,
}

impl SubmitOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Success,
            message: message.into(),
            clear_after_ms: None,
            navigate: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Error,
            message: message.into(),
            clear_after_ms: None,
            navigate: None,
        }
    }

    pub fn clearing_after(mut self, ms: u64) -> Self {
        self.clear_after_ms = Some(ms);
        self
    }

    pub fn navigating(mut self, request: NavigationRequest) -> Self {
        self.navigate = Some(request);
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}

// ============ Collections ============

/// Tables the intake service writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clientes,
    Comerciais,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Clientes => "clientes",
            Collection::Comerciais => "comerciais",
        }
    }

    /// Columns populated on insert; everything else is left to table defaults.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Collection::Clientes => &[
                "nome",
                "empresa",
                "email",
                "setor",
                "tamanho_equipa",
                "objetivo",
                "orcamento_est",
                "urgencia",
                "experiencia_ia",
            ],
            Collection::Comerciais => &[
                "nome",
                "email",
                "experiencia_anos",
                "estilo_abordagem",
                "pontos_fortes",
                "pontos_fracos",
                "estrategia_vendas",
                "tipo_clientes_alvo",
            ],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
