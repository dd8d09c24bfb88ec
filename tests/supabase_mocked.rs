/// Integration tests with a mocked Supabase project
/// Covers the REST insert and Edge Function surfaces without hitting a real project
use callcoach_intake::enrichment::{EnrichmentOutcome, LeadEnrichmentPipeline};
use callcoach_intake::errors::PersistError;
use callcoach_intake::gateways::{PersistenceGateway, ResearchGateway};
use callcoach_intake::models::{Collection, LeadSubmission, ResearchRequest};
use callcoach_intake::supabase_client::SupabaseClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a client pointing at the mock server
fn create_test_client(base_url: String) -> SupabaseClient {
    SupabaseClient::new(
        base_url,
        "test-anon-key".to_string(),
        "research-company".to_string(),
        Duration::from_secs(5),
    )
    .expect("client should build")
}

#[tokio::test]
async fn test_insert_sends_auth_headers_and_row_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comerciais"))
        .and(header("apikey", "test-anon-key"))
        .and(header("Authorization", "Bearer test-anon-key"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(json!([{ "nome": "Diogo", "email": "diogo@empresa.com" }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client
        .insert(
            Collection::Comerciais,
            vec![json!({ "nome": "Diogo", "email": "diogo@empresa.com" })],
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_insert_conflict_is_uniqueness() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comerciais"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (email)=(diogo@empresa.com) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"comerciais_email_key\""
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client
        .insert(Collection::Comerciais, vec![json!({ "email": "diogo@empresa.com" })])
        .await;

    assert_eq!(result, Err(PersistError::Uniqueness));
}

#[tokio::test]
async fn test_unique_violation_code_without_conflict_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/comerciais"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "23505",
            "message": "violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client
        .insert(Collection::Comerciais, vec![json!({ "email": "diogo@empresa.com" })])
        .await;

    assert!(result.unwrap_err().is_uniqueness());
}

#[tokio::test]
async fn test_insert_server_error_is_not_uniqueness() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/clientes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client
        .insert(Collection::Clientes, vec![json!({ "nome": "Ana" })])
        .await;

    match result {
        Err(PersistError::Other(msg)) => assert!(msg.contains("upstream unavailable")),
        other => panic!("expected a generic failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_research_function_returns_partial_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/research-company"))
        .and(header("apikey", "test-anon-key"))
        .and(body_json(json!({ "companyName": "Acme", "companyWebsite": "" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "setor": "saas", "tamanho_equipa": "25", "urgencia": "" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let response = client
        .research_company(&ResearchRequest::for_company("Acme"))
        .await
        .expect("research should succeed");

    let data = response.data.expect("data should be present");
    assert_eq!(data.setor.as_deref(), Some("saas"));
    assert_eq!(data.tamanho_equipa, Some(25));
    assert_eq!(data.urgencia, None);
    assert_eq!(data.objetivo, None);
}

#[tokio::test]
async fn test_research_function_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/research-company"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri());
    let result = client
        .research_company(&ResearchRequest::for_company("Acme"))
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("500"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_pipeline_falls_back_when_first_insert_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/research-company"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "setor": "saas" }
        })))
        .mount(&mock_server)
        .await;

    // Enriched row is refused
    Mock::given(method("POST"))
        .and(path("/rest/v1/clientes"))
        .and(body_json(json!([{
            "nome": "Ana",
            "empresa": "Acme",
            "email": "ana@acme.io",
            "setor": "saas",
            "tamanho_equipa": 10,
            "objetivo": "Melhorar processos de vendas",
            "orcamento_est": "10k-20k",
            "urgencia": "média",
            "experiencia_ia": "básica"
        }])))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "22P02",
            "message": "invalid input syntax"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // All-defaults row goes through
    Mock::given(method("POST"))
        .and(path("/rest/v1/clientes"))
        .and(body_json(json!([{
            "nome": "Ana",
            "empresa": "Acme",
            "email": "ana@acme.io",
            "setor": "tecnologia",
            "tamanho_equipa": 10,
            "objetivo": "Melhorar processos de vendas",
            "orcamento_est": "10k-20k",
            "urgencia": "média",
            "experiencia_ia": "básica"
        }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(create_test_client(mock_server.uri()));
    let pipeline = LeadEnrichmentPipeline::new(client.clone(), client);

    let outcome = pipeline
        .run(LeadSubmission::new("Acme", "Ana", "ana@acme.io"))
        .await;

    assert_eq!(outcome, EnrichmentOutcome::FallbackPersisted);
}

#[tokio::test]
async fn test_pipeline_with_unreachable_research_stores_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/research-company"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/clientes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(create_test_client(mock_server.uri()));
    let pipeline = LeadEnrichmentPipeline::new(client.clone(), client);

    let outcome = pipeline
        .spawn(LeadSubmission::new("Acme", "Ana", "ana@acme.io"))
        .await
        .expect("task should not panic");

    assert_eq!(outcome, EnrichmentOutcome::Defaulted);
}
