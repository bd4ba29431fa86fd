use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dexproxy::config::ResolvedConfig;
use dexproxy::domain::{ResourceKind, ResourceRef};
use dexproxy::error::DexError;
use dexproxy::upstream::{HttpUpstream, UpstreamClient};

fn client_for(server: &MockServer) -> HttpUpstream {
    let mut settings = ResolvedConfig::default().upstream;
    settings.base_url = format!("{}/api/v2", server.uri());
    HttpUpstream::new(&settings).unwrap()
}

#[tokio::test]
async fn fetches_resource_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/pikachu"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 25, "name": "pikachu"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server)
        .fetch(ResourceKind::Entity, &ResourceRef::Name("pikachu".to_string()))
        .await
        .unwrap();
    assert_eq!(value["id"], 25);
}

#[tokio::test]
async fn species_index_uses_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon-species"))
        .and(query_param("limit", "1500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server)
        .fetch(ResourceKind::SpeciesIndex, &ResourceRef::Id(1500))
        .await
        .unwrap();
    assert!(value["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn links_are_followed_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/evolution-chain/10/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 10})))
        .mount(&server)
        .await;

    let link = format!("{}/api/v2/evolution-chain/10/", server.uri());
    let value = client_for(&server)
        .fetch(ResourceKind::EvolutionChain, &ResourceRef::Link(link))
        .await
        .unwrap();
    assert_eq!(value["id"], 10);
}

#[tokio::test]
async fn missing_resource_is_a_404_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch(ResourceKind::Entity, &ResourceRef::Name("missingno".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_matches!(err, DexError::UpstreamStatus { status: 404, .. });
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/type/grass"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch(ResourceKind::Type, &ResourceRef::Name("grass".to_string()))
        .await
        .unwrap_err();
    assert_matches!(err, DexError::Malformed(_));
}
