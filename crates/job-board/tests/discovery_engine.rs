//! Offer discovery driven end to end through the real client.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use serde_json::json;

use common::{FakeBackend, Reply};
use job_board::discovery::{
    spawn_refresh_loop, CycleOutcome, DiscoveryEngine, OfferBrowser, ORGANIZATION_PLACEHOLDER,
};

fn offer(id: i64, title: &str, organization: &str, published: &str) -> serde_json::Value {
    json!({
        "id_oferta": id,
        "titulo": title,
        "descripcion": "",
        "requisitos": "",
        "tipo_contrato": "Internship",
        "ubicacion": "Bogotá",
        "salario": "1800000",
        "fecha_publicacion": published,
        "fecha_cierre": null,
        "id_organizacion": organization
    })
}

fn three_offers(backend: &FakeBackend) {
    backend
        .reply(
            Method::GET,
            "/offers",
            Reply::Json(
                200,
                json!({"data": [
                    offer(1, "Practicante de datos", "org-1", "2025-03-01T10:00:00.000Z"),
                    offer(2, "Analista QA", "org-5", "2025-03-03T10:00:00.000Z"),
                    offer(3, "Desarrollador backend", "org-1", "2025-03-02T10:00:00.000Z"),
                ]}),
            ),
        )
        .reply(
            Method::GET,
            "/organizations/org-1",
            Reply::Json(200, json!({"id_organizacion": "org-1", "nombre": "Alcaldía de Bogotá"})),
        )
        .reply(Method::GET, "/organizations/org-5", Reply::Empty(500));
}

#[tokio::test]
async fn wrapped_payload_renders_every_offer_with_names() {
    let backend = FakeBackend::start().await;
    three_offers(&backend);
    let engine = DiscoveryEngine::new(backend.client());

    assert_eq!(engine.refresh().await, CycleOutcome::Committed);

    let offers = engine.offers();
    assert_eq!(offers.len(), 3);
    let name_of = |id: i64| {
        offers
            .iter()
            .find(|offer| offer.id == id)
            .map(|offer| offer.organization_name.clone())
            .expect("offer present")
    };
    assert_eq!(name_of(1), "Alcaldía de Bogotá");
    assert_eq!(name_of(3), "Alcaldía de Bogotá");
    assert_eq!(name_of(2), ORGANIZATION_PLACEHOLDER);

    assert_eq!(backend.calls_to(Method::GET, "/organizations/org-1").len(), 1);
    assert_eq!(backend.calls_to(Method::GET, "/organizations/org-5").len(), 1);
}

#[tokio::test]
async fn names_are_not_looked_up_again_on_later_refreshes() {
    let backend = FakeBackend::start().await;
    three_offers(&backend);
    let engine = DiscoveryEngine::new(backend.client());

    engine.refresh().await;
    engine.refresh().await;

    assert_eq!(backend.calls_to(Method::GET, "/offers").len(), 2);
    assert_eq!(backend.calls_to(Method::GET, "/organizations/org-1").len(), 1);
    assert_eq!(backend.calls_to(Method::GET, "/organizations/org-5").len(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_the_last_good_list() {
    let backend = FakeBackend::start().await;
    three_offers(&backend);
    let engine = DiscoveryEngine::new(backend.client());
    engine.refresh().await;

    backend.reply(
        Method::GET,
        "/offers",
        Reply::Text(503, "Service Unavailable".to_string()),
    );
    assert_eq!(engine.refresh().await, CycleOutcome::Failed);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.offers.len(), 3);
    assert_eq!(snapshot.error.as_deref(), Some("Service Unavailable"));
}

#[tokio::test]
async fn filters_are_accent_insensitive_and_sorted_newest_first() {
    let backend = FakeBackend::start().await;
    three_offers(&backend);
    let engine = DiscoveryEngine::new(backend.client());
    engine.refresh().await;

    let offers = engine.offers();
    let mut browser = OfferBrowser::default();
    browser.set_organization_filter("bogota");

    let ids: Vec<i64> = browser.page(&offers).items.iter().map(|offer| offer.id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn refresh_loop_polls_until_shut_down() {
    let backend = FakeBackend::start().await;
    three_offers(&backend);
    let engine = Arc::new(DiscoveryEngine::new(backend.client()));

    let handle = spawn_refresh_loop(Arc::clone(&engine), Duration::from_secs(3600));
    for _ in 0..100 {
        if engine.offers().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(engine.offers().len(), 3);

    assert!(handle.refresh_now());
    for _ in 0..100 {
        if backend.calls_to(Method::GET, "/offers").len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(backend.calls_to(Method::GET, "/offers").len() >= 2);

    handle.shutdown().await;
}
