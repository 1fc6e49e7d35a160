//! End-to-end tests for the salary tax engine HTTP API.
//!
//! This test suite covers:
//! - The reference old-versus-new scenario for FY 2023-24
//! - Regime selection and the comparison summary
//! - Rebate, surcharge and capital-gains paths through the full pipeline
//! - Rule-set caching and the health endpoint
//! - Error cases and their status codes

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

use salary_tax_engine::api::{AppState, create_router};
use salary_tax_engine::config::YamlRuleSource;
use salary_tax_engine::engine::TaxEngine;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_router_for_dir(dir: impl Into<PathBuf>) -> Router {
    create_router(AppState::new(TaxEngine::new(YamlRuleSource::new(dir))))
}

fn create_router_for_test() -> Router {
    create_router_for_dir("./config/rules")
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, json)
}

async fn post_compare(router: Router, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri("/compare")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn get_health(router: Router) -> (StatusCode, Value) {
    send(
        router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await
}

/// The reference profile: metro renter with 80C and 80D declarations.
fn scenario_profile() -> Value {
    json!({
        "basic": "600000",
        "house_rent_allowance": "300000",
        "special_allowance": "450000",
        "bonus": "75000",
        "metro": true,
        "rent_paid": "360000",
        "employee_retirement_percent": "12",
        "employer_retirement_percent": "12",
        "state": "KA",
        "age": 32,
        "declared_investments": { "80c": "150000", "80d": "25000" }
    })
}

fn simple_profile(basic: &str) -> Value {
    json!({ "basic": basic, "age": 30 })
}

/// Reads a decimal field by JSON pointer, e.g. "/results/old/tax/total".
fn dec_at(value: &Value, pointer: &str) -> Decimal {
    let raw = value
        .pointer(pointer)
        .unwrap_or_else(|| panic!("missing {} in {}", pointer, value));
    match raw {
        Value::String(s) => decimal(s),
        other => decimal(&other.to_string()),
    }
}

/// Writes a rule file for one fiscal year into a fresh temporary directory.
fn rules_dir_with(fiscal_year: &str, yaml: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("salary-tax-rules-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}.yaml", fiscal_year)), yaml).unwrap();
    dir
}

const NEW_ONLY_RULES: &str = r#"
fiscal_year: "2030-31"
standard_deduction: 75000
cess_rate: "0.04"
hra: { metro_factor: "0.50", non_metro_factor: "0.40", rent_offset_factor: "0.10" }
regimes:
  new:
    slabs:
      - { lower: 0, upper: 400000, rate: 0 }
      - { lower: 400000, rate: "0.10" }
"#;

const GAPPED_RULES: &str = r#"
fiscal_year: "2030-31"
standard_deduction: 75000
hra: { metro_factor: "0.50", non_metro_factor: "0.40", rent_offset_factor: "0.10" }
regimes:
  new:
    slabs:
      - { lower: 0, upper: 400000, rate: 0 }
      - { lower: 500000, rate: "0.10" }
"#;

// =============================================================================
// Reference Scenario (FY 2023-24)
// =============================================================================

#[tokio::test]
async fn test_scenario_old_regime_breakdown() {
    let (status, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "profile": scenario_profile() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_at(&result, "/results/old/gross_salary"), decimal("1425000"));
    assert_eq!(dec_at(&result, "/results/old/exemptions/hra"), decimal("300000"));
    assert_eq!(dec_at(&result, "/results/old/total_deductions"), decimal("175000"));
    assert_eq!(dec_at(&result, "/results/old/taxable_income"), decimal("897600"));
    assert_eq!(dec_at(&result, "/results/old/tax/total"), decimal("95700"));
    assert_eq!(dec_at(&result, "/results/old/monthly_take_home"), decimal("104575"));
}

#[tokio::test]
async fn test_scenario_new_regime_breakdown() {
    let (status, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "profile": scenario_profile() }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_at(&result, "/results/new/exemptions/hra"), Decimal::ZERO);
    assert_eq!(dec_at(&result, "/results/new/taxable_income"), decimal("1375000"));
    assert_eq!(dec_at(&result, "/results/new/tax/total"), decimal("130000"));
    assert_eq!(dec_at(&result, "/results/new/monthly_take_home"), decimal("101717"));
}

#[tokio::test]
async fn test_scenario_difference_and_recommendation() {
    let (_, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "profile": scenario_profile() }),
    )
    .await;

    let old_tax = dec_at(&result, "/results/old/tax/total");
    let new_tax = dec_at(&result, "/results/new/tax/total");
    assert_eq!(new_tax - old_tax, decimal("34300"));

    assert_eq!(result["summary"]["recommended_regime"], "old");
    assert_eq!(dec_at(&result, "/summary/annual_savings"), decimal("34300"));

    let gross_monthly = decimal("1425000") / Decimal::from(12);
    for regime in ["old", "new"] {
        let monthly = dec_at(&result, &format!("/results/{}/monthly_take_home", regime));
        assert!(monthly > Decimal::ZERO);
        assert!(monthly < gross_monthly);
    }
}

#[tokio::test]
async fn test_take_home_reconciles_for_every_regime() {
    let mut profile = scenario_profile();
    profile["short_term_gains"] = json!("80000");
    profile["long_term_gains"] = json!("300000");

    let (_, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2024-25", "profile": profile }),
    )
    .await;

    for regime in ["old", "new"] {
        let base = format!("/results/{}", regime);
        let gross = dec_at(&result, &format!("{}/gross_salary", base));
        let statutory = dec_at(&result, &format!("{}/employee_statutory_deductions", base));
        let tax = dec_at(&result, &format!("{}/tax/total", base));
        let gains_tax = dec_at(&result, &format!("{}/capital_gains_tax", base));
        let annual = dec_at(&result, &format!("{}/annual_take_home", base));

        assert_eq!(gross - statutory - tax - gains_tax, annual, "regime {}", regime);
        assert!(gains_tax > Decimal::ZERO);
    }
}

#[tokio::test]
async fn test_audit_trace_cites_sections() {
    let (_, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "regimes": ["old"], "profile": scenario_profile() }),
    )
    .await;

    let sections: Vec<&str> = result["results"]["old"]["audit_trace"]
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["section_ref"].as_str().unwrap())
        .collect();

    for expected in ["17(1)", "10(13A)", "16(ia)", "VI-A", "87A", "288B"] {
        assert!(sections.contains(&expected), "missing {} in {:?}", expected, sections);
    }
}

// =============================================================================
// Regime Selection
// =============================================================================

#[tokio::test]
async fn test_requested_regime_only() {
    let (status, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2024-25", "regimes": ["new"], "profile": simple_profile("1500000") }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = result["results"].as_object().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results.contains_key("new"));
    assert_eq!(dec_at(&result, "/summary/annual_savings"), Decimal::ZERO);
}

#[tokio::test]
async fn test_fiscal_year_aliases_are_canonicalised() {
    let (status, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "FY2024-2025", "profile": simple_profile("900000") }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["fiscal_year"], "2024-25");
}

#[tokio::test]
async fn test_unsupported_regime_returns_422() {
    let dir = rules_dir_with("2030-31", NEW_ONLY_RULES);
    let (status, error) = post_compare(
        create_router_for_dir(&dir),
        json!({ "fiscal_year": "2030-31", "regimes": ["old", "new"], "profile": simple_profile("900000") }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "UNSUPPORTED_REGIME");
    assert!(error["message"].as_str().unwrap().contains("old"));

    // The same year still answers for the regime it does define
    let (status, result) = post_compare(
        create_router_for_dir(&dir),
        json!({ "fiscal_year": "2030-31", "profile": simple_profile("900000") }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["results"].as_object().unwrap().len(), 1);

    std::fs::remove_dir_all(dir).ok();
}

// =============================================================================
// Rebate, Surcharge and Capital Gains
// =============================================================================

#[tokio::test]
async fn test_fy2025_new_regime_zero_tax_up_to_twelve_lakh() {
    // 12.75L salary less 75k standard deduction = 12L taxable
    let (_, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2025-26", "regimes": ["new"], "profile": simple_profile("1275000") }),
    )
    .await;

    assert_eq!(dec_at(&result, "/results/new/taxable_income"), decimal("1200000"));
    assert_eq!(dec_at(&result, "/results/new/tax/rebate"), decimal("60000"));
    assert_eq!(dec_at(&result, "/results/new/tax/total"), Decimal::ZERO);
}

#[tokio::test]
async fn test_marginal_relief_just_above_rebate_threshold() {
    // 12.76L salary = 12.01L taxable; tax limited to the 1,000 excess plus cess
    let (_, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2025-26", "regimes": ["new"], "profile": simple_profile("1276000") }),
    )
    .await;

    assert_eq!(dec_at(&result, "/results/new/taxable_income"), decimal("1201000"));
    assert_eq!(dec_at(&result, "/results/new/tax/total"), decimal("1040"));
}

#[tokio::test]
async fn test_surcharge_applies_to_high_income() {
    let (_, result) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "regimes": ["old"], "profile": simple_profile("6050000") }),
    )
    .await;

    // 60L taxable: base 16,12,500 with a full 10% surcharge
    assert_eq!(dec_at(&result, "/results/old/taxable_income"), decimal("6000000"));
    assert_eq!(dec_at(&result, "/results/old/tax/surcharge"), decimal("161250"));
}

#[tokio::test]
async fn test_senior_citizen_pays_less_under_old_regime() {
    let mut senior = simple_profile("1000000");
    senior["age"] = json!(70);

    let (_, young) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "regimes": ["old"], "profile": simple_profile("1000000") }),
    )
    .await;
    let (_, old_age) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "regimes": ["old"], "profile": senior }),
    )
    .await;

    assert_eq!(
        dec_at(&young, "/results/old/tax/base_tax") - dec_at(&old_age, "/results/old/tax/base_tax"),
        decimal("2500")
    );
}

// =============================================================================
// Caching and Health
// =============================================================================

#[tokio::test]
async fn test_concurrent_requests_share_cached_rules() {
    let router = create_router_for_test();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move {
                post_compare(
                    router,
                    json!({ "fiscal_year": "2024-25", "profile": scenario_profile() }),
                )
                .await
            })
        })
        .collect();

    let mut totals = Vec::new();
    for handle in handles {
        let (status, result) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        totals.push(dec_at(&result, "/results/old/tax/total"));
    }
    assert!(totals.iter().all(|t| *t == totals[0]));

    let (status, health) = get_health(router).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["cached_fiscal_years"], json!(["2024-25"]));
}

#[tokio::test]
async fn test_health_before_any_request() {
    let (status, health) = get_health(create_router_for_test()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["cached_fiscal_years"], json!([]));
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_unknown_fiscal_year_returns_404() {
    let (status, error) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2010-11", "profile": simple_profile("900000") }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "UNKNOWN_FISCAL_YEAR");
}

#[tokio::test]
async fn test_unparseable_fiscal_year_returns_404() {
    let (status, error) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "next year", "profile": simple_profile("900000") }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "UNKNOWN_FISCAL_YEAR");
}

#[tokio::test]
async fn test_negative_amount_returns_400() {
    let mut profile = scenario_profile();
    profile["rent_paid"] = json!("-1000");

    let (status, error) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "profile": profile }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_PROFILE");
    assert!(error["message"].as_str().unwrap().contains("rent_paid"));
}

#[tokio::test]
async fn test_minor_returns_400() {
    let (status, error) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "profile": { "basic": "300000", "age": 16 } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_PROFILE");
}

#[tokio::test]
async fn test_unknown_regime_name_returns_400() {
    let (status, error) = post_compare(
        create_router_for_test(),
        json!({ "fiscal_year": "2023-24", "regimes": ["flat"], "profile": simple_profile("900000") }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let (status, error) = send(
        create_router_for_test(),
        Request::builder()
            .method("POST")
            .uri("/compare")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"fiscal_year\": "))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_missing_content_type_returns_400() {
    let (status, error) = send(
        create_router_for_test(),
        Request::builder()
            .method("POST")
            .uri("/compare")
            .body(Body::from(
                json!({ "fiscal_year": "2023-24", "profile": simple_profile("1") }).to_string(),
            ))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MISSING_CONTENT_TYPE");
}

#[tokio::test]
async fn test_malformed_rule_file_returns_500() {
    let dir = rules_dir_with("2030-31", GAPPED_RULES);
    let (status, error) = post_compare(
        create_router_for_dir(&dir),
        json!({ "fiscal_year": "2030-31", "profile": simple_profile("900000") }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error["code"], "RULE_SET_ERROR");
    assert!(error["message"].as_str().unwrap().contains("does not start where"));

    std::fs::remove_dir_all(dir).ok();
}
