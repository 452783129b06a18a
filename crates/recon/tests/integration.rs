use std::path::PathBuf;

use tenderlens_recon::model::{
    ConfidenceLevel, FieldValue, PassCounts, ValidationOutcome, ValidationStatus,
};
use tenderlens_recon::parse::{parse_intelligence, parse_record};
use tenderlens_recon::{
    reconcile_intelligence, reconcile_intelligence_value, Engine, EngineConfig, ExtractedRecord,
    Field, Severity,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn engine() -> Engine {
    let config = EngineConfig::from_toml("unit_meal_cost = 12.0\ncurrency = \"TRY\"\n").unwrap();
    Engine::new(config).unwrap()
}

fn validate_fixture(name: &str) -> ValidationOutcome {
    let record = parse_record(&read_fixture(name)).unwrap();
    engine().validate(&record)
}

// -------------------------------------------------------------------------
// Validation
// -------------------------------------------------------------------------

#[test]
fn meal_count_mistaken_for_headcount() {
    let outcome = validate_fixture("record_meal_count.json");

    assert_eq!(outcome.record.headcount, Some(11));
    assert_eq!(outcome.record.estimated_budget, Some(144_540.0));
    assert_eq!(outcome.fix_count, 2);
    assert_eq!(outcome.warnings.len(), 2);

    let headcount = &outcome.warnings[0];
    assert_eq!(headcount.field, Field::Headcount);
    assert_eq!(headcount.severity, Severity::Error);
    assert_eq!(headcount.original_value, Some(FieldValue::Count(12_000)));
    assert_eq!(headcount.suggested_value, Some(FieldValue::Count(11)));
    assert!(headcount.message.contains("12,000 / 365 days / 3 meals per day = 11"));

    let budget = &outcome.warnings[1];
    assert_eq!(budget.field, Field::EstimatedBudget);
    assert_eq!(budget.severity, Severity::Info);
    assert!(budget.message.contains("144,540 TRY"));

    let s = &outcome.summary;
    assert_eq!(s.status, ValidationStatus::Error);
    assert!(!s.is_valid);
    // headcount: (1.0 - 0.3 + 0.9) / 2
    assert!((s.confidence.fields.headcount - 0.8).abs() < 1e-9);
    assert!((s.confidence.fields.meals_per_day - 0.975).abs() < 1e-9);
    assert_eq!(s.confidence.level, ConfidenceLevel::High);

    // pass-through fields survive
    assert_eq!(outcome.record.extra["kurum"], "Sosyal Hizmetler İl Müdürlüğü");
}

#[test]
fn clause_number_is_cleared_with_excerpt() {
    let outcome = validate_fixture("record_clause_number.json");

    assert_eq!(outcome.record.headcount, None);
    assert_eq!(outcome.warnings.len(), 1);
    let w = &outcome.warnings[0];
    assert_eq!(w.severity, Severity::Error);
    assert!(w.auto_fixed);
    assert_eq!(w.original_value, Some(FieldValue::Count(8)));
    assert!(w.message.contains("Madde 8 - Yüklenicinin yükümlülükleri"));
    assert!((outcome.summary.confidence.fields.headcount - 0.55).abs() < 1e-9);
}

#[test]
fn clean_record_has_no_findings() {
    let outcome = validate_fixture("record_clean.json");
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.fix_count, 0);
    assert_eq!(outcome.summary.status, ValidationStatus::Valid);
    assert_eq!(outcome.summary.confidence.overall, 1.0);
}

#[test]
fn raw_response_is_extracted_and_validated() {
    let outcome = engine().validate_response(&read_fixture("response.txt")).unwrap();

    assert_eq!(outcome.record.headcount, Some(10));
    assert_eq!(outcome.fix_count, 1);
    assert_eq!(outcome.warnings[0].severity, Severity::Warning);

    let budget = outcome
        .warnings
        .iter()
        .find(|w| w.field == Field::EstimatedBudget)
        .unwrap();
    assert_eq!(budget.severity, Severity::Info);
    assert!(budget.message.contains("840.00 TRY per meal"));
    assert_eq!(outcome.summary.status, ValidationStatus::Warning);
}

#[test]
fn serialized_output_revalidates_without_new_fixes() {
    let first = validate_fixture("record_meal_count.json");

    let json = serde_json::to_string(&first.record).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["corrections"]["headcount"]["original"], 12_000);
    assert_eq!(value["corrections"]["headcount"]["corrected"], 11);

    let reparsed: ExtractedRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(reparsed, first.record);

    let second = engine().validate(&reparsed);
    assert_eq!(second.fix_count, 0);
    assert!(second.warnings.is_empty());
    assert_eq!(second.record, first.record);
}

#[test]
fn missing_unit_cost_reports_underivable_budget() {
    let record = parse_record(&read_fixture("record_meal_count.json")).unwrap();
    let outcome = Engine::new(EngineConfig::default()).unwrap().validate(&record);

    assert_eq!(outcome.record.estimated_budget, None);
    let budget = outcome
        .warnings
        .iter()
        .find(|w| w.field == Field::EstimatedBudget)
        .unwrap();
    assert!(!budget.auto_fixed);
    assert!(budget.message.contains("no unit meal cost"));
}

// -------------------------------------------------------------------------
// Reconciliation
// -------------------------------------------------------------------------

#[test]
fn intelligence_fixture_reconciles() {
    let intel = parse_intelligence(&read_fixture("intelligence.json")).unwrap();
    let (out, report) = reconcile_intelligence(intel);

    assert_eq!(report.organizations, PassCounts { before: 4, after: 2 });
    assert_eq!(report.equipment_products, PassCounts { before: 5, after: 4 });
    assert_eq!(report.personnel, PassCounts { before: 4, after: 2 });
    assert_eq!(report.duplicates_merged, 5);

    let huzurevi = &out.organizations[0];
    assert_eq!(huzurevi.name, "Huzurevi");
    assert_eq!(huzurevi.headcount, Some(80));
    let meals = huzurevi.meal_distribution.as_ref().unwrap();
    assert_eq!((meals.breakfast, meals.lunch, meals.dinner, meals.total), (Some(50), Some(80), Some(50), Some(30)));
    assert_eq!(meals.extra["ara_ogun"], 30);
    assert_eq!(huzurevi.extra["adres"], "Yenimahalle");

    let cocuk = &out.organizations[1];
    assert_eq!(cocuk.name, "Çocuk Evleri Sitesi");
    assert_eq!(cocuk.headcount, Some(120));

    let kitchen = &out.equipment[0];
    let products: Vec<_> = kitchen.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(products, ["Endüstriyel Fırın", "Bulaşık Makinesi", "Buzdolabı"]);
    assert_eq!(kitchen.products[0].quantity.as_deref(), Some("2 adet"));

    let personnel = out.personnel.as_ref().unwrap();
    assert_eq!(personnel.total_personnel, Some(9));
    let chef = &personnel.positions[0];
    assert_eq!(chef.count, 2);
    assert_eq!(chef.qualification.as_deref(), Some("Ustalık belgeli, 5 yıl deneyim"));
    assert_eq!(chef.salary.as_deref(), Some("Asgari ücretin %50 fazlası"));
    let waiter = &personnel.positions[1];
    assert_eq!(waiter.count, 7);
    assert_eq!(waiter.salary.as_deref(), Some("Asgari ücret"));

    assert_eq!(out.extra["guven_skoru"], 0.82);
    assert!(out.extra.contains_key("menu_analizi"));
}

#[test]
fn intelligence_reconcile_is_idempotent() {
    let intel = parse_intelligence(&read_fixture("intelligence.json")).unwrap();
    let (once, _) = reconcile_intelligence(intel);
    let (twice, report) = reconcile_intelligence(once.clone());
    assert_eq!(twice, once);
    assert_eq!(report.duplicates_merged, 0);
}

#[test]
fn untyped_reconcile_matches_typed() {
    let text = read_fixture("intelligence.json");
    let (typed, typed_report) = reconcile_intelligence(parse_intelligence(&text).unwrap());
    let (value, report) = reconcile_intelligence_value(serde_json::from_str(&text).unwrap());

    assert_eq!(report, typed_report);
    assert!(report.passed_through.is_empty());
    assert_eq!(value["kuruluslar"][0]["ad"], "Huzurevi");
    assert_eq!(value["kuruluslar"][0]["kisi_sayisi"], 80);
    assert_eq!(value["kuruluslar"][0]["adres"], "Yenimahalle");
    assert_eq!(value["kuruluslar"][0]["ogun_dagilimi"]["ara_ogun"], 30);
    assert!(value["kuruluslar"][0].get("name").is_none());
    assert_eq!(value["ekipman_listesi"][0]["kategori"], "Mutfak Ekipmanı");
    assert_eq!(value["personel_detaylari"]["pozisyonlar"][0]["sayi"], 2);
    assert_eq!(value["kaynak_tablolar"], serde_json::json!(["Tablo 1", "Tablo 4"]));

    // the original spelling reads back into the same typed result
    let reread = parse_intelligence(&value.to_string()).unwrap();
    assert_eq!(reread, typed);
}
