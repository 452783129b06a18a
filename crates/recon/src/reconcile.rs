//! Duplicate-entity merging across independently extracted tables.
//!
//! Each pass indexes already-merged entries by normalized name, so a
//! collection is merged in one left-to-right scan. Output order is
//! first-occurrence order and the first-seen spelling of a name is kept.
//! Every pass is idempotent: its output has no two entries with an equal
//! normalized name.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::model::{
    EquipmentCategory, MealDistribution, Organization, PassCounts, PersonnelDetails,
    PersonnelPosition, Product, ReconcileReport, TableIntelligence,
};
use crate::normalize::normalize;

/// Merge organizations sharing a normalized name.
///
/// Headcounts are summed, with an absent side counting as zero; the result
/// stays absent only when both sides were absent. Meal distributions are
/// summed key by key under the same rule. Other keys keep the first-seen
/// value.
pub fn reconcile_organizations(organizations: &[Organization]) -> Vec<Organization> {
    let mut merged: Vec<Organization> = Vec::with_capacity(organizations.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for org in organizations {
        let key = normalize(&org.name);
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                log::debug!("merging organization '{}' into '{}'", org.name, existing.name);
                existing.headcount = sum_present(existing.headcount, org.headcount);
                existing.meal_distribution = merge_meals(
                    existing.meal_distribution.take(),
                    org.meal_distribution.as_ref(),
                );
                fill_missing(&mut existing.extra, &org.extra);
            }
            None => {
                index.insert(key, merged.len());
                merged.push(org.clone());
            }
        }
    }

    merged
}

fn merge_meals(
    existing: Option<MealDistribution>,
    incoming: Option<&MealDistribution>,
) -> Option<MealDistribution> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b.clone()),
        (Some(mut a), Some(b)) => {
            a.breakfast = sum_present(a.breakfast, b.breakfast);
            a.lunch = sum_present(a.lunch, b.lunch);
            a.dinner = sum_present(a.dinner, b.dinner);
            a.total = sum_present(a.total, b.total);
            for (key, incoming) in &b.extra {
                match a.extra.get_mut(key) {
                    Some(existing) => {
                        if let Some(sum) = sum_numbers(existing, incoming) {
                            *existing = sum;
                        }
                    }
                    None => {
                        a.extra.insert(key.clone(), incoming.clone());
                    }
                }
            }
            Some(a)
        }
    }
}

/// Sum two JSON numbers, exactly when both are unsigned integers. `None` when
/// either side is not a number; the caller keeps the existing value.
fn sum_numbers(a: &Value, b: &Value) -> Option<Value> {
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(Value::from(x.saturating_add(y)));
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?).map(Value::Number)
}

fn fill_missing(existing: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        if !existing.contains_key(key) {
            existing.insert(key.clone(), value.clone());
        }
    }
}

fn sum_present(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
    }
}

/// Two-level merge: categories by normalized name, then products within a
/// category. A duplicate product is dropped, never summed, because
/// quantities are free text.
pub fn reconcile_equipment(categories: &[EquipmentCategory]) -> Vec<EquipmentCategory> {
    let mut merged: Vec<EquipmentCategory> = Vec::with_capacity(categories.len());
    let mut index: HashMap<String, (usize, HashSet<String>)> = HashMap::new();

    for category in categories {
        let key = normalize(&category.name);
        let (slot, seen) = index.entry(key).or_insert_with(|| {
            merged.push(EquipmentCategory {
                name: category.name.clone(),
                products: Vec::new(),
                extra: Map::new(),
            });
            (merged.len() - 1, HashSet::new())
        });
        let target = &mut merged[*slot];
        fill_missing(&mut target.extra, &category.extra);

        for product in &category.products {
            let product_key = normalize(&product.name);
            if seen.insert(product_key) {
                target.products.push(product.clone());
            } else {
                log::debug!(
                    "dropping duplicate product '{}' in category '{}'",
                    product.name,
                    target.name
                );
            }
        }
    }

    merged
}

/// Merge personnel roles sharing a normalized name.
///
/// Counts are summed. The longer qualification wins (ties keep the existing
/// one). Salary keeps the first non-blank value; salaries are never summed.
pub fn reconcile_personnel(positions: &[PersonnelPosition]) -> Vec<PersonnelPosition> {
    let mut merged: Vec<PersonnelPosition> = Vec::with_capacity(positions.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for position in positions {
        let key = normalize(&position.role);
        let Some(&i) = index.get(&key) else {
            index.insert(key, merged.len());
            merged.push(position.clone());
            continue;
        };

        let existing = &mut merged[i];
        log::debug!("merging role '{}' into '{}'", position.role, existing.role);
        existing.count = existing.count.saturating_add(position.count);

        if char_len(&position.qualification) > char_len(&existing.qualification) {
            existing.qualification = position.qualification.clone();
        }
        if is_blank(&existing.salary) && !is_blank(&position.salary) {
            existing.salary = position.salary.clone();
        }
        fill_missing(&mut existing.extra, &position.extra);
    }

    merged
}

fn char_len(s: &Option<String>) -> usize {
    s.as_deref().map_or(0, |s| s.chars().count())
}

fn is_blank(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn product_count(categories: &[EquipmentCategory]) -> usize {
    categories.iter().map(|c| c.products.len()).sum()
}

/// Run all three passes over one table-intelligence result.
pub fn reconcile_intelligence(mut intel: TableIntelligence) -> (TableIntelligence, ReconcileReport) {
    let mut report = ReconcileReport::default();

    report.organizations.before = intel.organizations.len();
    intel.organizations = reconcile_organizations(&intel.organizations);
    report.organizations.after = intel.organizations.len();

    report.equipment_products.before = product_count(&intel.equipment);
    intel.equipment = reconcile_equipment(&intel.equipment);
    report.equipment_products.after = product_count(&intel.equipment);

    if let Some(personnel) = intel.personnel.as_mut() {
        report.personnel.before = personnel.positions.len();
        personnel.positions = reconcile_personnel(&personnel.positions);
        report.personnel.after = personnel.positions.len();
    }

    finish_report(&mut report);
    (intel, report)
}

/// Untyped variant of [`reconcile_intelligence`].
///
/// Each collection is parsed on its own. One that does not fit the expected
/// shape is left exactly as it was and named in `passed_through`; the other
/// collections are still reconciled. Reconciled collections are written back
/// under their original key, spelled the way that key is spelled: a
/// collection found under `kuruluslar` keeps `ad`, `kisi_sayisi` and so on.
/// Keys the engine does not interpret ride along. A non-object input is
/// returned unchanged.
pub fn reconcile_intelligence_value(mut value: Value) -> (Value, ReconcileReport) {
    let mut report = ReconcileReport::default();

    let Some(obj) = value.as_object_mut() else {
        log::warn!("table intelligence is not a JSON object; passing through");
        report.passed_through.push("intelligence".to_string());
        return (value, report);
    };
    reconcile_object(obj, &mut report);

    finish_report(&mut report);
    (value, report)
}

/// Field names the extraction prompt uses, by canonical name.
type Spelling = &'static [(&'static str, &'static str)];

const ORGANIZATION_KEYS: Spelling = &[
    ("name", "ad"),
    ("headcount", "kisi_sayisi"),
    ("meal_distribution", "ogun_dagilimi"),
];
const MEAL_KEYS: Spelling = &[
    ("breakfast", "kahvalti"),
    ("lunch", "ogle"),
    ("dinner", "aksam"),
    ("total", "toplam"),
];
const CATEGORY_KEYS: Spelling = &[("name", "kategori"), ("products", "urunler")];
const PRODUCT_KEYS: Spelling = &[("name", "ad"), ("quantity", "miktar"), ("feature", "ozellik")];
const PERSONNEL_KEYS: Spelling = &[("total_personnel", "toplam_personel"), ("positions", "pozisyonlar")];
const POSITION_KEYS: Spelling = &[
    ("role", "pozisyon"),
    ("count", "sayi"),
    ("qualification", "nitelik"),
    ("salary", "maas"),
];

fn reconcile_object(obj: &mut Map<String, Value>, report: &mut ReconcileReport) {
    if let Some((key, original)) = find_key(obj, "organizations", "kuruluslar") {
        match parse_collection::<Vec<Organization>>(&obj[key]) {
            Some(orgs) => {
                let out = reconcile_organizations(&orgs);
                report.organizations = PassCounts { before: orgs.len(), after: out.len() };
                write_back(obj, key, &out, report, |v| {
                    if original {
                        for org in array_items(v) {
                            respell(org, ORGANIZATION_KEYS);
                            if let Some(meals) = org.get_mut("ogun_dagilimi") {
                                respell(meals, MEAL_KEYS);
                            }
                        }
                    }
                });
            }
            None => pass_through(key, report),
        }
    }

    if let Some((key, original)) = find_key(obj, "equipment", "ekipman_listesi") {
        match parse_collection::<Vec<EquipmentCategory>>(&obj[key]) {
            Some(categories) => {
                let out = reconcile_equipment(&categories);
                report.equipment_products = PassCounts {
                    before: product_count(&categories),
                    after: product_count(&out),
                };
                write_back(obj, key, &out, report, |v| {
                    if original {
                        for category in array_items(v) {
                            respell(category, CATEGORY_KEYS);
                            if let Some(products) = category.get_mut("urunler") {
                                array_items(products).for_each(|p| respell(p, PRODUCT_KEYS));
                            }
                        }
                    }
                });
            }
            None => pass_through(key, report),
        }
    }

    if let Some((key, original)) = find_key(obj, "personnel", "personel_detaylari") {
        match parse_collection::<PersonnelDetails>(&obj[key]) {
            Some(mut details) => {
                let before = details.positions.len();
                details.positions = reconcile_personnel(&details.positions);
                report.personnel = PassCounts { before, after: details.positions.len() };
                write_back(obj, key, &details, report, |v| {
                    if original {
                        respell(v, PERSONNEL_KEYS);
                        if let Some(positions) = v.get_mut("pozisyonlar") {
                            array_items(positions).for_each(|p| respell(p, POSITION_KEYS));
                        }
                    }
                });
            }
            None => pass_through(key, report),
        }
    }
}

/// The key a collection is stored under, and whether it is the original
/// (rather than canonical) spelling.
fn find_key(
    obj: &Map<String, Value>,
    canonical: &'static str,
    original: &'static str,
) -> Option<(&'static str, bool)> {
    let present = |k: &str| obj.get(k).is_some_and(|v| !v.is_null());
    if present(canonical) {
        Some((canonical, false))
    } else if present(original) {
        Some((original, true))
    } else {
        None
    }
}

fn parse_collection<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

fn array_items(value: &mut Value) -> impl Iterator<Item = &mut Value> {
    value.as_array_mut().into_iter().flatten()
}

/// Rename canonical keys of one object to their original spelling, keeping
/// key order.
fn respell(value: &mut Value, spelling: Spelling) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    *obj = std::mem::take(obj)
        .into_iter()
        .map(|(key, v)| match spelling.iter().find(|(canonical, _)| *canonical == key) {
            Some((_, original)) => (original.to_string(), v),
            None => (key, v),
        })
        .collect();
}

fn write_back<T: Serialize>(
    obj: &mut Map<String, Value>,
    key: &str,
    collection: &T,
    report: &mut ReconcileReport,
    spell: impl FnOnce(&mut Value),
) {
    match serde_json::to_value(collection) {
        Ok(mut v) => {
            spell(&mut v);
            obj.insert(key.to_string(), v);
        }
        Err(e) => {
            log::warn!("cannot re-serialize '{key}': {e}; leaving it unchanged");
            pass_through(key, report);
        }
    }
}

fn pass_through(key: &str, report: &mut ReconcileReport) {
    log::warn!("'{key}' does not have the expected shape; passing it through unmodified");
    report.passed_through.push(key.to_string());
}

fn finish_report(report: &mut ReconcileReport) {
    report.duplicates_merged = report.organizations.merged()
        + report.equipment_products.merged()
        + report.personnel.merged();
    log::info!(
        "reconciled: organizations {} -> {}, products {} -> {}, roles {} -> {}",
        report.organizations.before,
        report.organizations.after,
        report.equipment_products.before,
        report.equipment_products.after,
        report.personnel.before,
        report.personnel.after,
    );
}
