use serde_json::{json, Value};

use super::*;

fn merchant(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "address": {"name": name},
        "latlng": {"latitude": 1.3945, "longitude": 103.7443},
        "merchantBrief": {
            "cuisine": ["Chicken", "Western"],
            "rating": 4.4,
            "distanceInKm": 1.2,
            "photoHref": "https://food-cms.grab.com/compressed_webp/merchants/x.webp"
        },
        "estimatedDeliveryFee": {"price": 2.5},
        "estimatedDeliveryTime": 30
    })
}

fn payload(merchants: Vec<Value>) -> SearchResponsePayload {
    serde_json::from_value(json!({"searchResult": {"searchMerchants": merchants}})).unwrap()
}

#[test]
fn builds_record_from_nested_fields() {
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();

    let summary = ingest(
        &payload(vec![merchant("4-A", "Wing Stop")]),
        &mut registry,
        &mut stats,
    );

    assert_eq!(summary.inserted, 1);
    let record = &registry["4-A"];
    assert_eq!(record.name, "Wing Stop");
    assert_eq!(record.cuisine_list, vec!["Chicken", "Western"]);
    assert_eq!(record.rating, Some(4.4));
    assert_eq!(record.distance_km, Some(1.2));
    assert_eq!(record.estimated_delivery_fee, Some(2.5));
    assert_eq!(record.estimated_delivery_time_minutes, Some(30));
    assert!(!record.has_promo);
    assert!(record.promotional_offer_types.is_none());
    assert!(record.image_url.is_some());
}

#[test]
fn side_labels_set_offer_types_and_force_promo() {
    let mut entry = merchant("4-B", "Noodle Bar");
    entry["sideLabels"] = json!({"data": [{"type": "A"}, {"type": "B"}]});
    entry["merchantBrief"]["hasPromo"] = json!(false);

    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();
    ingest(&payload(vec![entry]), &mut registry, &mut stats);

    let record = &registry["4-B"];
    assert_eq!(
        record.promotional_offer_types.as_deref(),
        Some(&["A".to_string(), "B".to_string()][..])
    );
    assert!(record.has_promo);
}

#[test]
fn empty_side_labels_leave_offers_unset() {
    let mut entry = merchant("4-C", "Bakery");
    entry["sideLabels"] = json!({"data": []});

    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();
    ingest(&payload(vec![entry]), &mut registry, &mut stats);

    assert!(registry["4-C"].promotional_offer_types.is_none());
    assert!(!registry["4-C"].has_promo);
}

#[test]
fn first_seen_values_win_across_batches() {
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();

    ingest(&payload(vec![merchant("4-A", "Original")]), &mut registry, &mut stats);

    let mut changed = merchant("4-A", "Renamed");
    changed["estimatedDeliveryFee"] = json!({"price": 9.0});
    changed["estimatedDeliveryTime"] = json!(55);
    let summary = ingest(&payload(vec![changed]), &mut registry, &mut stats);

    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry["4-A"].name, "Original");
    assert_eq!(registry["4-A"].estimated_delivery_fee, Some(2.5));
    assert_eq!(stats.fee_count, 1, "duplicates must not touch stats");
    assert_eq!(stats.time_sum, 30.0);
}

#[test]
fn reingesting_the_same_payload_is_a_no_op() {
    let batch = payload(vec![merchant("4-A", "One"), merchant("4-B", "Two")]);

    let mut once = MerchantRegistry::new();
    let mut once_stats = AggregateStats::default();
    ingest(&batch, &mut once, &mut once_stats);

    let mut twice = MerchantRegistry::new();
    let mut twice_stats = AggregateStats::default();
    ingest(&batch, &mut twice, &mut twice_stats);
    ingest(&batch, &mut twice, &mut twice_stats);

    assert_eq!(once, twice);
    assert_eq!(once_stats, twice_stats);
}

#[test]
fn duplicate_ids_within_one_batch_keep_the_first() {
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();
    let summary = ingest(
        &payload(vec![
            merchant("4-A", "First"),
            merchant("4-B", "Other"),
            merchant("4-A", "Second"),
        ]),
        &mut registry,
        &mut stats,
    );

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.duplicates, 1);
    let ids: Vec<&str> = registry.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["4-A", "4-B"], "insertion order is preserved");
    assert_eq!(registry["4-A"].name, "First");
}

#[test]
fn zero_fee_is_stored_but_not_counted() {
    let mut entry = merchant("4-Z", "Free Delivery Cafe");
    entry["estimatedDeliveryFee"] = json!({"price": 0});

    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();
    ingest(&payload(vec![entry]), &mut registry, &mut stats);

    assert_eq!(registry["4-Z"].estimated_delivery_fee, Some(0.0));
    assert_eq!(stats.fee_count, 0);
    assert_eq!(stats.average_fee(), None);
}

#[test]
fn missing_optional_fields_use_defaults() {
    let entry = json!({
        "id": "4-M",
        "address": {"name": "Minimal"},
        "latlng": {"latitude": 1.0, "longitude": 2.0}
    });

    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();
    ingest(&payload(vec![entry]), &mut registry, &mut stats);

    let record = &registry["4-M"];
    assert!(record.cuisine_list.is_empty());
    assert!(record.rating.is_none());
    assert!(record.distance_km.is_none());
    assert!(record.image_url.is_none());
    assert!(record.estimated_delivery_fee.is_none());
    assert!(record.estimated_delivery_time_minutes.is_none());
    assert!(!record.has_promo);
    assert_eq!(stats, AggregateStats::default());
}

#[test]
fn malformed_entries_are_skipped_without_losing_the_batch() {
    let no_latlng = json!({"id": "4-X", "address": {"name": "Nowhere"}});
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();

    let summary = ingest(
        &payload(vec![no_latlng, merchant("4-A", "Fine")]),
        &mut registry,
        &mut stats,
    );

    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.inserted, 1);
    assert!(registry.contains_key("4-A"));
}

#[test]
fn null_brief_is_treated_as_missing() {
    let entry = json!({
        "id": "4-N",
        "address": {"name": "Null Brief"},
        "latlng": {"latitude": 1.3, "longitude": 103.8},
        "merchantBrief": null,
        "sideLabels": null
    });
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();

    let summary = ingest(&payload(vec![entry]), &mut registry, &mut stats);

    assert_eq!(summary.inserted, 1);
    assert!(registry["4-N"].cuisine_list.is_empty());
    assert!(registry["4-N"].promotional_offer_types.is_none());
}

#[test]
fn integral_float_delivery_time_is_kept_as_minutes() {
    let mut entry = merchant("4-F", "Float Minutes");
    entry["estimatedDeliveryTime"] = json!(25.0);
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();

    let summary = ingest(&payload(vec![entry]), &mut registry, &mut stats);

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.malformed, 0);
    assert_eq!(registry["4-F"].estimated_delivery_time_minutes, Some(25));
    assert_eq!(stats.time_count, 1);
}

#[test]
fn mistyped_optional_fields_fall_back_to_defaults() {
    let mut entry = merchant("4-T", "Odd Types");
    entry["merchantBrief"]["rating"] = json!("4.5");
    entry["merchantBrief"]["cuisine"] = json!("Western");
    entry["estimatedDeliveryTime"] = json!(27.5);
    entry["estimatedDeliveryFee"] = json!({"price": "free"});
    entry["sideLabels"] = json!("none");
    let mut registry = MerchantRegistry::new();
    let mut stats = AggregateStats::default();

    let summary = ingest(&payload(vec![entry]), &mut registry, &mut stats);

    assert_eq!(summary.inserted, 1, "merchant is kept despite odd field types");
    let record = &registry["4-T"];
    assert_eq!(record.name, "Odd Types");
    assert!(record.rating.is_none());
    assert!(record.cuisine_list.is_empty());
    assert!(record.estimated_delivery_time_minutes.is_none());
    assert!(record.estimated_delivery_fee.is_none());
    assert!(record.promotional_offer_types.is_none());
    assert_eq!(record.distance_km, Some(1.2));
    assert_eq!(stats, AggregateStats::default());
}
