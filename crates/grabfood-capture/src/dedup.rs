//! First-seen-wins deduplication of merchant entries.
//!
//! Per-field defaults when building a [`MerchantRecord`]:
//!
//! | Field | Source | Default |
//! |-------|--------|---------|
//! | `name` | `address.name` | required |
//! | `cuisine_list` | `merchantBrief.cuisine` | empty |
//! | `rating` | `merchantBrief.rating` | `None` |
//! | `estimated_delivery_time_minutes` | `estimatedDeliveryTime` | `None` |
//! | `distance_km` | `merchantBrief.distanceInKm` | `None` |
//! | `has_promo` | `merchantBrief.hasPromo`, forced `true` by side labels | `false` |
//! | `latitude` / `longitude` | `latlng` | required |
//! | `estimated_delivery_fee` | `estimatedDeliveryFee.price` | `None` |
//! | `image_url` | `merchantBrief.photoHref` | `None` |
//! | `promotional_offer_types` | `sideLabels.data[].type` | `None` |

use grabfood_core::MerchantRecord;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::stats::AggregateStats;
use crate::types::{MerchantEntry, SearchResponsePayload};

/// Insertion-ordered mapping of merchant id to its first-seen record.
pub type MerchantRegistry = IndexMap<String, MerchantRecord>;

/// Counts from one [`ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

impl IngestSummary {
    pub(crate) fn absorb(&mut self, other: IngestSummary) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.malformed += other.malformed;
    }
}

/// Adds every unseen merchant in `payload` to `registry`, updating `stats`
/// once per inserted record.
///
/// Entries whose id is already registered are ignored entirely. Entries
/// missing `id`, `address.name` or `latlng` are logged and skipped.
pub fn ingest(
    payload: &SearchResponsePayload,
    registry: &mut MerchantRegistry,
    stats: &mut AggregateStats,
) -> IngestSummary {
    let mut summary = IngestSummary::default();

    for raw in &payload.search_result.search_merchants {
        let entry = match MerchantEntry::deserialize(raw) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(
                    id = ?raw.get("id"),
                    %error,
                    "skipping malformed merchant entry"
                );
                summary.malformed += 1;
                continue;
            }
        };

        if registry.contains_key(&entry.id) {
            summary.duplicates += 1;
            continue;
        }

        let (id, record) = build_record(entry);
        stats.record_fee(record.estimated_delivery_fee);
        stats.record_delivery_time(record.estimated_delivery_time_minutes);
        registry.insert(id, record);
        summary.inserted += 1;
    }

    summary
}

fn build_record(entry: MerchantEntry) -> (String, MerchantRecord) {
    let MerchantEntry {
        id,
        address,
        latlng,
        merchant_brief: brief,
        estimated_delivery_fee,
        estimated_delivery_time,
        side_labels,
    } = entry;

    let promotional_offer_types = side_labels
        .filter(|labels| !labels.data.is_empty())
        .map(|labels| {
            labels
                .data
                .into_iter()
                .filter_map(|label| label.label_type)
                .collect::<Vec<_>>()
        });
    let has_promo = promotional_offer_types.is_some() || brief.has_promo.unwrap_or(false);

    let record = MerchantRecord {
        name: address.name,
        cuisine_list: brief.cuisine,
        rating: brief.rating,
        estimated_delivery_time_minutes: estimated_delivery_time,
        distance_km: brief.distance_in_km,
        has_promo,
        latitude: latlng.latitude,
        longitude: latlng.longitude,
        estimated_delivery_fee: estimated_delivery_fee.and_then(|fee| fee.price),
        image_url: brief.photo_href,
        promotional_offer_types,
    };

    (id, record)
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
