//! Intercepted traffic and GrabFood search response types.
//!
//! ## Observed shape of `POST /foodweb/v2/search`
//!
//! Merchants live at `searchResult.searchMerchants[]`. Each entry carries:
//! - `id`: merchant id string, stable across result pages.
//! - `address.name`: display name of the outlet.
//! - `latlng.latitude` / `latlng.longitude`: numbers.
//! - `merchantBrief`: `cuisine` (array of strings), optional `rating`,
//!   `distanceInKm`, `hasPromo`, `photoHref`.
//! - `estimatedDeliveryFee`: optional object; `price` inside it may be absent.
//! - `estimatedDeliveryTime`: optional integer minutes (sometimes `25.0`).
//! - `sideLabels.data`: optional array of label objects with a `type` string
//!   (e.g. `"DISCOUNT"`). A non-empty list means the merchant is promoting.
//!
//! Entries are kept as raw JSON in [`SearchResponsePayload`] and decoded one
//! at a time, so a single odd entry does not discard the whole page.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// One HTTP request/response pair observed by the automation layer.
#[derive(Debug, Clone, Default)]
pub struct InterceptedExchange {
    pub method: String,
    pub url: String,
    /// HTTP status of the response, when the collaborator recorded one.
    pub status: Option<u16>,
    pub response_headers: Vec<(String, String)>,
    pub response_body: Vec<u8>,
}

impl InterceptedExchange {
    /// Case-insensitive response header lookup. Returns the first match.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of `Content-Encoding`, or `None` for identity.
    #[must_use]
    pub fn content_encoding(&self) -> Option<&str> {
        self.header("content-encoding")
    }
}

/// Decoded body of one search response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponsePayload {
    pub search_result: SearchResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Absent or `null` on empty result pages.
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_merchants: Vec<serde_json::Value>,
}

/// A single merchant entry from `searchMerchants`.
///
/// Required fields (`id`, `address.name`, `latlng`) fail deserialization
/// when missing. Everything else falls back to its default when absent,
/// `null`, or of an unexpected type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantEntry {
    pub id: String,
    pub address: MerchantAddress,
    pub latlng: LatLng,
    #[serde(default, deserialize_with = "lenient")]
    pub merchant_brief: MerchantBrief,
    #[serde(default, deserialize_with = "lenient")]
    pub estimated_delivery_fee: Option<DeliveryFee>,
    /// Whole minutes. Integral floats such as `25.0` are accepted.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub estimated_delivery_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub side_labels: Option<SideLabels>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantAddress {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantBrief {
    #[serde(default, deserialize_with = "lenient")]
    pub cuisine: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub distance_in_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_promo: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub photo_href: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryFee {
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SideLabels {
    #[serde(default, deserialize_with = "lenient")]
    pub data: Vec<SideLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SideLabel {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub label_type: Option<String>,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Falls back to `T::default()` when the value is `null` or does not have
/// the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let minutes = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|m| m.fract() == 0.0)
                .map(|m| m as i64)
        }),
        _ => None,
    };
    Ok(minutes)
}
