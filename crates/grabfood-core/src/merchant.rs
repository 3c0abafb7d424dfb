use serde::{Deserialize, Serialize};

/// Leading column of the tabular export, holding the registry key.
pub const ID_COLUMN: &str = "Restaurant ID";

/// Column labels for [`MerchantRecord`] fields, in declared field order.
///
/// The JSON export uses the same labels as object keys.
pub const MERCHANT_COLUMNS: [&str; 11] = [
    "Restaurant Name",
    "Restaurant Cuisine",
    "Restaurant Rating",
    "Estimate time of Delivery",
    "Restaurant Distance from Delivery Location",
    "Is promo available",
    "Restaurant latitude",
    "Restaurant longitude",
    "Estimate Delivery Fee",
    "Restaurant Image Link",
    "Promotional Offers",
];

/// A restaurant listing normalized from a search response.
///
/// Created the first time its id is seen during a capture session and never
/// modified afterwards. The id itself is the registry key and is not stored
/// on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRecord {
    #[serde(rename = "Restaurant Name")]
    pub name: String,
    #[serde(rename = "Restaurant Cuisine")]
    pub cuisine_list: Vec<String>,
    #[serde(rename = "Restaurant Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Estimate time of Delivery")]
    pub estimated_delivery_time_minutes: Option<i64>,
    #[serde(rename = "Restaurant Distance from Delivery Location")]
    pub distance_km: Option<f64>,
    #[serde(rename = "Is promo available")]
    pub has_promo: bool,
    #[serde(rename = "Restaurant latitude")]
    pub latitude: f64,
    #[serde(rename = "Restaurant longitude")]
    pub longitude: f64,
    #[serde(rename = "Estimate Delivery Fee")]
    pub estimated_delivery_fee: Option<f64>,
    #[serde(rename = "Restaurant Image Link")]
    pub image_url: Option<String>,
    #[serde(rename = "Promotional Offers")]
    pub promotional_offer_types: Option<Vec<String>>,
}

impl MerchantRecord {
    /// Renders the record as text cells aligned with [`MERCHANT_COLUMNS`].
    ///
    /// List fields are joined with `", "`, absent values become empty cells
    /// and floats always keep a decimal point.
    #[must_use]
    pub fn cells(&self) -> [String; 11] {
        [
            self.name.clone(),
            self.cuisine_list.join(", "),
            optional_float_cell(self.rating),
            optional_cell(self.estimated_delivery_time_minutes),
            optional_float_cell(self.distance_km),
            self.has_promo.to_string(),
            float_cell(self.latitude),
            float_cell(self.longitude),
            optional_float_cell(self.estimated_delivery_fee),
            self.image_url.clone().unwrap_or_default(),
            self.promotional_offer_types
                .as_ref()
                .map(|offers| offers.join(", "))
                .unwrap_or_default(),
        ]
    }
}

fn optional_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `Debug` keeps the trailing `.0` that `Display` drops for integral values.
fn float_cell(value: f64) -> String {
    format!("{value:?}")
}

fn optional_float_cell(value: Option<f64>) -> String {
    value.map(float_cell).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MerchantRecord {
        MerchantRecord {
            name: "Kopi Corner".to_string(),
            cuisine_list: vec!["Coffee".to_string(), "Local".to_string()],
            rating: Some(4.6),
            estimated_delivery_time_minutes: Some(25),
            distance_km: None,
            has_promo: true,
            latitude: 1.3945,
            longitude: 103.7443,
            estimated_delivery_fee: Some(2.49),
            image_url: None,
            promotional_offer_types: Some(vec!["DISCOUNT".to_string(), "FREE_DELIVERY".to_string()]),
        }
    }

    #[test]
    fn cells_align_with_column_labels() {
        let cells = sample_record().cells();
        assert_eq!(cells.len(), MERCHANT_COLUMNS.len());
        assert_eq!(cells[0], "Kopi Corner");
        assert_eq!(cells[1], "Coffee, Local");
        assert_eq!(cells[2], "4.6");
        assert_eq!(cells[3], "25");
        assert_eq!(cells[4], "", "absent distance renders as empty cell");
        assert_eq!(cells[5], "true");
        assert_eq!(cells[8], "2.49");
        assert_eq!(cells[9], "");
        assert_eq!(cells[10], "DISCOUNT, FREE_DELIVERY");
    }

    #[test]
    fn integral_floats_keep_their_decimal_point() {
        let record = MerchantRecord {
            rating: Some(4.0),
            latitude: 1.0,
            longitude: 104.0,
            estimated_delivery_fee: Some(3.0),
            ..sample_record()
        };
        let cells = record.cells();
        assert_eq!(cells[2], "4.0");
        assert_eq!(cells[6], "1.0");
        assert_eq!(cells[7], "104.0");
        assert_eq!(cells[8], "3.0");
        assert_eq!(sample_record().cells()[6], "1.3945");
    }

    #[test]
    fn serializes_with_column_labels_as_keys() {
        let value = serde_json::to_value(sample_record()).unwrap();
        let object = value.as_object().expect("record serializes to an object");
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        for label in MERCHANT_COLUMNS {
            assert!(keys.contains(&label), "missing key {label}");
        }
        assert_eq!(object.len(), MERCHANT_COLUMNS.len());
        assert!(object["Restaurant Distance from Delivery Location"].is_null());
    }
}
