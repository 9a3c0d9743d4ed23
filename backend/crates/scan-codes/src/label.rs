//! Label payload construction.
//!
//! A printed label carries a JSON payload (rendered into a QR image by the
//! label collaborator) plus two human-readable identifiers. The payload keys
//! and the zero-padded identifier shapes are fixed: deployed scanners parse
//! them back via [`crate::resolve`].

use serde::Serialize;

/// JSON payload embedded in a label's QR code.
///
/// Serialises with camelCase keys and a fixed `action` marker so scanner
/// clients can distinguish label scans from ad-hoc text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPayload {
    /// Item id, the primary resolution key.
    pub id: i64,
    /// Item name at print time.
    pub article: String,
    /// Component/type classification.
    pub komponen: String,
    /// Storage location code, when the item has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stock on hand at print time.
    pub qty: i32,
    /// Reorder threshold.
    pub min_stock: i32,
    /// RFC 3339 print timestamp supplied by the caller.
    pub timestamp: String,
    action: &'static str,
}

impl LabelPayload {
    /// Build a payload for one item.
    #[must_use]
    pub fn new(
        id: i64,
        article: impl Into<String>,
        komponen: impl Into<String>,
        location: Option<String>,
        qty: i32,
        min_stock: i32,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id,
            article: article.into(),
            komponen: komponen.into(),
            location,
            qty,
            min_stock,
            timestamp: timestamp.into(),
            action: "scan_update",
        }
    }

    /// Render the payload as the JSON string printed into the QR code.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialisation error; with this payload shape
    /// that only occurs under allocation failure.
    pub fn to_qr_data(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Zero-padded item label identifier, e.g. `ITEM000123`.
#[must_use]
pub fn item_code(id: i64) -> String {
    format!("ITEM{id:06}")
}

/// Zero-padded warehouse label identifier, e.g. `WH000123`.
#[must_use]
pub fn warehouse_code(id: i64) -> String {
    format!("WH{id:06}")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{LabelPayload, item_code, warehouse_code};
    use crate::resolve::{ScanResolution, resolve};

    #[rstest]
    #[case(1, "ITEM000001")]
    #[case(123, "ITEM000123")]
    #[case(1_234_567, "ITEM1234567")]
    fn item_codes_are_zero_padded_to_six_digits(#[case] id: i64, #[case] expected: &str) {
        assert_eq!(item_code(id), expected);
    }

    #[rstest]
    fn warehouse_codes_use_the_wh_prefix() {
        assert_eq!(warehouse_code(42), "WH000042");
    }

    #[rstest]
    fn payload_serialises_with_camel_case_keys_and_action_marker() {
        let payload = LabelPayload::new(
            9,
            "Bearing 608",
            "Bearing",
            Some("A1".to_owned()),
            25,
            10,
            "2026-06-18T08:00:00Z",
        );

        let Ok(json) = payload.to_qr_data() else {
            panic!("label payload should serialise");
        };
        assert!(json.contains(r#""minStock":10"#));
        assert!(json.contains(r#""action":"scan_update""#));
        assert!(json.contains(r#""location":"A1""#));
    }

    #[rstest]
    fn payload_omits_missing_location() {
        let payload = LabelPayload::new(9, "Bearing", "Bearing", None, 0, 10, "t");
        let Ok(json) = payload.to_qr_data() else {
            panic!("label payload should serialise");
        };
        assert!(!json.contains("location"));
    }

    #[rstest]
    fn printed_payloads_resolve_back_to_the_item_id() {
        let payload = LabelPayload::new(123, "Bearing", "Bearing", None, 4, 10, "t");
        let Ok(json) = payload.to_qr_data() else {
            panic!("label payload should serialise");
        };
        assert_eq!(resolve(&json), ScanResolution::ItemId(123));
        assert_eq!(resolve(&item_code(123)), ScanResolution::ItemId(123));
        assert_eq!(resolve(&warehouse_code(123)), ScanResolution::ItemId(123));
    }
}
