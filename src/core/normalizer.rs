use crate::domain::model::{
    AttributeName, Attributes, ProviderId, ProviderResult, RawFields, RawResult,
};
use serde_json::Value;

/// Per-provider field mapping from raw response keys to the common vocabulary.
pub trait FieldMapping: Send + Sync {
    fn map_fields(&self, raw: &RawFields) -> Attributes;
}

/// ipinfo.io: `loc` is already a `lat,lon` string.
pub struct IpInfoMapping;

/// ip-api.com: coordinates come as two numbers, region name and ISP are separate keys.
pub struct IpApiMapping;

const IPINFO_FIELDS: &[(&str, AttributeName)] = &[
    ("city", AttributeName::City),
    ("region", AttributeName::Region),
    ("country", AttributeName::Country),
    ("loc", AttributeName::Location),
    ("org", AttributeName::Organization),
    ("timezone", AttributeName::Timezone),
    ("postal", AttributeName::Postal),
    ("hostname", AttributeName::Hostname),
];

const IPAPI_FIELDS: &[(&str, AttributeName)] = &[
    ("city", AttributeName::City),
    ("regionName", AttributeName::Region),
    ("countryCode", AttributeName::Country),
    ("org", AttributeName::Organization),
    ("timezone", AttributeName::Timezone),
    ("zip", AttributeName::Postal),
    ("reverse", AttributeName::Hostname),
    ("isp", AttributeName::Isp),
];

impl FieldMapping for IpInfoMapping {
    fn map_fields(&self, raw: &RawFields) -> Attributes {
        map_direct(raw, IPINFO_FIELDS)
    }
}

impl FieldMapping for IpApiMapping {
    fn map_fields(&self, raw: &RawFields) -> Attributes {
        let mut attributes = map_direct(raw, IPAPI_FIELDS);

        // 經緯度兩者皆有才組合成 "lat,lon"
        let location = match (
            raw.get("lat").and_then(scalar_text),
            raw.get("lon").and_then(scalar_text),
        ) {
            (Some(lat), Some(lon)) => Some(format!("{},{}", lat, lon)),
            _ => None,
        };
        attributes.set(AttributeName::Location, location);

        attributes
    }
}

pub fn mapping_for(provider: ProviderId) -> &'static dyn FieldMapping {
    match provider {
        ProviderId::IpInfo => &IpInfoMapping,
        ProviderId::IpApi => &IpApiMapping,
    }
}

/// Rewrites a provider's raw result into the common vocabulary.
/// A `Failure` passes through unchanged.
pub fn normalize(provider: ProviderId, raw: RawResult) -> ProviderResult {
    match raw {
        ProviderResult::Success(fields) => {
            ProviderResult::Success(mapping_for(provider).map_fields(&fields))
        }
        ProviderResult::Failure(reason) => ProviderResult::Failure(reason),
    }
}

fn map_direct(raw: &RawFields, table: &[(&str, AttributeName)]) -> Attributes {
    let mut attributes = Attributes::new();
    for (key, attribute) in table {
        attributes.set(*attribute, raw.get(*key).and_then(scalar_text));
    }
    attributes
}

/// Strings verbatim, numbers and booleans as their JSON text. Anything else is absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> RawFields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_ipinfo_mapping() {
        let raw = fields(json!({
            "ip": "8.8.8.8",
            "hostname": "dns.google",
            "city": "Mountain View",
            "region": "California",
            "country": "US",
            "loc": "37.4056,-122.0775",
            "org": "AS15169 Google LLC",
            "postal": "94043",
            "timezone": "America/Los_Angeles",
            "anycast": true
        }));

        let attrs = IpInfoMapping.map_fields(&raw);

        assert_eq!(attrs.get(AttributeName::City), Some("Mountain View"));
        assert_eq!(attrs.get(AttributeName::Location), Some("37.4056,-122.0775"));
        assert_eq!(attrs.get(AttributeName::Organization), Some("AS15169 Google LLC"));
        assert_eq!(attrs.get(AttributeName::Hostname), Some("dns.google"));
        assert_eq!(attrs.get(AttributeName::Isp), None);
    }

    #[test]
    fn test_ipapi_mapping_joins_coordinates() {
        let raw = fields(json!({
            "status": "success",
            "country": "United States",
            "countryCode": "US",
            "regionName": "Virginia",
            "city": "Ashburn",
            "zip": "20149",
            "lat": 39.03,
            "lon": -77.5,
            "timezone": "America/New_York",
            "isp": "Google LLC",
            "org": "Google Public DNS",
            "as": "AS15169 Google LLC"
        }));

        let attrs = IpApiMapping.map_fields(&raw);

        assert_eq!(attrs.get(AttributeName::Location), Some("39.03,-77.5"));
        assert_eq!(attrs.get(AttributeName::Country), Some("US"));
        assert_eq!(attrs.get(AttributeName::Region), Some("Virginia"));
        assert_eq!(attrs.get(AttributeName::Postal), Some("20149"));
        assert_eq!(attrs.get(AttributeName::Isp), Some("Google LLC"));
        assert_eq!(attrs.get(AttributeName::Hostname), None);
    }

    #[test]
    fn test_ipapi_location_needs_both_coordinates() {
        let raw = fields(json!({"lat": 39.03, "city": "Ashburn"}));
        let attrs = IpApiMapping.map_fields(&raw);

        assert_eq!(attrs.get(AttributeName::Location), None);
        assert_eq!(attrs.get(AttributeName::City), Some("Ashburn"));
    }

    #[test]
    fn test_null_and_empty_values_are_absent() {
        let raw = fields(json!({"city": null, "region": "", "country": ["US"]}));
        let attrs = IpInfoMapping.map_fields(&raw);

        assert!(attrs.is_empty());
    }

    #[test]
    fn test_failure_passes_through() {
        let raw = ProviderResult::Failure("Failed to fetch data (status 500)".to_string());
        assert_eq!(
            normalize(ProviderId::IpInfo, raw),
            ProviderResult::Failure("Failed to fetch data (status 500)".to_string())
        );
    }
}
