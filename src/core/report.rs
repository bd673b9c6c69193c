use crate::domain::model::{AttributeName, MergedRecord, OutputRow, ProviderId};
use std::collections::BTreeMap;

pub const NO_ERRORS: &str = "No Errors";

pub fn header() -> Vec<String> {
    let mut header = Vec::with_capacity(ProviderId::COUNT + 2);
    header.push("IP".to_string());
    for provider in ProviderId::ALL {
        header.push(format!("{} Data", provider));
    }
    header.push("Errors".to_string());
    header
}

/// Flattens a merged record into one report row. Pure.
pub fn format_row(ip: &str, merged: &MergedRecord) -> OutputRow {
    let provider_blocks = ProviderId::ALL
        .into_iter()
        .map(|provider| (provider, provider_block(merged, provider)))
        .collect::<BTreeMap<_, _>>();

    OutputRow {
        ip: ip.to_string(),
        provider_blocks,
        errors: error_block(merged),
    }
}

/// `Label: value` lines for one provider, absent attributes skipped.
pub fn provider_block(merged: &MergedRecord, provider: ProviderId) -> String {
    AttributeName::ALL
        .into_iter()
        .filter_map(|attribute| {
            merged
                .value(attribute, provider)
                .map(|value| format!("{}: {}", attribute.label(), value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn error_block(merged: &MergedRecord) -> String {
    if !merged.has_errors() {
        return NO_ERRORS.to_string();
    }

    merged
        .errors()
        .map(|(provider, reason)| format!("{}: {}", provider, reason))
        .collect::<Vec<_>>()
        .join("\n")
}
