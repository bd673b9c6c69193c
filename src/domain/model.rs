use std::collections::BTreeMap;
use std::fmt;

/// 已註冊的查詢服務，宣告順序即為報表欄位順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderId {
    IpInfo,
    IpApi,
}

impl ProviderId {
    pub const COUNT: usize = 2;
    pub const ALL: [ProviderId; Self::COUNT] = [ProviderId::IpInfo, ProviderId::IpApi];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderId::IpInfo => "IPInfo",
            ProviderId::IpApi => "IP-API",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 共用屬性詞彙 (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeName {
    City,
    Region,
    Country,
    Location,
    Organization,
    Timezone,
    Postal,
    Hostname,
    Isp,
}

impl AttributeName {
    pub const COUNT: usize = 9;
    pub const ALL: [AttributeName; Self::COUNT] = [
        AttributeName::City,
        AttributeName::Region,
        AttributeName::Country,
        AttributeName::Location,
        AttributeName::Organization,
        AttributeName::Timezone,
        AttributeName::Postal,
        AttributeName::Hostname,
        AttributeName::Isp,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Label used in the report's `Label: value` lines.
    pub fn label(self) -> &'static str {
        match self {
            AttributeName::City => "City",
            AttributeName::Region => "Region",
            AttributeName::Country => "Country",
            AttributeName::Location => "Location",
            AttributeName::Organization => "Org",
            AttributeName::Timezone => "Timezone",
            AttributeName::Postal => "Postal",
            AttributeName::Hostname => "Hostname",
            AttributeName::Isp => "ISP",
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 單一服務查詢結果。成功時帶屬性集合，失敗時帶可讀的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult<T = Attributes> {
    Success(T),
    Failure(String),
}

impl<T> ProviderResult<T> {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProviderResult::Failure(_))
    }
}

/// Provider-specific JSON fields, exactly as decoded from the response body.
pub type RawFields = serde_json::Map<String, serde_json::Value>;

/// What a provider client hands back before normalization.
pub type RawResult = ProviderResult<RawFields>;

/// Normalized attribute set of one provider. A slot that is `None` means the
/// provider does not define that attribute; empty strings never get stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: [Option<String>; AttributeName::COUNT],
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: AttributeName) -> Option<&str> {
        self.values[name.index()].as_deref()
    }

    pub fn set(&mut self, name: AttributeName, value: Option<String>) {
        self.values[name.index()] = value.filter(|v| !v.is_empty());
    }

    pub fn with(mut self, name: AttributeName, value: &str) -> Self {
        self.set(name, Some(value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// 單一 IP 的合併結果：屬性 × 服務的固定表格，加上每個服務的錯誤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedRecord {
    values: [[Option<String>; ProviderId::COUNT]; AttributeName::COUNT],
    errors: [Option<String>; ProviderId::COUNT],
}

impl MergedRecord {
    pub fn value(&self, attribute: AttributeName, provider: ProviderId) -> Option<&str> {
        self.values[attribute.index()][provider.index()].as_deref()
    }

    pub fn error(&self, provider: ProviderId) -> Option<&str> {
        self.errors[provider.index()].as_deref()
    }

    /// Replaces everything known about `provider` with its successful attributes.
    pub fn record_success(&mut self, provider: ProviderId, attributes: &Attributes) {
        for attribute in AttributeName::ALL {
            self.values[attribute.index()][provider.index()] =
                attributes.get(attribute).map(str::to_string);
        }
        self.errors[provider.index()] = None;
    }

    /// A failed provider contributes no partial data.
    pub fn record_failure(&mut self, provider: ProviderId, reason: String) {
        for attribute in AttributeName::ALL {
            self.values[attribute.index()][provider.index()] = None;
        }
        self.errors[provider.index()] = Some(reason);
    }

    /// Providers with a recorded failure, in registration order.
    pub fn errors(&self) -> impl Iterator<Item = (ProviderId, &str)> + '_ {
        ProviderId::ALL
            .into_iter()
            .filter_map(move |id| self.error(id).map(|reason| (id, reason)))
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Option::is_some)
    }

    pub fn failed_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_some()).count()
    }
}

/// One report row: the IP, one text block per provider, and the error block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub ip: String,
    pub provider_blocks: BTreeMap<ProviderId, String>,
    pub errors: String,
}

impl OutputRow {
    pub fn block(&self, provider: ProviderId) -> &str {
        self.provider_blocks
            .get(&provider)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Fields in column order: IP, provider blocks, errors.
    pub fn to_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(ProviderId::COUNT + 2);
        fields.push(self.ip.as_str());
        for provider in ProviderId::ALL {
            fields.push(self.block(provider));
        }
        fields.push(self.errors.as_str());
        fields
    }
}

/// 整批處理的統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub fully_resolved: usize,
    pub partially_failed: usize,
    pub all_failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, merged: &MergedRecord) {
        self.processed += 1;
        match merged.failed_count() {
            0 => self.fully_resolved += 1,
            n if n == ProviderId::COUNT => self.all_failed += 1,
            _ => self.partially_failed += 1,
        }
    }
}
