use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Column names of the alerting platform's indicator import format, in order.
pub const OUTPUT_HEADER: [&str; 12] = [
    "IndicatorType",
    "IndicatorValue",
    "ExpirationTime",
    "Action",
    "Severity",
    "Title",
    "Description",
    "RecommendedActions",
    "RbacGroups",
    "Category",
    "MitreTechniques",
    "GenerateAlert",
];

/// Destination file name for a source feed: every ".csv" becomes "-ioc.csv".
pub fn output_path_for(input: &str) -> String {
    input.replace(".csv", "-ioc.csv")
}

/// One row of the source feed, addressed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord {
    pub fields: HashMap<String, String>,
}

impl SourceRecord {
    /// Zips a data row with the header row. A repeated header name keeps the
    /// value of its last column.
    pub fn from_row<H, V>(headers: H, row: V) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let fields = headers
            .into_iter()
            .map(Into::into)
            .zip(row.into_iter().map(Into::into))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SourceRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndicatorType {
    IpAddress,
    FileSha256,
    FileSha1,
    Url,
    DomainName,
}

impl IndicatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::IpAddress => "IpAddress",
            IndicatorType::FileSha256 => "FileSha256",
            IndicatorType::FileSha1 => "FileSha1",
            IndicatorType::Url => "Url",
            IndicatorType::DomainName => "DomainName",
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    BlockAndRemediate,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::BlockAndRemediate => "BlockAndRemediate",
            Action::Block => "Block",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A converted indicator. Field order matches [`OUTPUT_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationRecord {
    #[serde(rename = "IndicatorType")]
    pub indicator_type: IndicatorType,
    #[serde(rename = "IndicatorValue")]
    pub indicator_value: String,
    #[serde(rename = "ExpirationTime")]
    pub expiration_time: String,
    #[serde(rename = "Action")]
    pub action: Action,
    #[serde(rename = "Severity")]
    pub severity: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "RecommendedActions")]
    pub recommended_actions: String,
    #[serde(rename = "RbacGroups")]
    pub rbac_groups: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "MitreTechniques")]
    pub mitre_techniques: String,
    #[serde(rename = "GenerateAlert")]
    pub generate_alert: String,
}

impl DestinationRecord {
    pub fn to_fields(&self) -> [String; 12] {
        [
            self.indicator_type.as_str().to_string(),
            self.indicator_value.clone(),
            self.expiration_time.clone(),
            self.action.as_str().to_string(),
            self.severity.clone(),
            self.title.clone(),
            self.description.clone(),
            self.recommended_actions.clone(),
            self.rbac_groups.clone(),
            self.category.clone(),
            self.mitre_techniques.clone(),
            self.generate_alert.clone(),
        ]
    }
}

/// Converted records in source order, plus how many source rows were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    pub records: Vec<DestinationRecord>,
    pub skipped: usize,
}

impl OutputTable {
    /// Header row followed by one row per record.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(OUTPUT_HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>())
            .chain(self.records.iter().map(|r| r.to_fields().to_vec()))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.records.len() + 1
    }
}
