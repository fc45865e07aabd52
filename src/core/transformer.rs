//! Row-level conversion from the CERT-SE feed schema to the alerting
//! platform's indicator schema.

use crate::domain::model::{Action, DestinationRecord, IndicatorType, OutputTable, SourceRecord};
use chrono::{DateTime, Duration, Utc};

pub const EXPIRATION_DAYS: i64 = 10;
pub const SEVERITY: &str = "High";
pub const RECOMMENDED_ACTIONS: &str = "Remediate";
pub const GENERATE_ALERT: &str = "TRUE";
pub const DEFAULT_TITLE: &str = "IOC";
pub const TITLE_SOURCE: &str = "FROM CERT-SE";
pub const DEFAULT_DESCRIPTION: &str = "No description";
pub const INVALID_VALUE: &str = "INVALID";

const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.0Z";
const TITLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Source `type` tokens the destination format has an equivalent for.
pub const INDICATOR_TYPE_MAP: [(&str, IndicatorType); 6] = [
    ("ip-src", IndicatorType::IpAddress),
    ("ip-dst", IndicatorType::IpAddress),
    ("sha256", IndicatorType::FileSha256),
    ("sha1", IndicatorType::FileSha1),
    ("url", IndicatorType::Url),
    ("domain", IndicatorType::DomainName),
];

/// Exact, case-sensitive lookup in [`INDICATOR_TYPE_MAP`].
pub fn translate_type(source_type: &str) -> Option<IndicatorType> {
    INDICATOR_TYPE_MAP
        .iter()
        .find(|(token, _)| *token == source_type)
        .map(|(_, indicator_type)| *indicator_type)
}

pub fn classify_action(source_type: &str) -> Action {
    match source_type {
        "sha1" | "sha256" => Action::BlockAndRemediate,
        _ => Action::Block,
    }
}

/// Reverses bracketed-dot defanging, e.g. `1[.]2[.]3[.]4` becomes `1.2.3.4`.
pub fn defuse(value: &str) -> String {
    value.replace("[.]", ".")
}

pub fn format_expiration(now: DateTime<Utc>) -> String {
    (now + Duration::days(EXPIRATION_DAYS))
        .format(EXPIRATION_FORMAT)
        .to_string()
}

pub fn format_title_date(now: DateTime<Utc>) -> String {
    now.format(TITLE_DATE_FORMAT).to_string()
}

fn non_empty<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Converts one source row, or returns `None` when its type has no
/// destination equivalent.
pub fn transform_row(row: &SourceRecord, now: DateTime<Utc>) -> Option<DestinationRecord> {
    let source_type = row.get("type").unwrap_or_default();
    let indicator_type = translate_type(source_type)?;

    let title = format!(
        "{} {} {}",
        non_empty(row.get("object_name"), DEFAULT_TITLE),
        TITLE_SOURCE,
        format_title_date(now)
    );

    Some(DestinationRecord {
        indicator_type,
        indicator_value: defuse(non_empty(row.get("value"), INVALID_VALUE)),
        expiration_time: format_expiration(now),
        action: classify_action(source_type),
        severity: SEVERITY.to_string(),
        title,
        description: non_empty(row.get("comment"), DEFAULT_DESCRIPTION).to_string(),
        recommended_actions: RECOMMENDED_ACTIONS.to_string(),
        rbac_groups: String::new(),
        category: String::new(),
        mitre_techniques: String::new(),
        generate_alert: GENERATE_ALERT.to_string(),
    })
}

/// Converts every row in order, dropping the ones [`transform_row`] rejects.
pub fn transform_table<'a, I>(rows: I, now: DateTime<Utc>) -> OutputTable
where
    I: IntoIterator<Item = &'a SourceRecord>,
{
    let mut table = OutputTable::default();

    for (index, row) in rows.into_iter().enumerate() {
        match transform_row(row, now) {
            Some(record) => table.records.push(record),
            None => {
                tracing::debug!(
                    "Skipping row {} with untranslatable type {:?}",
                    index + 1,
                    row.get("type").unwrap_or_default()
                );
                table.skipped += 1;
            }
        }
    }

    table
}
