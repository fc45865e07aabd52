use crate::core::transformer::transform_table;
use crate::core::{Clock, ConfigProvider, OutputTable, Pipeline, SourceRecord, Storage};
use crate::domain::model::OUTPUT_HEADER;
use crate::utils::error::{EtlError, Result};

/// Reads a CERT-SE indicator feed, converts it, and writes the `-ioc.csv`
/// companion file next to it.
pub struct IocPipeline<S: Storage, C: ConfigProvider, K: Clock> {
    storage: S,
    config: C,
    clock: K,
}

impl<S: Storage, C: ConfigProvider, K: Clock> IocPipeline<S, C, K> {
    pub fn new(storage: S, config: C, clock: K) -> Self {
        Self {
            storage,
            config,
            clock,
        }
    }
}

/// Parses the feed: first row is the header, every further row is zipped with it.
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn parse_source(data: &[u8]) -> Result<Vec<SourceRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(map_csv_error)?
        .iter()
        .map(lossy)
        .collect();
    tracing::debug!("Source columns: {:?}", headers);

    let mut records = Vec::new();
    for result in reader.byte_records() {
        let row = result.map_err(map_csv_error)?;
        records.push(SourceRecord::from_row(
            headers.iter().cloned(),
            row.iter().map(lossy),
        ));
    }

    Ok(records)
}

/// Serializes the header and every record into one buffer. Fields are quoted
/// only when they hold a comma, quote or line break; a leading space alone
/// does not trigger quoting.
pub fn render_table(table: &OutputTable) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(OUTPUT_HEADER)?;
    for record in &table.records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("failed to flush CSV output: {}", e),
    })
}

fn lossy(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn map_csv_error(err: csv::Error) -> EtlError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => EtlError::MalformedRow {
            line: pos.as_ref().map(|p| p.line()).unwrap_or_default(),
            expected: *expected_len as usize,
            found: *len as usize,
        },
        _ => EtlError::CsvError(err),
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, K: Clock> Pipeline for IocPipeline<S, C, K> {
    async fn extract(&self) -> Result<Vec<SourceRecord>> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading source feed from: {}", input_path);

        let data = self.storage.read_file(input_path).await?;
        tracing::debug!("Read {} bytes", data.len());

        parse_source(&data)
    }

    async fn transform(&self, data: Vec<SourceRecord>) -> Result<OutputTable> {
        let now = self.clock.now();
        tracing::debug!("Converting {} rows at {}", data.len(), now);

        Ok(transform_table(&data, now))
    }

    async fn load(&self, result: OutputTable) -> Result<String> {
        let output_path = self.config.output_path();
        let data = render_table(&result)?;

        tracing::debug!("Writing {} bytes to {}", data.len(), output_path);
        self.storage.write_file(&output_path, &data).await?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        input_path: String,
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 25, 8, 30, 0).unwrap()
    }

    fn pipeline(storage: MockStorage) -> IocPipeline<MockStorage, MockConfig, FixedClock> {
        let config = MockConfig {
            input_path: "feeds/cert-se.csv".to_string(),
        };
        IocPipeline::new(storage, config, FixedClock(fixed_now()))
    }

    const HEADER_LINE: &str = "IndicatorType,IndicatorValue,ExpirationTime,Action,Severity,Title,Description,RecommendedActions,RbacGroups,Category,MitreTechniques,GenerateAlert";

    #[tokio::test]
    async fn test_extract_zips_rows_with_header() {
        let storage = MockStorage::new();
        storage
            .put_file(
                "feeds/cert-se.csv",
                "comment,value,type\nfirst,1[.]1[.]1[.]1,ip-src\n,evil.se,domain\n",
            )
            .await;

        let records = pipeline(storage).extract().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("type"), Some("ip-src"));
        assert_eq!(records[0].get("comment"), Some("first"));
        assert_eq!(records[1].get("value"), Some("evil.se"));
        assert_eq!(records[1].get("comment"), Some(""));
    }

    #[tokio::test]
    async fn test_extract_empty_file_yields_no_records() {
        let storage = MockStorage::new();
        storage.put_file("feeds/cert-se.csv", "").await;

        let records = pipeline(storage).extract().await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_extract_missing_file_is_io_error() {
        let result = pipeline(MockStorage::new()).extract().await;

        assert!(matches!(result, Err(EtlError::IoError(_))));
    }

    #[tokio::test]
    async fn test_extract_short_row_is_malformed() {
        let storage = MockStorage::new();
        storage
            .put_file("feeds/cert-se.csv", "type,value,comment\nurl,http://a.se\n")
            .await;

        let result = pipeline(storage).extract().await;

        match result {
            Err(EtlError::MalformedRow {
                line,
                expected,
                found,
            }) => {
                assert_eq!(line, 2);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transform_uses_clock_once_for_all_rows() {
        let rows = vec![
            SourceRecord::from_row(["type", "value"], ["sha1", "aa"]),
            SourceRecord::from_row(["type", "value"], ["md5", "bb"]),
            SourceRecord::from_row(["type", "value"], ["url", "http://c[.]se"]),
        ];

        let table = pipeline(MockStorage::new()).transform(rows).await.unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.skipped, 1);
        for record in &table.records {
            assert_eq!(record.expiration_time, "2024-04-04T08:30:00.0Z");
            assert!(record.title.ends_with("FROM CERT-SE 2024-03-25"));
        }
    }

    #[tokio::test]
    async fn test_load_writes_header_only_for_empty_table() {
        let storage = MockStorage::new();
        let pipeline = pipeline(storage.clone());

        let output_path = pipeline.load(OutputTable::default()).await.unwrap();

        assert_eq!(output_path, "feeds/cert-se-ioc.csv");
        let content = storage.get_file("feeds/cert-se-ioc.csv").await.unwrap();
        assert_eq!(content, format!("{}\n", HEADER_LINE));
    }

    #[tokio::test]
    async fn test_load_quotes_fields_with_commas() {
        let storage = MockStorage::new();
        let pipeline = pipeline(storage.clone());
        let rows = vec![SourceRecord::from_row(
            ["type", "value", "comment"],
            ["domain", "evil[.]se", "phishing, credential theft"],
        )];

        let table = pipeline.transform(rows).await.unwrap();
        pipeline.load(table).await.unwrap();

        let content = storage.get_file("feeds/cert-se-ioc.csv").await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "DomainName,evil.se,2024-04-04T08:30:00.0Z,Block,High,IOC FROM CERT-SE 2024-03-25,\"phishing, credential theft\",Remediate,,,,TRUE"
        );
    }

    #[test]
    fn test_parse_source_replaces_invalid_utf8() {
        let data = b"type,value,comment\nurl,\xff\xfe,r\xe4ksm\xf6rg\xe5s\n";

        let records = parse_source(data).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("type"), Some("url"));
        assert_eq!(records[0].get("value"), Some("\u{FFFD}\u{FFFD}"));
        assert_eq!(records[0].get("comment"), Some("r\u{FFFD}ksm\u{FFFD}rg\u{FFFD}s"));
    }

    #[test]
    fn test_render_table_leaves_leading_space_unquoted() {
        let rows = vec![SourceRecord::from_row(["type", "value"], ["url", " http://a.se"])];
        let table = transform_table(&rows, fixed_now());

        let rendered = String::from_utf8(render_table(&table).unwrap()).unwrap();

        assert!(rendered.lines().nth(1).unwrap().starts_with("Url, http://a.se,"));
    }

    #[test]
    fn test_render_table_matches_row_view() {
        let rows = vec![SourceRecord::from_row(
            ["type", "value", "object_name", "comment"],
            ["sha256", "abcd", "BadFile", "test comment"],
        )];
        let table = transform_table(&rows, fixed_now());

        let rendered = String::from_utf8(render_table(&table).unwrap()).unwrap();
        let expected: Vec<String> = table.to_rows().iter().map(|r| r.join(",")).collect();

        assert_eq!(rendered.lines().collect::<Vec<_>>(), expected);
    }
}
