//! Sequential batch import.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{ImportDetail, ImportResult, Record};
use crate::oai::dublin_core;
use crate::oai::sink::{Sink, SinkError, Submission};

/// Delivers records one at a time and reports per-record outcomes
///
/// A failing record never stops the batch; every failure, including a timeout,
/// ends up as a `failed` detail.
#[derive(Debug, Clone)]
pub struct Importer {
    sink: Arc<dyn Sink>,
    timeout: Duration,
}

impl Importer {
    pub fn new(sink: Arc<dyn Sink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Import `records` in order
    pub async fn import_batch(&self, records: &[Record]) -> ImportResult {
        let mut result = ImportResult::new();

        for record in records {
            let detail = match self.import_one(record).await {
                Ok(()) => ImportDetail::success(&record.identifier, &record.title),
                Err(error) => {
                    tracing::warn!(identifier = %record.identifier, %error, "import failed");
                    ImportDetail::failed(&record.identifier, &record.title, error)
                }
            };
            result.push(detail);
        }

        tracing::info!(
            total = result.total,
            successful = result.successful,
            failed = result.failed,
            sink = self.sink.name(),
            "batch imported"
        );
        result
    }

    async fn import_one(&self, record: &Record) -> Result<(), String> {
        if record.identifier.trim().is_empty() {
            return Err("Record has no identifier".to_string());
        }

        let content = dublin_core::serialize(record).map_err(|e| e.to_string())?;
        let submission = Submission::oai_dc(&record.identifier, content);

        match tokio::time::timeout(self.timeout, self.sink.deliver(&submission)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(SinkError::Timeout(self.timeout).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImportStatus;
    use crate::oai::MockSink;
    use crate::sources::mock::make_record;

    fn records(n: usize) -> Vec<Record> {
        (1..=n)
            .map(|i| make_record("zenodo", &i.to_string(), &format!("Record {}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_all_accepted() {
        let sink = Arc::new(MockSink::new());
        let importer = Importer::new(sink.clone(), Duration::from_secs(5));

        let result = importer.import_batch(&records(3)).await;

        assert_eq!(result.total, 3);
        assert_eq!(result.successful, 3);
        assert_eq!(result.failed, 0);
        assert!(result.is_consistent());
        assert_eq!(sink.delivered_ids(), vec!["zenodo:1", "zenodo:2", "zenodo:3"]);

        let submission = &sink.delivered()[0];
        assert_eq!(submission.metadata_prefix, "oai_dc");
        assert!(submission.content.contains("<dc:title>Record 1</dc:title>"));
    }

    #[tokio::test]
    async fn test_rejection_is_recorded_verbatim() {
        let sink = Arc::new(MockSink::new());
        sink.reject("zenodo:2", "Record zenodo:2 already exists");
        let importer = Importer::new(sink.clone(), Duration::from_secs(5));

        let result = importer.import_batch(&records(3)).await;

        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        let failed = &result.details[1];
        assert_eq!(failed.status, ImportStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("Record zenodo:2 already exists"));
        assert_eq!(sink.delivered_ids(), vec!["zenodo:1", "zenodo:3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_only_that_record() {
        let sink = Arc::new(MockSink::new());
        sink.delay("zenodo:2", Duration::from_secs(120));
        let importer = Importer::new(sink.clone(), Duration::from_secs(60));

        let result = importer.import_batch(&records(3)).await;

        assert_eq!(result.total, 3);
        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(
            result.details[1].error.as_deref(),
            Some("Import timed out after 60s")
        );
        assert!(result.details[0].is_success());
        assert!(result.details[2].is_success());
    }

    #[tokio::test]
    async fn test_empty_identifier_fails_locally() {
        let sink = Arc::new(MockSink::new());
        let importer = Importer::new(sink.clone(), Duration::from_secs(5));

        let mut batch = records(2);
        batch[0].identifier = String::new();
        let result = importer.import_batch(&batch).await;

        assert_eq!(result.failed, 1);
        assert_eq!(result.details[0].error.as_deref(), Some("Record has no identifier"));
        assert_eq!(sink.delivered_ids(), vec!["zenodo:2"]);
    }

    #[tokio::test]
    async fn test_unserializable_record_is_not_delivered() {
        let sink = Arc::new(MockSink::new());
        let importer = Importer::new(sink.clone(), Duration::from_secs(5));

        let mut batch = records(3);
        batch[1].description = "stray\u{1b}escape".to_string();
        let result = importer.import_batch(&batch).await;

        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        assert!(result.is_consistent());
        assert_eq!(
            result.details[1].error.as_deref(),
            Some("Invalid character '\\u{1b}' in dc:description")
        );
        assert_eq!(sink.delivered_ids(), vec!["zenodo:1", "zenodo:3"]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let importer = Importer::new(Arc::new(MockSink::new()), Duration::from_secs(5));
        let result = importer.import_batch(&[]).await;
        assert_eq!(result, ImportResult::default());
    }
}
