mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chart_report::color::LabelHashColors;
use chart_report::services::MetadataStore;
use chart_report::source::StaticRecords;
use chart_report::store::{InMemoryArtifactStore, InMemoryMetadataStore};
use chart_report::{
    ArchiveParams, ArchiveRequest, CategorySelector, ChartArtifact, ChartRegistry, ChartStatus,
    Collaborators, ReportConfig, ReportError, ReportService, Result, SingleReportOptions,
    SubjectRecord,
};
use zip::ZipArchive;

use common::{sample_records, FakeAnalyzer, FakeRenderer, FakeTranslator};

const BASE_URL: &str = "https://files.test/charts";

fn service(records: Vec<SubjectRecord>, renderer: FakeRenderer) -> ReportService {
    let registry = ChartRegistry::new(
        Arc::new(InMemoryMetadataStore::new()),
        Arc::new(InMemoryArtifactStore::new(BASE_URL)),
    );
    service_with_registry(records, renderer, registry)
}

fn service_with_registry(
    records: Vec<SubjectRecord>,
    renderer: FakeRenderer,
    registry: ChartRegistry,
) -> ReportService {
    ReportService::new(
        Collaborators {
            source: Arc::new(StaticRecords::new(records)),
            translator: Arc::new(FakeTranslator::default()),
            analyzer: Arc::new(FakeAnalyzer::default()),
            renderer: Arc::new(renderer),
            registry,
        },
        &ReportConfig::default(),
    )
    .with_colors(Arc::new(LabelHashColors))
}

#[tokio::test]
async fn aggregate_reads_from_the_source() {
    let service = service(sample_records(), FakeRenderer::default());
    let distribution = service.aggregate(CategorySelector::Gender).await.unwrap();
    assert_eq!(distribution.labels(), vec!["female", "male"]);

    let empty = service_without_records().aggregate(CategorySelector::Age).await.unwrap();
    assert!(empty.is_empty());
}

fn service_without_records() -> ReportService {
    service(Vec::new(), FakeRenderer::default())
}

#[tokio::test]
async fn single_report_is_stored_and_finalized() {
    let service = service(sample_records(), FakeRenderer::default());
    let key = ReportService::new_chart_key();

    let report = service
        .build_single_report(CategorySelector::Gender, &key, SingleReportOptions::default())
        .await
        .unwrap();

    assert_eq!(report.artifact.status, ChartStatus::Success);
    assert_eq!(report.artifact.version, 1);
    assert_eq!(
        report.artifact.url.as_deref(),
        Some(format!("{BASE_URL}/{key}.pdf").as_str())
    );
    assert!(report.bytes.is_none());

    let stored = service.registry().document(&key).await.unwrap();
    let text = String::from_utf8(stored).unwrap();
    assert_eq!(text.lines().nth(1), Some("Gender"));
    assert!(text.lines().any(|line| line == "female - 60%"));
}

#[tokio::test]
async fn streamed_reports_return_their_bytes() {
    let service = service(sample_records(), FakeRenderer::default());
    service
        .build_single_report(CategorySelector::Age, "first", SingleReportOptions::default())
        .await
        .unwrap();

    let report = service
        .build_single_report(
            CategorySelector::Age,
            "second",
            SingleReportOptions::in_language("Polski").streamed(),
        )
        .await
        .unwrap();

    assert_eq!(report.artifact.version, 2);
    let bytes = report.bytes.unwrap();
    assert_eq!(service.registry().document("second").await.unwrap(), bytes);
    assert!(String::from_utf8(bytes).unwrap().starts_with("Polski\n[Polski] Age"));
}

#[tokio::test]
async fn failed_render_finalizes_as_error() {
    let service = service(sample_records(), FakeRenderer::failing_on("Workplace"));

    let err = service
        .build_single_report(CategorySelector::Workplace, "k", SingleReportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::RenderFailure(_)));

    let artifact = service.registry().get("k").await.unwrap();
    assert_eq!(artifact.status, ChartStatus::Error);
    assert_eq!(artifact.url, None);
    assert!(matches!(
        service.registry().document("k").await,
        Err(ReportError::NotFound(_))
    ));
}

#[tokio::test]
async fn no_records_means_no_artifact() {
    let service = service_without_records();
    let err = service
        .build_single_report(CategorySelector::Age, "k", SingleReportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::EmptyInput));
    assert!(matches!(
        service.registry().get("k").await,
        Err(ReportError::NotFound(_))
    ));
}

#[tokio::test]
async fn archives_create_no_registry_entries() {
    let service = service(sample_records(), FakeRenderer::default());
    let request = ArchiveRequest::try_from(ArchiveParams {
        primary_chart_type: "both".into(),
        categories: vec!["industry".into(), "birth_date".into()],
        language: "English".into(),
    })
    .unwrap();

    let bytes = service.build_archive(&request).await.unwrap();
    let archive = ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(service.registry().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_a_finished_report() {
    let service = service(sample_records(), FakeRenderer::default());
    service
        .build_single_report(CategorySelector::Location, "k", SingleReportOptions::default())
        .await
        .unwrap();

    let removed = service.registry().delete("k").await.unwrap();
    assert_eq!(removed.chart_type, CategorySelector::Location);
    assert!(service.registry().list(CategorySelector::Location).await.unwrap().is_empty());
}

/// Metadata store whose `success` finalize is refused by the backend.
#[derive(Default)]
struct RefusesSuccess {
    inner: InMemoryMetadataStore,
}

#[async_trait]
impl MetadataStore for RefusesSuccess {
    async fn max_version(&self, chart_type: CategorySelector) -> Result<Option<u32>> {
        self.inner.max_version(chart_type).await
    }

    async fn insert_next(&self, chart_type: CategorySelector, key: &str) -> Result<ChartArtifact> {
        self.inner.insert_next(chart_type, key).await
    }

    async fn finalize(
        &self,
        key: &str,
        status: ChartStatus,
        url: Option<String>,
    ) -> Result<ChartArtifact> {
        if status == ChartStatus::Success {
            return Err(ReportError::StoreFailure("metadata backend unavailable".into()));
        }
        self.inner.finalize(key, status, url).await
    }

    async fn get(&self, key: &str) -> Result<Option<ChartArtifact>> {
        self.inner.get(key).await
    }

    async fn list(&self, chart_type: Option<CategorySelector>) -> Result<Vec<ChartArtifact>> {
        self.inner.list(chart_type).await
    }

    async fn remove(&self, key: &str) -> Result<Option<ChartArtifact>> {
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn failed_success_finalize_discards_the_document() {
    let artifacts = Arc::new(InMemoryArtifactStore::new(BASE_URL));
    let registry = ChartRegistry::new(Arc::new(RefusesSuccess::default()), artifacts.clone());
    let service = service_with_registry(sample_records(), FakeRenderer::default(), registry);

    let err = service
        .build_single_report(CategorySelector::Gender, "k", SingleReportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::StoreFailure(_)));

    let artifact = service.registry().get("k").await.unwrap();
    assert_eq!(artifact.status, ChartStatus::Error);
    assert_eq!(artifact.url, None);
    assert!(artifacts.is_empty().await);
}
