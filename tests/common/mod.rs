#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chart_report::aggregate::Distribution;
use chart_report::config::LayoutConfig;
use chart_report::document::DocumentServices;
use chart_report::fonts::FontTable;
use chart_report::model::ReportLayout;
use chart_report::services::{Analyzer, Renderer, TextBatch, Translator};
use chart_report::{ReportError, Result, SubjectRecord};
use chrono::NaiveDate;

pub const DEFAULT_LANGUAGE: &str = "English";

/// Prefixes every string with the target language.
#[derive(Default)]
pub struct FakeTranslator {
    pub text_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    /// Batch keys whose returned list is one item short.
    pub truncate: HashSet<String>,
    pub fail_text: bool,
    pub fail_batch: bool,
}

impl FakeTranslator {
    pub fn truncating(keys: &[&str]) -> Self {
        Self {
            truncate: keys.iter().map(|key| (*key).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

pub fn translated(text: &str, language: &str) -> String {
    format!("[{language}] {text}")
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, language: &str) -> Result<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_text {
            return Err(ReportError::TranslationUnavailable("translator offline".into()));
        }
        Ok(translated(text, language))
    }

    async fn translate_batch(&self, batch: &TextBatch, language: &str) -> Result<TextBatch> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch {
            return Err(ReportError::TranslationUnavailable("translator offline".into()));
        }
        Ok(batch
            .iter()
            .map(|(key, values)| {
                let mut out: Vec<String> =
                    values.iter().map(|value| translated(value, language)).collect();
                if self.truncate.contains(key) {
                    out.pop();
                }
                (key.clone(), out)
            })
            .collect())
    }
}

/// Names the first entry of the distribution.
#[derive(Default)]
pub struct FakeAnalyzer {
    pub fail: bool,
}

pub fn analysis_of(distribution: &Distribution) -> String {
    match distribution.iter().next() {
        Some(entry) => format!("{} leads with {}%.", entry.label, entry.percentage),
        None => "No data.".to_owned(),
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, distribution: &Distribution) -> Result<String> {
        if self.fail {
            return Err(ReportError::AnalysisUnavailable("model not loaded".into()));
        }
        Ok(format!("  {}  ", analysis_of(distribution)))
    }
}

/// Emits a text dump of the layout instead of a PDF.
#[derive(Default)]
pub struct FakeRenderer {
    /// Layouts whose header contains this text fail to render.
    pub fail_on_header: Option<String>,
    pub renders: AtomicUsize,
}

impl FakeRenderer {
    pub fn failing_on(header: &str) -> Self {
        Self {
            fail_on_header: Some(header.to_owned()),
            ..Self::default()
        }
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

pub fn header_text(layout: &ReportLayout) -> String {
    layout
        .header
        .as_ref()
        .map(|header| header.texts().join(" "))
        .unwrap_or_default()
}

/// Byte dump a [`FakeRenderer`] produces for `layout`.
pub fn dump(layout: &ReportLayout) -> Vec<u8> {
    let mut lines = vec![layout.language.clone(), header_text(layout)];
    lines.extend(layout.body_texts());
    lines.join("\n").into_bytes()
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, layout: &ReportLayout, _fonts: &FontTable) -> Result<Vec<u8>> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let header = header_text(layout);
        if let Some(marker) = &self.fail_on_header {
            if header.contains(marker.as_str()) {
                return Err(ReportError::RenderFailure(format!("cannot lay out {header}")));
            }
        }
        Ok(dump(layout))
    }
}

pub fn services(translator: Arc<FakeTranslator>, analyzer: Arc<FakeAnalyzer>) -> DocumentServices {
    DocumentServices {
        translator,
        analyzer,
        default_language: DEFAULT_LANGUAGE.to_owned(),
        layout: LayoutConfig::default(),
    }
}

pub fn subject(id: i64, gender: &str, age: u32, location: &str) -> SubjectRecord {
    SubjectRecord {
        id,
        name: format!("subject-{id}"),
        age,
        gender: gender.to_owned(),
        workplace: "Acme".to_owned(),
        industry: "Logistics".to_owned(),
        location: location.to_owned(),
        birth_date: NaiveDate::from_ymd_opt(1980 + (id % 3) as i32, 6, 1).unwrap(),
    }
}

/// Ten subjects: six female and four male, aged 30 or 40, in two cities.
pub fn sample_records() -> Vec<SubjectRecord> {
    (0..10)
        .map(|id| {
            let gender = if id < 6 { "female" } else { "male" };
            let age = if id % 2 == 0 { 30 } else { 40 };
            let location = if id < 3 { "Lisbon" } else { "Porto" };
            subject(id, gender, age, location)
        })
        .collect()
}
