mod common;

use std::sync::Arc;

use chart_report::aggregate::aggregate;
use chart_report::color::LabelHashColors;
use chart_report::document::{header_block, page_number_footer, BAR_CHART_TITLE, LEGEND_TITLE};
use chart_report::fonts::FontTable;
use chart_report::model::{Block, Footer};
use chart_report::richtext::Span;
use chart_report::{CategorySelector, ReportDocument, ReportError};

use common::{
    analysis_of, dump, sample_records, services, translated, FakeAnalyzer, FakeRenderer,
    FakeTranslator, DEFAULT_LANGUAGE,
};

fn gender_distribution() -> chart_report::Distribution {
    aggregate(&sample_records(), CategorySelector::Gender, &LabelHashColors)
}

#[tokio::test]
async fn default_language_never_calls_the_translator() {
    let translator = Arc::new(FakeTranslator::default());
    let services = services(Arc::clone(&translator), Arc::new(FakeAnalyzer::default()));
    let distribution = gender_distribution();

    let mut document = ReportDocument::new(&services, DEFAULT_LANGUAGE);
    document.add_chart_block(&distribution).await.unwrap();
    document.add_bar_block(&distribution).await.unwrap();
    document.add_narrative_block(&distribution).await.unwrap();

    assert_eq!(translator.text_calls(), 0);
    assert_eq!(document.blocks().len(), 3);

    let texts = document.layout().body_texts();
    assert_eq!(
        texts,
        vec![
            LEGEND_TITLE.to_owned(),
            "female".to_owned(),
            "male".to_owned(),
            BAR_CHART_TITLE.to_owned(),
            "female - 60%".to_owned(),
            "male - 40%".to_owned(),
            analysis_of(&distribution),
        ]
    );
}

#[tokio::test]
async fn other_languages_localize_titles_and_narrative() {
    let translator = Arc::new(FakeTranslator::default());
    let services = services(Arc::clone(&translator), Arc::new(FakeAnalyzer::default()));
    let distribution = gender_distribution();

    let mut document = ReportDocument::new(&services, "Deutsch");
    document.add_chart_block(&distribution).await.unwrap();
    document.add_bar_block(&distribution).await.unwrap();
    document.add_narrative_block(&distribution).await.unwrap();

    assert_eq!(translator.text_calls(), 3);
    let texts = document.layout().body_texts();
    assert_eq!(texts[0], translated(LEGEND_TITLE, "Deutsch"));
    assert_eq!(texts[3], translated(BAR_CHART_TITLE, "Deutsch"));
    assert_eq!(
        texts.last().unwrap(),
        &translated(&analysis_of(&distribution), "Deutsch")
    );
}

#[tokio::test]
async fn chart_block_places_pie_beside_legend() {
    let services = services(
        Arc::new(FakeTranslator::default()),
        Arc::new(FakeAnalyzer::default()),
    );
    let distribution = gender_distribution();

    let mut document = ReportDocument::new(&services, DEFAULT_LANGUAGE);
    document.add_chart_block(&distribution).await.unwrap();

    let Block::Columns(columns) = &document.blocks()[0] else {
        panic!("chart block should be two columns");
    };
    assert_eq!(columns.weights(), &[7, 3]);
    match &columns.columns()[0][..] {
        [Block::PieChart(chart)] => {
            assert_eq!(chart.slices.len(), 2);
            assert_eq!(chart.stroke_width, 40.0);
        }
        other => panic!("unexpected left column {other:?}"),
    }
}

#[tokio::test]
async fn translator_failure_aborts_assembly() {
    let translator = Arc::new(FakeTranslator {
        fail_text: true,
        ..FakeTranslator::default()
    });
    let services = services(translator, Arc::new(FakeAnalyzer::default()));
    let distribution = gender_distribution();

    let mut document = ReportDocument::new(&services, "Italiano");
    let err = document.add_chart_block(&distribution).await.unwrap_err();

    match err {
        ReportError::RenderDependency(inner) => {
            assert!(matches!(*inner, ReportError::TranslationUnavailable(_)))
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(document.blocks().is_empty());
}

#[tokio::test]
async fn analyzer_failure_is_a_render_dependency() {
    let services = services(
        Arc::new(FakeTranslator::default()),
        Arc::new(FakeAnalyzer { fail: true }),
    );
    let mut document = ReportDocument::new(&services, DEFAULT_LANGUAGE);
    let err = document
        .add_narrative_block(&gender_distribution())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::RenderDependency(_)));
}

#[tokio::test]
async fn header_and_footer_are_replaced_not_appended() {
    let services = services(
        Arc::new(FakeTranslator::default()),
        Arc::new(FakeAnalyzer::default()),
    );
    let mut document = ReportDocument::new(&services, DEFAULT_LANGUAGE);

    document.set_header(header_block("First"));
    document.set_header(header_block("Second"));
    document.set_footer(Block::text(Span::new("static")));
    document.set_footer(page_number_footer());

    assert_eq!(document.header().unwrap().texts(), vec!["Second"]);
    let footer = document.footer().unwrap();
    assert!(matches!(footer, Footer::PerPage(_)));
    assert_eq!(footer.block_for_page(2).texts(), vec!["Page 2"]);
    assert!(document.blocks().is_empty());
}

#[tokio::test]
async fn rendering_leaves_the_document_unchanged() {
    let services = services(
        Arc::new(FakeTranslator::default()),
        Arc::new(FakeAnalyzer::default()),
    );
    let renderer = FakeRenderer::default();
    let fonts = FontTable::default();
    let distribution = gender_distribution();

    let mut document = ReportDocument::new(&services, DEFAULT_LANGUAGE);
    document.set_header(header_block("Gender"));
    document.add_bar_block(&distribution).await.unwrap();

    let before = document.layout().body_texts();
    let first = document.render(&renderer, &fonts).await.unwrap();
    let second = document.render(&renderer, &fonts).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, dump(&document.layout()));
    assert_eq!(document.layout().body_texts(), before);
    assert_eq!(renderer.renders(), 2);
}
