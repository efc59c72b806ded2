use criterion::{Criterion, black_box, criterion_group, criterion_main};
use softwrap_core::{
    LayoutEngine, LayoutInputs, MonospaceMetrics, NoFolds, NoInlays, RopeDocument, UniformStyle,
    UpdateRequest, WhitespaceWrapStrategy,
};

const STYLES: UniformStyle = UniformStyle;
const NO_FOLDS: NoFolds = NoFolds;
const NO_INLAYS: NoInlays = NoInlays;
const STRATEGY: WhitespaceWrapStrategy = WhitespaceWrapStrategy;

fn layout_inputs<'a>(doc: &'a RopeDocument, metrics: &'a MonospaceMetrics) -> LayoutInputs<'a> {
    LayoutInputs {
        document: doc,
        styles: &STYLES,
        folds: &NO_FOLDS,
        metrics,
        inlays: &NO_INLAYS,
        strategy: &STRATEGY,
    }
}

fn sample_document(lines: usize) -> RopeDocument {
    let mut text = String::new();
    for i in 0..lines {
        text.push_str("fn sample() { let value = compute(input, options); value.transform() } ");
        text.push_str("// trailing commentary that pushes the line well past the viewport\n");
        if i % 7 == 0 {
            text.push_str("short line\n");
        }
    }
    RopeDocument::from_text(&text)
}

fn bench_full_reparse(c: &mut Criterion) {
    let doc = sample_document(1000);
    let metrics = MonospaceMetrics::new(1);

    c.bench_function("full_reparse_1000_lines", |b| {
        b.iter(|| {
            let mut engine = LayoutEngine::new();
            engine.set_viewport_width(Some(80));
            engine
                .recalculate(&layout_inputs(&doc, &metrics), UpdateRequest::Document)
                .unwrap();
            black_box(engine.wrap_count())
        })
    });
}

fn bench_incremental_edit(c: &mut Criterion) {
    let mut doc = sample_document(1000);
    let metrics = MonospaceMetrics::new(1);
    let mut engine = LayoutEngine::new();
    engine.set_viewport_width(Some(80));
    engine
        .recalculate(&layout_inputs(&doc, &metrics), UpdateRequest::Document)
        .unwrap();
    let middle = doc.char_count() / 2;

    c.bench_function("incremental_single_char_edit", |b| {
        b.iter(|| {
            let request = doc.insert(middle, "x");
            engine
                .recalculate(&layout_inputs(&doc, &metrics), request)
                .unwrap();
            let request = doc.remove(middle, 1);
            engine
                .recalculate(&layout_inputs(&doc, &metrics), request)
                .unwrap();
            black_box(engine.wrap_count())
        })
    });
}

criterion_group!(benches, bench_full_reparse, bench_incremental_edit);
criterion_main!(benches);
