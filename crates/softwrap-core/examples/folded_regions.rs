//! Demonstrates wrap interaction with collapsed fold regions.
//!
//! Run with: `cargo run --example folded_regions`

use softwrap_core::{
    DocumentSource, FoldSet, FoldedRegion, LayoutEngine, LayoutInputs, MonospaceMetrics, NoInlays,
    RopeDocument, UniformStyle, UpdateRequest, WhitespaceWrapStrategy,
};

fn main() {
    let doc = RopeDocument::from_text(
        "fn handler(request: Request) -> Response {\n    validate(request);\n    respond(request)\n}",
    );
    let metrics = MonospaceMetrics::new(1);
    let mut folds = FoldSet::new();
    let mut engine = LayoutEngine::new();
    engine.set_viewport_width(Some(32));

    let inputs = LayoutInputs {
        document: &doc,
        styles: &UniformStyle,
        folds: &folds,
        metrics: &metrics,
        inlays: &NoInlays,
        strategy: &WhitespaceWrapStrategy,
    };
    engine.recalculate(&inputs, UpdateRequest::Document).unwrap();
    println!("expanded: {} wraps at {:?}", engine.wrap_count(), offsets(&engine));

    // Collapse the function body; the wraps inside it disappear and only the
    // folded line is re-laid-out.
    let body_start = 42;
    let body_end = doc.char_count() - 1;
    folds.add(FoldedRegion::new(body_start, body_end, "{ ... }"));

    let inputs = LayoutInputs {
        document: &doc,
        styles: &UniformStyle,
        folds: &folds,
        metrics: &metrics,
        inlays: &NoInlays,
        strategy: &WhitespaceWrapStrategy,
    };
    let region = engine
        .recalculate(
            &inputs,
            UpdateRequest::FoldToggle {
                start: body_start,
                end: body_end,
            },
        )
        .unwrap();
    println!(
        "collapsed: rescanned [{}, {}), {} wraps at {:?}",
        region.start_offset,
        region.actual_end_offset.unwrap_or_default(),
        engine.wrap_count(),
        offsets(&engine),
    );
}

fn offsets(engine: &LayoutEngine) -> Vec<usize> {
    engine.records().iter().map(|r| r.offset).collect()
}
