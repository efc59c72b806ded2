//! Randomized consistency: after any edit, an incremental pass must leave
//! the wrap store exactly as discarding everything and running a full
//! reparse over the post-edit document would.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use softwrap_core::{
    DocumentSource, LayoutEngine, LayoutInputs, MonospaceMetrics, NoFolds, NoInlays, RopeDocument,
    UniformStyle, UpdateRequest, WhitespaceWrapStrategy, WrapIndent, WrapRecord,
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

fn full_layout(
    doc: &RopeDocument,
    metrics: &MonospaceMetrics,
    width: usize,
    indent: WrapIndent,
) -> Vec<WrapRecord> {
    let mut engine = LayoutEngine::new();
    engine.set_wrap_indent(indent);
    engine.set_viewport_width(Some(width));
    engine
        .recalculate(&layout_inputs(doc, metrics), UpdateRequest::Document)
        .unwrap();
    engine.records().to_vec()
}

fn random_document(rng: &mut StdRng, lines: usize) -> String {
    let mut text = String::new();
    for line in 0..lines {
        if line > 0 {
            text.push('\n');
        }
        if rng.gen_range(0..4) == 0 {
            text.push_str("    ");
        }
        let words = rng.gen_range(0..12);
        for word in 0..words {
            if word > 0 {
                text.push(' ');
            }
            let len = rng.gen_range(1..9);
            for _ in 0..len {
                text.push(char::from(b'a' + rng.gen_range(0..26u8)));
            }
        }
    }
    text
}

fn random_edit(rng: &mut StdRng, doc: &mut RopeDocument) -> UpdateRequest {
    let len = doc.char_count();
    match rng.gen_range(0..5) {
        0 => doc.insert(rng.gen_range(0..=len), "word "),
        1 => doc.insert(rng.gen_range(0..=len), "\n"),
        2 if len > 0 => {
            let offset = rng.gen_range(0..len);
            let span = rng.gen_range(1..=(len - offset).min(7));
            doc.remove(offset, span)
        }
        3 => doc.insert(rng.gen_range(0..=len), "漢字漢字 "),
        _ => doc.insert(rng.gen_range(0..=len), "x"),
    }
}

#[test]
fn test_incremental_pass_matches_full_reparse_over_random_edits() {
    let mut rng = StdRng::seed_from_u64(0x50f7_ab1e);
    let metrics = MonospaceMetrics::new(1);
    let width = 24;

    for round in 0..6 {
        let indent = if round % 2 == 0 {
            WrapIndent::None
        } else {
            WrapIndent::SameAsLineIndent
        };
        let text = random_document(&mut rng, 12);
        let mut doc = RopeDocument::from_text(&text);
        let mut engine = LayoutEngine::new();
        engine.set_wrap_indent(indent);
        engine.set_viewport_width(Some(width));
        engine
            .recalculate(&layout_inputs(&doc, &metrics), UpdateRequest::Document)
            .unwrap();

        for step in 0..60 {
            let request = random_edit(&mut rng, &mut doc);
            engine
                .recalculate(&layout_inputs(&doc, &metrics), request)
                .unwrap();
            let expected = full_layout(&doc, &metrics, width, indent);
            assert_eq!(
                engine.records(),
                expected.as_slice(),
                "round {round} step {step} (indent {indent:?}) diverged for document:\n{}",
                doc.text(),
            );
        }
    }
}

#[test]
fn test_append_only_editing_matches_full_reparse() {
    // The common typing pattern: repeated short inserts at the end.
    let metrics = MonospaceMetrics::new(1);
    let mut doc = RopeDocument::new();
    let mut engine = LayoutEngine::new();
    engine.set_viewport_width(Some(16));
    engine
        .recalculate(&layout_inputs(&doc, &metrics), UpdateRequest::Document)
        .unwrap();

    let chunks = [
        "type ", "some ", "words ", "until ", "the ", "line ", "wraps ", "and ", "then ",
        "a\nfresh ", "line ", "keeps ", "growing ", "longer ", "still",
    ];
    for chunk in chunks {
        let request = doc.insert(doc.char_count(), chunk);
        engine
            .recalculate(&layout_inputs(&doc, &metrics), request)
            .unwrap();
        let expected = full_layout(&doc, &metrics, 16, WrapIndent::None);
        assert_eq!(engine.records(), expected.as_slice());
    }
}

#[test]
fn test_ordering_invariant_survives_random_edits() {
    let mut rng = StdRng::seed_from_u64(0xdead_cafe);
    let metrics = MonospaceMetrics::new(1);
    let text = random_document(&mut rng, 20);
    let mut doc = RopeDocument::from_text(&text);
    let mut engine = LayoutEngine::new();
    engine.set_viewport_width(Some(18));
    engine
        .recalculate(&layout_inputs(&doc, &metrics), UpdateRequest::Document)
        .unwrap();

    for _ in 0..120 {
        let request = random_edit(&mut rng, &mut doc);
        engine
            .recalculate(&layout_inputs(&doc, &metrics), request)
            .unwrap();
        let records = engine.records();
        for pair in records.windows(2) {
            assert!(
                pair[0].offset < pair[1].offset,
                "wrap offsets must stay strictly ascending"
            );
        }
        if let Some(last) = records.last() {
            assert!(last.offset < doc.char_count());
        }
    }
}
