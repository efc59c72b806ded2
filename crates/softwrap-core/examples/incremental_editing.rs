//! Demonstrates incremental wrap maintenance across edits.
//!
//! Run with: `cargo run --example incremental_editing`

use softwrap_core::{
    LayoutEngine, LayoutInputs, MonospaceMetrics, NoFolds, NoInlays, RopeDocument, UniformStyle,
    UpdateRequest, WhitespaceWrapStrategy, WrapIndent,
};

fn print_visual_lines(doc: &RopeDocument, engine: &LayoutEngine) {
    let text = doc.text();
    let mut wraps = engine.records().iter().peekable();
    let mut current = String::new();
    for (offset, ch) in text.chars().enumerate() {
        if let Some(wrap) = wraps.peek()
            && wrap.offset == offset
        {
            println!("  |{current}| ↩");
            current = " ".repeat(wrap.indent_columns);
            wraps.next();
        }
        if ch == '\n' {
            println!("  |{current}|");
            current.clear();
        } else {
            current.push(ch);
        }
    }
    println!("  |{current}|");
}

fn main() {
    let mut doc = RopeDocument::from_text(
        "    let widths = glyphs.measure(text, style);\nshort line\n    renderer.flush_all_pending_batches(frame);",
    );
    let metrics = MonospaceMetrics::new(1);
    let mut engine = LayoutEngine::new();
    engine.set_wrap_indent(WrapIndent::SameAsLineIndent);
    engine.set_viewport_width(Some(28));

    let inputs = LayoutInputs {
        document: &doc,
        styles: &UniformStyle,
        folds: &NoFolds,
        metrics: &metrics,
        inlays: &NoInlays,
        strategy: &WhitespaceWrapStrategy,
    };
    engine.recalculate(&inputs, UpdateRequest::Document).unwrap();

    println!("initial layout ({} wraps):", engine.wrap_count());
    print_visual_lines(&doc, &engine);

    // Typing into the first line shifts downstream wraps instead of
    // recomputing them.
    let request = doc.insert(8, "glyph_");
    let inputs = LayoutInputs {
        document: &doc,
        styles: &UniformStyle,
        folds: &NoFolds,
        metrics: &metrics,
        inlays: &NoInlays,
        strategy: &WhitespaceWrapStrategy,
    };
    let region = engine.recalculate(&inputs, request).unwrap();

    println!(
        "\nafter insert: rescanned [{}, {}), {} wraps:",
        region.start_offset,
        region.actual_end_offset.unwrap_or_default(),
        engine.wrap_count()
    );
    print_visual_lines(&doc, &engine);
}
