#![warn(missing_docs)]
//! Incremental soft-wrap layout engine for headless text editors.
//!
//! # Overview
//!
//! `softwrap-core` computes and incrementally maintains soft line wrapping
//! for a large mutable document: given a viewport width it decides where
//! visual line breaks must be inserted inside logical lines so that no
//! visual line exceeds the available width, supporting collapsed fold
//! regions, variable-width glyphs (tabs, wide/eastern characters), inline
//! decorations and custom continuation indentation. An edit, fold change or
//! viewport resize re-scans only the minimal affected span of the document;
//! wraps downstream of an edit that survive unchanged are shifted instead
//! of recomputed.
//!
//! The crate is headless: rendering, caret/selection handling and the
//! document model itself stay with the host, which plugs in through the
//! narrow traits in [`providers`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  LayoutEngine (pass orchestration)          │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  BreakPointPicker + ReconciliationMapper    │  ← Wrap placement / reuse
//! ├─────────────────────────────────────────────┤
//! │  ScanState (per-pass scratch + caches)      │  ← Scan bookkeeping
//! ├─────────────────────────────────────────────┤
//! │  WrapStore (ordered wrap records)           │  ← Durable state
//! ├─────────────────────────────────────────────┤
//! │  Collaborator traits (document, styles,     │  ← Host integration
//! │  folds, metrics, decorations, strategy)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use softwrap_core::{
//!     LayoutEngine, LayoutInputs, MonospaceMetrics, NoFolds, NoInlays,
//!     RopeDocument, UniformStyle, UpdateRequest, WhitespaceWrapStrategy,
//! };
//!
//! let mut doc = RopeDocument::from_text("aaaa bbbb cccc dddd");
//! let metrics = MonospaceMetrics::new(4);
//! let mut engine = LayoutEngine::new();
//! engine.set_viewport_width(Some(40));
//!
//! let inputs = LayoutInputs {
//!     document: &doc,
//!     styles: &UniformStyle,
//!     folds: &NoFolds,
//!     metrics: &metrics,
//!     inlays: &NoInlays,
//!     strategy: &WhitespaceWrapStrategy,
//! };
//! engine.recalculate(&inputs, UpdateRequest::Document).unwrap();
//! assert_eq!(engine.records()[0].offset, 10);
//!
//! // An edit re-scans only the affected span; surviving downstream wraps
//! // are shifted, not recomputed.
//! let request = doc.insert(0, "x");
//! let inputs = LayoutInputs {
//!     document: &doc,
//!     styles: &UniformStyle,
//!     folds: &NoFolds,
//!     metrics: &metrics,
//!     inlays: &NoInlays,
//!     strategy: &WhitespaceWrapStrategy,
//! };
//! engine.recalculate(&inputs, request).unwrap();
//! ```
//!
//! # Concurrency Model
//!
//! Single-threaded, cooperative, non-reentrant: exactly one recalculation
//! pass may be active, a pass runs synchronously to completion, and
//! listeners are invoked synchronously and must not call back into the
//! engine. The assumption is a single UI/event thread driving both edits
//! and recalculation requests, so no locking is needed.
//!
//! # Module Description
//!
//! - [`store`] - ordered wrap-record collection
//! - [`region`] - incremental-update descriptors and start snapping
//! - [`engine`] - the layout engine and pass orchestration
//! - [`providers`] - collaborator traits for host integration
//! - [`document`] - rope-backed reference document
//! - [`metrics`] - monospace reference glyph metrics
//! - [`error`] - error taxonomy

pub mod document;
pub mod engine;
pub mod error;
mod mapper;
pub mod metrics;
mod picker;
pub mod providers;
pub mod region;
mod scan;
pub mod store;

pub use document::RopeDocument;
pub use engine::{
    DEFAULT_APPROXIMATE_STRIDE, LayoutEngine, LayoutListener, WidthChange, WrapIndent,
};
pub use error::LayoutError;
pub use metrics::{DEFAULT_TAB_SIZE, MonospaceMetrics, WhitespaceWrapStrategy};
pub use providers::{
    DocumentSource, FoldSet, FoldSource, FoldedRegion, FontStyleId, GlyphMetrics, InlayWidths,
    LayoutInputs, NoFolds, NoInlays, StyleRun, StyleSource, UniformStyle, WrapPositionStrategy,
};
pub use region::{UpdateRegion, UpdateRequest};
pub use store::{WrapRecord, WrapStore};
