//! Callback trait for content stream interpretation.
//!
//! The interpreter calls [`RunHandler`] methods as it processes text-showing
//! operators. Implementors collect the items to build a page index.

use pdfmarker_core::{ExtractWarning, RawTextItem};

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations.
pub trait RunHandler {
    /// Called once per text-showing operation (`Tj`, `TJ`, `'`, `"`).
    fn on_item(&mut self, _item: RawTextItem) {}

    /// Called when a non-fatal warning is encountered during interpretation.
    ///
    /// The interpreter continues with defaults after reporting.
    fn on_warning(&mut self, _warning: ExtractWarning) {}
}

/// A handler that keeps items and warnings in order.
#[derive(Debug, Default)]
pub struct ItemCollector {
    pub items: Vec<RawTextItem>,
    pub warnings: Vec<ExtractWarning>,
    collect_warnings: bool,
}

impl ItemCollector {
    /// Create a collector. Warnings are dropped unless `collect_warnings`.
    pub fn new(collect_warnings: bool) -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
            collect_warnings,
        }
    }
}

impl RunHandler for ItemCollector {
    fn on_item(&mut self, item: RawTextItem) {
        self.items.push(item);
    }

    fn on_warning(&mut self, warning: ExtractWarning) {
        if self.collect_warnings {
            self.warnings.push(warning);
        }
    }
}
