//! Leaf-scan report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one leaf scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportLeaf {
    /// Rows offered to the scan.
    pub cnt_scanned: u64,
    /// Rows skipped because every level was absent or blank.
    pub cnt_blank: u64,
    /// Branches closed by a boundary or by end of input.
    pub cnt_branches: u64,
    /// Branch leaves emitted.
    pub cnt_leaves: u64,
    /// Branches closed without emission (deepest path below `min_levels`).
    pub cnt_shallow: u64,
    /// Candidates replaced by a later row with an identical path.
    pub cnt_shadowed: u64,
    /// Non-fatal warnings collected during split/scan.
    pub warnings: Vec<String>,
}

impl ReportLeaf {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_blank".to_string(), self.cnt_blank);
        dict_counts.insert("cnt_branches".to_string(), self.cnt_branches);
        dict_counts.insert("cnt_leaves".to_string(), self.cnt_leaves);
        dict_counts.insert("cnt_shallow".to_string(), self.cnt_shallow);
        dict_counts.insert("cnt_shadowed".to_string(), self.cnt_shadowed);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} blank={} branches={} leaves={} shallow={} shadowed={} warnings={}",
            self.cnt_scanned,
            self.cnt_blank,
            self.cnt_branches,
            self.cnt_leaves,
            self.cnt_shallow,
            self.cnt_shadowed,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[LEAF]"))
    }
}

/// Mutable accumulator for leaf-scan statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportLeafBuilder {
    /// See [`ReportLeaf::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportLeaf::cnt_blank`].
    pub cnt_blank: u64,
    /// See [`ReportLeaf::cnt_leaves`].
    pub cnt_leaves: u64,
    /// See [`ReportLeaf::cnt_shallow`].
    pub cnt_shallow: u64,
    /// See [`ReportLeaf::cnt_shadowed`].
    pub cnt_shadowed: u64,
    /// See [`ReportLeaf::warnings`].
    pub warnings: Vec<String>,
}

impl ReportLeafBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    /// Increment blank count by one.
    pub fn add_blank(&mut self) {
        self.cnt_blank += 1;
    }

    /// Record one closed branch, emitted or not.
    pub fn add_branch_closed(&mut self, if_emitted: bool) {
        if if_emitted {
            self.cnt_leaves += 1;
        } else {
            self.cnt_shallow += 1;
        }
    }

    /// Increment shadowed count by one.
    pub fn add_shadowed(&mut self) {
        self.cnt_shadowed += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportLeaf {
        ReportLeaf {
            cnt_scanned: self.cnt_scanned,
            cnt_blank: self.cnt_blank,
            cnt_branches: self.cnt_leaves + self.cnt_shallow,
            cnt_leaves: self.cnt_leaves,
            cnt_shallow: self.cnt_shallow,
            cnt_shadowed: self.cnt_shadowed,
            warnings: self.warnings,
        }
    }
}
