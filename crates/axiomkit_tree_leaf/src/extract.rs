//! Branch-tracking leaf scan over depth-first ordered rows.
//!
//! Rows must already be in tree (depth-first) order. The scan never sorts and
//! cannot detect ordering violations: unsorted input yields spurious branch
//! boundaries or merges without any error. Rows with fewer level values than
//! the table has level columns are tolerated and not flagged.

use std::fmt::Debug;

use tracing::{debug, trace};

use crate::report::{ReportLeaf, ReportLeafBuilder};
use crate::spec::LevelPath;

/// Current branch leaf candidate: the deepest path seen so far in the run.
#[derive(Debug, Clone)]
struct SpecBranchCandidate<K> {
    row_id: K,
    path: LevelPath,
}

/// Ordered leaf row ids plus scan diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLeafSelection<K> {
    /// Emitted leaf ids, in input order.
    pub row_ids: Vec<K>,
    /// Scan counters and warnings.
    pub report: ReportLeaf,
}

/// Streaming leaf scanner.
///
/// Feed rows in input order with [`Self::push`]; each call returns the id of
/// the branch leaf closed by that row, if any. [`Self::finish`] closes the last
/// open branch. State is O(1): one candidate row.
#[derive(Debug, Clone)]
pub struct LeafScanner<K> {
    min_levels: usize,
    candidate: Option<SpecBranchCandidate<K>>,
    builder_report: ReportLeafBuilder,
}

impl<K: Clone + Debug> LeafScanner<K> {
    /// Create a scanner keeping leaves with path depth `>= min_levels`.
    pub fn new(min_levels: usize) -> Self {
        Self {
            min_levels,
            candidate: None,
            builder_report: ReportLeafBuilder::default(),
        }
    }

    /// Normalize raw level values and scan the row.
    pub fn push<I, S>(&mut self, row_id: K, levels: I) -> Option<K>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        self.push_path(row_id, LevelPath::from_levels(levels))
    }

    /// Scan one row with an already normalized path.
    pub fn push_path(&mut self, row_id: K, path: LevelPath) -> Option<K> {
        self.builder_report.add_scanned();
        if path.is_empty() {
            trace!(?row_id, "row has no hierarchy levels, skipped");
            self.builder_report.add_blank();
            return None;
        }

        let curr = SpecBranchCandidate { row_id, path };
        let Some(prev) = self.candidate.take() else {
            self.candidate = Some(curr);
            return None;
        };

        if prev.path.is_extended_by(&curr.path) {
            if prev.path == curr.path {
                debug!(
                    row_id_shadowed = ?prev.row_id,
                    row_id = ?curr.row_id,
                    path = %curr.path,
                    "identical consecutive path replaces leaf candidate"
                );
                self.builder_report.add_shadowed();
            }
            self.candidate = Some(curr);
            return None;
        }

        let leaf = self.close_branch(prev);
        self.candidate = Some(curr);
        leaf
    }

    /// Close the last open branch and return its leaf (if deep enough) with the report.
    pub fn finish(mut self) -> (Option<K>, ReportLeaf) {
        let leaf = match self.candidate.take() {
            Some(prev) => self.close_branch(prev),
            None => None,
        };
        if self.builder_report.cnt_shadowed > 0 {
            let c_warning = format!(
                "{} row(s) were replaced by a following row with an identical path and not emitted.",
                self.builder_report.cnt_shadowed
            );
            self.builder_report.add_warning(c_warning);
        }
        (leaf, self.builder_report.build())
    }

    fn close_branch(&mut self, prev: SpecBranchCandidate<K>) -> Option<K> {
        let if_emitted = prev.path.len() >= self.min_levels;
        self.builder_report.add_branch_closed(if_emitted);
        debug!(
            row_id = ?prev.row_id,
            depth = prev.path.len(),
            if_emitted,
            "branch closed"
        );
        if_emitted.then_some(prev.row_id)
    }
}

/// Select branch leaf ids from `(row_id, levels)` pairs in depth-first order.
///
/// A branch is a run of rows whose paths keep extending the previous one; its
/// last row is the leaf. Leaves shallower than `min_levels` are dropped. Rows
/// whose levels are all absent/blank are ignored entirely. Output order is
/// input order.
pub fn select_leaf_ids<K, R, I, S>(rows: R, min_levels: usize) -> SpecLeafSelection<K>
where
    K: Clone + Debug,
    R: IntoIterator<Item = (K, I)>,
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let (mut row_ids, scanner) = rows.into_iter().fold(
        (Vec::new(), LeafScanner::new(min_levels)),
        |(mut row_ids, mut scanner), (row_id, levels)| {
            row_ids.extend(scanner.push(row_id, levels));
            (row_ids, scanner)
        },
    );
    let (leaf_last, report) = scanner.finish();
    row_ids.extend(leaf_last);
    SpecLeafSelection { row_ids, report }
}

/// Positional form of [`select_leaf_ids`]: ids are zero-based row positions.
pub fn select_leaf_indices<R, I, S>(rows: R, min_levels: usize) -> SpecLeafSelection<usize>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    select_leaf_ids(rows.into_iter().enumerate(), min_levels)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn rows(paths: &[&[&str]]) -> Vec<Vec<Option<String>>> {
        paths
            .iter()
            .map(|path| path.iter().map(|c| Some(c.to_string())).collect())
            .collect()
    }

    #[rstest]
    #[case::branch_deepens_to_leaf(&[&["A", "B"] as &[&str], &["A", "B", "C"], &["A", "B", "C", "D"]], vec![2])]
    #[case::shallow_trailing_branch(&[&["A", "B", "C", "D"] as &[&str], &["E", "F"]], vec![0])]
    #[case::boundary_on_shallower_row(
        &[&["A"] as &[&str], &["A", "B"], &["A", "B", "C", "D"], &["A", "B"]],
        vec![2]
    )]
    #[case::single_deep_row(&[&["A", "B", "C", "D", "E"] as &[&str]], vec![0])]
    #[case::sibling_leaves(
        &[
            &["A"] as &[&str],
            &["A", "B"],
            &["A", "B", "C", "D"],
            &["A", "B", "C", "E"],
            &["A", "X"],
            &["A", "X", "Y", "Z"],
        ],
        vec![2, 3, 5]
    )]
    #[case::no_branch_reaches_threshold(&[&["A"] as &[&str], &["A", "B"], &["C", "D", "E"]], vec![])]
    fn leaf_scenarios(#[case] paths: &[&[&str]], #[case] expected: Vec<usize>) {
        let selection = select_leaf_indices(rows(paths), 4);
        assert_eq!(selection.row_ids, expected);
    }

    #[test]
    fn all_blank_rows_produce_nothing() {
        let l_rows = vec![
            vec![Some("".to_string()), Some("".to_string())],
            vec![None, None],
        ];
        let selection = select_leaf_indices(l_rows, 4);
        assert!(selection.row_ids.is_empty());
        assert_eq!(selection.report.cnt_scanned, 2);
        assert_eq!(selection.report.cnt_blank, 2);
        assert_eq!(selection.report.cnt_branches, 0);
    }

    #[test]
    fn blank_rows_do_not_touch_branch_state() {
        let with_blanks = vec![
            vec![Some("A"), Some("B"), Some("C"), Some("D")],
            vec![None, Some("  "), None, None],
            vec![Some("A"), Some("B"), Some("C"), Some("D")],
            vec![Some(""), None, None, None],
            vec![Some("E"), Some("F"), Some("G"), Some("H")],
        ];
        let selection = select_leaf_indices(with_blanks, 4);
        // row 2 shadows row 0 through the blank row; rows 1 and 3 never appear
        assert_eq!(selection.row_ids, vec![2, 4]);
        assert_eq!(selection.report.cnt_blank, 2);
        assert_eq!(selection.report.cnt_shadowed, 1);
    }

    #[test]
    fn identical_paths_keep_latest_and_warn() {
        let selection = select_leaf_indices(
            rows(&[&["A", "B", "C", "D"], &["A", "B", "C", "D"], &["A", "B", "C", "D"]]),
            4,
        );
        assert_eq!(selection.row_ids, vec![2]);
        assert_eq!(selection.report.cnt_shadowed, 2);
        assert_eq!(selection.report.cnt_branches, 1);
        assert_eq!(selection.report.warnings.len(), 1);
    }

    #[test]
    fn whitespace_is_trimmed_before_prefix_test() {
        let l_rows = vec![
            vec![Some(" A"), Some("B "), None, None],
            vec![Some("A"), Some(" B"), Some("C"), Some(" D ")],
        ];
        assert_eq!(select_leaf_indices(l_rows, 4).row_ids, vec![1]);
    }

    #[test]
    fn interior_blank_levels_are_dropped_from_path() {
        let l_rows = vec![
            vec![Some("A"), Some(""), Some("B")],
            vec![Some("A"), Some("B"), Some("C")],
        ];
        // ("A","B") is a prefix of ("A","B","C") once the blank level is dropped
        assert_eq!(select_leaf_indices(l_rows, 3).row_ids, vec![1]);
    }

    #[test]
    fn zero_threshold_keeps_every_branch_leaf() {
        let selection = select_leaf_indices(rows(&[&["A"], &["B"], &["B", "C"], &["D"]]), 0);
        assert_eq!(selection.row_ids, vec![0, 2, 3]);
        assert_eq!(selection.report.cnt_shallow, 0);
    }

    #[test]
    fn opaque_ids_are_passed_through() {
        let l_rows = vec![
            ("sku-9", vec![Some("A"), Some("B")]),
            ("sku-3", vec![Some("A"), Some("B"), Some("C"), Some("D")]),
            ("sku-1", vec![Some("Z"), Some("Y"), Some("X"), Some("W")]),
        ];
        assert_eq!(select_leaf_ids(l_rows, 4).row_ids, vec!["sku-3", "sku-1"]);
    }

    #[test]
    fn streaming_scanner_matches_batch() {
        let l_paths = rows(&[
            &["A"],
            &["A", "B", "C", "D"],
            &["A", "B", "C", "E"],
            &["F", "G", "H", "I", "J"],
        ]);
        let mut scanner = LeafScanner::new(4);
        let mut l_streamed = vec![];
        for (n_idx, levels) in l_paths.iter().enumerate() {
            l_streamed.extend(scanner.push(n_idx, levels.iter().map(|v| v.as_deref())));
        }
        let (leaf_last, report) = scanner.finish();
        l_streamed.extend(leaf_last);

        let selection = select_leaf_indices(l_paths, 4);
        assert_eq!(l_streamed, selection.row_ids);
        assert_eq!(report, selection.report);
        assert_eq!(l_streamed, vec![1, 2, 3]);
    }

    #[test]
    fn report_counters_are_consistent() {
        let l_rows = vec![
            vec![Some("A"), None, None, None],
            vec![None, None, None, None],
            vec![Some("A"), Some("B"), Some("C"), Some("D")],
            vec![Some("E"), None, None, None],
            vec![Some("F"), Some("G"), Some("H"), Some("I")],
        ];
        let report = select_leaf_indices(l_rows, 4).report;
        assert_eq!(report.cnt_scanned, 5);
        assert_eq!(report.cnt_blank, 1);
        assert_eq!(report.cnt_branches, 3);
        assert_eq!(report.cnt_leaves, 2);
        assert_eq!(report.cnt_shallow, 1);
        assert_eq!(report.cnt_branches, report.cnt_leaves + report.cnt_shallow);
        assert!(report.cnt_scanned >= report.cnt_blank + report.cnt_branches);
    }

    #[test]
    fn rerun_on_output_is_idempotent() {
        let l_rows = rows(&[
            &["A"],
            &["A", "B", "C", "D"],
            &["A", "B", "C", "E"],
            &["A", "B", "F"],
            &["A", "B", "F", "G", "H"],
            &["X", "Y"],
        ]);
        let first = select_leaf_indices(l_rows.clone(), 4).row_ids;
        assert_eq!(first, vec![1, 2, 4]);

        let l_rows_kept: Vec<_> = first.iter().map(|n_idx| l_rows[*n_idx].clone()).collect();
        let second = select_leaf_indices(l_rows_kept, 4).row_ids;
        assert_eq!(second, (0..first.len()).collect::<Vec<_>>());
    }

    #[test]
    fn emitted_leaves_meet_threshold_and_keep_order() {
        let l_rows = rows(&[
            &["A", "B"],
            &["A", "B", "C", "D"],
            &["A", "C"],
            &["Q", "R", "S"],
            &["Q", "R", "S", "T", "U"],
            &["V"],
        ]);
        let selection = select_leaf_indices(l_rows.clone(), 4);
        assert!(selection.row_ids.windows(2).all(|pair| pair[0] < pair[1]));
        for n_idx in &selection.row_ids {
            assert!(LevelPath::from_levels(l_rows[*n_idx].iter().map(|v| v.as_deref())).len() >= 4);
        }
        assert_eq!(selection.row_ids, vec![1, 4]);
    }
}
