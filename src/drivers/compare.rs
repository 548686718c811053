//! Side-by-side rendering of the same converted columns across 2 or 4 recordings.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use log::{info, warn};
use crate::drivers::loader::LoadedGesture;
use crate::drivers::plot::{render_figure_png, write_png, Figure, Panel, PlotSeries, PlotStyle};
use crate::drivers::table::{ColumnKey, GestureTable};
use crate::drivers::GloveError;
use crate::types::{Hand, SensorClass};
/// Twelve groups of three columns covering all 36 converted columns.
pub const BATCH_RANGES: [(usize, usize); 12] = [
    (1, 3),
    (4, 6),
    (7, 9),
    (10, 12),
    (13, 15),
    (16, 18),
    (19, 21),
    (22, 24),
    (25, 27),
    (28, 30),
    (31, 33),
    (34, 36),
];
/// Validated column selection for one comparison figure.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonLayout {
    pub hand: Hand,
    pub start: usize,
    pub end: usize,
    pub columns: Vec<ColumnKey>,
}
impl ComparisonLayout {
    /// `start..=end` is 1-based over the first table's converted columns for `hand`.
    pub fn build(
        tables: &[GestureTable],
        hand: Hand,
        start: usize,
        end: usize,
    ) -> Result<Self, GloveError> {
        if tables.len() != 2 && tables.len() != 4 {
            return Err(GloveError::ComparisonArity(tables.len()));
        }
        let available = tables[0].converted_columns(hand);
        if start < 1 || end > available.len() || start > end {
            return Err(GloveError::Range {
                start,
                end,
                available: available.len(),
            });
        }
        Ok(Self {
            hand,
            start,
            end,
            columns: available[start - 1..end].iter().map(|c| c.key).collect(),
        })
    }
    /// Sorted, de-duplicated short unit names joined by `_`.
    pub fn units_label(&self) -> String {
        let units: BTreeSet<&str> = self.columns.iter().map(|k| k.unit.short_name()).collect();
        units.into_iter().collect::<Vec<_>>().join("_")
    }
    pub fn sensor_label(&self) -> &'static str {
        let has = |class: SensorClass| self.columns.iter().any(|k| k.component.class() == class);
        match (has(SensorClass::Accelerometer), has(SensorClass::Gyroscope)) {
            (true, true) => "Acc_Gyro",
            (true, false) => "Acc",
            _ => "Gyro",
        }
    }
    pub fn file_name(&self, names: &[String]) -> String {
        let suffix = format!(
            "{}_{}_{}_cols{}-{}.png",
            self.hand,
            self.units_label(),
            self.sensor_label(),
            self.start,
            self.end
        );
        if names.len() == 2 {
            format!("2way_{}_vs_{}_{suffix}", names[0], names[1])
        } else {
            format!("4way_compare_{suffix}")
        }
    }
    pub fn figure(&self, tables: &[GestureTable]) -> Figure {
        let panels = tables
            .iter()
            .enumerate()
            .map(|(i, table)| Panel {
                title: format!("File {}: {}", i + 1, table.name),
                x_label: "FrameIndex".into(),
                y_label: "Sensor Value".into(),
                x_range: None,
                y_range: None,
                series: self
                    .columns
                    .iter()
                    .filter_map(|key| table.column(key))
                    .map(|column| PlotSeries {
                        label: column.label(),
                        points: column
                            .values
                            .iter()
                            .enumerate()
                            .map(|(frame, v)| (frame as f64, *v))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        let two_way = tables.len() == 2;
        Figure {
            caption: format!(
                "{}-Way Comparison: {} Hand - {} - {} (Columns {}-{})",
                tables.len(),
                self.hand,
                self.units_label(),
                self.sensor_label(),
                self.start,
                self.end
            ),
            rows: if two_way { 1 } else { 2 },
            cols: 2,
            shared_y: two_way,
            panels,
        }
    }
}
/// Renders one comparison into `out_dir` and returns the written path.
///
/// Nothing is written when the range is rejected.
pub fn compare_tables(
    tables: &[GestureTable],
    hand: Hand,
    start: usize,
    end: usize,
    out_dir: &Path,
    style: &PlotStyle,
) -> Result<PathBuf, GloveError> {
    let layout = ComparisonLayout::build(tables, hand, start, end)?;
    let names: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();
    let png = render_figure_png(&layout.figure(tables), style)?;
    let path = out_dir.join(layout.file_name(&names));
    write_png(&path, &png)?;
    info!("saved comparison {}", path.display());
    Ok(path)
}
pub fn compare(
    gestures: &[LoadedGesture],
    hand: Hand,
    start: usize,
    end: usize,
    out_dir: &Path,
    style: &PlotStyle,
) -> Result<PathBuf, GloveError> {
    let tables: Vec<GestureTable> = gestures.iter().map(GestureTable::from_gesture).collect();
    compare_tables(&tables, hand, start, end, out_dir, style)
}
/// Runs every range in [`BATCH_RANGES`]; a failing range is logged and skipped.
pub fn compare_batch(
    gestures: &[LoadedGesture],
    hand: Hand,
    out_dir: &Path,
    style: &PlotStyle,
) -> Vec<PathBuf> {
    let tables: Vec<GestureTable> = gestures.iter().map(GestureTable::from_gesture).collect();
    compare_batch_tables(&tables, hand, out_dir, style)
}
pub fn compare_batch_tables(
    tables: &[GestureTable],
    hand: Hand,
    out_dir: &Path,
    style: &PlotStyle,
) -> Vec<PathBuf> {
    let mut written = Vec::new();
    for (i, (start, end)) in BATCH_RANGES.iter().copied().enumerate() {
        match compare_tables(tables, hand, start, end, out_dir, style) {
            Ok(path) => written.push(path),
            Err(err) => warn!("batch range {}/12 (cols {start}-{end}) failed: {err}", i + 1),
        }
    }
    info!(
        "batch comparison finished: {}/{} figures in {}",
        written.len(),
        BATCH_RANGES.len(),
        out_dir.display()
    );
    written
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::table::TableColumn;
    use crate::types::{Component, SensorUnit};
    fn key(unit: SensorUnit, component: Component) -> ColumnKey {
        ColumnKey {
            unit,
            component,
            hand: Hand::Left,
            converted: true,
        }
    }
    fn table(name: &str, keys: &[ColumnKey]) -> GestureTable {
        GestureTable::from_columns(
            name,
            keys.iter()
                .map(|&key| TableColumn {
                    key,
                    values: vec![Some(0.1), None, Some(0.3)],
                })
                .collect(),
        )
    }
    fn full_table(name: &str) -> GestureTable {
        let keys: Vec<ColumnKey> = SensorUnit::ALL
            .iter()
            .flat_map(|&u| Component::ALL.map(|c| key(u, c)))
            .collect();
        table(name, &keys)
    }
    #[test]
    fn range_beyond_available_columns_is_rejected() {
        let short = [
            key(SensorUnit::Index, Component::AccX),
            key(SensorUnit::Index, Component::AccY),
        ];
        let tables = [table("a", &short), table("b", &short)];
        let dir = tempfile::tempdir().unwrap();
        let err = compare_tables(&tables, Hand::Left, 1, 3, dir.path(), &PlotStyle::default())
            .unwrap_err();
        assert!(matches!(
            err,
            GloveError::Range { start: 1, end: 3, available: 2 }
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
    #[test]
    fn invalid_ranges_and_arity() {
        let tables = [full_table("a"), full_table("b")];
        for (s, e) in [(0, 3), (5, 4), (30, 37)] {
            assert!(ComparisonLayout::build(&tables, Hand::Left, s, e).is_err());
        }
        assert!(matches!(
            ComparisonLayout::build(&tables[..1], Hand::Left, 1, 3),
            Err(GloveError::ComparisonArity(1))
        ));
        assert!(matches!(
            ComparisonLayout::build(&tables, Hand::Right, 1, 3),
            Err(GloveError::Range { available: 0, .. })
        ));
    }
    #[test]
    fn two_way_figure_shares_labels_and_y_axis() {
        let tables = [full_table("first"), full_table("second")];
        let layout = ComparisonLayout::build(&tables, Hand::Left, 1, 3).unwrap();
        let figure = layout.figure(&tables);
        assert_eq!((figure.rows, figure.cols), (1, 2));
        assert!(figure.shared_y);
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.panels[0].title, "File 1: first");
        assert_eq!(figure.panels[1].title, "File 2: second");
        assert_eq!(figure.panels[0].x_label, "FrameIndex");
        assert_eq!(figure.panels[0].y_label, "Sensor Value");
        let labels = |p: &Panel| p.series.iter().map(|s| s.label.clone()).collect::<Vec<_>>();
        assert_eq!(labels(&figure.panels[0]).len(), 3);
        assert_eq!(labels(&figure.panels[0]), labels(&figure.panels[1]));
        assert_eq!(figure.panels[0].series[0].label, "IndexFinger_AccX_Left_Converted");
        assert_eq!(figure.panels[0].series[0].points[1], (1.0, None));
    }
    #[test]
    fn file_names_describe_the_selection() {
        let tables = [full_table("a"), full_table("b")];
        let layout = ComparisonLayout::build(&tables, Hand::Left, 4, 9).unwrap();
        assert_eq!(layout.units_label(), "Index_Middle");
        assert_eq!(layout.sensor_label(), "Acc_Gyro");
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            layout.file_name(&names),
            "2way_a_vs_b_Left_Index_Middle_Acc_Gyro_cols4-9.png"
        );
        let four = vec![String::new(); 4];
        let layout = ComparisonLayout::build(&tables, Hand::Left, 34, 36).unwrap();
        assert_eq!(layout.file_name(&four), "4way_compare_Left_Palm_Gyro_cols34-36.png");
    }
    #[test]
    fn four_way_comparison_uses_a_square_grid() {
        let tables: Vec<GestureTable> = ["a", "b", "c", "d"].iter().map(|n| full_table(n)).collect();
        let layout = ComparisonLayout::build(&tables, Hand::Left, 1, 3).unwrap();
        let figure = layout.figure(&tables);
        assert_eq!((figure.rows, figure.cols), (2, 2));
        assert!(!figure.shared_y);
        let dir = tempfile::tempdir().unwrap();
        let style = PlotStyle::with_size(400, 300);
        let path = compare_tables(&tables, Hand::Left, 1, 3, dir.path(), &style).unwrap();
        assert!(path.ends_with("4way_compare_Left_Index_Acc_cols1-3.png"));
        assert!(path.is_file());
    }
    #[test]
    fn batch_skips_failing_ranges() {
        let dir = tempfile::tempdir().unwrap();
        // with no recordings every range fails the arity check
        let gestures: Vec<LoadedGesture> = Vec::new();
        assert!(compare_batch(&gestures, Hand::Right, dir.path(), &PlotStyle::default()).is_empty());
    }
    #[test]
    fn batch_keeps_ranges_that_fit_the_first_table() {
        let half: Vec<ColumnKey> = [SensorUnit::Index, SensorUnit::Middle, SensorUnit::Ring]
            .iter()
            .flat_map(|&u| Component::ALL.map(|c| key(u, c)))
            .collect();
        let tables = [table("half", &half), full_table("full")];
        let dir = tempfile::tempdir().unwrap();
        let written =
            compare_batch_tables(&tables, Hand::Left, dir.path(), &PlotStyle::with_size(300, 200));
        assert_eq!(written.len(), 6);
        assert!(written[0].ends_with("2way_half_vs_full_Left_Index_Acc_cols1-3.png"));
        assert!(written[5].ends_with("2way_half_vs_full_Left_Ring_Gyro_cols16-18.png"));
        assert!(written.iter().all(|p| p.is_file()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 6);
    }
}
