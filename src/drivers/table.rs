use std::fs::File;
use std::io::Write;
use std::path::Path;
use log::info;
use crate::drivers::loader::{HandSeries, LoadedGesture};
use crate::drivers::GloveError;
use crate::types::{Component, Hand, SensorUnit};
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub unit: SensorUnit,
    pub component: Component,
    pub hand: Hand,
    pub converted: bool,
}
impl ColumnKey {
    /// `<Unit>_<Component>_<Hand>`, suffixed with `_Converted` for physical units.
    pub fn label(&self) -> String {
        let base = format!("{}_{}_{}", self.unit.name(), self.component.name(), self.hand);
        if self.converted {
            format!("{base}_Converted")
        } else {
            base
        }
    }
}
#[derive(Clone, Debug, PartialEq)]
pub struct TableColumn {
    pub key: ColumnKey,
    /// One cell per frame; `None` where the hand had no frame or the value did not decode.
    pub values: Vec<Option<f64>>,
}
impl TableColumn {
    pub fn label(&self) -> String {
        self.key.label()
    }
}
/// Both hands of one gesture aligned on a shared frame index.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureTable {
    pub name: String,
    frame_count: usize,
    /// Frames each hand actually recorded, before padding.
    hand_frames: [usize; 2],
    columns: Vec<TableColumn>,
}
impl GestureTable {
    pub fn from_gesture(gesture: &LoadedGesture) -> Self {
        let frame_count = gesture.left.frame_count().max(gesture.right.frame_count());
        let mut columns = Vec::with_capacity(4 * 36);
        for unit in SensorUnit::ALL {
            for component in Component::ALL {
                for converted in [false, true] {
                    for hand in Hand::ALL {
                        let key = ColumnKey {
                            unit,
                            component,
                            hand,
                            converted,
                        };
                        let values = column_values(gesture.hand(hand), key, frame_count);
                        columns.push(TableColumn { key, values });
                    }
                }
            }
        }
        Self {
            name: gesture.name(),
            frame_count,
            hand_frames: Hand::ALL.map(|hand| gesture.hand(hand).frame_count()),
            columns,
        }
    }
    /// Builds a table from arbitrary columns; shorter columns are padded.
    pub fn from_columns(name: impl Into<String>, mut columns: Vec<TableColumn>) -> Self {
        let frame_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let hand_frames = Hand::ALL.map(|hand| {
            columns
                .iter()
                .filter(|c| c.key.hand == hand)
                .map(|c| c.values.len())
                .max()
                .unwrap_or(0)
        });
        for column in &mut columns {
            column.values.resize(frame_count, None);
        }
        Self {
            name: name.into(),
            frame_count,
            hand_frames,
            columns,
        }
    }
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }
    pub fn column(&self, key: &ColumnKey) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.key == *key)
    }
    /// Converted columns of `hand`, unit-major in canonical component order.
    /// A hand that recorded no frames has none.
    pub fn converted_columns(&self, hand: Hand) -> Vec<&TableColumn> {
        if self.hand_frames[hand.index()] == 0 {
            return Vec::new();
        }
        self.columns
            .iter()
            .filter(|c| c.key.converted && c.key.hand == hand)
            .collect()
    }
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), GloveError> {
        let mut writer = csv::Writer::from_writer(out);
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push("FrameIndex".to_owned());
        header.extend(self.columns.iter().map(TableColumn::label));
        writer.write_record(&header)?;
        for row in 0..self.frame_count {
            let mut record = Vec::with_capacity(header.len());
            record.push(row.to_string());
            // missing cells stay empty
            record.extend(
                self.columns
                    .iter()
                    .map(|c| c.values[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
    pub fn export_csv(&self, path: &Path) -> Result<(), GloveError> {
        self.write_csv(File::create(path)?)?;
        info!(
            "exported {} frames x {} columns to {}",
            self.frame_count,
            self.columns.len(),
            path.display()
        );
        Ok(())
    }
}
fn column_values(series: &HandSeries, key: ColumnKey, frame_count: usize) -> Vec<Option<f64>> {
    let mut values: Vec<Option<f64>> = if key.converted {
        let class = key.component.class();
        series
            .unit(key.unit)
            .triples(class)
            .iter()
            .map(|triple| triple[key.component.axis()].value())
            .collect()
    } else {
        let slot = key.unit.offset() + key.component.index();
        series.raw.iter().map(|frame| Some(frame[slot])).collect()
    };
    values.resize(frame_count, None);
    values
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::loader::{GestureMetadata, HandSeries};
    use std::path::PathBuf;
    fn gesture(left: usize, right: usize) -> LoadedGesture {
        let mut frame = [0.0; 36];
        frame[0] = 4096.0;
        frame[35] = 65535.0;
        let metadata = GestureMetadata {
            session_name: "s".into(),
            user_name: "u".into(),
            gesture_name: "g".into(),
            timestamp: "t".into(),
            left_device: "l".into(),
            right_device: "r".into(),
        };
        LoadedGesture {
            path: PathBuf::from("data/u/s/wave.json"),
            metadata,
            left: HandSeries::from_frames(vec![frame; left]).unwrap(),
            right: HandSeries::from_frames(vec![frame; right]).unwrap(),
        }
    }
    #[test]
    fn converted_columns_are_finger_major() {
        let table = GestureTable::from_gesture(&gesture(2, 1));
        let right = table.converted_columns(Hand::Right);
        assert_eq!(right.len(), 36);
        assert_eq!(right[0].label(), "IndexFinger_AccX_Right_Converted");
        assert_eq!(right[3].label(), "IndexFinger_GyroX_Right_Converted");
        assert_eq!(right[6].label(), "MiddleFinger_AccX_Right_Converted");
        assert_eq!(right[35].label(), "Palm_GyroZ_Right_Converted");
        assert_eq!(table.columns().len(), 144);
    }
    #[test]
    fn shorter_hand_is_padded_with_missing_cells() {
        let table = GestureTable::from_gesture(&gesture(3, 1));
        assert_eq!(table.frame_count(), 3);
        let right = table.converted_columns(Hand::Right);
        assert_eq!(right[0].values, vec![Some(1.0), None, None]);
        let palm_gyro_z = right[35].values[0].unwrap();
        assert!((palm_gyro_z - (-1.0 / 32.8)).abs() < 1e-12);
    }
    #[test]
    fn csv_has_header_and_blank_missing_cells() {
        let table = GestureTable::from_gesture(&gesture(2, 1));
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("FrameIndex,IndexFinger_AccX_Left,IndexFinger_AccX_Right,"));
        assert!(lines[1].starts_with("0,4096,4096,1,1,"));
        assert!(lines[2].starts_with("1,4096,,1,,"));
    }
    #[test]
    fn empty_hand_offers_no_converted_columns() {
        let table = GestureTable::from_gesture(&gesture(2, 0));
        assert!(table.converted_columns(Hand::Right).is_empty());
        assert_eq!(table.converted_columns(Hand::Left).len(), 36);
        // the csv still carries every column
        assert_eq!(table.columns().len(), 144);
    }
    #[test]
    fn exported_csv_reads_back_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.csv");
        GestureTable::from_gesture(&gesture(1, 1)).export_csv(&path).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 145);
        assert_eq!(&headers[0], "FrameIndex");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "4096");
    }
    #[test]
    fn from_columns_pads_to_longest() {
        let key = ColumnKey {
            unit: SensorUnit::Thumb,
            component: Component::AccY,
            hand: Hand::Left,
            converted: true,
        };
        let table = GestureTable::from_columns(
            "t",
            vec![
                TableColumn { key, values: vec![Some(1.0)] },
                TableColumn { key, values: vec![Some(1.0), Some(2.0)] },
            ],
        );
        assert_eq!(table.frame_count(), 2);
        assert_eq!(table.columns()[0].values, vec![Some(1.0), None]);
    }
}
