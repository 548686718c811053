use std::path::{Path, PathBuf};
use log::{debug, info};
use serde_json::Value;
use crate::drivers::codec::{split_frame, Reading};
use crate::drivers::GloveError;
use crate::store::GestureRecord;
use crate::types::{Hand, SensorClass, SensorUnit, FRAME_LEN};
/// Nesting deeper than this is treated as garbage and dropped.
pub const MAX_NESTING_DEPTH: usize = 16;
/// Collects every array of exactly 36 numbers found under `value`.
///
/// Other leaves are dropped. The walk stops descending at
/// [`MAX_NESTING_DEPTH`].
pub fn flatten_frames(value: &Value) -> Vec<[f64; FRAME_LEN]> {
    let mut frames = Vec::new();
    collect_frames(value, 0, &mut frames);
    frames
}
fn collect_frames(value: &Value, depth: usize, out: &mut Vec<[f64; FRAME_LEN]>) {
    let Value::Array(items) = value else {
        return;
    };
    if depth >= MAX_NESTING_DEPTH {
        debug!("frame list nested deeper than {MAX_NESTING_DEPTH}; dropped");
        return;
    }
    for item in items {
        let Value::Array(inner) = item else {
            continue;
        };
        match as_frame(inner) {
            Some(frame) => out.push(frame),
            None => collect_frames(item, depth + 1, out),
        }
    }
}
fn as_frame(items: &[Value]) -> Option<[f64; FRAME_LEN]> {
    if items.len() != FRAME_LEN {
        return None;
    }
    let mut frame = [0.0; FRAME_LEN];
    for (slot, item) in frame.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(frame)
}
#[derive(Clone, Debug, PartialEq)]
pub struct GestureMetadata {
    pub session_name: String,
    pub user_name: String,
    pub gesture_name: String,
    pub timestamp: String,
    pub left_device: String,
    pub right_device: String,
}
impl GestureMetadata {
    fn from_record(record: &GestureRecord, path: &Path) -> Self {
        let unknown = |field: &Option<String>| field.clone().unwrap_or_else(|| "Unknown".into());
        let gesture_name = record
            .custom_name
            .clone()
            .unwrap_or_else(|| file_stem(path));
        Self {
            session_name: unknown(&record.session_name),
            user_name: unknown(&record.user_name),
            gesture_name,
            timestamp: unknown(&record.timestamp),
            left_device: unknown(&record.device_name.left_hand_device),
            right_device: unknown(&record.device_name.right_hand_device),
        }
    }
}
/// Converted triples of one sensor unit, one entry per retained frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitSeries {
    pub acc: Vec<[Reading; 3]>,
    pub gyro: Vec<[Reading; 3]>,
}
impl UnitSeries {
    pub fn triples(&self, class: SensorClass) -> &[[Reading; 3]] {
        match class {
            SensorClass::Accelerometer => &self.acc,
            SensorClass::Gyroscope => &self.gyro,
        }
    }
}
/// One hand's stream: the retained raw frames and their per-unit conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandSeries {
    pub raw: Vec<[f64; FRAME_LEN]>,
    pub units: [UnitSeries; 6],
}
impl HandSeries {
    pub fn from_frames(raw: Vec<[f64; FRAME_LEN]>) -> Result<Self, GloveError> {
        let mut units: [UnitSeries; 6] = Default::default();
        for frame in &raw {
            let readings = split_frame(frame.as_slice())?;
            for unit in readings.iter() {
                let series = &mut units[unit.unit.index()];
                series.acc.push(unit.acc);
                series.gyro.push(unit.gyro);
            }
        }
        Ok(Self { raw, units })
    }
    pub fn frame_count(&self) -> usize {
        self.raw.len()
    }
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
    pub fn unit(&self, unit: SensorUnit) -> &UnitSeries {
        &self.units[unit.index()]
    }
}
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGesture {
    pub path: PathBuf,
    pub metadata: GestureMetadata,
    pub left: HandSeries,
    pub right: HandSeries,
}
impl LoadedGesture {
    pub fn hand(&self, hand: Hand) -> &HandSeries {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
    /// File stem; comparison titles and file names use it.
    pub fn name(&self) -> String {
        file_stem(&self.path)
    }
    pub fn from_record(record: &GestureRecord, path: &Path) -> Result<Self, GloveError> {
        let left = HandSeries::from_frames(flatten_frames(
            &record.gesture_recording.left_hand_data_list,
        ))?;
        let right = HandSeries::from_frames(flatten_frames(
            &record.gesture_recording.right_hand_data_list,
        ))?;
        Ok(Self {
            path: path.to_path_buf(),
            metadata: GestureMetadata::from_record(record, path),
            left,
            right,
        })
    }
}
pub fn load(path: impl AsRef<Path>) -> Result<LoadedGesture, GloveError> {
    let path = path.as_ref();
    let record = GestureRecord::read(path)?;
    let gesture = LoadedGesture::from_record(&record, path)?;
    info!(
        "loaded {} (user {}, session {}, gesture {}): left {} frames, right {} frames",
        path.display(),
        gesture.metadata.user_name,
        gesture.metadata.session_name,
        gesture.metadata.gesture_name,
        gesture.left.frame_count(),
        gesture.right.frame_count()
    );
    Ok(gesture)
}
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
