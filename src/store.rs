// src/store.rs
//! Flat-file gesture storage: `<root>/<user>/<session>/<gesture>.json`.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::drivers::GloveError;
use crate::types::RawFrame;

/// Spaces become underscores; anything but alphanumerics, `_` and `-` is dropped.
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceNames {
    #[serde(rename = "leftHandDevice", default)]
    pub left_hand_device: Option<String>,
    #[serde(rename = "rightHandDevice", default)]
    pub right_hand_device: Option<String>,
}

/// Raw hand streams as stored. Kept as untyped JSON because older captures
/// wrap frames in extra array levels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandRecordings {
    #[serde(rename = "leftHandDataList", default)]
    pub left_hand_data_list: Value,
    #[serde(rename = "rightHandDataList", default)]
    pub right_hand_data_list: Value,
}

/// On-disk layout of one gesture recording.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureRecord {
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub gesture_number: Option<u64>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub device_name: DeviceNames,
    #[serde(default)]
    pub gesture_recording: HandRecordings,
}

impl GestureRecord {
    pub fn read(path: &Path) -> Result<Self, GloveError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_name: String,
    pub session_name: String,
    pub gesture_count: u64,
    pub session_dir: PathBuf,
    pub user_dir: PathBuf,
}

/// Writer for one capture session of one user.
pub struct SessionStore {
    user_name: String,
    session_name: String,
    user_dir: PathBuf,
    session_dir: PathBuf,
    gesture_count: u64,
}

impl SessionStore {
    pub fn create(
        root: impl AsRef<Path>,
        user_name: &str,
        session_name: &str,
    ) -> Result<Self, GloveError> {
        if user_name.trim().is_empty() {
            return Err(GloveError::EmptyName("user name"));
        }
        if session_name.trim().is_empty() {
            return Err(GloveError::EmptyName("session name"));
        }
        let user_dir = root.as_ref().join(sanitize_name(user_name.trim()));
        let session_dir = user_dir.join(sanitize_name(session_name.trim()));
        fs::create_dir_all(&session_dir)?;
        info!("gesture data will be saved to {}", session_dir.display());
        Ok(Self {
            user_name: user_name.trim().to_owned(),
            session_name: session_name.trim().to_owned(),
            user_dir,
            session_dir,
            gesture_count: 0,
        })
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            user_name: self.user_name.clone(),
            session_name: self.session_name.clone(),
            gesture_count: self.gesture_count,
            session_dir: self.session_dir.clone(),
            user_dir: self.user_dir.clone(),
        }
    }

    pub fn persist(
        &mut self,
        left: &[RawFrame],
        right: &[RawFrame],
        left_device: &str,
        right_device: &str,
        label: Option<&str>,
    ) -> Result<PathBuf, GloveError> {
        self.persist_at(
            left,
            right,
            left_device,
            right_device,
            label,
            Local::now().naive_local(),
        )
    }

    /// Writes both raw hand streams, unconverted, and returns the record path.
    pub fn persist_at(
        &mut self,
        left: &[RawFrame],
        right: &[RawFrame],
        left_device: &str,
        right_device: &str,
        label: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<PathBuf, GloveError> {
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        let stamp = at.format("%Y%m%d_%H%M%S");
        let stem = match label.map(sanitize_name) {
            Some(name) if !name.is_empty() => format!("{name}_{stamp}"),
            _ => format!("gesture_{stamp}"),
        };
        let path = unique_path(&self.session_dir, &stem);

        let gesture_number = self.gesture_count + 1;
        let record = GestureRecord {
            session_name: Some(self.session_name.clone()),
            user_name: Some(self.user_name.clone()),
            user_id: Some(sanitize_name(&self.user_name)),
            timestamp: Some(at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
            gesture_number: Some(gesture_number),
            custom_name: label.map(str::to_owned),
            device_name: DeviceNames {
                left_hand_device: Some(left_device.to_owned()),
                right_hand_device: Some(right_device.to_owned()),
            },
            gesture_recording: HandRecordings {
                left_hand_data_list: frames_to_json(left)?,
                right_hand_data_list: frames_to_json(right)?,
            },
        };

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &record)?;
        writer.flush()?;
        self.gesture_count = gesture_number;
        info!(
            "saved {} (left {} frames, right {} frames)",
            path.display(),
            left.len(),
            right.len()
        );
        Ok(path)
    }
}

/// The capture layer wraps each hand stream in one extra list.
fn frames_to_json(frames: &[RawFrame]) -> Result<Value, GloveError> {
    let rows: Vec<Vec<u16>> = frames.iter().map(|f| f.to_vec()).collect();
    Ok(serde_json::to_value(vec![rows])?)
}

fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.json"));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{stem}_{n}.json")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Folder next to a record, named after it, that receives its plots.
pub fn plot_folder(record_path: &Path) -> Result<PathBuf, GloveError> {
    let stem = record_path
        .file_stem()
        .ok_or_else(|| GloveError::MalformedRecord(format!("{}", record_path.display())))?;
    let folder = record_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(stem);
    fs::create_dir_all(&folder)?;
    Ok(folder)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSummary {
    pub user: String,
    pub sessions: usize,
    pub gestures: usize,
}

/// Read-only view over the user / session / gesture hierarchy.
pub struct GestureStore {
    root: PathBuf,
}

impl GestureStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn users(&self) -> Result<Vec<String>, GloveError> {
        let mut users = list_entries(&self.root, |p| p.is_dir())?;
        users.sort();
        Ok(users)
    }

    /// Newest-looking session names first.
    pub fn sessions(&self, user: &str) -> Result<Vec<String>, GloveError> {
        let mut sessions = list_entries(&self.root.join(user), |p| p.is_dir())?;
        sessions.sort_by(|a, b| b.cmp(a));
        Ok(sessions)
    }

    pub fn gestures(&self, user: &str, session: &str) -> Result<Vec<String>, GloveError> {
        let dir = self.root.join(user).join(session);
        let mut gestures = list_entries(&dir, |p| {
            p.is_file() && p.extension().map_or(false, |ext| ext == "json")
        })?;
        gestures.sort();
        Ok(gestures)
    }

    pub fn gesture_path(&self, user: &str, session: &str, gesture: &str) -> PathBuf {
        self.root.join(user).join(session).join(gesture)
    }

    pub fn user_summary(&self, user: &str) -> Result<UserSummary, GloveError> {
        let sessions = self.sessions(user)?;
        let mut gestures = 0;
        for session in &sessions {
            gestures += self.gestures(user, session)?.len();
        }
        Ok(UserSummary {
            user: user.to_owned(),
            sessions: sessions.len(),
            gestures,
        })
    }
}

/// Names of the entries of `dir` accepted by `keep`; a missing directory is empty.
fn list_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>, GloveError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !keep(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_owned());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn sanitizes_labels() {
        assert_eq!(sanitize_name("Morning Session #1"), "Morning_Session_1");
        assert_eq!(sanitize_name("wave-left (fast)"), "wave-left_fast");
        assert_eq!(sanitize_name("  "), "__");
    }

    #[test]
    fn persist_names_files_from_label_or_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::create(dir.path(), "Ada Lovelace", "Morning Session #1").unwrap();
        let frames = vec![[1u16; 36]; 3];
        let plain = store
            .persist_at(&frames, &frames, "AA:01", "AA:02", None, at(9, 15, 2))
            .unwrap();
        assert_eq!(plain.file_name().unwrap(), "gesture_20240309_091502.json");
        let labeled = store
            .persist_at(&frames, &[], "AA:01", "AA:02", Some("Thumbs Up!"), at(9, 15, 3))
            .unwrap();
        assert_eq!(labeled.file_name().unwrap(), "Thumbs_Up_20240309_091503.json");
        assert!(plain.starts_with(dir.path().join("Ada_Lovelace").join("Morning_Session_1")));
        assert_eq!(store.info().gesture_count, 2);
    }

    #[test]
    fn persisted_record_keeps_raw_frames_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::create(dir.path(), "bob", "s1").unwrap();
        let mut frame = [0u16; 36];
        frame[0] = 65535;
        let path = store
            .persist_at(&[frame], &[], "left-id", "right-id", Some("pinch"), at(10, 0, 0))
            .unwrap();
        let record = GestureRecord::read(&path).unwrap();
        assert_eq!(record.user_id.as_deref(), Some("bob"));
        assert_eq!(record.custom_name.as_deref(), Some("pinch"));
        assert_eq!(record.gesture_number, Some(1));
        assert_eq!(record.timestamp.as_deref(), Some("2024-03-09T10:00:00.000000"));
        assert_eq!(record.device_name.left_hand_device.as_deref(), Some("left-id"));
        let left = &record.gesture_recording.left_hand_data_list;
        assert_eq!(left[0][0][0], 65535);
        assert_eq!(left[0][0].as_array().unwrap().len(), 36);
        assert_eq!(record.gesture_recording.right_hand_data_list[0].as_array().unwrap().len(), 0);
    }

    #[test]
    fn same_second_collisions_get_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::create(dir.path(), "u", "s").unwrap();
        let first = store.persist_at(&[], &[], "l", "r", None, at(1, 2, 3)).unwrap();
        let second = store.persist_at(&[], &[], "l", "r", None, at(1, 2, 3)).unwrap();
        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "gesture_20240309_010203_2.json");
    }

    #[test]
    fn empty_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SessionStore::create(dir.path(), " ", "s"),
            Err(GloveError::EmptyName("user name"))
        ));
    }

    #[test]
    fn enumerates_hierarchy_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for (user, session) in [("zoe", "2024_a"), ("amy", "2024_a"), ("amy", "2024_b")] {
            let mut store = SessionStore::create(dir.path(), user, session).unwrap();
            store.persist_at(&[], &[], "l", "r", Some("b"), at(1, 0, 0)).unwrap();
            store.persist_at(&[], &[], "l", "r", Some("a"), at(1, 0, 0)).unwrap();
        }
        fs::write(dir.path().join("amy").join("2024_b").join("notes.txt"), "x").unwrap();
        let store = GestureStore::open(dir.path());
        assert_eq!(store.users().unwrap(), vec!["amy", "zoe"]);
        assert_eq!(store.sessions("amy").unwrap(), vec!["2024_b", "2024_a"]);
        assert_eq!(
            store.gestures("amy", "2024_b").unwrap(),
            vec!["a_20240309_010000.json", "b_20240309_010000.json"]
        );
        let summary = store.user_summary("amy").unwrap();
        assert_eq!((summary.sessions, summary.gestures), (2, 4));
    }

    #[test]
    fn missing_paths_enumerate_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = GestureStore::open(dir.path().join("nothing-here"));
        assert!(store.users().unwrap().is_empty());
        assert!(store.sessions("ghost").unwrap().is_empty());
        assert!(store.gestures("ghost", "none").unwrap().is_empty());
    }

    #[test]
    fn plot_folder_sits_next_to_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("wave_20240309_010000.json");
        let folder = plot_folder(&record).unwrap();
        assert_eq!(folder, dir.path().join("wave_20240309_010000"));
        assert!(folder.is_dir());
    }
}
