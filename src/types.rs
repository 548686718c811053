// src/types.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of raw values in one transport frame (6 units x 6 values).
pub const FRAME_LEN: usize = 36;
/// Raw values owned by each sensor unit: 3 accelerometer + 3 gyroscope axes.
pub const VALUES_PER_UNIT: usize = 6;

/// One decoded transport packet.
pub type RawFrame = [u16; FRAME_LEN];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn label(self) -> &'static str {
        match self {
            Hand::Left => "Left",
            Hand::Right => "Right",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Hand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Hand::Left),
            "right" | "r" => Ok(Hand::Right),
            other => Err(format!("unknown hand '{other}' (expected Left or Right)")),
        }
    }
}

/// Sensor positions on a glove, in the order they appear in a raw frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorUnit {
    Index,
    Middle,
    Ring,
    Little,
    Thumb,
    Palm,
}

impl SensorUnit {
    pub const ALL: [SensorUnit; 6] = [
        SensorUnit::Index,
        SensorUnit::Middle,
        SensorUnit::Ring,
        SensorUnit::Little,
        SensorUnit::Thumb,
        SensorUnit::Palm,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// First raw value owned by this unit.
    pub fn offset(self) -> usize {
        self.index() * VALUES_PER_UNIT
    }

    /// Name used in plot titles, PNG file names and table columns.
    pub fn name(self) -> &'static str {
        match self {
            SensorUnit::Index => "IndexFinger",
            SensorUnit::Middle => "MiddleFinger",
            SensorUnit::Ring => "RingFinger",
            SensorUnit::Little => "LittleFinger",
            SensorUnit::Thumb => "Thumb",
            SensorUnit::Palm => "Palm",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            SensorUnit::Index => "Index",
            SensorUnit::Middle => "Middle",
            SensorUnit::Ring => "Ring",
            SensorUnit::Little => "Little",
            SensorUnit::Thumb => "Thumb",
            SensorUnit::Palm => "Palm",
        }
    }
}

impl fmt::Display for SensorUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorClass {
    Accelerometer,
    Gyroscope,
}

impl SensorClass {
    pub const ALL: [SensorClass; 2] = [SensorClass::Accelerometer, SensorClass::Gyroscope];

    pub fn label(self) -> &'static str {
        match self {
            SensorClass::Accelerometer => "Acc",
            SensorClass::Gyroscope => "Gyro",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SensorClass::Accelerometer => "Accelerometer (g)",
            SensorClass::Gyroscope => "Gyroscope (°/s)",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            SensorClass::Accelerometer => "Acceleration (g)",
            SensorClass::Gyroscope => "Angular Velocity (°/s)",
        }
    }
}

/// One of the six values a sensor unit reports, in raw-frame order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    AccX,
    AccY,
    AccZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::AccX,
        Component::AccY,
        Component::AccZ,
        Component::GyroX,
        Component::GyroY,
        Component::GyroZ,
    ];

    pub fn class(self) -> SensorClass {
        match self {
            Component::AccX | Component::AccY | Component::AccZ => SensorClass::Accelerometer,
            _ => SensorClass::Gyroscope,
        }
    }

    /// Position within a sensor unit's six raw values.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis within the owning class (0 = X).
    pub fn axis(self) -> usize {
        (self as usize) % 3
    }

    pub fn name(self) -> &'static str {
        match self {
            Component::AccX => "AccX",
            Component::AccY => "AccY",
            Component::AccZ => "AccZ",
            Component::GyroX => "GyroX",
            Component::GyroY => "GyroY",
            Component::GyroZ => "GyroZ",
        }
    }

    pub fn for_class(class: SensorClass) -> [Component; 3] {
        match class {
            SensorClass::Accelerometer => [Component::AccX, Component::AccY, Component::AccZ],
            SensorClass::Gyroscope => [Component::GyroX, Component::GyroY, Component::GyroZ],
        }
    }
}

/// Commands written to a glove's control characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GloveCommand {
    StartBroadcast,
    StopBroadcast,
}

impl GloveCommand {
    pub fn bytes(self) -> [u8; 2] {
        match self {
            GloveCommand::StartBroadcast => [0x01, 0x01],
            GloveCommand::StopBroadcast => [0x01, 0x02],
        }
    }
}

/// Everything a per-hand consumer can receive on its channel.
#[derive(Clone, Debug)]
pub enum HandEvent {
    /// Payload from the control characteristic (button presses).
    Control(Vec<u8>),
    /// Payload from the data characteristic (sensor frames).
    Data(Vec<u8>),
    StartRecording,
    StopRecording,
    /// Ask the consumer for a copy of its recording buffer.
    Drain(std::sync::mpsc::Sender<Vec<RawFrame>>),
    ClearRecording,
}

/// Messages sent from the hand consumers back to the capture engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureMessage {
    ButtonPressed(Hand),
    ChannelClosed(Hand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_offsets_follow_canonical_order() {
        let offsets: Vec<usize> = SensorUnit::ALL.iter().map(|u| u.offset()).collect();
        assert_eq!(offsets, vec![0, 6, 12, 18, 24, 30]);
    }

    #[test]
    fn components_split_into_classes() {
        assert_eq!(Component::GyroY.class(), SensorClass::Gyroscope);
        assert_eq!(Component::GyroY.axis(), 1);
        assert_eq!(Component::AccZ.axis(), 2);
    }

    #[test]
    fn hand_parses_case_insensitively() {
        assert_eq!("right".parse::<Hand>().unwrap(), Hand::Right);
        assert_eq!("Left".parse::<Hand>().unwrap(), Hand::Left);
        assert!("middle".parse::<Hand>().is_err());
    }
}
