use crate::drivers::GloveError;
use crate::types::{SensorClass, SensorUnit, FRAME_LEN};
/// Raw counts per g. Calibration constant of the glove firmware.
pub const ACC_COUNTS_PER_G: f64 = 4096.0;
/// Raw counts per degree/second. Calibration constant of the glove firmware.
pub const GYRO_COUNTS_PER_DPS: f64 = 32.8;
/// A converted sensor value, or a marker that the raw input could not be decoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reading {
    Valid(f64),
    Invalid,
}
impl Reading {
    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Valid(v) => Some(v),
            Reading::Invalid => None,
        }
    }
}
/// Returns the triple as plain numbers only when every component decoded.
pub fn valid_triple(triple: &[Reading; 3]) -> Option<[f64; 3]> {
    Some([triple[0].value()?, triple[1].value()?, triple[2].value()?])
}
/// Recovers the signed 16-bit value the firmware transmitted and scales it.
pub fn decode(raw: u16, class: SensorClass) -> f64 {
    let signed = if raw >= 32768 {
        raw as i32 - 65536
    } else {
        raw as i32
    };
    match class {
        SensorClass::Accelerometer => signed as f64 / ACC_COUNTS_PER_G,
        SensorClass::Gyroscope => signed as f64 / GYRO_COUNTS_PER_DPS,
    }
}
/// Anything that may hold one raw transport value.
///
/// Live frames are already `u16`; values read back from disk are JSON
/// numbers and may be out of range or fractional.
pub trait RawSample: Copy {
    fn to_raw(self) -> Option<u16>;
}
impl RawSample for u16 {
    fn to_raw(self) -> Option<u16> {
        Some(self)
    }
}
impl RawSample for i64 {
    fn to_raw(self) -> Option<u16> {
        u16::try_from(self).ok()
    }
}
impl RawSample for f64 {
    fn to_raw(self) -> Option<u16> {
        if self.is_finite() && self.fract() == 0.0 && (0.0..=65535.0).contains(&self) {
            Some(self as u16)
        } else {
            None
        }
    }
}
pub fn decode_sample<T: RawSample>(raw: T, class: SensorClass) -> Reading {
    match raw.to_raw() {
        Some(value) => Reading::Valid(decode(value, class)),
        None => Reading::Invalid,
    }
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitReading {
    pub unit: SensorUnit,
    pub acc: [Reading; 3],
    pub gyro: [Reading; 3],
}
impl UnitReading {
    pub fn triple(&self, class: SensorClass) -> [Reading; 3] {
        match class {
            SensorClass::Accelerometer => self.acc,
            SensorClass::Gyroscope => self.gyro,
        }
    }
}
/// Converted values of one frame, one entry per sensor unit in canonical order.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReadings {
    units: [UnitReading; 6],
}
impl FrameReadings {
    pub fn get(&self, unit: SensorUnit) -> &UnitReading {
        &self.units[unit.index()]
    }
    pub fn iter(&self) -> impl Iterator<Item = &UnitReading> {
        self.units.iter()
    }
    pub fn len(&self) -> usize {
        self.units.len()
    }
    pub fn is_empty(&self) -> bool {
        false
    }
}
pub fn split_frame<T: RawSample>(raw: &[T]) -> Result<FrameReadings, GloveError> {
    if raw.len() != FRAME_LEN {
        return Err(GloveError::InvalidFrameLength {
            expected: FRAME_LEN,
            actual: raw.len(),
        });
    }
    let units = SensorUnit::ALL.map(|unit| {
        let slice = &raw[unit.offset()..unit.offset() + 6];
        let acc = [0, 1, 2].map(|i| decode_sample(slice[i], SensorClass::Accelerometer));
        let gyro = [3, 4, 5].map(|i| decode_sample(slice[i], SensorClass::Gyroscope));
        UnitReading { unit, acc, gyro }
    });
    Ok(FrameReadings { units })
}
/// Transport payload to little-endian `u16` values. A trailing odd byte is dropped.
pub fn unpack_le_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
/// Copies a validated slice into a fixed frame.
pub fn to_raw_frame(values: &[u16]) -> Result<crate::types::RawFrame, GloveError> {
    values
        .try_into()
        .map_err(|_| GloveError::InvalidFrameLength {
            expected: FRAME_LEN,
            actual: values.len(),
        })
}
#[cfg(test)]
mod tests {
    use super::*;
    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }
    #[test]
    fn decode_known_accelerometer_values() {
        assert_eq!(decode(0, SensorClass::Accelerometer), 0.0);
        assert_eq!(decode(32768, SensorClass::Accelerometer), -8.0);
        assert_eq!(decode(4096, SensorClass::Accelerometer), 1.0);
        assert!(close(decode(65535, SensorClass::Accelerometer), -0.000244140625));
    }
    #[test]
    fn decode_known_gyroscope_value() {
        let expected = (32800.0 - 65536.0) / 32.8;
        assert_eq!(decode(32800, SensorClass::Gyroscope), expected);
        assert!(close(expected, -998.048780));
        assert!(close(decode(32, SensorClass::Gyroscope), 0.975609756));
    }
    #[test]
    fn decoded_values_stay_within_sensor_range() {
        for raw in 0..=u16::MAX {
            let acc = decode(raw, SensorClass::Accelerometer);
            let gyro = decode(raw, SensorClass::Gyroscope);
            assert!((-8.0..8.0).contains(&acc), "acc {raw} -> {acc}");
            assert!((-1000.0..1000.0).contains(&gyro), "gyro {raw} -> {gyro}");
        }
    }
    #[test]
    fn unrepresentable_samples_become_invalid() {
        assert_eq!(decode_sample(70000i64, SensorClass::Accelerometer), Reading::Invalid);
        assert_eq!(decode_sample(-1i64, SensorClass::Gyroscope), Reading::Invalid);
        assert_eq!(decode_sample(12.5f64, SensorClass::Accelerometer), Reading::Invalid);
        assert_eq!(decode_sample(f64::NAN, SensorClass::Accelerometer), Reading::Invalid);
        assert_eq!(
            decode_sample(4096.0f64, SensorClass::Accelerometer),
            Reading::Valid(1.0)
        );
    }
    #[test]
    fn split_frame_rejects_wrong_lengths() {
        for len in [0usize, 1, 35, 37, 72] {
            let raw = vec![0u16; len];
            match split_frame(&raw) {
                Err(GloveError::InvalidFrameLength { expected, actual }) => {
                    assert_eq!(expected, 36);
                    assert_eq!(actual, len);
                }
                other => panic!("expected InvalidFrameLength, got {other:?}"),
            }
        }
    }
    #[test]
    fn split_frame_maps_slices_to_units() {
        let raw: Vec<u16> = (0..36usize).map(|i| (i * 512) as u16).collect();
        let frame = split_frame(&raw).unwrap();
        assert_eq!(frame.len(), 6);
        let units: Vec<SensorUnit> = frame.iter().map(|u| u.unit).collect();
        assert_eq!(units, SensorUnit::ALL.to_vec());
        let ring = frame.get(SensorUnit::Ring);
        assert_eq!(ring.acc[0], Reading::Valid(decode(raw[12], SensorClass::Accelerometer)));
        assert_eq!(ring.gyro[2], Reading::Valid(decode(raw[17], SensorClass::Gyroscope)));
    }
    #[test]
    fn invalid_axis_does_not_poison_the_frame() {
        let mut raw = vec![4096.0f64; 36];
        raw[1] = 1e9;
        let frame = split_frame(&raw).unwrap();
        let index = frame.get(SensorUnit::Index);
        assert_eq!(index.acc[0], Reading::Valid(1.0));
        assert_eq!(index.acc[1], Reading::Invalid);
        assert!(valid_triple(&index.acc).is_none());
        assert!(valid_triple(&index.gyro).is_some());
    }
    #[test]
    fn unpacks_little_endian_pairs() {
        assert_eq!(unpack_le_u16(&[0x00, 0x10, 0xff, 0xff, 0x07]), vec![4096, 65535]);
    }
}
