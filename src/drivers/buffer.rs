use log::{debug, warn};
use crate::drivers::codec::to_raw_frame;
use crate::types::{Hand, RawFrame};
/// Rejections logged in full before the buffer goes quiet.
const LOGGED_REJECTIONS: usize = 3;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Stopped,
}
/// Append-only frame store for one hand during one capture.
pub struct RecordingBuffer {
    hand: Hand,
    frames: Vec<RawFrame>,
    frame_count: usize,
    rejected: usize,
    state: RecordingState,
}
impl RecordingBuffer {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            frames: Vec::new(),
            frame_count: 0,
            rejected: 0,
            state: RecordingState::Idle,
        }
    }
    pub fn state(&self) -> RecordingState {
        self.state
    }
    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
    pub fn rejected(&self) -> usize {
        self.rejected
    }
    pub fn start(&mut self) {
        self.frames.clear();
        self.frame_count = 0;
        self.rejected = 0;
        self.state = RecordingState::Recording;
    }
    /// Appends a frame while recording. Frames of the wrong length are counted and dropped.
    pub fn append(&mut self, values: &[u16]) -> bool {
        if !self.is_recording() {
            return false;
        }
        match to_raw_frame(values) {
            Ok(frame) => {
                self.frames.push(frame);
                self.frame_count += 1;
                if self.frame_count % 100 == 0 {
                    debug!("[{}] frames: {}", self.hand, self.frame_count);
                }
                true
            }
            Err(err) => {
                self.rejected += 1;
                if self.rejected <= LOGGED_REJECTIONS {
                    warn!("[{}] dropped frame: {err}", self.hand);
                } else if self.rejected % 100 == 0 {
                    debug!("[{}] {} malformed frames dropped so far", self.hand, self.rejected);
                }
                false
            }
        }
    }
    pub fn stop(&mut self) {
        if self.state == RecordingState::Recording {
            self.state = RecordingState::Stopped;
        }
    }
    /// Copy of the captured frames; the buffer itself is left untouched.
    pub fn drain(&self) -> Vec<RawFrame> {
        self.frames.clone()
    }
    pub fn frames(&self) -> &[RawFrame] {
        &self.frames
    }
    pub fn clear(&mut self) {
        self.frames.clear();
        self.frame_count = 0;
        self.rejected = 0;
        self.state = RecordingState::Idle;
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn start_resets_previous_capture() {
        let mut buffer = RecordingBuffer::new(Hand::Left);
        buffer.start();
        assert!(buffer.append(&[1u16; 36]));
        buffer.stop();
        buffer.start();
        assert_eq!(buffer.frame_count(), 0);
        assert!(buffer.frames().is_empty());
        assert_eq!(buffer.state(), RecordingState::Recording);
    }
    #[test]
    fn wrong_length_frames_are_counted_not_stored() {
        let mut buffer = RecordingBuffer::new(Hand::Right);
        buffer.start();
        assert!(!buffer.append(&[0u16; 35]));
        assert!(!buffer.append(&[0u16; 40]));
        assert!(buffer.append(&[7u16; 36]));
        assert_eq!(buffer.frame_count(), 1);
        assert_eq!(buffer.rejected(), 2);
    }
    #[test]
    fn stopped_buffer_is_frozen_and_drain_is_non_destructive() {
        let mut buffer = RecordingBuffer::new(Hand::Right);
        assert!(!buffer.append(&[0u16; 36]));
        buffer.start();
        buffer.append(&[3u16; 36]);
        buffer.append(&[4u16; 36]);
        buffer.stop();
        assert!(!buffer.append(&[5u16; 36]));
        let first = buffer.drain();
        let second = buffer.drain();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(first[1][0], 4);
        buffer.clear();
        assert!(buffer.drain().is_empty());
        assert_eq!(buffer.state(), RecordingState::Idle);
    }
}
