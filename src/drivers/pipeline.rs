use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use log::{debug, info, warn};
use crate::drivers::buffer::RecordingBuffer;
use crate::drivers::codec::unpack_le_u16;
use crate::drivers::source::{is_button_press, is_control_shaped};
use crate::types::{CaptureMessage, Hand, HandEvent};
use crate::waveform::{LiveDisplay, RedrawTarget};
/// How long a consumer waits for an event before re-checking its stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Live view shared by both hand consumers.
#[derive(Clone)]
pub struct LiveFeed {
    pub display: LiveDisplay,
    pub target: Option<Arc<dyn RedrawTarget>>,
}
/// Single consumer of one hand's event channel.
///
/// Owns the hand's recording buffer; nothing else touches it.
pub struct HandConsumer {
    hand: Hand,
    trigger_byte: u8,
    trigger_hand: Hand,
    buffer: RecordingBuffer,
    live: Option<LiveFeed>,
    notify: Sender<CaptureMessage>,
}
impl HandConsumer {
    pub fn new(
        hand: Hand,
        trigger_byte: u8,
        trigger_hand: Hand,
        notify: Sender<CaptureMessage>,
    ) -> Self {
        Self {
            hand,
            trigger_byte,
            trigger_hand,
            buffer: RecordingBuffer::new(hand),
            live: None,
            notify,
        }
    }
    pub fn with_live(mut self, live: LiveFeed) -> Self {
        self.live = Some(live);
        self
    }
    pub fn buffer(&self) -> &RecordingBuffer {
        &self.buffer
    }
    pub fn handle(&mut self, event: HandEvent) {
        match event {
            HandEvent::Control(payload) => self.on_control(&payload),
            HandEvent::Data(payload) => self.on_data(&payload),
            HandEvent::StartRecording => {
                self.buffer.start();
                debug!("[{}] recording", self.hand);
            }
            HandEvent::StopRecording => {
                self.buffer.stop();
                debug!("[{}] stopped with {} frames", self.hand, self.buffer.frame_count());
            }
            HandEvent::Drain(reply) => {
                if reply.send(self.buffer.drain()).is_err() {
                    warn!("[{}] drain requested but nobody is waiting", self.hand);
                }
            }
            HandEvent::ClearRecording => self.buffer.clear(),
        }
    }
    fn on_control(&self, payload: &[u8]) {
        if !is_button_press(payload, self.trigger_byte) {
            debug!("[{}] control payload {payload:?}", self.hand);
            return;
        }
        if self.hand != self.trigger_hand {
            debug!("[{}] button press ignored; only {} toggles", self.hand, self.trigger_hand);
            return;
        }
        info!("[{}] button pressed", self.hand);
        let _ = self.notify.send(CaptureMessage::ButtonPressed(self.hand));
    }
    fn on_data(&mut self, payload: &[u8]) {
        if is_control_shaped(payload, self.trigger_byte) {
            return;
        }
        let values = unpack_le_u16(payload);
        if !self.buffer.append(&values) {
            return;
        }
        let Some(live) = &self.live else {
            return;
        };
        if !live.display.add_frame(self.hand, &values) {
            return;
        }
        if let Some(target) = &live.target {
            if let Err(err) = target.redraw(&live.display.snapshot()) {
                warn!("[{}] live redraw failed: {err}", self.hand);
            }
        }
    }
    /// Processes events until the channel closes or `stop` is raised.
    pub fn run(mut self, events: Receiver<HandEvent>, stop: Arc<AtomicBool>) {
        while !stop.load(Ordering::SeqCst) {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("[{}] event channel closed", self.hand);
                    let _ = self.notify.send(CaptureMessage::ChannelClosed(self.hand));
                    break;
                }
            }
        }
        debug!("[{}] consumer exiting", self.hand);
    }
    pub fn spawn(
        self,
        events: Receiver<HandEvent>,
        stop: Arc<AtomicBool>,
    ) -> std::io::Result<JoinHandle<()>> {
        let name = format!("hand-{}", self.hand.label().to_lowercase());
        thread::Builder::new()
            .name(name)
            .spawn(move || self.run(events, stop))
    }
}
