use std::collections::VecDeque;
/// Fixed-capacity sample store; the oldest triple is evicted once full.
pub struct SampleBuffer {
    data: VecDeque<[f64; 3]>,
    capacity: usize,
}
impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    pub fn push(&mut self, sample: [f64; 3]) {
        self.data.push_back(sample);
        while self.data.len() > self.capacity {
            self.data.pop_front();
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = &[f64; 3]> {
        self.data.iter()
    }
    /// The newest `count` samples, oldest first.
    pub fn tail(&self, count: usize) -> Vec<[f64; 3]> {
        let skip = self.data.len().saturating_sub(count);
        self.data.iter().skip(skip).copied().collect()
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn evicts_oldest_past_capacity() {
        let mut buffer = SampleBuffer::new(3);
        for i in 0..5 {
            buffer.push([i as f64; 3]);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.iter().next(), Some(&[2.0; 3]));
        assert_eq!(buffer.tail(2), vec![[3.0; 3], [4.0; 3]]);
        assert_eq!(buffer.tail(10).len(), 3);
    }
}
