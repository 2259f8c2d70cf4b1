use std::collections::VecDeque;

/// RingBuffer keeps the most recent `capacity` values; older values are dropped on push.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    capacity: usize,
    values: VecDeque<T>,
}

impl<T: Copy + Into<f64>> RingBuffer<T> {
    pub fn new(capacity: usize) -> RingBuffer<T> {
        RingBuffer {
            capacity: capacity.max(1),
            values: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, value: T) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// get_avg returns the average of the buffered values, None if the buffer is empty.
    pub fn get_avg(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().map(|&v| v.into()).sum();
        Some(sum / self.values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_values_are_dropped() {
        let mut buf = RingBuffer::new(3);
        for v in [10u32, 20, 30, 40] {
            buf.push(v);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get_avg(), Some(30.0));
    }

    #[test]
    fn empty_buffer_has_no_average() {
        let buf: RingBuffer<u32> = RingBuffer::new(4);
        assert!(buf.get_avg().is_none());
    }
}
