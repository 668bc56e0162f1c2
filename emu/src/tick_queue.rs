use std::collections::VecDeque;

/// A bounded FIFO.
///
/// Unlike a ring buffer a full queue refuses new elements instead of
/// dropping the oldest one: ticks are never lost, the producer has to wait
/// for room.
#[derive(Debug, Default)]
pub struct TickQueue<T> {
    capacity: usize,
    buffer: VecDeque<T>,
}

impl<T> TickQueue<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Pushes an element to the back of the queue.
    ///
    /// Gives the element back when the queue is at capacity.
    pub fn push(&mut self, element: T) -> Result<(), T> {
        if self.is_full() {
            return Err(element);
        }
        self.buffer.push_back(element);
        Ok(())
    }

    /// Removes the oldest element.
    pub fn pop(&mut self) -> Option<T> {
        self.buffer.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
