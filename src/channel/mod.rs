//!
//! Inter-task communication channels
//!
//! Every task runs on the same thread, so channels are reference counted cells
//! rather than locks. Cloning a channel hands out another end of the same channel.
//!

pub mod error;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use error::ChannelError;

///
/// A single slot register where the latest value wins. Putting overwrites any value
/// not yet read, and reading does not consume it.
///
#[derive(Debug)]
pub struct Share<T: Copy> {
    slot: Rc<Cell<Option<T>>>,
}

impl<T: Copy> Share<T> {
    pub fn new() -> Share<T> {
        Share { slot: Rc::new(Cell::new(None)) }
    }

    pub fn put(&self, value: T) {
        self.slot.set(Some(value));
    }

    ///
    /// # Returns:
    /// - The most recently put value, or `None` if nothing was put since the last clear
    ///
    pub fn get(&self) -> Option<T> {
        self.slot.get()
    }

    pub fn clear(&self) {
        self.slot.set(None);
    }
}

impl<T: Copy> Clone for Share<T> {
    fn clone(&self) -> Self {
        Share { slot: Rc::clone(&self.slot) }
    }
}

impl<T: Copy> Default for Share<T> {
    fn default() -> Self {
        Share::new()
    }
}

///
/// A bounded first-in first-out queue. Reads never block; an empty queue simply
/// returns `None`.
///
/// # Fields:
/// - `items`: The queued items, oldest at the front
/// - `capacity`: The maximum number of items held
/// - `overwrite`: If true, putting into a full queue drops the oldest item instead of failing
///
#[derive(Debug)]
pub struct Queue<T> {
    items: Rc<RefCell<VecDeque<T>>>,
    capacity: usize,
    overwrite: bool,
}

impl<T> Queue<T> {
    /// The queue starts empty and grows as items arrive, up to `capacity`.
    pub fn new(capacity: usize, overwrite: bool) -> Queue<T> {
        Queue { items: Rc::new(RefCell::new(VecDeque::new())), capacity, overwrite }
    }

    ///
    /// Appends an item to the back of the queue.
    ///
    /// # Parameters:
    /// - `item`: The item to queue
    ///
    /// # Returns:
    /// - `ChannelError::Full` if the queue is full and does not overwrite. The item is dropped
    ///
    pub fn put(&self, item: T) -> Result<(), ChannelError> {
        let mut items = self.items.borrow_mut();

        if items.len() >= self.capacity {
            if !self.overwrite || self.capacity == 0 {
                return Err(ChannelError::Full { capacity: self.capacity });
            }
            items.pop_front();
        }

        items.push_back(item);
        Ok(())
    }

    /// Removes and returns the oldest item.
    pub fn get(&self) -> Option<T> {
        self.items.borrow_mut().pop_front()
    }

    /// True if there is at least one item waiting.
    pub fn any(&self) -> bool {
        !self.items.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Queue { items: Rc::clone(&self.items), capacity: self.capacity, overwrite: self.overwrite }
    }
}

///
/// The global ready flag. While it is down, tasks stop commanding hardware.
///
#[derive(Debug, Clone, Default)]
pub struct Flag {
    raised: Rc<Cell<bool>>,
}

impl Flag {
    pub fn new(raised: bool) -> Flag {
        Flag { raised: Rc::new(Cell::new(raised)) }
    }

    pub fn set(&self, raised: bool) {
        self.raised.set(raised);
    }

    pub fn get(&self) -> bool {
        self.raised.get()
    }
}
