use thiserror::Error;

///
/// All errors emitted from the channel module.
///
/// - `Full`: When a non-overwriting queue is at capacity and another item is put
///     Parameters:
///     - `capacity`: The queue's capacity
///
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("The queue is full, holding {} items.", .capacity)]
    Full { capacity: usize },
}
