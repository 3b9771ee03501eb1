use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::message::Message;

/// Shared, immutable handle to a decoded message.
///
/// One message is typically queued to every connection in a session and kept
/// in the session history at the same time. Cloning the handle only bumps a
/// reference count, and the message is freed exactly once when the last
/// handle is dropped, from whichever thread drops it.
#[derive(Clone)]
pub struct MessagePtr(Arc<Message>);

impl MessagePtr {
    pub fn new(message: Message) -> Self {
        Self(Arc::new(message))
    }

    /// Number of live handles to this message.
    pub fn ref_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }

    /// True if both handles refer to the same allocation.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Take the message back out if this is the only handle.
    pub fn try_unwrap(this: Self) -> Result<Message, Self> {
        Arc::try_unwrap(this.0).map_err(Self)
    }

    /// Copy-on-write access: clones the message first if it is shared.
    pub fn make_mut(this: &mut Self) -> &mut Message {
        Arc::make_mut(&mut this.0)
    }
}

impl Deref for MessagePtr {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.0
    }
}

impl AsRef<Message> for MessagePtr {
    fn as_ref(&self) -> &Message {
        &self.0
    }
}

impl From<Message> for MessagePtr {
    fn from(message: Message) -> Self {
        Self::new(message)
    }
}

impl PartialEq for MessagePtr {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || *self.0 == *other.0
    }
}

impl Eq for MessagePtr {}

impl fmt::Debug for MessagePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use super::*;

    fn weak(ptr: &MessagePtr) -> Weak<Message> {
        Arc::downgrade(&ptr.0)
    }

    #[test]
    fn clones_share_one_message() {
        let a = MessagePtr::new(Message::chat(1, "shared"));
        let b = a.clone();
        let c = b.clone();
        assert_eq!(MessagePtr::ref_count(&a), 3);
        assert!(MessagePtr::ptr_eq(&a, &c));
        assert_eq!(c.context_id(), 1);
    }

    #[test]
    fn freed_once_after_last_drop_in_any_order() {
        for order in [[0usize, 1, 2], [2, 1, 0], [1, 2, 0]] {
            let first = MessagePtr::new(Message::undo_point(4));
            let mut handles = vec![Some(first.clone()), Some(first.clone()), Some(first)];
            let watcher = weak(handles[0].as_ref().unwrap());

            for (step, index) in order.iter().enumerate() {
                assert!(watcher.upgrade().is_some(), "{order:?}: alive before step {step}");
                handles[*index] = None;
            }
            assert!(watcher.upgrade().is_none(), "{order:?}: freed");
        }
    }

    #[test]
    fn handles_cross_threads() {
        let ptr = MessagePtr::new(Message::chat(2, "threads"));
        let watcher = weak(&ptr);
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let local = ptr.clone();
                std::thread::spawn(move || local.payload_length())
            })
            .collect();
        drop(ptr);
        for worker in workers {
            assert_eq!(worker.join().unwrap(), 1 + 1 + "threads".len());
        }
        assert!(watcher.upgrade().is_none());
    }

    #[test]
    fn try_unwrap_only_when_unique() {
        let a = MessagePtr::new(Message::chat(1, "x"));
        let b = a.clone();
        let a = MessagePtr::try_unwrap(a).unwrap_err();
        drop(b);
        assert_eq!(MessagePtr::try_unwrap(a).unwrap(), Message::chat(1, "x"));
    }

    #[test]
    fn make_mut_detaches_shared_copy() {
        let original = MessagePtr::new(Message::chat(0, "stamp me"));
        let mut stamped = original.clone();
        MessagePtr::make_mut(&mut stamped).set_context_id(6);
        assert_eq!(original.context_id(), 0);
        assert_eq!(stamped.context_id(), 6);
        assert!(!MessagePtr::ptr_eq(&original, &stamped));
    }
}
