use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is how the streaming worker and its consumers share the
/// `ChunkStreamer`: the worker takes the write guard while it sweeps, everyone
/// else only ever takes read guards.
///
/// # Examples
///
/// ```
/// use voxel_streaming::core::MtResource;
///
/// let counter = MtResource::new(0);
/// *counter.get_mut() += 1;
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Poisoning
/// A panic while a guard is held poisons the lock. The streaming data stays
/// structurally valid across a panicking reader, so both accessors recover the
/// guard instead of propagating the poison.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard for the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns an exclusive guard for the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of live handles to the same resource.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn shares_value_between_threads() {
        let counter = MtResource::new(0u32);
        let counter_clone = counter.clone();
        assert_eq!(counter.handle_count(), 2);

        let handle = thread::spawn(move || {
            *counter_clone.get_mut() += 5;
        });
        handle.join().unwrap();

        assert_eq!(*counter.get(), 5);
        assert_eq!(counter.handle_count(), 1);
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let value = MtResource::new(vec![1, 2, 3]);
        let poisoner = value.clone();

        let result = thread::spawn(move || {
            let _guard = poisoner.get_mut();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());

        value.get_mut().push(4);
        assert_eq!(value.get().len(), 4);
    }
}
