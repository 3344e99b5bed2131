use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

static POISON_RECOVERIES: AtomicU64 = AtomicU64::new(0);

/// Number of times a poisoned lock has been recovered in this process.
pub fn poison_recovery_count() -> u64 {
    POISON_RECOVERIES.load(Ordering::Relaxed)
}

pub fn mutex_lock_or_recover<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        POISON_RECOVERIES.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("recovering from poisoned mutex");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lock_healthy_mutex() {
        let lock = Mutex::new(5);
        *mutex_lock_or_recover(&lock) += 1;
        assert_eq!(*mutex_lock_or_recover(&lock), 6);
    }

    #[test]
    fn test_recovers_poisoned_mutex() {
        let lock = Arc::new(Mutex::new(vec![1, 2]));
        let poisoner = Arc::clone(&lock);
        let before = poison_recovery_count();

        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(lock.is_poisoned());
        let guard = mutex_lock_or_recover(&lock);
        assert_eq!(*guard, vec![1, 2]);
        assert!(poison_recovery_count() > before);
    }
}
