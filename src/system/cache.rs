use super::{build_curvelet_system_par, CurveletSystem};
use crate::error::Result;
use crate::settings::DctSettings;
use crate::wrapping::CurveletEngine;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type SystemKey = (usize, usize, DctSettings);

/// Builds each (rows, cols, settings) system once and hands out shared
/// references afterwards.
#[derive(Debug, Default)]
pub struct SystemCache<E> {
    engine: E,
    systems: Mutex<HashMap<SystemKey, Arc<CurveletSystem>>>,
}

impl<E: CurveletEngine + Sync> SystemCache<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            systems: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the cached system for the key, building it first if needed.
    /// The map stays unlocked while a build runs; when two callers race on
    /// one key, the first stored system wins.
    pub fn get_or_build(
        &self,
        rows: usize,
        cols: usize,
        settings: &DctSettings,
    ) -> Result<Arc<CurveletSystem>> {
        let key = (rows, cols, *settings);
        if let Some(system) = self.lock().get(&key) {
            debug!(rows, cols, "curvelet system cache hit");
            return Ok(Arc::clone(system));
        }
        let built = Arc::new(build_curvelet_system_par(&self.engine, rows, cols, settings)?);
        let mut systems = self.lock();
        Ok(Arc::clone(systems.entry(key).or_insert(built)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SystemKey, Arc<CurveletSystem>>> {
        self.systems.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Finest;
    use crate::wrapping::NativeWrapping;

    #[test]
    fn test_poisoned_lock_keeps_entries() {
        let cache = SystemCache::new(NativeWrapping::new());
        let settings = DctSettings::new(false, Finest::Wavelets, 2, 8);
        let first = cache.get_or_build(16, 16, &settings).unwrap();

        std::thread::scope(|scope| {
            let poisoner = scope.spawn(|| {
                let _guard = cache.systems.lock();
                panic!("poison the cache lock");
            });
            assert!(poisoner.join().is_err());
        });
        assert!(cache.systems.is_poisoned());

        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
        let again = cache.get_or_build(16, 16, &settings).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
}
