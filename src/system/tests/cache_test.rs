use crate::settings::{DctSettings, Finest};
use crate::system::SystemCache;
use crate::wrapping::NativeWrapping;
use rayon::prelude::*;
use std::sync::Arc;

#[test]
fn test_cache_shares_systems() -> anyhow::Result<()> {
    let cache = SystemCache::new(NativeWrapping::new());
    let settings = DctSettings::new(false, Finest::Wavelets, 3, 8);
    assert!(cache.is_empty());

    let first = cache.get_or_build(32, 32, &settings)?;
    let again = cache.get_or_build(32, 32, &settings)?;
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(cache.len(), 1);

    let real = cache.get_or_build(32, 32, &settings.with_real(true))?;
    assert!(!Arc::ptr_eq(&first, &real));
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn test_cache_does_not_store_failures() {
    let cache = SystemCache::new(NativeWrapping::new());
    let settings = DctSettings::new(false, Finest::Wavelets, 9, 8);
    assert!(cache.get_or_build(16, 16, &settings).is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_serves_rayon_callers() -> anyhow::Result<()> {
    let cache = SystemCache::new(NativeWrapping::new());
    let keys = [
        DctSettings::new(false, Finest::Wavelets, 2, 8),
        DctSettings::new(true, Finest::Curvelets, 2, 8),
    ];
    let systems = (0..16)
        .into_par_iter()
        .map(|i| cache.get_or_build(24, 24, &keys[i % 2]))
        .collect::<crate::error::Result<Vec<_>>>()?;

    assert_eq!(cache.len(), 2);
    for (i, system) in systems.iter().enumerate() {
        let stored = cache.get_or_build(24, 24, &keys[i % 2])?;
        assert!(Arc::ptr_eq(system, &stored));
    }
    Ok(())
}
