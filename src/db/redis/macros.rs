/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, stores its
/// value in the background with the given TTL (seconds) and returns it. Errors
/// from `$block` are propagated with `?` and nothing is cached.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Popular, POPULAR_CACHE_TTL, async move {
///     self.fetch_page("/movie/popular", &[]).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
