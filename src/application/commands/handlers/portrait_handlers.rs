//! Portrait Handlers - 角色头像的缓存优先获取
//!
//! 头像不走 GenerationJob：逐角色独立满足，分析结果首次渲染时并行
//! 预取。同 key 的并发未命中折叠为一次底层生成（单飞），失败降级为
//! "无图"且不缓存毒值。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::application::commands::RegeneratePortrait;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    portrait_cache_key, AssetStorePort, CurrentBookPort, ImageEnginePort, ImageRequest,
    PortraitCachePort, PortraitKey,
};
use crate::application::prompts;
use crate::application::queries::GetEntityPortrait;
use crate::domain::normalize_entity_name;

/// 头像查询结果
#[derive(Debug, Clone)]
pub struct PortraitResult {
    pub image_url: String,
    pub version: u64,
}

/// Portrait Handler
pub struct PortraitHandler {
    current: Arc<dyn CurrentBookPort>,
    cache: Arc<dyn PortraitCachePort>,
    image_engine: Arc<dyn ImageEnginePort>,
    asset_store: Arc<dyn AssetStorePort>,
    /// 头像边长（正方形，适配圆形裁切）
    portrait_size: u32,
    /// 同 key 并发未命中的单飞闸门
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl PortraitHandler {
    pub fn new(
        current: Arc<dyn CurrentBookPort>,
        cache: Arc<dyn PortraitCachePort>,
        image_engine: Arc<dyn ImageEnginePort>,
        asset_store: Arc<dyn AssetStorePort>,
        portrait_size: u32,
    ) -> Self {
        Self {
            current,
            cache,
            image_engine,
            asset_store,
            portrait_size,
            in_flight: DashMap::new(),
        }
    }

    /// 获取头像；未命中时生成并缓存，失败返回 None
    pub async fn get_or_create(
        &self,
        query: GetEntityPortrait,
    ) -> Result<Option<PortraitResult>, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;
        let key = PortraitKey::new(current.book.id(), &query.entity_name, &query.style);

        // 快路径：命中即返回，不触碰生成服务
        if let Some(record) = self.cache.get(&key).await? {
            return Ok(Some(PortraitResult {
                image_url: self.asset_store.public_url(&record.rel_path),
                version: record.version,
            }));
        }

        let flight_key = portrait_cache_key(&key);
        let gate = self
            .in_flight
            .entry(flight_key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        // 闸门内复查：并发未命中里只有第一个真正生成
        if let Some(record) = self.cache.get(&key).await? {
            drop(_guard);
            self.in_flight.remove(&flight_key);
            return Ok(Some(PortraitResult {
                image_url: self.asset_store.public_url(&record.rel_path),
                version: record.version,
            }));
        }

        let result = self
            .generate_and_store(&key, &query.entity_name, &query.role, &query.style)
            .await;

        drop(_guard);
        self.in_flight.remove(&flight_key);

        result
    }

    /// 显式重新生成：成功时覆盖缓存并递增版本
    pub async fn regenerate(
        &self,
        command: RegeneratePortrait,
    ) -> Result<Option<PortraitResult>, ApplicationError> {
        let current = self.current.get().ok_or(ApplicationError::NoContext)?;
        let key = PortraitKey::new(current.book.id(), &command.entity_name, &command.style);

        let result = self
            .generate_and_store(&key, &command.entity_name, &command.role, &command.style)
            .await?;

        match &result {
            Some(r) => tracing::info!(
                entity = %command.entity_name,
                version = r.version,
                "Portrait regenerated"
            ),
            None => tracing::warn!(entity = %command.entity_name, "Portrait regeneration failed"),
        }

        Ok(result)
    }

    /// 书加载/摄取后调用：并行预取前 n 位角色的头像
    pub async fn prefetch_top(&self, n: usize, style: &str) {
        let Some(current) = self.current.get() else {
            return;
        };

        let entities: Vec<_> = current
            .analysis
            .top_entities(n)
            .iter()
            .map(|e| (e.name.clone(), e.role.clone()))
            .collect();

        tracing::info!(count = entities.len(), "Prefetching entity portraits");

        let tasks = entities.into_iter().map(|(name, role)| {
            self.get_or_create(GetEntityPortrait {
                entity_name: name,
                role,
                style: style.to_string(),
            })
        });

        for result in futures_util::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Portrait prefetch failed");
            }
        }
    }

    /// 生成一张头像并写入缓存；失败降级为 None（缺席，不缓存）
    async fn generate_and_store(
        &self,
        key: &PortraitKey,
        entity_name: &str,
        role: &str,
        style: &str,
    ) -> Result<Option<PortraitResult>, ApplicationError> {
        let prompt = prompts::portrait_prompt(entity_name, role, style);

        // 种子取 key 的哈希前缀：同 (书, 角色, 风格) 可复现
        let digest = md5::compute(portrait_cache_key(key).as_bytes());
        let seed = u64::from_le_bytes(digest.0[..8].try_into().unwrap_or([0u8; 8]));

        let image = match self
            .image_engine
            .generate(ImageRequest {
                prompt,
                style: style.to_string(),
                seed,
                width: self.portrait_size,
                height: self.portrait_size,
            })
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(entity = %entity_name, error = %e, "Portrait generation failed");
                return Ok(None);
            }
        };

        let safe_name: String = normalize_entity_name(entity_name)
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let rel_path = format!("{}/entities/entity_{}.jpg", key.book_id, safe_name);

        self.asset_store.write(&rel_path, &image).await?;
        let record = self.cache.put(key, &rel_path).await?;

        Ok(Some(PortraitResult {
            image_url: self.asset_store.public_url(&record.rel_path),
            version: record.version,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AssetError, ImageEngineError, PortraitCacheError, PortraitRecord,
    };
    use crate::domain::book::{Analysis, Book, BookFormat, BookId, Entity, Title};
    use crate::application::ports::CurrentBook;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Mutex as StdMutex, RwLock};

    struct StubCurrent(RwLock<Option<Arc<CurrentBook>>>);

    impl CurrentBookPort for StubCurrent {
        fn set(&self, book: Arc<CurrentBook>) {
            *self.0.write().unwrap() = Some(book);
        }

        fn get(&self) -> Option<Arc<CurrentBook>> {
            self.0.read().unwrap().clone()
        }

        fn clear_if(&self, book_id: BookId) {
            let mut slot = self.0.write().unwrap();
            if slot.as_ref().map(|c| c.book.id()) == Some(book_id) {
                *slot = None;
            }
        }
    }

    struct MapCache(StdMutex<HashMap<String, PortraitRecord>>);

    #[async_trait]
    impl PortraitCachePort for MapCache {
        async fn get(
            &self,
            key: &PortraitKey,
        ) -> Result<Option<PortraitRecord>, PortraitCacheError> {
            Ok(self.0.lock().unwrap().get(&portrait_cache_key(key)).cloned())
        }

        async fn put(
            &self,
            key: &PortraitKey,
            rel_path: &str,
        ) -> Result<PortraitRecord, PortraitCacheError> {
            let mut map = self.0.lock().unwrap();
            let cache_key = portrait_cache_key(key);
            let version = map.get(&cache_key).map(|r| r.version + 1).unwrap_or(1);
            let record = PortraitRecord {
                rel_path: rel_path.to_string(),
                version,
                created_at: 0,
            };
            map.insert(cache_key, record.clone());
            Ok(record)
        }

        async fn remove_book_scope(&self, _book_id: BookId) -> Result<usize, PortraitCacheError> {
            Ok(0)
        }
    }

    struct NullAssets;

    #[async_trait]
    impl AssetStorePort for NullAssets {
        async fn write(&self, _rel_path: &str, _data: &[u8]) -> Result<(), AssetError> {
            Ok(())
        }

        async fn exists(&self, _rel_path: &str) -> bool {
            true
        }

        async fn read(&self, rel_path: &str) -> Result<Vec<u8>, AssetError> {
            Err(AssetError::NotFound(rel_path.to_string()))
        }

        async fn remove_book_scope(&self, _book_id: BookId) -> Result<(), AssetError> {
            Ok(())
        }

        fn public_url(&self, rel_path: &str) -> String {
            format!("/api/assets/{}", rel_path)
        }
    }

    /// 记录调用次数的图像引擎；可配置首次失败
    struct CountingEngine {
        calls: AtomicU64,
        fail_first: AtomicBool,
    }

    #[async_trait]
    impl ImageEnginePort for CountingEngine {
        async fn generate(&self, _request: ImageRequest) -> Result<Vec<u8>, ImageEngineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            // 模拟慢服务，放大并发窗口
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            if n == 0 && self.fail_first.load(Ordering::SeqCst) {
                return Err(ImageEngineError::Timeout);
            }
            Ok(vec![0xFF, 0xD8])
        }
    }

    fn make_handler(fail_first: bool) -> (Arc<PortraitHandler>, Arc<CountingEngine>) {
        let book = Book::new(
            Title::new("Test Book").unwrap(),
            "Author",
            "test.txt",
            BookFormat::Txt,
            std::path::PathBuf::from("x/book.txt"),
            10,
        );
        let analysis = Analysis::new(
            "summary".to_string(),
            vec![Entity::new("Ahab", "captain")],
            vec![],
            vec![],
            vec![],
            10,
        );
        let current = Arc::new(StubCurrent(RwLock::new(None)));
        current.set(Arc::new(CurrentBook::new(
            book,
            analysis,
            "text".to_string(),
        )));

        let engine = Arc::new(CountingEngine {
            calls: AtomicU64::new(0),
            fail_first: AtomicBool::new(fail_first),
        });

        let handler = Arc::new(PortraitHandler::new(
            current,
            Arc::new(MapCache(StdMutex::new(HashMap::new()))),
            engine.clone(),
            Arc::new(NullAssets),
            512,
        ));
        (handler, engine)
    }

    fn query() -> GetEntityPortrait {
        GetEntityPortrait {
            entity_name: "Ahab".to_string(),
            role: "captain".to_string(),
            style: "storybook".to_string(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_misses_collapse_to_single_generation() {
        let (handler, engine) = make_handler(false);

        let a = handler.clone();
        let b = handler.clone();
        let (ra, rb) = tokio::join!(a.get_or_create(query()), b.get_or_create(query()));

        assert!(ra.unwrap().is_some());
        assert!(rb.unwrap().is_some());
        // 并发未命中只触发一次底层生成
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_engine() {
        let (handler, engine) = make_handler(false);

        handler.get_or_create(query()).await.unwrap();
        handler.get_or_create(query()).await.unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_cached_as_absence_then_retried() {
        let (handler, engine) = make_handler(true);

        // 首次失败 → 无图，但不是毒缓存
        let first = handler.get_or_create(query()).await.unwrap();
        assert!(first.is_none());

        // 第二次重新尝试生成并成功
        let second = handler.get_or_create(query()).await.unwrap();
        assert!(second.is_some());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_regenerate_bumps_version() {
        let (handler, _engine) = make_handler(false);

        let first = handler.get_or_create(query()).await.unwrap().unwrap();
        assert_eq!(first.version, 1);

        let regen = handler
            .regenerate(RegeneratePortrait {
                entity_name: "Ahab".to_string(),
                role: "captain".to_string(),
                style: "storybook".to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(regen.version, 2);
    }

    #[tokio::test]
    async fn test_no_context_error_without_book() {
        let current = Arc::new(StubCurrent(RwLock::new(None)));
        let handler = PortraitHandler::new(
            current,
            Arc::new(MapCache(StdMutex::new(HashMap::new()))),
            Arc::new(CountingEngine {
                calls: AtomicU64::new(0),
                fail_first: AtomicBool::new(false),
            }),
            Arc::new(NullAssets),
            512,
        );

        let result = handler.get_or_create(query()).await;
        assert!(matches!(result, Err(ApplicationError::NoContext)));
    }
}
