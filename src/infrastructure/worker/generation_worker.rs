//! Generation Worker - Background Artifact Processor
//!
//! 从队列消费工件工作单并调用慢速外部服务。并发受 Semaphore 约束
//! （尊重服务商限流），图像类工作单按几何退避调度重试。
//! 两处超越检查：调用服务商之前、资产落盘之前。被超越的工作单
//! 直接丢弃，新 Job 的状态不受旧结果污染。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::{
    ArtifactOrder, AssetStorePort, ImageEnginePort, ImageRequest, JobTrackerPort,
    SpeechEnginePort, SpeechRequest,
};
use crate::domain::generation::{ArtifactSpec, RetryPolicy};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 最大并发生成数
    pub max_concurrent: usize,
    /// 图像生成的退避调度
    pub image_retry: RetryPolicy,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            image_retry: RetryPolicy::default(),
        }
    }
}

/// 生成 Worker
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<ArtifactOrder>,
    job_tracker: Arc<dyn JobTrackerPort>,
    speech_engine: Arc<dyn SpeechEnginePort>,
    image_engine: Arc<dyn ImageEnginePort>,
    asset_store: Arc<dyn AssetStorePort>,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<ArtifactOrder>,
        job_tracker: Arc<dyn JobTrackerPort>,
        speech_engine: Arc<dyn SpeechEnginePort>,
        image_engine: Arc<dyn ImageEnginePort>,
        asset_store: Arc<dyn AssetStorePort>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            job_tracker,
            speech_engine,
            image_engine,
            asset_store,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "GenerationWorker started"
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(order) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!("Semaphore closed, worker exiting");
                    break;
                }
            };

            let job_tracker = self.job_tracker.clone();
            let speech_engine = self.speech_engine.clone();
            let image_engine = self.image_engine.clone();
            let asset_store = self.asset_store.clone();
            let retry = self.config.image_retry.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到工作单完成

                Self::process_order(
                    order,
                    job_tracker,
                    speech_engine,
                    image_engine,
                    asset_store,
                    retry,
                )
                .await;
            });
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单张工作单
    async fn process_order(
        order: ArtifactOrder,
        job_tracker: Arc<dyn JobTrackerPort>,
        speech_engine: Arc<dyn SpeechEnginePort>,
        image_engine: Arc<dyn ImageEnginePort>,
        asset_store: Arc<dyn AssetStorePort>,
        retry: RetryPolicy,
    ) {
        // Check 1: 调用服务商之前
        if job_tracker.is_superseded(order.job_id) {
            tracing::debug!(
                job_id = %order.job_id,
                index = order.index,
                "Order superseded, skipping"
            );
            return;
        }

        let bytes = match &order.spec {
            ArtifactSpec::Narration { text, voice }
            | ArtifactSpec::PodcastSegment { text, voice, .. } => {
                job_tracker.record_attempt(order.job_id, order.index);
                match speech_engine
                    .synthesize(SpeechRequest {
                        text: text.clone(),
                        voice: voice.clone(),
                    })
                    .await
                {
                    Ok(response) => response.audio_data,
                    Err(e) => {
                        // 单工件失败：播客照常推进后续片段（降级完成）
                        tracing::error!(
                            job_id = %order.job_id,
                            index = order.index,
                            error = %e,
                            "Speech synthesis failed"
                        );
                        job_tracker.artifact_failed(
                            order.job_id,
                            order.index,
                            format!("speech synthesis failed: {}", e),
                        );
                        return;
                    }
                }
            }
            ArtifactSpec::Image {
                prompt,
                style,
                seed,
                width,
                height,
            } => {
                match Self::generate_image_with_retry(
                    &order,
                    &job_tracker,
                    &image_engine,
                    &retry,
                    ImageRequest {
                        prompt: prompt.clone(),
                        style: style.clone(),
                        seed: *seed,
                        width: *width,
                        height: *height,
                    },
                )
                .await
                {
                    Some(bytes) => bytes,
                    None => return,
                }
            }
        };

        // Check 2: 落盘之前再查一次，迟到结果丢弃，不写新 Job 的位置
        if job_tracker.is_superseded(order.job_id) {
            tracing::debug!(
                job_id = %order.job_id,
                index = order.index,
                "Order superseded after generation, dropping result"
            );
            return;
        }

        if let Err(e) = asset_store.write(&order.rel_path, &bytes).await {
            tracing::error!(
                job_id = %order.job_id,
                index = order.index,
                error = %e,
                "Failed to store artifact"
            );
            job_tracker.artifact_failed(
                order.job_id,
                order.index,
                format!("asset write failed: {}", e),
            );
            return;
        }

        job_tracker.artifact_ready(order.job_id, order.index);

        tracing::info!(
            job_id = %order.job_id,
            index = order.index,
            rel_path = %order.rel_path,
            size = bytes.len(),
            "Artifact completed"
        );
    }

    /// 按退避调度生成图像
    ///
    /// 间隔非递减、封顶、次数有界；耗尽后仅该工件判失败。
    async fn generate_image_with_retry(
        order: &ArtifactOrder,
        job_tracker: &Arc<dyn JobTrackerPort>,
        image_engine: &Arc<dyn ImageEnginePort>,
        retry: &RetryPolicy,
        request: ImageRequest,
    ) -> Option<Vec<u8>> {
        let mut attempt = 1u32;

        loop {
            if job_tracker.is_superseded(order.job_id) {
                return None;
            }

            job_tracker.record_attempt(order.job_id, order.index);

            match image_engine.generate(request.clone()).await {
                Ok(bytes) => return Some(bytes),
                Err(e) if e.is_retryable() && retry.allows(attempt + 1) => {
                    let delay = retry.delay_before(attempt);
                    tracing::warn!(
                        job_id = %order.job_id,
                        index = order.index,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Image generation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        job_id = %order.job_id,
                        index = order.index,
                        attempt = attempt,
                        error = %e,
                        "Image generation exhausted"
                    );
                    job_tracker.artifact_failed(
                        order.job_id,
                        order.index,
                        format!("image generation failed after {} attempts: {}", attempt, e),
                    );
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AssetError, ImageEngineError, SpeechEngineError, SpeechResponse,
    };
    use crate::domain::book::BookId;
    use crate::domain::generation::{
        ArtifactSlot, ArtifactState, GenerationJob, JobKind, VoiceSettings,
    };
    use crate::infrastructure::memory::InMemoryJobTracker;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// 按片段索引注入时延的合成器（从文本解析延迟毫秒数）
    struct DelayedSpeech;

    #[async_trait]
    impl SpeechEnginePort for DelayedSpeech {
        async fn synthesize(
            &self,
            request: SpeechRequest,
        ) -> Result<SpeechResponse, SpeechEngineError> {
            let delay: u64 = request.text.trim().parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(SpeechResponse {
                audio_data: vec![1, 2, 3],
                duration_ms: Some(delay),
            })
        }
    }

    /// 前 fail_times 次返回限流错误的图像引擎
    struct FlakyImage {
        calls: AtomicU64,
        fail_times: u64,
    }

    #[async_trait]
    impl ImageEnginePort for FlakyImage {
        async fn generate(&self, _request: ImageRequest) -> Result<Vec<u8>, ImageEngineError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(ImageEngineError::RateLimited)
            } else {
                Ok(vec![0xFF])
            }
        }
    }

    /// 记录写入路径的内存资产库
    struct MemAssets {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemAssets {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                files: Mutex::new(HashMap::new()),
            })
        }

        fn paths(&self) -> Vec<String> {
            self.files.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl AssetStorePort for MemAssets {
        async fn write(&self, rel_path: &str, data: &[u8]) -> Result<(), AssetError> {
            self.files
                .lock()
                .unwrap()
                .insert(rel_path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, rel_path: &str) -> bool {
            self.files.lock().unwrap().contains_key(rel_path)
        }

        async fn read(&self, rel_path: &str) -> Result<Vec<u8>, AssetError> {
            self.files
                .lock()
                .unwrap()
                .get(rel_path)
                .cloned()
                .ok_or_else(|| AssetError::NotFound(rel_path.to_string()))
        }

        async fn remove_book_scope(&self, _book_id: BookId) -> Result<(), AssetError> {
            Ok(())
        }

        fn public_url(&self, rel_path: &str) -> String {
            format!("/api/assets/{}", rel_path)
        }
    }

    fn podcast_job(book_id: BookId, scope: &str, delays: &[u64]) -> GenerationJob {
        let slots = delays
            .iter()
            .enumerate()
            .map(|(i, delay)| {
                ArtifactSlot::new(
                    i,
                    format!("{}/podcast/{}/seg_{:03}.mp3", book_id, scope, i),
                    ArtifactSpec::PodcastSegment {
                        speaker: "Jax".to_string(),
                        text: delay.to_string(),
                        voice: VoiceSettings::default(),
                    },
                )
            })
            .collect();
        GenerationJob::new(book_id, JobKind::Podcast, slots)
    }

    fn spawn_worker(
        rx: mpsc::Receiver<ArtifactOrder>,
        tracker: Arc<InMemoryJobTracker>,
        image: Arc<dyn ImageEnginePort>,
        assets: Arc<MemAssets>,
        retry: RetryPolicy,
    ) {
        let worker = GenerationWorker::new(
            GenerationWorkerConfig {
                max_concurrent: 4,
                image_retry: retry,
            },
            rx,
            tracker,
            Arc::new(DelayedSpeech),
            image,
            assets,
        );
        tokio::spawn(worker.run());
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(5),
            growth_factor: 2.0,
            max_delay: Duration::from_millis(20),
        }
    }

    async fn wait_until<F: Fn() -> bool>(cond: F, timeout_ms: u64) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        while tokio::time::Instant::now() < deadline {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cond()
    }

    #[tokio::test]
    async fn test_podcast_out_of_order_completion_respects_script_order() {
        let (tx, rx) = mpsc::channel(64);
        let tracker = InMemoryJobTracker::new(tx).arc();
        let assets = MemAssets::new();
        spawn_worker(
            rx,
            tracker.clone(),
            Arc::new(FlakyImage {
                calls: AtomicU64::new(0),
                fail_times: 0,
            }),
            assets,
            fast_retry(3),
        );

        let book_id = BookId::new();
        // 片段 0 最慢：后面的片段先合成完
        let job = tracker
            .submit(podcast_job(book_id, "a", &[150, 10, 10]))
            .unwrap();

        // 等到后面的片段就绪，而片段 0 仍在途
        let t = tracker.clone();
        let id = job.id;
        assert!(
            wait_until(
                move || {
                    let job = t.get(id).unwrap();
                    job.artifacts()[1].state == ArtifactState::Ready
                        && job.artifacts()[2].state == ArtifactState::Ready
                },
                2_000,
            )
            .await
        );

        // 乱序完成被缓冲：前缀仍为 0
        let snapshot = tracker.get(job.id).unwrap();
        if snapshot.artifacts()[0].state == ArtifactState::Pending {
            assert_eq!(snapshot.playable_prefix(), 0);
        }

        // 片段 0 就绪后一次放行到末尾
        let t = tracker.clone();
        assert!(
            wait_until(
                move || t.get(id).unwrap().playable_prefix() == 3,
                2_000,
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_superseded_orders_never_touch_new_job_paths() {
        let (tx, rx) = mpsc::channel(64);
        let tracker = InMemoryJobTracker::new(tx).arc();
        let assets = MemAssets::new();

        let book_id = BookId::new();
        // 先提交两个 Job（worker 未启动），第二个立即超越第一个
        let first = tracker.submit(podcast_job(book_id, "old", &[0, 0])).unwrap();
        let second = tracker.submit(podcast_job(book_id, "new", &[0, 0])).unwrap();

        spawn_worker(
            rx,
            tracker.clone(),
            Arc::new(FlakyImage {
                calls: AtomicU64::new(0),
                fail_times: 0,
            }),
            assets.clone(),
            fast_retry(3),
        );

        let t = tracker.clone();
        let id = second.id;
        assert!(wait_until(move || t.get(id).unwrap().playable_prefix() == 2, 2_000).await);

        // 被超越的工作单全部跳过：旧 Job 槽位原样、旧路径无落盘
        let first_now = tracker.get(first.id).unwrap();
        assert!(first_now
            .artifacts()
            .iter()
            .all(|a| a.state == ArtifactState::Pending));
        assert!(assets.paths().iter().all(|p| !p.contains("/old/")));
    }

    #[tokio::test]
    async fn test_image_retry_then_success() {
        let (tx, rx) = mpsc::channel(64);
        let tracker = InMemoryJobTracker::new(tx).arc();
        let assets = MemAssets::new();
        let engine = Arc::new(FlakyImage {
            calls: AtomicU64::new(0),
            fail_times: 2,
        });
        spawn_worker(rx, tracker.clone(), engine.clone(), assets, fast_retry(5));

        let book_id = BookId::new();
        let slot = ArtifactSlot::new(
            0,
            format!("{}/visuals/a/image_00_cover.jpg", book_id),
            ArtifactSpec::Image {
                prompt: "cover".to_string(),
                style: "storybook".to_string(),
                seed: 42,
                width: 1280,
                height: 720,
            },
        );
        let job = tracker
            .submit(GenerationJob::new(book_id, JobKind::Images, vec![slot]))
            .unwrap();

        let t = tracker.clone();
        let id = job.id;
        assert!(
            wait_until(
                move || t.get(id).unwrap().artifacts()[0].state == ArtifactState::Ready,
                2_000,
            )
            .await
        );

        // 前两次限流 + 第三次成功
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.get(job.id).unwrap().artifacts()[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_image_retry_exhaustion_fails_single_artifact() {
        let (tx, rx) = mpsc::channel(64);
        let tracker = InMemoryJobTracker::new(tx).arc();
        let assets = MemAssets::new();
        let engine = Arc::new(FlakyImage {
            calls: AtomicU64::new(0),
            fail_times: u64::MAX,
        });
        spawn_worker(rx, tracker.clone(), engine, assets, fast_retry(3));

        let book_id = BookId::new();
        let slots = vec![
            ArtifactSlot::new(
                0,
                format!("{}/visuals/a/image_00_cover.jpg", book_id),
                ArtifactSpec::Image {
                    prompt: "cover".to_string(),
                    style: "storybook".to_string(),
                    seed: 42,
                    width: 1280,
                    height: 720,
                },
            ),
            ArtifactSlot::new(
                1,
                format!("{}/podcast/a/seg_001.mp3", book_id),
                ArtifactSpec::PodcastSegment {
                    speaker: "Jax".to_string(),
                    text: "0".to_string(),
                    voice: VoiceSettings::default(),
                },
            ),
        ];
        let job = tracker
            .submit(GenerationJob::new(book_id, JobKind::Images, slots))
            .unwrap();

        let t = tracker.clone();
        let id = job.id;
        assert!(
            wait_until(
                move || {
                    let job = t.get(id).unwrap();
                    job.artifacts()[0].state == ArtifactState::Failed
                        && job.artifacts()[1].state == ArtifactState::Ready
                },
                3_000,
            )
            .await
        );

        // 尝试次数有界；失败只作用于单个工件
        let snapshot = tracker.get(job.id).unwrap();
        assert_eq!(snapshot.artifacts()[0].attempts, 3);
        assert!(snapshot.artifacts()[0].error.is_some());
    }
}
