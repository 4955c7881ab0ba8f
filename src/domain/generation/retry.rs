//! 几何退避重试调度
//!
//! 慢速外部服务的统一轮询/重试节奏: 初始间隔按固定倍率增长，
//! 封顶于最大间隔，尝试次数有界。

use std::time::Duration;

/// 重试调度策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 总尝试次数上限（含首次）
    pub max_attempts: u32,
    /// 首次重试前的等待
    pub base_delay: Duration,
    /// 每次重试的间隔倍率（>= 1.0）
    pub growth_factor: f64,
    /// 间隔上限
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            growth_factor: 2.0,
            max_delay: Duration::from_secs(32),
        }
    }
}

impl RetryPolicy {
    /// 第 attempt 次重试前的等待时长（attempt 从 1 开始）
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let factor = self.growth_factor.max(1.0);
        let millis = self.base_delay.as_millis() as f64 * factor.powi(attempt.saturating_sub(1) as i32);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// 全部重试间隔（长度 = max_attempts - 1）
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|a| self.delay_before(a)).collect()
    }

    /// 是否还允许第 attempt 次尝试（attempt 从 1 开始）
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_non_decreasing() {
        let policy = RetryPolicy::default();
        let schedule = policy.schedule();
        for pair in schedule.windows(2) {
            assert!(pair[0] <= pair[1], "interval sequence must be non-decreasing");
        }
    }

    #[test]
    fn test_schedule_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(2),
            growth_factor: 2.0,
            max_delay: Duration::from_secs(32),
        };
        for delay in policy.schedule() {
            assert!(delay <= policy.max_delay);
        }
        // 足够多次之后应到达上限
        assert_eq!(policy.delay_before(9), policy.max_delay);
    }

    #[test]
    fn test_attempt_count_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.schedule().len(), (policy.max_attempts - 1) as usize);
        assert!(policy.allows(1));
        assert!(policy.allows(policy.max_attempts));
        assert!(!policy.allows(policy.max_attempts + 1));
    }

    #[test]
    fn test_growth_factor_below_one_is_clamped() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            growth_factor: 0.5,
            max_delay: Duration::from_secs(8),
        };
        let schedule = policy.schedule();
        for pair in schedule.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}
