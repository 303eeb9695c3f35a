use serde::{Deserialize, Serialize};

/// 监控聚合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 节点在线判定窗口（秒）
    pub freshness_window_seconds: u64,
    /// 完成速率统计窗口（秒）
    pub rate_window_seconds: u64,
    /// 吞吐量桶宽度（分钟），必须整除60
    pub throughput_bucket_minutes: u32,
    /// 吞吐量回看时长（小时）
    pub throughput_lookback_hours: u32,
    /// CPU趋势回看时长（分钟）
    pub cpu_trend_window_minutes: u32,
    /// 按天统计保留的天数
    pub daily_lookback_days: u32,
    /// 按小时统计回看时长（小时）
    pub hourly_lookback_hours: u32,
    /// 分钟级统计回看时长（分钟）
    pub minute_lookback_minutes: u32,
    /// 分钟级统计桶宽度（秒）
    pub minute_bucket_seconds: u32,
    /// 单次快照计算的截止时间（秒）
    pub poll_deadline_seconds: u64,
    /// 同时执行的分区查询上限
    pub max_in_flight_queries: usize,
    /// 看板页面轮询间隔（秒）
    pub client_poll_interval_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            freshness_window_seconds: 300,
            rate_window_seconds: 300,
            throughput_bucket_minutes: 30,
            throughput_lookback_hours: 24,
            cpu_trend_window_minutes: 60,
            daily_lookback_days: 7,
            hourly_lookback_hours: 24,
            minute_lookback_minutes: 60,
            minute_bucket_seconds: 300,
            poll_deadline_seconds: 8,
            max_in_flight_queries: 8,
            client_poll_interval_seconds: 10,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let windows = [
            ("freshness_window_seconds", self.freshness_window_seconds),
            ("rate_window_seconds", self.rate_window_seconds),
            ("throughput_bucket_minutes", self.throughput_bucket_minutes as u64),
            ("throughput_lookback_hours", self.throughput_lookback_hours as u64),
            ("cpu_trend_window_minutes", self.cpu_trend_window_minutes as u64),
            ("daily_lookback_days", self.daily_lookback_days as u64),
            ("hourly_lookback_hours", self.hourly_lookback_hours as u64),
            ("minute_lookback_minutes", self.minute_lookback_minutes as u64),
            ("minute_bucket_seconds", self.minute_bucket_seconds as u64),
            ("poll_deadline_seconds", self.poll_deadline_seconds),
            ("client_poll_interval_seconds", self.client_poll_interval_seconds),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(anyhow::anyhow!("{} 必须大于0", name));
            }
        }

        if 60 % self.throughput_bucket_minutes != 0 {
            return Err(anyhow::anyhow!(
                "吞吐量桶宽度必须整除60分钟: {}",
                self.throughput_bucket_minutes
            ));
        }

        if self.max_in_flight_queries == 0 {
            return Err(anyhow::anyhow!("并发查询上限必须大于0"));
        }

        Ok(())
    }
}
