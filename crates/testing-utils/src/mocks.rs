//! In-memory implementations of the store traits
//!
//! The mocks reproduce the SQL semantics of the real stores (status grouping,
//! `>= since` windows, floor-division buckets, whole-minute durations) so
//! aggregation tests can run without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_core::models::{
    BucketCount, DurationSummary, HeartbeatRecord, HeartbeatSummary, PartitionId, StatusCount,
    Task,
};
use monitor_core::traits::{HealthProbe, HeartbeatStore, PartitionStore, TaskDirectory};
use monitor_core::{MonitorError, MonitorResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::builders::WorkItem;

/// Mock implementation of TaskDirectory for testing
#[derive(Debug, Clone, Default)]
pub struct MockTaskDirectory {
    tasks: Arc<Mutex<Vec<Task>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockTaskDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let directory = Self::new();
        for task in tasks {
            directory.add_task(task);
        }
        directory
    }

    pub fn add_task(&self, task: Task) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(task);
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskDirectory for MockTaskDirectory {
    async fn list_tasks(&self) -> MonitorResult<Vec<Task>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MonitorError::TaskDirectoryUnavailable(
                "mock directory offline".to_string(),
            ));
        }
        Ok(self.tasks.lock().unwrap().clone())
    }
}

/// Mock implementation of PartitionStore for testing
#[derive(Debug, Clone, Default)]
pub struct MockPartitionStore {
    partitions: Arc<Mutex<HashMap<String, Vec<WorkItem>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    vanishing: Arc<Mutex<HashMap<String, usize>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    histogram_calls: Arc<AtomicUsize>,
}

struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_partition(&self, task_id: &str, items: Vec<WorkItem>) {
        self.partitions
            .lock()
            .unwrap()
            .insert(task_id.to_string(), items);
    }

    pub fn add_items(&self, task_id: &str, items: Vec<WorkItem>) {
        self.partitions
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .extend(items);
    }

    pub fn drop_partition(&self, task_id: &str) {
        self.partitions.lock().unwrap().remove(task_id);
    }

    /// 该分区在成功响应 `queries` 次查询后被删除
    pub fn vanish_after(&self, task_id: &str, queries: usize) {
        self.vanishing
            .lock()
            .unwrap()
            .insert(task_id.to_string(), queries);
    }

    /// 该分区的所有查询返回数据库错误
    pub fn fail_partition(&self, task_id: &str) {
        self.failing.lock().unwrap().insert(task_id.to_string());
    }

    /// 每次查询前等待，用于超时和并发测试
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// 观察到的最大并发查询数
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn histogram_call_count(&self) -> usize {
        self.histogram_calls.load(Ordering::SeqCst)
    }

    async fn items(&self, partition: &PartitionId) -> MonitorResult<Vec<WorkItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard {
            counter: &self.in_flight,
        };

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(partition.task_id()) {
            return Err(MonitorError::database_error(format!(
                "mock failure on {}",
                partition.table_name()
            )));
        }

        let vanished = match self.vanishing.lock().unwrap().get_mut(partition.task_id()) {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if vanished {
            self.drop_partition(partition.task_id());
        }

        self.partitions
            .lock()
            .unwrap()
            .get(partition.task_id())
            .cloned()
            .ok_or_else(|| MonitorError::partition_not_found(partition.task_id()))
    }
}

fn completed_since(items: &[WorkItem], since: DateTime<Utc>) -> impl Iterator<Item = &WorkItem> {
    items.iter().filter(move |item| {
        item.status.as_deref() == Some("completed") && item.last_updated >= since
    })
}

#[async_trait]
impl PartitionStore for MockPartitionStore {
    async fn status_histogram(&self, partition: &PartitionId) -> MonitorResult<Vec<StatusCount>> {
        self.histogram_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items(partition).await?;
        let mut counts: BTreeMap<Option<String>, i64> = BTreeMap::new();
        for item in items {
            *counts.entry(item.status).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn completed_since(
        &self,
        partition: &PartitionId,
        since: DateTime<Utc>,
    ) -> MonitorResult<i64> {
        let items = self.items(partition).await?;
        Ok(completed_since(&items, since).count() as i64)
    }

    async fn completion_buckets(
        &self,
        partition: &PartitionId,
        since: DateTime<Utc>,
        width_seconds: i64,
    ) -> MonitorResult<Vec<BucketCount>> {
        let items = self.items(partition).await?;
        let mut buckets: BTreeMap<i64, i64> = BTreeMap::new();
        for item in completed_since(&items, since) {
            *buckets
                .entry(item.last_updated.timestamp().div_euclid(width_seconds))
                .or_default() += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(bucket, count)| BucketCount { bucket, count })
            .collect())
    }

    async fn duration_summary(&self, partition: &PartitionId) -> MonitorResult<DurationSummary> {
        let items = self.items(partition).await?;
        let minutes: Vec<i64> = items
            .iter()
            .filter(|item| item.status.as_deref() == Some("completed"))
            .filter_map(|item| {
                item.created_at
                    .map(|created| (item.last_updated.timestamp() - created.timestamp()) / 60)
            })
            .filter(|m| *m > 0)
            .collect();
        Ok(DurationSummary {
            total_minutes: minutes.iter().sum(),
            samples: minutes.len() as i64,
        })
    }
}

/// Mock implementation of HeartbeatStore for testing
#[derive(Debug, Clone, Default)]
pub struct MockHeartbeatStore {
    records: Arc<Mutex<Vec<HeartbeatRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockHeartbeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HeartbeatRecord>) -> Self {
        let store = Self::new();
        store.records.lock().unwrap().extend(records);
        store
    }

    pub fn push(&self, record: HeartbeatRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> MonitorResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MonitorError::HeartbeatUnavailable(
                "mock heartbeat stream offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl HeartbeatStore for MockHeartbeatStore {
    async fn node_summary(&self, online_since: DateTime<Utc>) -> MonitorResult<HeartbeatSummary> {
        self.check()?;
        let records = self.records.lock().unwrap();
        let total: HashSet<&str> = records.iter().map(|r| r.client_addr.as_str()).collect();
        let fresh: Vec<&HeartbeatRecord> = records
            .iter()
            .filter(|r| r.last_heartbeat >= online_since)
            .collect();
        let online: HashSet<&str> = fresh.iter().map(|r| r.client_addr.as_str()).collect();
        let avg_cpu_usage = if fresh.is_empty() {
            None
        } else {
            Some(fresh.iter().map(|r| r.cpu_usage).sum::<f64>() / fresh.len() as f64)
        };
        Ok(HeartbeatSummary {
            total_nodes: total.len() as i64,
            online_nodes: online.len() as i64,
            avg_cpu_usage,
        })
    }

    async fn heartbeats_since(&self, since: DateTime<Utc>) -> MonitorResult<Vec<HeartbeatRecord>> {
        self.check()?;
        let mut records: Vec<HeartbeatRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.last_heartbeat >= since)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.last_heartbeat);
        Ok(records)
    }
}

/// Mock implementation of HealthProbe for testing
#[derive(Debug, Clone, Default)]
pub struct MockHealthProbe {
    unhealthy: Arc<AtomicBool>,
}

impl MockHealthProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthProbe for MockHealthProbe {
    async fn health_check(&self) -> MonitorResult<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(MonitorError::database_error("mock database offline"));
        }
        Ok(())
    }
}
