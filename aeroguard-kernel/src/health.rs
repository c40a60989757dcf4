use aeroguard_sim::Catalog;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub facilities: u32,
    pub rooms_tracked: u32,
    pub memory_usage_mb: f32,
    pub recommendations_requested: u32,
    pub recommendations_failed: u32,
    pub last_recommendation_error: Option<String>,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    recommendations: Arc<AtomicU32>,
    recommendation_failures: Arc<AtomicU32>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            recommendations: Arc::new(AtomicU32::new(0)),
            recommendation_failures: Arc::new(AtomicU32::new(0)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn record_recommendation(&self) {
        self.recommendations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recommendation_failure(&self, error: &str) {
        self.recommendation_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock() = Some(error.to_string());
    }

    pub fn get_health(&self, catalog: &Catalog) -> KernelHealth {
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            facilities: catalog.facilities().len() as u32,
            rooms_tracked: catalog.room_count() as u32,
            memory_usage_mb: get_memory_usage_mb(),
            recommendations_requested: self.recommendations.load(Ordering::Relaxed),
            recommendations_failed: self.recommendation_failures.load(Ordering::Relaxed),
            last_recommendation_error: self.last_error.lock().clone(),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmRSS:") {
                    if let Some(kb) = rest.split_whitespace().next().and_then(|s| s.parse::<u64>().ok()) {
                        return (kb as f32) / 1024.0; // KB -> MB
                    }
                }
            }
        }
    }

    // Fallback approximatif
    12.0
}
