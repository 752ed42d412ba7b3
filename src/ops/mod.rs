//! Health checks and metrics for the SICOSS HTTP facade.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════
// HEALTH CHECKS
// ═══════════════════════════════════════════════════════════════════════════

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Component health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// Overall system health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub version: String,
    pub components: Vec<ComponentHealth>,
    pub uptime_seconds: u64,
}

impl SystemHealth {
    pub fn new(version: &str, uptime: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: version.to_string(),
            components: vec![],
            uptime_seconds: uptime,
        }
    }
    
    pub fn add_component(&mut self, component: ComponentHealth) {
        // Update overall status based on component health
        match component.status {
            HealthStatus::Unhealthy => self.status = HealthStatus::Unhealthy,
            HealthStatus::Degraded if self.status == HealthStatus::Healthy => {
                self.status = HealthStatus::Degraded;
            }
            _ => {}
        }
        self.components.push(component);
    }
    
    pub fn is_ready(&self) -> bool {
        self.status != HealthStatus::Unhealthy
    }
    
    pub fn is_live(&self) -> bool {
        // Basic liveness - can respond
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// METRICS
// ═══════════════════════════════════════════════════════════════════════════

/// Metrics registry
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: HashMap<String, u64>,
    gauges: HashMap<String, f64>,
    histograms: HashMap<String, Vec<f64>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn increment(&mut self, name: &str, value: u64) {
        *self.counters.entry(name.to_string()).or_insert(0) += value;
    }
    
    pub fn set_gauge(&mut self, name: &str, value: f64) {
        self.gauges.insert(name.to_string(), value);
    }
    
    pub fn record_histogram(&mut self, name: &str, value: f64) {
        self.histograms
            .entry(name.to_string())
            .or_insert_with(Vec::new)
            .push(value);
    }
    
    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();
        
        for (name, value) in &self.counters {
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }
        
        for (name, value) in &self.gauges {
            output.push_str(&format!("# TYPE {} gauge\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }
        
        for (name, values) in &self.histograms {
            if !values.is_empty() {
                output.push_str(&format!("# TYPE {} histogram\n", name));
                let sum: f64 = values.iter().sum();
                let count = values.len();
                output.push_str(&format!("{}_count {}\n", name, count));
                output.push_str(&format!("{}_sum {}\n", name, sum));
            }
        }
        
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_system_health() {
        let mut health = SystemHealth::new("1.0.0", 3600);
        
        health.add_component(ComponentHealth {
            name: "database".to_string(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: Some(5),
        });
        
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.is_ready());
        assert!(health.is_live());
    }
    
    #[test]
    fn test_health_degradation() {
        let mut health = SystemHealth::new("1.0.0", 3600);
        
        health.add_component(ComponentHealth {
            name: "cache".to_string(),
            status: HealthStatus::Degraded,
            message: Some("High latency".to_string()),
            latency_ms: Some(500),
        });
        
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(health.is_ready()); // Degraded is still ready
    }
    
    #[test]
    fn test_metrics_registry() {
        let mut registry = MetricsRegistry::new();
        
        registry.increment("http_requests_total", 1);
        registry.increment("http_requests_total", 5);
        registry.set_gauge("active_connections", 42.0);
        registry.record_histogram("request_duration_seconds", 0.15);
        registry.record_histogram("request_duration_seconds", 0.25);
        
        let output = registry.export_prometheus();
        assert!(output.contains("http_requests_total 6"));
        assert!(output.contains("active_connections 42"));
    }
}
