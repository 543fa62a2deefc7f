//! In-memory caching using moka
//!
//! Caches the resolved per-tenant pricing configuration snapshots. A snapshot
//! is assembled from a dozen table reads, so one calculation per tenant per
//! TTL window pays the database cost and the rest hit memory. Snapshots are
//! immutable once built; the admin side invalidates after editing tables.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::pricing::models::{PricingConfig, Tenant};

/// Application cache holding resolved pricing configuration per tenant
#[derive(Clone)]
pub struct AppCache {
    /// Resolved config snapshots (tenant id -> PricingConfig)
    pub configs: Cache<Uuid, Arc<PricingConfig>>,
    /// Tenant directory rows (tenant id -> Tenant)
    pub tenants: Cache<Uuid, Arc<Tenant>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Config snapshots: 200 tenants, 2 min TTL. Short on purpose:
            // an admin edit must show up in quotes without a manual flush.
            configs: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(2 * 60))
                .build(),

            // Tenant names change rarely
            tenants: Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(15 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            configs_size: self.configs.entry_count(),
            tenants_size: self.tenants.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.configs.invalidate_all();
        self.tenants.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate one tenant's config snapshot
    pub async fn invalidate_tenant(&self, tenant_id: Uuid) {
        self.configs.invalidate(&tenant_id).await;
        self.tenants.invalidate(&tenant_id).await;
        info!("Cache invalidated for tenant: {}", tenant_id);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub configs_size: u64,
    pub tenants_size: u64,
}
