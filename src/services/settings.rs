use crate::{
    db::DbPool,
    entities::inventory_settings,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

pub const DEFAULT_LOW_STOCK_THRESHOLD: Decimal = dec!(5);

/// Resolved inventory policy for one organization. A missing settings row
/// reads as these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub inventory_enabled: bool,
    pub low_stock_threshold: Decimal,
    pub auto_deduct_on_invoice: bool,
    pub require_stock_validation: bool,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self {
            inventory_enabled: true,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            auto_deduct_on_invoice: false,
            require_stock_validation: true,
        }
    }
}

impl From<&inventory_settings::Model> for EffectiveSettings {
    fn from(model: &inventory_settings::Model) -> Self {
        Self {
            inventory_enabled: model.inventory_enabled,
            low_stock_threshold: model.low_stock_threshold,
            auto_deduct_on_invoice: model.auto_deduct_on_invoice,
            require_stock_validation: model.require_stock_validation,
        }
    }
}

/// Partial update; unset fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub inventory_enabled: Option<bool>,
    pub low_stock_threshold: Option<Decimal>,
    pub auto_deduct_on_invoice: Option<bool>,
    pub require_stock_validation: Option<bool>,
}

struct CachedSettings {
    settings: EffectiveSettings,
    fetched_at: Instant,
}

/// Per-organization inventory policy with a short-TTL read cache. Settings
/// only gate advisory validation, so bounded staleness is acceptable.
pub struct InventorySettingsService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    cache: DashMap<Uuid, CachedSettings>,
    ttl: Duration,
}

impl InventorySettingsService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, ttl: Duration) -> Self {
        Self {
            db,
            event_sender,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Resolved settings for an organization, served from cache when fresh.
    pub async fn effective(&self, organization_id: Uuid) -> Result<EffectiveSettings, ServiceError> {
        if let Some(cached) = self.cache.get(&organization_id) {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.settings.clone());
            }
        }

        let settings = self.load(organization_id).await?;
        self.cache.insert(
            organization_id,
            CachedSettings {
                settings: settings.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(settings)
    }

    async fn load(&self, organization_id: Uuid) -> Result<EffectiveSettings, ServiceError> {
        let row = inventory_settings::Entity::find()
            .filter(inventory_settings::Column::OrganizationId.eq(organization_id))
            .one(self.db.as_ref())
            .await?;
        Ok(row
            .as_ref()
            .map(EffectiveSettings::from)
            .unwrap_or_default())
    }

    /// Last-write-wins upsert. Only field-level range checks apply.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        patch: SettingsPatch,
    ) -> Result<EffectiveSettings, ServiceError> {
        if let Some(threshold) = patch.low_stock_threshold {
            if threshold < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "low_stock_threshold cannot be negative: {}",
                    threshold
                )));
            }
        }

        let now = Utc::now();
        let existing = inventory_settings::Entity::find()
            .filter(inventory_settings::Column::OrganizationId.eq(organization_id))
            .one(self.db.as_ref())
            .await?;

        let updated = match existing {
            Some(row) => {
                let mut active: inventory_settings::ActiveModel = row.into();
                if let Some(enabled) = patch.inventory_enabled {
                    active.inventory_enabled = Set(enabled);
                }
                if let Some(threshold) = patch.low_stock_threshold {
                    active.low_stock_threshold = Set(threshold);
                }
                if let Some(auto_deduct) = patch.auto_deduct_on_invoice {
                    active.auto_deduct_on_invoice = Set(auto_deduct);
                }
                if let Some(require) = patch.require_stock_validation {
                    active.require_stock_validation = Set(require);
                }
                active.updated_at = Set(now);
                active.update(self.db.as_ref()).await?
            }
            None => {
                let defaults = EffectiveSettings::default();
                inventory_settings::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    organization_id: Set(organization_id),
                    inventory_enabled: Set(patch
                        .inventory_enabled
                        .unwrap_or(defaults.inventory_enabled)),
                    low_stock_threshold: Set(patch
                        .low_stock_threshold
                        .unwrap_or(defaults.low_stock_threshold)),
                    auto_deduct_on_invoice: Set(patch
                        .auto_deduct_on_invoice
                        .unwrap_or(defaults.auto_deduct_on_invoice)),
                    require_stock_validation: Set(patch
                        .require_stock_validation
                        .unwrap_or(defaults.require_stock_validation)),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(self.db.as_ref())
                .await?
            }
        };

        self.cache.remove(&organization_id);
        info!(organization_id = %organization_id, "Inventory settings updated");

        self.event_sender
            .send(Event::InventorySettingsUpdated { organization_id })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(EffectiveSettings::from(&updated))
    }

    /// Drops a cached entry; the next read hits storage.
    pub fn invalidate(&self, organization_id: Uuid) {
        self.cache.remove(&organization_id);
    }
}
