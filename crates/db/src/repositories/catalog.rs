use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use intake_core::domain::field::{
    BranchingRule, CampaignId, FieldDefinition, FieldType, ValidationRules,
};
use intake_core::store::{FieldCatalog, StoreError};

use super::{backend_error, decode_error};
use crate::DbPool;

pub struct SqlFieldCatalog {
    pool: DbPool,
}

impl SqlFieldCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FieldCatalog for SqlFieldCatalog {
    async fn enabled_fields(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<FieldDefinition>, StoreError> {
        let rows = sqlx::query(
            "SELECT field_key, label, field_type, options, required, enabled,
                    sort_order, step_number, validation_rules, branching_logic
             FROM campaign_fields
             WHERE campaign_id = ? AND enabled = 1
             ORDER BY step_number, sort_order",
        )
        .bind(&campaign_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.into_iter().map(decode_field).collect()
    }
}

fn decode_field(row: SqliteRow) -> Result<FieldDefinition, StoreError> {
    let field_type: String =
        row.try_get("field_type").map_err(|error| decode_error("field_type", error))?;
    let field_type: FieldType =
        field_type.parse().map_err(|error| decode_error("field_type", error))?;

    let options: String =
        row.try_get("options").map_err(|error| decode_error("options", error))?;
    let options: Vec<String> =
        serde_json::from_str(&options).map_err(|error| decode_error("options", error))?;

    let validation_rules: String = row
        .try_get("validation_rules")
        .map_err(|error| decode_error("validation_rules", error))?;
    let validation_rules: ValidationRules = serde_json::from_str(&validation_rules)
        .map_err(|error| decode_error("validation_rules", error))?;

    let branching_logic: String = row
        .try_get("branching_logic")
        .map_err(|error| decode_error("branching_logic", error))?;
    let branching_logic: Vec<BranchingRule> = serde_json::from_str(&branching_logic)
        .map_err(|error| decode_error("branching_logic", error))?;

    Ok(FieldDefinition {
        field_key: row.try_get("field_key").map_err(|error| decode_error("field_key", error))?,
        label: row.try_get("label").map_err(|error| decode_error("label", error))?,
        field_type,
        options,
        required: row.try_get("required").map_err(|error| decode_error("required", error))?,
        enabled: row.try_get("enabled").map_err(|error| decode_error("enabled", error))?,
        sort_order: row
            .try_get("sort_order")
            .map_err(|error| decode_error("sort_order", error))?,
        step_number: row
            .try_get("step_number")
            .map_err(|error| decode_error("step_number", error))?,
        validation_rules,
        branching_logic,
    })
}
