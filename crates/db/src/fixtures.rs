use sqlx::Row;

use intake_core::domain::field::{
    BranchAction, BranchCondition, BranchingRule, ConditionOperator, FieldDefinition, FieldType,
    ValidationRules,
};

use crate::connection::DbPool;

/// Deterministic demo campaign: three steps, a select with options, length
/// rules, and one branching rule that skips the employment step for
/// students. Used by `intake seed` and the integration tests.
pub struct DemoCampaign;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub campaign_id: &'static str,
    pub fields_seeded: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub passed: bool,
    pub expected_fields: usize,
    pub found_fields: usize,
}

impl DemoCampaign {
    pub const CAMPAIGN_ID: &'static str = "demo-onboarding";

    pub fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("full_name", "Full Name", FieldType::Text)
                .step(1)
                .sort(0)
                .rules(ValidationRules {
                    min_length: Some(2),
                    max_length: Some(80),
                    ..ValidationRules::default()
                }),
            FieldDefinition::new("email", "Email Address", FieldType::Email).step(1).sort(1),
            FieldDefinition::new("role", "Current Role", FieldType::Select)
                .step(1)
                .sort(2)
                .options(["Student", "Engineer", "Founder", "Other"])
                .branching(vec![BranchingRule {
                    condition: BranchCondition {
                        field_key: "role".to_owned(),
                        operator: ConditionOperator::Equals,
                        value: "Student".to_owned(),
                    },
                    action: BranchAction::SkipToStep { target_step: 3 },
                }]),
            FieldDefinition::new("company", "Company Name", FieldType::Text).step(2).sort(0),
            FieldDefinition::new("company_site", "Company Website", FieldType::Url)
                .step(2)
                .sort(1),
            FieldDefinition::new("goal", "What do you want to achieve?", FieldType::Text)
                .step(3)
                .sort(0)
                .rules(ValidationRules { min_length: Some(4), ..ValidationRules::default() }),
            FieldDefinition::new("start_date", "Target Start Date", FieldType::Date)
                .step(3)
                .sort(1),
            FieldDefinition::new("newsletter", "Subscribe to updates?", FieldType::Checkbox)
                .step(3)
                .sort(2),
        ]
    }

    /// Replace the demo campaign's catalog. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
        let fields = Self::fields();
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM campaign_fields WHERE campaign_id = ?")
            .bind(Self::CAMPAIGN_ID)
            .execute(&mut *tx)
            .await?;

        for field in &fields {
            insert_field_tx(&mut tx, Self::CAMPAIGN_ID, field).await?;
        }

        tx.commit().await?;
        Ok(SeedResult { campaign_id: Self::CAMPAIGN_ID, fields_seeded: fields.len() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, sqlx::Error> {
        let found_fields = sqlx::query(
            "SELECT COUNT(*) AS count FROM campaign_fields
             WHERE campaign_id = ? AND enabled = 1",
        )
        .bind(Self::CAMPAIGN_ID)
        .fetch_one(pool)
        .await?
        .get::<i64, _>("count") as usize;

        let expected_fields = Self::fields().len();
        Ok(VerificationResult {
            passed: found_fields == expected_fields,
            expected_fields,
            found_fields,
        })
    }
}

/// Insert one catalog row; JSON columns are serialized from the typed field.
pub async fn insert_field(
    pool: &DbPool,
    campaign_id: &str,
    field: &FieldDefinition,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    insert_field_tx(&mut tx, campaign_id, field).await?;
    tx.commit().await
}

async fn insert_field_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    campaign_id: &str,
    field: &FieldDefinition,
) -> Result<(), sqlx::Error> {
    let options = serde_json::to_string(&field.options)
        .map_err(|error| sqlx::Error::Encode(Box::new(error)))?;
    let validation_rules = serde_json::to_string(&field.validation_rules)
        .map_err(|error| sqlx::Error::Encode(Box::new(error)))?;
    let branching_logic = serde_json::to_string(&field.branching_logic)
        .map_err(|error| sqlx::Error::Encode(Box::new(error)))?;

    sqlx::query(
        "INSERT INTO campaign_fields
           (campaign_id, field_key, label, field_type, options, required, enabled,
            sort_order, step_number, validation_rules, branching_logic)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(campaign_id)
    .bind(&field.field_key)
    .bind(&field.label)
    .bind(field.field_type.as_str())
    .bind(options)
    .bind(field.required)
    .bind(field.enabled)
    .bind(field.sort_order)
    .bind(field.step_number)
    .bind(validation_rules)
    .bind(branching_logic)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use intake_core::domain::field::CampaignId;
    use intake_core::store::FieldCatalog;

    use crate::fixtures::DemoCampaign;
    use crate::repositories::SqlFieldCatalog;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn demo_campaign_seed_is_idempotent_and_verifiable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoCampaign::load(&pool).await.expect("first seed");
        let second = DemoCampaign::load(&pool).await.expect("second seed");
        assert_eq!(first, second, "re-seeding must be deterministic");

        let verification = DemoCampaign::verify(&pool).await.expect("verify seed");
        assert!(verification.passed, "expected {verification:?} to pass");
    }

    #[tokio::test]
    async fn seeded_catalog_round_trips_through_the_sql_catalog() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoCampaign::load(&pool).await.expect("seed demo campaign");

        let catalog = SqlFieldCatalog::new(pool.clone());
        let fields = catalog
            .enabled_fields(&CampaignId(DemoCampaign::CAMPAIGN_ID.to_owned()))
            .await
            .expect("load enabled fields");

        assert_eq!(fields, DemoCampaign::fields(), "JSON columns must decode losslessly");
    }
}
