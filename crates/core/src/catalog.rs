use crate::domain::field::{CampaignId, FieldDefinition};
use crate::errors::CatalogError;

/// Ordered, enabled field definitions for one campaign.
///
/// Fields are sorted by (`step_number` asc, `sort_order` asc); the sort is
/// stable, so ties keep their stored order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    campaign_id: CampaignId,
    fields: Vec<FieldDefinition>,
}

impl Catalog {
    pub fn resolve(
        campaign_id: &CampaignId,
        mut fields: Vec<FieldDefinition>,
    ) -> Result<Self, CatalogError> {
        fields.retain(|field| field.enabled);
        if fields.is_empty() {
            return Err(CatalogError::NotConfigured { campaign_id: campaign_id.0.clone() });
        }

        fields.sort_by(|a, b| {
            a.step_number.cmp(&b.step_number).then(a.sort_order.cmp(&b.sort_order))
        });

        Ok(Self { campaign_id: campaign_id.clone(), fields })
    }

    pub fn campaign_id(&self) -> &CampaignId {
        &self.campaign_id
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn find(&self, field_key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.field_key == field_key)
    }

    pub fn first_step(&self) -> u32 {
        self.fields.first().map(|field| field.step_number).unwrap_or(1)
    }

    pub fn max_step(&self) -> u32 {
        self.fields.iter().map(|field| field.step_number).max().unwrap_or(1)
    }

    pub fn step_fields(&self, step_number: u32) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(move |field| field.step_number == step_number)
    }
}
