use crate::domain::field::FieldDefinition;

/// The chat surface can render only a bounded number of inputs per modal.
pub const DEFAULT_FIELDS_PER_MODAL: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalBatch {
    pub fields: Vec<FieldDefinition>,
    pub has_more: bool,
}

impl ModalBatch {
    pub fn empty() -> Self {
        Self { fields: Vec::new(), has_more: false }
    }

    pub fn field_keys(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.field_key.clone()).collect()
    }
}

/// Pure windowing over the already-ordered incomplete list. No reordering,
/// no re-validation.
pub fn next_batch(incomplete_fields: &[FieldDefinition], fields_per_modal: usize) -> ModalBatch {
    let limit = fields_per_modal.max(1);
    ModalBatch {
        fields: incomplete_fields.iter().take(limit).cloned().collect(),
        has_more: incomplete_fields.len() > limit,
    }
}
