//! Settings DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_billing::{DocumentType, NumberingSettings};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NumberingSettingsRequest {
    #[validate(length(min = 1, max = 10))]
    pub prefix: String,
    pub start_number: u64,
    #[validate(range(max = 12))]
    pub padding_length: usize,
    pub include_year: bool,
    pub reset_on_new_year: bool,
}

impl From<NumberingSettingsRequest> for NumberingSettings {
    fn from(request: NumberingSettingsRequest) -> Self {
        NumberingSettings {
            prefix: request.prefix,
            start_number: request.start_number,
            padding_length: request.padding_length,
            include_year: request.include_year,
            reset_on_new_year: request.reset_on_new_year,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub document_type: DocumentType,
    pub next_number: String,
}
