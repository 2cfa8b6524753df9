use serde::{Deserialize, Serialize};

/// Raw booking fields pulled out of a message by the LLM. Values are
/// re-validated before they touch the form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedFields {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub party_size: Option<u32>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.party_size.is_none()
            && self.email.is_none()
    }
}
