//! Query parameters shared by the read endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::ReadRequest;

/// `?withAudit=&attributes=` on list and get-by-id.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReadParams {
    /// Emit `audit` blocks; defaults to `false`.
    #[param(default = false)]
    pub with_audit: Option<bool>,
    /// Comma-separated association paths, for example `addresses,contacts`.
    #[param(example = "addresses,contacts")]
    pub attributes: Option<String>,
}

/// `?withAudit=` on the per-user listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditParams {
    #[param(default = false)]
    pub with_audit: Option<bool>,
}

impl AuditParams {
    pub fn include_audit(&self) -> bool {
        self.with_audit.unwrap_or(false)
    }
}

impl From<ReadParams> for ReadRequest {
    fn from(params: ReadParams) -> Self {
        let attributes = params.attributes.filter(|raw| !raw.trim().is_empty());
        ReadRequest::new(params.with_audit.unwrap_or(false), attributes)
    }
}
