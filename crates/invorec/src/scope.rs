use serde::{Deserialize, Serialize};

/// Ownership boundary for cache rows and candidate transactions: a user,
/// optionally narrowed to one company/checking account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub user_id: String,
    #[serde(default)]
    pub company_id: Option<String>,
}

impl Scope {
    pub fn personal(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: None,
        }
    }

    pub fn company(user_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: Some(company_id.into()),
        }
    }

    /// Partition key used for cache rows. A user-level scope and a
    /// company-narrowed scope never collide.
    pub fn key(&self) -> String {
        match &self.company_id {
            Some(company) => format!("user:{}/company:{}", self.user_id, company),
            None => format!("user:{}", self.user_id),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}
