// storefront-core/src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Creation/modification bookkeeping embedded in every catalog and order row.
///
/// Stores fill these in at write time from the acting user they are handed;
/// nothing reads an ambient "current user".
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Audit {
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub created_by: Option<i64>,
  pub updated_by: Option<i64>,
}

impl Audit {
  pub fn created_by(actor: i64) -> Self {
    let now = Utc::now();
    Self {
      created_at: now,
      updated_at: now,
      created_by: Some(actor),
      updated_by: Some(actor),
    }
  }

  /// Marks a modification. `created_*` never changes.
  pub fn touch(&mut self, actor: i64) {
    self.updated_at = Utc::now();
    self.updated_by = Some(actor);
  }
}
