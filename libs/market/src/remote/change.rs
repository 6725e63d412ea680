use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MarketError, Result};
use crate::point::PricePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    #[serde(alias = "insert")]
    Insert,
    #[serde(alias = "update")]
    Update,
    #[serde(alias = "delete")]
    Delete,
}

/// Identity of a row in a change payload. Deletes usually carry only `id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RowKey {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Live notification from a table channel, kept raw until applied.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "eventType")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub new: Option<Value>,
    #[serde(default)]
    pub old: Option<Value>,
}

impl ChangeEvent {
    pub fn insert(point: &PricePoint) -> Result<Self> {
        Ok(Self {
            kind: ChangeKind::Insert,
            new: Some(serde_json::to_value(point)?),
            old: None,
        })
    }

    pub fn update(point: &PricePoint) -> Result<Self> {
        Ok(Self {
            kind: ChangeKind::Update,
            new: Some(serde_json::to_value(point)?),
            old: None,
        })
    }

    pub fn delete(key: RowKey) -> Self {
        let mut old = serde_json::Map::new();
        if let Some(id) = key.id {
            old.insert("id".into(), id.into());
        }
        if let Some(date) = key.date {
            old.insert("date".into(), date.to_string().into());
        }
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(Value::Object(old)),
        }
    }

    /// The full row an insert or update carries.
    pub fn new_row(&self) -> Result<PricePoint> {
        let value = self
            .new
            .as_ref()
            .ok_or_else(|| MarketError::Malformed(format!("{:?} without new row", self.kind)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| MarketError::Malformed(format!("new row: {e}")))
    }

    /// The key of the row a delete removes.
    pub fn old_key(&self) -> Result<RowKey> {
        let value = self
            .old
            .as_ref()
            .ok_or_else(|| MarketError::Malformed(format!("{:?} without old row", self.kind)))?;
        let key: RowKey = serde_json::from_value(value.clone())
            .map_err(|e| MarketError::Malformed(format!("old row: {e}")))?;
        if key.id.is_none() && key.date.is_none() {
            return Err(MarketError::Malformed("old row has neither id nor date".into()));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_payload() {
        let raw = r#"{
            "eventType": "INSERT",
            "new": {"id": 1, "date": "2024-02-02", "close": 2, "open": 2, "high": 2, "low": 2, "volume": 0},
            "old": {}
        }"#;
        let event: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.new_row().unwrap().close, 2.0);
    }

    #[test]
    fn delete_with_only_id() {
        let raw = r#"{"eventType": "DELETE", "old": {"id": 42}}"#;
        let event: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.old_key().unwrap(), RowKey { id: Some(42), date: None });
    }

    #[test]
    fn malformed_rows_are_reported() {
        let raw = r#"{"eventType": "update", "new": {"date": "2024-02-02"}}"#;
        let event: ChangeEvent = serde_json::from_str(raw).unwrap();
        assert!(matches!(event.new_row(), Err(MarketError::Malformed(_))));

        let empty = ChangeEvent::delete(RowKey::default());
        assert!(matches!(empty.old_key(), Err(MarketError::Malformed(_))));
    }
}
