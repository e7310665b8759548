use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::store::{CollectionAccessor, ListOptions, StoreClient};
use crate::types::FilterOp;

const COLLECTION: &str = "medicaments";

/// A medicament row as stored in the backend.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Medicament {
    pub id: String,
    pub name: String,
    /// Therapeutic class (antibiotic, analgesic, ...).
    pub class: String,
    /// Administration route (oral, iv, im, ...).
    pub route: String,
    #[serde(default)]
    pub indications: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the backend fills id and created_at.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewMedicament {
    pub name: String,
    pub class: String,
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Partial update payload; only the fields that are set reach the backend.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MedicamentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Medicament queries over an owned generic accessor.
#[derive(Clone)]
pub struct MedicamentService {
    store: CollectionAccessor,
}

impl MedicamentService {
    pub fn new(client: StoreClient) -> Self {
        Self {
            store: CollectionAccessor::new(client, COLLECTION),
        }
    }

    /// Underlying accessor, for callers needing raw CRUD.
    #[must_use]
    pub fn store(&self) -> &CollectionAccessor {
        &self.store
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Medicament>> {
        self.store.get_all(options).await
    }

    pub async fn get(&self, id: &str) -> Result<Medicament> {
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, new: &NewMedicament) -> Result<Medicament> {
        self.store.create(new).await
    }

    pub async fn update(&self, id: &str, patch: &MedicamentPatch) -> Result<Medicament> {
        self.store.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await
    }

    /// Case-insensitive substring search on the name column.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Medicament>> {
        self.store
            .filter("name", FilterOp::ILike, &format!("%{name}%"))
            .await
    }

    pub async fn by_class(&self, class: &str) -> Result<Vec<Medicament>> {
        self.store.filter("class", FilterOp::Eq, class).await
    }

    pub async fn by_route(&self, route: &str) -> Result<Vec<Medicament>> {
        self.store.filter("route", FilterOp::Eq, route).await
    }
}

#[cfg(test)]
mod tests {
    use super::{Medicament, MedicamentPatch, NewMedicament};

    #[test]
    fn medicament_deserializes_with_optional_fields_absent() {
        let row: Medicament = match serde_json::from_str(
            r#"{
                "id": "m1",
                "name": "Amoxicillin",
                "class": "antibiotic",
                "route": "oral",
                "created_at": "2024-05-01T12:00:00Z"
            }"#,
        ) {
            Ok(value) => value,
            Err(err) => panic!("failed to parse medicament row: {err}"),
        };
        assert_eq!(row.name, "Amoxicillin");
        assert_eq!(row.indications, None);
        assert_eq!(row.tags, None);
    }

    #[test]
    fn new_medicament_omits_unset_fields() {
        let new = NewMedicament {
            name: "Ibuprofen".to_string(),
            class: "analgesic".to_string(),
            route: "oral".to_string(),
            ..NewMedicament::default()
        };
        let json = match serde_json::to_value(&new) {
            Ok(value) => value,
            Err(err) => panic!("failed to encode payload: {err}"),
        };
        assert_eq!(
            json,
            serde_json::json!({"name": "Ibuprofen", "class": "analgesic", "route": "oral"})
        );
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = MedicamentPatch {
            dosage: Some("500 mg".to_string()),
            ..MedicamentPatch::default()
        };
        let json = match serde_json::to_value(&patch) {
            Ok(value) => value,
            Err(err) => panic!("failed to encode patch: {err}"),
        };
        assert_eq!(json, serde_json::json!({"dosage": "500 mg"}));
    }
}
