//! Model persistence: a self-identifying JSON document per fitted model,
//! following this workspace's existing `io::curve` read/write pattern.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PersistCode, PersistError};
use crate::family::{Combi, Mia, Multi, Ria};

/// Tagged union over every family's persisted state. The `family` tag lets
/// `load` reject a foreign family with a distinct exit code instead of
/// silently deserializing into the wrong shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum PersistedModel {
    Combi(Combi),
    Multi(Multi),
    Mia(Mia),
    Ria(Ria),
}

impl PersistedModel {
    pub fn family_name(&self) -> &'static str {
        match self {
            PersistedModel::Combi(_) => "combi",
            PersistedModel::Multi(_) => "multi",
            PersistedModel::Mia(_) => "mia",
            PersistedModel::Ria(_) => "ria",
        }
    }
}

pub fn save(path: &Path, model: &PersistedModel) -> Result<(), PersistError> {
    let file = File::create(path).map_err(|e| PersistError::new(PersistCode::Io, format!("failed to create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, model)
        .map_err(|e| PersistError::new(PersistCode::Io, format!("failed to write {}: {e}", path.display())))
}

pub fn load(path: &Path) -> Result<PersistedModel, PersistError> {
    let file = File::open(path).map_err(|e| PersistError::new(PersistCode::Io, format!("failed to open {}: {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| PersistError::new(PersistCode::Malformed, format!("malformed model file {}: {e}", path.display())))
}

/// Load and assert the loaded model is the expected family, else exit code 3.
pub fn load_expecting(path: &Path, expected: &'static str) -> Result<PersistedModel, PersistError> {
    let model = load(path)?;
    if model.family_name() != expected {
        return Err(PersistError::new(
            PersistCode::WrongFamily,
            format!("expected a {expected} model, found a {} model in {}", model.family_name(), path.display()),
        ));
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Criterion, CriterionKind};
    use crate::model::CombiParams;
    use crate::series::time_series_transformation;
    use nalgebra::DVector;
    use tempfile::NamedTempFile;

    #[test]
    fn save_then_load_round_trips_a_combi_model() {
        let values: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let v = DVector::from_vec(values);
        let (x, y) = time_series_transformation(&v, 3).unwrap();
        let params = CombiParams::new(Criterion::Primitive(CriterionKind::Regularity));
        let model = Combi::fit(&x, &y, params).unwrap();

        let file = NamedTempFile::new().unwrap();
        save(file.path(), &PersistedModel::Combi(model.clone())).unwrap();
        let loaded = load_expecting(file.path(), "combi").unwrap();
        let PersistedModel::Combi(loaded) = loaded else { panic!("expected combi variant") };

        let row = x.row(0).iter().copied().collect::<Vec<_>>();
        assert_eq!(model.predict_row(&row).unwrap(), loaded.predict_row(&row).unwrap());
    }

    #[test]
    fn load_expecting_rejects_wrong_family() {
        let values: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let v = DVector::from_vec(values);
        let (x, y) = time_series_transformation(&v, 3).unwrap();
        let params = CombiParams::new(Criterion::Primitive(CriterionKind::Regularity));
        let model = Combi::fit(&x, &y, params).unwrap();

        let file = NamedTempFile::new().unwrap();
        save(file.path(), &PersistedModel::Combi(model)).unwrap();
        let err = load_expecting(file.path(), "multi").unwrap_err();
        assert_eq!(err.code(), PersistCode::WrongFamily);
    }
}
