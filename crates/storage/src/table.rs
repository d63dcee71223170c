//! Table Naming

use crate::StorageError;

/// Longest identifier MySQL accepts.
const MAX_IDENTIFIER_LEN: usize = 64;

const TABLE_PREFIX: &str = "sensor_";

/// Derive the per-sensor table name from a sensor id.
///
/// The table name is the only fragment interpolated into DDL/DML, so the id
/// is held to a strict allow-list: ASCII alphanumerics and underscore,
/// non-empty, short enough that the prefixed name stays a legal identifier.
/// Anything else is rejected rather than escaped.
pub fn sensor_table_name(sensor_id: &str) -> Result<String, StorageError> {
    let clean = !sensor_id.is_empty()
        && sensor_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !clean {
        return Err(StorageError::InvalidSensorId(sensor_id.to_string()));
    }

    let name = format!("{}{}", TABLE_PREFIX, sensor_id);
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(StorageError::InvalidSensorId(sensor_id.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_ids_get_prefixed() {
        assert_eq!(sensor_table_name("kettle1").unwrap(), "sensor_kettle1");
        assert_eq!(
            sensor_table_name("Fermenter_2_Temp").unwrap(),
            "sensor_Fermenter_2_Temp"
        );
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(sensor_table_name("").is_err());
    }

    #[test]
    fn test_injection_attempts_rejected() {
        for id in [
            "kettle1; DROP TABLE users",
            "kettle`1",
            "kettle 1",
            "kettle-1",
            "käse",
            "a'b",
        ] {
            assert!(
                matches!(sensor_table_name(id), Err(StorageError::InvalidSensorId(_))),
                "id {:?} must be rejected",
                id
            );
        }
    }

    #[test]
    fn test_overlong_id_rejected() {
        let id = "x".repeat(MAX_IDENTIFIER_LEN);
        assert!(sensor_table_name(&id).is_err());
        let id = "x".repeat(MAX_IDENTIFIER_LEN - TABLE_PREFIX.len());
        assert!(sensor_table_name(&id).is_ok());
    }
}
