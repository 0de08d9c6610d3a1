//! YAML file helpers.

use sc_common::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read and parse a YAML file.
pub fn get_yaml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Render a value as block-style YAML.
pub fn dict_to_yaml<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_dict_to_yaml() {
        let mut data = BTreeMap::new();
        data.insert("key", "value");
        assert_eq!(dict_to_yaml(&data).unwrap(), "key: value\n");
    }

    #[test]
    fn test_get_yaml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filename");
        std::fs::write(&path, "data: somedata").unwrap();

        let parsed: BTreeMap<String, String> = get_yaml_config(&path).unwrap();
        assert_eq!(parsed.get("data").map(String::as_str), Some("somedata"));
    }

    #[test]
    fn test_get_yaml_config_missing_file() {
        let result: Result<BTreeMap<String, String>> =
            get_yaml_config(Path::new("/nonexistent/stackcheck.yaml"));
        assert!(matches!(result, Err(sc_common::Error::Io(_))));
    }
}
