// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::config::ProviderConfig;
use crate::shared::error::KindError;
use std::collections::HashMap;
use std::str::FromStr;

/// Applies `-D key=value` overrides on top of a loaded provider config.
pub fn apply_to_provider_config(
    configs: &HashMap<String, String>,
    config: &mut ProviderConfig,
) -> Result<(), KindError> {
    for (key, value) in configs {
        match key.as_str() {
            "provider.runtime" => config.runtime = Some(value.clone()),
            "kind.binary" => config.kind_binary = value.clone(),
            "timeout.create" => config.timeouts.create_secs = parse_value(key, value)?,
            "timeout.read" => config.timeouts.read_secs = parse_value(key, value)?,
            "timeout.delete" => config.timeouts.delete_secs = parse_value(key, value)?,
            "read.retries" => config.read_retry.max_times = parse_value(key, value)?,
            "read.retry-delay-ms" => config.read_retry.min_delay_ms = parse_value(key, value)?,
            _ => {
                return Err(KindError::InvalidConfiguration(format!(
                    "Unknown dynamic config key: {}",
                    key
                )))
            }
        }
    }

    config.validate()
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, KindError> {
    value.parse::<T>().map_err(|_| {
        KindError::InvalidConfiguration(format!("Invalid value for {}: '{}'", key, value))
    })
}

/// Parses `key=value` pairs as given on the command line.
pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>, KindError> {
    let mut map = HashMap::new();
    for config in configs {
        let (key, value) = config.split_once('=').ok_or_else(|| {
            KindError::InvalidConfiguration(format!(
                "Invalid config format: '{}'. Expected key=value",
                config
            ))
        })?;
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let configs = parse_dynamic_configs(&[
            "provider.runtime=podman".to_string(),
            "timeout.create = 1200".to_string(),
            "read.retries=5".to_string(),
        ])
        .unwrap();

        let mut config = ProviderConfig::default();
        apply_to_provider_config(&configs, &mut config).unwrap();
        assert_eq!(config.runtime.as_deref(), Some("podman"));
        assert_eq!(config.timeouts.create_secs, 1200);
        assert_eq!(config.read_retry.max_times, 5);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ProviderConfig::default();

        let configs = parse_dynamic_configs(&["timeout.read=soon".to_string()]).unwrap();
        assert!(apply_to_provider_config(&configs, &mut config).is_err());

        let configs = parse_dynamic_configs(&["provider.runtime=lxc".to_string()]).unwrap();
        assert!(apply_to_provider_config(&configs, &mut config).is_err());

        let configs = parse_dynamic_configs(&["unknown.key=1".to_string()]).unwrap();
        assert!(apply_to_provider_config(&configs, &mut config).is_err());
    }

    #[test]
    fn test_parse_requires_equals() {
        assert!(parse_dynamic_configs(&["timeout.read".to_string()]).is_err());
    }
}
