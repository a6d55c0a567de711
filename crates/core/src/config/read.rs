/*
 * Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::config::{ConfigParser, HFileConfigValue, HFileConfigs};
use crate::hfile::trailer::MAX_TRAILER_SIZE;

/// Options controlling a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum HFileReadConfig {
    /// Rows handed to the sink per committed batch.
    BatchSize,
    /// Copy decoded strings out of block buffers instead of borrowing them.
    CompactData,
    /// Length of the end-of-file range read to find the trailer.
    MaxTrailerSize,
}

impl AsRef<str> for HFileReadConfig {
    fn as_ref(&self) -> &str {
        match self {
            Self::BatchSize => "hfile.read.batch.size",
            Self::CompactData => "hfile.read.compact.data",
            Self::MaxTrailerSize => "hfile.read.max.trailer.size",
        }
    }
}

impl HFileReadConfig {
    /// Check every read option present in `configs`.
    pub fn validate_all(configs: &HFileConfigs) -> Result<()> {
        Self::iter().try_for_each(|config| configs.validate(config))
    }

    fn parse_usize(&self, v: &str, min: usize) -> Result<usize> {
        let value = usize::from_str(v).map_err(|e| {
            anyhow!(
                "Failed to parse '{}' for config '{}': {}",
                v,
                self.as_ref(),
                e
            )
        })?;
        if value < min {
            return Err(anyhow!(
                "Config '{}' must be at least {}, got {}",
                self.as_ref(),
                min,
                value
            ));
        }
        Ok(value)
    }
}

impl ConfigParser for HFileReadConfig {
    type Output = HFileConfigValue;

    fn default_value(&self) -> Option<HFileConfigValue> {
        match self {
            Self::BatchSize => Some(HFileConfigValue::UInteger(1024)),
            Self::CompactData => Some(HFileConfigValue::Boolean(true)),
            Self::MaxTrailerSize => Some(HFileConfigValue::UInteger(MAX_TRAILER_SIZE)),
        }
    }

    fn parse_value(&self, configs: &HashMap<String, String>) -> Result<Self::Output> {
        let get_result = configs
            .get(self.as_ref())
            .map(|v| v.as_str())
            .ok_or(anyhow!("Config '{}' not found", self.as_ref()));

        match self {
            Self::BatchSize => get_result
                .and_then(|v| self.parse_usize(v, 1))
                .map(HFileConfigValue::UInteger),
            Self::CompactData => get_result
                .and_then(|v| {
                    bool::from_str(v).map_err(|e| {
                        anyhow!(
                            "Failed to parse '{}' for config '{}': {}",
                            v,
                            self.as_ref(),
                            e
                        )
                    })
                })
                .map(HFileConfigValue::Boolean),
            Self::MaxTrailerSize => get_result
                .and_then(|v| self.parse_usize(v, MAX_TRAILER_SIZE))
                .map(HFileConfigValue::UInteger),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::config::read::HFileReadConfig::{BatchSize, CompactData, MaxTrailerSize};
    use crate::config::ConfigParser;

    #[test]
    fn parse_valid_config_value() {
        let options = HashMap::from([
            (BatchSize.as_ref().to_string(), "100".to_string()),
            (CompactData.as_ref().to_string(), "false".to_string()),
            (MaxTrailerSize.as_ref().to_string(), "8192".to_string()),
        ]);
        assert_eq!(BatchSize.parse_value(&options).unwrap().to::<usize>(), 100);
        assert!(!CompactData.parse_value(&options).unwrap().to::<bool>());
        assert_eq!(
            MaxTrailerSize.parse_value(&options).unwrap().to::<usize>(),
            8192
        );
    }

    #[test]
    fn parse_invalid_config_value() {
        let options = HashMap::from([(BatchSize.as_ref().to_string(), "foo".to_string())]);
        let value = BatchSize.parse_value(&options);
        assert!(value.err().unwrap().to_string().starts_with(&format!(
            "Failed to parse 'foo' for config '{}'",
            BatchSize.as_ref()
        )));
        assert_eq!(BatchSize.parse_value_or_default(&options).to::<usize>(), 1024);
    }

    #[test]
    fn parse_out_of_range_config_value() {
        let options = HashMap::from([
            (BatchSize.as_ref().to_string(), "0".to_string()),
            (MaxTrailerSize.as_ref().to_string(), "100".to_string()),
        ]);
        assert!(BatchSize.parse_value(&options).is_err());
        assert!(MaxTrailerSize.parse_value(&options).is_err());
        assert_eq!(
            MaxTrailerSize.parse_value_or_default(&options).to::<usize>(),
            4096
        );
    }

    #[test]
    fn validate_all_reports_first_invalid_value() {
        use crate::config::HFileConfigs;

        let configs = HFileConfigs::new([(CompactData.as_ref(), "yes")]);
        let err = super::HFileReadConfig::validate_all(&configs).unwrap_err();
        assert!(err.to_string().contains(CompactData.as_ref()));
        assert!(super::HFileReadConfig::validate_all(&HFileConfigs::empty()).is_ok());
    }

    #[test]
    fn missing_config_is_not_found() {
        let options = HashMap::new();
        let err = CompactData.parse_value(&options).unwrap_err();
        assert!(err.to_string().ends_with("not found"));
        assert!(CompactData.parse_value_or_default(&options).to::<bool>());
    }
}
