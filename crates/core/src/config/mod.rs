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
//! Scan configuration.
//!
//! Options arrive as a string map. Each known key is described by a
//! [ConfigParser], which parses the raw string into an [HFileConfigValue]
//! and supplies the default when the key is absent or invalid.
use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

pub mod read;

pub trait ConfigParser: AsRef<str> {
    type Output;

    fn default_value(&self) -> Option<Self::Output>;

    fn is_required(&self) -> bool {
        false
    }

    fn validate(&self, configs: &HashMap<String, String>) -> Result<()> {
        match self.parse_value(configs) {
            Ok(_) => Ok(()),
            Err(e) => {
                if !self.is_required() && e.to_string().ends_with("not found") {
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    fn parse_value(&self, configs: &HashMap<String, String>) -> Result<Self::Output>;

    fn parse_value_or_default(&self, configs: &HashMap<String, String>) -> Self::Output {
        self.parse_value(configs).unwrap_or_else(|_| {
            self.default_value()
                .unwrap_or_else(|| panic!("No default value for config '{}'", self.as_ref()))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HFileConfigValue {
    Boolean(bool),
    UInteger(usize),
}

impl HFileConfigValue {
    pub fn to<T: 'static + std::fmt::Debug + From<HFileConfigValue>>(self) -> T {
        T::from(self)
    }
}

impl From<HFileConfigValue> for bool {
    fn from(value: HFileConfigValue) -> Self {
        match value {
            HFileConfigValue::Boolean(v) => v,
            _ => panic!("Cannot cast {:?} to {}", value, type_name::<Self>()),
        }
    }
}

impl From<HFileConfigValue> for usize {
    fn from(value: HFileConfigValue) -> Self {
        match value {
            HFileConfigValue::UInteger(v) => v,
            _ => panic!("Cannot cast {:?} to {}", value, type_name::<Self>()),
        }
    }
}

impl From<HFileConfigValue> for String {
    fn from(value: HFileConfigValue) -> Self {
        match value {
            HFileConfigValue::Boolean(v) => v.to_string(),
            HFileConfigValue::UInteger(v) => v.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HFileConfigs {
    pub raw_configs: Arc<HashMap<String, String>>,
}

impl HFileConfigs {
    pub fn new<I, K, V>(options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let raw_configs = options
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();
        Self {
            raw_configs: Arc::new(raw_configs),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn validate(&self, parser: impl ConfigParser<Output = HFileConfigValue>) -> Result<()> {
        parser.validate(&self.raw_configs)
    }

    pub fn get(
        &self,
        parser: impl ConfigParser<Output = HFileConfigValue>,
    ) -> Result<HFileConfigValue> {
        parser.parse_value(&self.raw_configs)
    }

    pub fn get_or_default(
        &self,
        parser: impl ConfigParser<Output = HFileConfigValue>,
    ) -> HFileConfigValue {
        parser.parse_value_or_default(&self.raw_configs)
    }

    pub fn try_get(
        &self,
        parser: impl ConfigParser<Output = HFileConfigValue>,
    ) -> Option<HFileConfigValue> {
        match parser.parse_value(&self.raw_configs) {
            Ok(v) => Some(v),
            Err(_) => parser.default_value(),
        }
    }
}
