use crate::duplex::DuplexOptions;
use crate::honigs::HonigsOptions;
use crate::kennard_stone::KennardStoneOptions;
use crate::naes::NaesOptions;
use crate::puchwein::PuchweinOptions;
use crate::shenk_west::ShenkWestOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write selection config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML selection config: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize selection config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Selection settings for a batch of runs, one optional table per algorithm.
///
/// ```toml
/// [kennard_stone]
/// k = 25
/// metric = "mahalanobis"
/// components = 0.99
///
/// [puchwein]
/// k = 0.2
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    pub kennard_stone: Option<KennardStoneOptions>,
    pub duplex: Option<DuplexOptions>,
    pub puchwein: Option<PuchweinOptions>,
    pub shenk_west: Option<ShenkWestOptions>,
    pub honigs: Option<HonigsOptions>,
    pub naes: Option<NaesOptions>,
}

impl SelectionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = self.to_toml_string()?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;
    use crate::honigs::SignalType;
    use crate::naes::CentroidPolicy;
    use crate::projection::ComponentSpec;

    #[test]
    fn tables_fill_in_defaults() {
        let config = SelectionConfig::from_toml_str(
            r#"
            [kennard_stone]
            k = 25
            metric = "euclidean"
            components = 3

            [shenk_west]
            d_min = 0.4

            [honigs]
            k = 5
            signal = "reflectance"

            [naes]
            k = 4
            policy = "farthest_from_center"
            components = 0.9
            "#,
        )
        .unwrap();

        let ks = config.kennard_stone.unwrap();
        assert_eq!(ks.k, 25);
        assert_eq!(ks.metric, Metric::Euclidean);
        assert_eq!(ks.components, Some(ComponentSpec::Count(3)));
        assert!(ks.pca.center);

        let sw = config.shenk_west.unwrap();
        assert_eq!(sw.d_min, 0.4);
        assert_eq!(sw.threshold, 0.6);
        assert_eq!(sw.components, ComponentSpec::Fraction(0.95));

        assert_eq!(config.honigs.unwrap().signal, SignalType::Reflectance);

        let naes = config.naes.unwrap();
        assert_eq!(naes.policy, CentroidPolicy::FarthestFromCenter);
        assert_eq!(naes.components, Some(ComponentSpec::Fraction(0.9)));
        assert_eq!(naes.iter_max, 10);

        assert!(config.duplex.is_none());
        assert!(config.puchwein.is_none());
    }

    #[test]
    fn unknown_metric_is_a_parse_error() {
        let err = SelectionConfig::from_toml_str("[duplex]\nk = 5\nmetric = \"manhattan\"\n");
        assert!(matches!(err, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn unknown_table_is_a_parse_error() {
        let err = SelectionConfig::from_toml_str("[kenstone]\nk = 5\n");
        assert!(matches!(err, Err(ConfigError::TomlParse(_))));
    }
}
