//! Configuration files that carry their own documentation.
//!
//! A config type lists its fields once through [`documented_config!`]; the
//! generated [`DocumentedConfig`] impl can then write a TOML file where every key
//! is followed by its description, so a freshly created config doubles as a
//! reference for the available options.
//!
//! ```ignore
//! documented_config!(AlignConfig {
//!     fields: [
//!         fps, "Frame rate used for timecode conversion",
//!         min_group_score, "Minimum match score",
//!     ],
//!     config_path: paths::realign_config_dir().map(|dir| dir.join("config.toml")),
//! });
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata about a configuration field
#[derive(Debug, Clone)]
pub struct ConfigFieldMeta {
    pub name: &'static str,
    /// TOML-serialized default value, or None if serialization failed
    pub default_value: Option<String>,
    pub description: &'static str,
}

/// Implemented by the `documented_config!` macro.
pub trait DocumentedConfig: Sized + Default + serde::Serialize {
    fn field_metadata() -> Vec<ConfigFieldMeta>;

    /// TOML-serialized value of a single field
    fn get_field_value(&self, field_name: &str) -> String;

    /// Default location of the config file
    fn config_path() -> Result<PathBuf>;

    fn render_documented(&self) -> String {
        let mut output = String::new();
        for field in Self::field_metadata() {
            let value = self.get_field_value(field.name);
            output.push_str(&format!("# {}\n", field.description));
            if let Some(default_value) = field.default_value.as_ref()
                && default_value != &value
            {
                output.push_str(&format!("# default: {default_value}\n"));
            }
            output.push_str(&format!("{} = {}\n\n", field.name, value));
        }
        output
    }

    fn save_with_documentation(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        fs::write(path, self.render_documented())
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Load from `path`, creating a documented default file when none exists.
    fn load_from_path_documented(path: &Path) -> Result<Self>
    where
        for<'de> Self: serde::de::Deserialize<'de>,
    {
        if !path.exists() {
            let config = Self::default();
            config.save_with_documentation(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[macro_export]
macro_rules! documented_config {
    (
        $config_name:ident {
            fields: [
                $($field:ident, $desc:expr),* $(,)?
            ],
            config_path: $path:expr $(,)?
        }
    ) => {
        impl $crate::common::config::DocumentedConfig for $config_name {
            fn field_metadata() -> Vec<$crate::common::config::ConfigFieldMeta> {
                let default_config = Self::default();
                vec![
                    $(
                        $crate::common::config::ConfigFieldMeta {
                            name: stringify!($field),
                            default_value: toml::Value::try_from(&default_config.$field)
                                .map(|v| v.to_string())
                                .ok(),
                            description: $desc,
                        },
                    )*
                ]
            }

            fn get_field_value(&self, field_name: &str) -> String {
                match field_name {
                    $(
                        stringify!($field) => {
                            toml::Value::try_from(&self.$field)
                                .map(|v| v.to_string())
                                .unwrap_or_else(|_| format!("{:?}", self.$field))
                        }
                    )*
                    _ => String::new(),
                }
            }

            fn config_path() -> anyhow::Result<std::path::PathBuf> {
                $path
            }
        }
    };
}
