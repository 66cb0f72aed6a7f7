use color_eyre::{
    eyre::{eyre, Result},
    Report,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env,
    fs::{self, File},
    io::{self, ErrorKind, Read, Write},
    path::PathBuf,
};

pub const DEFAULT_FIELD_NAME: &str = "file";

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
    pub default_endpoint: Option<String>,
    /// Form field name used when `upload` is not given one
    pub field_name: Option<String>,
    /// Attach upload diagnostics even without `--verbose`
    #[serde(default)]
    pub debug: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        match File::open(get_configpath()?) {
            Ok(mut file) => {
                let mut config_str = String::new();
                file.read_to_string(&mut config_str)?;
                Ok(toml::from_str(&config_str)?)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let config = Config::default();
                config.save()?;
                Ok(config)
            }
            Err(err) => Err(Report::new(err).wrap_err("Failed to open the config file")),
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        let mut file = File::create(get_configpath()?)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    /// Resolves an endpoint argument: `raw:<url>` is used as is, a name is
    /// looked up, and no argument means the default endpoint.
    pub fn endpoint(&self, endpoint: Option<&str>) -> Result<String> {
        if let Some(endpoint) = endpoint {
            if let Some(url) = endpoint.strip_prefix("raw:") {
                return Ok(url.into());
            }
            return self
                .endpoints
                .get(endpoint)
                .cloned()
                .ok_or_else(|| eyre!("Endpoint named '{endpoint}' not found."));
        }
        let default_endpoint = self
            .default_endpoint
            .as_deref()
            .ok_or_else(|| eyre!("No default endpoint set"))?;
        self.endpoints
            .get(default_endpoint)
            .cloned()
            .ok_or_else(|| eyre!("Default endpoint '{default_endpoint}' not found."))
    }

    pub fn field_name(&self) -> &str {
        self.field_name.as_deref().unwrap_or(DEFAULT_FIELD_NAME)
    }
}

fn get_configpath() -> io::Result<PathBuf> {
    let configdir = if let Some(dir) = dirs::config_dir() {
        dir
    } else {
        env::current_dir()?
    }
    .join("streamupload");
    let configpath = configdir.join("config.toml");
    if !configdir.is_dir() {
        fs::create_dir_all(configdir)?;
    }
    Ok(configpath)
}
