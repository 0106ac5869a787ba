//! Connection configuration
//!
//! [`ConnectOptions`] holds the key=value pairs handed to the driver
//! manager. Options can be built in code, read from `ACTIAN_*` environment
//! variables, or loaded from a TOML file:
//!
//! ```toml
//! driver = "{Actian AC}"
//! server = "dbhost"
//! database = "iidbdb"
//! user = "ingres"
//! password = "secret"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default ODBC driver name
pub const DEFAULT_DRIVER: &str = "{Actian AC}";

/// Default database name
pub const DEFAULT_DATABASE: &str = "iidbdb";

/// Connection options for an Actian (Ingres/Avalanche) data source
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectOptions {
    /// ODBC driver name
    pub driver: String,
    /// Server name
    pub server: String,
    /// Database name
    pub database: String,
    /// User name
    pub user: String,
    /// Password
    pub password: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            server: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl ConnectOptions {
    /// Create options with default driver and database
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the driver name
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// Set the server name
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the database name
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the user name
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Defaults overridden by any `ACTIAN_DRIVER`, `ACTIAN_SERVER`,
    /// `ACTIAN_DB`, `ACTIAN_USER` and `ACTIAN_PASSWORD` variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        let fields: [(&str, &mut String); 5] = [
            ("ACTIAN_DRIVER", &mut options.driver),
            ("ACTIAN_SERVER", &mut options.server),
            ("ACTIAN_DB", &mut options.database),
            ("ACTIAN_USER", &mut options.user),
            ("ACTIAN_PASSWORD", &mut options.password),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }
        options
    }

    /// Parse options from TOML; missing keys take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Render the driver-manager connection string
    pub fn connection_string(&self) -> String {
        self.render(&self.password)
    }

    /// Connection string with the password masked, for logging
    pub fn redacted_connection_string(&self) -> String {
        if self.password.is_empty() {
            self.render("")
        } else {
            self.render("****")
        }
    }

    fn render(&self, password: &str) -> String {
        format!(
            "driver={};server={};database={};uid={};pwd={};",
            self.driver, self.server, self.database, self.user, password
        )
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"****")
            .finish()
    }
}
