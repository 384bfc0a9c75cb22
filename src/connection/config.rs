use crate::core::{DbError, IsolationLevel, Result};

const URL_SCHEME: &str = "rustmemkv://";

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database name, used in diagnostics
    pub name: String,

    /// Isolation level for transactions begun without an explicit one
    pub default_isolation_level: IsolationLevel,
}

impl DatabaseConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default_isolation_level: IsolationLevel::default(),
        }
    }

    /// Set the database name
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the default isolation level
    pub fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.default_isolation_level = level;
        self
    }

    /// Parse from connection string
    ///
    /// Format: "rustmemkv://name?isolation=level"
    ///
    /// # Examples
    ///
    /// ```
    /// use rustmemkv::{DatabaseConfig, IsolationLevel};
    ///
    /// let config = DatabaseConfig::from_url("rustmemkv://bank?isolation=snapshot").unwrap();
    /// assert_eq!(config.name, "bank");
    /// assert_eq!(config.default_isolation_level, IsolationLevel::Snapshot);
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| DbError::InvalidConfig(format!("URL must start with '{}'", URL_SCHEME)))?;

        let (name, query) = match rest.split_once('?') {
            Some((name, query)) => (name, Some(query)),
            None => (rest, None),
        };

        let mut config = Self::new(name);

        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| DbError::InvalidConfig(format!("Invalid parameter '{}'", pair)))?;
            match key {
                "isolation" => config.default_isolation_level = value.parse()?,
                other => {
                    return Err(DbError::InvalidConfig(format!("Unknown parameter '{}'", other)));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        format!(
            "{}{}?isolation={}",
            URL_SCHEME, self.name, self.default_isolation_level
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::InvalidConfig("Database name cannot be empty".into()));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("rustmemkv")
    }
}
