use anyhow::{Context, Result};
use groupedit::GroupEditSettings;
use platform_db::DatabaseSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub groupedit: GroupEditSettings,
}

impl AppConfig {
    /// Reads the environment, with `database_url` overriding `DATABASE_URL`.
    pub fn load(database_url: Option<String>) -> Result<Self> {
        let mut database = DatabaseSettings::from_env();
        if let Some(url) = database_url {
            database = database.with_url(url);
        }
        if let Ok(max) = std::env::var("DATABASE_MAX_CONNECTIONS") {
            let max = max
                .trim()
                .parse::<u32>()
                .context("invalid DATABASE_MAX_CONNECTIONS")?;
            database = database.with_max_connections(max);
        }

        let groupedit = GroupEditSettings::from_env().context("invalid group edit settings")?;

        Ok(Self {
            database,
            groupedit,
        })
    }
}
