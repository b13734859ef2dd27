use envconfig::Envconfig;

/// Settings needed by the database commands; the validators read none.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    #[envconfig(default = "sqlite:data/webhooks.db?mode=rwc")]
    pub db_host: String,
    /// When set the database is opened through sqlcipher, as the server does
    pub db_pass_encrypt: Option<String>,
    /// Directory holding the `.sql` templates
    #[envconfig(default = "../migrations")]
    pub migrations_dir: String,
}

pub fn init_config() -> anyhow::Result<AppConfig> {
    Ok(AppConfig::init_from_env()?)
}
