use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroqConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub max_history_messages: u32,
    pub system_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    pub info_path: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SqlConfig {
    pub enabled: bool,
    pub max_rows: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub groq: GroqConfig,
    pub chat: ChatConfig,
    pub models: ModelsConfig,
    pub sql: SqlConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LLAMABOT").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${GROQ_API_KEY}
        app_config.database.path = expand_env(&app_config.database.path);
        app_config.groq.api_key = expand_env(&app_config.groq.api_key);
        app_config.models.info_path = expand_env(&app_config.models.info_path);

        Ok(app_config)
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| "".to_string())
    } else {
        val.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::expand_env;

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(expand_env("chat_history.db"), "chat_history.db");
    }

    #[test]
    fn references_read_the_environment() {
        std::env::set_var("LLAMABOT_TEST_SECRET", "gsk-abc123");
        assert_eq!(expand_env("${LLAMABOT_TEST_SECRET}"), "gsk-abc123");
        std::env::remove_var("LLAMABOT_TEST_SECRET");
    }

    #[test]
    fn missing_variables_expand_to_empty() {
        assert_eq!(expand_env("${LLAMABOT_TEST_UNSET_VAR}"), "");
    }
}
