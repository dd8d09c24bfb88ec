use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Direct Postgres access; when unset, inserts go through the Supabase REST API.
    pub database_url: Option<String>,
    pub research_function: String,
    pub research_timeout_secs: u64,
    pub shutdown_drain_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            supabase_url: std::env::var("SUPABASE_URL")
                .map_err(|_| anyhow::anyhow!("SUPABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("SUPABASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SUPABASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })?,
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY")
                .or_else(|_| std::env::var("SUPABASE_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("SUPABASE_ANON_KEY or SUPABASE_KEY environment variable required")
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("SUPABASE_ANON_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            database_url: match std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .ok()
                .filter(|s| !s.trim().is_empty())
            {
                Some(url) => {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Some(url)
                }
                None => None,
            },
            research_function: std::env::var("RESEARCH_FUNCTION")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "research-company".to_string()),
            research_timeout_secs: parse_secs("RESEARCH_TIMEOUT_SECS", 60)?,
            shutdown_drain_secs: parse_secs("SHUTDOWN_DRAIN_SECS", 30)?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Supabase URL: {}", config.supabase_url);
        if config.database_url.is_some() {
            tracing::info!("DATABASE_URL configured: inserts go straight to Postgres");
        }
        tracing::debug!("Research function: {}", config.research_function);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn parse_secs(var: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds", var)),
        _ => Ok(default),
    }
}
