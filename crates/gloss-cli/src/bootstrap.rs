use anyhow::Context;
use gloss_config::GlossConfig;

use crate::cli::GlobalFlags;

/// Load `.env` and the layered config, then apply `--db` on top.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<GlossConfig> {
    let mut config =
        GlossConfig::load_with_dotenv().context("failed to load glossary configuration")?;
    if let Some(path) = &flags.db {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::load_config;
    use crate::cli::{GlobalFlags, OutputFormat};

    fn flags(db: Option<&str>) -> GlobalFlags {
        GlobalFlags {
            format: OutputFormat::Json,
            limit: None,
            quiet: false,
            verbose: false,
            db: db.map(str::to_string),
        }
    }

    #[test]
    fn db_flag_overrides_env() {
        Jail::expect_with(|jail| {
            jail.set_env("GLOSSARY_DATABASE__PATH", "from-env.db");
            let config = load_config(&flags(Some("from-flag.db"))).expect("config should load");
            assert_eq!(config.database.path, "from-flag.db");
            Ok(())
        });
    }

    #[test]
    fn env_used_without_flag() {
        Jail::expect_with(|jail| {
            jail.set_env("GLOSSARY_DATABASE__PATH", "from-env.db");
            let config = load_config(&flags(None)).expect("config should load");
            assert_eq!(config.database.path, "from-env.db");
            Ok(())
        });
    }
}
