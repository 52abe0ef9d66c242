//! `.env` values flow through figment's env provider.
//!
//! Kept in its own test binary: `dotenvy` writes to the process environment
//! and nothing restores it afterwards.

use figment::Jail;
use gloss_config::GlossConfig;

#[test]
fn dotenv_file_sets_config_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            ".env",
            "GLOSSARY_GENERAL__IMPORTER_NAME=dotenv-importer\nGLOSSARY_DATABASE__BUSY_TIMEOUT_MS=750\n",
        )?;

        let config = GlossConfig::load_with_dotenv().expect("config loads");
        assert_eq!(config.general.importer_name, "dotenv-importer");
        assert_eq!(config.database.busy_timeout_ms, 750);
        Ok(())
    });
}
