use anyhow::{Context, Result};
use serde::Deserialize;

use crate::board::PieceKind;
use crate::projector::Perspective;

pub const ENV_PREFIX: &str = "CLICKBOARD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Piece a pawn becomes when it reaches the last rank through a click.
    pub auto_promotion: PieceKind,
    /// Starting position; `None` is the standard start.
    pub start_fen: Option<String>,
    pub perspective: Perspective,
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_promotion: PieceKind::Queen,
            start_fen: None,
            perspective: Perspective::White,
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Reads `<name>.{toml,json,yaml,...}` if present, then `CLICKBOARD_*` variables.
    pub fn load(name: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration '{}'", name))?;

        let config: SessionConfig = settings
            .try_deserialize()
            .context("invalid configuration")?;

        if config.auto_promotion == PieceKind::Pawn || config.auto_promotion == PieceKind::King {
            anyhow::bail!("auto_promotion must be a queen, rook, bishop or knight");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.auto_promotion, PieceKind::Queen);
        assert_eq!(config.start_fen, None);
        assert_eq!(config.perspective, Perspective::White);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = SessionConfig::load("definitely-not-a-clickboard-config").unwrap();
        assert_eq!(config.auto_promotion, PieceKind::Queen);
        assert_eq!(config.perspective, Perspective::White);
    }

    #[test]
    fn reads_a_toml_file() {
        let dir = std::env::temp_dir().join(format!("clickboard-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.toml");
        std::fs::write(
            &path,
            "auto_promotion = \"knight\"\nperspective = \"black\"\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let name = dir.join("session");
        let config = SessionConfig::load(name.to_str().unwrap()).unwrap();
        assert_eq!(config.auto_promotion, PieceKind::Knight);
        assert_eq!(config.perspective, Perspective::Black);
        assert_eq!(config.log_level, "debug");

        std::fs::write(&path, "auto_promotion = \"king\"\n").unwrap();
        assert!(SessionConfig::load(name.to_str().unwrap()).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
