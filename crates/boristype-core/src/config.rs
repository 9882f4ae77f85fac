use crate::errors::CompilationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default project file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "btconfig.json";

/// Compiler options that control output layout and emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Output directory for compiled files (required to emit)
    #[serde(default)]
    pub out_dir: Option<String>,

    /// Directory the output tree mirrors (default: the common input root)
    #[serde(default)]
    pub root_dir: Option<String>,

    /// Emit non-ASCII characters in string literals as `\uXXXX` escapes (default: false)
    #[serde(default)]
    pub escape_non_ascii: bool,

    /// Copy matched files that are not scripts to the output directory (default: false)
    #[serde(default)]
    pub include_non_ts_files: bool,

    /// Prefix every output file with a UTF-8 byte-order mark (default: true)
    #[serde(default = "default_true")]
    pub emit_bom: bool,

    /// Skip files not yet started once one file fails (default: false)
    #[serde(default)]
    pub abort_on_error: bool,

    /// Pretty-print diagnostics (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            out_dir: None,
            root_dir: None,
            escape_non_ascii: false,
            include_non_ts_files: false,
            emit_bom: true,
            abort_on_error: false,
            pretty: true,
        }
    }
}

/// Main compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Compiler options
    #[serde(default)]
    pub compiler_options: CompilerOptions,

    /// Files to include (glob patterns)
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Files to exclude (glob patterns)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_include() -> Vec<String> {
    vec!["src/**/*.ts".to_string(), "src/**/*.js".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/build/**".to_string()]
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            compiler_options: CompilerOptions::default(),
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

/// Settings given on the command line, applied on top of the project file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub out_dir: Option<String>,
    pub root_dir: Option<String>,
    pub escape_non_ascii: Option<bool>,
    pub include_non_ts_files: Option<bool>,
    pub emit_bom: Option<bool>,
    pub abort_on_error: Option<bool>,
    pub pretty: Option<bool>,
}

impl CompilerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, CompilationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CompilationError> {
        serde_json::from_str(content).map_err(|e| CompilationError::ConfigError(e.to_string()))
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), CompilationError> {
        let mut config = CompilerConfig::default();
        config.compiler_options.out_dir = Some("build".to_string());
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| CompilationError::ConfigError(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        let options = &mut self.compiler_options;
        if let Some(out_dir) = &overrides.out_dir {
            options.out_dir = Some(out_dir.clone());
        }
        if let Some(root_dir) = &overrides.root_dir {
            options.root_dir = Some(root_dir.clone());
        }
        if let Some(value) = overrides.escape_non_ascii {
            options.escape_non_ascii = value;
        }
        if let Some(value) = overrides.include_non_ts_files {
            options.include_non_ts_files = value;
        }
        if let Some(value) = overrides.emit_bom {
            options.emit_bom = value;
        }
        if let Some(value) = overrides.abort_on_error {
            options.abort_on_error = value;
        }
        if let Some(value) = overrides.pretty {
            options.pretty = value;
        }
    }

    /// Checks the settings a batch build cannot run without
    pub fn validate_for_build(&self) -> Result<(), CompilationError> {
        match self.compiler_options.out_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => Ok(()),
            _ => Err(CompilationError::ConfigError(
                "`compilerOptions.outDir` must be set to emit files".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert!(config.compiler_options.emit_bom);
        assert!(!config.compiler_options.escape_non_ascii);
        assert!(config.compiler_options.out_dir.is_none());
        assert_eq!(config.include.len(), 2);
    }

    #[test]
    fn test_serialize_config() {
        let config = CompilerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("compilerOptions"));
        assert!(json.contains("emitBom"));
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "compilerOptions": {
                "outDir": "dist",
                "escapeNonAscii": true,
                "emitBom": false
            },
            "include": ["lib/**/*.ts"]
        }"#;
        let config = CompilerConfig::from_json(json).unwrap();
        assert_eq!(config.compiler_options.out_dir.as_deref(), Some("dist"));
        assert!(config.compiler_options.escape_non_ascii);
        assert!(!config.compiler_options.emit_bom);
        assert_eq!(config.include, vec!["lib/**/*.ts".to_string()]);
        assert_eq!(config.exclude, default_exclude());
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = CompilerConfig::default();
        config.merge(&CliOverrides {
            out_dir: Some("out".to_string()),
            emit_bom: Some(false),
            ..Default::default()
        });
        assert_eq!(config.compiler_options.out_dir.as_deref(), Some("out"));
        assert!(!config.compiler_options.emit_bom);
        assert!(config.compiler_options.pretty);
    }

    #[test]
    fn test_missing_out_dir_is_rejected() {
        let config = CompilerConfig::default();
        assert!(matches!(
            config.validate_for_build(),
            Err(CompilationError::ConfigError(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            CompilerConfig::from_json("{ not json"),
            Err(CompilationError::ConfigError(_))
        ));
    }

    #[test]
    fn test_init_file_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        CompilerConfig::init_file(&path).unwrap();
        let loaded = CompilerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.compiler_options.out_dir.as_deref(), Some("build"));
    }
}
