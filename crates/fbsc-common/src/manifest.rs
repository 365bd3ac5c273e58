use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const MANIFEST_FILE: &str = "Fbsc.toml";

/// The parsed `Fbsc.toml` project manifest.
#[derive(Debug, Clone)]
pub struct FbscManifest {
    pub project: ProjectSection,
    pub output: OutputSection,
    pub diagnostics: DiagnosticsSection,
    /// The directory containing the manifest file.
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    /// Schema files compiled when no input is given on the command line,
    /// relative to the manifest directory.
    #[serde(default)]
    pub schemas: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    /// Directory for generated `.fields.json` files, relative to the manifest.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: None,
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticsSection {
    #[serde(default)]
    pub deny_warnings: bool,
}

#[derive(Deserialize)]
struct RawManifest {
    project: ProjectSection,
    #[serde(default)]
    output: OutputSection,
    #[serde(default)]
    diagnostics: DiagnosticsSection,
}

/// Errors that can occur when loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("no Fbsc.toml found (searched from {0})")]
    NotFound(String),
    #[error("failed to read Fbsc.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid Fbsc.toml: {0}")]
    ParseError(String),
    #[error("invalid Fbsc.toml: [project] name must not be empty")]
    EmptyProjectName,
    #[error("invalid Fbsc.toml: schema '{0}' must be an .fbs file")]
    NotASchema(String),
}

impl FbscManifest {
    /// Schema paths resolved against the manifest directory.
    pub fn schema_paths(&self) -> Vec<PathBuf> {
        self.project
            .schemas
            .iter()
            .map(|p| self.root_dir.join(p))
            .collect()
    }

    /// Output directory resolved against the manifest directory.
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output.directory.as_ref().map(|d| self.root_dir.join(d))
    }
}

/// Walk up from `start_dir` looking for `Fbsc.toml`.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate a manifest from a file path.
pub fn load_manifest(path: &Path) -> Result<FbscManifest, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    let root_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    parse_manifest(&content, root_dir)
}

/// Parse and validate a manifest from a string.
pub fn parse_manifest(content: &str, root_dir: PathBuf) -> Result<FbscManifest, ManifestError> {
    let raw: RawManifest =
        toml::from_str(content).map_err(|e| ManifestError::ParseError(e.to_string()))?;

    if raw.project.name.trim().is_empty() {
        return Err(ManifestError::EmptyProjectName);
    }
    for schema in &raw.project.schemas {
        if schema.extension().and_then(|e| e.to_str()) != Some("fbs") {
            return Err(ManifestError::NotASchema(schema.display().to_string()));
        }
    }

    Ok(FbscManifest {
        project: raw.project,
        output: raw.output,
        diagnostics: raw.diagnostics,
        root_dir,
    })
}

/// Find and load the manifest, searching upward from `start_dir`.
pub fn find_and_load_manifest(start_dir: &Path) -> Result<FbscManifest, ManifestError> {
    let manifest_path = find_manifest(start_dir)
        .ok_or_else(|| ManifestError::NotFound(start_dir.display().to_string()))?;
    load_manifest(&manifest_path)
}
