//! Migration artifact storage.
//!
//! A migration unit lives on disk as two plain text files in one folder:
//!
//! ```text
//! migrations/
//! ├── 20231215120000_create_users_up.sql
//! ├── 20231215120000_create_users_down.sql
//! ├── 20231216090000_add_posts_up.sql
//! └── 20231216090000_add_posts_down.sql
//! ```

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::{Direction, MigrationId, MigrationUnit};
use crate::template::ArtifactTemplate;

/// Default artifact file extension.
pub const DEFAULT_EXTENSION: &str = "sql";

static ARTIFACT_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<id>[^_]+)_(?P<name>.+)_(?P<direction>up|down)$")
        .expect("artifact stem pattern is valid")
});

/// A file read from the migrations folder, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArtifact {
    /// File name without directory.
    pub file_name: String,
    /// Full file content.
    pub content: String,
}

impl RawArtifact {
    /// Create a raw artifact.
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// The parts recovered from an artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// Migration id.
    pub id: MigrationId,
    /// Migration name.
    pub name: String,
    /// Which half of the unit this file holds.
    pub direction: Direction,
}

impl ArtifactName {
    /// Parse `<id>_<name>_<direction>.<ext>`.
    ///
    /// Returns `Ok(None)` for files that are not artifacts at all (wrong
    /// extension or no `_up`/`_down` suffix), and an error for files that look
    /// like artifacts but break the grammar.
    pub fn parse(file_name: &str, extension: &str) -> MigrateResult<Option<Self>> {
        let Some(stem) = file_name
            .strip_suffix(extension)
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return Ok(None);
        };
        if !(stem.ends_with("_up") || stem.ends_with("_down")) {
            return Ok(None);
        }

        let caps = ARTIFACT_STEM.captures(stem).ok_or_else(|| {
            MigrationError::invalid_artifact(file_name, "expected <id>_<name>_<direction>")
        })?;

        let id = MigrationId::parse(&caps["id"]).map_err(|_| {
            MigrationError::invalid_artifact(file_name, "id must be ASCII digits")
        })?;
        let direction = Direction::from_tag(&caps["direction"]).ok_or_else(|| {
            MigrationError::invalid_artifact(file_name, "unknown direction")
        })?;

        Ok(Some(Self {
            id,
            name: caps["name"].to_string(),
            direction,
        }))
    }

    /// Render the file name for an artifact.
    pub fn file_name(id: &MigrationId, name: &str, direction: Direction, extension: &str) -> String {
        format!("{}_{}_{}.{}", id, name, direction.tag(), extension)
    }
}

/// Check that a migration name can be embedded in a file name.
pub fn validate_name(name: &str) -> MigrateResult<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(MigrationError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Paths of a written artifact pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Apply artifact.
    pub up: PathBuf,
    /// Rollback artifact.
    pub down: PathBuf,
}

/// Migration artifact reader/writer.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    migrations_dir: PathBuf,
    extension: String,
    template: ArtifactTemplate,
}

impl ArtifactStore {
    /// Create a store for a folder with the default extension and template.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            template: ArtifactTemplate::default(),
        }
    }

    /// Use a different file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Use a different artifact template.
    pub fn with_template(mut self, template: ArtifactTemplate) -> Self {
        self.template = template;
        self
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Get the artifact extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Fail unless the migrations folder exists. The folder is never created.
    pub fn ensure_exists(&self) -> MigrateResult<()> {
        match fs::metadata(&self.migrations_dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(MigrationError::FolderNotFound(self.migrations_dir.clone())),
        }
    }

    /// Write both artifacts of a unit.
    ///
    /// The up file is written first. If writing the down file fails the up
    /// file stays behind; a retry generates a new id, so the leftover never
    /// merges with a later unit.
    pub fn write(&self, unit: &MigrationUnit) -> MigrateResult<ArtifactPaths> {
        self.ensure_exists()?;
        validate_name(&unit.name)?;

        let paths = ArtifactPaths {
            up: self.path_for(unit, Direction::Up),
            down: self.path_for(unit, Direction::Down),
        };

        let up = self.template.render(unit, Direction::Up)?;
        let down = self.template.render(unit, Direction::Down)?;
        self.write_file(&paths.up, &up)?;
        self.write_file(&paths.down, &down)?;

        debug!(id = %unit.id, up = %paths.up.display(), down = %paths.down.display(), "Wrote migration artifacts");
        Ok(paths)
    }

    fn path_for(&self, unit: &MigrationUnit, direction: Direction) -> PathBuf {
        self.migrations_dir.join(ArtifactName::file_name(
            &unit.id,
            &unit.name,
            direction,
            &self.extension,
        ))
    }

    fn write_file(&self, path: &Path, content: &str) -> MigrateResult<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// List the names of the regular files in the migrations folder, sorted.
    ///
    /// File contents are not read. Names that are not valid UTF-8 are skipped.
    pub fn list(&self) -> MigrateResult<Vec<String>> {
        let mut names: Vec<String> = self
            .files()?
            .into_iter()
            .map(|(file_name, _)| file_name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// List every file in the migrations folder with its content.
    ///
    /// Sub-directories are skipped. Files that cannot be read are skipped with
    /// a warning instead of failing the listing. An artifact whose content is
    /// not valid UTF-8 fails the listing; any other file with such content is
    /// ignored.
    pub fn read(&self) -> MigrateResult<Vec<RawArtifact>> {
        let mut artifacts = Vec::new();
        for (file_name, path) in self.files()? {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Error reading migration file, skipping");
                    continue;
                }
            };

            match String::from_utf8(bytes) {
                Ok(content) => artifacts.push(RawArtifact { file_name, content }),
                Err(_) if self.is_artifact_name(&file_name) => {
                    return Err(MigrationError::invalid_artifact(file_name, "not valid UTF-8"));
                }
                Err(_) => debug!(file = %file_name, "Ignoring non UTF-8 file"),
            }
        }

        artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(artifacts)
    }

    /// Whether a file name claims to be an artifact, well-formed or not.
    fn is_artifact_name(&self, file_name: &str) -> bool {
        !matches!(ArtifactName::parse(file_name, &self.extension), Ok(None))
    }

    fn files(&self) -> MigrateResult<Vec<(String, PathBuf)>> {
        let entries = match fs::read_dir(&self.migrations_dir) {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Err(MigrationError::FolderNotFound(self.migrations_dir.clone()));
            }
            Err(e) => return Err(MigrationError::Io(e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(file_name) => files.push((file_name, path)),
                Err(_) => warn!(path = %path.display(), "Skipping file with non UTF-8 name"),
            }
        }
        Ok(files)
    }
}
