//! Rendering of artifact file contents.
//!
//! Artifact templates are [Tera](https://keats.github.io/tera/) templates.
//! The context carries the unit being written:
//!
//! - `sql` - the SQL body for this half of the unit
//! - `id` - the migration id
//! - `name` - the migration name
//! - `direction` - `up` or `down`
//!
//! Autoescaping is off; SQL is inserted verbatim.

use std::error::Error as _;

use tera::{Context, Tera};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::{Direction, MigrationId, MigrationUnit};

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "-- Write your SQL command here\n{{ sql }}";

const TEMPLATE_NAME: &str = "artifact";

// Stand-in body used to check that a template emits `sql` exactly once.
const SQL_MARKER: &str = "__graft_sql_body__";

/// Text template for migration artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactTemplate {
    text: String,
    tera: Tera,
}

impl Default for ArtifactTemplate {
    fn default() -> Self {
        Self::compile(DEFAULT_TEMPLATE).expect("default template parses")
    }
}

impl PartialEq for ArtifactTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for ArtifactTemplate {}

impl ArtifactTemplate {
    /// Create a template. Rendering it must emit the `sql` variable exactly once.
    pub fn new(text: impl Into<String>) -> MigrateResult<Self> {
        let template = Self::compile(text)?;

        let sample = MigrationUnit::new(MigrationId::generate(), "sample", SQL_MARKER, SQL_MARKER);
        let rendered = template.render(&sample, Direction::Up)?;
        match rendered.matches(SQL_MARKER).count() {
            1 => Ok(template),
            0 => Err(MigrationError::InvalidTemplate(
                "template never renders {{ sql }}".to_string(),
            )),
            n => Err(MigrationError::InvalidTemplate(format!(
                "template renders {{{{ sql }}}} {} times",
                n
            ))),
        }
    }

    fn compile(text: impl Into<String>) -> MigrateResult<Self> {
        let text = text.into();
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(TEMPLATE_NAME, &text)
            .map_err(template_error)?;
        Ok(Self { text, tera })
    }

    /// The raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render one half of a unit.
    pub fn render(&self, unit: &MigrationUnit, direction: Direction) -> MigrateResult<String> {
        let mut context = Context::new();
        context.insert("sql", unit.sql(direction));
        context.insert("id", unit.id.as_str());
        context.insert("name", &unit.name);
        context.insert("direction", direction.tag());

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(template_error)
    }
}

/// Flatten a Tera error and its causes into one message.
fn template_error(err: tera::Error) -> MigrationError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    MigrationError::InvalidTemplate(message)
}
