//! Metadata snapshots referenced by tracker records
//!
//! These are read-only copies of programs, program stages, category combos,
//! category options, category option combos, organisation units and tracked
//! entity types as supplied by the metadata cache. Objects are shared through
//! `Arc`; a program owns its ordered program stages and each stage keeps a
//! weak back-reference to its program.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

// =============================================================================
// Identification
// =============================================================================

/// Scheme under which an identifier refers to a metadata object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    #[default]
    Uid,
    Code,
    Name,
}

impl IdScheme {
    /// Identifier of `object` under this scheme, if it has one
    pub fn identifier_of<'a, T>(&self, object: &'a T) -> Option<&'a str>
    where
        T: Identifiable + ?Sized,
    {
        match self {
            IdScheme::Uid => Some(object.uid()),
            IdScheme::Code => object.code(),
            IdScheme::Name => object.name(),
        }
    }
}

impl fmt::Display for IdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdScheme::Uid => "UID",
            IdScheme::Code => "CODE",
            IdScheme::Name => "NAME",
        };
        f.write_str(name)
    }
}

/// Metadata object with a uid and optional code and name
pub trait Identifiable {
    fn uid(&self) -> &str;
    fn code(&self) -> Option<&str>;
    fn name(&self) -> Option<&str>;
}

/// Kind of metadata held by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Program,
    ProgramStage,
    CategoryCombo,
    CategoryOption,
    CategoryOptionCombo,
    OrganisationUnit,
    TrackedEntityType,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::Program => "Program",
            MetadataKind::ProgramStage => "ProgramStage",
            MetadataKind::CategoryCombo => "CategoryCombo",
            MetadataKind::CategoryOption => "CategoryOption",
            MetadataKind::CategoryOptionCombo => "CategoryOptionCombo",
            MetadataKind::OrganisationUnit => "OrganisationUnit",
            MetadataKind::TrackedEntityType => "TrackedEntityType",
        };
        f.write_str(name)
    }
}

macro_rules! impl_identifiable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identifiable for $ty {
                fn uid(&self) -> &str {
                    &self.uid
                }

                fn code(&self) -> Option<&str> {
                    self.code.as_deref()
                }

                fn name(&self) -> Option<&str> {
                    self.name.as_deref()
                }
            }
        )+
    };
}

// =============================================================================
// Leaf Metadata
// =============================================================================

/// Organisation unit a record is registered in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganisationUnit {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
}

impl OrganisationUnit {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            code: None,
            name: None,
        }
    }
}

/// Type of a tracked entity (e.g. person)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntityType {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
}

impl TrackedEntityType {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            code: None,
            name: None,
        }
    }
}

/// Single category option (e.g. a funding partner)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
}

impl CategoryOption {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            code: None,
            name: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Category combination attached to a program
///
/// The default combo means "no real categorisation applies".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCombo {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub is_default: bool,
}

impl CategoryCombo {
    pub fn new(uid: impl Into<String>, is_default: bool) -> Self {
        Self {
            uid: uid.into(),
            code: None,
            name: None,
            is_default,
        }
    }
}

/// Attribute option combo: one combination of options within a category combo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOptionCombo {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub category_combo: Arc<CategoryCombo>,
    pub category_options: Vec<Arc<CategoryOption>>,
}

impl CategoryOptionCombo {
    pub fn new(
        uid: impl Into<String>,
        category_combo: Arc<CategoryCombo>,
        category_options: Vec<Arc<CategoryOption>>,
    ) -> Self {
        Self {
            uid: uid.into(),
            code: None,
            name: None,
            category_combo,
            category_options,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Uids of the category options this combo is built from
    pub fn category_option_uids(&self) -> HashSet<&str> {
        self.category_options.iter().map(|co| co.uid.as_str()).collect()
    }
}

// =============================================================================
// Programs and Program Stages
// =============================================================================

/// Whether a program enrolls tracked entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgramType {
    #[default]
    WithRegistration,
    WithoutRegistration,
}

/// Program with its category combo and ordered program stages
#[derive(Debug, Clone)]
pub struct Program {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub program_type: ProgramType,
    pub category_combo: Arc<CategoryCombo>,
    pub tracked_entity_type: Option<Arc<TrackedEntityType>>,
    pub program_stages: Vec<Arc<ProgramStage>>,
}

impl Program {
    /// Start building a program that uses `category_combo`
    pub fn builder(uid: impl Into<String>, category_combo: Arc<CategoryCombo>) -> ProgramBuilder {
        ProgramBuilder {
            uid: uid.into(),
            code: None,
            name: None,
            program_type: ProgramType::WithRegistration,
            category_combo,
            tracked_entity_type: None,
            stages: Vec::new(),
        }
    }

    pub fn is_registration(&self) -> bool {
        self.program_type == ProgramType::WithRegistration
    }

    pub fn is_without_registration(&self) -> bool {
        self.program_type == ProgramType::WithoutRegistration
    }
}

/// Stage of a program; events are always recorded against a stage
#[derive(Debug, Clone)]
pub struct ProgramStage {
    pub uid: String,
    pub code: Option<String>,
    pub name: Option<String>,
    program: Weak<Program>,
}

impl ProgramStage {
    /// A stage that is not linked to any program
    ///
    /// Valid metadata never contains such a stage; it is kept so broken
    /// metadata imports can be represented faithfully.
    pub fn detached(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            code: None,
            name: None,
            program: Weak::new(),
        }
    }

    /// Program this stage belongs to, `None` for a detached stage
    pub fn program(&self) -> Option<Arc<Program>> {
        self.program.upgrade()
    }
}

impl_identifiable!(
    OrganisationUnit,
    TrackedEntityType,
    CategoryOption,
    CategoryCombo,
    CategoryOptionCombo,
    Program,
    ProgramStage,
);

/// Stage definition collected by [`ProgramBuilder`]
#[derive(Debug, Clone)]
struct StageDefinition {
    uid: String,
    code: Option<String>,
    name: Option<String>,
}

/// Builder linking a program and its stages in both directions
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    uid: String,
    code: Option<String>,
    name: Option<String>,
    program_type: ProgramType,
    category_combo: Arc<CategoryCombo>,
    tracked_entity_type: Option<Arc<TrackedEntityType>>,
    stages: Vec<StageDefinition>,
}

impl ProgramBuilder {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn program_type(mut self, program_type: ProgramType) -> Self {
        self.program_type = program_type;
        self
    }

    pub fn without_registration(self) -> Self {
        self.program_type(ProgramType::WithoutRegistration)
    }

    pub fn tracked_entity_type(mut self, tracked_entity_type: Arc<TrackedEntityType>) -> Self {
        self.tracked_entity_type = Some(tracked_entity_type);
        self
    }

    /// Append a stage; stages keep the order they are added in
    pub fn stage(self, uid: impl Into<String>) -> Self {
        self.stage_with(uid, None, None)
    }

    pub fn stage_with(
        mut self,
        uid: impl Into<String>,
        code: Option<String>,
        name: Option<String>,
    ) -> Self {
        self.stages.push(StageDefinition {
            uid: uid.into(),
            code,
            name,
        });
        self
    }

    pub fn build(self) -> Arc<Program> {
        let ProgramBuilder {
            uid,
            code,
            name,
            program_type,
            category_combo,
            tracked_entity_type,
            stages,
        } = self;

        Arc::new_cyclic(|program| Program {
            uid,
            code,
            name,
            program_type,
            category_combo,
            tracked_entity_type,
            program_stages: stages
                .into_iter()
                .map(|stage| {
                    Arc::new(ProgramStage {
                        uid: stage.uid,
                        code: stage.code,
                        name: stage.name,
                        program: program.clone(),
                    })
                })
                .collect(),
        })
    }
}
