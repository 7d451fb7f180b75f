use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type SymbolId = Uuid;
pub type ChangeId = Uuid;

/// Derive the deterministic id for a symbol from its declaration site.
///
/// Ids are stable across re-parses of unchanged code: the same file, name,
/// kind and declaration line always hash to the same UUIDv5.
pub fn symbol_id(file_path: &str, name: &str, kind: SymbolKind, line: u32) -> SymbolId {
    let key = format!("{}:{}:{}:{}", file_path, name, kind, line);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Module,
    Variable,
    Constant,
    Parameter,
    TypeAlias,
}

impl SymbolKind {
    /// Structural weight of the symbol kind in impact scoring. Widely
    /// visible structural symbols (classes, modules) amplify the score;
    /// locals like parameters dampen it.
    pub fn impact_multiplier(&self) -> f64 {
        match self {
            SymbolKind::Class => 1.5,
            SymbolKind::Module => 1.4,
            SymbolKind::Interface => 1.3,
            SymbolKind::Function => 1.2,
            SymbolKind::Method => 1.1,
            SymbolKind::TypeAlias => 1.0,
            SymbolKind::Constant => 0.9,
            SymbolKind::Variable => 0.8,
            SymbolKind::Parameter => 0.5,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Module => "module",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Parameter => "parameter",
            SymbolKind::TypeAlias => "type_alias",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" => Ok(SymbolKind::Function),
            "method" => Ok(SymbolKind::Method),
            "class" => Ok(SymbolKind::Class),
            "interface" => Ok(SymbolKind::Interface),
            "module" => Ok(SymbolKind::Module),
            "variable" => Ok(SymbolKind::Variable),
            "constant" => Ok(SymbolKind::Constant),
            "parameter" => Ok(SymbolKind::Parameter),
            "type_alias" => Ok(SymbolKind::TypeAlias),
            other => Err(format!("unknown symbol kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    Inheritance,
    FunctionCall,
    MethodCall,
    VariableAccess,
    TypeReference,
    Annotation,
    Instantiation,
    Composition,
    Aggregation,
    Unknown,
}

impl DependencyKind {
    /// How tightly a change propagates across an edge of this kind, in [0, 1].
    /// Inheritance couples hardest; annotations barely at all.
    pub fn strength(&self) -> f64 {
        match self {
            DependencyKind::Inheritance => 1.0,
            DependencyKind::Import => 0.9,
            DependencyKind::Composition => 0.85,
            DependencyKind::FunctionCall => 0.8,
            DependencyKind::MethodCall => 0.75,
            DependencyKind::TypeReference => 0.7,
            DependencyKind::Instantiation => 0.65,
            DependencyKind::Aggregation => 0.6,
            DependencyKind::VariableAccess => 0.5,
            DependencyKind::Unknown => 0.4,
            DependencyKind::Annotation => 0.3,
        }
    }
}

impl Default for DependencyKind {
    fn default() -> Self {
        DependencyKind::Unknown
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyKind::Import => "import",
            DependencyKind::Inheritance => "inheritance",
            DependencyKind::FunctionCall => "function_call",
            DependencyKind::MethodCall => "method_call",
            DependencyKind::VariableAccess => "variable_access",
            DependencyKind::TypeReference => "type_reference",
            DependencyKind::Annotation => "annotation",
            DependencyKind::Instantiation => "instantiation",
            DependencyKind::Composition => "composition",
            DependencyKind::Aggregation => "aggregation",
            DependencyKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "import" => Ok(DependencyKind::Import),
            "inheritance" => Ok(DependencyKind::Inheritance),
            "function_call" => Ok(DependencyKind::FunctionCall),
            "method_call" => Ok(DependencyKind::MethodCall),
            "variable_access" => Ok(DependencyKind::VariableAccess),
            "type_reference" => Ok(DependencyKind::TypeReference),
            "annotation" => Ok(DependencyKind::Annotation),
            "instantiation" => Ok(DependencyKind::Instantiation),
            "composition" => Ok(DependencyKind::Composition),
            "aggregation" => Ok(DependencyKind::Aggregation),
            _ => Ok(DependencyKind::Unknown),
        }
    }
}

/// What happened to a symbol, as reported at ingestion or assumed for an
/// on-demand what-if analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Moved,
    SignatureChanged,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Moved => "moved",
            ChangeKind::SignatureChanged => "signature_changed",
        };
        write!(f, "{}", s)
    }
}

/// Coarse severity bucket assigned to a change when it is logged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl ImpactLevel {
    /// Bucket a change by kind and by how many dependents it reaches.
    pub fn classify(kind: ChangeKind, affected: usize) -> Self {
        let base = match kind {
            ChangeKind::Deleted | ChangeKind::SignatureChanged => ImpactLevel::High,
            ChangeKind::Moved | ChangeKind::Modified => ImpactLevel::Medium,
            ChangeKind::Added => ImpactLevel::Low,
        };
        if affected > 10 {
            ImpactLevel::Critical
        } else if affected > 3 {
            std::cmp::max(base, ImpactLevel::High)
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file_path: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            column,
        }
    }
}
