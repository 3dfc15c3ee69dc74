use serde::{Deserialize, Serialize};

/// Declared return type of a function or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeHint {
    Int,
    Str,
    Bool,
    Class(String),
}

impl From<String> for TypeHint {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => TypeHint::Int,
            "string" | "str" => TypeHint::Str,
            "bool" | "boolean" => TypeHint::Bool,
            _ => TypeHint::Class(name),
        }
    }
}

impl From<TypeHint> for String {
    fn from(hint: TypeHint) -> Self {
        hint.to_string()
    }
}

impl std::fmt::Display for TypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeHint::Int => write!(f, "int"),
            TypeHint::Str => write!(f, "string"),
            TypeHint::Bool => write!(f, "bool"),
            TypeHint::Class(name) => write!(f, "{}", name),
        }
    }
}
