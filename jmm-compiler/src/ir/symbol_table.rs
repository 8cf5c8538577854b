use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A source-level type as recorded by semantic analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Int,
    Boolean,
    String,
    Void,
    /// A user-defined or imported class, by simple name.
    Class(String),
    Array(Box<Type>),
}

impl Type {
    pub fn int_array() -> Self {
        Type::Array(Box::new(Type::Int))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// Element type of an array, or `None` for scalars.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Boolean => write!(f, "boolean"),
            Type::String => write!(f, "String"),
            Type::Void => write!(f, "void"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Per-method scope: parameters in declaration order, locals, return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTable {
    pub name: String,
    pub return_type: Type,
    #[serde(default)]
    pub parameters: Vec<Symbol>,
    #[serde(default)]
    pub locals: Vec<Symbol>,
}

impl MethodTable {
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
            locals: Vec::new(),
        }
    }

    pub fn local(&self, name: &str) -> Option<&Symbol> {
        self.locals.iter().find(|s| s.name == name)
    }

    /// Parameter with its 1-based position.
    pub fn parameter(&self, name: &str) -> Option<(u16, &Symbol)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
            .map(|(i, s)| (i as u16 + 1, s))
    }

    pub fn signature(&self) -> String {
        let types: Vec<Type> = self.parameters.iter().map(|p| p.ty.clone()).collect();
        method_signature(&self.name, &types)
    }
}

/// Canonical method key: `name(int, int[])`.
pub fn method_signature(name: &str, params: &[Type]) -> String {
    let types: Vec<String> = params.iter().map(Type::to_string).collect();
    format!("{name}({})", types.join(", "))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub class_name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    /// Fully qualified imports, e.g. `java.util.List`.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub fields: Vec<Symbol>,
    /// Keyed by canonical signature.
    #[serde(default)]
    pub methods: BTreeMap<String, MethodTable>,
}

impl SymbolTable {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn add_method(&mut self, method: MethodTable) {
        self.methods.insert(method.signature(), method);
    }

    pub fn method(&self, signature: &str) -> Option<&MethodTable> {
        self.methods.get(signature)
    }

    /// First method with the given name, in signature order.
    pub fn method_by_name(&self, name: &str) -> Option<&MethodTable> {
        self.methods.values().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|s| s.name == name)
    }

    /// Fully qualified import whose last segment is `class`.
    pub fn import_for(&self, class: &str) -> Option<&str> {
        self.imports
            .iter()
            .map(String::as_str)
            .find(|imp| imp.rsplit('.').next() == Some(class))
    }

    pub fn is_imported(&self, class: &str) -> bool {
        self.import_for(class).is_some()
    }

    /// Look a name up the way method bodies see it: locals, then
    /// parameters, then fields.
    pub fn lookup<'a>(&'a self, method: &'a MethodTable, name: &str) -> Option<&'a Symbol> {
        method
            .local(name)
            .or_else(|| method.parameter(name).map(|(_, s)| s))
            .or_else(|| self.field(name))
    }
}
