// A typed, three-address IR modelled on OLLIR. Every method is a flat list
// of labeled instructions; nested expressions are flattened into temporaries.

use super::symbol_table::Type;
use std::fmt;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Int32,
    Bool,
    Array(Box<IrType>),
    Object(String),
    String,
    Void,
}

impl IrType {
    /// Held in an integer slot (`iload`/`istore`).
    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::Int32 | IrType::Bool)
    }

    pub fn element(&self) -> Option<&IrType> {
        match self {
            IrType::Array(elem) => Some(elem),
            _ => None,
        }
    }
}

impl From<&Type> for IrType {
    fn from(t: &Type) -> Self {
        match t {
            Type::Int => IrType::Int32,
            Type::Boolean => IrType::Bool,
            Type::String => IrType::String,
            Type::Void => IrType::Void,
            Type::Class(name) => IrType::Object(name.clone()),
            Type::Array(elem) => IrType::Array(Box::new(IrType::from(elem.as_ref()))),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Int32 => write!(f, "i32"),
            IrType::Bool => write!(f, "bool"),
            IrType::Array(elem) => write!(f, "array.{elem}"),
            IrType::Object(name) => write!(f, "{name}"),
            IrType::String => write!(f, "String"),
            IrType::Void => write!(f, "V"),
        }
    }
}

// ============================================================================
// Operands
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarRole {
    Local,
    /// 1-based parameter position.
    Parameter(u16),
    Field,
    Temporary,
    /// The implicit receiver.
    This,
    /// A class name used as a static call target or `new` operand.
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: IrType,
    pub role: VarRole,
    /// Local slot, set once by register assignment.
    pub register: Option<u16>,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: IrType, role: VarRole) -> Self {
        Self {
            name: name.into(),
            ty,
            role,
            register: None,
        }
    }

    pub fn local(name: impl Into<String>, ty: IrType) -> Self {
        Self::new(name, ty, VarRole::Local)
    }

    pub fn temp(name: impl Into<String>, ty: IrType) -> Self {
        Self::new(name, ty, VarRole::Temporary)
    }

    pub fn this(class: &str) -> Self {
        Self::new("this", IrType::Object(class.to_string()), VarRole::This)
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, IrType::Object(name.to_string()), VarRole::Class)
    }

    /// Whether the register allocator owns this variable's slot.
    pub fn is_allocatable(&self) -> bool {
        matches!(self.role, VarRole::Local | VarRole::Temporary)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            VarRole::This => write!(f, "this"),
            VarRole::Class => write!(f, "{}", self.name),
            VarRole::Parameter(pos) => write!(f, "${pos}.{}.{}", self.name, self.ty),
            _ => write!(f, "{}.{}", self.name, self.ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal { value: i32, ty: IrType },
    Variable(Variable),
    /// `array[index]`; the index is always a literal or a variable.
    ArrayElement {
        array: Variable,
        index: Box<Operand>,
        ty: IrType,
    },
}

impl Operand {
    pub fn int(value: i32) -> Self {
        Operand::Literal {
            value,
            ty: IrType::Int32,
        }
    }

    pub fn bool(value: bool) -> Self {
        Operand::Literal {
            value: value as i32,
            ty: IrType::Bool,
        }
    }

    pub fn ty(&self) -> &IrType {
        match self {
            Operand::Literal { ty, .. } => ty,
            Operand::Variable(v) => &v.ty,
            Operand::ArrayElement { ty, .. } => ty,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Operand::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Literal or plain variable, usable anywhere an operand is.
    pub fn is_simple(&self) -> bool {
        !matches!(self, Operand::ArrayElement { .. })
    }

    /// Every variable the operand mentions, in reading order.
    pub fn variables(&self) -> Vec<&Variable> {
        match self {
            Operand::Literal { .. } => Vec::new(),
            Operand::Variable(v) => vec![v],
            Operand::ArrayElement { array, index, .. } => {
                let mut vars = vec![array];
                vars.extend(index.variables());
                vars
            }
        }
    }

    fn for_each_variable_mut(&mut self, f: &mut dyn FnMut(&mut Variable)) {
        match self {
            Operand::Literal { .. } => {}
            Operand::Variable(v) => f(v),
            Operand::ArrayElement { array, index, .. } => {
                f(array);
                index.for_each_variable_mut(f);
            }
        }
    }
}

impl From<Variable> for Operand {
    fn from(v: Variable) -> Self {
        Operand::Variable(v)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal { value, ty } => write!(f, "{value}.{ty}"),
            Operand::Variable(v) => write!(f, "{v}"),
            Operand::ArrayElement { array, index, ty } => {
                let prefix = match array.role {
                    VarRole::Parameter(pos) => format!("${pos}."),
                    _ => String::new(),
                };
                write!(f, "{prefix}{}[{index}].{ty}", array.name)
            }
        }
    }
}

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    And,
}

impl BinOp {
    pub fn result_type(&self) -> IrType {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => IrType::Int32,
            BinOp::Lt | BinOp::And => IrType::Bool,
        }
    }

    /// Type of the operands, used to tag the operator in the IR text.
    pub fn operand_type(&self) -> IrType {
        match self {
            BinOp::And => IrType::Bool,
            _ => IrType::Int32,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::And => "&&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Virtual,
    Static,
    Special,
    NewObject,
    NewArray,
    ArrayLength,
}

impl CallKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CallKind::Virtual => "invokevirtual",
            CallKind::Static => "invokestatic",
            CallKind::Special => "invokespecial",
            CallKind::NewObject | CallKind::NewArray => "new",
            CallKind::ArrayLength => "arraylength",
        }
    }
}

/// Condition of a conditional branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Binary {
        op: BinOp,
        left: Operand,
        right: Operand,
    },
    Unary {
        op: UnOp,
        operand: Operand,
    },
    /// A boolean operand tested for truth.
    Single(Operand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `dest :=.ty value`
    Assign {
        dest: Operand,
        ty: IrType,
        value: Box<Instr>,
    },
    BinaryOp {
        op: BinOp,
        left: Operand,
        right: Operand,
    },
    UnaryOp {
        op: UnOp,
        operand: Operand,
    },
    /// Method invocation, object/array allocation or `arraylength`.
    ///
    /// `target` is the receiver (virtual/special), the class (static, new
    /// object), the size (new array) or the array (length).
    Call {
        kind: CallKind,
        target: Operand,
        method: Option<String>,
        args: Vec<Operand>,
        ret: IrType,
    },
    GetField {
        object: Operand,
        field: Variable,
    },
    PutField {
        object: Operand,
        field: Variable,
        value: Operand,
    },
    CondBranch {
        cond: Condition,
        target: String,
    },
    Goto(String),
    Return {
        ty: IrType,
        value: Option<Operand>,
    },
    /// A bare operand, as an assignment value or for side effects.
    NoOp(Operand),
}

impl Instr {
    /// Type of the value the instruction leaves behind.
    pub fn result_type(&self) -> IrType {
        match self {
            Instr::Assign { ty, .. } => ty.clone(),
            Instr::BinaryOp { op, .. } => op.result_type(),
            Instr::UnaryOp { .. } => IrType::Bool,
            Instr::Call { ret, .. } => ret.clone(),
            Instr::GetField { field, .. } => field.ty.clone(),
            Instr::NoOp(op) => op.ty().clone(),
            Instr::PutField { .. }
            | Instr::CondBranch { .. }
            | Instr::Goto(_)
            | Instr::Return { .. } => IrType::Void,
        }
    }

    /// Visit every operand variable, including destinations.
    pub fn for_each_variable_mut(&mut self, f: &mut dyn FnMut(&mut Variable)) {
        match self {
            Instr::Assign { dest, value, .. } => {
                dest.for_each_variable_mut(f);
                value.for_each_variable_mut(f);
            }
            Instr::BinaryOp { left, right, .. } => {
                left.for_each_variable_mut(f);
                right.for_each_variable_mut(f);
            }
            Instr::UnaryOp { operand, .. } | Instr::NoOp(operand) => {
                operand.for_each_variable_mut(f)
            }
            Instr::Call { target, args, .. } => {
                target.for_each_variable_mut(f);
                for a in args {
                    a.for_each_variable_mut(f);
                }
            }
            Instr::GetField { object, .. } => object.for_each_variable_mut(f),
            Instr::PutField { object, value, .. } => {
                object.for_each_variable_mut(f);
                value.for_each_variable_mut(f);
            }
            Instr::CondBranch { cond, .. } => match cond {
                Condition::Binary { left, right, .. } => {
                    left.for_each_variable_mut(f);
                    right.for_each_variable_mut(f);
                }
                Condition::Unary { operand, .. } | Condition::Single(operand) => {
                    operand.for_each_variable_mut(f)
                }
            },
            Instr::Return { value, .. } => {
                if let Some(v) = value {
                    v.for_each_variable_mut(f);
                }
            }
            Instr::Goto(_) => {}
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Binary { op, left, right } => {
                write!(f, "{left} {}.{} {right}", op.symbol(), op.operand_type())
            }
            Condition::Unary { op: UnOp::Not, operand } => write!(f, "!.bool {operand}"),
            Condition::Single(operand) => write!(f, "{operand}"),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Assign { dest, ty, value } => write!(f, "{dest} :=.{ty} {value}"),
            Instr::BinaryOp { op, left, right } => {
                write!(f, "{left} {}.{} {right}", op.symbol(), op.operand_type())
            }
            Instr::UnaryOp { op: UnOp::Not, operand } => write!(f, "!.bool {operand}"),
            Instr::Call {
                kind,
                target,
                method,
                args,
                ret,
            } => {
                write!(f, "{}(", kind.keyword())?;
                match kind {
                    CallKind::NewObject => write!(f, "{}", target_name(target))?,
                    CallKind::NewArray => write!(f, "array, {target}")?,
                    _ => write!(f, "{target}")?,
                }
                if let Some(m) = method {
                    write!(f, ", \"{m}\"")?;
                }
                for a in args {
                    write!(f, ", {a}")?;
                }
                write!(f, ").{ret}")
            }
            Instr::GetField { object, field } => {
                write!(f, "getfield({object}, {field}).{}", field.ty)
            }
            Instr::PutField {
                object,
                field,
                value,
            } => write!(f, "putfield({object}, {field}, {value}).V"),
            Instr::CondBranch { cond, target } => write!(f, "if ({cond}) goto {target}"),
            Instr::Goto(label) => write!(f, "goto {label}"),
            Instr::Return { ty, value: Some(v) } => write!(f, "ret.{ty} {v}"),
            Instr::Return { ty, value: None } => write!(f, "ret.{ty}"),
            Instr::NoOp(op) => write!(f, "{op}"),
        }
    }
}

fn target_name(target: &Operand) -> String {
    match target {
        Operand::Variable(v) => v.name.clone(),
        other => other.to_string(),
    }
}

/// An instruction together with the labels that name it as a jump target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledInstr {
    pub labels: Vec<String>,
    pub instr: Instr,
}

impl LabeledInstr {
    pub fn new(instr: Instr) -> Self {
        Self {
            labels: Vec::new(),
            instr,
        }
    }
}

// ============================================================================
// Methods and classes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub is_static: bool,
    pub is_constructor: bool,
    pub params: Vec<Variable>,
    pub return_type: IrType,
    /// Declared locals followed by temporaries in creation order.
    pub locals: Vec<Variable>,
    pub instrs: Vec<LabeledInstr>,
}

impl Method {
    /// Slots taken by the receiver and the parameters.
    pub fn reserved_registers(&self) -> u16 {
        (!self.is_static) as u16 + self.params.len() as u16
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instr> {
        self.instrs.iter().map(|li| &li.instr)
    }

    pub fn for_each_variable_mut(&mut self, f: &mut dyn FnMut(&mut Variable)) {
        for p in &mut self.params {
            f(p);
        }
        for l in &mut self.locals {
            f(l);
        }
        for li in &mut self.instrs {
            li.instr.for_each_variable_mut(f);
        }
    }

    /// Highest register any variable of the method occupies.
    pub fn max_register(&self) -> Option<u16> {
        let this = (!self.is_static).then_some(0);
        self.params
            .iter()
            .chain(self.locals.iter())
            .filter_map(|v| v.register)
            .chain(this)
            .max()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassUnit {
    pub name: String,
    pub superclass: Option<String>,
    pub imports: Vec<String>,
    pub fields: Vec<Variable>,
    pub methods: Vec<Method>,
}

impl ClassUnit {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for imp in &self.imports {
            out.push(format!("import {imp};"));
        }
        if !self.imports.is_empty() {
            out.push(String::new());
        }
        match &self.superclass {
            Some(sup) => out.push(format!("{} extends {sup} {{", self.name)),
            None => out.push(format!("{} {{", self.name)),
        }
        for field in &self.fields {
            out.push(format!("    .field private {}.{};", field.name, field.ty));
        }
        for method in &self.methods {
            out.push(String::new());
            out.extend(method_lines(self, method));
        }
        out.push("}".to_string());
        out
    }
}

fn method_lines(class: &ClassUnit, m: &Method) -> Vec<String> {
    let mut out = Vec::new();
    if m.is_constructor {
        out.push(format!("    .construct {}().V {{", class.name));
    } else {
        let params: Vec<String> = m
            .params
            .iter()
            .map(|p| format!("{}.{}", p.name, p.ty))
            .collect();
        let statik = if m.is_static { "static " } else { "" };
        out.push(format!(
            "    .method public {statik}{}({}).{} {{",
            m.name,
            params.join(", "),
            m.return_type
        ));
    }
    for li in &m.instrs {
        for label in &li.labels {
            out.push(format!("    {label}:"));
        }
        out.push(format!("        {};", li.instr));
    }
    out.push("    }".to_string());
    out
}

impl fmt::Display for ClassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
