//! JVM instruction types and their Jasmin text.
//!
//! This module defines the typed instruction set (`JvmInstr`) the emitter
//! produces, each instruction's effect on the operand stack, and the
//! structured output items (`JasminItem`) of a method body.

use std::fmt;

// ============================================================================
// Invocation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Virtual,
    Static,
    Special,
}

impl InvokeKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            InvokeKind::Virtual => "invokevirtual",
            InvokeKind::Static => "invokestatic",
            InvokeKind::Special => "invokespecial",
        }
    }
}

// ============================================================================
// Typed JVM instruction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmInstr {
    // ── Constants and locals ────────────────────────────────────────────
    /// Integer constant; printed in its most compact form.
    Iconst(i32),
    Iload(u16),
    Istore(u16),
    Aload(u16),
    Astore(u16),
    /// `iinc reg delta`
    Iinc { reg: u16, delta: i32 },

    // ── Arithmetic ──────────────────────────────────────────────────────
    Iadd,
    Isub,
    Imul,
    Idiv,
    Iand,
    Ixor,

    // ── Control flow ────────────────────────────────────────────────────
    IfIcmplt(String),
    Ifne(String),
    Ifeq(String),
    Goto(String),

    // ── Objects and arrays ──────────────────────────────────────────────
    New(String),
    /// `newarray int`
    NewIntArray,
    /// `anewarray <class>`
    ANewArray(String),
    ArrayLength,
    Iaload,
    Iastore,
    Aaload,
    Aastore,
    GetField {
        class: String,
        name: String,
        descriptor: String,
    },
    PutField {
        class: String,
        name: String,
        descriptor: String,
    },
    Pop,

    // ── Calls and returns ───────────────────────────────────────────────
    Invoke {
        kind: InvokeKind,
        class: String,
        name: String,
        descriptor: String,
        /// Argument count, not counting the receiver.
        args: u16,
        returns_value: bool,
    },
    Ireturn,
    Areturn,
    Return,
}

impl JvmInstr {
    /// `(popped, pushed)` operand-stack slots.
    pub fn stack_effect(&self) -> (u16, u16) {
        use JvmInstr::*;
        match self {
            Iconst(_) | Iload(_) | Aload(_) => (0, 1),
            Istore(_) | Astore(_) => (1, 0),
            Iinc { .. } => (0, 0),
            Iadd | Isub | Imul | Idiv | Iand | Ixor => (2, 1),
            IfIcmplt(_) => (2, 0),
            Ifne(_) | Ifeq(_) => (1, 0),
            Goto(_) => (0, 0),
            New(_) => (0, 1),
            NewIntArray | ANewArray(_) | ArrayLength => (1, 1),
            Iaload | Aaload => (2, 1),
            Iastore | Aastore => (3, 0),
            GetField { .. } => (1, 1),
            PutField { .. } => (2, 0),
            Pop => (1, 0),
            Invoke {
                kind,
                args,
                returns_value,
                ..
            } => {
                let receiver = (*kind != InvokeKind::Static) as u16;
                (args + receiver, *returns_value as u16)
            }
            Ireturn | Areturn => (1, 0),
            Return => (0, 0),
        }
    }

    /// Label this instruction may jump to.
    pub fn branch_target(&self) -> Option<&str> {
        match self {
            JvmInstr::IfIcmplt(l) | JvmInstr::Ifne(l) | JvmInstr::Ifeq(l) | JvmInstr::Goto(l) => {
                Some(l)
            }
            _ => None,
        }
    }

    /// Control never falls through to the next instruction.
    pub fn ends_block(&self) -> bool {
        matches!(
            self,
            JvmInstr::Goto(_) | JvmInstr::Ireturn | JvmInstr::Areturn | JvmInstr::Return
        )
    }
}

fn slot(f: &mut fmt::Formatter<'_>, op: &str, reg: u16) -> fmt::Result {
    if reg <= 3 {
        write!(f, "{op}_{reg}")
    } else {
        write!(f, "{op} {reg}")
    }
}

impl fmt::Display for JvmInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use JvmInstr::*;
        match self {
            Iconst(-1) => write!(f, "iconst_m1"),
            Iconst(c @ 0..=5) => write!(f, "iconst_{c}"),
            Iconst(c @ -128..=127) => write!(f, "bipush {c}"),
            Iconst(c @ -32768..=32767) => write!(f, "sipush {c}"),
            Iconst(c) => write!(f, "ldc {c}"),
            Iload(r) => slot(f, "iload", *r),
            Istore(r) => slot(f, "istore", *r),
            Aload(r) => slot(f, "aload", *r),
            Astore(r) => slot(f, "astore", *r),
            Iinc { reg, delta } => write!(f, "iinc {reg} {delta}"),
            Iadd => write!(f, "iadd"),
            Isub => write!(f, "isub"),
            Imul => write!(f, "imul"),
            Idiv => write!(f, "idiv"),
            Iand => write!(f, "iand"),
            Ixor => write!(f, "ixor"),
            IfIcmplt(l) => write!(f, "if_icmplt {l}"),
            Ifne(l) => write!(f, "ifne {l}"),
            Ifeq(l) => write!(f, "ifeq {l}"),
            Goto(l) => write!(f, "goto {l}"),
            New(class) => write!(f, "new {class}"),
            NewIntArray => write!(f, "newarray int"),
            ANewArray(class) => write!(f, "anewarray {class}"),
            ArrayLength => write!(f, "arraylength"),
            Iaload => write!(f, "iaload"),
            Iastore => write!(f, "iastore"),
            Aaload => write!(f, "aaload"),
            Aastore => write!(f, "aastore"),
            GetField {
                class,
                name,
                descriptor,
            } => write!(f, "getfield {class}/{name} {descriptor}"),
            PutField {
                class,
                name,
                descriptor,
            } => write!(f, "putfield {class}/{name} {descriptor}"),
            Pop => write!(f, "pop"),
            Invoke {
                kind,
                class,
                name,
                descriptor,
                ..
            } => write!(f, "{} {class}/{name}{descriptor}", kind.mnemonic()),
            Ireturn => write!(f, "ireturn"),
            Areturn => write!(f, "areturn"),
            Return => write!(f, "return"),
        }
    }
}

// ============================================================================
// Method body items
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JasminItem {
    Label(String),
    Instr(JvmInstr),
}

impl fmt::Display for JasminItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JasminItem::Label(l) => write!(f, "{l}:"),
            JasminItem::Instr(i) => write!(f, "  {i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_pick_compact_forms() {
        let cases = [
            (-1, "iconst_m1"),
            (0, "iconst_0"),
            (5, "iconst_5"),
            (6, "bipush 6"),
            (-128, "bipush -128"),
            (128, "sipush 128"),
            (-32768, "sipush -32768"),
            (32768, "ldc 32768"),
        ];
        for (c, expected) in cases {
            assert_eq!(JvmInstr::Iconst(c).to_string(), expected);
        }
    }

    #[test]
    fn low_registers_use_short_forms() {
        assert_eq!(JvmInstr::Iload(3).to_string(), "iload_3");
        assert_eq!(JvmInstr::Iload(4).to_string(), "iload 4");
        assert_eq!(JvmInstr::Astore(0).to_string(), "astore_0");
    }

    #[test]
    fn invoke_pops_receiver_and_args() {
        let call = JvmInstr::Invoke {
            kind: InvokeKind::Virtual,
            class: "Foo".into(),
            name: "bar".into(),
            descriptor: "(II)I".into(),
            args: 2,
            returns_value: true,
        };
        assert_eq!(call.stack_effect(), (3, 1));
        assert_eq!(call.to_string(), "invokevirtual Foo/bar(II)I");
    }
}
