#![allow(dead_code)]

use jmm_compiler::ir::ast::{BinOp, ClassDecl, Expr, MethodDecl, Program, Stmt};
use jmm_compiler::ir::symbol_table::{MethodTable, Symbol, SymbolTable, Type};
use jmm_compiler::SemanticsResult;

pub fn int(name: &str) -> Symbol {
    Symbol::new(name, Type::Int)
}

pub fn boolean(name: &str) -> Symbol {
    Symbol::new(name, Type::Boolean)
}

pub fn int_array(name: &str) -> Symbol {
    Symbol::new(name, Type::int_array())
}

pub fn object(name: &str, class: &str) -> Symbol {
    Symbol::new(name, Type::Class(class.to_string()))
}

pub fn main_args() -> Vec<Symbol> {
    vec![Symbol::new("args", Type::Array(Box::new(Type::String)))]
}

/// A method declaration together with its locals.
pub struct MethodFixture {
    pub decl: MethodDecl,
    pub locals: Vec<Symbol>,
}

pub fn method(
    name: &str,
    params: Vec<Symbol>,
    return_type: Type,
    locals: Vec<Symbol>,
    body: Vec<Stmt>,
    ret: Option<Expr>,
) -> MethodFixture {
    MethodFixture {
        decl: MethodDecl {
            name: name.to_string(),
            is_static: false,
            params,
            return_type,
            body,
            ret,
        },
        locals,
    }
}

pub fn main_method(locals: Vec<Symbol>, body: Vec<Stmt>) -> MethodFixture {
    let mut m = method("main", main_args(), Type::Void, locals, body, None);
    m.decl.is_static = true;
    m
}

pub fn class(
    name: &str,
    imports: &[&str],
    fields: Vec<Symbol>,
    methods: Vec<MethodFixture>,
) -> SemanticsResult {
    let imports: Vec<String> = imports.iter().map(|s| s.to_string()).collect();

    let mut table = SymbolTable::new(name);
    table.imports = imports.clone();
    table.fields = fields.clone();
    for m in &methods {
        let mut mt = MethodTable::new(m.decl.name.clone(), m.decl.return_type.clone());
        mt.parameters = m.decl.params.clone();
        mt.locals = m.locals.clone();
        table.add_method(mt);
    }

    SemanticsResult {
        root: Program {
            imports,
            class: ClassDecl {
                name: name.to_string(),
                extends: None,
                fields,
                methods: methods.into_iter().map(|m| m.decl).collect(),
            },
        },
        symbol_table: table,
        reports: Vec::new(),
    }
}

fn println(arg: Expr) -> Stmt {
    Stmt::Expr(Expr::call(Expr::ident("io"), "println", vec![arg]))
}

// ── Fixtures ─────────────────────────────────────────────────────────────

/// `a = 1 + 2; io.println(a);`
pub fn scenario_a() -> SemanticsResult {
    class(
        "Hello",
        &["io"],
        vec![],
        vec![main_method(
            vec![int("a")],
            vec![
                Stmt::assign("a", Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2))),
                println(Expr::ident("a")),
            ],
        )],
    )
}

/// `int count() { x = 0; while (x < 10) { x = x + 1; } return x; }`
pub fn counting_loop() -> SemanticsResult {
    class(
        "Loop",
        &[],
        vec![],
        vec![method(
            "count",
            vec![],
            Type::Int,
            vec![int("x")],
            vec![
                Stmt::assign("x", Expr::int(0)),
                Stmt::while_loop(
                    Expr::binary(BinOp::Lt, Expr::ident("x"), Expr::int(10)),
                    Stmt::Block(vec![Stmt::assign(
                        "x",
                        Expr::binary(BinOp::Add, Expr::ident("x"), Expr::int(1)),
                    )]),
                ),
            ],
            Some(Expr::ident("x")),
        )],
    )
}

/// `a`, `b` and `c` are all live after `c = 3`.
pub fn triangle() -> SemanticsResult {
    class(
        "Tri",
        &[],
        vec![],
        vec![method(
            "tri",
            vec![],
            Type::Int,
            vec![int("a"), int("b"), int("c"), int("r")],
            vec![
                Stmt::assign("a", Expr::int(1)),
                Stmt::assign("b", Expr::int(2)),
                Stmt::assign("c", Expr::int(3)),
                Stmt::assign("r", Expr::binary(BinOp::Add, Expr::ident("a"), Expr::ident("b"))),
                Stmt::assign("r", Expr::binary(BinOp::Add, Expr::ident("r"), Expr::ident("c"))),
            ],
            Some(Expr::ident("r")),
        )],
    )
}

/// `a = 1; io.println(a);` in an instance method.
pub fn single_local() -> SemanticsResult {
    class(
        "Single",
        &["io"],
        vec![],
        vec![method(
            "run",
            vec![],
            Type::Void,
            vec![int("a")],
            vec![Stmt::assign("a", Expr::int(1)), println(Expr::ident("a"))],
            None,
        )],
    )
}

/// A class exercising fields, arrays, calls, `new` and conditionals.
///
/// ```text
/// import io;
/// class Sample {
///     int total;
///     int sum(int[] xs) {
///         int i; int s;
///         i = 0; s = 0;
///         while (i < xs.length) { s = s + xs[i]; i = i + 1; }
///         return s;
///     }
///     void store(int v) {
///         if (!(v < 0)) { total = v; } else { total = total + 1; }
///     }
///     public static void main(String[] args) {
///         Sample s; int[] a;
///         a = new int[3];
///         a[0] = 5;
///         s = new Sample();
///         io.println(s.sum(a));
///     }
/// }
/// ```
pub fn sample() -> SemanticsResult {
    let sum = method(
        "sum",
        vec![int_array("xs")],
        Type::Int,
        vec![int("i"), int("s")],
        vec![
            Stmt::assign("i", Expr::int(0)),
            Stmt::assign("s", Expr::int(0)),
            Stmt::while_loop(
                Expr::binary(BinOp::Lt, Expr::ident("i"), Expr::length(Expr::ident("xs"))),
                Stmt::Block(vec![
                    Stmt::assign(
                        "s",
                        Expr::binary(
                            BinOp::Add,
                            Expr::ident("s"),
                            Expr::index(Expr::ident("xs"), Expr::ident("i")),
                        ),
                    ),
                    Stmt::assign("i", Expr::binary(BinOp::Add, Expr::ident("i"), Expr::int(1))),
                ]),
            ),
        ],
        Some(Expr::ident("s")),
    );

    let store = method(
        "store",
        vec![int("v")],
        Type::Void,
        vec![],
        vec![Stmt::if_else(
            Expr::not(Expr::binary(BinOp::Lt, Expr::ident("v"), Expr::int(0))),
            Stmt::Block(vec![Stmt::assign("total", Expr::ident("v"))]),
            Stmt::Block(vec![Stmt::assign(
                "total",
                Expr::binary(BinOp::Add, Expr::ident("total"), Expr::int(1)),
            )]),
        )],
        None,
    );

    let main = main_method(
        vec![object("s", "Sample"), int_array("a")],
        vec![
            Stmt::assign("a", Expr::new_int_array(Expr::int(3))),
            Stmt::array_assign("a", Expr::int(0), Expr::int(5)),
            Stmt::assign("s", Expr::NewObject("Sample".to_string())),
            println(Expr::call(Expr::ident("s"), "sum", vec![Expr::ident("a")])),
        ],
    );

    class("Sample", &["io"], vec![int("total")], vec![sum, store, main])
}

/// Two `foo` overloads that differ in parameter and return type.
///
/// ```text
/// class Ov {
///     int foo(int x) { return x; }
///     boolean foo(boolean x) { return x; }
///     int run() { int r; r = this.foo(1); return r; }
///     boolean flag() { return this.foo(true); }
/// }
/// ```
pub fn overloads() -> SemanticsResult {
    class(
        "Ov",
        &[],
        vec![],
        vec![
            method("foo", vec![int("x")], Type::Int, vec![], vec![], Some(Expr::ident("x"))),
            method("foo", vec![boolean("x")], Type::Boolean, vec![], vec![], Some(Expr::ident("x"))),
            method(
                "run",
                vec![],
                Type::Int,
                vec![int("r")],
                vec![Stmt::assign("r", Expr::call(Expr::This, "foo", vec![Expr::int(1)]))],
                Some(Expr::ident("r")),
            ),
            method(
                "flag",
                vec![],
                Type::Boolean,
                vec![],
                vec![],
                Some(Expr::call(Expr::This, "foo", vec![Expr::Bool(true)])),
            ),
        ],
    )
}

/// Boolean operators, reference arrays, object fields and a static call
/// through a dotted import.
///
/// ```text
/// import a.b.Util;
/// class Rich {
///     Rich other; int size; int count;
///     int walk(int n, boolean b) {
///         int i; boolean flag;
///         i = n;
///         while (0 < i && b) { i = i - 1; }
///         flag = !b;
///         flag = flag && b;
///         return i;
///     }
///     void link() { other = new Rich(); count = size; }
///     Rich peer() { return other; }
///     static String first(String[] args) { return args[0]; }
///     public static void main(String[] args) { Util.show(args.length); }
/// }
/// ```
pub fn rich() -> SemanticsResult {
    let walk = method(
        "walk",
        vec![int("n"), boolean("b")],
        Type::Int,
        vec![int("i"), boolean("flag")],
        vec![
            Stmt::assign("i", Expr::ident("n")),
            Stmt::while_loop(
                Expr::binary(
                    BinOp::And,
                    Expr::binary(BinOp::Lt, Expr::int(0), Expr::ident("i")),
                    Expr::ident("b"),
                ),
                Stmt::Block(vec![Stmt::assign(
                    "i",
                    Expr::binary(BinOp::Sub, Expr::ident("i"), Expr::int(1)),
                )]),
            ),
            Stmt::assign("flag", Expr::not(Expr::ident("b"))),
            Stmt::assign(
                "flag",
                Expr::binary(BinOp::And, Expr::ident("flag"), Expr::ident("b")),
            ),
        ],
        Some(Expr::ident("i")),
    );

    let link = method(
        "link",
        vec![],
        Type::Void,
        vec![],
        vec![
            Stmt::assign("other", Expr::NewObject("Rich".to_string())),
            Stmt::assign("count", Expr::ident("size")),
        ],
        None,
    );

    let peer = method(
        "peer",
        vec![],
        Type::Class("Rich".to_string()),
        vec![],
        vec![],
        Some(Expr::ident("other")),
    );

    let mut first = method(
        "first",
        main_args(),
        Type::String,
        vec![],
        vec![],
        Some(Expr::index(Expr::ident("args"), Expr::int(0))),
    );
    first.decl.is_static = true;

    let main = main_method(
        vec![],
        vec![Stmt::Expr(Expr::call(
            Expr::ident("Util"),
            "show",
            vec![Expr::length(Expr::ident("args"))],
        ))],
    );

    class(
        "Rich",
        &["a.b.Util"],
        vec![object("other", "Rich"), int("size"), int("count")],
        vec![walk, link, peer, first, main],
    )
}

/// Every fixture that compiles.
pub fn all_valid() -> Vec<SemanticsResult> {
    vec![
        scenario_a(),
        counting_loop(),
        triangle(),
        single_local(),
        sample(),
        overloads(),
        rich(),
    ]
}

/// Instruction lines of one method in the Jasmin text, without directives.
pub fn jasmin_body<'a>(jasmin: &'a str, method_header: &str) -> Vec<&'a str> {
    let mut lines = jasmin.lines().skip_while(|l| !l.starts_with(method_header));
    lines.next();
    lines
        .take_while(|l| *l != ".end method")
        .filter(|l| !l.trim_start().starts_with(".limit"))
        .map(str::trim)
        .collect()
}
