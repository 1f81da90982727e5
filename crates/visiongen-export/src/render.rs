//! Java source rendering.
//!
//! Turns a [`CompilationUnit`] into text with four-space indentation.
//! Call statements longer than [`MAX_LINE_WIDTH`] are broken onto one
//! argument per line.
//!
//! This is a pure function with no I/O; it returns a `String`.

use std::fmt::Write;

use crate::ast::{ClassDecl, CompilationUnit, Expr, FieldDecl, Stmt};

/// Column limit for a single-line call statement.
pub const MAX_LINE_WIDTH: usize = 100;

const INDENT: &str = "    ";

/// Render a compilation unit as Java source.
#[must_use]
pub fn to_java(unit: &CompilationUnit) -> String {
    let mut out = String::new();

    for line in &unit.header {
        let _ = writeln!(out, "// {line}");
    }
    if let Some(package) = &unit.package {
        let _ = writeln!(out, "package {package};");
    }
    if !unit.header.is_empty() || unit.package.is_some() {
        out.push('\n');
    }

    for import in &unit.imports {
        let _ = writeln!(out, "import {import};");
    }
    out.push('\n');

    write_class(&mut out, &unit.class);
    out
}

fn write_class(out: &mut String, class: &ClassDecl) {
    let _ = writeln!(out, "public class {} extends {} {{", class.name, class.superclass);
    out.push('\n');

    for field in &class.fields {
        let _ = writeln!(out, "{INDENT}{}", field_decl(field));
    }

    let entry = &class.entry;
    out.push('\n');
    let _ = writeln!(out, "{INDENT}@Override");
    let _ = writeln!(out, "{INDENT}public Mat processFrame(Mat {}) {{", entry.param);
    let _ = writeln!(out, "{INDENT}{INDENT}{} = {};", entry.frame_field, entry.param);
    for call in &entry.invocations {
        let _ = writeln!(out, "{INDENT}{INDENT}{}({});", call.method, call.argument);
    }
    out.push('\n');
    let _ = writeln!(out, "{INDENT}{INDENT}return {};", entry.frame_field);
    let _ = writeln!(out, "{INDENT}}}");

    for method in &class.methods {
        out.push('\n');
        let _ = writeln!(out, "{INDENT}private void {}(Mat {}) {{", method.name, method.param);
        let body_indent = INDENT.repeat(2);
        for stmt in &method.body {
            write_stmt(out, stmt, &body_indent);
        }
        let _ = writeln!(out, "{INDENT}}}");
    }

    out.push_str("}\n");
}

fn field_decl(field: &FieldDecl) -> String {
    let modifiers = if field.is_final { "public final" } else { "public" };
    match &field.init {
        Some(init) => format!("{modifiers} {} {} = {};", field.ty, field.name, expr(init)),
        None => format!("{modifiers} {} {};", field.ty, field.name),
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, indent: &str) {
    match stmt {
        Stmt::Local { ty, name, init } => {
            let _ = writeln!(out, "{indent}{ty} {name} = {};", expr(init));
        }
        Stmt::Assign { target, value } => {
            let _ = writeln!(out, "{indent}{} = {};", expr(target), expr(value));
        }
        Stmt::Expr(e) => {
            let inline = expr(e);
            match e {
                Expr::Call {
                    target,
                    method,
                    args,
                } if indent.len() + inline.len() + 1 > MAX_LINE_WIDTH => {
                    let _ = writeln!(out, "{indent}{}(", callee(target.as_deref(), method));
                    for (i, arg) in args.iter().enumerate() {
                        let sep = if i + 1 < args.len() { "," } else { "" };
                        let _ = writeln!(out, "{indent}{INDENT}{}{sep}", expr(arg));
                    }
                    let _ = writeln!(out, "{indent});");
                }
                _ => {
                    let _ = writeln!(out, "{indent}{inline};");
                }
            }
        }
        Stmt::Comment(text) => {
            let _ = writeln!(out, "{indent}// {text}");
        }
        Stmt::Blank => out.push('\n'),
    }
}

fn callee(target: Option<&str>, method: &str) -> String {
    target.map_or_else(|| method.to_owned(), |t| format!("{t}.{method}"))
}

fn arg_list(args: &[Expr]) -> String {
    args.iter().map(expr).collect::<Vec<_>>().join(", ")
}

/// Render an expression on a single line.
fn expr(e: &Expr) -> String {
    match e {
        Expr::This(name) => format!("this.{name}"),
        Expr::Ident(name) => name.clone(),
        Expr::Const(name) => (*name).to_owned(),
        Expr::Int(v) => v.to_string(),
        Expr::Double(v) => format!("{v:?}"),
        Expr::New { class, args } => format!("new {class}({})", arg_list(args)),
        Expr::Call {
            target,
            method,
            args,
        } => format!("{}({})", callee(target.as_deref(), method), arg_list(args)),
    }
}
