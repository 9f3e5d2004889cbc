//! AST printing.
//!
//! Two renderings of the same tree:
//!
//! - [`canonical`] — compact prefix notation used by tests to assert parse
//!   results, e.g. `+(+(1 2) 3)` or `data(decldata(foo mut-int) (42))`.
//!   Operator applications print as `sym(args…)`, definitions print their
//!   declared pieces explicitly.
//! - [`source`] — valid, fully parenthesized surface syntax. Feeding the
//!   output back through the lexer and parser yields a structurally
//!   identical tree, which the round-trip tests rely on.

use veld_base::Interner;

use crate::ast::{DataDef, Expr, ExprKind, FunDef, Op, TypeExpr, TypeExprKind, TypeName};
use crate::object::StorageDuration;
use crate::types::FundaType;

/// Renders `expr` in the canonical prefix notation.
pub fn canonical(expr: &Expr, interner: &Interner) -> String {
    let mut out = String::new();
    write_canonical(&mut out, expr, interner);
    out
}

/// Renders `expr` as reparsable surface syntax.
pub fn source(expr: &Expr, interner: &Interner) -> String {
    let mut out = String::new();
    write_source(&mut out, expr, interner);
    out
}

fn write_canonical(out: &mut String, expr: &Expr, names: &Interner) {
    match &expr.kind {
        ExprKind::Nop => out.push_str("nop"),
        ExprKind::Number { value, ty } => write_number_canonical(out, *value, ty),
        ExprKind::Symbol { name } => out.push_str(names.resolve(*name)),
        ExprKind::Cast { ty, arg } => {
            write_type_canonical(out, ty, names);
            out.push('(');
            write_canonical(out, arg, names);
            out.push(')');
        }
        ExprKind::Operator { op, args } => {
            out.push_str(op.symbol());
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_canonical(out, arg, names);
            }
            out.push(')');
        }
        ExprKind::Seq { operands } => {
            out.push_str(";(");
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_canonical(out, operand, names);
            }
            out.push(')');
        }
        ExprKind::Block { body, .. } => {
            out.push_str("block(");
            write_canonical(out, body, names);
            out.push(')');
        }
        ExprKind::If { cond, then, els } => {
            out.push_str("if(");
            write_canonical(out, cond, names);
            out.push(' ');
            write_canonical(out, then, names);
            if let Some(els) = els {
                out.push(' ');
                write_canonical(out, els, names);
            }
            out.push(')');
        }
        ExprKind::Loop { cond, body } => {
            out.push_str("while(");
            write_canonical(out, cond, names);
            out.push(' ');
            write_canonical(out, body, names);
            out.push(')');
        }
        ExprKind::Return { value } => {
            out.push_str("return(");
            write_canonical(out, value, names);
            out.push(')');
        }
        ExprKind::Call { callee, args } => {
            write_canonical(out, callee, names);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_canonical(out, arg, names);
            }
            out.push(')');
        }
        ExprKind::DataDef(def) => write_data_def_canonical(out, def, names),
        ExprKind::FunDef(def) => write_fun_def_canonical(out, def, names),
    }
}

fn write_data_def_canonical(out: &mut String, def: &DataDef, names: &Interner) {
    out.push_str("data(decldata(");
    out.push_str(names.resolve(def.name));
    out.push(' ');
    if def.storage != StorageDuration::Local {
        out.push_str(def.storage.name());
        out.push('/');
    }
    write_type_canonical(out, &def.declared_ty, names);
    out.push_str(") ");
    if def.do_not_init {
        out.push_str("noinit");
    } else {
        out.push('(');
        for (i, arg) in def.ctor_args.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            write_canonical(out, arg, names);
        }
        out.push(')');
    }
    out.push(')');
}

fn write_fun_def_canonical(out: &mut String, def: &FunDef, names: &Interner) {
    out.push_str("fun(declfun(");
    out.push_str(names.resolve(def.name));
    out.push_str(" (");
    for (i, param) in def.params.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push('(');
        out.push_str(names.resolve(param.name));
        out.push(' ');
        write_type_canonical(out, &param.declared_ty, names);
        out.push(')');
    }
    out.push_str(") ");
    write_type_canonical(out, &def.ret_ty, names);
    out.push_str(") ");
    write_canonical(out, &def.body, names);
    out.push(')');
}

fn write_number_canonical(out: &mut String, value: f64, ty: &TypeExpr) {
    match funda_of(ty) {
        Some(FundaType::Int) => out.push_str(&format!("{}", value as i64)),
        Some(FundaType::Double) => out.push_str(&format!("{value:?}")),
        Some(funda) => out.push_str(&format!("{}{}", value as i64, funda.name())),
        None => out.push_str(&format!("{value:?}")),
    }
}

fn write_type_canonical(out: &mut String, ty: &TypeExpr, names: &Interner) {
    match &ty.kind {
        TypeExprKind::Symbol(TypeName::Funda(funda)) => out.push_str(funda.name()),
        TypeExprKind::Symbol(TypeName::Named(name)) => out.push_str(names.resolve(*name)),
        TypeExprKind::Quali { quals, target } => {
            if quals.is_mut() {
                out.push_str("mut-");
            }
            write_type_canonical(out, target, names);
        }
        TypeExprKind::Ptr { pointee } => {
            out.push('*');
            write_type_canonical(out, pointee, names);
        }
        TypeExprKind::ClassDef { name, members } => {
            out.push_str("class(");
            out.push_str(names.resolve(*name));
            for member in members {
                out.push(' ');
                out.push('(');
                out.push_str(names.resolve(member.name));
                out.push(' ');
                write_type_canonical(out, &member.declared_ty, names);
                out.push(')');
            }
            out.push(')');
        }
    }
}

// ---- surface printing ------------------------------------------------------

fn write_source(out: &mut String, expr: &Expr, names: &Interner) {
    match &expr.kind {
        ExprKind::Nop => out.push_str("nop"),
        ExprKind::Number { value, ty } => write_number_source(out, *value, ty),
        ExprKind::Symbol { name } => out.push_str(names.resolve(*name)),
        ExprKind::Cast { ty, arg } => {
            write_type_source(out, ty, names);
            out.push('(');
            write_source(out, arg, names);
            out.push(')');
        }
        ExprKind::Operator { op, args } => {
            out.push('(');
            if args.len() == 1 {
                out.push_str(unary_symbol(*op));
                write_source(out, &args[0], names);
            } else {
                write_source(out, &args[0], names);
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                write_source(out, &args[1], names);
            }
            out.push(')');
        }
        ExprKind::Seq { operands } => {
            out.push('(');
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                write_source(out, operand, names);
            }
            out.push(')');
        }
        ExprKind::Block { body, .. } => {
            out.push('(');
            write_source(out, body, names);
            out.push(')');
        }
        ExprKind::If { cond, then, els } => {
            out.push_str("if ");
            write_source(out, cond, names);
            out.push_str(": ");
            write_source(out, then, names);
            if let Some(els) = els {
                out.push_str(" else ");
                write_source(out, els, names);
            }
            out.push_str(" $");
        }
        ExprKind::Loop { cond, body } => {
            out.push_str("while ");
            write_source(out, cond, names);
            out.push_str(": ");
            write_source(out, body, names);
            out.push_str(" $");
        }
        ExprKind::Return { value } => {
            if matches!(value.kind, ExprKind::Nop) {
                out.push_str("return");
            } else {
                out.push_str("return ");
                write_source(out, value, names);
            }
        }
        ExprKind::Call { callee, args } => {
            write_source(out, callee, names);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_source(out, arg, names);
            }
            out.push(')');
        }
        ExprKind::DataDef(def) => write_data_def_source(out, def, names),
        ExprKind::FunDef(def) => write_fun_def_source(out, def, names),
    }
}

fn unary_symbol(op: Op) -> &'static str {
    match op {
        Op::Deref => "*",
        other => other.symbol(),
    }
}

fn write_number_source(out: &mut String, value: f64, ty: &TypeExpr) {
    match funda_of(ty) {
        Some(FundaType::Int) => out.push_str(&format!("{}", value as i64)),
        Some(FundaType::Bool) => out.push_str(if value == 0.0 { "false" } else { "true" }),
        Some(FundaType::Char) => {
            let code = value as u8;
            if code.is_ascii_graphic() || code == b' ' {
                out.push('\'');
                if code == b'\'' || code == b'\\' {
                    out.push('\\');
                }
                out.push(code as char);
                out.push('\'');
            } else {
                out.push_str(&format!("{code}char"));
            }
        }
        _ => out.push_str(&format!("{value:?}")),
    }
}

fn write_data_def_source(out: &mut String, def: &DataDef, names: &Interner) {
    // `var` carries the mut qualifier of an otherwise unannotated type
    let (quals, base) = match &def.declared_ty.kind {
        TypeExprKind::Quali { quals, target } => (*quals, target.as_ref()),
        _ => (crate::types::Qualifiers::NONE, &def.declared_ty),
    };
    let inferred = matches!(
        base.kind,
        TypeExprKind::Symbol(TypeName::Funda(FundaType::Infer))
    );
    if inferred && quals.is_mut() {
        out.push_str("var ");
    } else {
        out.push_str("val ");
    }
    out.push_str(names.resolve(def.name));
    if !inferred || def.storage == StorageDuration::Static {
        out.push_str(" :");
        if def.storage == StorageDuration::Static {
            out.push_str("static ");
        }
        if !inferred {
            if quals.is_mut() {
                out.push_str("mut ");
            }
            write_type_source(out, base, names);
        }
    }
    if def.do_not_init {
        out.push_str(" = noinit");
    } else if let Some(init) = def.ctor_args.first() {
        out.push_str(" = ");
        write_source(out, init, names);
    }
    out.push_str(" $");
}

fn write_fun_def_source(out: &mut String, def: &FunDef, names: &Interner) {
    out.push_str("fun ");
    out.push_str(names.resolve(def.name));
    out.push_str(": (");
    for (i, param) in def.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(names.resolve(param.name));
        out.push(':');
        write_type_source(out, &param.declared_ty, names);
    }
    out.push_str(") ");
    write_type_source(out, &def.ret_ty, names);
    out.push_str(" = ");
    write_source(out, &def.body, names);
    out.push_str(" $");
}

fn write_type_source(out: &mut String, ty: &TypeExpr, names: &Interner) {
    match &ty.kind {
        TypeExprKind::Symbol(TypeName::Funda(funda)) => out.push_str(funda.name()),
        TypeExprKind::Symbol(TypeName::Named(name)) => out.push_str(names.resolve(*name)),
        TypeExprKind::Quali { quals, target } => {
            if quals.is_mut() {
                out.push_str("mut ");
            }
            write_type_source(out, target, names);
        }
        TypeExprKind::Ptr { pointee } => {
            out.push('*');
            write_type_source(out, pointee, names);
        }
        TypeExprKind::ClassDef { name, .. } => out.push_str(names.resolve(*name)),
    }
}

fn funda_of(ty: &TypeExpr) -> Option<FundaType> {
    match &ty.kind {
        TypeExprKind::Symbol(TypeName::Funda(funda)) => Some(*funda),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_base::Span;

    #[test]
    fn numbers_print_with_their_type_suffix() {
        let names = Interner::new();
        let int = Expr::number(42.0, FundaType::Int, Span::default());
        let boolean = Expr::number(1.0, FundaType::Bool, Span::default());
        let chr = Expr::number(97.0, FundaType::Char, Span::default());
        assert_eq!(canonical(&int, &names), "42");
        assert_eq!(canonical(&boolean, &names), "1bool");
        assert_eq!(canonical(&chr, &names), "97char");
    }

    #[test]
    fn doubles_keep_a_decimal_point() {
        let names = Interner::new();
        let d = Expr::number(42.0, FundaType::Double, Span::default());
        assert_eq!(canonical(&d, &names), "42.0");
    }

    #[test]
    fn source_bools_print_as_keywords() {
        let names = Interner::new();
        let t = Expr::number(1.0, FundaType::Bool, Span::default());
        assert_eq!(source(&t, &names), "true");
    }

    #[test]
    fn source_chars_print_quoted_when_printable() {
        let names = Interner::new();
        let a = Expr::number(97.0, FundaType::Char, Span::default());
        let nl = Expr::number(10.0, FundaType::Char, Span::default());
        assert_eq!(source(&a, &names), "'a'");
        assert_eq!(source(&nl, &names), "10char");
    }

    #[test]
    fn operator_chains_print_in_prefix_form() {
        let names = Interner::new();
        let a = Expr::number(1.0, FundaType::Int, Span::default());
        let b = Expr::number(2.0, FundaType::Int, Span::default());
        let sum = Expr::new(
            ExprKind::Operator {
                op: Op::Add,
                args: vec![a, b],
            },
            Span::default(),
        );
        assert_eq!(canonical(&sum, &names), "+(1 2)");
        assert_eq!(source(&sum, &names), "(1 + 2)");
    }
}
