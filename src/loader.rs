//! Reads the configuration object out of a `tailwind.config.js` module.
//!
//! The module is parsed, never executed: the exported expression has to be a
//! literal built from strings, numbers, booleans, `null`, arrays, objects and
//! `require(...)` calls, optionally routed through top-level `const`
//! bindings.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::Arc;
use swc_core::common::{FileName, Globals, SourceMap, Span, Spanned, GLOBALS};
use swc_core::ecma::ast::*;
use swc_core::ecma::parser::{parse_file_as_module, EsSyntax, Syntax};

use crate::errors::{ConfigError, Result};

/// Bound on `const a = b` indirection
const MAX_DEPTH: usize = 64;

/// Parse `source` and return the exported configuration object as JSON
pub fn parse_js_module(source: &str, name: &str) -> Result<Value> {
    let source_map = Arc::new(SourceMap::default());
    let source_file = source_map.new_source_file(
        FileName::Custom(name.to_string()).into(),
        source.to_string(),
    );

    let mut recovered = vec![];
    let module = GLOBALS.set(&Globals::new(), || {
        parse_file_as_module(
            &source_file,
            Syntax::Es(EsSyntax::default()),
            EsVersion::latest(),
            None,
            &mut recovered,
        )
    });

    let module = match module {
        Ok(module) => module,
        Err(e) => return Err(syntax_error(&source_map, name, e)),
    };
    if let Some(e) = recovered.into_iter().next() {
        return Err(syntax_error(&source_map, name, e));
    }

    let evaluator = Evaluator::new(&module, &source_map, name);
    let exported = evaluator
        .exported()
        .ok_or_else(|| ConfigError::parse(name, "no `module.exports = ...` or `export default ...` found"))?;

    let value = evaluator.eval(exported, 0)?;
    if !value.is_object() {
        return Err(evaluator.error(exported.span(), "exported configuration is not an object"));
    }

    tracing::trace!(name, "evaluated configuration module");
    Ok(value)
}

fn syntax_error(source_map: &SourceMap, name: &str, e: swc_core::ecma::parser::error::Error) -> ConfigError {
    let loc = source_map.lookup_char_pos(e.span().lo);
    ConfigError::parse(
        name,
        format!("syntax error at {}:{}: {}", loc.line, loc.col_display + 1, e.kind().msg()),
    )
}

fn text(value: &str) -> String {
    value.to_string()
}

/// Turns literal expressions into JSON values
struct Evaluator<'a> {
    module: &'a Module,
    source_map: &'a SourceMap,
    name: &'a str,
    bindings: HashMap<String, &'a Expr>,
}

impl<'a> Evaluator<'a> {
    fn new(module: &'a Module, source_map: &'a SourceMap, name: &'a str) -> Self {
        let mut bindings = HashMap::new();

        for item in &module.body {
            let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = item else {
                continue;
            };
            for decl in &var.decls {
                if let (Pat::Ident(binding), Some(init)) = (&decl.name, &decl.init) {
                    bindings.insert(text(&binding.id.sym), &**init);
                }
            }
        }

        Self {
            module,
            source_map,
            name,
            bindings,
        }
    }

    /// The expression assigned to `module.exports` or exported by default
    fn exported(&self) -> Option<&'a Expr> {
        let module: &'a Module = self.module;
        for item in &module.body {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                    return Some(&*export.expr);
                }
                ModuleItem::Stmt(Stmt::Expr(stmt)) => {
                    if let Expr::Assign(assign) = &*stmt.expr {
                        if is_module_exports(&assign.left) {
                            return Some(&*assign.right);
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn error(&self, span: Span, message: &str) -> ConfigError {
        let loc = self.source_map.lookup_char_pos(span.lo);
        ConfigError::parse(
            self.name,
            format!("{} at {}:{}", message, loc.line, loc.col_display + 1),
        )
    }

    fn eval(&self, expr: &Expr, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(self.error(expr.span(), "binding chain too deep"));
        }

        match expr {
            Expr::Paren(paren) => self.eval(&paren.expr, depth),
            Expr::Lit(Lit::Str(s)) => Ok(Value::String(text(&s.value))),
            Expr::Lit(Lit::Bool(b)) => Ok(Value::Bool(b.value)),
            Expr::Lit(Lit::Null(_)) => Ok(Value::Null),
            Expr::Lit(Lit::Num(n)) => self.number(n.value, n.span),
            Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
                Expr::Lit(Lit::Num(n)) => self.number(-n.value, unary.span),
                _ => Err(self.error(unary.span, "unsupported unary expression")),
            },
            Expr::Tpl(tpl) => self.template(tpl),
            Expr::Array(array) => self.array(array, depth),
            Expr::Object(object) => self.object(object, depth),
            Expr::Call(call) => self.call(call, depth),
            Expr::Ident(ident) => self.ident(ident, depth),
            other => Err(self.error(
                other.span(),
                "unsupported expression; only literals, arrays, objects and require() calls are allowed",
            )),
        }
    }

    fn number(&self, value: f64, span: Span) -> Result<Value> {
        if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
            if value >= 0.0 {
                return Ok(Value::from(value as u64));
            }
            return Ok(Value::from(value as i64));
        }
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| self.error(span, "number is not representable"))
    }

    fn template(&self, tpl: &Tpl) -> Result<Value> {
        if !tpl.exprs.is_empty() {
            return Err(self.error(tpl.span, "template literals with substitutions are not supported"));
        }
        let mut out = String::new();
        for quasi in &tpl.quasis {
            match &quasi.cooked {
                Some(cooked) => out.push_str(&text(cooked)),
                None => out.push_str(&text(&quasi.raw)),
            }
        }
        Ok(Value::String(out))
    }

    fn array(&self, array: &ArrayLit, depth: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(array.elems.len());
        for elem in &array.elems {
            let Some(elem) = elem else {
                return Err(self.error(array.span, "array holes are not supported"));
            };
            if let Some(spread) = elem.spread {
                return Err(self.error(spread, "spread elements are not supported"));
            }
            items.push(self.eval(&elem.expr, depth)?);
        }
        Ok(Value::Array(items))
    }

    fn object(&self, object: &ObjectLit, depth: usize) -> Result<Value> {
        let mut map = Map::new();
        for prop in &object.props {
            let PropOrSpread::Prop(prop) = prop else {
                return Err(self.error(object.span, "object spread is not supported"));
            };
            match &**prop {
                Prop::KeyValue(kv) => {
                    let key = self.key(&kv.key)?;
                    map.insert(key, self.eval(&kv.value, depth)?);
                }
                Prop::Shorthand(ident) => {
                    map.insert(text(&ident.sym), self.ident(ident, depth)?);
                }
                other => {
                    return Err(self.error(other.span(), "methods and accessors are not supported"));
                }
            }
        }
        Ok(Value::Object(map))
    }

    fn key(&self, key: &PropName) -> Result<String> {
        match key {
            PropName::Ident(ident) => Ok(text(&ident.sym)),
            PropName::Str(s) => Ok(text(&s.value)),
            PropName::Num(n) => Ok(n.value.to_string()),
            other => Err(self.error(other.span(), "computed keys are not supported")),
        }
    }

    fn ident(&self, ident: &Ident, depth: usize) -> Result<Value> {
        if &*ident.sym == "undefined" {
            return Ok(Value::Null);
        }
        match self.bindings.get(&*ident.sym) {
            Some(init) => self.eval(init, depth + 1),
            None => Err(self.error(ident.span, &format!("unknown identifier `{}`", ident.sym))),
        }
    }

    /// `require("x")` evaluates to `"x"`, `require("x")(opts)` to
    /// `{ "name": "x", "options": opts }`
    fn call(&self, call: &CallExpr, depth: usize) -> Result<Value> {
        let Callee::Expr(callee) = &call.callee else {
            return Err(self.error(call.span, "unsupported call"));
        };

        if let Some(module) = self.require_target(callee, call)? {
            return Ok(Value::String(module));
        }

        if let Expr::Call(inner) = &**callee {
            let Callee::Expr(inner_callee) = &inner.callee else {
                return Err(self.error(call.span, "unsupported call"));
            };
            if let Some(module) = self.require_target(inner_callee, inner)? {
                let options = match call.args.first() {
                    Some(arg) => self.eval(&arg.expr, depth)?,
                    None => Value::Null,
                };
                let mut map = Map::new();
                map.insert("name".to_string(), Value::String(module));
                if !options.is_null() {
                    map.insert("options".to_string(), options);
                }
                return Ok(Value::Object(map));
            }
        }

        Err(self.error(call.span, "only require() calls are supported"))
    }

    fn require_target(&self, callee: &Expr, call: &CallExpr) -> Result<Option<String>> {
        match callee {
            Expr::Ident(ident) if &*ident.sym == "require" => {}
            _ => return Ok(None),
        }
        match call.args.first().map(|arg| &*arg.expr) {
            Some(Expr::Lit(Lit::Str(s))) if call.args.len() == 1 => Ok(Some(text(&s.value))),
            _ => Err(self.error(call.span, "require() takes a single string literal")),
        }
    }
}

fn is_module_exports(target: &AssignTarget) -> bool {
    match target {
        AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
            matches!(&*member.obj, Expr::Ident(obj) if &*obj.sym == "module")
                && matches!(&member.prop, MemberProp::Ident(prop) if &*prop.sym == "exports")
        }
        _ => false,
    }
}
