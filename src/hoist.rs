//! Static semantics computed once at parse time
//!
//! BoundNames, VarDeclaredNames, VarScopedDeclarations and
//! LexicallyScopedDeclarations for function bodies, scripts, modules and
//! blocks, plus the parameter-list facts used by
//! FunctionDeclarationInstantiation.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::value::{CheapClone, JsString};

/// BoundNames of a binding pattern, appended to `out`.
pub fn bound_names(pattern: &Pattern, out: &mut Vec<JsString>) {
    match pattern {
        Pattern::Identifier(id) => out.push(id.name.cheap_clone()),
        Pattern::Object(obj) => {
            for prop in &obj.properties {
                match prop {
                    ObjectPatternProperty::KeyValue { value, .. } => bound_names(value, out),
                    ObjectPatternProperty::Rest(rest) => bound_names(&rest.argument, out),
                }
            }
        }
        Pattern::Array(arr) => {
            for elem in arr.elements.iter().flatten() {
                bound_names(elem, out);
            }
        }
        Pattern::Rest(rest) => bound_names(&rest.argument, out),
        Pattern::Assignment(assign) => bound_names(&assign.left, out),
        Pattern::Expression(_) => {}
    }
}

/// ContainsExpression for a parameter list: defaults or computed keys.
pub fn contains_expression(pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Identifier(_) | Pattern::Expression(_) => false,
        Pattern::Assignment(_) => true,
        Pattern::Rest(rest) => contains_expression(&rest.argument),
        Pattern::Array(arr) => arr.elements.iter().flatten().any(contains_expression),
        Pattern::Object(obj) => obj.properties.iter().any(|prop| match prop {
            ObjectPatternProperty::KeyValue { key, value, .. } => {
                key.is_computed() || contains_expression(value)
            }
            ObjectPatternProperty::Rest(rest) => contains_expression(&rest.argument),
        }),
    }
}

/// IsSimpleParameterList
pub fn is_simple_parameter_list(params: &[Pattern]) -> bool {
    params.iter().all(|p| matches!(p, Pattern::Identifier(_)))
}

struct NameList {
    names: Vec<JsString>,
    seen: FxHashSet<JsString>,
}

impl NameList {
    fn new() -> Self {
        Self {
            names: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    fn push(&mut self, name: JsString) {
        if self.seen.insert(name.cheap_clone()) {
            self.names.push(name);
        }
    }
}

/// VarDeclaredNames of a statement that is not at the top level of a
/// function: nested function declarations are lexical there.
fn collect_nested_var_names(stmt: &Statement, out: &mut NameList) {
    match stmt {
        Statement::VariableDeclaration(decl) => collect_declaration_var_names(decl, out),
        Statement::Block(block) => {
            for s in &block.body {
                collect_nested_var_names(s, out);
            }
        }
        Statement::If(s) => {
            collect_nested_var_names(&s.consequent, out);
            if let Some(alt) = &s.alternate {
                collect_nested_var_names(alt, out);
            }
        }
        Statement::For(s) => {
            if let Some(ForInit::Variable(decl)) = &s.init {
                collect_declaration_var_names(decl, out);
            }
            collect_nested_var_names(&s.body, out);
        }
        Statement::ForIn(ForInStatement { left, body, .. })
        | Statement::ForOf(ForOfStatement { left, body, .. }) => {
            if let ForInOfLeft::Variable(VariableKind::Var, pattern) = left {
                let mut names = Vec::new();
                bound_names(pattern, &mut names);
                for name in names {
                    out.push(name);
                }
            }
            collect_nested_var_names(body, out);
        }
        Statement::While(s) => collect_nested_var_names(&s.body, out),
        Statement::DoWhile(s) => collect_nested_var_names(&s.body, out),
        Statement::Try(s) => {
            for inner in &s.block.body {
                collect_nested_var_names(inner, out);
            }
            if let Some(handler) = &s.handler {
                for inner in &handler.body.body {
                    collect_nested_var_names(inner, out);
                }
            }
            if let Some(finalizer) = &s.finalizer {
                for inner in &finalizer.body {
                    collect_nested_var_names(inner, out);
                }
            }
        }
        Statement::With(s) => collect_nested_var_names(&s.body, out),
        Statement::Switch(s) => {
            for case in &s.cases {
                for inner in &case.consequent {
                    collect_nested_var_names(inner, out);
                }
            }
        }
        Statement::Labeled(s) => collect_nested_var_names(&s.body, out),
        Statement::Export(ExportDeclaration {
            kind: ExportKind::Declaration(decl),
            ..
        }) => {
            if let Statement::VariableDeclaration(v) = decl.as_ref() {
                collect_declaration_var_names(v, out);
            }
        }
        _ => {}
    }
}

/// VarDeclaredNames of a block's statements (nested `var`s only).
pub fn var_declared_names<'a>(statements: impl IntoIterator<Item = &'a Statement>) -> Vec<JsString> {
    let mut names = NameList::new();
    for stmt in statements {
        collect_nested_var_names(stmt, &mut names);
    }
    names.names
}

fn collect_declaration_var_names(decl: &VariableDeclaration, out: &mut NameList) {
    if decl.kind != VariableKind::Var {
        return;
    }
    let mut names = Vec::new();
    for d in &decl.declarations {
        bound_names(&d.id, &mut names);
    }
    for name in names {
        out.push(name);
    }
}

fn lexical_of_declaration(decl: &VariableDeclaration, out: &mut Vec<LexicalBinding>) {
    if decl.kind == VariableKind::Var {
        return;
    }
    let mut names = Vec::new();
    for d in &decl.declarations {
        bound_names(&d.id, &mut names);
    }
    let constant = decl.kind == VariableKind::Const;
    out.extend(
        names
            .into_iter()
            .map(|name| LexicalBinding { name, constant }),
    );
}

/// Unwrap labels around a function declaration (`l: function f() {}`).
fn labelled_function(stmt: &Statement) -> Option<&Rc<Function>> {
    match stmt {
        Statement::FunctionDeclaration(f) => Some(f),
        Statement::Labeled(l) => labelled_function(&l.body),
        _ => None,
    }
}

fn function_name(f: &Function) -> JsString {
    f.id
        .as_ref()
        .map(|id| id.name.cheap_clone())
        .unwrap_or_else(|| JsString::from(DEFAULT_EXPORT_BINDING))
}

/// Keep the last declaration of each name, in source order of those last
/// declarations.
fn functions_to_initialize(declared: Vec<Rc<Function>>) -> Vec<Rc<Function>> {
    let mut seen = FxHashSet::default();
    let mut result: Vec<Rc<Function>> = Vec::new();
    for f in declared.into_iter().rev() {
        if seen.insert(function_name(&f)) {
            result.push(f);
        }
    }
    result.reverse();
    result
}

/// Hoisting for a function body or a script: top-level function
/// declarations are var-scoped.
pub fn body_scope(body: &[Statement]) -> VarScope {
    let mut var_names = NameList::new();
    let mut functions = Vec::new();
    let mut lexical = Vec::new();

    for stmt in body {
        if let Some(f) = labelled_function(stmt) {
            var_names.push(function_name(f));
            functions.push(Rc::clone(f));
            continue;
        }
        match stmt {
            Statement::VariableDeclaration(decl) => {
                collect_declaration_var_names(decl, &mut var_names);
                lexical_of_declaration(decl, &mut lexical);
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    lexical.push(LexicalBinding {
                        name: id.name.cheap_clone(),
                        constant: false,
                    });
                }
            }
            other => collect_nested_var_names(other, &mut var_names),
        }
    }

    VarScope {
        var_names: var_names.names,
        functions: functions_to_initialize(functions),
        lexical,
    }
}

/// Hoisting for a module body: function declarations are lexically scoped
/// but initialized on entry, so they are reported in `functions` and not in
/// `var_names`.
pub fn module_scope(body: &[Statement]) -> VarScope {
    let mut var_names = NameList::new();
    let mut functions = Vec::new();
    let mut lexical = Vec::new();

    fn declaration(
        stmt: &Statement,
        var_names: &mut NameList,
        functions: &mut Vec<Rc<Function>>,
        lexical: &mut Vec<LexicalBinding>,
    ) {
        match stmt {
            Statement::FunctionDeclaration(f) => functions.push(Rc::clone(f)),
            Statement::ClassDeclaration(class) => lexical.push(LexicalBinding {
                name: class
                    .id
                    .as_ref()
                    .map(|id| id.name.cheap_clone())
                    .unwrap_or_else(|| JsString::from(DEFAULT_EXPORT_BINDING)),
                constant: false,
            }),
            Statement::VariableDeclaration(decl) => {
                collect_declaration_var_names(decl, var_names);
                lexical_of_declaration(decl, lexical);
            }
            other => collect_nested_var_names(other, var_names),
        }
    }

    for stmt in body {
        match stmt {
            Statement::Export(export) => match &export.kind {
                ExportKind::Declaration(decl) | ExportKind::DefaultDeclaration(decl) => {
                    declaration(decl, &mut var_names, &mut functions, &mut lexical);
                }
                ExportKind::DefaultExpression(_) => lexical.push(LexicalBinding {
                    name: JsString::from(DEFAULT_EXPORT_BINDING),
                    constant: false,
                }),
                ExportKind::Named { .. } | ExportKind::All { .. } => {}
            },
            other => declaration(other, &mut var_names, &mut functions, &mut lexical),
        }
    }

    VarScope {
        var_names: var_names.names,
        functions,
        lexical,
    }
}

/// LexicallyScopedDeclarations of a block or case block.
pub fn block_scope<'a>(statements: impl IntoIterator<Item = &'a Statement>) -> BlockScope {
    let mut scope = BlockScope::default();
    for stmt in statements {
        if let Some(f) = labelled_function(stmt) {
            scope.bindings.push(LexicalBinding {
                name: function_name(f),
                constant: false,
            });
            scope.functions.push(Rc::clone(f));
            continue;
        }
        match stmt {
            Statement::VariableDeclaration(decl) => {
                lexical_of_declaration(decl, &mut scope.bindings)
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    scope.bindings.push(LexicalBinding {
                        name: id.name.cheap_clone(),
                        constant: false,
                    });
                }
            }
            _ => {}
        }
    }
    scope
}

/// Parameter facts plus body hoisting for one function.
pub fn function_scope(
    params: &[Pattern],
    body: &FunctionBody,
    form: FunctionForm,
    uses_arguments: bool,
) -> FunctionScope {
    let mut parameter_names = Vec::new();
    for p in params {
        bound_names(p, &mut parameter_names);
    }
    let mut seen = FxHashSet::default();
    let has_duplicates = !parameter_names.iter().all(|n| seen.insert(n.cheap_clone()));
    let has_parameter_expressions = params.iter().any(contains_expression);
    let simple_parameter_list = is_simple_parameter_list(params);

    let body_scope = match body {
        FunctionBody::Block(stmts) => body_scope(stmts),
        FunctionBody::Expression(_) => VarScope::default(),
    };

    let arguments = "arguments";
    let shadowed_by_param = parameter_names.iter().any(|n| *n == arguments);
    let shadowed_by_body = body_scope.functions.iter().any(|f| function_name(f) == arguments)
        || body_scope.lexical.iter().any(|l| l.name == arguments);
    let arguments_needed = uses_arguments
        && !form.is_arrow()
        && !shadowed_by_param
        && (has_parameter_expressions || !shadowed_by_body);

    FunctionScope {
        parameter_names,
        has_duplicates,
        simple_parameter_list,
        has_parameter_expressions,
        arguments_needed,
        body: body_scope,
    }
}
