//! Tests for the parser
//!
//! These tests verify the AST shape, the static semantics recorded on it and
//! the early errors reported for JavaScript source with TypeScript
//! annotations.

#![allow(clippy::unwrap_used, clippy::panic)]

use ecmavm::ast::{
    ArrayElement, AssignmentTarget, BinaryOp, ClassMember, ExportKind, Expression, ForInOfLeft,
    FunctionBody, FunctionForm, FunctionKind, ImportSpecifier, LiteralValue, LogicalOp,
    MemberProperty, MethodKind, ObjectProperty, ObjectPropertyKey, Pattern, Program, SourceType,
    Statement, VariableKind,
};
use ecmavm::parser::{parse_module, parse_script, Parser};
use ecmavm::string_dict::StringDict;

fn parse(source: &str) -> Program {
    let mut dict = StringDict::new();
    Parser::new(source, &mut dict).unwrap().parse_program().unwrap()
}

fn parse_mod(source: &str) -> Program {
    let mut dict = StringDict::new();
    parse_module(source, &mut dict).unwrap()
}

/// The syntax error message for a script that must not parse.
fn script_error(source: &str) -> String {
    let mut dict = StringDict::new();
    match parse_script(source, &mut dict) {
        Ok(_) => panic!("expected a syntax error for {:?}", source),
        Err(e) => e.to_string(),
    }
}

fn module_error(source: &str) -> String {
    let mut dict = StringDict::new();
    match parse_module(source, &mut dict) {
        Ok(_) => panic!("expected a syntax error for {:?}", source),
        Err(e) => e.to_string(),
    }
}

/// The expression of the only statement in `source`.
fn expr(prog: &Program) -> &Expression {
    match prog.body.first() {
        Some(Statement::Expression(e)) => e.expression.unparenthesized(),
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

fn names(list: &[ecmavm::JsString]) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_variable_declaration() {
    let prog = parse("let x = 1, y; const z = 2; var w;");
    assert_eq!(prog.body.len(), 3);
    let Statement::VariableDeclaration(decl) = &prog.body[0] else {
        panic!("Expected VariableDeclaration");
    };
    assert_eq!(decl.kind, VariableKind::Let);
    assert_eq!(decl.declarations.len(), 2);
    assert!(decl.declarations[1].init.is_none());
}

#[test]
fn test_operator_precedence() {
    let prog = parse("1 + 2 * 3 ** 2;");
    let Expression::Binary(add) = expr(&prog) else {
        panic!("Expected binary expression");
    };
    assert_eq!(add.operator, BinaryOp::Add);
    let Expression::Binary(mul) = add.right.as_ref() else {
        panic!("Expected multiplication on the right");
    };
    assert_eq!(mul.operator, BinaryOp::Mul);
    let Expression::Binary(exp) = mul.right.as_ref() else {
        panic!("Expected exponentiation");
    };
    assert_eq!(exp.operator, BinaryOp::Exp);
}

#[test]
fn test_exponent_is_right_associative() {
    let prog = parse("2 ** 3 ** 2;");
    let Expression::Binary(outer) = expr(&prog) else {
        panic!("Expected binary expression");
    };
    assert!(matches!(outer.left.as_ref(), Expression::Literal(_)));
    assert!(matches!(outer.right.as_ref(), Expression::Binary(_)));
}

#[test]
fn test_logical_and_nullish() {
    let prog = parse("a ?? (b || c);");
    let Expression::Logical(l) = expr(&prog) else {
        panic!("Expected logical expression");
    };
    assert_eq!(l.operator, LogicalOp::NullishCoalescing);
    assert!(script_error("a ?? b || c;").contains("SyntaxError"));
    assert!(script_error("a || b ?? c;").contains("SyntaxError"));
}

#[test]
fn test_member_and_call() {
    let prog = parse("a.b[c](1, ...d);");
    let Expression::Call(call) = expr(&prog) else {
        panic!("Expected call");
    };
    assert_eq!(call.arguments.len(), 2);
    let Expression::Member(computed) = call.callee.as_ref() else {
        panic!("Expected member callee");
    };
    assert!(matches!(computed.property, MemberProperty::Expression(_)));
    let Expression::Member(dot) = computed.object.as_ref() else {
        panic!("Expected a.b");
    };
    assert!(matches!(&dot.property, MemberProperty::Identifier(id) if id.name == "b"));
}

#[test]
fn test_keywords_as_property_names() {
    let prog = parse("a.default + a.if + ({ class: 1, new: 2 }).new;");
    assert_eq!(prog.body.len(), 1);
}

#[test]
fn test_optional_chain() {
    let prog = parse("a?.b.c();");
    let Expression::OptionalChain(chain) = expr(&prog) else {
        panic!("Expected optional chain");
    };
    let Expression::Call(call) = chain.base.as_ref() else {
        panic!("Expected call inside chain");
    };
    assert!(!call.optional);
    assert!(script_error("new a?.b();").contains("Invalid optional chain from new expression"));
    assert!(script_error("a?.b`x`;").contains("Invalid tagged template on optional chain"));
    assert!(script_error("a?.b = 1;").contains("Invalid left-hand side in assignment"));
}

#[test]
fn test_arrow_functions() {
    let prog = parse("(a, b = 1, ...rest) => a + b;");
    let Expression::ArrowFunction(f) = expr(&prog) else {
        panic!("Expected arrow function");
    };
    assert_eq!(f.form, FunctionForm::Arrow);
    assert_eq!(f.params.len(), 3);
    assert!(matches!(f.params[2], Pattern::Rest(_)));
    assert!(matches!(f.body, FunctionBody::Expression(_)));
    assert_eq!(f.expected_argument_count(), 1);

    let prog = parse("async x => { await x; };");
    let Expression::ArrowFunction(f) = expr(&prog) else {
        panic!("Expected async arrow");
    };
    assert_eq!(f.kind, FunctionKind::Async);
    assert!(script_error("(a)\n=> a;").contains("Line terminator not permitted before arrow"));
}

#[test]
fn test_object_literal() {
    let prog = parse("({ a, b: 1, [c]: 2, 'd': 3, 4: 5, m() {}, get g() { return 1; }, ...s });");
    let Expression::Object(obj) = expr(&prog) else {
        panic!("Expected object literal");
    };
    assert_eq!(obj.properties.len(), 8);
    let ObjectProperty::Property(a) = &obj.properties[0] else {
        panic!("Expected property");
    };
    assert!(a.shorthand);
    let ObjectProperty::Property(c) = &obj.properties[2] else {
        panic!("Expected property");
    };
    assert!(c.key.is_computed());
    assert!(matches!(obj.properties[4], ObjectProperty::Property(ref p) if matches!(p.key, ObjectPropertyKey::Number(n) if n == 4.0)));
    assert!(matches!(obj.properties[7], ObjectProperty::Spread(_)));
    assert!(script_error("({ __proto__: 1, '__proto__': 2 });").contains("Duplicate __proto__"));
    // Shorthand `__proto__` does not count as a prototype setter
    parse("({ __proto__: 1, __proto__ });");
}

#[test]
fn test_array_literal_holes_and_spread() {
    let prog = parse("[1, , ...x, ];");
    let Expression::Array(arr) = expr(&prog) else {
        panic!("Expected array literal");
    };
    assert_eq!(arr.elements.len(), 3);
    assert!(arr.elements[1].is_none());
    assert!(matches!(arr.elements[2], Some(ArrayElement::Spread(_))));
}

#[test]
fn test_template_literal() {
    let prog = parse("`a${b}c${d}e`;");
    let Expression::Template(t) = expr(&prog) else {
        panic!("Expected template");
    };
    assert_eq!(t.quasis.len(), 3);
    assert_eq!(t.expressions.len(), 2);

    let prog = parse(r"tag`\unicode`;");
    let Expression::TaggedTemplate(tagged) = expr(&prog) else {
        panic!("Expected tagged template");
    };
    assert!(tagged.quasi.quasis[0].cooked.is_none());
    assert!(script_error(r"`\unicode`;").contains("Invalid escape sequence in template"));
}

#[test]
fn test_destructuring_declarations() {
    let prog = parse("const { a, b: [c, , ...d], e = 1, ...f } = obj;");
    let Statement::VariableDeclaration(decl) = &prog.body[0] else {
        panic!("Expected declaration");
    };
    let Pattern::Object(pattern) = &decl.declarations[0].id else {
        panic!("Expected object pattern");
    };
    assert_eq!(pattern.properties.len(), 4);
    assert_eq!(
        names(&prog.scope.lexical.iter().map(|b| b.name.clone()).collect::<Vec<_>>()),
        ["a", "c", "d", "e", "f"]
    );
    assert!(prog.scope.lexical.iter().all(|b| b.constant));
    assert!(script_error("const [a, ...b, c] = x;").contains("Rest element must be last element"));
    assert!(script_error("const x;").contains("SyntaxError"));
}

#[test]
fn test_destructuring_assignment() {
    let prog = parse("[a, b.c, ...d[0]] = [1, 2];");
    let Expression::Assignment(assign) = expr(&prog) else {
        panic!("Expected assignment");
    };
    let AssignmentTarget::Pattern(Pattern::Array(arr)) = &assign.left else {
        panic!("Expected array pattern target");
    };
    assert!(matches!(arr.elements[1], Some(Pattern::Expression(_))));
    parse("({ a = 1, b: { c } } = obj);");
    assert!(script_error("({ a = 1 });").contains("Invalid shorthand property initializer"));
    assert!(script_error("[a + 1] = x;").contains("Invalid destructuring assignment target"));
    assert!(script_error("1 = 2;").contains("Invalid left-hand side in assignment"));
    assert!(script_error("a + 1 += 2;").contains("Invalid left-hand side in assignment"));
}

#[test]
fn test_for_statements() {
    let prog = parse(
        "for (let i = 0; i < 3; i++) {} for (const k in o) {} for (x.y of xs) {} for (;;) break;",
    );
    assert_eq!(prog.body.len(), 4);
    let Statement::ForIn(for_in) = &prog.body[1] else {
        panic!("Expected for-in");
    };
    assert!(matches!(for_in.left, ForInOfLeft::Variable(VariableKind::Const, _)));
    let Statement::ForOf(for_of) = &prog.body[2] else {
        panic!("Expected for-of");
    };
    assert!(matches!(for_of.left, ForInOfLeft::Pattern(Pattern::Expression(_))));
    assert!(!for_of.await_);
    assert!(script_error("for (let x = 1 of xs) {}")
        .contains("for-in/of loop variable declaration may not have an initializer"));
    assert!(script_error("for await (x of xs) {}").contains("for await is only valid in async functions"));
}

#[test]
fn test_for_in_with_in_operator_in_init() {
    parse("for (var i = ('a' in o) ? 1 : 0; i < 1; i++) {}");
    assert!(script_error("for (var i = 'a' in o; i < 1; i++) {}").contains("SyntaxError"));
}

#[test]
fn test_control_flow_statements() {
    let prog = parse(
        "if (a) b; else c; while (x) {} do x--; while (x) switch (x) { case 1: break; default: }",
    );
    assert_eq!(prog.body.len(), 4);
    let Statement::Switch(switch) = &prog.body[3] else {
        panic!("Expected switch");
    };
    assert_eq!(switch.cases.len(), 2);
    assert!(switch.cases[1].test.is_none());
}

#[test]
fn test_try_catch_finally() {
    let prog = parse("try { a(); } catch { b(); } finally { c(); } try {} catch ({ message }) {}");
    let Statement::Try(first) = &prog.body[0] else {
        panic!("Expected try");
    };
    assert!(first.handler.as_ref().is_some_and(|h| h.param.is_none()));
    assert!(first.finalizer.is_some());
    let Statement::Try(second) = &prog.body[1] else {
        panic!("Expected try");
    };
    assert!(matches!(second.handler.as_ref().and_then(|h| h.param.as_ref()), Some(Pattern::Object(_))));
    assert!(script_error("try {}").contains("Missing catch or finally after try"));
}

#[test]
fn test_labels_break_continue() {
    parse("outer: for (;;) { inner: for (;;) { continue outer; break inner; } }");
    parse("block: { break block; }");
    assert!(script_error("break;").contains("Illegal break statement"));
    assert!(script_error("while (1) { break nope; }").contains("Undefined label 'nope'"));
    assert!(script_error("block: { continue block; }").contains("SyntaxError"));
    assert!(script_error("continue;").contains("Illegal continue statement"));
    assert!(script_error("a: a: ;").contains("Label 'a' has already been declared"));
}

#[test]
fn test_return_outside_function() {
    assert!(script_error("return 1;").contains("Illegal return statement"));
    parse("function f() { return; }");
}

#[test]
fn test_throw_newline() {
    assert!(script_error("throw\nnew Error();").contains("Illegal newline after throw"));
}

#[test]
fn test_automatic_semicolon_insertion() {
    let prog = parse("let a = 1\nlet b = 2\na\n++b\nfunction f() { return\n1 }");
    assert_eq!(prog.body.len(), 5);
    let Statement::Expression(update) = &prog.body[3] else {
        panic!("Expected ++b on its own line");
    };
    assert!(matches!(&update.expression, Expression::Update(u) if u.prefix));
    assert!(script_error("let a = 1 let b = 2").contains("SyntaxError"));
}

#[test]
fn test_function_declarations_and_scope() {
    let prog = parse("function f(a, { b }, c = a) { var x; let y; function g() {} arguments; }");
    let Statement::FunctionDeclaration(f) = &prog.body[0] else {
        panic!("Expected function declaration");
    };
    assert_eq!(f.form, FunctionForm::Declaration);
    assert_eq!(names(&f.scope.parameter_names), ["a", "b", "c"]);
    assert!(!f.scope.simple_parameter_list);
    assert!(f.scope.has_parameter_expressions);
    assert!(f.scope.arguments_needed);
    assert_eq!(names(&f.scope.body.var_names), ["x", "g"]);
    assert_eq!(f.scope.body.functions.len(), 1);
    assert_eq!(f.scope.body.lexical.len(), 1);
    assert_eq!(f.expected_argument_count(), 2);
}

#[test]
fn test_arguments_not_needed_for_arrows() {
    let prog = parse("function f() { return () => 1; }");
    let Statement::FunctionDeclaration(f) = &prog.body[0] else {
        panic!("Expected function declaration");
    };
    assert!(!f.scope.arguments_needed);
}

#[test]
fn test_script_var_scope() {
    let prog = parse("var a; { var b; let c; function d() {} } let e; function f() {}");
    assert_eq!(prog.source_type, SourceType::Script);
    assert!(names(&prog.scope.var_names).starts_with(&["a".to_string(), "b".to_string()]));
    assert!(names(&prog.scope.var_names).contains(&"f".to_string()));
    assert_eq!(prog.scope.lexical.len(), 1);
    let Statement::Block(block) = &prog.body[1] else {
        panic!("Expected block");
    };
    // Block-level functions are lexical bindings of the block
    assert_eq!(block.scope.bindings.len(), 2);
    assert_eq!(block.scope.functions.len(), 1);
}

#[test]
fn test_redeclaration_errors() {
    assert!(script_error("let a; let a;").contains("Identifier 'a' has already been declared"));
    assert!(script_error("let a; var a;").contains("Identifier 'a' has already been declared"));
    assert!(script_error("{ const b = 1; function b() {} }").contains("has already been declared"));
    assert!(script_error("function f(a) { let a; }").contains("has already been declared"));
    parse("var a; var a; function a() {}");
    parse("try {} catch (e) { var e; }");
}

#[test]
fn test_generators_and_async() {
    let prog = parse("function* g() { yield; yield* other(); } async function* h() { await 1; yield 2; }");
    let Statement::FunctionDeclaration(g) = &prog.body[0] else {
        panic!("Expected generator");
    };
    assert_eq!(g.kind, FunctionKind::Generator);
    let Statement::FunctionDeclaration(h) = &prog.body[1] else {
        panic!("Expected async generator");
    };
    assert_eq!(h.kind, FunctionKind::AsyncGenerator);
    assert!(script_error("function* g() { var yield; }").contains("Unexpected reserved word"));
    assert!(script_error("async function f() { var await; }").contains("Unexpected reserved word"));
    parse("function f() { var yield, await; }");
}

#[test]
fn test_class_members() {
    let prog = parse(
        "class A extends B { constructor() { super(); } m() {} static s() {} get x() { return 1; } set x(v) {} f = 1; static g; static { this.h = 1; } ['c' + 1]() {} }",
    );
    let Statement::ClassDeclaration(class) = &prog.body[0] else {
        panic!("Expected class declaration");
    };
    assert!(class.super_class.is_some());
    assert!(matches!(
        class.constructor.form,
        FunctionForm::ClassConstructor { derived: true, synthesized: false }
    ));
    let methods: Vec<(MethodKind, bool)> = class
        .members
        .iter()
        .filter_map(|m| match m {
            ClassMember::Method(method) => Some((method.kind, method.static_)),
            _ => None,
        })
        .collect();
    assert_eq!(
        methods,
        vec![
            (MethodKind::Method, false),
            (MethodKind::Method, true),
            (MethodKind::Get, false),
            (MethodKind::Set, false),
            (MethodKind::Method, false),
        ]
    );
    let fields = class.members.iter().filter(|m| matches!(m, ClassMember::Field(_))).count();
    assert_eq!(fields, 2);
    assert!(class.members.iter().any(|m| matches!(m, ClassMember::StaticBlock(_))));
    assert!(class.constructor.strict);
}

#[test]
fn test_synthesized_constructor() {
    let prog = parse("class A {} class B extends A {}");
    let Statement::ClassDeclaration(b) = &prog.body[1] else {
        panic!("Expected class");
    };
    assert!(matches!(
        b.constructor.form,
        FunctionForm::ClassConstructor { derived: true, synthesized: true }
    ));
}

#[test]
fn test_class_early_errors() {
    assert!(script_error("class A { constructor() {} constructor() {} }")
        .contains("A class may only have one constructor"));
    assert!(script_error("class A { get constructor() {} }")
        .contains("Class constructor may not be an accessor, async or generator"));
    assert!(script_error("class A { static prototype() {} }")
        .contains("Classes may not have a static property named 'prototype'"));
    assert!(script_error("class A { constructor = 1; }")
        .contains("Classes may not have a field named 'constructor'"));
    assert!(script_error("class A { #x = 1; }").contains("Private class members are not supported"));
    assert!(script_error("class A { m() { super(); } }").contains("'super' keyword unexpected here"));
    assert!(script_error("class A { m(a, a) {} }").contains("Duplicate parameter name"));
    assert!(script_error("class A { get x(a) {} }").contains("Getter must not have any formal parameters"));
    assert!(script_error("class A { set x() {} }").contains("Setter must have exactly one formal parameter"));
}

#[test]
fn test_super_and_new_target_placement() {
    parse("({ m() { return super.x; } });");
    parse("function f() { return new.target; }");
    assert!(script_error("function f() { return super.x; }").contains("'super' keyword unexpected here"));
    assert!(script_error("new.target;").contains("new.target expression is not allowed here"));
    // Arrow functions see the enclosing function's new.target
    parse("function f() { return () => new.target; }");
}

#[test]
fn test_strict_mode_detection() {
    let prog = parse("'use strict'; function f() {}");
    assert!(prog.strict);
    let Statement::FunctionDeclaration(f) = &prog.body[1] else {
        panic!("Expected function");
    };
    assert!(f.strict);

    let prog = parse("function f() { 'use strict'; } function g() {}");
    assert!(!prog.strict);
    let (Statement::FunctionDeclaration(f), Statement::FunctionDeclaration(g)) = (&prog.body[0], &prog.body[1])
    else {
        panic!("Expected functions");
    };
    assert!(f.strict);
    assert!(!g.strict);

    // A directive after another statement is just an expression
    assert!(!parse("a; 'use strict';").strict);
    assert!(script_error("function f(a = 1) { 'use strict'; }").contains("SyntaxError"));
}

#[test]
fn test_strict_mode_errors() {
    assert!(script_error("'use strict'; with (o) {}").contains("Strict mode code may not include a with statement"));
    assert!(script_error("'use strict'; delete x;").contains("Delete of an unqualified identifier in strict mode."));
    assert!(script_error("'use strict'; var eval;").contains("Unexpected eval or arguments in strict mode"));
    assert!(script_error("'use strict'; arguments = 1;").contains("SyntaxError"));
    assert!(script_error("'use strict'; function f(a, a) {}").contains("Duplicate parameter name"));
    assert!(script_error("'use strict'; var static;").contains("Unexpected reserved word"));
    assert!(script_error("'use strict'; if (1) function f() {}").contains("SyntaxError"));
    parse("with (o) {} delete x; var eval; var static;");
}

#[test]
fn test_lexical_declaration_in_statement_position() {
    assert!(script_error("if (a) let x = 1;")
        .contains("Lexical declaration cannot appear in a single-statement context"));
    assert!(script_error("while (a) const x = 1;").contains("SyntaxError"));
}

#[test]
fn test_update_and_unary_targets() {
    assert!(script_error("++1;").contains("Invalid left-hand side expression in prefix operation"));
    assert!(script_error("a()++;").contains("Invalid left-hand side expression in postfix operation"));
    let prog = parse("typeof a, void 0, !b, -c, delete d.e;");
    let Expression::Sequence(seq) = expr(&prog) else {
        panic!("Expected sequence");
    };
    assert_eq!(seq.expressions.len(), 5);
}

#[test]
fn test_literals() {
    let prog = parse("null; true; 0x10; 'x';");
    let values: Vec<LiteralValue> = prog
        .body
        .iter()
        .map(|s| match s {
            Statement::Expression(e) => match &e.expression {
                Expression::Literal(l) => l.value.clone(),
                other => panic!("Expected literal, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        })
        .collect();
    assert_eq!(
        values,
        vec![
            LiteralValue::Null,
            LiteralValue::Boolean(true),
            LiteralValue::Number(16.0),
            LiteralValue::String("x".into()),
        ]
    );
}

#[test]
fn test_unsupported_syntax_is_reported() {
    assert!(script_error("/ab+c/.test(s);").contains("SyntaxError"));
    assert!(script_error("import('./m.js');").contains("Dynamic import and import.meta are not supported"));
    assert!(script_error("1n;").contains("BigInt literals are not supported"));
}

#[test]
fn test_typescript_annotations_are_stripped() {
    let prog = parse(
        "let x: number = 1;
         function add(a: number, b?: string, ...rest: Array<number>): number { return a; }
         const f = (a: number): void => {};
         const obj = { a: 1 } as const;
         const y = x!;
         const z = <number>x;
         const g = generic<string>(x);
         class C<T> implements I { private a: T; readonly b?: number = 1; constructor(public c: number) {} }",
    );
    assert_eq!(prog.body.len(), 8);
}

#[test]
fn test_typescript_declarations_have_no_runtime_effect() {
    let prog = parse(
        "interface Person { name: string; age?: number; [key: string]: unknown }
         type Pair<T> = [T, T] | { first: T; second: T };
         type Cond<T> = T extends string ? 'yes' : 'no';
         declare const external: number;
         function overload(a: string): void;
         function overload(a: any) {}",
    );
    let declarations = prog
        .body
        .iter()
        .filter(|s| matches!(s, Statement::TypeDeclaration(_)))
        .count();
    assert_eq!(declarations, 5);
    assert!(script_error("const missing = function (a: string): void;").contains("Function implementation is missing"));
    assert!(script_error("enum Color { Red }").contains("enum declarations are not supported"));
}

#[test]
fn test_module_imports() {
    let prog = parse_mod("import d, { a, b as c } from './m.js'; import * as ns from './n.js'; import './side.js';");
    assert_eq!(prog.source_type, SourceType::Module);
    assert!(prog.strict);
    let Statement::Import(first) = &prog.body[0] else {
        panic!("Expected import");
    };
    assert_eq!(first.source, "./m.js");
    assert!(matches!(first.specifiers[0], ImportSpecifier::Default { .. }));
    assert!(matches!(
        &first.specifiers[2],
        ImportSpecifier::Named { local, imported } if local.name == "c" && *imported == "b"
    ));
    let Statement::Import(second) = &prog.body[1] else {
        panic!("Expected import");
    };
    assert!(matches!(second.specifiers[0], ImportSpecifier::Namespace { .. }));
    let Statement::Import(third) = &prog.body[2] else {
        panic!("Expected import");
    };
    assert!(third.specifiers.is_empty());
}

#[test]
fn test_module_exports() {
    let prog = parse_mod(
        "export const a = 1;
         export function f() {}
         export default class {}
         export { a as b, f };
         export { x as y } from './m.js';
         export * from './n.js';
         export * as ns from './o.js';",
    );
    let kinds: Vec<&str> = prog
        .body
        .iter()
        .map(|s| match s {
            Statement::Export(e) => match &e.kind {
                ExportKind::Declaration(_) => "declaration",
                ExportKind::DefaultDeclaration(_) => "default declaration",
                ExportKind::DefaultExpression(_) => "default expression",
                ExportKind::Named { source: None, .. } => "named",
                ExportKind::Named { source: Some(_), .. } => "re-export",
                ExportKind::All { exported: None, .. } => "star",
                ExportKind::All { exported: Some(_), .. } => "star as",
            },
            other => panic!("Expected export, got {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "declaration",
            "declaration",
            "default declaration",
            "named",
            "re-export",
            "star",
            "star as"
        ]
    );
    let prog = parse_mod("export default 1 + 2;");
    assert!(matches!(
        &prog.body[0],
        Statement::Export(e) if matches!(e.kind, ExportKind::DefaultExpression(_))
    ));
}

#[test]
fn test_module_early_errors() {
    assert!(script_error("import a from './m.js';").contains("Cannot use import statement outside a module"));
    assert!(script_error("export const a = 1;").contains("Cannot use export statement outside a module"));
    assert!(module_error("await 1;").contains("Top-level await is not supported"));
    assert!(module_error("var await;").contains("Unexpected reserved word"));
    assert!(module_error("with (o) {}").contains("Strict mode code may not include a with statement"));
    assert!(module_error("export const a = 1; export { a };").contains("Duplicate export of 'a'"));
    assert!(module_error("export default 1; const b = 2; export { b as default };").contains("Duplicate export"));
    assert!(module_error("export * as ns from './a.js'; export * as ns from './b.js';").contains("Duplicate export"));
    assert!(module_error("function f() { import x from './m.js'; }").contains("Cannot use import statement outside a module"));
    parse_mod("export * from './a.js'; export * from './b.js';");
}

#[test]
fn test_syntax_error_location() {
    let err = script_error("let a = 1;\nlet b = ;");
    assert!(err.starts_with("SyntaxError:"), "{}", err);
    assert!(err.contains(" at 2:"), "{}", err);
}
