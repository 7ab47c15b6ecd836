//! Parser for JavaScript with TypeScript annotations
//!
//! Recursive descent over the token stream produced by the lexer, with
//! precedence climbing for binary operators. Arrow functions are recognised
//! by speculative parsing from a checkpoint; destructuring assignment uses a
//! cover grammar (object and array literals are reinterpreted as patterns
//! when an `=` follows). TypeScript annotations, `as` expressions, non-null
//! assertions and type-only declarations are consumed and dropped.
//!
//! Static semantics (hoisting, parameter shape, strictness) are computed here
//! so the evaluator never re-walks a body to find its declarations.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::error::JsError;
use crate::hoist;
use crate::lexer::{Span, TemplatePart, Token, TokenKind, tokenize};
use crate::string_dict::StringDict;
use crate::value::{CheapClone, JsString};

/// Per-function parsing state. The bottom entry describes the script or
/// module body.
#[derive(Debug, Clone, Default)]
struct FunctionContext {
    strict: bool,
    is_async: bool,
    is_generator: bool,
    in_function: bool,
    super_call: bool,
    super_property: bool,
    new_target: bool,
    /// The body carries a `"use strict"` directive of its own.
    use_strict_directive: bool,
    uses_arguments: bool,
    /// Enclosing labels and whether each labels an iteration statement.
    labels: Vec<(JsString, bool)>,
    loop_depth: u32,
    breakable_depth: u32,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    cover_initializers: usize,
    no_in: bool,
}

#[derive(Debug, Clone, Copy)]
enum BinaryOperator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Parser over one source text
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    string_dict: &'a mut StringDict,
    source_type: SourceType,
    context: FunctionContext,
    outer_contexts: Vec<FunctionContext>,
    /// Spans of `{ a = 1 }` shorthands that are only valid once the
    /// enclosing literal is reinterpreted as a pattern.
    cover_initializers: Vec<Span>,
    /// `in` is not a binary operator (for-statement heads).
    no_in: bool,
}

/// Parse a classic script.
pub fn parse_script(source: &str, string_dict: &mut StringDict) -> Result<Program, JsError> {
    Parser::new(source, string_dict)?.parse_program()
}

/// Parse a module (always strict, allows `import`/`export`).
pub fn parse_module(source: &str, string_dict: &mut StringDict) -> Result<Program, JsError> {
    Parser::new(source, string_dict)?.parse_module()
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Result<Self, JsError> {
        let tokens = tokenize(source, string_dict)?;
        let end = source.len();
        Ok(Self {
            source,
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::Eof, Span::new(end, end, 1, 1), false),
            string_dict,
            source_type: SourceType::Script,
            context: FunctionContext::default(),
            outer_contexts: Vec::new(),
            cover_initializers: Vec::new(),
            no_in: false,
        })
    }

    /// Helper to intern a string in the dictionary
    #[inline]
    fn intern(&mut self, s: &str) -> JsString {
        self.string_dict.get_or_insert(s)
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        self.source_type = SourceType::Script;
        self.context = FunctionContext::default();
        let body = self.parse_statement_list(true, &TokenKind::Eof)?;
        self.finish_program(body)
    }

    /// Parse a complete module
    pub fn parse_module(&mut self) -> Result<Program, JsError> {
        self.source_type = SourceType::Module;
        self.context = FunctionContext {
            strict: true,
            ..FunctionContext::default()
        };
        let body = self.parse_statement_list(false, &TokenKind::Eof)?;
        self.finish_program(body)
    }

    fn finish_program(&mut self, body: Vec<Statement>) -> Result<Program, JsError> {
        if !self.is_at_end() {
            return Err(self.unexpected_token("end of input"));
        }
        self.check_cover_initializers()?;
        let scope = match self.source_type {
            SourceType::Script => hoist::body_scope(&body),
            SourceType::Module => hoist::module_scope(&body),
        };
        self.check_var_scope(&scope, &[])?;
        if self.source_type == SourceType::Module {
            self.check_module_scope(&scope)?;
            self.check_exported_names(&body)?;
        }
        Ok(Program {
            body,
            source_type: self.source_type,
            strict: self.context.strict,
            scope,
            source: Rc::from(self.source),
        })
    }

    // ============ STATEMENTS ============

    /// StatementList with an optional directive prologue, up to `end`.
    fn parse_statement_list(
        &mut self,
        directives: bool,
        end: &TokenKind,
    ) -> Result<Vec<Statement>, JsError> {
        let mut body = Vec::new();
        let mut in_prologue = directives;
        while !self.check(end) && !self.is_at_end() {
            if in_prologue {
                if let TokenKind::String(_) = &self.current().kind {
                    let token_span = self.current().span;
                    let raw = self.source.get(token_span.start..token_span.end).unwrap_or("");
                    let use_strict = raw == "'use strict'" || raw == "\"use strict\"";
                    let stmt = self.parse_statement_list_item()?;
                    let is_directive = matches!(
                        &stmt,
                        Statement::Expression(ExpressionStatement {
                            expression: Expression::Literal(Literal {
                                value: LiteralValue::String(_),
                                span,
                            }),
                            ..
                        }) if *span == token_span
                    );
                    if is_directive {
                        if use_strict {
                            self.context.strict = true;
                            self.context.use_strict_directive = true;
                        }
                    } else {
                        in_prologue = false;
                    }
                    body.push(stmt);
                    continue;
                }
                in_prologue = false;
            }
            body.push(self.parse_statement_list_item()?);
        }
        Ok(body)
    }

    /// StatementListItem: statements plus declarations.
    fn parse_statement_list_item(&mut self) -> Result<Statement, JsError> {
        let start = self.current().span;
        match &self.current().kind {
            TokenKind::Function => self.parse_function_declaration(start, false, false),
            TokenKind::Class => {
                let class = self.parse_class(start, false)?;
                Ok(Statement::ClassDeclaration(class))
            }
            TokenKind::Let | TokenKind::Const => {
                let kind = if self.check(&TokenKind::Let) {
                    VariableKind::Let
                } else {
                    VariableKind::Const
                };
                self.advance();
                self.parse_variable_statement(kind, start)
            }
            TokenKind::Import => {
                if self.peek_is(1, &TokenKind::LParen) || self.peek_is(1, &TokenKind::Dot) {
                    return Err(self.error("Dynamic import and import.meta are not supported"));
                }
                self.parse_import_declaration(start)
            }
            TokenKind::Export => self.parse_export_declaration(start),
            TokenKind::Enum => Err(self.error("enum declarations are not supported")),
            TokenKind::Identifier(name) => {
                let name = name.cheap_clone();
                if name.as_str() == "async"
                    && self.peek_is(1, &TokenKind::Function)
                    && !self.peek(1).newline_before
                {
                    self.advance();
                    return self.parse_function_declaration(start, true, false);
                }
                if let Some(stmt) = self.try_parse_type_only_statement(start)? {
                    return Ok(stmt);
                }
                if name.as_str() == "abstract" && self.peek_is(1, &TokenKind::Class) {
                    self.advance();
                    let class = self.parse_class(start, false)?;
                    return Ok(Statement::ClassDeclaration(class));
                }
                self.parse_statement()
            }
            _ => self.parse_statement(),
        }
    }

    /// Statement: no declarations except where a caller allows them.
    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current().span;
        match &self.current().kind {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block_statement()?)),
            TokenKind::Var => {
                self.advance();
                self.parse_variable_statement(VariableKind::Var, start)
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty(start))
            }
            TokenKind::If => self.parse_if_statement(start),
            TokenKind::For => self.parse_for_statement(start),
            TokenKind::While => self.parse_while_statement(start),
            TokenKind::Do => self.parse_do_while_statement(start),
            TokenKind::Switch => self.parse_switch_statement(start),
            TokenKind::Try => self.parse_try_statement(start),
            TokenKind::With => self.parse_with_statement(start),
            TokenKind::Return => self.parse_return_statement(start),
            TokenKind::Break => self.parse_break_statement(start),
            TokenKind::Continue => self.parse_continue_statement(start),
            TokenKind::Throw => self.parse_throw_statement(start),
            TokenKind::Debugger => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Debugger(self.span_from(start)))
            }
            TokenKind::Function | TokenKind::Class | TokenKind::Let | TokenKind::Const => Err(
                self.error("Lexical declaration cannot appear in a single-statement context"),
            ),
            TokenKind::Identifier(_) if self.peek_is(1, &TokenKind::Colon) => {
                self.parse_labeled_statement(start)
            }
            _ => self.parse_expression_statement(start),
        }
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::LBrace)?;
        let body = self.parse_statement_list(false, &TokenKind::RBrace)?;
        self.require_token(&TokenKind::RBrace)?;
        let scope = hoist::block_scope(&body);
        self.check_block_scope(&scope, &hoist::var_declared_names(&body), start)?;
        Ok(BlockStatement {
            body,
            scope,
            span: self.span_from(start),
        })
    }

    fn parse_variable_statement(
        &mut self,
        kind: VariableKind,
        start: Span,
    ) -> Result<Statement, JsError> {
        let declaration = self.parse_variable_declaration_list(kind, start, false)?;
        self.expect_semicolon()?;
        Ok(Statement::VariableDeclaration(VariableDeclaration {
            span: self.span_from(start),
            ..declaration
        }))
    }

    /// Declarator list after the `var`/`let`/`const` keyword. In a for-head
    /// the initializer requirements are checked by the caller.
    fn parse_variable_declaration_list(
        &mut self,
        kind: VariableKind,
        start: Span,
        in_for_head: bool,
    ) -> Result<VariableDeclaration, JsError> {
        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current().span;
            let id = self.parse_binding_target()?;
            // `let x!: T` definite assignment assertion
            if self.check(&TokenKind::Bang) {
                self.advance();
            }
            self.skip_type_annotation()?;
            let init = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            if init.is_none() && !in_for_head {
                if kind == VariableKind::Const {
                    return Err(JsError::syntax_error(
                        "Missing initializer in const declaration",
                        decl_start.line,
                        decl_start.column,
                    ));
                }
                if !matches!(id, Pattern::Identifier(_)) {
                    return Err(JsError::syntax_error(
                        "Missing initializer in destructuring declaration",
                        decl_start.line,
                        decl_start.column,
                    ));
                }
            }
            if kind != VariableKind::Var {
                let mut names = Vec::new();
                hoist::bound_names(&id, &mut names);
                if names.iter().any(|n| n.as_str() == "let") {
                    return Err(JsError::syntax_error(
                        "let is disallowed as a lexically bound name",
                        decl_start.line,
                        decl_start.column,
                    ));
                }
            }
            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.span_from(decl_start),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(VariableDeclaration {
            kind,
            declarations,
            span: self.span_from(start),
        })
    }

    fn parse_if_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::If)?;
        self.require_token(&TokenKind::LParen)?;
        let test = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    fn parse_loop_body(&mut self) -> Result<Box<Statement>, JsError> {
        self.context.loop_depth += 1;
        self.context.breakable_depth += 1;
        let body = self.parse_statement();
        self.context.loop_depth -= 1;
        self.context.breakable_depth -= 1;
        Ok(Box::new(body?))
    }

    fn parse_for_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::For)?;
        let await_ = if self.check_identifier("await") {
            if !self.context.is_async {
                return Err(self.error("for await is only valid in async functions"));
            }
            self.advance();
            true
        } else {
            false
        };
        self.require_token(&TokenKind::LParen)?;

        // for (var/let/const ...
        let declaration_kind = match &self.current().kind {
            TokenKind::Var => Some(VariableKind::Var),
            TokenKind::Let => Some(VariableKind::Let),
            TokenKind::Const => Some(VariableKind::Const),
            _ => None,
        };

        let init = if let Some(kind) = declaration_kind {
            let decl_start = self.current().span;
            self.advance();
            let saved = self.no_in;
            self.no_in = true;
            let declaration = self.parse_variable_declaration_list(kind, decl_start, true);
            self.no_in = saved;
            let mut declaration = declaration?;

            let is_of = self.check_identifier("of");
            if is_of || self.check(&TokenKind::In) {
                if declaration.declarations.len() != 1 {
                    return Err(self.error(
                        "Invalid left-hand side in for-in/of loop: must have a single binding",
                    ));
                }
                let Some(declarator) = declaration.declarations.pop() else {
                    return Err(JsError::internal("declarator list emptied"));
                };
                if declarator.init.is_some() {
                    return Err(self.error("for-in/of loop variable declaration may not have an initializer"));
                }
                let left = ForInOfLeft::Variable(kind, declarator.id);
                return self.parse_for_in_of_rest(start, left, is_of, await_);
            }

            for declarator in &declaration.declarations {
                if declarator.init.is_none()
                    && (kind == VariableKind::Const
                        || !matches!(declarator.id, Pattern::Identifier(_)))
                {
                    return Err(JsError::syntax_error(
                        "Missing initializer in declaration",
                        declarator.span.line,
                        declarator.span.column,
                    ));
                }
            }
            Some(ForInit::Variable(declaration))
        } else if self.check(&TokenKind::Semicolon) {
            None
        } else {
            let expr_start = self.current().span;
            let saved = self.no_in;
            self.no_in = true;
            let covers = self.cover_initializers.len();
            let expr = self.parse_left_hand_side_or_expression();
            self.no_in = saved;
            let expr = expr?;

            let is_of = self.check_identifier("of");
            if is_of || self.check(&TokenKind::In) {
                if is_of && matches!(&expr, Expression::Identifier(id) if id.name.as_str() == "async") {
                    return Err(JsError::syntax_error(
                        "The left-hand side of a for-of loop may not be 'async'",
                        expr_start.line,
                        expr_start.column,
                    ));
                }
                let pattern = self.expression_to_pattern(expr)?;
                self.cover_initializers.truncate(covers);
                let left = ForInOfLeft::Pattern(pattern);
                return self.parse_for_in_of_rest(start, left, is_of, await_);
            }
            Some(ForInit::Expression(expr))
        };

        if await_ {
            return Err(self.error("for await requires an of clause"));
        }

        self.require_token(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.with_in(|p| p.parse_expression())?)
        };
        self.require_token(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.with_in(|p| p.parse_expression())?)
        };
        self.require_token(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    /// The head expression of a for statement before we know whether it is
    /// `for (lhs of/in ...)` or a plain initializer.
    fn parse_left_hand_side_or_expression(&mut self) -> Result<Expression, JsError> {
        let checkpoint = self.checkpoint();
        let lhs = self.parse_left_hand_side_expression()?;
        if self.check_identifier("of") || self.check(&TokenKind::In) {
            return Ok(lhs);
        }
        self.restore(checkpoint);
        self.parse_expression()
    }

    fn parse_for_in_of_rest(
        &mut self,
        start: Span,
        left: ForInOfLeft,
        is_of: bool,
        await_: bool,
    ) -> Result<Statement, JsError> {
        self.advance(); // `of` or `in`
        let right = if is_of {
            self.with_in(|p| p.parse_assignment_expression())?
        } else {
            self.with_in(|p| p.parse_expression())?
        };
        self.require_token(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        let span = self.span_from(start);
        if is_of {
            Ok(Statement::ForOf(ForOfStatement {
                left,
                right,
                body,
                await_,
                span,
            }))
        } else {
            if await_ {
                return Err(self.error("for await requires an of clause"));
            }
            Ok(Statement::ForIn(ForInStatement {
                left,
                right,
                body,
                span,
            }))
        }
    }

    fn parse_while_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::While)?;
        self.require_token(&TokenKind::LParen)?;
        let test = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Do)?;
        let body = self.parse_loop_body()?;
        self.require_token(&TokenKind::While)?;
        self.require_token(&TokenKind::LParen)?;
        let test = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        // The semicolon after do-while is always optional.
        self.match_token(&TokenKind::Semicolon);
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.span_from(start),
        }))
    }

    fn parse_switch_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Switch)?;
        self.require_token(&TokenKind::LParen)?;
        let discriminant = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        self.require_token(&TokenKind::LBrace)?;

        self.context.breakable_depth += 1;
        let cases = self.parse_switch_cases();
        self.context.breakable_depth -= 1;
        let cases = cases?;

        self.require_token(&TokenKind::RBrace)?;
        let statements = || cases.iter().flat_map(|c| c.consequent.iter());
        let scope = hoist::block_scope(statements());
        self.check_block_scope(&scope, &hoist::var_declared_names(statements()), start)?;
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            scope,
            span: self.span_from(start),
        }))
    }

    fn parse_switch_cases(&mut self) -> Result<Vec<SwitchCase>, JsError> {
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let case_start = self.current().span;
            let test = if self.match_token(&TokenKind::Case) {
                Some(self.with_in(|p| p.parse_expression())?)
            } else {
                self.require_token(&TokenKind::Default)?;
                if seen_default {
                    return Err(JsError::syntax_error(
                        "More than one default clause in switch statement",
                        case_start.line,
                        case_start.column,
                    ));
                }
                seen_default = true;
                None
            };
            self.require_token(&TokenKind::Colon)?;
            let mut consequent = Vec::new();
            while !self.check(&TokenKind::Case)
                && !self.check(&TokenKind::Default)
                && !self.check(&TokenKind::RBrace)
                && !self.is_at_end()
            {
                consequent.push(self.parse_statement_list_item()?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }
        Ok(cases)
    }

    fn parse_try_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Try)?;
        let block = self.parse_block_statement()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.current().span;
            self.advance();
            let param = if self.match_token(&TokenKind::LParen) {
                let param = self.parse_binding_target()?;
                self.skip_type_annotation()?;
                self.require_token(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block_statement()?;
            if let Some(param) = &param {
                let mut names = Vec::new();
                hoist::bound_names(param, &mut names);
                let mut seen = FxHashSet::default();
                for name in &names {
                    if !seen.insert(name.cheap_clone())
                        || body.scope.bindings.iter().any(|b| b.name == *name)
                    {
                        return Err(JsError::syntax_error(
                            format!("Identifier '{}' has already been declared", name),
                            catch_start.line,
                            catch_start.column,
                        ));
                    }
                }
            }
            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            None
        };

        let finalizer = if self.match_token(&TokenKind::Finally) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        }))
    }

    fn parse_with_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        if self.context.strict {
            return Err(self.error("Strict mode code may not include a with statement"));
        }
        self.require_token(&TokenKind::With)?;
        self.require_token(&TokenKind::LParen)?;
        let object = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::With(WithStatement {
            object,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_return_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        if !self.context.in_function {
            return Err(self.error("Illegal return statement"));
        }
        self.require_token(&TokenKind::Return)?;
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.with_in(|p| p.parse_expression())?)
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_break_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Break)?;
        let label = self.parse_jump_label()?;
        match &label {
            Some(name) => {
                if !self.context.labels.iter().any(|(l, _)| l == name) {
                    return Err(self.error_at(start, &format!("Undefined label '{}'", name)));
                }
            }
            None => {
                if self.context.breakable_depth == 0 {
                    return Err(self.error_at(start, "Illegal break statement"));
                }
            }
        }
        self.expect_semicolon()?;
        Ok(Statement::Break(BreakStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_continue_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Continue)?;
        let label = self.parse_jump_label()?;
        if self.context.loop_depth == 0 {
            return Err(self.error_at(start, "Illegal continue statement: no surrounding iteration statement"));
        }
        if let Some(name) = &label {
            if !self
                .context
                .labels
                .iter()
                .any(|(l, is_loop)| l == name && *is_loop)
            {
                return Err(self.error_at(
                    start,
                    &format!("Illegal continue statement: '{}' does not denote an iteration statement", name),
                ));
            }
        }
        self.expect_semicolon()?;
        Ok(Statement::Continue(ContinueStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_jump_label(&mut self) -> Result<Option<JsString>, JsError> {
        if self.current().newline_before {
            return Ok(None);
        }
        if let TokenKind::Identifier(name) = &self.current().kind {
            let name = name.cheap_clone();
            self.advance();
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn parse_throw_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Throw)?;
        if self.current().newline_before {
            return Err(self.error("Illegal newline after throw"));
        }
        let argument = self.with_in(|p| p.parse_expression())?;
        self.expect_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_labeled_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        let TokenKind::Identifier(label) = &self.current().kind else {
            return Err(self.unexpected_token("label"));
        };
        let label = label.cheap_clone();
        if self.context.labels.iter().any(|(l, _)| *l == label) {
            return Err(self.error(&format!("Label '{}' has already been declared", label)));
        }
        self.advance();
        self.require_token(&TokenKind::Colon)?;

        // Labels directly in front of an iteration statement (possibly through
        // further labels) are valid `continue` targets.
        let mut lookahead = self.pos;
        while matches!(self.tokens.get(lookahead).map(|t| &t.kind), Some(TokenKind::Identifier(_)))
            && matches!(self.tokens.get(lookahead + 1).map(|t| &t.kind), Some(TokenKind::Colon))
        {
            lookahead += 2;
        }
        let is_loop = matches!(
            self.tokens.get(lookahead).map(|t| &t.kind),
            Some(TokenKind::For | TokenKind::While | TokenKind::Do)
        );

        self.context.labels.push((label.cheap_clone(), is_loop));
        let body = if self.check(&TokenKind::Function) {
            if self.context.strict {
                Err(self.error("In strict mode code, functions can only be declared at top level or inside a block"))
            } else {
                let fn_start = self.current().span;
                self.parse_function_declaration(fn_start, false, false)
            }
        } else {
            // A plain `break label` inside the labelled statement is valid.
            self.context.breakable_depth += 1;
            let body = self.parse_statement();
            self.context.breakable_depth -= 1;
            body
        };
        self.context.labels.pop();

        Ok(Statement::Labeled(LabeledStatement {
            label,
            body: Box::new(body?),
            span: self.span_from(start),
        }))
    }

    fn parse_expression_statement(&mut self, start: Span) -> Result<Statement, JsError> {
        let expression = self.with_in(|p| p.parse_expression())?;
        self.expect_semicolon()?;
        Ok(Statement::Expression(ExpressionStatement {
            expression,
            span: self.span_from(start),
        }))
    }

    // ============ MODULES ============

    fn require_module(&self, what: &str) -> Result<(), JsError> {
        if self.source_type != SourceType::Module || !self.outer_contexts.is_empty() {
            return Err(self.error(&format!(
                "Cannot use {} statement outside a module",
                what
            )));
        }
        Ok(())
    }

    fn parse_import_declaration(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_module("import")?;
        self.require_token(&TokenKind::Import)?;

        // import type { A } from "m"
        if self.check_identifier("type")
            && !matches!(self.peek(1).kind, TokenKind::Comma)
            && !(matches!(self.peek(1).kind, TokenKind::Identifier(ref n) if n.as_str() == "from"))
        {
            self.skip_declaration();
            return Ok(Statement::TypeDeclaration(self.span_from(start)));
        }

        let mut specifiers = Vec::new();
        if let TokenKind::String(source) = &self.current().kind {
            let source = source.cheap_clone();
            self.advance();
            self.skip_import_attributes()?;
            self.expect_semicolon()?;
            return Ok(Statement::Import(ImportDeclaration {
                specifiers,
                source,
                span: self.span_from(start),
            }));
        }

        if let TokenKind::Identifier(_) = &self.current().kind {
            let local = self.parse_binding_identifier()?;
            specifiers.push(ImportSpecifier::Default { local });
            if !self.match_token(&TokenKind::Comma) {
                return self.finish_import(start, specifiers);
            }
        }

        if self.match_token(&TokenKind::Star) {
            self.require_contextual("as")?;
            let local = self.parse_binding_identifier()?;
            specifiers.push(ImportSpecifier::Namespace { local });
        } else if self.match_token(&TokenKind::LBrace) {
            while !self.check(&TokenKind::RBrace) {
                // `import { type A }`: type-only specifier
                if self.check_identifier("type")
                    && !matches!(self.peek(1).kind, TokenKind::Comma | TokenKind::RBrace)
                    && !(matches!(self.peek(1).kind, TokenKind::Identifier(ref n) if n.as_str() == "as"))
                {
                    self.advance();
                    self.parse_module_export_name()?;
                    if self.check_identifier("as") {
                        self.advance();
                        self.parse_module_export_name()?;
                    }
                } else {
                    let name_span = self.current().span;
                    let is_string = matches!(self.current().kind, TokenKind::String(_));
                    let imported = self.parse_module_export_name()?;
                    let local = if self.check_identifier("as") {
                        self.advance();
                        self.parse_binding_identifier()?
                    } else {
                        if is_string || self.keyword_at(name_span) {
                            return Err(self.error_at(name_span, "Unexpected reserved word"));
                        }
                        Identifier {
                            name: imported.cheap_clone(),
                            span: name_span,
                        }
                    };
                    specifiers.push(ImportSpecifier::Named { local, imported });
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.require_token(&TokenKind::RBrace)?;
        } else {
            return Err(self.unexpected_token("import specifier"));
        }

        self.finish_import(start, specifiers)
    }

    fn finish_import(
        &mut self,
        start: Span,
        specifiers: Vec<ImportSpecifier>,
    ) -> Result<Statement, JsError> {
        self.require_contextual("from")?;
        let source = self.parse_module_specifier()?;
        self.skip_import_attributes()?;
        self.expect_semicolon()?;
        Ok(Statement::Import(ImportDeclaration {
            specifiers,
            source,
            span: self.span_from(start),
        }))
    }

    /// `with { type: "json" }` is accepted and ignored.
    fn skip_import_attributes(&mut self) -> Result<(), JsError> {
        if self.check(&TokenKind::With) && !self.current().newline_before {
            self.advance();
            self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace)?;
        }
        Ok(())
    }

    fn parse_module_specifier(&mut self) -> Result<JsString, JsError> {
        if let TokenKind::String(s) = &self.current().kind {
            let s = s.cheap_clone();
            self.advance();
            Ok(s)
        } else {
            Err(self.unexpected_token("module specifier"))
        }
    }

    /// ModuleExportName: an IdentifierName or a string literal.
    fn parse_module_export_name(&mut self) -> Result<JsString, JsError> {
        if let TokenKind::String(s) = &self.current().kind {
            let s = s.cheap_clone();
            self.advance();
            return Ok(s);
        }
        self.parse_identifier_name()
    }

    fn keyword_at(&self, span: Span) -> bool {
        self.tokens
            .iter()
            .find(|t| t.span == span)
            .is_some_and(|t| t.kind.keyword_text().is_some())
    }

    fn parse_export_declaration(&mut self, start: Span) -> Result<Statement, JsError> {
        self.require_module("export")?;
        self.require_token(&TokenKind::Export)?;

        let kind = match &self.current().kind {
            TokenKind::Default => {
                self.advance();
                let decl_start = self.current().span;
                if self.check(&TokenKind::Function) {
                    let stmt = self.parse_function_declaration(decl_start, false, true)?;
                    ExportKind::DefaultDeclaration(Box::new(stmt))
                } else if self.check_identifier("async")
                    && self.peek_is(1, &TokenKind::Function)
                    && !self.peek(1).newline_before
                {
                    self.advance();
                    let stmt = self.parse_function_declaration(decl_start, true, true)?;
                    ExportKind::DefaultDeclaration(Box::new(stmt))
                } else if self.check(&TokenKind::Class)
                    || (self.check_identifier("abstract") && self.peek_is(1, &TokenKind::Class))
                {
                    if self.check_identifier("abstract") {
                        self.advance();
                    }
                    let class = self.parse_class(decl_start, true)?;
                    ExportKind::DefaultDeclaration(Box::new(Statement::ClassDeclaration(class)))
                } else if self.check_identifier("interface") {
                    self.skip_interface()?;
                    return Ok(Statement::TypeDeclaration(self.span_from(start)));
                } else {
                    let expr = self.with_in(|p| p.parse_assignment_expression())?;
                    self.expect_semicolon()?;
                    ExportKind::DefaultExpression(expr)
                }
            }
            TokenKind::Star => {
                self.advance();
                let exported = if self.check_identifier("as") {
                    self.advance();
                    Some(self.parse_module_export_name()?)
                } else {
                    None
                };
                self.require_contextual("from")?;
                let source = self.parse_module_specifier()?;
                self.skip_import_attributes()?;
                self.expect_semicolon()?;
                ExportKind::All { exported, source }
            }
            TokenKind::LBrace => {
                self.advance();
                let mut specifiers = Vec::new();
                let mut local_names = Vec::new();
                while !self.check(&TokenKind::RBrace) {
                    let spec_start = self.current().span;
                    if self.check_identifier("type")
                        && !matches!(self.peek(1).kind, TokenKind::Comma | TokenKind::RBrace)
                        && !(matches!(self.peek(1).kind, TokenKind::Identifier(ref n) if n.as_str() == "as"))
                    {
                        self.advance();
                        self.parse_module_export_name()?;
                        if self.check_identifier("as") {
                            self.advance();
                            self.parse_module_export_name()?;
                        }
                    } else {
                        let local_is_reference = matches!(self.current().kind, TokenKind::Identifier(_));
                        let local = self.parse_module_export_name()?;
                        let exported = if self.check_identifier("as") {
                            self.advance();
                            self.parse_module_export_name()?
                        } else {
                            local.cheap_clone()
                        };
                        local_names.push((local_is_reference, spec_start));
                        specifiers.push(ExportSpecifier {
                            local,
                            exported,
                            span: self.span_from(spec_start),
                        });
                    }
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                self.require_token(&TokenKind::RBrace)?;
                let source = if self.check_identifier("from") {
                    self.advance();
                    let source = self.parse_module_specifier()?;
                    self.skip_import_attributes()?;
                    Some(source)
                } else {
                    // Without `from`, every local must be an identifier reference.
                    if let Some((_, span)) = local_names.iter().find(|(is_ref, _)| !is_ref) {
                        return Err(self.error_at(*span, "Unexpected token in export list"));
                    }
                    None
                };
                self.expect_semicolon()?;
                ExportKind::Named { specifiers, source }
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl_start = self.current().span;
                let kind = match self.current().kind {
                    TokenKind::Var => VariableKind::Var,
                    TokenKind::Let => VariableKind::Let,
                    _ => VariableKind::Const,
                };
                self.advance();
                let stmt = self.parse_variable_statement(kind, decl_start)?;
                ExportKind::Declaration(Box::new(stmt))
            }
            TokenKind::Function => {
                let decl_start = self.current().span;
                let stmt = self.parse_function_declaration(decl_start, false, false)?;
                ExportKind::Declaration(Box::new(stmt))
            }
            TokenKind::Class => {
                let decl_start = self.current().span;
                let class = self.parse_class(decl_start, false)?;
                ExportKind::Declaration(Box::new(Statement::ClassDeclaration(class)))
            }
            TokenKind::Identifier(name) => {
                let name = name.cheap_clone();
                let decl_start = self.current().span;
                match name.as_str() {
                    "async" if self.peek_is(1, &TokenKind::Function) => {
                        self.advance();
                        let stmt = self.parse_function_declaration(decl_start, true, false)?;
                        ExportKind::Declaration(Box::new(stmt))
                    }
                    "abstract" if self.peek_is(1, &TokenKind::Class) => {
                        self.advance();
                        let class = self.parse_class(decl_start, false)?;
                        ExportKind::Declaration(Box::new(Statement::ClassDeclaration(class)))
                    }
                    _ => {
                        if let Some(stmt) = self.try_parse_type_only_statement(decl_start)? {
                            if let Statement::TypeDeclaration(_) = stmt {
                                return Ok(Statement::TypeDeclaration(self.span_from(start)));
                            }
                            return Ok(stmt);
                        }
                        // `export type { A }`
                        if self.check_identifier("type") && self.peek_is(1, &TokenKind::LBrace) {
                            self.skip_declaration();
                            return Ok(Statement::TypeDeclaration(self.span_from(start)));
                        }
                        return Err(self.unexpected_token("export declaration"));
                    }
                }
            }
            _ => return Err(self.unexpected_token("export declaration")),
        };

        Ok(Statement::Export(ExportDeclaration {
            kind,
            span: self.span_from(start),
        }))
    }

    // ============ FUNCTIONS ============

    fn enter_function(&mut self, context: FunctionContext) {
        let outer = std::mem::replace(&mut self.context, context);
        self.outer_contexts.push(outer);
    }

    fn leave_function(&mut self) -> FunctionContext {
        let outer = self.outer_contexts.pop().unwrap_or_default();
        std::mem::replace(&mut self.context, outer)
    }

    /// Context for a function with its own `this`.
    fn function_context(&self, kind: FunctionKind, form: FunctionForm) -> FunctionContext {
        FunctionContext {
            strict: self.context.strict,
            is_async: kind.is_async(),
            is_generator: kind.is_generator(),
            in_function: !matches!(
                form,
                FunctionForm::FieldInitializer | FunctionForm::StaticBlock
            ),
            super_call: matches!(form, FunctionForm::ClassConstructor { derived: true, .. }),
            super_property: form.is_method_like()
                || matches!(form, FunctionForm::ClassConstructor { .. }),
            new_target: true,
            ..FunctionContext::default()
        }
    }

    /// Arrows inherit `super`, `new.target` and strictness from their
    /// surroundings.
    fn arrow_context(&self, is_async: bool) -> FunctionContext {
        FunctionContext {
            strict: self.context.strict,
            is_async,
            is_generator: false,
            in_function: true,
            super_call: self.context.super_call,
            super_property: self.context.super_property,
            new_target: self.context.new_target,
            ..FunctionContext::default()
        }
    }

    /// `function` declaration. Returns a type declaration for a TypeScript
    /// overload signature (no body).
    fn parse_function_declaration(
        &mut self,
        start: Span,
        is_async: bool,
        allow_anonymous: bool,
    ) -> Result<Statement, JsError> {
        self.require_token(&TokenKind::Function)?;
        let is_generator = self.match_token(&TokenKind::Star);
        let id = if let TokenKind::Identifier(_) = &self.current().kind {
            Some(self.parse_binding_identifier()?)
        } else if allow_anonymous {
            None
        } else {
            return Err(self.unexpected_token("function name"));
        };
        let kind = FunctionKind::new(is_async, is_generator);
        match self.parse_function_rest(start, id, kind, FunctionForm::Declaration)? {
            Some(function) => Ok(Statement::FunctionDeclaration(Rc::new(function))),
            None => Ok(Statement::TypeDeclaration(self.span_from(start))),
        }
    }

    fn parse_function_expression(
        &mut self,
        start: Span,
        is_async: bool,
    ) -> Result<Expression, JsError> {
        self.require_token(&TokenKind::Function)?;
        let is_generator = self.match_token(&TokenKind::Star);
        let kind = FunctionKind::new(is_async, is_generator);
        let id = if let TokenKind::Identifier(name) = &self.current().kind {
            // The name of a generator/async expression is bound inside it.
            let name = name.cheap_clone();
            let span = self.current().span;
            if (is_generator && name.as_str() == "yield") || (is_async && name.as_str() == "await") {
                return Err(self.error_at(span, "Unexpected reserved word"));
            }
            Some(self.parse_binding_identifier()?)
        } else {
            None
        };
        match self.parse_function_rest(start, id, kind, FunctionForm::Expression)? {
            Some(function) => Ok(Expression::Function(Rc::new(function))),
            None => Err(self.error("Function implementation is missing")),
        }
    }

    /// Type parameters, parameters, return type and body of any non-arrow
    /// function. `None` for a body-less TypeScript signature.
    fn parse_function_rest(
        &mut self,
        start: Span,
        id: Option<Identifier>,
        kind: FunctionKind,
        form: FunctionForm,
    ) -> Result<Option<Function>, JsError> {
        self.skip_type_parameters()?;
        let context = self.function_context(kind, form);
        self.enter_function(context);
        let parts = self.parse_parameters_and_body();
        let context = self.leave_function();
        let Some((params, body)) = parts? else {
            return Ok(None);
        };
        let function = self.finish_function(
            start,
            id,
            params,
            FunctionBody::Block(body),
            kind,
            form,
            &context,
        )?;
        Ok(Some(function))
    }

    fn parse_parameters_and_body(
        &mut self,
    ) -> Result<Option<(Vec<Pattern>, Vec<Statement>)>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let params = self.parse_formal_parameters()?;
        self.skip_type_annotation()?;
        if !self.check(&TokenKind::LBrace) {
            if self.match_token(&TokenKind::Semicolon)
                || self.current().newline_before
                || self.check(&TokenKind::RBrace)
                || self.is_at_end()
            {
                return Ok(None);
            }
            return Err(self.unexpected_token("'{'"));
        }
        let body = self.parse_function_body()?;
        Ok(Some((params, body)))
    }

    fn parse_function_body(&mut self) -> Result<Vec<Statement>, JsError> {
        self.require_token(&TokenKind::LBrace)?;
        let body = self.with_in(|p| p.parse_statement_list(true, &TokenKind::RBrace))?;
        self.require_token(&TokenKind::RBrace)?;
        Ok(body)
    }

    /// Formal parameters after `(`, consuming the closing `)`.
    fn parse_formal_parameters(&mut self) -> Result<Vec<Pattern>, JsError> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            // TypeScript `this: T` pseudo-parameter
            if self.check(&TokenKind::This) && self.peek_is(1, &TokenKind::Colon) {
                self.advance();
                self.skip_type_annotation()?;
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
                continue;
            }
            self.skip_parameter_modifiers();
            let param_start = self.current().span;
            if self.match_token(&TokenKind::DotDotDot) {
                let argument = self.parse_binding_target()?;
                self.match_token(&TokenKind::Question);
                self.skip_type_annotation()?;
                if self.check(&TokenKind::Eq) {
                    return Err(self.error("Rest parameter may not have a default initializer"));
                }
                params.push(Pattern::Rest(RestElement {
                    argument: Box::new(argument),
                    span: self.span_from(param_start),
                }));
                if !self.check(&TokenKind::RParen) {
                    return Err(self.error("Rest parameter must be last formal parameter"));
                }
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RParen)?;
        Ok(params)
    }

    /// Early errors shared by every function form, then the function node
    /// with its hoisting information.
    #[allow(clippy::too_many_arguments)]
    fn finish_function(
        &mut self,
        start: Span,
        id: Option<Identifier>,
        params: Vec<Pattern>,
        body: FunctionBody,
        kind: FunctionKind,
        form: FunctionForm,
        context: &FunctionContext,
    ) -> Result<Function, JsError> {
        let scope = hoist::function_scope(&params, &body, form, context.uses_arguments);
        let strict = context.strict;

        if context.use_strict_directive && !scope.simple_parameter_list {
            return Err(self.error_at(
                start,
                "Illegal 'use strict' directive in function with non-simple parameter list",
            ));
        }
        let duplicates_forbidden = strict
            || form.is_arrow()
            || form.is_method_like()
            || matches!(form, FunctionForm::ClassConstructor { .. })
            || !scope.simple_parameter_list;
        if scope.has_duplicates && duplicates_forbidden {
            return Err(self.error_at(start, "Duplicate parameter name not allowed in this context"));
        }
        if strict {
            let restricted = |name: &JsString| matches!(name.as_str(), "eval" | "arguments");
            if scope.parameter_names.iter().any(restricted)
                || id.as_ref().is_some_and(|id| restricted(&id.name))
            {
                return Err(self.error_at(start, "Unexpected eval or arguments in strict mode"));
            }
        }
        match form {
            FunctionForm::Getter if !params.is_empty() => {
                return Err(self.error_at(start, "Getter must not have any formal parameters"));
            }
            FunctionForm::Setter
                if params.len() != 1 || matches!(params.first(), Some(Pattern::Rest(_))) =>
            {
                return Err(self.error_at(start, "Setter must have exactly one formal parameter"));
            }
            FunctionForm::FieldInitializer | FunctionForm::StaticBlock if context.uses_arguments => {
                return Err(self.error_at(
                    start,
                    "'arguments' is not allowed in class field initializer or static initialization block",
                ));
            }
            _ => {}
        }
        self.check_var_scope(&scope.body, &scope.parameter_names)?;

        Ok(Function {
            id,
            params,
            body,
            kind,
            form,
            strict,
            scope,
            source_text: self.source_text(start),
            span: self.span_from(start),
        })
    }

    /// `async`, `*`, `get` and `set` in front of a method name.
    fn parse_method_prefix(&mut self) -> (bool, bool, Option<MethodKind>) {
        let mut is_async = false;
        if self.check_identifier("async")
            && !self.peek(1).newline_before
            && self.starts_property_name_at(1)
        {
            self.advance();
            is_async = true;
        }
        let is_generator = self.match_token(&TokenKind::Star);
        let mut accessor = None;
        if !is_async && !is_generator && self.starts_property_name_at(1) {
            if self.check_identifier("get") {
                accessor = Some(MethodKind::Get);
            } else if self.check_identifier("set") {
                accessor = Some(MethodKind::Set);
            }
            if accessor.is_some() {
                self.advance();
            }
        }
        (is_async, is_generator, accessor)
    }

    fn starts_property_name_at(&self, offset: usize) -> bool {
        match &self.peek(offset).kind {
            TokenKind::Identifier(_)
            | TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::LBracket
            | TokenKind::Star
            | TokenKind::Hash => true,
            kind => kind.keyword_text().is_some(),
        }
    }

    /// PropertyName: identifier name, string, number or `[computed]`.
    fn parse_property_name(&mut self) -> Result<ObjectPropertyKey, JsError> {
        let span = self.current().span;
        let key = match &self.current().kind {
            TokenKind::Identifier(name) => ObjectPropertyKey::Identifier(Identifier {
                name: name.cheap_clone(),
                span,
            }),
            TokenKind::String(s) => ObjectPropertyKey::String(s.cheap_clone()),
            TokenKind::Number(n) => ObjectPropertyKey::Number(*n),
            TokenKind::LBracket => {
                self.advance();
                let expr = self.with_in(|p| p.parse_assignment_expression())?;
                self.require_token(&TokenKind::RBracket)?;
                return Ok(ObjectPropertyKey::Computed(Box::new(expr)));
            }
            TokenKind::Hash => {
                return Err(self.error("Private class members are not supported"));
            }
            kind => match kind.keyword_text() {
                Some(text) => {
                    let name = self.intern(text);
                    ObjectPropertyKey::Identifier(Identifier { name, span })
                }
                None => return Err(self.unexpected_token("property name")),
            },
        };
        self.advance();
        Ok(key)
    }

    // ============ CLASSES ============

    fn parse_class(&mut self, start: Span, allow_anonymous: bool) -> Result<Rc<Class>, JsError> {
        self.require_token(&TokenKind::Class)?;
        // All parts of a class are strict mode code.
        let outer_strict = self.context.strict;
        self.context.strict = true;
        let class = self.parse_class_rest(start, allow_anonymous);
        self.context.strict = outer_strict;
        class
    }

    fn parse_class_rest(
        &mut self,
        start: Span,
        allow_anonymous: bool,
    ) -> Result<Rc<Class>, JsError> {
        let id = if matches!(&self.current().kind, TokenKind::Identifier(_))
            && !self.check_identifier("implements")
        {
            Some(self.parse_binding_identifier()?)
        } else if allow_anonymous {
            None
        } else {
            return Err(self.unexpected_token("class name"));
        };
        self.skip_type_parameters()?;

        let super_class = if self.match_token(&TokenKind::Extends) {
            let heritage = self.parse_left_hand_side_expression()?;
            if self.check(&TokenKind::Lt) {
                self.skip_angle_brackets()?;
            }
            Some(Box::new(heritage))
        } else {
            None
        };
        if self.check_identifier("implements") {
            self.advance();
            loop {
                self.skip_type()?;
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let derived = super_class.is_some();
        self.require_token(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        let mut constructor = None;
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            self.parse_class_member(derived, &mut members, &mut constructor)?;
        }
        self.require_token(&TokenKind::RBrace)?;

        let source_text = self.source_text(start);
        let span = self.span_from(start);
        let constructor = match constructor {
            Some(mut function) => {
                // Function.prototype.toString of a class shows the class.
                function.source_text = source_text.cheap_clone();
                Rc::new(function)
            }
            None => {
                let form = FunctionForm::ClassConstructor {
                    derived,
                    synthesized: true,
                };
                let body = FunctionBody::Block(Vec::new());
                let scope = hoist::function_scope(&[], &body, form, false);
                Rc::new(Function {
                    id: None,
                    params: Vec::new(),
                    body,
                    kind: FunctionKind::Normal,
                    form,
                    strict: true,
                    scope,
                    source_text: source_text.cheap_clone(),
                    span,
                })
            }
        };

        Ok(Rc::new(Class {
            id,
            super_class,
            constructor,
            members,
            source_text,
            span,
        }))
    }

    fn next_starts_member(&self) -> bool {
        !matches!(
            self.peek(1).kind,
            TokenKind::LParen
                | TokenKind::Eq
                | TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::Colon
                | TokenKind::Question
                | TokenKind::Bang
                | TokenKind::Lt
                | TokenKind::Comma
                | TokenKind::Eof
        )
    }

    fn parse_class_member(
        &mut self,
        derived: bool,
        members: &mut Vec<ClassMember>,
        constructor: &mut Option<Function>,
    ) -> Result<(), JsError> {
        let start = self.current().span;
        let mut is_static = false;
        let mut ambient = false;

        loop {
            let TokenKind::Identifier(name) = &self.current().kind else {
                break;
            };
            let name = name.cheap_clone();
            match name.as_str() {
                "static" if !is_static && self.next_starts_member() => {
                    self.advance();
                    is_static = true;
                    if self.check(&TokenKind::LBrace) {
                        let block = self.parse_static_block(start)?;
                        members.push(ClassMember::StaticBlock(Rc::new(block)));
                        return Ok(());
                    }
                }
                "public" | "private" | "protected" | "readonly" | "override" | "accessor"
                    if self.next_starts_member() =>
                {
                    self.advance();
                }
                "declare" | "abstract" if self.next_starts_member() => {
                    self.advance();
                    ambient = true;
                }
                _ => break,
            }
        }

        // TypeScript index signature `[key: string]: T;`
        if self.check(&TokenKind::LBracket)
            && matches!(self.peek(1).kind, TokenKind::Identifier(_))
            && self.peek_is(2, &TokenKind::Colon)
        {
            self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket)?;
            self.skip_type_annotation()?;
            self.match_token(&TokenKind::Semicolon);
            return Ok(());
        }

        let (is_async, is_generator, accessor) = self.parse_method_prefix();
        let key = self.parse_property_name()?;
        let named = |text: &str| match &key {
            ObjectPropertyKey::Identifier(id) => id.name.as_str() == text,
            ObjectPropertyKey::String(s) => s.as_str() == text,
            _ => false,
        };
        let is_constructor_name = named("constructor");
        let is_prototype_name = named("prototype");

        // `x?: T` and `x!: T`
        if self.check(&TokenKind::Question)
            || (self.check(&TokenKind::Bang) && !self.current().newline_before)
        {
            self.advance();
        }

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::Lt) {
            let method_kind = accessor.unwrap_or(MethodKind::Method);
            if is_constructor_name && !is_static {
                if method_kind != MethodKind::Method || is_async || is_generator {
                    return Err(self.error_at(start, "Class constructor may not be an accessor, async or generator"));
                }
                let form = FunctionForm::ClassConstructor {
                    derived,
                    synthesized: false,
                };
                if let Some(function) =
                    self.parse_function_rest(start, None, FunctionKind::Normal, form)?
                {
                    if constructor.is_some() {
                        return Err(self.error_at(start, "A class may only have one constructor"));
                    }
                    *constructor = Some(function);
                }
                return Ok(());
            }
            if is_static && is_prototype_name {
                return Err(self.error_at(start, "Classes may not have a static property named 'prototype'"));
            }
            let form = match method_kind {
                MethodKind::Method => FunctionForm::Method,
                MethodKind::Get => FunctionForm::Getter,
                MethodKind::Set => FunctionForm::Setter,
            };
            let kind = FunctionKind::new(is_async, is_generator);
            if let Some(function) = self.parse_function_rest(start, None, kind, form)? {
                members.push(ClassMember::Method(ClassMethod {
                    key,
                    value: Rc::new(function),
                    kind: method_kind,
                    static_: is_static,
                    span: self.span_from(start),
                }));
            }
            return Ok(());
        }

        if is_async || is_generator || accessor.is_some() {
            return Err(self.unexpected_token("'('"));
        }
        if is_constructor_name {
            return Err(self.error_at(start, "Classes may not have a field named 'constructor'"));
        }
        if is_static && is_prototype_name {
            return Err(self.error_at(start, "Classes may not have a static property named 'prototype'"));
        }
        self.skip_type_annotation()?;
        let initializer = if self.match_token(&TokenKind::Eq) {
            Some(Rc::new(self.parse_field_initializer()?))
        } else {
            None
        };
        self.expect_semicolon()?;
        if !ambient {
            members.push(ClassMember::Field(ClassField {
                key,
                initializer,
                static_: is_static,
                span: self.span_from(start),
            }));
        }
        Ok(())
    }

    /// The initializer of a class field, as a method-like function whose
    /// body is the expression.
    fn parse_field_initializer(&mut self) -> Result<Function, JsError> {
        let start = self.current().span;
        let form = FunctionForm::FieldInitializer;
        let context = self.function_context(FunctionKind::Normal, form);
        self.enter_function(context);
        let expr = self.with_in(|p| p.parse_assignment_expression());
        let context = self.leave_function();
        let body = FunctionBody::Expression(Box::new(expr?));
        self.finish_function(start, None, Vec::new(), body, FunctionKind::Normal, form, &context)
    }

    fn parse_static_block(&mut self, start: Span) -> Result<Function, JsError> {
        let form = FunctionForm::StaticBlock;
        let context = self.function_context(FunctionKind::Normal, form);
        self.enter_function(context);
        let body = self.parse_static_block_body();
        let context = self.leave_function();
        let body = FunctionBody::Block(body?);
        self.finish_function(start, None, Vec::new(), body, FunctionKind::Normal, form, &context)
    }

    fn parse_static_block_body(&mut self) -> Result<Vec<Statement>, JsError> {
        self.require_token(&TokenKind::LBrace)?;
        let body = self.with_in(|p| p.parse_statement_list(false, &TokenKind::RBrace))?;
        self.require_token(&TokenKind::RBrace)?;
        Ok(body)
    }

    // ============ TYPESCRIPT (parsed and dropped) ============

    fn skip_type_annotation(&mut self) -> Result<(), JsError> {
        if self.match_token(&TokenKind::Colon) {
            self.skip_type()?;
        }
        Ok(())
    }

    fn skip_type(&mut self) -> Result<(), JsError> {
        self.skip_union_type()?;
        // Conditional type `A extends B ? C : D`
        if self.check(&TokenKind::Extends) && !self.current().newline_before {
            self.advance();
            self.skip_union_type()?;
            self.require_token(&TokenKind::Question)?;
            self.skip_type()?;
            self.require_token(&TokenKind::Colon)?;
            self.skip_type()?;
        }
        Ok(())
    }

    fn skip_union_type(&mut self) -> Result<(), JsError> {
        if self.check(&TokenKind::Pipe) || self.check(&TokenKind::Amp) {
            self.advance();
        }
        loop {
            self.skip_primary_type()?;
            if self.check(&TokenKind::Pipe) || self.check(&TokenKind::Amp) {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }

    fn type_starts_at(&self, offset: usize) -> bool {
        matches!(
            self.peek(offset).kind,
            TokenKind::Identifier(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::Null
                | TokenKind::This
        )
    }

    fn skip_primary_type(&mut self) -> Result<(), JsError> {
        while let TokenKind::Identifier(name) = &self.current().kind {
            let is_operator = matches!(
                name.as_str(),
                "keyof" | "unique" | "readonly" | "infer" | "asserts"
            );
            if is_operator && self.type_starts_at(1) {
                self.advance();
            } else {
                break;
            }
        }

        match &self.current().kind {
            TokenKind::LParen => {
                self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen)?;
                if self.match_token(&TokenKind::Arrow) {
                    self.skip_type()?;
                }
            }
            TokenKind::Lt => {
                self.skip_angle_brackets()?;
                self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen)?;
                self.require_token(&TokenKind::Arrow)?;
                self.skip_type()?;
            }
            TokenKind::New => {
                self.advance();
                if self.check(&TokenKind::Lt) {
                    self.skip_angle_brackets()?;
                }
                self.skip_balanced(&TokenKind::LParen, &TokenKind::RParen)?;
                self.require_token(&TokenKind::Arrow)?;
                self.skip_type()?;
            }
            TokenKind::LBracket => self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket)?,
            TokenKind::LBrace => self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace)?,
            TokenKind::Typeof => {
                self.advance();
                self.skip_entity_name()?;
            }
            TokenKind::Minus => {
                self.advance();
                if !matches!(self.current().kind, TokenKind::Number(_)) {
                    return Err(self.unexpected_token("number"));
                }
                self.advance();
            }
            TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Void
            | TokenKind::This
            | TokenKind::TemplateNoSub(_) => self.advance(),
            TokenKind::Identifier(_) => {
                self.skip_entity_name()?;
                if self.check(&TokenKind::Lt) && !self.current().newline_before {
                    self.skip_angle_brackets()?;
                }
                // Type predicate `x is T`
                if self.check_identifier("is") && !self.current().newline_before {
                    self.advance();
                    self.skip_type()?;
                }
            }
            _ => return Err(self.unexpected_token("type")),
        }

        // `T[]` and `T[K]`
        while self.check(&TokenKind::LBracket) && !self.current().newline_before {
            self.skip_balanced(&TokenKind::LBracket, &TokenKind::RBracket)?;
        }
        Ok(())
    }

    fn skip_entity_name(&mut self) -> Result<(), JsError> {
        self.parse_identifier_name()?;
        while self.match_token(&TokenKind::Dot) {
            self.parse_identifier_name()?;
        }
        Ok(())
    }

    /// Skip from `open` through its matching `close`.
    fn skip_balanced(&mut self, open: &TokenKind, close: &TokenKind) -> Result<(), JsError> {
        self.require_token(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.unexpected_token("closing bracket"));
            }
            if self.check(open) {
                depth += 1;
            } else if self.check(close) {
                depth -= 1;
            }
            self.advance();
        }
        Ok(())
    }

    /// Skip `<...>`, counting `>>` and `>>>` as several closers.
    fn skip_angle_brackets(&mut self) -> Result<(), JsError> {
        self.require_token(&TokenKind::Lt)?;
        let mut depth: i32 = 1;
        while depth > 0 {
            depth += match &self.current().kind {
                TokenKind::Lt => 1,
                TokenKind::Gt => -1,
                TokenKind::GtGt => -2,
                TokenKind::GtGtGt => -3,
                TokenKind::Eof => return Err(self.unexpected_token("'>'")),
                _ => 0,
            };
            self.advance();
        }
        Ok(())
    }

    fn skip_type_parameters(&mut self) -> Result<(), JsError> {
        if self.check(&TokenKind::Lt) {
            self.skip_angle_brackets()?;
        }
        Ok(())
    }

    /// Type arguments in expression position (`f<T>(x)`). Only taken when
    /// the bracketed tokens look like types and a call follows; otherwise
    /// the `<` is a comparison.
    fn try_skip_type_arguments(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        let mut depth: i32 = 0;
        loop {
            let delta = match &self.current().kind {
                TokenKind::Lt => 1,
                TokenKind::Gt => -1,
                TokenKind::GtGt => -2,
                TokenKind::GtGtGt => -3,
                TokenKind::Identifier(_)
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::Colon
                | TokenKind::Pipe
                | TokenKind::Amp
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::Arrow
                | TokenKind::Question
                | TokenKind::Typeof
                | TokenKind::Void
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::This
                | TokenKind::Extends
                | TokenKind::Minus
                | TokenKind::DotDotDot => 0,
                _ => {
                    self.restore(checkpoint);
                    return false;
                }
            };
            self.advance();
            depth += delta;
            if depth <= 0 {
                break;
            }
        }
        let call_follows = self.check(&TokenKind::LParen)
            || matches!(
                self.current().kind,
                TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_)
            );
        if depth == 0 && call_follows {
            true
        } else {
            self.restore(checkpoint);
            false
        }
    }

    /// `public`, `private`, `protected`, `readonly` and `override` in front
    /// of a constructor parameter.
    fn skip_parameter_modifiers(&mut self) {
        while let TokenKind::Identifier(name) = &self.current().kind {
            let is_modifier = matches!(
                name.as_str(),
                "public" | "private" | "protected" | "readonly" | "override"
            );
            let target_follows = matches!(
                self.peek(1).kind,
                TokenKind::Identifier(_) | TokenKind::LBrace | TokenKind::LBracket
            );
            if is_modifier && target_follows {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// `type X = ...`, `interface X {}`, `declare ...` and
    /// `namespace X {}`: statements with no runtime effect.
    fn try_parse_type_only_statement(&mut self, start: Span) -> Result<Option<Statement>, JsError> {
        let TokenKind::Identifier(name) = &self.current().kind else {
            return Ok(None);
        };
        let name = name.cheap_clone();
        let next = self.peek(1);
        let next_is_name = matches!(next.kind, TokenKind::Identifier(_)) && !next.newline_before;
        let next_is_declaration = !next.newline_before
            && matches!(
                next.kind,
                TokenKind::Var
                    | TokenKind::Let
                    | TokenKind::Const
                    | TokenKind::Function
                    | TokenKind::Class
                    | TokenKind::Enum
            );
        match name.as_str() {
            "type" if next_is_name => {
                self.advance();
                self.advance();
                self.skip_type_parameters()?;
                self.require_token(&TokenKind::Eq)?;
                self.skip_type()?;
                self.expect_semicolon()?;
            }
            "interface" if next_is_name => self.skip_interface()?,
            "declare" if next_is_name || next_is_declaration => {
                self.advance();
                self.skip_declaration();
            }
            "namespace" | "module" if next_is_name && self.peek_is(2, &TokenKind::LBrace) => {
                self.advance();
                self.advance();
                self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace)?;
            }
            _ => return Ok(None),
        }
        Ok(Some(Statement::TypeDeclaration(self.span_from(start))))
    }

    fn skip_interface(&mut self) -> Result<(), JsError> {
        self.advance();
        self.parse_identifier_name()?;
        self.skip_type_parameters()?;
        if self.match_token(&TokenKind::Extends) {
            loop {
                self.skip_type()?;
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.skip_balanced(&TokenKind::LBrace, &TokenKind::RBrace)
    }

    /// Skip an ambient declaration: through a `;`, up to a line break, or
    /// through a balanced `{...}` body.
    fn skip_declaration(&mut self) {
        let mut depth: i32 = 0;
        let mut first = true;
        loop {
            let token = self.current();
            if token.kind == TokenKind::Eof || (depth == 0 && !first && token.newline_before) {
                return;
            }
            let closes_body = match token.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => {
                    depth += 1;
                    false
                }
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    depth -= 1;
                    depth <= 0 && token.kind == TokenKind::RBrace
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => false,
            };
            self.advance();
            first = false;
            if closes_body {
                return;
            }
        }
    }

    // ============ EXPRESSIONS ============

    /// Run `f` with the `in` operator allowed again.
    fn with_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, JsError>) -> Result<T, JsError> {
        let saved = self.no_in;
        self.no_in = false;
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        let first = self.parse_assignment_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::Sequence(SequenceExpression {
            expressions,
            span: self.span_from(start),
        }))
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        if self.context.is_generator && self.check_identifier("yield") {
            return self.parse_yield_expression();
        }
        if let Some(arrow) = self.try_parse_arrow_function()? {
            return Ok(arrow);
        }

        let start = self.current().span;
        let covers = self.cover_initializers.len();
        let expr = self.parse_conditional_expression()?;
        let Some(operator) = self.current_assignment_op() else {
            return Ok(expr);
        };

        let left = if operator == AssignmentOp::Assign
            && matches!(expr, Expression::Object(_) | Expression::Array(_))
        {
            let pattern = self.expression_to_pattern(expr)?;
            self.cover_initializers.truncate(covers);
            AssignmentTarget::Pattern(pattern)
        } else if self.is_simple_target(&expr) {
            AssignmentTarget::Simple(Box::new(expr))
        } else {
            return Err(self.error_at(start, "Invalid left-hand side in assignment"));
        };
        self.advance();
        let right = self.parse_assignment_expression()?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left,
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    /// Index of the token after the `)` matching the `(` at `open`.
    fn token_after_parens(&self, open: usize) -> Option<&Token> {
        let mut depth = 0usize;
        let mut index = open;
        loop {
            let token = self.tokens.get(index)?;
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.tokens.get(index + 1);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            index += 1;
        }
    }

    /// Whether the parenthesized head at `open` can start an arrow function,
    /// and whether that is certain (a `=>` directly follows the `)`).
    fn arrow_head_at(&self, open: usize) -> Option<bool> {
        match self.tokens.get(open).map(|t| &t.kind) {
            Some(TokenKind::Lt) => Some(false),
            Some(TokenKind::LParen) => match self.token_after_parens(open).map(|t| &t.kind) {
                Some(TokenKind::Arrow) => Some(true),
                Some(TokenKind::Colon) => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn try_parse_arrow_function(&mut self) -> Result<Option<Expression>, JsError> {
        let start = self.current().span;
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let is_async = name.as_str() == "async";
                // `x => ...`
                if self.peek_is(1, &TokenKind::Arrow) {
                    if self.peek(1).newline_before {
                        return Err(self.error("Line terminator not permitted before arrow"));
                    }
                    let param = self.parse_binding_identifier()?;
                    self.advance();
                    let context = self.arrow_context(false);
                    self.enter_function(context);
                    return self
                        .finish_arrow_function(start, vec![Pattern::Identifier(param)], false)
                        .map(Some);
                }
                if !is_async || self.peek(1).newline_before {
                    return Ok(None);
                }
                // `async x => ...`
                if matches!(self.peek(1).kind, TokenKind::Identifier(_))
                    && self.peek_is(2, &TokenKind::Arrow)
                {
                    self.advance();
                    let context = self.arrow_context(true);
                    self.enter_function(context);
                    let param = match self.parse_binding_identifier() {
                        Ok(param) => param,
                        Err(err) => {
                            self.leave_function();
                            return Err(err);
                        }
                    };
                    if self.current().newline_before {
                        self.leave_function();
                        return Err(self.error("Line terminator not permitted before arrow"));
                    }
                    self.advance();
                    return self
                        .finish_arrow_function(start, vec![Pattern::Identifier(param)], true)
                        .map(Some);
                }
                // `async (...) => ...`
                let Some(definite) = self.arrow_head_at(self.pos + 1) else {
                    return Ok(None);
                };
                let checkpoint = self.checkpoint();
                self.advance();
                self.try_parse_parenthesized_arrow(start, true, definite, checkpoint)
            }
            TokenKind::LParen | TokenKind::Lt => {
                let Some(definite) = self.arrow_head_at(self.pos) else {
                    return Ok(None);
                };
                let checkpoint = self.checkpoint();
                self.try_parse_parenthesized_arrow(start, false, definite, checkpoint)
            }
            _ => Ok(None),
        }
    }

    fn try_parse_parenthesized_arrow(
        &mut self,
        start: Span,
        is_async: bool,
        definite: bool,
        checkpoint: Checkpoint,
    ) -> Result<Option<Expression>, JsError> {
        let context = self.arrow_context(is_async);
        self.enter_function(context);
        match self.parse_arrow_head() {
            Ok(params) => self.finish_arrow_function(start, params, is_async).map(Some),
            Err(err) => {
                self.leave_function();
                if definite {
                    return Err(err);
                }
                self.restore(checkpoint);
                Ok(None)
            }
        }
    }

    /// Type parameters, parameter list, return type and the `=>`.
    fn parse_arrow_head(&mut self) -> Result<Vec<Pattern>, JsError> {
        self.skip_type_parameters()?;
        self.require_token(&TokenKind::LParen)?;
        let params = self.parse_formal_parameters()?;
        self.skip_type_annotation()?;
        if !self.check(&TokenKind::Arrow) {
            return Err(self.unexpected_token("'=>'"));
        }
        if self.current().newline_before {
            return Err(self.error("Line terminator not permitted before arrow"));
        }
        self.advance();
        Ok(params)
    }

    /// Arrow body, parsed inside the arrow's context (already entered).
    fn finish_arrow_function(
        &mut self,
        start: Span,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expression, JsError> {
        let body = if self.check(&TokenKind::LBrace) {
            self.parse_function_body().map(FunctionBody::Block)
        } else {
            self.parse_assignment_expression()
                .map(|expr| FunctionBody::Expression(Box::new(expr)))
        };
        let context = self.leave_function();
        // Arrows see the enclosing function's `arguments`.
        if context.uses_arguments {
            self.context.uses_arguments = true;
        }
        let function = self.finish_function(
            start,
            None,
            params,
            body?,
            FunctionKind::new(is_async, false),
            FunctionForm::Arrow,
            &context,
        )?;
        Ok(Expression::ArrowFunction(Rc::new(function)))
    }

    fn parse_yield_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        self.advance();
        let delegate = !self.current().newline_before && self.match_token(&TokenKind::Star);
        let no_argument = self.current().newline_before
            || matches!(
                self.current().kind,
                TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Question
                    | TokenKind::Semicolon
                    | TokenKind::In
                    | TokenKind::Eof
                    | TokenKind::TemplateMiddle(_)
                    | TokenKind::TemplateTail(_)
            );
        let argument = if delegate || !no_argument {
            Some(Box::new(self.parse_assignment_expression()?))
        } else {
            None
        };
        Ok(Expression::Yield(YieldExpression {
            argument,
            delegate,
            span: self.span_from(start),
        }))
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        let test = self.parse_binary_expression(1)?;
        if !self.match_token(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.with_in(|p| p.parse_assignment_expression())?;
        self.require_token(&TokenKind::Colon)?;
        let alternate = self.parse_assignment_expression()?;
        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span_from(start),
        }))
    }

    /// Precedence climbing over the binary and logical operators.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<Expression, JsError> {
        const RELATIONAL: u8 = 8;
        let start = self.current().span;
        let mut left = self.parse_unary_expression()?;
        loop {
            // TypeScript `x as T`, `x as const` and `x satisfies T`
            if min_precedence <= RELATIONAL
                && !self.current().newline_before
                && (self.check_identifier("as") || self.check_identifier("satisfies"))
            {
                self.advance();
                if !self.match_token(&TokenKind::Const) {
                    self.skip_type()?;
                }
                continue;
            }

            let Some((operator, precedence)) = self.current_binary_op() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            let operator_span = self.current().span;
            self.advance();

            let right = if matches!(operator, BinaryOperator::Binary(BinaryOp::Exp)) {
                if matches!(left, Expression::Unary(_)) {
                    return Err(self.error_at(
                        operator_span,
                        "Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence",
                    ));
                }
                self.parse_binary_expression(precedence)?
            } else {
                self.parse_binary_expression(precedence + 1)?
            };

            let span = self.span_from(start);
            left = match operator {
                BinaryOperator::Binary(operator) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                }),
                BinaryOperator::Logical(operator) => {
                    let mixes = |expr: &Expression| match expr {
                        Expression::Logical(inner) => {
                            (inner.operator == LogicalOp::NullishCoalescing)
                                != (operator == LogicalOp::NullishCoalescing)
                        }
                        _ => false,
                    };
                    if mixes(&left) || mixes(&right) {
                        return Err(self.error_at(
                            operator_span,
                            "Cannot mix ?? with && or || without parentheses",
                        ));
                    }
                    Expression::Logical(LogicalExpression {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    })
                }
            };
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        if let Some(operator) = self.current_unary_op() {
            self.advance();
            let argument = self.parse_unary_expression()?;
            if operator == UnaryOp::Delete
                && self.context.strict
                && matches!(argument.unparenthesized(), Expression::Identifier(_))
            {
                return Err(self.error_at(start, "Delete of an unqualified identifier in strict mode."));
            }
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }
        if let Some(operator) = self.current_update_op() {
            self.advance();
            let argument = self.parse_unary_expression()?;
            if !self.is_simple_target(&argument) {
                return Err(self.error_at(start, "Invalid left-hand side expression in prefix operation"));
            }
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(argument),
                prefix: true,
                span: self.span_from(start),
            }));
        }
        if self.check_identifier("await") {
            if self.context.is_async {
                self.advance();
                let argument = self.parse_unary_expression()?;
                return Ok(Expression::Await(AwaitExpression {
                    argument: Box::new(argument),
                    span: self.span_from(start),
                }));
            }
            if self.source_type == SourceType::Module && self.outer_contexts.is_empty() {
                return Err(self.error("Top-level await is not supported"));
            }
        }
        // TypeScript type assertion `<T>expr`
        if self.check(&TokenKind::Lt) {
            self.skip_angle_brackets()?;
            return self.parse_unary_expression();
        }
        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        let expr = self.parse_left_hand_side_expression()?;
        if self.current().newline_before {
            return Ok(expr);
        }
        let Some(operator) = self.current_update_op() else {
            return Ok(expr);
        };
        if !self.is_simple_target(&expr) {
            return Err(self.error_at(start, "Invalid left-hand side expression in postfix operation"));
        }
        self.advance();
        Ok(Expression::Update(UpdateExpression {
            operator,
            argument: Box::new(expr),
            prefix: false,
            span: self.span_from(start),
        }))
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        let expr = match self.current().kind {
            TokenKind::New => self.parse_new_expression()?,
            TokenKind::Super => self.parse_super_expression()?,
            _ => self.parse_primary_expression()?,
        };
        self.parse_call_tail(start, expr, true)
    }

    /// Member accesses, calls, tagged templates and optional chains after a
    /// primary expression. `allow_call` is false for the callee of `new`.
    fn parse_call_tail(
        &mut self,
        start: Span,
        mut expr: Expression,
        allow_call: bool,
    ) -> Result<Expression, JsError> {
        let mut in_chain = false;
        loop {
            match &self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_member_identifier()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property,
                        optional: false,
                        span: self.span_from(start),
                    });
                }
                TokenKind::QuestionDot => {
                    if !allow_call {
                        return Err(self.error("Invalid optional chain from new expression"));
                    }
                    self.advance();
                    in_chain = true;
                    match &self.current().kind {
                        TokenKind::LParen => {
                            let arguments = self.parse_call_arguments()?;
                            expr = Expression::Call(CallExpression {
                                callee: Box::new(expr),
                                arguments,
                                optional: true,
                                span: self.span_from(start),
                            });
                        }
                        TokenKind::LBracket => {
                            let property = self.parse_computed_member()?;
                            expr = Expression::Member(MemberExpression {
                                object: Box::new(expr),
                                property,
                                optional: true,
                                span: self.span_from(start),
                            });
                        }
                        TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                            return Err(self.error("Invalid tagged template on optional chain"));
                        }
                        _ => {
                            let property = self.parse_member_identifier()?;
                            expr = Expression::Member(MemberExpression {
                                object: Box::new(expr),
                                property,
                                optional: true,
                                span: self.span_from(start),
                            });
                        }
                    }
                }
                TokenKind::LBracket => {
                    let property = self.parse_computed_member()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property,
                        optional: false,
                        span: self.span_from(start),
                    });
                }
                TokenKind::LParen if allow_call => {
                    let arguments = self.parse_call_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                        span: self.span_from(start),
                    });
                }
                TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                    if in_chain {
                        return Err(self.error("Invalid tagged template on optional chain"));
                    }
                    let quasi = self.parse_template_literal(true)?;
                    expr = Expression::TaggedTemplate(TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasi,
                        span: self.span_from(start),
                    });
                }
                // TypeScript non-null assertion `x!`
                TokenKind::Bang if !self.current().newline_before => self.advance(),
                // TypeScript call type arguments `f<T>(x)`
                TokenKind::Lt if allow_call => {
                    if !self.try_skip_type_arguments() {
                        break;
                    }
                }
                _ => break,
            }
        }
        if in_chain {
            expr = Expression::OptionalChain(OptionalChainExpression {
                base: Box::new(expr),
                span: self.span_from(start),
            });
        }
        Ok(expr)
    }

    fn parse_member_identifier(&mut self) -> Result<MemberProperty, JsError> {
        let span = self.current().span;
        if self.check(&TokenKind::Hash) {
            return Err(self.error("Private class members are not supported"));
        }
        let name = self.parse_identifier_name()?;
        Ok(MemberProperty::Identifier(Identifier { name, span }))
    }

    fn parse_computed_member(&mut self) -> Result<MemberProperty, JsError> {
        self.require_token(&TokenKind::LBracket)?;
        let property = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RBracket)?;
        Ok(MemberProperty::Expression(Box::new(property)))
    }

    fn parse_new_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::New)?;
        if self.match_token(&TokenKind::Dot) {
            if !self.check_identifier("target") {
                return Err(self.unexpected_token("'target'"));
            }
            self.advance();
            if !self.context.new_target {
                return Err(self.error_at(start, "new.target expression is not allowed here"));
            }
            return Ok(Expression::NewTarget(self.span_from(start)));
        }

        let callee_start = self.current().span;
        let callee = match self.current().kind {
            TokenKind::New => self.parse_new_expression()?,
            TokenKind::Super => {
                let expr = self.parse_super_expression()?;
                if matches!(expr, Expression::SuperCall(_)) {
                    return Err(self.error_at(callee_start, "'super' keyword unexpected here"));
                }
                expr
            }
            _ => self.parse_primary_expression()?,
        };
        let callee = self.parse_call_tail(callee_start, callee, false)?;
        if self.check(&TokenKind::Lt) {
            self.try_skip_type_arguments();
        }
        let arguments = if self.check(&TokenKind::LParen) {
            self.parse_call_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        }))
    }

    fn parse_super_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::Super)?;
        match &self.current().kind {
            TokenKind::LParen => {
                if !self.context.super_call {
                    return Err(self.error_at(start, "'super' keyword unexpected here"));
                }
                let arguments = self.parse_call_arguments()?;
                Ok(Expression::SuperCall(SuperCallExpression {
                    arguments,
                    span: self.span_from(start),
                }))
            }
            TokenKind::Dot | TokenKind::LBracket => {
                if !self.context.super_property {
                    return Err(self.error_at(start, "'super' keyword unexpected here"));
                }
                let property = if self.match_token(&TokenKind::Dot) {
                    self.parse_member_identifier()?
                } else {
                    self.parse_computed_member()?
                };
                Ok(Expression::SuperMember(SuperMemberExpression {
                    property,
                    span: self.span_from(start),
                }))
            }
            _ => Err(self.error_at(start, "'super' keyword unexpected here")),
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        let literal = |value| {
            Ok(Expression::Literal(Literal {
                value,
                span: start,
            }))
        };
        let value = match &self.current().kind {
            TokenKind::Number(n) => LiteralValue::Number(*n),
            TokenKind::String(s) => LiteralValue::String(s.cheap_clone()),
            TokenKind::True => LiteralValue::Boolean(true),
            TokenKind::False => LiteralValue::Boolean(false),
            TokenKind::Null => LiteralValue::Null,
            TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                let template = self.parse_template_literal(false)?;
                return Ok(Expression::Template(template));
            }
            TokenKind::This => {
                self.advance();
                return Ok(Expression::This(start));
            }
            TokenKind::Function => return self.parse_function_expression(start, false),
            TokenKind::Class => return Ok(Expression::Class(self.parse_class(start, true)?)),
            TokenKind::LParen => return self.parse_parenthesized_expression(),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Identifier(name) => {
                if name.as_str() == "async"
                    && self.peek_is(1, &TokenKind::Function)
                    && !self.peek(1).newline_before
                {
                    self.advance();
                    return self.parse_function_expression(start, true);
                }
                return Ok(Expression::Identifier(self.parse_identifier_reference()?));
            }
            TokenKind::Import => {
                return Err(self.error("Dynamic import and import.meta are not supported"));
            }
            TokenKind::Hash => return Err(self.error("Private class members are not supported")),
            TokenKind::Slash | TokenKind::SlashEq => {
                return Err(self.error("Regular expression literals are not supported"));
            }
            _ => return Err(self.unexpected_token("expression")),
        };
        self.advance();
        literal(value)
    }

    fn parse_identifier_reference(&mut self) -> Result<Identifier, JsError> {
        let span = self.current().span;
        let TokenKind::Identifier(name) = &self.current().kind else {
            return Err(self.unexpected_token("identifier"));
        };
        let name = name.cheap_clone();
        self.check_reserved(&name, span)?;
        if name.as_str() == "arguments" {
            self.context.uses_arguments = true;
        }
        self.advance();
        Ok(Identifier { name, span })
    }

    fn parse_parenthesized_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::LParen)?;
        let expr = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        Ok(Expression::Parenthesized(Box::new(expr), self.span_from(start)))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            if self.match_token(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            let element_start = self.current().span;
            let element = if self.match_token(&TokenKind::DotDotDot) {
                let argument = self.with_in(|p| p.parse_assignment_expression())?;
                ArrayElement::Spread(SpreadElement {
                    argument: Box::new(argument),
                    span: self.span_from(element_start),
                })
            } else {
                ArrayElement::Expression(self.with_in(|p| p.parse_assignment_expression())?)
            };
            elements.push(Some(element));
            if !self.check(&TokenKind::RBracket) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        self.require_token(&TokenKind::RBracket)?;
        Ok(Expression::Array(ArrayExpression {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::LBrace)?;
        let mut properties = Vec::new();
        let mut proto_setters = 0;
        while !self.check(&TokenKind::RBrace) {
            let property = self.parse_property_definition()?;
            if let ObjectProperty::Property(p) = &property {
                if p.kind == PropertyKind::Init && !p.shorthand && !p.method && p.key.is_proto() {
                    proto_setters += 1;
                }
            }
            properties.push(property);
            if !self.check(&TokenKind::RBrace) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        self.require_token(&TokenKind::RBrace)?;
        if proto_setters > 1 {
            return Err(self.error_at(start, "Duplicate __proto__ fields are not allowed in object literals"));
        }
        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.span_from(start),
        }))
    }

    fn parse_property_definition(&mut self) -> Result<ObjectProperty, JsError> {
        let start = self.current().span;
        if self.match_token(&TokenKind::DotDotDot) {
            let argument = self.with_in(|p| p.parse_assignment_expression())?;
            return Ok(ObjectProperty::Spread(SpreadElement {
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        let (is_async, is_generator, accessor) = self.parse_method_prefix();
        let key_is_identifier = matches!(self.current().kind, TokenKind::Identifier(_));
        let key = self.parse_property_name()?;

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::Lt) {
            let (form, kind) = match accessor {
                Some(MethodKind::Get) => (FunctionForm::Getter, PropertyKind::Get),
                Some(MethodKind::Set) => (FunctionForm::Setter, PropertyKind::Set),
                _ => (FunctionForm::Method, PropertyKind::Init),
            };
            let function_kind = FunctionKind::new(is_async, is_generator);
            let Some(function) = self.parse_function_rest(start, None, function_kind, form)? else {
                return Err(self.error("Function implementation is missing"));
            };
            return Ok(ObjectProperty::Property(Property {
                key,
                value: Expression::Function(Rc::new(function)),
                kind,
                shorthand: false,
                method: accessor.is_none(),
                span: self.span_from(start),
            }));
        }
        if is_async || is_generator || accessor.is_some() {
            return Err(self.unexpected_token("'('"));
        }

        if self.match_token(&TokenKind::Colon) {
            let value = self.with_in(|p| p.parse_assignment_expression())?;
            return Ok(ObjectProperty::Property(Property {
                key,
                value,
                kind: PropertyKind::Init,
                shorthand: false,
                method: false,
                span: self.span_from(start),
            }));
        }

        // Shorthand `{ a }` and CoverInitializedName `{ a = 1 }`
        let ObjectPropertyKey::Identifier(id) = &key else {
            return Err(self.unexpected_token("':'"));
        };
        if !key_is_identifier {
            return Err(self.error_at(id.span, &format!("Unexpected reserved word '{}'", id.name)));
        }
        self.check_reserved(&id.name, id.span)?;
        if id.name.as_str() == "arguments" {
            self.context.uses_arguments = true;
        }
        let reference = Expression::Identifier(id.clone());
        let value = if self.check(&TokenKind::Eq) {
            let eq_span = self.current().span;
            self.advance();
            let default = self.with_in(|p| p.parse_assignment_expression())?;
            self.cover_initializers.push(eq_span);
            Expression::Assignment(AssignmentExpression {
                operator: AssignmentOp::Assign,
                left: AssignmentTarget::Simple(Box::new(reference)),
                right: Box::new(default),
                span: self.span_from(start),
            })
        } else {
            reference
        };
        Ok(ObjectProperty::Property(Property {
            key,
            value,
            kind: PropertyKind::Init,
            shorthand: true,
            method: false,
            span: self.span_from(start),
        }))
    }

    fn parse_template_literal(&mut self, tagged: bool) -> Result<Rc<TemplateLiteral>, JsError> {
        let start = self.current().span;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let head = self.current().clone();
        self.advance();
        match head.kind {
            TokenKind::TemplateNoSub(part) => {
                quasis.push(self.template_element(part, head.span, tagged)?);
            }
            TokenKind::TemplateHead(part) => {
                quasis.push(self.template_element(part, head.span, tagged)?);
                loop {
                    expressions.push(self.with_in(|p| p.parse_expression())?);
                    let token = self.current().clone();
                    match token.kind {
                        TokenKind::TemplateMiddle(part) => {
                            self.advance();
                            quasis.push(self.template_element(part, token.span, tagged)?);
                        }
                        TokenKind::TemplateTail(part) => {
                            self.advance();
                            quasis.push(self.template_element(part, token.span, tagged)?);
                            break;
                        }
                        _ => return Err(self.unexpected_token("'}'")),
                    }
                }
            }
            _ => return Err(self.error_at(start, "Expected template literal")),
        }
        Ok(Rc::new(TemplateLiteral {
            quasis,
            expressions,
            span: self.span_from(start),
        }))
    }

    fn template_element(
        &self,
        part: TemplatePart,
        span: Span,
        tagged: bool,
    ) -> Result<TemplateElement, JsError> {
        if part.cooked.is_none() && !tagged {
            return Err(self.error_at(span, "Invalid escape sequence in template"));
        }
        Ok(TemplateElement {
            cooked: part.cooked,
            raw: part.raw,
            span,
        })
    }

    fn parse_call_arguments(&mut self) -> Result<Vec<Argument>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let start = self.current().span;
            if self.match_token(&TokenKind::DotDotDot) {
                let argument = self.with_in(|p| p.parse_assignment_expression())?;
                arguments.push(Argument::Spread(SpreadElement {
                    argument: Box::new(argument),
                    span: self.span_from(start),
                }));
            } else {
                arguments.push(Argument::Expression(
                    self.with_in(|p| p.parse_assignment_expression())?,
                ));
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RParen)?;
        Ok(arguments)
    }

    // ============ PATTERNS ============

    fn parse_binding_target(&mut self) -> Result<Pattern, JsError> {
        match self.current().kind {
            TokenKind::LBrace => self.parse_object_binding_pattern(),
            TokenKind::LBracket => self.parse_array_binding_pattern(),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier()?)),
        }
    }

    /// Binding target with optional TypeScript markers and default value.
    fn parse_binding_element(&mut self) -> Result<Pattern, JsError> {
        let start = self.current().span;
        let target = self.parse_binding_target()?;
        self.match_token(&TokenKind::Question);
        self.skip_type_annotation()?;
        if !self.match_token(&TokenKind::Eq) {
            return Ok(target);
        }
        let right = self.with_in(|p| p.parse_assignment_expression())?;
        Ok(Pattern::Assignment(AssignmentPattern {
            left: Box::new(target),
            right: Box::new(right),
            span: self.span_from(start),
        }))
    }

    fn parse_binding_identifier(&mut self) -> Result<Identifier, JsError> {
        let span = self.current().span;
        let TokenKind::Identifier(name) = &self.current().kind else {
            return Err(self.unexpected_token("identifier"));
        };
        let name = name.cheap_clone();
        self.check_binding_name(&name, span)?;
        self.advance();
        Ok(Identifier { name, span })
    }

    fn check_binding_name(&self, name: &JsString, span: Span) -> Result<(), JsError> {
        if self.context.strict && matches!(name.as_str(), "eval" | "arguments") {
            return Err(self.error_at(span, "Unexpected eval or arguments in strict mode"));
        }
        self.check_reserved(name, span)
    }

    /// Contextual words that are reserved in the current context.
    fn check_reserved(&self, name: &JsString, span: Span) -> Result<(), JsError> {
        let reserved = match name.as_str() {
            "yield" => self.context.is_generator || self.context.strict,
            "await" => self.context.is_async || self.source_type == SourceType::Module,
            "implements" | "interface" | "let" | "package" | "private" | "protected" | "public"
            | "static" => self.context.strict,
            _ => false,
        };
        if reserved {
            return Err(self.error_at(span, &format!("Unexpected reserved word '{}'", name)));
        }
        Ok(())
    }

    fn parse_object_binding_pattern(&mut self) -> Result<Pattern, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::LBrace)?;
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let property_start = self.current().span;
            if self.match_token(&TokenKind::DotDotDot) {
                let argument = Pattern::Identifier(self.parse_binding_identifier()?);
                properties.push(ObjectPatternProperty::Rest(RestElement {
                    argument: Box::new(argument),
                    span: self.span_from(property_start),
                }));
                if !self.check(&TokenKind::RBrace) {
                    return Err(self.error("Rest element must be last element"));
                }
                break;
            }

            let key_is_identifier = matches!(self.current().kind, TokenKind::Identifier(_));
            let key = self.parse_property_name()?;
            if self.match_token(&TokenKind::Colon) {
                let value = self.parse_binding_element()?;
                properties.push(ObjectPatternProperty::KeyValue {
                    key,
                    value,
                    shorthand: false,
                    span: self.span_from(property_start),
                });
            } else {
                let ObjectPropertyKey::Identifier(id) = &key else {
                    return Err(self.unexpected_token("':'"));
                };
                if !key_is_identifier {
                    return Err(self.error_at(id.span, &format!("Unexpected reserved word '{}'", id.name)));
                }
                self.check_binding_name(&id.name, id.span)?;
                let mut value = Pattern::Identifier(id.clone());
                if self.match_token(&TokenKind::Eq) {
                    let right = self.with_in(|p| p.parse_assignment_expression())?;
                    value = Pattern::Assignment(AssignmentPattern {
                        left: Box::new(value),
                        right: Box::new(right),
                        span: self.span_from(property_start),
                    });
                }
                properties.push(ObjectPatternProperty::KeyValue {
                    key,
                    value,
                    shorthand: true,
                    span: self.span_from(property_start),
                });
            }
            if !self.check(&TokenKind::RBrace) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        self.require_token(&TokenKind::RBrace)?;
        Ok(Pattern::Object(ObjectPattern {
            properties,
            span: self.span_from(start),
        }))
    }

    fn parse_array_binding_pattern(&mut self) -> Result<Pattern, JsError> {
        let start = self.current().span;
        self.require_token(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            if self.match_token(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            let element_start = self.current().span;
            if self.match_token(&TokenKind::DotDotDot) {
                let argument = self.parse_binding_target()?;
                elements.push(Some(Pattern::Rest(RestElement {
                    argument: Box::new(argument),
                    span: self.span_from(element_start),
                })));
                if !self.check(&TokenKind::RBracket) {
                    return Err(self.error("Rest element must be last element"));
                }
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.check(&TokenKind::RBracket) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        self.require_token(&TokenKind::RBracket)?;
        Ok(Pattern::Array(ArrayPattern {
            elements,
            span: self.span_from(start),
        }))
    }

    /// Reinterpret a parsed expression as an assignment pattern (the cover
    /// grammar for destructuring assignment and `for (lhs of ...)`).
    fn expression_to_pattern(&mut self, expr: Expression) -> Result<Pattern, JsError> {
        let span = expr.span();
        match expr {
            Expression::Identifier(id) => {
                if self.context.strict && matches!(id.name.as_str(), "eval" | "arguments") {
                    return Err(self.error_at(id.span, "Unexpected eval or arguments in strict mode"));
                }
                Ok(Pattern::Identifier(id))
            }
            Expression::Member(_) | Expression::SuperMember(_) => {
                Ok(Pattern::Expression(Box::new(expr)))
            }
            Expression::Parenthesized(inner, _) => {
                if !self.is_simple_target(&inner) {
                    return Err(self.error_at(span, "Invalid destructuring assignment target"));
                }
                self.expression_to_pattern(*inner)
            }
            Expression::Object(object) => {
                let count = object.properties.len();
                let mut properties = Vec::with_capacity(count);
                for (i, property) in object.properties.into_iter().enumerate() {
                    match property {
                        ObjectProperty::Spread(spread) => {
                            if i + 1 != count {
                                return Err(self.error_at(spread.span, "Rest element must be last element"));
                            }
                            let argument = self.expression_to_pattern(*spread.argument)?;
                            if !matches!(argument, Pattern::Identifier(_) | Pattern::Expression(_)) {
                                return Err(self.error_at(
                                    spread.span,
                                    "`...` must be followed by an assignable reference in assignment contexts",
                                ));
                            }
                            properties.push(ObjectPatternProperty::Rest(RestElement {
                                argument: Box::new(argument),
                                span: spread.span,
                            }));
                        }
                        ObjectProperty::Property(property) => {
                            if property.kind != PropertyKind::Init || property.method {
                                return Err(self.error_at(property.span, "Invalid destructuring assignment target"));
                            }
                            let value = self.element_to_pattern(property.value)?;
                            properties.push(ObjectPatternProperty::KeyValue {
                                key: property.key,
                                value,
                                shorthand: property.shorthand,
                                span: property.span,
                            });
                        }
                    }
                }
                Ok(Pattern::Object(ObjectPattern { properties, span }))
            }
            Expression::Array(array) => {
                let count = array.elements.len();
                let mut elements = Vec::with_capacity(count);
                for (i, element) in array.elements.into_iter().enumerate() {
                    let pattern = match element {
                        None => None,
                        Some(ArrayElement::Spread(spread)) => {
                            if i + 1 != count {
                                return Err(self.error_at(spread.span, "Rest element must be last element"));
                            }
                            let argument = self.expression_to_pattern(*spread.argument)?;
                            Some(Pattern::Rest(RestElement {
                                argument: Box::new(argument),
                                span: spread.span,
                            }))
                        }
                        Some(ArrayElement::Expression(expr)) => Some(self.element_to_pattern(expr)?),
                    };
                    elements.push(pattern);
                }
                Ok(Pattern::Array(ArrayPattern { elements, span }))
            }
            _ => Err(self.error_at(span, "Invalid destructuring assignment target")),
        }
    }

    /// A pattern element, where `target = default` is allowed.
    fn element_to_pattern(&mut self, expr: Expression) -> Result<Pattern, JsError> {
        match expr {
            Expression::Assignment(assign) if assign.operator == AssignmentOp::Assign => {
                let left = match assign.left {
                    AssignmentTarget::Pattern(pattern) => pattern,
                    AssignmentTarget::Simple(target) => self.expression_to_pattern(*target)?,
                };
                Ok(Pattern::Assignment(AssignmentPattern {
                    left: Box::new(left),
                    right: assign.right,
                    span: assign.span,
                }))
            }
            other => self.expression_to_pattern(other),
        }
    }

    /// IsValidSimpleAssignmentTarget
    fn is_simple_target(&self, expr: &Expression) -> bool {
        match expr {
            Expression::Identifier(id) => {
                !(self.context.strict && matches!(id.name.as_str(), "eval" | "arguments"))
            }
            Expression::Member(_) | Expression::SuperMember(_) => true,
            Expression::Parenthesized(inner, _) => self.is_simple_target(inner),
            _ => false,
        }
    }

    // ============ HELPERS ============

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&self.eof)
    }

    fn peek_is(&self, offset: usize, kind: &TokenKind) -> bool {
        self.peek(offset).kind == *kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current().kind == *kind
    }

    /// The current token is the identifier (or contextual keyword) `name`.
    fn check_identifier(&self, name: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Identifier(n) if n.as_str() == name)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), JsError> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.unexpected_token(&format!("'{}'", token_text(kind))))
        }
    }

    fn require_contextual(&mut self, word: &str) -> Result<(), JsError> {
        if self.check_identifier(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&format!("'{}'", word)))
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            cover_initializers: self.cover_initializers.len(),
            no_in: self.no_in,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.cover_initializers.truncate(checkpoint.cover_initializers);
        self.no_in = checkpoint.no_in;
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    /// A statement may end here without an explicit `;` (ASI).
    fn at_statement_end(&self) -> bool {
        self.current().newline_before
            || matches!(
                self.current().kind,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            )
    }

    fn expect_semicolon(&mut self) -> Result<(), JsError> {
        if self.match_token(&TokenKind::Semicolon) || self.at_statement_end() {
            return Ok(());
        }
        Err(self.unexpected_token("';'"))
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start,
            self.previous_end().max(start.start),
            start.line,
            start.column,
        )
    }

    fn source_text(&self, start: Span) -> JsString {
        let end = self.previous_end().max(start.start);
        JsString::from(self.source.get(start.start..end).unwrap_or(""))
    }

    fn error(&self, message: &str) -> JsError {
        self.error_at(self.current().span, message)
    }

    fn error_at(&self, span: Span, message: &str) -> JsError {
        JsError::syntax_error(message, span.line, span.column)
    }

    fn unexpected_token(&self, expected: &str) -> JsError {
        let token = self.current();
        let found = match &token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Error(message) => return self.error(message),
            _ => {
                let text = self.source.get(token.span.start..token.span.end).unwrap_or("");
                format!("token '{}'", text)
            }
        };
        self.error(&format!("Unexpected {}, expected {}", found, expected))
    }

    /// An IdentifierName, where reserved words are allowed too.
    fn parse_identifier_name(&mut self) -> Result<JsString, JsError> {
        let name = match &self.current().kind {
            TokenKind::Identifier(name) => name.cheap_clone(),
            kind => match kind.keyword_text() {
                Some(text) => self.intern(text),
                None => return Err(self.unexpected_token("identifier")),
            },
        };
        self.advance();
        Ok(name)
    }

    fn current_binary_op(&self) -> Option<(BinaryOperator, u8)> {
        use BinaryOperator::{Binary, Logical};
        Some(match self.current().kind {
            TokenKind::QuestionQuestion => (Logical(LogicalOp::NullishCoalescing), 1),
            TokenKind::PipePipe => (Logical(LogicalOp::Or), 2),
            TokenKind::AmpAmp => (Logical(LogicalOp::And), 3),
            TokenKind::Pipe => (Binary(BinaryOp::BitOr), 4),
            TokenKind::Caret => (Binary(BinaryOp::BitXor), 5),
            TokenKind::Amp => (Binary(BinaryOp::BitAnd), 6),
            TokenKind::EqEq => (Binary(BinaryOp::Eq), 7),
            TokenKind::BangEq => (Binary(BinaryOp::NotEq), 7),
            TokenKind::EqEqEq => (Binary(BinaryOp::StrictEq), 7),
            TokenKind::BangEqEq => (Binary(BinaryOp::StrictNotEq), 7),
            TokenKind::Lt => (Binary(BinaryOp::Lt), 8),
            TokenKind::LtEq => (Binary(BinaryOp::LtEq), 8),
            TokenKind::Gt => (Binary(BinaryOp::Gt), 8),
            TokenKind::GtEq => (Binary(BinaryOp::GtEq), 8),
            TokenKind::Instanceof => (Binary(BinaryOp::Instanceof), 8),
            TokenKind::In if !self.no_in => (Binary(BinaryOp::In), 8),
            TokenKind::LtLt => (Binary(BinaryOp::LShift), 9),
            TokenKind::GtGt => (Binary(BinaryOp::RShift), 9),
            TokenKind::GtGtGt => (Binary(BinaryOp::URShift), 9),
            TokenKind::Plus => (Binary(BinaryOp::Add), 10),
            TokenKind::Minus => (Binary(BinaryOp::Sub), 10),
            TokenKind::Star => (Binary(BinaryOp::Mul), 11),
            TokenKind::Slash => (Binary(BinaryOp::Div), 11),
            TokenKind::Percent => (Binary(BinaryOp::Mod), 11),
            TokenKind::StarStar => (Binary(BinaryOp::Exp), 12),
            _ => return None,
        })
    }

    fn current_unary_op(&self) -> Option<UnaryOp> {
        Some(match self.current().kind {
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::Delete => UnaryOp::Delete,
            _ => return None,
        })
    }

    fn current_update_op(&self) -> Option<UpdateOp> {
        match self.current().kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn current_assignment_op(&self) -> Option<AssignmentOp> {
        Some(match self.current().kind {
            TokenKind::Eq => AssignmentOp::Assign,
            TokenKind::PlusEq => AssignmentOp::AddAssign,
            TokenKind::MinusEq => AssignmentOp::SubAssign,
            TokenKind::StarEq => AssignmentOp::MulAssign,
            TokenKind::SlashEq => AssignmentOp::DivAssign,
            TokenKind::PercentEq => AssignmentOp::ModAssign,
            TokenKind::StarStarEq => AssignmentOp::ExpAssign,
            TokenKind::AmpEq => AssignmentOp::BitAndAssign,
            TokenKind::PipeEq => AssignmentOp::BitOrAssign,
            TokenKind::CaretEq => AssignmentOp::BitXorAssign,
            TokenKind::LtLtEq => AssignmentOp::LShiftAssign,
            TokenKind::GtGtEq => AssignmentOp::RShiftAssign,
            TokenKind::GtGtGtEq => AssignmentOp::URShiftAssign,
            TokenKind::AmpAmpEq => AssignmentOp::AndAssign,
            TokenKind::PipePipeEq => AssignmentOp::OrAssign,
            TokenKind::QuestionQuestionEq => AssignmentOp::NullishAssign,
            _ => return None,
        })
    }

    // ============ EARLY ERRORS ============

    fn check_cover_initializers(&self) -> Result<(), JsError> {
        match self.cover_initializers.first() {
            Some(span) => Err(self.error_at(*span, "Invalid shorthand property initializer")),
            None => Ok(()),
        }
    }

    fn redeclared(&self, name: &JsString, span: Span) -> JsError {
        self.error_at(span, &format!("Identifier '{}' has already been declared", name))
    }

    /// Lexical names of a function body, script or module must be unique and
    /// must not clash with var names or parameters.
    fn check_var_scope(&self, scope: &VarScope, parameters: &[JsString]) -> Result<(), JsError> {
        let mut seen = FxHashSet::default();
        let span = self.current().span;
        for binding in &scope.lexical {
            if !seen.insert(binding.name.cheap_clone())
                || scope.var_names.contains(&binding.name)
                || parameters.contains(&binding.name)
            {
                return Err(self.redeclared(&binding.name, span));
            }
        }
        Ok(())
    }

    /// In a module, function declarations are lexical too.
    fn check_module_scope(&self, scope: &VarScope) -> Result<(), JsError> {
        let mut seen = FxHashSet::default();
        let span = self.current().span;
        for function in &scope.functions {
            let Some(id) = &function.id else {
                continue;
            };
            if !seen.insert(id.name.cheap_clone())
                || scope.var_names.contains(&id.name)
                || scope.lexical.iter().any(|b| b.name == id.name)
            {
                return Err(self.redeclared(&id.name, id.span));
            }
        }
        Ok(())
    }

    /// ExportedNames of a module must be unique.
    fn check_exported_names(&self, body: &[Statement]) -> Result<(), JsError> {
        let mut seen = FxHashSet::default();
        for stmt in body {
            let Statement::Export(export) = stmt else {
                continue;
            };
            let mut names = Vec::new();
            match &export.kind {
                ExportKind::Declaration(decl) => match decl.as_ref() {
                    Statement::VariableDeclaration(v) => {
                        for d in &v.declarations {
                            hoist::bound_names(&d.id, &mut names);
                        }
                    }
                    Statement::FunctionDeclaration(f) => names.extend(f.id.iter().map(|id| id.name.cheap_clone())),
                    Statement::ClassDeclaration(c) => names.extend(c.id.iter().map(|id| id.name.cheap_clone())),
                    _ => {}
                },
                ExportKind::DefaultDeclaration(_) | ExportKind::DefaultExpression(_) => {
                    names.push(JsString::from("default"));
                }
                ExportKind::Named { specifiers, .. } => {
                    names.extend(specifiers.iter().map(|s| s.exported.cheap_clone()));
                }
                ExportKind::All { exported, .. } => names.extend(exported.iter().cloned()),
            }
            for name in names {
                if !seen.insert(name.cheap_clone()) {
                    return Err(self.error_at(export.span, &format!("Duplicate export of '{}'", name)));
                }
            }
        }
        Ok(())
    }

    /// Block-level declarations: unique names, except that sloppy code may
    /// repeat plain function declarations.
    fn check_block_scope(
        &self,
        scope: &BlockScope,
        var_names: &[JsString],
        start: Span,
    ) -> Result<(), JsError> {
        let mut counts: rustc_hash::FxHashMap<&str, (usize, usize)> = Default::default();
        for function in &scope.functions {
            if let Some(id) = &function.id {
                counts.entry(id.name.as_str()).or_default().0 += 1;
            }
        }
        for binding in &scope.bindings {
            counts.entry(binding.name.as_str()).or_default().1 += 1;
            if var_names.contains(&binding.name) {
                return Err(self.redeclared(&binding.name, start));
            }
        }
        for binding in &scope.bindings {
            let Some(&(functions, total)) = counts.get(binding.name.as_str()) else {
                continue;
            };
            let others = total.saturating_sub(functions);
            let plain_functions = scope
                .functions
                .iter()
                .filter(|f| f.id.as_ref().is_some_and(|id| id.name == binding.name))
                .all(|f| f.kind == FunctionKind::Normal);
            let duplicate = others > 1
                || (others == 1 && functions > 0)
                || (functions > 1 && (self.context.strict || !plain_functions));
            if duplicate {
                return Err(self.redeclared(&binding.name, start));
            }
        }
        Ok(())
    }
}

/// Source spelling of a punctuator or keyword, for error messages.
fn token_text(kind: &TokenKind) -> &'static str {
    if let Some(text) = kind.keyword_text() {
        return text;
    }
    match kind {
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Semicolon => ";",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Dot => ".",
        TokenKind::Arrow => "=>",
        TokenKind::Eq => "=",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        TokenKind::Question => "?",
        TokenKind::Star => "*",
        _ => "token",
    }
}
