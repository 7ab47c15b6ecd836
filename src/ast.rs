//! Abstract Syntax Tree types
//!
//! The tree is produced once by the parser and only read afterwards. Function
//! and class bodies are reference counted so closures, generators and async
//! frames can own the code they run. Static semantics needed at run time
//! (bound names, hoisted declarations, parameter shape) are computed at parse
//! time and stored next to the node they describe.

use std::rc::Rc;

use crate::lexer::Span;
use crate::value::JsString;

/// A complete program (script or module)
#[derive(Debug)]
pub struct Program {
    pub body: Vec<Statement>,
    pub source_type: SourceType,
    pub strict: bool,
    pub scope: VarScope,
    pub source: Rc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Script,
    Module,
}

// ============ SCOPES ============

/// A lexically scoped binding name and whether it is `const`.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalBinding {
    pub name: JsString,
    pub constant: bool,
}

/// Hoisting information for a function body, script or module body.
#[derive(Debug, Clone, Default)]
pub struct VarScope {
    /// VarDeclaredNames in source order without duplicates. In function
    /// bodies and scripts this includes top-level function declarations.
    pub var_names: Vec<JsString>,
    /// Function declarations to instantiate on entry; the last declaration
    /// of a name wins.
    pub functions: Vec<Rc<Function>>,
    /// let/const/class names declared directly in this body.
    pub lexical: Vec<LexicalBinding>,
}

/// Lexical declarations of a block or case block.
#[derive(Debug, Clone, Default)]
pub struct BlockScope {
    pub bindings: Vec<LexicalBinding>,
    pub functions: Vec<Rc<Function>>,
}

impl BlockScope {
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.functions.is_empty()
    }
}

/// Parameter and body facts FunctionDeclarationInstantiation consumes.
#[derive(Debug, Clone, Default)]
pub struct FunctionScope {
    pub parameter_names: Vec<JsString>,
    pub has_duplicates: bool,
    pub simple_parameter_list: bool,
    pub has_parameter_expressions: bool,
    /// An `arguments` object must be materialized on entry.
    pub arguments_needed: bool,
    pub body: VarScope,
}

// ============ STATEMENTS ============

#[derive(Debug)]
pub enum Statement {
    // Declarations
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(Rc<Function>),
    ClassDeclaration(Rc<Class>),

    // Control Flow
    Block(BlockStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Try(TryStatement),
    With(WithStatement),

    // Jump
    Return(ReturnStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Throw(ThrowStatement),

    // Module
    Import(ImportDeclaration),
    Export(ExportDeclaration),

    // Other
    Expression(ExpressionStatement),
    Empty(Span),
    Debugger(Span),
    Labeled(LabeledStatement),
    /// TypeScript `type`/`interface`/`declare` forms; no runtime effect.
    TypeDeclaration(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(v) => v.span,
            Statement::FunctionDeclaration(f) => f.span,
            Statement::ClassDeclaration(c) => c.span,
            Statement::Block(b) => b.span,
            Statement::If(s) => s.span,
            Statement::Switch(s) => s.span,
            Statement::For(s) => s.span,
            Statement::ForIn(s) => s.span,
            Statement::ForOf(s) => s.span,
            Statement::While(s) => s.span,
            Statement::DoWhile(s) => s.span,
            Statement::Try(s) => s.span,
            Statement::With(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Break(s) => s.span,
            Statement::Continue(s) => s.span,
            Statement::Throw(s) => s.span,
            Statement::Import(s) => s.span,
            Statement::Export(s) => s.span,
            Statement::Expression(s) => s.span,
            Statement::Labeled(s) => s.span,
            Statement::Empty(span) | Statement::Debugger(span) | Statement::TypeDeclaration(span) => {
                *span
            }
        }
    }
}

#[derive(Debug)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    pub scope: BlockScope,
    pub span: Span,
}

#[derive(Debug)]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Let,
    Const,
    Var,
}

#[derive(Debug)]
pub struct VariableDeclarator {
    pub id: Pattern,
    pub init: Option<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub scope: BlockScope,
    pub span: Span,
}

#[derive(Debug)]
pub struct SwitchCase {
    pub test: Option<Expression>, // None for default
    pub consequent: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug)]
pub struct ForInStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ForOfStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    pub await_: bool,
    pub span: Span,
}

#[derive(Debug)]
pub enum ForInOfLeft {
    /// `for (var/let/const x of ...)`: exactly one declarator, no initializer
    Variable(VariableKind, Pattern),
    /// `for (lhs of ...)`: an assignment target
    Pattern(Pattern),
}

#[derive(Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    pub span: Span,
}

#[derive(Debug)]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    pub span: Span,
}

#[derive(Debug)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStatement,
    pub span: Span,
}

#[derive(Debug)]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct BreakStatement {
    pub label: Option<JsString>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ContinueStatement {
    pub label: Option<JsString>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ThrowStatement {
    pub argument: Expression,
    pub span: Span,
}

#[derive(Debug)]
pub struct LabeledStatement {
    pub label: JsString,
    pub body: Box<Statement>,
    pub span: Span,
}

// Module declarations

#[derive(Debug)]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: JsString,
    pub span: Span,
}

#[derive(Debug)]
pub enum ImportSpecifier {
    /// `import { imported as local }`
    Named { local: Identifier, imported: JsString },
    /// `import local from`
    Default { local: Identifier },
    /// `import * as local from`
    Namespace { local: Identifier },
}

#[derive(Debug)]
pub struct ExportDeclaration {
    pub kind: ExportKind,
    pub span: Span,
}

#[derive(Debug)]
pub enum ExportKind {
    /// `export var/let/const/function/class ...`
    Declaration(Box<Statement>),
    /// `export default function/class ...` (possibly anonymous)
    DefaultDeclaration(Box<Statement>),
    /// `export default <expression>;`
    DefaultExpression(Expression),
    /// `export { a as b }` and `export { a as b } from "m"`
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<JsString>,
    },
    /// `export * from "m"` and `export * as ns from "m"`
    All {
        exported: Option<JsString>,
        source: JsString,
    },
}

#[derive(Debug)]
pub struct ExportSpecifier {
    pub local: JsString,
    pub exported: JsString,
    pub span: Span,
}

/// Binding name used for anonymous default exports.
pub const DEFAULT_EXPORT_BINDING: &str = "*default*";

// ============ FUNCTIONS & CLASSES ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Generator,
    Async,
    AsyncGenerator,
}

impl FunctionKind {
    pub fn new(is_async: bool, is_generator: bool) -> Self {
        match (is_async, is_generator) {
            (false, false) => FunctionKind::Normal,
            (false, true) => FunctionKind::Generator,
            (true, false) => FunctionKind::Async,
            (true, true) => FunctionKind::AsyncGenerator,
        }
    }

    pub fn is_async(self) -> bool {
        matches!(self, FunctionKind::Async | FunctionKind::AsyncGenerator)
    }

    pub fn is_generator(self) -> bool {
        matches!(self, FunctionKind::Generator | FunctionKind::AsyncGenerator)
    }
}

/// Syntactic origin of a function, which decides [[ThisMode]], whether it
/// can be constructed and whether it has a home object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionForm {
    Declaration,
    Expression,
    Arrow,
    Method,
    Getter,
    Setter,
    ClassConstructor { derived: bool, synthesized: bool },
    /// Class field initializer, run with the instance (or class) as `this`.
    FieldInitializer,
    StaticBlock,
}

impl FunctionForm {
    pub fn is_arrow(self) -> bool {
        matches!(self, FunctionForm::Arrow)
    }

    pub fn is_method_like(self) -> bool {
        matches!(
            self,
            FunctionForm::Method
                | FunctionForm::Getter
                | FunctionForm::Setter
                | FunctionForm::FieldInitializer
                | FunctionForm::StaticBlock
        )
    }
}

#[derive(Debug)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body or a field initializer expression.
    Expression(Box<Expression>),
}

#[derive(Debug)]
pub struct Function {
    pub id: Option<Identifier>,
    /// Parameters; the last may be `Pattern::Rest`.
    pub params: Vec<Pattern>,
    pub body: FunctionBody,
    pub kind: FunctionKind,
    pub form: FunctionForm,
    pub strict: bool,
    pub scope: FunctionScope,
    pub source_text: JsString,
    pub span: Span,
}

impl Function {
    /// ExpectedArgumentCount: parameters before the first default or rest.
    pub fn expected_argument_count(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| matches!(p, Pattern::Identifier(_) | Pattern::Object(_) | Pattern::Array(_)))
            .count()
    }
}

#[derive(Debug)]
pub struct Class {
    pub id: Option<Identifier>,
    pub super_class: Option<Box<Expression>>,
    pub constructor: Rc<Function>,
    pub members: Vec<ClassMember>,
    pub source_text: JsString,
    pub span: Span,
}

#[derive(Debug)]
pub enum ClassMember {
    Method(ClassMethod),
    Field(ClassField),
    StaticBlock(Rc<Function>),
}

#[derive(Debug)]
pub struct ClassMethod {
    pub key: ObjectPropertyKey,
    pub value: Rc<Function>,
    pub kind: MethodKind,
    pub static_: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

#[derive(Debug)]
pub struct ClassField {
    pub key: ObjectPropertyKey,
    pub initializer: Option<Rc<Function>>,
    pub static_: bool,
    pub span: Span,
}

// ============ EXPRESSIONS ============

#[derive(Debug)]
pub enum Expression {
    // Literals
    Literal(Literal),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(Rc<Function>),
    ArrowFunction(Rc<Function>),
    Class(Rc<Class>),
    Template(Rc<TemplateLiteral>),
    TaggedTemplate(TaggedTemplateExpression),

    // Identifiers
    Identifier(Identifier),
    This(Span),

    // Operations
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Sequence(SequenceExpression),

    // Access
    Member(MemberExpression),
    SuperMember(SuperMemberExpression),
    OptionalChain(OptionalChainExpression),
    Call(CallExpression),
    SuperCall(SuperCallExpression),
    New(NewExpression),
    NewTarget(Span),

    // Special
    Yield(YieldExpression),
    Await(AwaitExpression),

    // Parenthesized (transparent except for assignment-target validity)
    Parenthesized(Box<Expression>, Span),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(l) => l.span,
            Expression::Array(a) => a.span,
            Expression::Object(o) => o.span,
            Expression::Function(f) | Expression::ArrowFunction(f) => f.span,
            Expression::Class(c) => c.span,
            Expression::Template(t) => t.span,
            Expression::TaggedTemplate(t) => t.span,
            Expression::Identifier(i) => i.span,
            Expression::This(s) | Expression::NewTarget(s) => *s,
            Expression::Unary(u) => u.span,
            Expression::Binary(b) => b.span,
            Expression::Logical(l) => l.span,
            Expression::Conditional(c) => c.span,
            Expression::Assignment(a) => a.span,
            Expression::Update(u) => u.span,
            Expression::Sequence(s) => s.span,
            Expression::Member(m) => m.span,
            Expression::SuperMember(m) => m.span,
            Expression::OptionalChain(o) => o.span,
            Expression::Call(c) => c.span,
            Expression::SuperCall(c) => c.span,
            Expression::New(n) => n.span,
            Expression::Yield(y) => y.span,
            Expression::Await(a) => a.span,
            Expression::Parenthesized(_, s) => *s,
        }
    }

    /// IsAnonymousFunctionDefinition
    pub fn is_anonymous_function_definition(&self) -> bool {
        match self {
            Expression::Function(f) => f.id.is_none(),
            Expression::ArrowFunction(_) => true,
            Expression::Class(c) => c.id.is_none(),
            Expression::Parenthesized(inner, _) => inner.is_anonymous_function_definition(),
            _ => false,
        }
    }

    /// Strip redundant parentheses.
    pub fn unparenthesized(&self) -> &Expression {
        match self {
            Expression::Parenthesized(inner, _) => inner.unparenthesized(),
            other => other,
        }
    }
}

#[derive(Debug)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: JsString,
    pub span: Span,
}

#[derive(Debug)]
pub struct ArrayExpression {
    pub elements: Vec<Option<ArrayElement>>,
    pub span: Span,
}

#[derive(Debug)]
pub enum ArrayElement {
    Expression(Expression),
    Spread(SpreadElement),
}

#[derive(Debug)]
pub struct ObjectExpression {
    pub properties: Vec<ObjectProperty>,
    pub span: Span,
}

#[derive(Debug)]
pub enum ObjectProperty {
    Property(Property),
    Spread(SpreadElement),
}

#[derive(Debug)]
pub struct Property {
    pub key: ObjectPropertyKey,
    /// For methods and accessors this is `Expression::Function`.
    pub value: Expression,
    pub kind: PropertyKind,
    pub shorthand: bool,
    pub method: bool,
    pub span: Span,
}

#[derive(Debug)]
pub enum ObjectPropertyKey {
    Identifier(Identifier),
    String(JsString),
    Number(f64),
    Computed(Box<Expression>),
}

impl ObjectPropertyKey {
    pub fn is_computed(&self) -> bool {
        matches!(self, ObjectPropertyKey::Computed(_))
    }

    /// `__proto__` written as an identifier or string literal.
    pub fn is_proto(&self) -> bool {
        match self {
            ObjectPropertyKey::Identifier(id) => id.name == "__proto__",
            ObjectPropertyKey::String(s) => *s == "__proto__",
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug)]
pub struct TemplateLiteral {
    /// Literal chunks; always one more than `expressions`.
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct TemplateElement {
    /// `None` when the chunk contains an invalid escape (tagged only).
    pub cooked: Option<JsString>,
    pub raw: JsString,
    pub span: Span,
}

#[derive(Debug)]
pub struct TaggedTemplateExpression {
    pub tag: Box<Expression>,
    pub quasi: Rc<TemplateLiteral>,
    pub span: Span,
}

#[derive(Debug)]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,  // -
    Plus,   // +
    Not,    // !
    BitNot, // ~
    Typeof, // typeof
    Void,   // void
    Delete, // delete
}

#[derive(Debug)]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %
    Exp, // **

    // Comparison
    Eq,          // ==
    NotEq,       // !=
    StrictEq,    // ===
    StrictNotEq, // !==
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=

    // Bitwise
    BitAnd,  // &
    BitOr,   // |
    BitXor,  // ^
    LShift,  // <<
    RShift,  // >>
    URShift, // >>>

    // Other
    In,         // in
    Instanceof, // instanceof
}

#[derive(Debug)]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,               // &&
    Or,                // ||
    NullishCoalescing, // ??
}

#[derive(Debug)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub left: AssignmentTarget,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub enum AssignmentTarget {
    /// Identifier or member expression (also the only form compound
    /// operators accept)
    Simple(Box<Expression>),
    /// Destructuring assignment
    Pattern(Pattern),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,        // =
    AddAssign,     // +=
    SubAssign,     // -=
    MulAssign,     // *=
    DivAssign,     // /=
    ModAssign,     // %=
    ExpAssign,     // **=
    BitAndAssign,  // &=
    BitOrAssign,   // |=
    BitXorAssign,  // ^=
    LShiftAssign,  // <<=
    RShiftAssign,  // >>=
    URShiftAssign, // >>>=
    AndAssign,     // &&=
    OrAssign,      // ||=
    NullishAssign, // ??=
}

impl AssignmentOp {
    /// The binary operator a compound assignment applies.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignmentOp::AddAssign => BinaryOp::Add,
            AssignmentOp::SubAssign => BinaryOp::Sub,
            AssignmentOp::MulAssign => BinaryOp::Mul,
            AssignmentOp::DivAssign => BinaryOp::Div,
            AssignmentOp::ModAssign => BinaryOp::Mod,
            AssignmentOp::ExpAssign => BinaryOp::Exp,
            AssignmentOp::BitAndAssign => BinaryOp::BitAnd,
            AssignmentOp::BitOrAssign => BinaryOp::BitOr,
            AssignmentOp::BitXorAssign => BinaryOp::BitXor,
            AssignmentOp::LShiftAssign => BinaryOp::LShift,
            AssignmentOp::RShiftAssign => BinaryOp::RShift,
            AssignmentOp::URShiftAssign => BinaryOp::URShift,
            AssignmentOp::Assign
            | AssignmentOp::AndAssign
            | AssignmentOp::OrAssign
            | AssignmentOp::NullishAssign => return None,
        })
    }
}

#[derive(Debug)]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub argument: Box<Expression>,
    pub prefix: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment, // ++
    Decrement, // --
}

#[derive(Debug)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: MemberProperty,
    /// `a?.b`: short-circuits the enclosing chain when `a` is nullish
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug)]
pub enum MemberProperty {
    Identifier(Identifier),
    Expression(Box<Expression>),
}

#[derive(Debug)]
pub struct SuperMemberExpression {
    pub property: MemberProperty,
    pub span: Span,
}

/// Delimits the extent of an optional chain: a short-circuit anywhere inside
/// makes the whole chain evaluate to `undefined`.
#[derive(Debug)]
pub struct OptionalChainExpression {
    pub base: Box<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug)]
pub struct SuperCallExpression {
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug)]
pub enum Argument {
    Expression(Expression),
    Spread(SpreadElement),
}

#[derive(Debug)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug)]
pub struct SpreadElement {
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug)]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    pub delegate: bool,
    pub span: Span,
}

#[derive(Debug)]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    pub span: Span,
}

// ============ PATTERNS ============

#[derive(Debug)]
pub enum Pattern {
    Identifier(Identifier),
    Object(ObjectPattern),
    Array(ArrayPattern),
    Rest(RestElement),
    /// Element or property with a default value
    Assignment(AssignmentPattern),
    /// Member expression target; only valid in assignment patterns
    Expression(Box<Expression>),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(i) => i.span,
            Pattern::Object(o) => o.span,
            Pattern::Array(a) => a.span,
            Pattern::Rest(r) => r.span,
            Pattern::Assignment(a) => a.span,
            Pattern::Expression(e) => e.span(),
        }
    }
}

#[derive(Debug)]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    pub span: Span,
}

#[derive(Debug)]
pub enum ObjectPatternProperty {
    KeyValue {
        key: ObjectPropertyKey,
        value: Pattern,
        shorthand: bool,
        span: Span,
    },
    Rest(RestElement),
}

#[derive(Debug)]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct RestElement {
    pub argument: Box<Pattern>,
    pub span: Span,
}

#[derive(Debug)]
pub struct AssignmentPattern {
    pub left: Box<Pattern>,
    pub right: Box<Expression>,
    pub span: Span,
}
