//! Resolved syntax tree consumed by the code generator.
//!
//! These structures mirror the node vocabulary of the external parser, with
//! one addition: every variable reference already carries its [`Binding`],
//! decided by the external resolver. The generator never resolves names.
//!
//! Trees cross process boundaries as JSON. Every statement and expression is
//! an object tagged with a `"type"` field:
//!
//! ```json
//! { "type": "Expression",
//!   "expression": { "type": "Identifier", "name": "x",
//!                   "binding": { "kind": "global", "name": "x" } } }
//! ```
//!
//! Node kinds outside the implemented subset are still representable so that
//! the generator can reject them by name instead of failing to deserialize.

mod scope;

pub use scope::Scope;

use serde::Deserialize;

use crate::Error;

fn first_line() -> u32 {
    1
}

/// A complete resolved program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Program {
    /// Source file the program was parsed from
    pub filename: String,
    /// Line the program starts on
    #[serde(default = "first_line")]
    pub lineno: u32,
    /// Namespace of the top-level unit
    #[serde(default)]
    pub scope: Scope,
    /// The statements in the program
    pub body: Vec<Statement>,
}

impl Program {
    /// Deserializes a resolved program from its JSON form.
    pub fn from_json(source: &str) -> Result<Self, Error> {
        serde_json::from_str(source).map_err(Error::from)
    }

    /// Collects the named functions declared at top level.
    ///
    /// Declarations nested in top-level blocks, branches and loops are
    /// included; declarations inside function bodies are not.
    pub fn global_functions(&self) -> Vec<&FunctionDeclaration> {
        let mut functions = Vec::new();
        for stmt in &self.body {
            collect_functions(stmt, &mut functions);
        }
        functions
    }
}

fn collect_functions<'a>(stmt: &'a Statement, functions: &mut Vec<&'a FunctionDeclaration>) {
    match stmt {
        Statement::FunctionDeclaration(decl) => functions.push(decl),
        Statement::Block(block) => {
            for inner in &block.body {
                collect_functions(inner, functions);
            }
        }
        Statement::If(if_stmt) => {
            collect_functions(&if_stmt.consequent, functions);
            if let Some(alt) = &if_stmt.alternate {
                collect_functions(alt, functions);
            }
        }
        Statement::While(while_stmt) => collect_functions(&while_stmt.body, functions),
        Statement::For(for_stmt) => collect_functions(&for_stmt.body, functions),
        _ => {}
    }
}

/// A variable reference with its resolved storage class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Variable {
    /// The name as written in source
    pub name: String,
    /// Where the variable lives
    pub binding: Binding,
}

/// Resolved storage class of a variable reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// Formal parameter of the enclosing function
    Parameter {
        /// Argument slot
        slot: u16,
    },
    /// `var` local of the enclosing function
    Local {
        /// Local slot
        slot: u16,
    },
    /// Property of the global object
    Global {
        /// Global name
        name: String,
    },
}

/// A JavaScript statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    /// Empty statement (;)
    Empty,
    /// Block statement { ... }
    Block(BlockStatement),
    /// Expression statement
    Expression(ExpressionStatement),
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(FunctionDeclaration),
    /// If statement
    If(IfStatement),
    /// While statement
    While(WhileStatement),
    /// Do-while statement
    DoWhile(DoWhileStatement),
    /// For statement
    For(ForStatement),
    /// For-in statement
    ForIn(ForInStatement),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// Return statement
    Return(ReturnStatement),
    /// Switch statement
    Switch(SwitchStatement),
    /// Try statement
    Try(TryStatement),
    /// Throw statement
    Throw(ThrowStatement),
    /// With statement
    With(WithStatement),
    /// Labeled statement
    Labeled(LabeledStatement),
}

/// A block statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockStatement {
    /// The statements in the block
    pub body: Vec<Statement>,
}

/// An expression statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableDeclarator {
    /// The variable being declared
    pub id: Variable,
    /// Optional initializer expression
    #[serde(default)]
    pub init: Option<Expression>,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionDeclaration {
    /// The function name
    pub name: String,
    /// Line the declaration starts on
    #[serde(default = "first_line")]
    pub lineno: u32,
    /// Parameters and locals of the function body
    #[serde(default)]
    pub scope: Scope,
    /// The function body
    pub body: Vec<Statement>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// The then branch
    pub consequent: Box<Statement>,
    /// The optional else branch
    #[serde(default)]
    pub alternate: Option<Box<Statement>>,
}

/// A while statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhileStatement {
    /// The condition
    pub test: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A do-while statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DoWhileStatement {
    /// The loop body
    pub body: Box<Statement>,
    /// The condition
    pub test: Expression,
}

/// A for statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForStatement {
    /// The initializer, a variable declaration or an expression statement
    #[serde(default)]
    pub init: Option<Box<Statement>>,
    /// The condition
    #[serde(default)]
    pub test: Option<Expression>,
    /// The update expression
    #[serde(default)]
    pub update: Option<Expression>,
    /// The loop body
    pub body: Box<Statement>,
}

/// A for-in statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForInStatement {
    /// The iteration variable
    pub left: Variable,
    /// The object to iterate over
    pub right: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A return statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReturnStatement {
    /// The return value
    #[serde(default)]
    pub argument: Option<Expression>,
}

/// A switch statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwitchStatement {
    /// The discriminant expression
    pub discriminant: Expression,
    /// The case clauses
    pub cases: Vec<SwitchCase>,
}

/// A switch case clause.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwitchCase {
    /// The test expression (None for default)
    #[serde(default)]
    pub test: Option<Expression>,
    /// The consequent statements
    pub consequent: Vec<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TryStatement {
    /// The try block
    pub block: BlockStatement,
    /// The catch body
    #[serde(default)]
    pub handler: Option<BlockStatement>,
    /// The finally block
    #[serde(default)]
    pub finalizer: Option<BlockStatement>,
}

/// A throw statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThrowStatement {
    /// The thrown expression
    pub argument: Expression,
}

/// A with statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WithStatement {
    /// The object expression
    pub object: Expression,
    /// The body statement
    pub body: Box<Statement>,
}

/// A labeled statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabeledStatement {
    /// The label
    pub label: String,
    /// The labeled body
    pub body: Box<Statement>,
}

/// A JavaScript expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    /// Numeric literal
    Number {
        /// The literal value
        value: f64,
    },
    /// String literal, still in its lexical form (quotes and escapes)
    String {
        /// The source text of the literal
        raw: String,
    },
    /// Regular expression literal
    RegExp {
        /// The pattern
        pattern: String,
        /// The flags
        #[serde(default)]
        flags: String,
    },
    /// null
    Null,
    /// true
    True,
    /// false
    False,
    /// this keyword
    This,
    /// Variable reference
    Identifier(Variable),
    /// Array literal
    Array(ArrayExpression),
    /// Object literal
    Object(ObjectExpression),
    /// Binary expression
    Binary(BinaryExpression),
    /// Unary expression
    Unary(UnaryExpression),
    /// Update expression (++/--)
    Update(UpdateExpression),
    /// Assignment expression
    Assignment(AssignmentExpression),
    /// Call expression
    Call(CallExpression),
    /// new expression
    New(NewExpression),
    /// Dotted property access
    Member(MemberExpression),
    /// Computed element access
    Index(IndexExpression),
    /// Conditional (ternary) expression
    Conditional(ConditionalExpression),
    /// Comma operator
    Comma(CommaExpression),
    /// Function expression
    Function(FunctionExpression),
}

impl Expression {
    /// Builds a number literal node.
    pub fn number(value: f64) -> Self {
        Expression::Number { value }
    }

    /// Returns the value of a number literal node.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expression::Number { value } => Some(*value),
            _ => None,
        }
    }
}

/// An array literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrayExpression {
    /// The elements (None represents a hole)
    pub elements: Vec<Option<Expression>>,
}

/// An object literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectExpression {
    /// The properties
    pub properties: Vec<Property>,
}

/// An object literal property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Property {
    /// The property name
    pub key: String,
    /// The property value
    pub value: Expression,
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// The left operand
    pub left: Box<Expression>,
    /// The right operand
    pub right: Box<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
    // Comparison
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "===")]
    StrictEqual,
    #[serde(rename = "!==")]
    StrictNotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanEqual,
    // Logical
    #[serde(rename = "&&")]
    LogicalAnd,
    #[serde(rename = "||")]
    LogicalOr,
    // Bitwise
    #[serde(rename = "&")]
    BitwiseAnd,
    #[serde(rename = "|")]
    BitwiseOr,
    #[serde(rename = "^")]
    BitwiseXor,
    #[serde(rename = "<<")]
    LeftShift,
    #[serde(rename = ">>")]
    RightShift,
    #[serde(rename = ">>>")]
    UnsignedRightShift,
    // Other
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    InstanceOf,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOperator {
    /// -
    #[serde(rename = "-")]
    Minus,
    /// +
    #[serde(rename = "+")]
    Plus,
    /// !
    #[serde(rename = "!")]
    LogicalNot,
    /// ~
    #[serde(rename = "~")]
    BitwiseNot,
    /// typeof
    #[serde(rename = "typeof")]
    Typeof,
    /// void
    #[serde(rename = "void")]
    Void,
    /// delete
    #[serde(rename = "delete")]
    Delete,
}

/// An update expression (++/--).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateExpression {
    /// The operator
    pub operator: UpdateOperator,
    /// Whether prefix (++x) or postfix (x++)
    #[serde(default)]
    pub prefix: bool,
    /// The operand
    pub argument: Box<Expression>,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UpdateOperator {
    /// ++
    #[serde(rename = "++")]
    Increment,
    /// --
    #[serde(rename = "--")]
    Decrement,
}

/// An assignment expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssignmentExpression {
    /// The operator
    pub operator: AssignmentOperator,
    /// The assignment target
    pub target: Box<Expression>,
    /// The assigned value
    pub value: Box<Expression>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubtractAssign,
    #[serde(rename = "*=")]
    MultiplyAssign,
    #[serde(rename = "/=")]
    DivideAssign,
    #[serde(rename = "%=")]
    ModuloAssign,
    #[serde(rename = "&=")]
    BitwiseAndAssign,
    #[serde(rename = "|=")]
    BitwiseOrAssign,
    #[serde(rename = "^=")]
    BitwiseXorAssign,
    #[serde(rename = "<<=")]
    LeftShiftAssign,
    #[serde(rename = ">>=")]
    RightShiftAssign,
    #[serde(rename = ">>>=")]
    UnsignedRightShiftAssign,
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallExpression {
    /// The function being called
    pub callee: Box<Expression>,
    /// The arguments
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

/// A new expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewExpression {
    /// The constructor
    pub callee: Box<Expression>,
    /// The arguments
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

/// Dotted property access (`obj.name`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberExpression {
    /// The object
    pub object: Box<Expression>,
    /// The property name
    pub property: String,
}

/// Computed element access (`obj[key]`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexExpression {
    /// The object
    pub object: Box<Expression>,
    /// The key expression
    pub key: Box<Expression>,
}

/// A conditional (ternary) expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionalExpression {
    /// The condition
    pub test: Box<Expression>,
    /// The consequent (if true)
    pub consequent: Box<Expression>,
    /// The alternate (if false)
    pub alternate: Box<Expression>,
}

/// A comma expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommaExpression {
    /// Evaluated and discarded
    pub left: Box<Expression>,
    /// The result
    pub right: Box<Expression>,
}

/// A function expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionExpression {
    /// Optional name
    #[serde(default)]
    pub name: Option<String>,
    /// Parameters and locals
    #[serde(default)]
    pub scope: Scope,
    /// Body
    pub body: Vec<Statement>,
}
