//! Node representation: kind, flags, children, scalar payload, lines.

use crate::arena::NodeIndex;
use serde::{Deserialize, Serialize};

/// The closed set of node kinds the analyzer understands.
///
/// Child layouts are positional; optional slots hold [`NodeIndex::NONE`].
/// Both analysis passes match on this enum exhaustively - adding a kind
/// here is a compile error everywhere a dispatch exists, which is the
/// point: an unhandled kind is a defect, not a runtime condition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Ordered list of statements. Children: the statements.
    StatementList,
    /// `namespace Foo\Bar;` or `namespace Foo\Bar { ... }`.
    /// Value: namespace path (empty for the global brace form).
    /// Children: `[body: StatementList | NONE]`.
    Namespace,
    /// `use` import statement. Flags: `use_flags`. Children: `UseElem*`.
    Use,
    /// One imported path. Children: `[target: Name, alias: Name | NONE]`.
    UseElem,
    /// Name sequence (interface lists, trait lists). Children: `Name*`.
    NameList,
    /// Call argument sequence. Children: the argument expressions.
    ArgList,
    /// Class, interface or trait declaration. Value: local name.
    /// Flags: `class_flags`. Children:
    /// `[extends: Name | NONE, implements: NameList | NONE,
    ///   uses: NameList | NONE, body: StatementList]`.
    Class,
    /// Property declaration group. Flags: `member_flags`.
    /// Children: `[type | NONE, PropertyElem*]`.
    PropertyGroup,
    /// One declared property. Value: name (no `$`).
    /// Children: `[default: expr | NONE]`.
    PropertyElem,
    /// Class constant group. Flags: `member_flags`.
    /// Children: `ClassConstElem*`.
    ClassConstGroup,
    /// One class constant. Value: name. Children: `[value: expr]`.
    ClassConstElem,
    /// Global `const` statement. Children: `ConstElem*`.
    ConstGroup,
    /// One global constant. Value: name. Children: `[value: expr]`.
    ConstElem,
    /// Function declaration. Value: name. Children:
    /// `[params: ParamList, return_type | NONE, body: StatementList | NONE]`.
    Function,
    /// Method declaration. Value: name. Flags: `member_flags`.
    /// Children as `Function`.
    Method,
    /// Parameter sequence. Children: `Param*`.
    ParamList,
    /// One parameter. Value: name (no `$`).
    /// Children: `[type | NONE, default: expr | NONE]`.
    Param,
    /// Anonymous function expression. Children as `Function`.
    Closure,
    /// Conditional statement. Children: `IfBranch*` (else = nil condition).
    If,
    /// One branch of an `If`. Children:
    /// `[condition: expr | NONE, body: StatementList]`.
    IfBranch,
    /// Loop. Children: `[condition: expr, body: StatementList]`.
    While,
    /// Return statement. Children: `[expr | NONE]`.
    Return,
    /// Echo statement. Children: the echoed expressions.
    Echo,
    /// Expression in statement position. Children: `[expr]`.
    ExprStatement,
    /// Assignment expression. Children: `[target: expr, value: expr]`.
    Assign,
    /// Variable reference. Value: name (no `$`).
    Variable,
    /// Possibly-qualified name. Value: the path, with a leading `\` when
    /// written fully qualified.
    Name,
    /// Function call. Children: `[target: Name | expr, args: ArgList]`.
    Call,
    /// Instance method call. Value: method name.
    /// Children: `[object: expr, args: ArgList]`.
    MethodCall,
    /// Static method call. Value: method name.
    /// Children: `[class: Name, args: ArgList]`.
    StaticCall,
    /// Instance property access. Value: property name.
    /// Children: `[object: expr]`.
    PropertyAccess,
    /// Static property access. Value: property name (no `$`).
    /// Children: `[class: Name]`.
    StaticPropertyAccess,
    /// Class constant access. Value: constant name.
    /// Children: `[class: Name]`.
    ClassConst,
    /// Object instantiation. Children: `[class: Name | expr, args: ArgList]`.
    New,
    /// Binary operation. Flags: `binary_flags`.
    /// Children: `[left: expr, right: expr]`.
    BinaryOp,
    /// Unary operation. Flags: `unary_flags`. Children: `[expr]`.
    UnaryOp,
    /// Cast expression. Flags: `cast_flags`. Children: `[expr]`.
    Cast,
    /// Array literal. Children: `ArrayElem*`.
    ArrayLiteral,
    /// One array element. Children: `[value: expr, key: expr | NONE]`.
    ArrayElem,
    /// Type name in a declaration. Value: the written name.
    TypeName,
    /// `?T` type. Children: `[type]`.
    NullableType,
    /// `T1|T2` type. Children: the member type nodes.
    UnionTypeNode,
    /// Integer literal. Value: the integer.
    LiteralInt,
    /// Float literal. Value: the float.
    LiteralFloat,
    /// String literal. Value: the string.
    LiteralString,
    /// Boolean literal. Value: the boolean.
    LiteralBool,
    /// Null literal.
    LiteralNull,
    /// `isset(...)`. Children: the checked expressions.
    Isset,
    /// `empty(...)`. Children: `[expr]`.
    Empty,
    /// Ternary. Children: `[condition, then: expr | NONE, else: expr]`.
    Ternary,
    /// `instanceof` check. Children: `[expr, class: Name]`.
    InstanceOf,
}

/// Scalar payload attached to leaf nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// One syntax tree node.
///
/// `flags` is an operator/modifier word whose meaning depends on `kind`
/// (see the [`crate::flags`] constant modules). `children` are positional
/// per the layouts documented on [`NodeKind`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub flags: u32,
    pub lineno: u32,
    #[serde(default)]
    pub end_lineno: Option<u32>,
    #[serde(default)]
    pub doc_comment: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeIndex>,
    #[serde(default)]
    pub value: Option<NodeValue>,
}

impl Node {
    /// Positional child accessor; out-of-range slots read as absent.
    pub fn child(&self, index: usize) -> NodeIndex {
        self.children.get(index).copied().unwrap_or(NodeIndex::NONE)
    }

    /// Children from the given position on (variadic tails of mixed
    /// fixed/variadic layouts).
    pub fn children_from(&self, index: usize) -> &[NodeIndex] {
        self.children.get(index..).unwrap_or(&[])
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(NodeValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.value {
            Some(NodeValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn float_value(&self) -> Option<f64> {
        match self.value {
            Some(NodeValue::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.value {
            Some(NodeValue::Bool(v)) => Some(v),
            _ => None,
        }
    }
}
