use std::fmt;

use lex::{CharPrefix, FloatSuffix, IntSuffix, Operator, SourceLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LAnd,
    LOr,
}

impl BinaryOp {
    pub fn from_operator(op: Operator) -> Option<Self> {
        use BinaryOp::*;
        Some(match op {
            Operator::Star => Mul,
            Operator::Slash => Div,
            Operator::Percent => Mod,
            Operator::Plus => Add,
            Operator::Minus => Sub,
            Operator::Shl => Shl,
            Operator::Shr => Shr,
            Operator::Lt => Lt,
            Operator::Gt => Gt,
            Operator::Le => Le,
            Operator::Ge => Ge,
            Operator::EqEq => Eq,
            Operator::Ne => Ne,
            Operator::Amp => BitAnd,
            Operator::Caret => BitXor,
            Operator::Pipe => BitOr,
            Operator::AndAnd => LAnd,
            Operator::OrOr => LOr,
            _ => return None,
        })
    }

    pub fn spelling(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Mul => "*",
            Div => "/",
            Mod => "%",
            Add => "+",
            Sub => "-",
            Shl => "<<",
            Shr => ">>",
            Lt => "<",
            Gt => ">",
            Le => "<=",
            Ge => ">=",
            Eq => "==",
            Ne => "!=",
            BitAnd => "&",
            BitXor => "^",
            BitOr => "|",
            LAnd => "&&",
            LOr => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Plus,
    Minus,
    Not,
    BitNot,
    Deref,
    AddrOf,
}

impl UnaryOp {
    pub fn spelling(self) -> &'static str {
        use UnaryOp::*;
        match self {
            PreInc | PostInc => "++",
            PreDec | PostDec => "--",
            Plus => "+",
            Minus => "-",
            Not => "!",
            BitNot => "~",
            Deref => "*",
            AddrOf => "&",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    And,
    Xor,
    Or,
}

impl AssignOp {
    pub fn from_operator(op: Operator) -> Option<Self> {
        use AssignOp::*;
        Some(match op {
            Operator::Assign => Assign,
            Operator::StarAssign => Mul,
            Operator::SlashAssign => Div,
            Operator::PercentAssign => Mod,
            Operator::PlusAssign => Add,
            Operator::MinusAssign => Sub,
            Operator::ShlAssign => Shl,
            Operator::ShrAssign => Shr,
            Operator::AndAssign => And,
            Operator::XorAssign => Xor,
            Operator::OrAssign => Or,
            _ => return None,
        })
    }

    pub fn spelling(self) -> &'static str {
        use AssignOp::*;
        match self {
            Assign => "=",
            Mul => "*=",
            Div => "/=",
            Mod => "%=",
            Add => "+=",
            Sub => "-=",
            Shl => "<<=",
            Shr => ">>=",
            And => "&=",
            Xor => "^=",
            Or => "|=",
        }
    }
}

/// Node tags. Child layout per tag is listed where it is not just "in source order".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TranslationUnit,

    // Declarations
    /// `[return type, ParamDecl*, Compound?]`
    FunctionDecl,
    /// `[type, AlignAs*, initializer?]`
    VarDecl,
    /// `[type]`
    ParamDecl,
    /// `[type, AlignAs*, bit width?]`
    FieldDecl,
    /// Tag declaration without declarators; children are the members.
    StructDecl,
    UnionDecl,
    EnumDecl,
    /// `[value?]`
    EnumConstant,
    /// `[type]`
    TypedefDecl,
    /// `[condition, message?]`
    StaticAssert,
    /// Several declarations where one node is expected (a `for` initializer).
    DeclGroup,
    /// `[type or expression]`
    AlignAs,
    /// GNU `__label__` declaration.
    LabelDecl,

    // Statements
    Compound,
    /// `[cond, then, else?]`
    If,
    /// `[cond, body]`
    While,
    /// `[body, cond]`
    DoWhile,
    /// `[init, cond, step, body]`; absent clauses are `Empty`.
    For,
    /// `[cond, body]`
    Switch,
    /// `[value, high?, stmt]`; `high` is the GNU case-range upper bound.
    Case,
    /// `[stmt]`
    Default,
    /// `[value?]`
    Return,
    Break,
    Continue,
    Goto,
    /// GNU `goto *expr`.
    IndirectGoto,
    /// `[stmt]`
    Labeled,
    /// `[expr]`
    ExprStmt,
    Empty,
    /// Template in the payload; operand expressions as children.
    Asm,

    // Expressions
    Binary(BinaryOp),
    Unary(UnaryOp),
    Assign(AssignOp),
    /// `[cond, then, else]`
    Conditional,
    /// GNU `a ?: b`: `[cond, else]`
    BinaryConditional,
    Comma,
    /// `[callee, args*]`
    Call,
    /// `[base]`, member name in the payload.
    Member,
    Arrow,
    /// `[base, index]`
    Subscript,
    /// `[type, expr]`
    Cast,
    SizeofExpr,
    SizeofType,
    AlignofExpr,
    AlignofType,
    /// `[type, InitList]`
    CompoundLiteral,
    /// `[controlling expr, GenericAssoc | GenericDefault ...]`
    GenericSelection,
    /// `[type, expr]`
    GenericAssoc,
    /// `[expr]`
    GenericDefault,
    Identifier,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
    BoolLiteral,
    NullptrLiteral,
    /// `[Compound]`
    StmtExpr,
    LabelAddress,
    /// `[va_list expr, type]`
    BuiltinVaArg,
    /// `[type, designators...]`
    BuiltinOffsetof,
    /// `[type, type]`
    BuiltinTypesCompatible,
    InitList,
    /// `[designators..., value]`
    Designation,
    FieldDesignator,
    /// `[index]`
    IndexDesignator,
    /// GNU `[lo ... hi]`
    RangeDesignator,

    // Types
    BuiltinType,
    TypedefName,
    /// `[pointee]`
    PointerType,
    /// `[element, size?]`
    ArrayType,
    /// `[return type, ParamDecl*]`
    FunctionType,
    /// Members as children when the specifier carries a body.
    StructType,
    UnionType,
    EnumType,
    /// `[inner]`
    QualifiedType,
    /// `_Atomic(T)`: `[inner]`
    AtomicType,
    /// `[type or expression]`
    TypeofType,
    /// `[width]`
    BitIntType,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        use NodeKind::*;
        match self {
            TranslationUnit => "TranslationUnit",
            FunctionDecl => "FunctionDecl",
            VarDecl => "VarDecl",
            ParamDecl => "ParamDecl",
            FieldDecl => "FieldDecl",
            StructDecl => "StructDecl",
            UnionDecl => "UnionDecl",
            EnumDecl => "EnumDecl",
            EnumConstant => "EnumConstant",
            TypedefDecl => "TypedefDecl",
            StaticAssert => "StaticAssert",
            DeclGroup => "DeclGroup",
            AlignAs => "AlignAs",
            LabelDecl => "LabelDecl",
            Compound => "Compound",
            If => "If",
            While => "While",
            DoWhile => "DoWhile",
            For => "For",
            Switch => "Switch",
            Case => "Case",
            Default => "Default",
            Return => "Return",
            Break => "Break",
            Continue => "Continue",
            Goto => "Goto",
            IndirectGoto => "IndirectGoto",
            Labeled => "Labeled",
            ExprStmt => "ExprStmt",
            Empty => "Empty",
            Asm => "Asm",
            Binary(_) => "Binary",
            Unary(_) => "Unary",
            Assign(_) => "Assign",
            Conditional => "Conditional",
            BinaryConditional => "BinaryConditional",
            Comma => "Comma",
            Call => "Call",
            Member => "Member",
            Arrow => "Arrow",
            Subscript => "Subscript",
            Cast => "Cast",
            SizeofExpr => "SizeofExpr",
            SizeofType => "SizeofType",
            AlignofExpr => "AlignofExpr",
            AlignofType => "AlignofType",
            CompoundLiteral => "CompoundLiteral",
            GenericSelection => "GenericSelection",
            GenericAssoc => "GenericAssoc",
            GenericDefault => "GenericDefault",
            Identifier => "Identifier",
            IntLiteral => "IntLiteral",
            FloatLiteral => "FloatLiteral",
            CharLiteral => "CharLiteral",
            StringLiteral => "StringLiteral",
            BoolLiteral => "BoolLiteral",
            NullptrLiteral => "NullptrLiteral",
            StmtExpr => "StmtExpr",
            LabelAddress => "LabelAddress",
            BuiltinVaArg => "BuiltinVaArg",
            BuiltinOffsetof => "BuiltinOffsetof",
            BuiltinTypesCompatible => "BuiltinTypesCompatible",
            InitList => "InitList",
            Designation => "Designation",
            FieldDesignator => "FieldDesignator",
            IndexDesignator => "IndexDesignator",
            RangeDesignator => "RangeDesignator",
            BuiltinType => "BuiltinType",
            TypedefName => "TypedefName",
            PointerType => "PointerType",
            ArrayType => "ArrayType",
            FunctionType => "FunctionType",
            StructType => "StructType",
            UnionType => "UnionType",
            EnumType => "EnumType",
            QualifiedType => "QualifiedType",
            AtomicType => "AtomicType",
            TypeofType => "TypeofType",
            BitIntType => "BitIntType",
        }
    }

    pub fn is_type(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            BuiltinType
                | TypedefName
                | PointerType
                | ArrayType
                | FunctionType
                | StructType
                | UnionType
                | EnumType
                | QualifiedType
                | AtomicType
                | TypeofType
                | BitIntType
        )
    }

    pub fn is_declaration(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            FunctionDecl
                | VarDecl
                | ParamDecl
                | FieldDecl
                | StructDecl
                | UnionDecl
                | EnumDecl
                | EnumConstant
                | TypedefDecl
                | StaticAssert
                | DeclGroup
                | LabelDecl
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Extern,
    Static,
    Auto,
    Register,
    Constexpr,
}

impl StorageClass {
    pub fn spelling(self) -> &'static str {
        match self {
            StorageClass::Extern => "extern",
            StorageClass::Static => "static",
            StorageClass::Auto => "auto",
            StorageClass::Register => "register",
            StorageClass::Constexpr => "constexpr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Quals {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
    pub is_atomic: bool,
}

impl Quals {
    pub fn is_empty(&self) -> bool {
        !(self.is_const || self.is_volatile || self.is_restrict || self.is_atomic)
    }
}

impl fmt::Display for Quals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = [
            (self.is_const, "const"),
            (self.is_volatile, "volatile"),
            (self.is_restrict, "restrict"),
            (self.is_atomic, "_Atomic"),
        ];
        let mut first = true;
        for (on, word) in words {
            if on {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(word)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Object, parameter, field and typedef declarations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclInfo {
    pub name: Option<String>,
    pub storage: Option<StorageClass>,
    pub thread_local: bool,
    /// GNU `__asm__("sym")` on the declarator.
    pub asm_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionInfo {
    pub name: String,
    pub storage: Option<StorageClass>,
    pub inline: bool,
    pub noreturn: bool,
    pub variadic: bool,
    pub prototyped: bool,
    pub asm_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    /// Identifiers, member and label names, builtin type spellings, asm templates.
    Name(String),
    Int {
        value: u64,
        suffix: IntSuffix,
    },
    Float {
        value: f64,
        suffix: FloatSuffix,
    },
    Char {
        value: u32,
        prefix: CharPrefix,
    },
    Str {
        units: Vec<u32>,
        prefix: CharPrefix,
    },
    /// `BoolLiteral` value, `TypeofType` unqual flag, `BitIntType` unsigned flag.
    Flag(bool),
    Decl(DeclInfo),
    Function(FunctionInfo),
    Tag {
        name: Option<String>,
        has_body: bool,
    },
    Quals(Quals),
    Array {
        quals: Quals,
        is_static: bool,
        /// `[*]`
        vla_star: bool,
    },
    FunctionType {
        variadic: bool,
        prototyped: bool,
    },
}

/// One AST node. Children are owned; every child has exactly one parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: SourceLocation,
    pub children: Vec<Node>,
    pub payload: Payload,
}

impl Node {
    pub fn new(kind: NodeKind, loc: SourceLocation) -> Self {
        Self {
            kind,
            loc,
            children: Vec::new(),
            payload: Payload::None,
        }
    }

    pub fn with_children(kind: NodeKind, loc: SourceLocation, children: Vec<Node>) -> Self {
        Self {
            kind,
            loc,
            children,
            payload: Payload::None,
        }
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn named(kind: NodeKind, loc: SourceLocation, name: impl Into<String>) -> Self {
        Self::new(kind, loc).payload(Payload::Name(name.into()))
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn child(&self, i: usize) -> Option<&Node> {
        self.children.get(i)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    /// The name this node introduces or refers to, if any.
    pub fn name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Name(n) => Some(n),
            Payload::Decl(d) => d.name.as_deref(),
            Payload::Function(f) => Some(&f.name),
            Payload::Tag { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub fn int_value(&self) -> Option<u64> {
        match self.payload {
            Payload::Int { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn decl(&self) -> Option<&DeclInfo> {
        match &self.payload {
            Payload::Decl(d) => Some(d),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&FunctionInfo> {
        match &self.payload {
            Payload::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Operator spelling for unary, binary and assignment expressions.
    pub fn operator_lexeme(&self) -> Option<&'static str> {
        match self.kind {
            NodeKind::Binary(op) => Some(op.spelling()),
            NodeKind::Unary(op) => Some(op.spelling()),
            NodeKind::Assign(op) => Some(op.spelling()),
            _ => None,
        }
    }

    /// Declared type of a declaration node (the first child).
    pub fn decl_type(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::VarDecl
            | NodeKind::ParamDecl
            | NodeKind::FieldDecl
            | NodeKind::TypedefDecl
            | NodeKind::FunctionDecl => self.children.first(),
            _ => None,
        }
    }

    pub fn initializer(&self) -> Option<&Node> {
        if self.kind != NodeKind::VarDecl {
            return None;
        }
        self.children.iter().skip(1).find(|c| c.kind != NodeKind::AlignAs)
    }

    pub fn params(&self) -> impl Iterator<Item = &Node> {
        let take = matches!(self.kind, NodeKind::FunctionDecl | NodeKind::FunctionType);
        self.children
            .iter()
            .filter(move |c| take && c.kind == NodeKind::ParamDecl)
    }

    pub fn body(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::FunctionDecl => self.children.last().filter(|c| c.kind == NodeKind::Compound),
            _ => None,
        }
    }

    /// Structural equality ignoring source locations.
    pub fn same_shape(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.payload == other.payload
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        self.descendants().count()
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
