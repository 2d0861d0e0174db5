use std::fmt;
use std::sync::Arc;

/// Stable handle to a node inside a [`SyntaxTree`].
///
/// Handles are plain arena indices. Removing a node from its parent only
/// detaches it, so a handle obtained before an edit keeps pointing at the same
/// node afterwards (and in any clone of the tree).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Synchronized,
    Native,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Synchronized => "synchronized",
            Modifier::Native => "native",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }

    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match text {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "abstract" => Modifier::Abstract,
            "final" => Modifier::Final,
            "synchronized" => Modifier::Synchronized,
            "native" => Modifier::Native,
            "transient" => Modifier::Transient,
            "volatile" => Modifier::Volatile,
            "strictfp" => Modifier::Strictfp,
            "default" => Modifier::Default,
            "sealed" => Modifier::Sealed,
            "non-sealed" => Modifier::NonSealed,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    Private,
    PackagePrivate,
    Protected,
    Public,
}

impl Visibility {
    fn modifier(self) -> Option<Modifier> {
        match self {
            Visibility::Private => Some(Modifier::Private),
            Visibility::PackagePrivate => None,
            Visibility::Protected => Some(Modifier::Protected),
            Visibility::Public => Some(Modifier::Public),
        }
    }
}

/// Declaration modifiers: annotations (as annotation nodes) followed by keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub annotations: Vec<NodeId>,
    pub keywords: Vec<Modifier>,
}

impl Modifiers {
    pub fn has(&self, modifier: Modifier) -> bool {
        self.keywords.contains(&modifier)
    }

    pub fn visibility(&self) -> Visibility {
        if self.has(Modifier::Public) {
            Visibility::Public
        } else if self.has(Modifier::Protected) {
            Visibility::Protected
        } else if self.has(Modifier::Private) {
            Visibility::Private
        } else {
            Visibility::PackagePrivate
        }
    }

    /// Replaces the access modifier, keeping the visibility keyword first.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.keywords.retain(|m| {
            !matches!(m, Modifier::Public | Modifier::Protected | Modifier::Private)
        });
        if let Some(modifier) = visibility.modifier() {
            self.keywords.insert(0, modifier);
        }
    }

    pub fn insert(&mut self, modifier: Modifier) {
        if !self.has(modifier) {
            self.keywords.push(modifier);
            self.keywords.sort();
        }
    }

    pub fn remove(&mut self, modifier: Modifier) {
        self.keywords.retain(|m| *m != modifier);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportDecl {
    /// Dotted path without the trailing `.*` of wildcard imports.
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl ImportDecl {
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: false,
            is_wildcard: false,
        }
    }

    pub fn wildcard(package: impl Into<String>) -> Self {
        Self {
            path: package.into(),
            is_static: false,
            is_wildcard: true,
        }
    }

    pub fn static_member(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: true,
            is_wildcard: false,
        }
    }

    /// Last path segment (`List` for `java.util.List`, `*` for wildcards).
    pub fn simple_name(&self) -> &str {
        if self.is_wildcard {
            return "*";
        }
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Qualified name as written, including `.*` for wildcards.
    pub fn qualified_name(&self) -> String {
        if self.is_wildcard {
            format!("{}.*", self.path)
        } else {
            self.path.clone()
        }
    }

    /// Package the import draws from.
    ///
    /// Static imports name a member of a type, so their package drops both the
    /// member and the type segment.
    pub fn package(&self) -> &str {
        let path = self.path.as_str();
        let mut segments_to_drop = 0usize;
        if !self.is_wildcard {
            segments_to_drop += 1;
        }
        if self.is_static {
            segments_to_drop += 1;
        }
        let mut end = path.len();
        for _ in 0..segments_to_drop {
            match path[..end].rfind('.') {
                Some(dot) => end = dot,
                None => return "",
            }
        }
        &path[..end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub modifiers: Modifiers,
    pub type_params: Option<String>,
    pub record_components: Vec<Param>,
    /// Superclass of a class. Interfaces list their super-interfaces in `interfaces`.
    pub extends: Option<String>,
    pub interfaces: Vec<String>,
    pub permits: Vec<String>,
    pub enum_constants: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Modifiers::default(),
            type_params: None,
            record_components: Vec::new(),
            extends: None,
            interfaces: Vec::new(),
            permits: Vec::new(),
            enum_constants: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub modifiers: Modifiers,
    pub ty: String,
    pub name: String,
    pub varargs: bool,
}

impl Param {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            modifiers: Modifiers::default(),
            ty: ty.into(),
            name: name.into(),
            varargs: false,
        }
    }

    /// Declared type as seen by callers (`String...` becomes `String[]`).
    pub fn effective_type(&self) -> String {
        if self.varargs {
            format!("{}[]", self.ty)
        } else {
            self.ty.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub name: String,
    /// Array dimensions written after the name (`int a[]`).
    pub dims: usize,
    pub init: Option<NodeId>,
}

impl Declarator {
    pub fn new(name: impl Into<String>, init: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            dims: 0,
            init,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: String,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub type_params: Option<String>,
    /// `None` for constructors.
    pub return_ty: Option<String>,
    pub name: String,
    pub params: Vec<Param>,
    pub throws: Vec<String>,
    pub body: Option<NodeId>,
    /// `default` value of an annotation type element.
    pub default_value: Option<NodeId>,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_ty.is_none()
    }

    pub fn returns_void(&self) -> bool {
        matches!(self.return_ty.as_deref(), Some("void") | None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationArgs {
    None,
    Value(NodeId),
    Named(Vec<(String, NodeId)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub args: AnnotationArgs,
}

impl Annotation {
    /// Last segment of the annotation name (`Test` for `org.junit.Test`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarDecl {
    pub modifiers: Modifiers,
    pub ty: String,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    pub modifiers: Modifiers,
    pub types: Vec<String>,
    pub name: String,
    pub body: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    TextBlock,
    Boolean,
    Null,
}

impl LiteralKind {
    /// Java type of a literal of this kind.
    pub fn java_type(self) -> &'static str {
        match self {
            LiteralKind::Int => "int",
            LiteralKind::Long => "long",
            LiteralKind::Float => "float",
            LiteralKind::Double => "double",
            LiteralKind::Char => "char",
            LiteralKind::String | LiteralKind::TextBlock => "String",
            LiteralKind::Boolean => "boolean",
            LiteralKind::Null => "Object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Source spelling, including quotes and suffixes.
    pub text: String,
}

/// One `case`/`default` group of a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    /// Constants or patterns; empty for a plain `default`.
    pub labels: Vec<NodeId>,
    /// `default` appears in the label list (`case null, default`).
    pub is_default: bool,
    pub guard: Option<NodeId>,
    /// Statements of a `:` group, or the single body of a `->` case.
    pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParam {
    pub ty: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    CompilationUnit {
        package: Option<String>,
        imports: Vec<NodeId>,
        types: Vec<NodeId>,
    },
    Import(ImportDecl),
    TypeDecl(TypeDecl),
    EnumConstant {
        annotations: Vec<NodeId>,
        name: String,
        args: Vec<NodeId>,
        body: Option<Vec<NodeId>>,
    },
    Field(FieldDecl),
    Method(MethodDecl),
    Initializer {
        is_static: bool,
        body: NodeId,
    },
    Annotation(Annotation),

    // Statements.
    Block {
        statements: Vec<NodeId>,
    },
    LocalVar(LocalVarDecl),
    ExprStmt {
        expr: NodeId,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    For {
        init: Vec<NodeId>,
        condition: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    ForEach {
        modifiers: Modifiers,
        ty: String,
        name: String,
        iterable: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Throw {
        value: NodeId,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Try {
        resources: Vec<NodeId>,
        body: NodeId,
        catches: Vec<CatchClause>,
        finally: Option<NodeId>,
    },
    /// Switch statement or expression.
    Switch {
        selector: NodeId,
        cases: Vec<SwitchCase>,
        arrow: bool,
    },
    Yield {
        value: NodeId,
    },
    Synchronized {
        lock: NodeId,
        body: NodeId,
    },
    Assert {
        condition: NodeId,
        message: Option<NodeId>,
    },
    Labeled {
        label: String,
        body: NodeId,
    },
    Empty,

    // Expressions.
    Literal(Literal),
    Name {
        ident: String,
    },
    FieldAccess {
        target: NodeId,
        name: String,
    },
    MethodCall {
        target: Option<NodeId>,
        name: String,
        args: Vec<NodeId>,
    },
    New {
        /// Enclosing instance of a qualified creation (`outer.new Inner()`).
        outer: Option<NodeId>,
        ty: String,
        args: Vec<NodeId>,
        body: Option<Vec<NodeId>>,
    },
    NewArray {
        ty: String,
        dims: Vec<Option<NodeId>>,
        init: Option<NodeId>,
    },
    ArrayInit {
        elements: Vec<NodeId>,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    Assign {
        op: String,
        target: NodeId,
        value: NodeId,
    },
    Binary {
        op: String,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: String,
        operand: NodeId,
        postfix: bool,
    },
    Conditional {
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Cast {
        ty: String,
        expr: NodeId,
    },
    InstanceOf {
        expr: NodeId,
        ty: String,
        binding: Option<String>,
    },
    Lambda {
        params: Vec<LambdaParam>,
        parenthesized: bool,
        body: NodeId,
    },
    MethodRef {
        target: NodeId,
        name: String,
    },
    This {
        qualifier: Option<String>,
    },
    Super {
        qualifier: Option<String>,
    },
    Paren {
        expr: NodeId,
    },
    ClassLit {
        ty: String,
    },
    /// Type pattern in a `case` label.
    TypePattern {
        ty: String,
        name: String,
    },
}

impl NodeKind {
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::LocalVar(_)
                | NodeKind::ExprStmt { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::ForEach { .. }
                | NodeKind::Return { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Try { .. }
                | NodeKind::Switch { .. }
                | NodeKind::Yield { .. }
                | NodeKind::Synchronized { .. }
                | NodeKind::Assert { .. }
                | NodeKind::Labeled { .. }
                | NodeKind::Empty
        )
    }

    pub fn is_loop_or_branch(&self) -> bool {
        matches!(
            self,
            NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::ForEach { .. }
                | NodeKind::Try { .. }
                | NodeKind::Switch { .. }
                | NodeKind::Conditional { .. }
        )
    }
}

fn push_modifier_children(modifiers: &Modifiers, out: &mut Vec<NodeId>) {
    out.extend(modifiers.annotations.iter().copied());
}

fn push_param_children(params: &[Param], out: &mut Vec<NodeId>) {
    for param in params {
        push_modifier_children(&param.modifiers, out);
    }
}

fn push_declarator_children(declarators: &[Declarator], out: &mut Vec<NodeId>) {
    out.extend(declarators.iter().filter_map(|d| d.init));
}

/// Child handles of `kind`, in source order.
fn child_ids(kind: &NodeKind, out: &mut Vec<NodeId>) {
    match kind {
        NodeKind::CompilationUnit { imports, types, .. } => {
            out.extend(imports.iter().copied());
            out.extend(types.iter().copied());
        }
        NodeKind::Import(_) => {}
        NodeKind::TypeDecl(decl) => {
            push_modifier_children(&decl.modifiers, out);
            push_param_children(&decl.record_components, out);
            out.extend(decl.enum_constants.iter().copied());
            out.extend(decl.members.iter().copied());
        }
        NodeKind::EnumConstant {
            annotations,
            args,
            body,
            ..
        } => {
            out.extend(annotations.iter().copied());
            out.extend(args.iter().copied());
            if let Some(members) = body {
                out.extend(members.iter().copied());
            }
        }
        NodeKind::Field(field) => {
            push_modifier_children(&field.modifiers, out);
            push_declarator_children(&field.declarators, out);
        }
        NodeKind::Method(method) => {
            push_modifier_children(&method.modifiers, out);
            push_param_children(&method.params, out);
            out.extend(method.body);
            out.extend(method.default_value);
        }
        NodeKind::Initializer { body, .. } => out.push(*body),
        NodeKind::Annotation(annotation) => match &annotation.args {
            AnnotationArgs::None => {}
            AnnotationArgs::Value(value) => out.push(*value),
            AnnotationArgs::Named(pairs) => out.extend(pairs.iter().map(|(_, v)| *v)),
        },
        NodeKind::Block { statements } => out.extend(statements.iter().copied()),
        NodeKind::LocalVar(decl) => {
            push_modifier_children(&decl.modifiers, out);
            push_declarator_children(&decl.declarators, out);
        }
        NodeKind::ExprStmt { expr } => out.push(*expr),
        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            out.push(*condition);
            out.push(*then_branch);
            out.extend(*else_branch);
        }
        NodeKind::While { condition, body } => {
            out.push(*condition);
            out.push(*body);
        }
        NodeKind::DoWhile { body, condition } => {
            out.push(*body);
            out.push(*condition);
        }
        NodeKind::For {
            init,
            condition,
            update,
            body,
        } => {
            out.extend(init.iter().copied());
            out.extend(*condition);
            out.extend(update.iter().copied());
            out.push(*body);
        }
        NodeKind::ForEach {
            modifiers,
            iterable,
            body,
            ..
        } => {
            push_modifier_children(modifiers, out);
            out.push(*iterable);
            out.push(*body);
        }
        NodeKind::Return { value } => out.extend(*value),
        NodeKind::Throw { value } => out.push(*value),
        NodeKind::Break { .. } | NodeKind::Continue { .. } | NodeKind::Empty => {}
        NodeKind::Try {
            resources,
            body,
            catches,
            finally,
        } => {
            out.extend(resources.iter().copied());
            out.push(*body);
            for clause in catches {
                push_modifier_children(&clause.modifiers, out);
                out.push(clause.body);
            }
            out.extend(*finally);
        }
        NodeKind::Switch {
            selector, cases, ..
        } => {
            out.push(*selector);
            for case in cases {
                out.extend(case.labels.iter().copied());
                out.extend(case.guard);
                out.extend(case.body.iter().copied());
            }
        }
        NodeKind::Yield { value } => out.push(*value),
        NodeKind::Synchronized { lock, body } => {
            out.push(*lock);
            out.push(*body);
        }
        NodeKind::Assert { condition, message } => {
            out.push(*condition);
            out.extend(*message);
        }
        NodeKind::Labeled { body, .. } => out.push(*body),
        NodeKind::Literal(_)
        | NodeKind::Name { .. }
        | NodeKind::This { .. }
        | NodeKind::Super { .. }
        | NodeKind::ClassLit { .. }
        | NodeKind::TypePattern { .. } => {}
        NodeKind::FieldAccess { target, .. } => out.push(*target),
        NodeKind::MethodCall { target, args, .. } => {
            out.extend(*target);
            out.extend(args.iter().copied());
        }
        NodeKind::New {
            outer, args, body, ..
        } => {
            out.extend(*outer);
            out.extend(args.iter().copied());
            if let Some(members) = body {
                out.extend(members.iter().copied());
            }
        }
        NodeKind::NewArray { dims, init, .. } => {
            out.extend(dims.iter().flatten().copied());
            out.extend(*init);
        }
        NodeKind::ArrayInit { elements } => out.extend(elements.iter().copied()),
        NodeKind::ArrayAccess { array, index } => {
            out.push(*array);
            out.push(*index);
        }
        NodeKind::Assign { target, value, .. } => {
            out.push(*target);
            out.push(*value);
        }
        NodeKind::Binary { lhs, rhs, .. } => {
            out.push(*lhs);
            out.push(*rhs);
        }
        NodeKind::Unary { operand, .. } => out.push(*operand),
        NodeKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            out.push(*condition);
            out.push(*then_expr);
            out.push(*else_expr);
        }
        NodeKind::Cast { expr, .. } => out.push(*expr),
        NodeKind::InstanceOf { expr, .. } => out.push(*expr),
        NodeKind::Lambda { body, .. } => out.push(*body),
        NodeKind::MethodRef { target, .. } => out.push(*target),
        NodeKind::Paren { expr } => out.push(*expr),
    }
}

fn map_modifier_children(modifiers: &mut Modifiers, f: &mut dyn FnMut(NodeId) -> NodeId) {
    for id in &mut modifiers.annotations {
        *id = f(*id);
    }
}

fn map_param_children(params: &mut [Param], f: &mut dyn FnMut(NodeId) -> NodeId) {
    for param in params {
        map_modifier_children(&mut param.modifiers, f);
    }
}

fn map_declarator_children(declarators: &mut [Declarator], f: &mut dyn FnMut(NodeId) -> NodeId) {
    for declarator in declarators {
        if let Some(init) = &mut declarator.init {
            *init = f(*init);
        }
    }
}

fn map_vec(ids: &mut [NodeId], f: &mut dyn FnMut(NodeId) -> NodeId) {
    for id in ids {
        *id = f(*id);
    }
}

fn map_opt(id: &mut Option<NodeId>, f: &mut dyn FnMut(NodeId) -> NodeId) {
    if let Some(id) = id {
        *id = f(*id);
    }
}

/// Rewrites every child handle of `kind` through `f`, visiting in source order.
fn map_child_ids(kind: &mut NodeKind, f: &mut dyn FnMut(NodeId) -> NodeId) {
    match kind {
        NodeKind::CompilationUnit { imports, types, .. } => {
            map_vec(imports, f);
            map_vec(types, f);
        }
        NodeKind::Import(_) => {}
        NodeKind::TypeDecl(decl) => {
            map_modifier_children(&mut decl.modifiers, f);
            map_param_children(&mut decl.record_components, f);
            map_vec(&mut decl.enum_constants, f);
            map_vec(&mut decl.members, f);
        }
        NodeKind::EnumConstant {
            annotations,
            args,
            body,
            ..
        } => {
            map_vec(annotations, f);
            map_vec(args, f);
            if let Some(members) = body {
                map_vec(members, f);
            }
        }
        NodeKind::Field(field) => {
            map_modifier_children(&mut field.modifiers, f);
            map_declarator_children(&mut field.declarators, f);
        }
        NodeKind::Method(method) => {
            map_modifier_children(&mut method.modifiers, f);
            map_param_children(&mut method.params, f);
            map_opt(&mut method.body, f);
            map_opt(&mut method.default_value, f);
        }
        NodeKind::Initializer { body, .. } => *body = f(*body),
        NodeKind::Annotation(annotation) => match &mut annotation.args {
            AnnotationArgs::None => {}
            AnnotationArgs::Value(value) => *value = f(*value),
            AnnotationArgs::Named(pairs) => {
                for (_, value) in pairs {
                    *value = f(*value);
                }
            }
        },
        NodeKind::Block { statements } => map_vec(statements, f),
        NodeKind::LocalVar(decl) => {
            map_modifier_children(&mut decl.modifiers, f);
            map_declarator_children(&mut decl.declarators, f);
        }
        NodeKind::ExprStmt { expr } => *expr = f(*expr),
        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            *condition = f(*condition);
            *then_branch = f(*then_branch);
            map_opt(else_branch, f);
        }
        NodeKind::While { condition, body } => {
            *condition = f(*condition);
            *body = f(*body);
        }
        NodeKind::DoWhile { body, condition } => {
            *body = f(*body);
            *condition = f(*condition);
        }
        NodeKind::For {
            init,
            condition,
            update,
            body,
        } => {
            map_vec(init, f);
            map_opt(condition, f);
            map_vec(update, f);
            *body = f(*body);
        }
        NodeKind::ForEach {
            modifiers,
            iterable,
            body,
            ..
        } => {
            map_modifier_children(modifiers, f);
            *iterable = f(*iterable);
            *body = f(*body);
        }
        NodeKind::Return { value } => map_opt(value, f),
        NodeKind::Throw { value } => *value = f(*value),
        NodeKind::Break { .. } | NodeKind::Continue { .. } | NodeKind::Empty => {}
        NodeKind::Try {
            resources,
            body,
            catches,
            finally,
        } => {
            map_vec(resources, f);
            *body = f(*body);
            for clause in catches {
                map_modifier_children(&mut clause.modifiers, f);
                clause.body = f(clause.body);
            }
            map_opt(finally, f);
        }
        NodeKind::Switch {
            selector, cases, ..
        } => {
            *selector = f(*selector);
            for case in cases {
                map_vec(&mut case.labels, f);
                map_opt(&mut case.guard, f);
                map_vec(&mut case.body, f);
            }
        }
        NodeKind::Yield { value } => *value = f(*value),
        NodeKind::Synchronized { lock, body } => {
            *lock = f(*lock);
            *body = f(*body);
        }
        NodeKind::Assert { condition, message } => {
            *condition = f(*condition);
            map_opt(message, f);
        }
        NodeKind::Labeled { body, .. } => *body = f(*body),
        NodeKind::Literal(_)
        | NodeKind::Name { .. }
        | NodeKind::This { .. }
        | NodeKind::Super { .. }
        | NodeKind::ClassLit { .. }
        | NodeKind::TypePattern { .. } => {}
        NodeKind::FieldAccess { target, .. } => *target = f(*target),
        NodeKind::MethodCall { target, args, .. } => {
            map_opt(target, f);
            map_vec(args, f);
        }
        NodeKind::New {
            outer, args, body, ..
        } => {
            map_opt(outer, f);
            map_vec(args, f);
            if let Some(members) = body {
                map_vec(members, f);
            }
        }
        NodeKind::NewArray { dims, init, .. } => {
            for dim in dims.iter_mut() {
                map_opt(dim, f);
            }
            map_opt(init, f);
        }
        NodeKind::ArrayInit { elements } => map_vec(elements, f),
        NodeKind::ArrayAccess { array, index } => {
            *array = f(*array);
            *index = f(*index);
        }
        NodeKind::Assign { target, value, .. } => {
            *target = f(*target);
            *value = f(*value);
        }
        NodeKind::Binary { lhs, rhs, .. } => {
            *lhs = f(*lhs);
            *rhs = f(*rhs);
        }
        NodeKind::Unary { operand, .. } => *operand = f(*operand),
        NodeKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            *condition = f(*condition);
            *then_expr = f(*then_expr);
            *else_expr = f(*else_expr);
        }
        NodeKind::Cast { expr, .. } => *expr = f(*expr),
        NodeKind::InstanceOf { expr, .. } => *expr = f(*expr),
        NodeKind::Lambda { body, .. } => *body = f(*body),
        NodeKind::MethodRef { target, .. } => *target = f(*target),
        NodeKind::Paren { expr } => *expr = f(*expr),
    }
}

/// Where a parsed node came from.
///
/// A node keeps its span only while it and everything below it are exactly
/// as parsed; the printer then copies the source text instead of rebuilding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) source: Arc<str>,
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Indentation of the line the node starts on.
    pub(crate) indent: usize,
}

impl Span {
    pub(crate) fn text(&self) -> &str {
        &self.source[self.start..self.end]
    }
}

/// Comments and layout that sit around a statement or declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Trivia {
    /// Comments on the lines before the node.
    pub(crate) leading: Vec<String>,
    /// Comment after the node on its last line.
    pub(crate) trailing: Option<String>,
    /// Comments just before the closing brace of a block or type body.
    pub(crate) dangling: Vec<String>,
    /// Whether a blank line preceded the node. `None` when the node opened its
    /// enclosing body.
    pub(crate) blank_line_before: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    span: Option<Span>,
    trivia: Option<Box<Trivia>>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena-backed Java syntax tree.
///
/// Nodes are allocated bottom-up; allocating a node adopts its children by
/// setting their parent links. The tree is cheap to clone, and handles remain
/// valid across clones, which is how refactorings stage edits on working
/// copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    /// Creates a tree holding an empty compilation unit.
    pub fn new_compilation_unit(package: Option<String>) -> Self {
        let mut tree = SyntaxTree {
            nodes: Vec::new(),
            root: NodeId::from_raw(0),
        };
        tree.root = tree.alloc(NodeKind::CompilationUnit {
            package,
            imports: Vec::new(),
            types: Vec::new(),
        });
        tree
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        SyntaxTree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.idx() < self.nodes.len()
    }

    /// Allocates a node and adopts its children.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        alloc_in(&mut self.nodes, kind)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.idx()].kind
    }

    /// Mutable access to a node payload.
    ///
    /// Callers that change child lists through this must keep parent links
    /// consistent; prefer the structural helpers below. The node and its
    /// ancestors are printed from the tree afterwards, not from source.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        self.invalidate(id);
        &mut self.nodes[id.idx()].kind
    }

    fn invalidate(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            let node = &mut self.nodes[node.idx()];
            node.span = None;
            current = node.parent;
        }
    }

    pub(crate) fn span(&self, id: NodeId) -> Option<&Span> {
        self.nodes[id.idx()].span.as_ref()
    }

    pub(crate) fn trivia(&self, id: NodeId) -> Option<&Trivia> {
        self.nodes[id.idx()].trivia.as_deref()
    }

    pub(crate) fn set_origin(&mut self, id: NodeId, span: Option<Span>, trivia: Option<Trivia>) {
        let node = &mut self.nodes[id.idx()];
        node.span = span;
        node.trivia = trivia.map(Box::new);
    }

    /// Comments written on the lines before a statement or declaration.
    pub fn leading_comments(&self, id: NodeId) -> &[String] {
        self.trivia(id).map_or(&[], |trivia| trivia.leading.as_slice())
    }

    /// True while `id` prints exactly as it was parsed.
    pub fn is_pristine(&self, id: NodeId) -> bool {
        self.span(id).is_some()
    }

    /// Forgets where the subtree at `id` came from, so it prints in the
    /// canonical layout and without comments.
    pub fn clear_origin(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            let node = &mut self.nodes[node.idx()];
            node.span = None;
            node.trivia = None;
        }
    }

    fn copy_origin(&mut self, to: NodeId, from: &Node) {
        let node = &mut self.nodes[to.idx()];
        node.span = from.span.clone();
        node.trivia = from.trivia.clone();
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.idx()].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        child_ids(self.kind(id), &mut out);
        out
    }

    /// Iterates over `id`'s ancestors, nearest first (excluding `id` itself).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Pre-order traversal of `id`'s subtree, including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// True when `id` is attached to the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) {
        self.nodes[child.idx()].parent = parent;
    }

    /// Deep copy of the subtree rooted at `id`; the copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut kind = self.kind(id).clone();
        map_child_ids(&mut kind, &mut |child| self.clone_subtree(child));
        let copy = self.alloc(kind);
        let original = self.nodes[id.idx()].clone();
        self.copy_origin(copy, &original);
        copy
    }

    /// Deep copy of `id` from `source` into this tree; the copy is detached.
    ///
    /// Comments travel with the copy.
    pub fn import_subtree(&mut self, source: &SyntaxTree, id: NodeId) -> NodeId {
        let mut kind = source.kind(id).clone();
        map_child_ids(&mut kind, &mut |child| self.import_subtree(source, child));
        let copy = self.alloc(kind);
        self.copy_origin(copy, &source.nodes[id.idx()]);
        copy
    }

    /// Replaces `old` with `new` in `old`'s parent. Returns `false` if `old` is detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        self.invalidate(parent);
        let mut replaced = false;
        map_child_ids(&mut self.nodes[parent.idx()].kind, &mut |child| {
            if child == old && !replaced {
                replaced = true;
                new
            } else {
                child
            }
        });
        if replaced {
            self.set_parent(old, None);
            self.set_parent(new, Some(parent));
        }
        replaced
    }

    // --- compilation unit helpers ---

    pub fn package(&self) -> Option<&str> {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { package, .. } => package.as_deref(),
            _ => None,
        }
    }

    pub fn imports(&self) -> Vec<(NodeId, &ImportDecl)> {
        let NodeKind::CompilationUnit { imports, .. } = self.kind(self.root) else {
            return Vec::new();
        };
        imports
            .iter()
            .filter_map(|id| match self.kind(*id) {
                NodeKind::Import(decl) => Some((*id, decl)),
                _ => None,
            })
            .collect()
    }

    pub fn has_import(&self, import: &ImportDecl) -> bool {
        self.imports().iter().any(|(_, existing)| *existing == import)
    }

    /// Adds `import` unless an identical one exists. Returns whether it was added.
    pub fn add_import(&mut self, import: ImportDecl) -> bool {
        if self.has_import(&import) {
            return false;
        }
        let root = self.root;
        let id = self.alloc(NodeKind::Import(import));
        self.set_parent(id, Some(root));
        if let NodeKind::CompilationUnit { imports, .. } = self.kind_mut(root) {
            imports.push(id);
        }
        true
    }

    pub fn top_level_types(&self) -> Vec<NodeId> {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { types, .. } => types.clone(),
            _ => Vec::new(),
        }
    }

    pub fn add_top_level_type(&mut self, decl: NodeId) {
        let root = self.root;
        self.set_parent(decl, Some(root));
        if let NodeKind::CompilationUnit { types, .. } = self.kind_mut(root) {
            types.push(decl);
        }
    }

    // --- declaration helpers ---

    pub fn type_decl(&self, id: NodeId) -> Option<&TypeDecl> {
        match self.kind(id) {
            NodeKind::TypeDecl(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn type_decl_mut(&mut self, id: NodeId) -> Option<&mut TypeDecl> {
        match self.kind_mut(id) {
            NodeKind::TypeDecl(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn method(&self, id: NodeId) -> Option<&MethodDecl> {
        match self.kind(id) {
            NodeKind::Method(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn method_mut(&mut self, id: NodeId) -> Option<&mut MethodDecl> {
        match self.kind_mut(id) {
            NodeKind::Method(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn annotation(&self, id: NodeId) -> Option<&Annotation> {
        match self.kind(id) {
            NodeKind::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    /// Every type declaration in the file, including nested and local ones.
    pub fn all_types(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| matches!(self.kind(*id), NodeKind::TypeDecl(_)))
            .collect()
    }

    /// Finds a type declaration by simple name anywhere in the file.
    pub fn find_type(&self, name: &str) -> Option<NodeId> {
        self.all_types()
            .into_iter()
            .find(|id| self.type_decl(*id).is_some_and(|decl| decl.name == name))
    }

    /// Methods and constructors declared directly in `type_id`.
    pub fn methods_of(&self, type_id: NodeId) -> Vec<NodeId> {
        self.type_decl(type_id)
            .map(|decl| {
                decl.members
                    .iter()
                    .copied()
                    .filter(|m| matches!(self.kind(*m), NodeKind::Method(_)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn method_names(&self, type_id: NodeId) -> Vec<String> {
        self.methods_of(type_id)
            .into_iter()
            .filter_map(|m| self.method(m))
            .filter(|m| !m.is_constructor())
            .map(|m| m.name.clone())
            .collect()
    }

    pub fn find_method(&self, type_id: NodeId, name: &str) -> Option<NodeId> {
        self.methods_of(type_id).into_iter().find(|m| {
            self.method(*m)
                .is_some_and(|decl| !decl.is_constructor() && decl.name == name)
        })
    }

    /// Fields declared directly in `type_id`.
    pub fn fields_of(&self, type_id: NodeId) -> Vec<&FieldDecl> {
        self.type_decl(type_id)
            .map(|decl| {
                decl.members
                    .iter()
                    .filter_map(|m| match self.kind(*m) {
                        NodeKind::Field(field) => Some(field),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn field_names(&self, type_id: NodeId) -> Vec<String> {
        self.fields_of(type_id)
            .into_iter()
            .flat_map(|f| f.declarators.iter().map(|d| d.name.clone()))
            .collect()
    }

    /// Nearest enclosing type declaration of `id` (not including `id` itself).
    pub fn enclosing_type(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| matches!(self.kind(*a), NodeKind::TypeDecl(_)))
    }

    /// Nearest enclosing method or constructor of `id` (not including `id` itself).
    pub fn enclosing_callable(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| matches!(self.kind(*a), NodeKind::Method(_)))
    }

    pub fn modifiers(&self, id: NodeId) -> Option<&Modifiers> {
        match self.kind(id) {
            NodeKind::TypeDecl(decl) => Some(&decl.modifiers),
            NodeKind::Field(field) => Some(&field.modifiers),
            NodeKind::Method(method) => Some(&method.modifiers),
            NodeKind::LocalVar(decl) => Some(&decl.modifiers),
            _ => None,
        }
    }

    pub fn modifiers_mut(&mut self, id: NodeId) -> Option<&mut Modifiers> {
        match self.kind_mut(id) {
            NodeKind::TypeDecl(decl) => Some(&mut decl.modifiers),
            NodeKind::Field(field) => Some(&mut field.modifiers),
            NodeKind::Method(method) => Some(&mut method.modifiers),
            NodeKind::LocalVar(decl) => Some(&mut decl.modifiers),
            _ => None,
        }
    }

    /// Annotation nodes attached to a declaration.
    pub fn annotations_of(&self, id: NodeId) -> Vec<&Annotation> {
        self.modifiers(id)
            .map(|m| {
                m.annotations
                    .iter()
                    .filter_map(|a| self.annotation(*a))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_annotation(&self, id: NodeId, simple_name: &str) -> bool {
        self.annotations_of(id)
            .iter()
            .any(|a| a.simple_name() == simple_name)
    }

    pub fn add_annotation(&mut self, decl: NodeId, annotation: Annotation) -> Option<NodeId> {
        let ann = self.alloc(NodeKind::Annotation(annotation));
        let modifiers = self.modifiers_mut(decl)?;
        modifiers.annotations.push(ann);
        self.set_parent(ann, Some(decl));
        Some(ann)
    }

    /// Removes annotations with the given simple names from a declaration.
    pub fn remove_annotations(&mut self, decl: NodeId, simple_names: &[&str]) {
        let doomed: Vec<NodeId> = self
            .modifiers(decl)
            .map(|m| {
                m.annotations
                    .iter()
                    .copied()
                    .filter(|a| {
                        self.annotation(*a)
                            .is_some_and(|ann| simple_names.contains(&ann.simple_name()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(modifiers) = self.modifiers_mut(decl) {
            modifiers.annotations.retain(|a| !doomed.contains(a));
        }
        for id in doomed {
            self.set_parent(id, None);
        }
    }

    /// Inserts `member` into `type_id` at `index` (clamped to the member count).
    pub fn insert_member(&mut self, type_id: NodeId, index: usize, member: NodeId) -> bool {
        let Some(decl) = self.type_decl_mut(type_id) else {
            return false;
        };
        let index = index.min(decl.members.len());
        decl.members.insert(index, member);
        self.set_parent(member, Some(type_id));
        true
    }

    pub fn push_member(&mut self, type_id: NodeId, member: NodeId) -> bool {
        self.insert_member(type_id, usize::MAX, member)
    }

    /// Detaches `member` from `type_id`. Returns `false` if it was not a member.
    pub fn remove_member(&mut self, type_id: NodeId, member: NodeId) -> bool {
        let Some(decl) = self.type_decl_mut(type_id) else {
            return false;
        };
        let before = decl.members.len();
        decl.members.retain(|m| *m != member);
        let removed = decl.members.len() != before;
        if removed {
            self.set_parent(member, None);
        }
        removed
    }

    pub fn member_index(&self, type_id: NodeId, member: NodeId) -> Option<usize> {
        self.type_decl(type_id)?
            .members
            .iter()
            .position(|m| *m == member)
    }

    /// Statements of a block node.
    pub fn block_statements(&self, block: NodeId) -> &[NodeId] {
        match self.kind(block) {
            NodeKind::Block { statements } => statements,
            _ => &[],
        }
    }

    pub fn insert_statement(&mut self, block: NodeId, index: usize, statement: NodeId) -> bool {
        let NodeKind::Block { statements } = self.kind_mut(block) else {
            return false;
        };
        let index = index.min(statements.len());
        statements.insert(index, statement);
        self.set_parent(statement, Some(block));
        true
    }

    pub fn append_statement(&mut self, block: NodeId, statement: NodeId) -> bool {
        self.insert_statement(block, usize::MAX, statement)
    }

    /// Detaches `count` statements starting at `start`.
    ///
    /// Returns the removed handles, or `None` when the range exceeds the block.
    pub fn remove_statements(
        &mut self,
        block: NodeId,
        start: usize,
        count: usize,
    ) -> Option<Vec<NodeId>> {
        let NodeKind::Block { statements } = self.kind_mut(block) else {
            return None;
        };
        let end = start.checked_add(count)?;
        if end > statements.len() {
            return None;
        }
        let removed: Vec<NodeId> = statements.drain(start..end).collect();
        for id in &removed {
            self.set_parent(*id, None);
        }
        Some(removed)
    }

    /// Replaces a block's whole statement list.
    pub fn set_block_statements(&mut self, block: NodeId, new_statements: Vec<NodeId>) -> bool {
        let NodeKind::Block { statements } = self.kind_mut(block) else {
            return false;
        };
        let old = std::mem::replace(statements, new_statements.clone());
        for id in old {
            self.set_parent(id, None);
        }
        for id in new_statements {
            self.set_parent(id, Some(block));
        }
        true
    }
}

pub(crate) fn alloc_in(nodes: &mut Vec<Node>, kind: NodeKind) -> NodeId {
    let id = NodeId::from_raw(nodes.len() as u32);
    let mut children = Vec::new();
    child_ids(&kind, &mut children);
    nodes.push(Node {
        kind,
        parent: None,
        span: None,
        trivia: None,
    });
    for child in children {
        nodes[child.idx()].parent = Some(id);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(tree: &mut SyntaxTree, text: &str) -> NodeId {
        tree.alloc(NodeKind::Literal(Literal {
            kind: LiteralKind::Int,
            text: text.to_string(),
        }))
    }

    #[test]
    fn alloc_adopts_children() {
        let mut tree = SyntaxTree::new_compilation_unit(None);
        let lhs = literal(&mut tree, "1");
        let rhs = literal(&mut tree, "2");
        let sum = tree.alloc(NodeKind::Binary {
            op: "+".into(),
            lhs,
            rhs,
        });
        assert_eq!(tree.parent(lhs), Some(sum));
        assert_eq!(tree.parent(rhs), Some(sum));
        assert_eq!(tree.children(sum), vec![lhs, rhs]);
    }

    #[test]
    fn clone_subtree_never_aliases_children() {
        let mut tree = SyntaxTree::new_compilation_unit(None);
        let value = literal(&mut tree, "1");
        let stmt = tree.alloc(NodeKind::Return { value: Some(value) });
        let copy = tree.clone_subtree(stmt);
        let copied_children = tree.children(copy);
        assert_eq!(copied_children.len(), 1);
        assert_ne!(copied_children[0], value);
        assert_eq!(tree.kind(copied_children[0]), tree.kind(value));
        assert_eq!(tree.parent(value), Some(stmt));
        assert_eq!(tree.parent(copied_children[0]), Some(copy));
    }

    #[test]
    fn remove_statements_checks_bounds() {
        let mut tree = SyntaxTree::new_compilation_unit(None);
        let a = tree.alloc(NodeKind::Empty);
        let b = tree.alloc(NodeKind::Empty);
        let block = tree.alloc(NodeKind::Block {
            statements: vec![a, b],
        });
        assert!(tree.remove_statements(block, 1, 2).is_none());
        assert_eq!(tree.remove_statements(block, 1, 1), Some(vec![b]));
        assert_eq!(tree.block_statements(block), &[a]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn import_package_accounts_for_static_members() {
        assert_eq!(ImportDecl::single("java.util.List").package(), "java.util");
        assert_eq!(ImportDecl::wildcard("java.util").package(), "java.util");
        assert_eq!(
            ImportDecl::static_member("org.junit.Assert.assertEquals").package(),
            "org.junit"
        );
        assert_eq!(ImportDecl::single("Foo").package(), "");
    }

    #[test]
    fn set_visibility_replaces_access_keyword() {
        let mut modifiers = Modifiers {
            annotations: Vec::new(),
            keywords: vec![Modifier::Private, Modifier::Static],
        };
        modifiers.set_visibility(Visibility::Protected);
        assert_eq!(modifiers.keywords, vec![Modifier::Protected, Modifier::Static]);
        modifiers.set_visibility(Visibility::PackagePrivate);
        assert_eq!(modifiers.keywords, vec![Modifier::Static]);
    }
}
