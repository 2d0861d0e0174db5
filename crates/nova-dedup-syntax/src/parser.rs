use crate::lexer::{lex_with_comments, Token, TokenKind};
use crate::origin;
use crate::tree::{
    alloc_in, Annotation, AnnotationArgs, CatchClause, Declarator, FieldDecl, ImportDecl,
    LambdaParam, Literal, LiteralKind, LocalVarDecl, MethodDecl, Modifier, Modifiers, Node,
    NodeId, NodeKind, Param, SwitchCase, SyntaxTree, TypeDecl, TypeKind,
};
use crate::ParseError;

type PResult<T> = Result<T, ParseError>;

const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

// Operators the parser glues together from single `>` tokens.
const ANGLE_OPERATORS: &[&str] = &[">>>=", ">>=", ">>>", ">>", ">=", ">"];

/// Parses a Java compilation unit.
pub fn parse(text: &str) -> Result<SyntaxTree, ParseError> {
    let (tokens, comments) = lex_with_comments(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        nodes: Vec::new(),
        ranges: Vec::new(),
        closers: Vec::new(),
    };
    let root = parser.compilation_unit()?;
    let mut tree = SyntaxTree::from_parts(parser.nodes, root);
    origin::attach(
        &mut tree,
        &origin::Layout {
            text,
            tokens: &parser.tokens,
            comments: &comments,
            ranges: &parser.ranges,
            closers: &parser.closers,
        },
    );
    Ok(tree)
}

fn is_reserved(text: &str) -> bool {
    RESERVED.contains(&text)
}

fn is_primitive(text: &str) -> bool {
    PRIMITIVES.contains(&text)
}

/// Binding powers for infix operators: `(left, right, is_assignment)`.
fn infix_binding_power(op: &str) -> Option<(u8, u8, bool)> {
    let power = match op {
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" | ">>>=" => {
            return Some((2, 1, true))
        }
        "||" => (20, 21),
        "&&" => (30, 31),
        "|" => (38, 39),
        "^" => (39, 40),
        "&" => (40, 41),
        "==" | "!=" => (45, 46),
        "<" | "<=" | ">" | ">=" => (50, 51),
        "<<" | ">>" | ">>>" => (55, 56),
        "+" | "-" => (60, 61),
        "*" | "/" | "%" => (70, 71),
        _ => return None,
    };
    Some((power.0, power.1, false))
}

const TERNARY_BP: u8 = 10;
const INSTANCEOF_BP: u8 = 50;
const PREFIX_BP: u8 = 100;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nodes: Vec<Node>,
    /// Token range `[start, end)` of each node, when known.
    ranges: Vec<Option<(usize, usize)>>,
    /// Closing-brace token of each block and type body.
    closers: Vec<(usize, NodeId)>,
}

impl Parser {
    // --- token helpers ---

    fn nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn token_at(&self, index: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[index.min(last)]
    }

    fn peek(&self) -> &Token {
        self.nth(0)
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn is_text(token: &Token, text: &str) -> bool {
        matches!(token.kind, TokenKind::Punct | TokenKind::Ident) && token.text == text
    }

    fn at(&self, text: &str) -> bool {
        Self::is_text(self.peek(), text)
    }

    fn nth_is(&self, n: usize, text: &str) -> bool {
        Self::is_text(self.nth(n), text)
    }

    fn is_name_token(token: &Token) -> bool {
        token.kind == TokenKind::Ident && !is_reserved(&token.text)
    }

    fn at_name(&self) -> bool {
        Self::is_name_token(self.peek())
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> PResult<()> {
        if self.eat(text) {
            Ok(())
        } else {
            self.error(format!("expected `{text}`"))
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            format!("`{}`", token.text)
        };
        Err(ParseError::new(
            format!("{}, found {found}", message.into()),
            token.offset,
        ))
    }

    fn ident(&mut self) -> PResult<String> {
        if self.at_name() {
            Ok(self.bump().text)
        } else {
            self.error("expected identifier")
        }
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.ident()?;
        while self.at(".") && Self::is_name_token(self.nth(1)) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident()?);
        }
        Ok(name)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.ranges.push(None);
        alloc_in(&mut self.nodes, kind)
    }

    /// Allocates a node covering the tokens from `start` to the cursor.
    fn finish(&mut self, start: usize, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.mark(id, start)
    }

    /// Widens `id` to cover the tokens from `start` to the cursor.
    fn mark(&mut self, id: NodeId, start: usize) -> NodeId {
        self.ranges[id.idx()] = Some((start, self.pos));
        id
    }

    /// Drops nodes allocated during an abandoned attempt.
    fn rewind(&mut self, pos: usize, node_count: usize) {
        self.pos = pos;
        self.nodes.truncate(node_count);
        self.ranges.truncate(node_count);
        self.closers.retain(|(_, id)| id.idx() < node_count);
    }

    // --- declarations ---

    fn compilation_unit(&mut self) -> PResult<NodeId> {
        let mut package = None;
        if self.eat("package") {
            package = Some(self.qualified_name()?);
            self.expect(";")?;
        }

        let mut imports = Vec::new();
        while self.at("import") {
            let start = self.pos;
            self.pos += 1;
            let is_static = self.eat("static");
            let mut path = self.ident()?;
            let mut is_wildcard = false;
            while self.eat(".") {
                if self.eat("*") {
                    is_wildcard = true;
                    break;
                }
                path.push('.');
                path.push_str(&self.ident()?);
            }
            self.expect(";")?;
            imports.push(self.finish(
                start,
                NodeKind::Import(ImportDecl {
                    path,
                    is_static,
                    is_wildcard,
                }),
            ));
        }

        let mut types = Vec::new();
        while !self.at_eof() {
            if self.eat(";") {
                continue;
            }
            let start = self.pos;
            let modifiers = self.modifiers()?;
            let decl = self.type_decl(modifiers)?;
            types.push(self.mark(decl, start));
        }

        Ok(self.finish(
            0,
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
        ))
    }

    fn modifiers(&mut self) -> PResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            if self.at("@") && !self.nth_is(1, "interface") {
                modifiers.annotations.push(self.annotation()?);
                continue;
            }
            let token = self.peek();
            if token.kind == TokenKind::Ident {
                if let Some(modifier) = Modifier::from_keyword(&token.text) {
                    // `sealed`/`non-sealed` are contextual; only treat them as
                    // modifiers when another declaration token follows.
                    let contextual = matches!(modifier, Modifier::Sealed | Modifier::NonSealed);
                    if !contextual || self.nth(1).kind == TokenKind::Ident {
                        self.pos += 1;
                        modifiers.keywords.push(modifier);
                        continue;
                    }
                }
            }
            return Ok(modifiers);
        }
    }

    /// `final` and annotations, as allowed on locals and parameters.
    fn local_modifiers(&mut self) -> PResult<Modifiers> {
        let mut modifiers = Modifiers::default();
        loop {
            if self.at("@") {
                modifiers.annotations.push(self.annotation()?);
            } else if self.eat("final") {
                modifiers.keywords.push(Modifier::Final);
            } else {
                return Ok(modifiers);
            }
        }
    }

    fn annotations(&mut self) -> PResult<Vec<NodeId>> {
        let mut annotations = Vec::new();
        while self.at("@") {
            annotations.push(self.annotation()?);
        }
        Ok(annotations)
    }

    fn annotation(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect("@")?;
        let name = self.qualified_name()?;
        let args = if self.eat("(") {
            if self.eat(")") {
                AnnotationArgs::None
            } else if self.at_name() && self.nth_is(1, "=") {
                let mut pairs = Vec::new();
                loop {
                    let key = self.ident()?;
                    self.expect("=")?;
                    let value = self.element_value()?;
                    pairs.push((key, value));
                    if !self.eat(",") {
                        break;
                    }
                }
                self.expect(")")?;
                AnnotationArgs::Named(pairs)
            } else {
                let value = self.element_value()?;
                self.expect(")")?;
                AnnotationArgs::Value(value)
            }
        } else {
            AnnotationArgs::None
        };
        Ok(self.finish(start, NodeKind::Annotation(Annotation { name, args })))
    }

    fn element_value(&mut self) -> PResult<NodeId> {
        if self.at("@") {
            self.annotation()
        } else if self.at("{") {
            self.array_init()
        } else {
            self.expr_bp(TERNARY_BP)
        }
    }

    fn at_type_decl_start(&self) -> bool {
        self.at("class")
            || self.at("interface")
            || self.at("enum")
            || (self.at("@") && self.nth_is(1, "interface"))
            || (self.at("record")
                && Self::is_name_token(self.nth(1))
                && (self.nth_is(2, "(") || self.nth_is(2, "<")))
    }

    fn type_decl(&mut self, modifiers: Modifiers) -> PResult<NodeId> {
        let start = self.pos;
        let kind = if self.at("class") {
            TypeKind::Class
        } else if self.at("interface") {
            TypeKind::Interface
        } else if self.at("enum") {
            TypeKind::Enum
        } else if self.at("record") {
            TypeKind::Record
        } else if self.at("@") && self.nth_is(1, "interface") {
            self.pos += 1;
            TypeKind::Annotation
        } else {
            return self.error("expected type declaration");
        };
        self.pos += 1;

        let mut decl = TypeDecl::new(kind, self.ident()?);
        decl.modifiers = modifiers;
        if self.at("<") {
            decl.type_params = Some(self.type_params()?);
        }
        if kind == TypeKind::Record {
            decl.record_components = self.params()?;
        }
        if self.eat("extends") {
            match kind {
                TypeKind::Class => decl.extends = Some(self.type_()?),
                TypeKind::Interface => decl.interfaces = self.type_list()?,
                _ => return self.error("unexpected `extends` clause"),
            }
        }
        if self.eat("implements") {
            decl.interfaces.extend(self.type_list()?);
        }
        if self.eat("permits") {
            decl.permits = self.type_list()?;
        }

        self.expect("{")?;
        if kind == TypeKind::Enum {
            while !self.at(";") && !self.at("}") {
                let constant_start = self.pos;
                let annotations = self.annotations()?;
                let name = self.ident()?;
                let args = if self.at("(") {
                    self.arguments()?
                } else {
                    Vec::new()
                };
                let body = if self.eat("{") {
                    Some(self.class_body_members("")?)
                } else {
                    None
                };
                let constant = self.finish(
                    constant_start,
                    NodeKind::EnumConstant {
                        annotations,
                        name,
                        args,
                        body,
                    },
                );
                decl.enum_constants.push(constant);
                if !self.eat(",") {
                    break;
                }
            }
            self.eat(";");
        }

        let class_name = decl.name.clone();
        decl.members = self.class_body_members(&class_name)?;
        let closer = self.pos - 1;
        let id = self.finish(start, NodeKind::TypeDecl(decl));
        self.closers.push((closer, id));
        Ok(id)
    }

    /// Members up to and including the closing brace.
    fn class_body_members(&mut self, class_name: &str) -> PResult<Vec<NodeId>> {
        let mut members = Vec::new();
        while !self.eat("}") {
            if self.at_eof() {
                return self.error("expected `}`");
            }
            let start = self.pos;
            if let Some(member) = self.member(class_name)? {
                members.push(self.mark(member, start));
            }
        }
        Ok(members)
    }

    fn member(&mut self, class_name: &str) -> PResult<Option<NodeId>> {
        if self.eat(";") {
            return Ok(None);
        }
        if self.at("{") || (self.at("static") && self.nth_is(1, "{")) {
            let is_static = self.eat("static");
            let body = self.block()?;
            return Ok(Some(self.alloc(NodeKind::Initializer { is_static, body })));
        }

        let modifiers = self.modifiers()?;
        if self.at_type_decl_start() {
            return self.type_decl(modifiers).map(Some);
        }
        let type_params = if self.at("<") {
            Some(self.type_params()?)
        } else {
            None
        };

        if !class_name.is_empty() && self.at(class_name) && self.nth_is(1, "(") {
            let name = self.bump().text;
            let params = self.params()?;
            let throws = self.throws()?;
            let body = Some(self.block()?);
            return Ok(Some(self.alloc(NodeKind::Method(MethodDecl {
                modifiers,
                type_params,
                return_ty: None,
                name,
                params,
                throws,
                body,
                default_value: None,
            }))));
        }

        let ty = if self.eat("void") {
            "void".to_string()
        } else {
            self.type_()?
        };
        let name = self.ident()?;
        if self.at("(") {
            let params = self.params()?;
            let throws = self.throws()?;
            let mut default_value = None;
            let body = if self.eat(";") {
                None
            } else if self.eat("default") {
                default_value = Some(self.element_value()?);
                self.expect(";")?;
                None
            } else {
                Some(self.block()?)
            };
            return Ok(Some(self.alloc(NodeKind::Method(MethodDecl {
                modifiers,
                type_params,
                return_ty: Some(ty),
                name,
                params,
                throws,
                body,
                default_value,
            }))));
        }

        let declarators = self.declarators(name)?;
        self.expect(";")?;
        Ok(Some(self.alloc(NodeKind::Field(FieldDecl {
            modifiers,
            ty,
            declarators,
        }))))
    }

    fn declarators(&mut self, first: String) -> PResult<Vec<Declarator>> {
        let mut declarators = Vec::new();
        let mut name = first;
        loop {
            let dims = self.array_dims();
            let init = if self.eat("=") {
                Some(self.var_init()?)
            } else {
                None
            };
            declarators.push(Declarator { name, dims, init });
            if !self.eat(",") {
                return Ok(declarators);
            }
            name = self.ident()?;
        }
    }

    /// Consumes `[]` pairs and returns how many there were.
    fn array_dims(&mut self) -> usize {
        let mut dims = 0;
        while self.at("[") && self.nth_is(1, "]") {
            self.pos += 2;
            dims += 1;
        }
        dims
    }

    fn var_init(&mut self) -> PResult<NodeId> {
        if self.at("{") {
            self.array_init()
        } else {
            self.expression()
        }
    }

    fn params(&mut self) -> PResult<Vec<Param>> {
        self.expect("(")?;
        let mut params = Vec::new();
        if self.eat(")") {
            return Ok(params);
        }
        loop {
            let modifiers = self.local_modifiers()?;
            let mut ty = self.type_()?;
            let varargs = self.eat("...");
            let name = self.ident()?;
            for _ in 0..self.array_dims() {
                ty.push_str("[]");
            }
            params.push(Param {
                modifiers,
                ty,
                name,
                varargs,
            });
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    fn throws(&mut self) -> PResult<Vec<String>> {
        if self.eat("throws") {
            self.type_list()
        } else {
            Ok(Vec::new())
        }
    }

    // --- types ---

    fn type_list(&mut self) -> PResult<Vec<String>> {
        let mut types = vec![self.type_()?];
        while self.eat(",") {
            types.push(self.type_()?);
        }
        Ok(types)
    }

    fn type_(&mut self) -> PResult<String> {
        let mut ty = self.type_without_dims()?;
        while self.at("[") && self.nth_is(1, "]") {
            self.pos += 2;
            ty.push_str("[]");
        }
        Ok(ty)
    }

    fn type_without_dims(&mut self) -> PResult<String> {
        if self.peek().kind == TokenKind::Ident && is_primitive(&self.peek().text) {
            return Ok(self.bump().text);
        }
        let mut ty = self.ident()?;
        loop {
            if self.at("<") {
                ty.push_str(&self.type_args()?);
            }
            if self.at(".") && Self::is_name_token(self.nth(1)) {
                self.pos += 1;
                ty.push('.');
                ty.push_str(&self.ident()?);
            } else {
                return Ok(ty);
            }
        }
    }

    fn type_args(&mut self) -> PResult<String> {
        self.expect("<")?;
        if self.eat(">") {
            return Ok("<>".to_string());
        }
        let mut args = Vec::new();
        loop {
            if self.eat("?") {
                let mut arg = "?".to_string();
                if self.eat("extends") {
                    arg.push_str(" extends ");
                    arg.push_str(&self.type_()?);
                } else if self.eat("super") {
                    arg.push_str(" super ");
                    arg.push_str(&self.type_()?);
                }
                args.push(arg);
            } else {
                args.push(self.type_()?);
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect(">")?;
        Ok(format!("<{}>", args.join(", ")))
    }

    fn type_params(&mut self) -> PResult<String> {
        self.expect("<")?;
        let mut params = Vec::new();
        loop {
            let mut param = self.ident()?;
            if self.eat("extends") {
                param.push_str(" extends ");
                param.push_str(&self.type_()?);
                while self.eat("&") {
                    param.push_str(" & ");
                    param.push_str(&self.type_()?);
                }
            }
            params.push(param);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(">")?;
        Ok(format!("<{}>", params.join(", ")))
    }

    // --- lookahead ---

    /// Index just past a type starting at `index`, if one is there.
    fn skip_type(&self, mut index: usize) -> Option<usize> {
        let token = self.token_at(index);
        if token.kind == TokenKind::Ident && is_primitive(&token.text) {
            index += 1;
        } else if Self::is_name_token(token) {
            index += 1;
            loop {
                if Self::is_text(self.token_at(index), "<") {
                    index = self.skip_type_args(index)?;
                }
                if Self::is_text(self.token_at(index), ".")
                    && Self::is_name_token(self.token_at(index + 1))
                {
                    index += 2;
                } else {
                    break;
                }
            }
        } else {
            return None;
        }
        while Self::is_text(self.token_at(index), "[") && Self::is_text(self.token_at(index + 1), "]")
        {
            index += 2;
        }
        Some(index)
    }

    fn skip_type_args(&self, mut index: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            let token = self.token_at(index);
            match (token.kind, token.text.as_str()) {
                (TokenKind::Eof, _) => return None,
                (TokenKind::Punct, "<") => depth += 1,
                (TokenKind::Punct, ">") => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index + 1);
                    }
                }
                (TokenKind::Punct, "." | "," | "?" | "[" | "]" | "&") => {}
                (TokenKind::Ident, _) => {}
                _ => return None,
            }
            index += 1;
        }
    }

    fn skip_annotation(&self, mut index: usize) -> Option<usize> {
        index += 1;
        if !Self::is_name_token(self.token_at(index)) {
            return None;
        }
        index += 1;
        while Self::is_text(self.token_at(index), ".") {
            index += 2;
        }
        if Self::is_text(self.token_at(index), "(") {
            index = self.skip_balanced(index)?;
        }
        Some(index)
    }

    /// Index just past the parenthesis matching the one at `index`.
    fn skip_balanced(&self, mut index: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            let token = self.token_at(index);
            if token.kind == TokenKind::Eof {
                return None;
            }
            if Self::is_text(token, "(") {
                depth += 1;
            } else if Self::is_text(token, ")") {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            index += 1;
        }
    }

    fn at_local_var_decl(&self) -> bool {
        let mut index = self.pos;
        loop {
            let token = self.token_at(index);
            if Self::is_text(token, "final") {
                index += 1;
            } else if Self::is_text(token, "@") {
                match self.skip_annotation(index) {
                    Some(next) => index = next,
                    None => return false,
                }
            } else {
                break;
            }
        }
        let Some(after_type) = self.skip_type(index) else {
            return false;
        };
        Self::is_name_token(self.token_at(after_type))
    }

    fn at_lambda_parens(&self) -> bool {
        self.skip_balanced(self.pos)
            .is_some_and(|after| Self::is_text(self.token_at(after), "->"))
    }

    fn at_cast(&self) -> bool {
        let start = self.pos + 1;
        let primitive = is_primitive(&self.token_at(start).text);
        let Some(after_type) = self.skip_type(start) else {
            return false;
        };
        if !Self::is_text(self.token_at(after_type), ")") {
            return false;
        }
        let next = self.token_at(after_type + 1);
        match next.kind {
            TokenKind::Eof => false,
            TokenKind::Ident => next.text != "instanceof",
            TokenKind::Punct if primitive => !matches!(
                next.text.as_str(),
                ")" | ";" | "," | "." | "]" | "}" | "?" | ":" | "=" | "==" | "!=" | "*" | "/"
            ),
            TokenKind::Punct => matches!(next.text.as_str(), "(" | "!" | "~"),
            _ => true,
        }
    }

    // --- statements ---

    fn block(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect("{")?;
        let mut statements = Vec::new();
        while !self.eat("}") {
            if self.at_eof() {
                return self.error("expected `}`");
            }
            statements.push(self.statement()?);
        }
        let id = self.finish(start, NodeKind::Block { statements });
        self.closers.push((self.pos - 1, id));
        Ok(id)
    }

    fn statement(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let id = self.statement_kind()?;
        Ok(self.mark(id, start))
    }

    fn statement_kind(&mut self) -> PResult<NodeId> {
        if self.at("{") {
            return self.block();
        }
        if self.eat(";") {
            return Ok(self.alloc(NodeKind::Empty));
        }
        if self.eat("if") {
            let condition = self.paren_condition()?;
            let then_branch = self.statement()?;
            let else_branch = if self.eat("else") {
                Some(self.statement()?)
            } else {
                None
            };
            return Ok(self.alloc(NodeKind::If {
                condition,
                then_branch,
                else_branch,
            }));
        }
        if self.eat("while") {
            let condition = self.paren_condition()?;
            let body = self.statement()?;
            return Ok(self.alloc(NodeKind::While { condition, body }));
        }
        if self.eat("do") {
            let body = self.statement()?;
            self.expect("while")?;
            let condition = self.paren_condition()?;
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::DoWhile { body, condition }));
        }
        if self.at("for") {
            return self.for_statement();
        }
        if self.eat("return") {
            let value = if self.at(";") {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Return { value }));
        }
        if self.eat("throw") {
            let value = self.expression()?;
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Throw { value }));
        }
        if self.at("break") || self.at("continue") {
            let keyword = self.bump().text;
            let label = if self.at_name() {
                Some(self.ident()?)
            } else {
                None
            };
            self.expect(";")?;
            return Ok(self.alloc(if keyword == "break" {
                NodeKind::Break { label }
            } else {
                NodeKind::Continue { label }
            }));
        }
        if self.at("try") {
            return self.try_statement();
        }
        if self.at("switch") {
            return self.switch();
        }
        if self.at("synchronized") && self.nth_is(1, "(") {
            self.pos += 1;
            let lock = self.paren_condition()?;
            let body = self.block()?;
            return Ok(self.alloc(NodeKind::Synchronized { lock, body }));
        }
        if self.eat("assert") {
            let condition = self.expression()?;
            let message = if self.eat(":") {
                Some(self.expression()?)
            } else {
                None
            };
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Assert { condition, message }));
        }
        if self.at_yield() {
            self.pos += 1;
            let value = self.expression()?;
            self.expect(";")?;
            return Ok(self.alloc(NodeKind::Yield { value }));
        }
        if self.at_name() && self.nth_is(1, ":") {
            let label = self.ident()?;
            self.pos += 1;
            let body = self.statement()?;
            return Ok(self.alloc(NodeKind::Labeled { label, body }));
        }
        if self.at_type_decl_start()
            || ((self.at("final") || self.at("abstract") || self.at("static"))
                && self.nth_is(1, "class"))
        {
            let modifiers = self.modifiers()?;
            return self.type_decl(modifiers);
        }
        if self.at_local_var_decl() {
            let decl = self.local_var_decl()?;
            self.expect(";")?;
            return Ok(decl);
        }
        let expr = self.expression()?;
        self.expect(";")?;
        Ok(self.alloc(NodeKind::ExprStmt { expr }))
    }

    /// `yield` starting a statement rather than naming a variable or method.
    fn at_yield(&self) -> bool {
        if !self.at("yield") {
            return false;
        }
        let next = self.nth(1);
        match next.kind {
            TokenKind::Eof => false,
            TokenKind::Punct => matches!(
                next.text.as_str(),
                "(" | "!" | "~" | "-" | "+" | "++" | "--"
            ),
            _ => true,
        }
    }

    fn switch(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect("switch")?;
        let selector = self.paren_condition()?;
        self.expect("{")?;
        let mut cases = Vec::new();
        let mut arrow = false;
        while !self.eat("}") {
            if self.at_eof() {
                return self.error("expected `}`");
            }
            let mut labels = Vec::new();
            let mut is_default = self.eat("default");
            if !is_default {
                self.expect("case")?;
                loop {
                    if self.eat("default") {
                        is_default = true;
                    } else {
                        labels.push(self.case_label()?);
                    }
                    if !self.eat(",") {
                        break;
                    }
                }
            }
            let guard = if self.eat("when") {
                Some(self.case_operand()?)
            } else {
                None
            };
            let body = if self.eat("->") {
                arrow = true;
                let body_start = self.pos;
                let body = if self.at("{") {
                    self.block()?
                } else if self.at("throw") {
                    self.statement()?
                } else {
                    let expr = self.expression()?;
                    self.expect(";")?;
                    self.finish(body_start, NodeKind::ExprStmt { expr })
                };
                vec![body]
            } else {
                self.expect(":")?;
                let mut body = Vec::new();
                while !self.at("case") && !self.at("default") && !self.at("}") {
                    if self.at_eof() {
                        return self.error("expected `}`");
                    }
                    body.push(self.statement()?);
                }
                body
            };
            cases.push(SwitchCase {
                labels,
                is_default,
                guard,
                body,
            });
        }
        Ok(self.finish(
            start,
            NodeKind::Switch {
                selector,
                cases,
                arrow,
            },
        ))
    }

    /// A constant or a type pattern after `case`.
    fn case_label(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let skip_final = usize::from(self.at("final"));
        let is_pattern = self
            .skip_type(self.pos + skip_final)
            .is_some_and(|after| Self::is_name_token(self.token_at(after)));
        if !is_pattern {
            return self.case_operand();
        }
        self.eat("final");
        let ty = self.type_()?;
        let name = self.ident()?;
        Ok(self.finish(start, NodeKind::TypePattern { ty, name }))
    }

    /// Expression in a `case` label or guard; a lone name before `->` is not a lambda.
    fn case_operand(&mut self) -> PResult<NodeId> {
        if self.at_name() && (self.nth_is(1, "->") || self.nth_is(1, ",") || self.nth_is(1, ":")) {
            let start = self.pos;
            let ident = self.ident()?;
            return Ok(self.finish(start, NodeKind::Name { ident }));
        }
        self.expr_bp(TERNARY_BP + 1)
    }

    fn paren_condition(&mut self) -> PResult<NodeId> {
        self.expect("(")?;
        let condition = self.expression()?;
        self.expect(")")?;
        Ok(condition)
    }

    /// Local variable declaration without the trailing `;`.
    fn local_var_decl(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let modifiers = self.local_modifiers()?;
        let ty = self.type_()?;
        let name = self.ident()?;
        let declarators = self.declarators(name)?;
        Ok(self.finish(
            start,
            NodeKind::LocalVar(LocalVarDecl {
                modifiers,
                ty,
                declarators,
            }),
        ))
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        self.expect("for")?;
        self.expect("(")?;

        let mut init = Vec::new();
        if self.at_local_var_decl() {
            let checkpoint = self.pos;
            let nodes_before = self.nodes.len();
            let modifiers = self.local_modifiers()?;
            let ty = self.type_()?;
            let name = self.ident()?;
            if self.eat(":") {
                let iterable = self.expression()?;
                self.expect(")")?;
                let body = self.statement()?;
                return Ok(self.alloc(NodeKind::ForEach {
                    modifiers,
                    ty,
                    name,
                    iterable,
                    body,
                }));
            }
            self.rewind(checkpoint, nodes_before);
            init.push(self.local_var_decl()?);
        } else if !self.at(";") {
            init = self.expression_list()?;
        }
        self.expect(";")?;
        let condition = if self.at(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        let update = if self.at(")") {
            Vec::new()
        } else {
            self.expression_list()?
        };
        self.expect(")")?;
        let body = self.statement()?;
        Ok(self.alloc(NodeKind::For {
            init,
            condition,
            update,
            body,
        }))
    }

    fn expression_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut exprs = vec![self.expression()?];
        while self.eat(",") {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }

    fn try_statement(&mut self) -> PResult<NodeId> {
        self.expect("try")?;
        let mut resources = Vec::new();
        if self.eat("(") {
            while !self.at(")") {
                let resource = if self.at_local_var_decl() {
                    self.local_var_decl()?
                } else {
                    self.expression()?
                };
                resources.push(resource);
                if !self.eat(";") {
                    break;
                }
            }
            self.expect(")")?;
        }
        let body = self.block()?;

        let mut catches = Vec::new();
        while self.eat("catch") {
            self.expect("(")?;
            let modifiers = self.local_modifiers()?;
            let mut types = vec![self.type_()?];
            while self.eat("|") {
                types.push(self.type_()?);
            }
            let name = self.ident()?;
            self.expect(")")?;
            let body = self.block()?;
            catches.push(CatchClause {
                modifiers,
                types,
                name,
                body,
            });
        }
        let finally = if self.eat("finally") {
            Some(self.block()?)
        } else {
            None
        };
        if resources.is_empty() && catches.is_empty() && finally.is_none() {
            return self.error("expected `catch` or `finally`");
        }
        Ok(self.alloc(NodeKind::Try {
            resources,
            body,
            catches,
            finally,
        }))
    }

    // --- expressions ---

    fn expression(&mut self) -> PResult<NodeId> {
        self.expr_bp(0)
    }

    /// Operator at the cursor and the number of tokens it spans.
    fn peek_infix_operator(&self) -> Option<(String, usize)> {
        let token = self.peek();
        if token.kind != TokenKind::Punct {
            return None;
        }
        if token.text != ">" {
            return Some((token.text.clone(), 1));
        }
        // Glue adjacent `>` tokens into shift operators.
        let mut spelled = Vec::new();
        let mut end = token.offset;
        for n in 0..4 {
            let next = self.nth(n);
            if next.offset != end || !(next.text == ">" || next.text == ">=") {
                break;
            }
            end = next.end();
            spelled.push(next.text.clone());
            if next.text == ">=" {
                break;
            }
        }
        (1..=spelled.len()).rev().find_map(|count| {
            let op = spelled[..count].concat();
            ANGLE_OPERATORS.contains(&op.as_str()).then_some((op, count))
        })
    }

    fn expr_bp(&mut self, min_bp: u8) -> PResult<NodeId> {
        let start = self.pos;
        let mut lhs = self.unary()?;
        loop {
            if self.at("?") {
                if TERNARY_BP < min_bp {
                    break;
                }
                self.pos += 1;
                let then_expr = self.expression()?;
                self.expect(":")?;
                let else_expr = self.expr_bp(TERNARY_BP - 1)?;
                lhs = self.finish(
                    start,
                    NodeKind::Conditional {
                        condition: lhs,
                        then_expr,
                        else_expr,
                    },
                );
                continue;
            }
            if self.at("instanceof") {
                if INSTANCEOF_BP < min_bp {
                    break;
                }
                self.pos += 1;
                self.eat("final");
                let ty = self.type_()?;
                let binding = if self.at_name() {
                    Some(self.ident()?)
                } else {
                    None
                };
                lhs = self.finish(
                    start,
                    NodeKind::InstanceOf {
                        expr: lhs,
                        ty,
                        binding,
                    },
                );
                continue;
            }
            let Some((op, width)) = self.peek_infix_operator() else {
                break;
            };
            let Some((l_bp, r_bp, is_assignment)) = infix_binding_power(&op) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.pos += width;
            let rhs = if is_assignment && self.at("{") {
                self.array_init()?
            } else {
                self.expr_bp(r_bp)?
            };
            let kind = if is_assignment {
                NodeKind::Assign {
                    op,
                    target: lhs,
                    value: rhs,
                }
            } else {
                NodeKind::Binary { op, lhs, rhs }
            };
            lhs = self.finish(start, kind);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let token = self.peek().clone();
        let text = token.text.clone();
        if token.kind == TokenKind::Punct {
            match text.as_str() {
                "-" if matches!(
                    self.nth(1).kind,
                    TokenKind::IntLiteral
                        | TokenKind::LongLiteral
                        | TokenKind::FloatLiteral
                        | TokenKind::DoubleLiteral
                ) =>
                {
                    // Fold negative numeric literals so they read as one constant.
                    self.pos += 1;
                    let number = self.bump();
                    let kind = literal_kind(number.kind).unwrap_or(LiteralKind::Int);
                    let literal = self.finish(
                        start,
                        NodeKind::Literal(Literal {
                            kind,
                            text: format!("-{}", number.text),
                        }),
                    );
                    return self.postfix(literal, start);
                }
                "+" | "-" | "!" | "~" | "++" | "--" => {
                    self.pos += 1;
                    let operand = self.expr_bp(PREFIX_BP)?;
                    return Ok(self.finish(
                        start,
                        NodeKind::Unary {
                            op: token.text,
                            operand,
                            postfix: false,
                        },
                    ));
                }
                "(" => {
                    if self.at_lambda_parens() {
                        return self.lambda();
                    }
                    if self.at_cast() {
                        self.pos += 1;
                        let ty = self.type_()?;
                        self.expect(")")?;
                        let expr = self.expr_bp(PREFIX_BP)?;
                        return Ok(self.finish(start, NodeKind::Cast { ty, expr }));
                    }
                    self.pos += 1;
                    let expr = self.expression()?;
                    self.expect(")")?;
                    let paren = self.finish(start, NodeKind::Paren { expr });
                    return self.postfix(paren, start);
                }
                _ => {}
            }
        }
        let primary = self.primary()?;
        self.postfix(primary, start)
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let token = self.peek().clone();
        if let Some(kind) = literal_kind(token.kind) {
            self.pos += 1;
            return Ok(self.finish(
                start,
                NodeKind::Literal(Literal {
                    kind,
                    text: token.text,
                }),
            ));
        }
        if token.kind != TokenKind::Ident {
            return self.error("expected expression");
        }
        let text = token.text.clone();
        match text.as_str() {
            "true" | "false" | "null" => {
                self.pos += 1;
                let kind = if token.text == "null" {
                    LiteralKind::Null
                } else {
                    LiteralKind::Boolean
                };
                Ok(self.finish(
                    start,
                    NodeKind::Literal(Literal {
                        kind,
                        text: token.text,
                    }),
                ))
            }
            "this" | "super" => {
                self.pos += 1;
                if self.at("(") {
                    let args = self.arguments()?;
                    return Ok(self.finish(
                        start,
                        NodeKind::MethodCall {
                            target: None,
                            name: token.text,
                            args,
                        },
                    ));
                }
                let kind = if token.text == "this" {
                    NodeKind::This { qualifier: None }
                } else {
                    NodeKind::Super { qualifier: None }
                };
                Ok(self.finish(start, kind))
            }
            "new" => self.new_expr(None, start),
            "switch" => self.switch(),
            spelled if is_primitive(spelled) => {
                let ty = self.type_()?;
                self.expect(".")?;
                self.expect("class")?;
                Ok(self.finish(start, NodeKind::ClassLit { ty }))
            }
            spelled if !is_reserved(spelled) => {
                if self.nth_is(1, "->") {
                    return self.lambda();
                }
                self.pos += 1;
                if self.at("(") {
                    let args = self.arguments()?;
                    return Ok(self.finish(
                        start,
                        NodeKind::MethodCall {
                            target: None,
                            name: token.text,
                            args,
                        },
                    ));
                }
                Ok(self.finish(start, NodeKind::Name { ident: token.text }))
            }
            _ => self.error("expected expression"),
        }
    }

    fn postfix(&mut self, mut lhs: NodeId, start: usize) -> PResult<NodeId> {
        loop {
            if self.eat(".") {
                if self.at("<") {
                    // Explicit type arguments on a call are not kept.
                    self.type_args()?;
                }
                if self.eat("class") {
                    let ty = self.dotted_text(lhs)?;
                    lhs = self.finish(start, NodeKind::ClassLit { ty });
                    continue;
                }
                if self.at("this") || self.at("super") {
                    let keyword = self.bump().text;
                    let qualifier = Some(self.dotted_text(lhs)?);
                    let kind = if keyword == "this" {
                        NodeKind::This { qualifier }
                    } else {
                        NodeKind::Super { qualifier }
                    };
                    lhs = self.finish(start, kind);
                    continue;
                }
                if self.at("new") {
                    lhs = self.new_expr(Some(lhs), start)?;
                    continue;
                }
                let name = self.ident()?;
                lhs = if self.at("(") {
                    let args = self.arguments()?;
                    self.finish(
                        start,
                        NodeKind::MethodCall {
                            target: Some(lhs),
                            name,
                            args,
                        },
                    )
                } else {
                    self.finish(start, NodeKind::FieldAccess { target: lhs, name })
                };
            } else if self.at("[") && self.nth_is(1, "]") {
                let mut ty = self.dotted_text(lhs)?;
                while self.at("[") && self.nth_is(1, "]") {
                    self.pos += 2;
                    ty.push_str("[]");
                }
                if self.eat("::") {
                    let target = self.alloc(NodeKind::Name { ident: ty });
                    let name = self.method_ref_name()?;
                    lhs = self.finish(start, NodeKind::MethodRef { target, name });
                } else {
                    self.expect(".")?;
                    self.expect("class")?;
                    lhs = self.finish(start, NodeKind::ClassLit { ty });
                }
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                lhs = self.finish(start, NodeKind::ArrayAccess { array: lhs, index });
            } else if self.eat("::") {
                let name = self.method_ref_name()?;
                lhs = self.finish(start, NodeKind::MethodRef { target: lhs, name });
            } else if self.at("++") || self.at("--") {
                let op = self.bump().text;
                lhs = self.finish(
                    start,
                    NodeKind::Unary {
                        op,
                        operand: lhs,
                        postfix: true,
                    },
                );
            } else {
                return Ok(lhs);
            }
        }
    }

    fn method_ref_name(&mut self) -> PResult<String> {
        if self.eat("new") {
            Ok("new".to_string())
        } else {
            self.ident()
        }
    }

    /// Dotted spelling of a name chain (`java.util.List`), used for class literals.
    fn dotted_text(&self, id: NodeId) -> PResult<String> {
        match &self.nodes[id.idx()].kind {
            NodeKind::Name { ident } => Ok(ident.clone()),
            NodeKind::FieldAccess { target, name } => {
                Ok(format!("{}.{name}", self.dotted_text(*target)?))
            }
            _ => self.error("expected type name"),
        }
    }

    fn arguments(&mut self) -> PResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if self.eat(")") {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    fn array_init(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.expect("{")?;
        let mut elements = Vec::new();
        loop {
            if self.eat("}") {
                break;
            }
            elements.push(self.element_value_or_expr()?);
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(self.finish(start, NodeKind::ArrayInit { elements }))
    }

    fn element_value_or_expr(&mut self) -> PResult<NodeId> {
        if self.at("@") {
            self.annotation()
        } else if self.at("{") {
            self.array_init()
        } else {
            self.expression()
        }
    }

    /// `new ...`, optionally qualified by an enclosing instance that starts at `start`.
    fn new_expr(&mut self, outer: Option<NodeId>, start: usize) -> PResult<NodeId> {
        self.expect("new")?;
        let ty = self.type_without_dims()?;
        if self.at("[") {
            let mut dims = Vec::new();
            while self.eat("[") {
                if self.eat("]") {
                    dims.push(None);
                } else {
                    dims.push(Some(self.expression()?));
                    self.expect("]")?;
                }
            }
            let init = if self.at("{") {
                Some(self.array_init()?)
            } else {
                None
            };
            return Ok(self.finish(start, NodeKind::NewArray { ty, dims, init }));
        }
        let args = self.arguments()?;
        let body = if self.eat("{") {
            Some(self.class_body_members("")?)
        } else {
            None
        };
        Ok(self.finish(
            start,
            NodeKind::New {
                outer,
                ty,
                args,
                body,
            },
        ))
    }

    fn lambda(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let (params, parenthesized) = if self.eat("(") {
            let mut params = Vec::new();
            while !self.at(")") {
                if self.at_name() && (self.nth_is(1, ",") || self.nth_is(1, ")")) {
                    params.push(LambdaParam {
                        ty: None,
                        name: self.ident()?,
                    });
                } else {
                    let _ = self.local_modifiers()?;
                    let ty = self.type_()?;
                    params.push(LambdaParam {
                        ty: Some(ty),
                        name: self.ident()?,
                    });
                }
                if !self.eat(",") {
                    break;
                }
            }
            self.expect(")")?;
            (params, true)
        } else {
            let name = self.ident()?;
            (vec![LambdaParam { ty: None, name }], false)
        };
        self.expect("->")?;
        let body = if self.at("{") {
            self.block()?
        } else {
            self.expression()?
        };
        Ok(self.finish(
            start,
            NodeKind::Lambda {
                params,
                parenthesized,
                body,
            },
        ))
    }
}

fn literal_kind(kind: TokenKind) -> Option<LiteralKind> {
    Some(match kind {
        TokenKind::IntLiteral => LiteralKind::Int,
        TokenKind::LongLiteral => LiteralKind::Long,
        TokenKind::FloatLiteral => LiteralKind::Float,
        TokenKind::DoubleLiteral => LiteralKind::Double,
        TokenKind::CharLiteral => LiteralKind::Char,
        TokenKind::StringLiteral => LiteralKind::String,
        TokenKind::TextBlock => LiteralKind::TextBlock,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_method_body(tree: &SyntaxTree) -> Vec<NodeId> {
        let class = tree.top_level_types()[0];
        let method = tree.methods_of(class)[0];
        let body = tree.method(method).and_then(|m| m.body).unwrap();
        tree.block_statements(body).to_vec()
    }

    fn parse_statements(body: &str) -> (SyntaxTree, Vec<NodeId>) {
        let tree = parse(&format!("class A {{ void m() {{ {body} }} }}")).unwrap();
        let statements = first_method_body(&tree);
        (tree, statements)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (tree, statements) = parse_statements("x = 1 + 2 * 3;");
        let NodeKind::ExprStmt { expr } = tree.kind(statements[0]) else {
            panic!("expected expression statement");
        };
        let NodeKind::Assign { value, .. } = tree.kind(*expr) else {
            panic!("expected assignment");
        };
        let NodeKind::Binary { op, rhs, .. } = tree.kind(*value) else {
            panic!("expected binary");
        };
        assert_eq!(op, "+");
        assert!(matches!(tree.kind(*rhs), NodeKind::Binary { op, .. } if op == "*"));
    }

    #[test]
    fn generic_locals_are_declarations() {
        let (tree, statements) =
            parse_statements("Map<String, List<Integer>> m = new HashMap<>(); a < b;");
        let NodeKind::LocalVar(decl) = tree.kind(statements[0]) else {
            panic!("expected local variable");
        };
        assert_eq!(decl.ty, "Map<String, List<Integer>>");
        assert!(matches!(tree.kind(statements[1]), NodeKind::ExprStmt { .. }));
    }

    #[test]
    fn shift_operators_are_glued() {
        let (tree, statements) = parse_statements("int x = a >> 2; y >>>= 1;");
        let NodeKind::LocalVar(decl) = tree.kind(statements[0]) else {
            panic!("expected local variable");
        };
        let init = decl.declarators[0].init.unwrap();
        assert!(matches!(tree.kind(init), NodeKind::Binary { op, .. } if op == ">>"));
        let NodeKind::ExprStmt { expr } = tree.kind(statements[1]) else {
            panic!("expected expression statement");
        };
        assert!(matches!(tree.kind(*expr), NodeKind::Assign { op, .. } if op == ">>>="));
    }

    #[test]
    fn casts_and_parenthesized_expressions() {
        let (tree, statements) = parse_statements("a = (String) o; b = (c) + d; e = (int) -1;");
        let value_of = |id: NodeId| match tree.kind(id) {
            NodeKind::ExprStmt { expr } => match tree.kind(*expr) {
                NodeKind::Assign { value, .. } => *value,
                _ => panic!("expected assignment"),
            },
            _ => panic!("expected expression statement"),
        };
        assert!(matches!(tree.kind(value_of(statements[0])), NodeKind::Cast { .. }));
        assert!(matches!(tree.kind(value_of(statements[1])), NodeKind::Binary { .. }));
        assert!(matches!(tree.kind(value_of(statements[2])), NodeKind::Cast { .. }));
    }

    #[test]
    fn negative_literals_fold() {
        let (tree, statements) = parse_statements("f(-5, a - 1);");
        let NodeKind::ExprStmt { expr } = tree.kind(statements[0]) else {
            panic!("expected expression statement");
        };
        let NodeKind::MethodCall { args, .. } = tree.kind(*expr) else {
            panic!("expected call");
        };
        assert!(matches!(tree.kind(args[0]), NodeKind::Literal(lit) if lit.text == "-5"));
        assert!(matches!(tree.kind(args[1]), NodeKind::Binary { .. }));
    }

    #[test]
    fn lambdas_and_method_refs() {
        let (tree, statements) =
            parse_statements("run(() -> go()); map(x -> x + 1); each(String::trim);");
        let arg = |id: NodeId| match tree.kind(id) {
            NodeKind::ExprStmt { expr } => match tree.kind(*expr) {
                NodeKind::MethodCall { args, .. } => args[0],
                _ => panic!("expected call"),
            },
            _ => panic!("expected expression statement"),
        };
        assert!(matches!(tree.kind(arg(statements[0])), NodeKind::Lambda { parenthesized: true, .. }));
        assert!(matches!(tree.kind(arg(statements[1])), NodeKind::Lambda { parenthesized: false, .. }));
        assert!(matches!(tree.kind(arg(statements[2])), NodeKind::MethodRef { .. }));
    }

    #[test]
    fn foreach_and_classic_for() {
        let (tree, statements) =
            parse_statements("for (String s : items) { use(s); } for (int i = 0; i < n; i++) {}");
        assert!(matches!(tree.kind(statements[0]), NodeKind::ForEach { name, .. } if name == "s"));
        assert!(matches!(tree.kind(statements[1]), NodeKind::For { init, .. } if init.len() == 1));
    }

    #[test]
    fn constructors_have_no_return_type() {
        let tree = parse("class Point { Point(int x) { this.x = x; } int x() { return x; } }")
            .unwrap();
        let class = tree.top_level_types()[0];
        let methods = tree.methods_of(class);
        assert!(tree.method(methods[0]).unwrap().is_constructor());
        assert!(!tree.method(methods[1]).unwrap().is_constructor());
    }

    #[test]
    fn switch_statements_and_expressions() {
        let (tree, statements) = parse_statements(
            "switch (x) { case 1: case 2: a(); break; default: b(); } \
             int y = switch (s) { case \"a\", \"b\" -> 1; case String t when t.isEmpty() -> 2; default -> { yield 3; } };",
        );
        let NodeKind::Switch { cases, arrow, .. } = tree.kind(statements[0]) else {
            panic!("expected switch statement");
        };
        assert!(!arrow);
        assert_eq!(cases.len(), 3);
        assert!(cases[0].body.is_empty());
        assert_eq!(cases[1].body.len(), 2);
        assert!(cases[2].is_default);

        let NodeKind::LocalVar(decl) = tree.kind(statements[1]) else {
            panic!("expected local variable");
        };
        let init = decl.declarators[0].init.unwrap();
        let NodeKind::Switch { cases, arrow, .. } = tree.kind(init) else {
            panic!("expected switch expression");
        };
        assert!(arrow);
        assert_eq!(cases[0].labels.len(), 2);
        assert!(matches!(tree.kind(cases[1].labels[0]), NodeKind::TypePattern { name, .. } if name == "t"));
        assert!(cases[1].guard.is_some());
        let block = cases[2].body[0];
        assert!(matches!(
            tree.kind(tree.block_statements(block)[0]),
            NodeKind::Yield { .. }
        ));
    }

    #[test]
    fn arrow_cases_on_enum_names_are_not_lambdas() {
        let (tree, statements) = parse_statements("switch (c) { case RED -> stop(); case GREEN, AMBER -> go(); }");
        let NodeKind::Switch { cases, .. } = tree.kind(statements[0]) else {
            panic!("expected switch");
        };
        assert!(matches!(tree.kind(cases[0].labels[0]), NodeKind::Name { ident } if ident == "RED"));
        assert_eq!(cases[1].labels.len(), 2);
    }

    #[test]
    fn synchronized_assert_and_labels() {
        let (tree, statements) = parse_statements(
            "synchronized (lock) { n++; } assert n > 0 : \"positive\"; outer: for (;;) { break outer; }",
        );
        assert!(matches!(tree.kind(statements[0]), NodeKind::Synchronized { .. }));
        assert!(matches!(tree.kind(statements[1]), NodeKind::Assert { message: Some(_), .. }));
        assert!(matches!(tree.kind(statements[2]), NodeKind::Labeled { label, .. } if label == "outer"));
    }

    #[test]
    fn declarations_beyond_plain_classes() {
        let tree = parse(
            "enum Op { PLUS { int apply(int a, int b) { return a + b; } }, @Deprecated MINUS; }\n\
             @interface Tag { String value() default \"x\"; int[] codes() default {}; }\n\
             class Grid { int cells[][] = new int[2][2]; void m(String args[]) { Inner i = outer.new Inner(); } }\n",
        )
        .unwrap();
        let op = tree.find_type("Op").unwrap();
        let constants = &tree.type_decl(op).unwrap().enum_constants;
        assert!(matches!(tree.kind(constants[0]), NodeKind::EnumConstant { body: Some(members), .. } if members.len() == 1));
        assert!(matches!(tree.kind(constants[1]), NodeKind::EnumConstant { annotations, .. } if annotations.len() == 1));

        let tag = tree.find_type("Tag").unwrap();
        assert_eq!(tree.type_decl(tag).unwrap().kind, TypeKind::Annotation);
        let value = tree.find_method(tag, "value").unwrap();
        assert!(tree.method(value).unwrap().default_value.is_some());

        let grid = tree.find_type("Grid").unwrap();
        assert_eq!(tree.fields_of(grid)[0].declarators[0].dims, 2);
        let m = tree.find_method(grid, "m").unwrap();
        assert_eq!(tree.method(m).unwrap().params[0].ty, "String[]");
        let body = tree.method(m).unwrap().body.unwrap();
        let NodeKind::LocalVar(local) = tree.kind(tree.block_statements(body)[0]) else {
            panic!("expected local variable");
        };
        let init = local.declarators[0].init.unwrap();
        assert!(matches!(tree.kind(init), NodeKind::New { outer: Some(_), .. }));
    }

    #[test]
    fn record_patterns_are_reported() {
        let err = parse("class A { void m() { switch (o) { case Point(int x, int y) -> f(); } } }")
            .unwrap_err();
        assert!(err.offset > 0);
    }
}
