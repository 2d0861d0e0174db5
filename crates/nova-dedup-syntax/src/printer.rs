use crate::tree::{
    Annotation, AnnotationArgs, Declarator, LambdaParam, Modifiers, NodeId, NodeKind, Param,
    SwitchCase, SyntaxTree, TypeDecl, TypeKind,
};

const INDENT: &str = "    ";

/// Renders a whole compilation unit.
///
/// Nodes that are unchanged since parsing are copied from their source text,
/// re-indented to where they now sit, and comments are printed around the
/// statements and declarations they were attached to. Everything else gets
/// the canonical layout.
pub fn render(tree: &SyntaxTree) -> String {
    let root = tree.root();
    if let Some(span) = tree.span(root) {
        return span.source.to_string();
    }
    let mut printer = Printer::new(tree, true);
    printer.compilation_unit(root);
    printer.out
}

/// Renders a single node without surrounding indentation.
///
/// Always uses the canonical layout and drops comments, so equal code renders
/// equally. Declarations end with a newline; statements and expressions do
/// not.
pub fn render_node(tree: &SyntaxTree, id: NodeId) -> String {
    let mut printer = Printer::new(tree, false);
    match tree.kind(id) {
        NodeKind::CompilationUnit { .. } => printer.compilation_unit(id),
        NodeKind::TypeDecl(_)
        | NodeKind::Field(_)
        | NodeKind::Method(_)
        | NodeKind::Initializer { .. } => printer.member(id),
        NodeKind::Import(_) => printer.import(id),
        NodeKind::Annotation(annotation) => printer.annotation(annotation),
        NodeKind::EnumConstant { .. } => printer.enum_constant(id),
        kind if kind.is_statement() => printer.statement_inline(id),
        _ => printer.expr(id),
    }
    printer.out
}

struct Printer<'a> {
    tree: &'a SyntaxTree,
    out: String,
    indent: usize,
    /// Reuse source text and comments where the tree still has them.
    lossless: bool,
}

impl<'a> Printer<'a> {
    fn new(tree: &'a SyntaxTree, lossless: bool) -> Self {
        Self {
            tree,
            out: String::new(),
            indent: 0,
            lossless,
        }
    }

    fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Copies a pristine node from its source, re-indented to the current level.
    fn verbatim(&mut self, id: NodeId) -> bool {
        if !self.lossless {
            return false;
        }
        let Some(span) = self.tree().span(id) else {
            return false;
        };
        for (i, line) in span.text().split('\n').enumerate() {
            if i == 0 {
                self.write(line);
                continue;
            }
            self.newline();
            let blanks = line
                .bytes()
                .take(span.indent)
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            let rest = &line[blanks..];
            if !rest.is_empty() {
                self.write_indent();
            }
            self.write(rest);
        }
        true
    }

    /// A whole pristine line node: indentation, source text, trailing comment.
    fn verbatim_line(&mut self, id: NodeId) -> bool {
        if !self.lossless || !self.tree().is_pristine(id) {
            return false;
        }
        self.write_indent();
        self.verbatim(id);
        self.trailing(id);
        self.newline();
        true
    }

    fn comment_lines(&mut self, comment: &str) {
        for line in comment.split('\n') {
            if !line.is_empty() {
                self.write_indent();
            }
            self.write(line);
            self.newline();
        }
    }

    fn leading(&mut self, id: NodeId) {
        if !self.lossless {
            return;
        }
        if let Some(trivia) = self.tree().trivia(id) {
            for comment in &trivia.leading {
                self.comment_lines(comment);
            }
        }
    }

    fn trailing(&mut self, id: NodeId) {
        if !self.lossless {
            return;
        }
        if let Some(comment) = self.tree().trivia(id).and_then(|t| t.trailing.as_ref()) {
            self.write(" ");
            self.write(comment);
        }
    }

    /// Comments before the closing brace, one level deeper than the brace.
    fn dangling(&mut self, id: NodeId) {
        if !self.lossless {
            return;
        }
        if let Some(trivia) = self.tree().trivia(id) {
            self.indent += 1;
            for comment in &trivia.dangling {
                self.comment_lines(comment);
            }
            self.indent -= 1;
        }
    }

    fn blank_line_before(&self, id: NodeId, default: bool) -> bool {
        if !self.lossless {
            return default;
        }
        self.tree()
            .trivia(id)
            .and_then(|trivia| trivia.blank_line_before)
            .unwrap_or(default)
    }

    fn comma_separated(&mut self, ids: &[NodeId]) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(*id);
        }
    }

    // --- declarations ---

    fn compilation_unit(&mut self, id: NodeId) {
        let NodeKind::CompilationUnit {
            package,
            imports,
            types,
        } = self.tree().kind(id)
        else {
            return;
        };
        let header = self.lossless && !self.tree().leading_comments(id).is_empty();
        self.leading(id);
        if header && self.blank_line_before(id, package.is_some() || !imports.is_empty()) {
            self.newline();
        }
        if let Some(package) = package {
            self.write(&format!("package {package};\n"));
            if !imports.is_empty() || !types.is_empty() {
                self.newline();
            }
        }
        for (i, import) in imports.iter().enumerate() {
            if i > 0 && self.blank_line_before(*import, false) {
                self.newline();
            }
            self.leading(*import);
            self.import(*import);
            self.trailing(*import);
            self.newline();
        }
        if !imports.is_empty() && !types.is_empty() {
            self.newline();
        }
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.member(*ty);
        }
        if self.lossless {
            if let Some(trivia) = self.tree().trivia(id) {
                for comment in &trivia.dangling {
                    self.comment_lines(comment);
                }
            }
        }
    }

    fn import(&mut self, id: NodeId) {
        if self.verbatim(id) {
            return;
        }
        if let NodeKind::Import(import) = self.tree().kind(id) {
            let keyword = if import.is_static {
                "import static"
            } else {
                "import"
            };
            self.write(&format!("{keyword} {};", import.qualified_name()));
        }
    }

    fn annotation(&mut self, annotation: &Annotation) {
        self.write("@");
        self.write(&annotation.name);
        match &annotation.args {
            AnnotationArgs::None => {}
            AnnotationArgs::Value(value) => {
                self.write("(");
                self.expr(*value);
                self.write(")");
            }
            AnnotationArgs::Named(pairs) => {
                self.write("(");
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(key);
                    self.write(" = ");
                    self.expr(*value);
                }
                self.write(")");
            }
        }
    }

    /// Annotations on their own lines, then keywords on the declaration line.
    fn declaration_modifiers(&mut self, modifiers: &Modifiers) {
        for id in &modifiers.annotations {
            if let Some(annotation) = self.tree().annotation(*id) {
                self.write_indent();
                self.annotation(annotation);
                self.newline();
            }
        }
        self.write_indent();
        self.keywords(modifiers);
    }

    /// Annotations and keywords inline, as on parameters and locals.
    fn inline_modifiers(&mut self, modifiers: &Modifiers) {
        for id in &modifiers.annotations {
            if let Some(annotation) = self.tree().annotation(*id) {
                self.annotation(annotation);
                self.write(" ");
            }
        }
        self.keywords(modifiers);
    }

    fn keywords(&mut self, modifiers: &Modifiers) {
        for keyword in &modifiers.keywords {
            self.write(keyword.keyword());
            self.write(" ");
        }
    }

    fn member(&mut self, id: NodeId) {
        self.leading(id);
        if self.verbatim_line(id) {
            return;
        }
        match self.tree().kind(id) {
            NodeKind::TypeDecl(decl) => self.type_decl(id, decl),
            NodeKind::Field(field) => {
                self.declaration_modifiers(&field.modifiers);
                self.write(&field.ty);
                self.write(" ");
                self.declarators(&field.declarators);
                self.write(";");
                self.trailing(id);
                self.newline();
            }
            NodeKind::Method(method) => {
                self.declaration_modifiers(&method.modifiers);
                if let Some(type_params) = &method.type_params {
                    self.write(type_params);
                    self.write(" ");
                }
                if let Some(return_ty) = &method.return_ty {
                    self.write(return_ty);
                    self.write(" ");
                }
                self.write(&method.name);
                self.params(&method.params);
                if !method.throws.is_empty() {
                    self.write(" throws ");
                    self.write(&method.throws.join(", "));
                }
                match (method.body, method.default_value) {
                    (Some(body), _) => {
                        self.write(" ");
                        self.block(body);
                    }
                    (None, Some(value)) => {
                        self.write(" default ");
                        self.expr(value);
                        self.write(";");
                    }
                    (None, None) => self.write(";"),
                }
                self.trailing(id);
                self.newline();
            }
            NodeKind::Initializer { is_static, body } => {
                self.write_indent();
                if *is_static {
                    self.write("static ");
                }
                self.block(*body);
                self.trailing(id);
                self.newline();
            }
            _ => {}
        }
    }

    fn members(&mut self, members: &[NodeId]) {
        let mut previous_was_field = false;
        for (i, member) in members.iter().enumerate() {
            let is_field = matches!(self.tree().kind(*member), NodeKind::Field(_));
            if i > 0 && self.blank_line_before(*member, !(is_field && previous_was_field)) {
                self.newline();
            }
            self.member(*member);
            previous_was_field = is_field;
        }
    }

    fn type_decl(&mut self, id: NodeId, decl: &TypeDecl) {
        self.declaration_modifiers(&decl.modifiers);
        self.write(decl.kind.keyword());
        self.write(" ");
        self.write(&decl.name);
        if let Some(type_params) = &decl.type_params {
            self.write(type_params);
        }
        if decl.kind == TypeKind::Record {
            self.params(&decl.record_components);
        }
        if let Some(extends) = &decl.extends {
            self.write(" extends ");
            self.write(extends);
        }
        if !decl.interfaces.is_empty() {
            let keyword = if decl.kind == TypeKind::Interface {
                " extends "
            } else {
                " implements "
            };
            self.write(keyword);
            self.write(&decl.interfaces.join(", "));
        }
        if !decl.permits.is_empty() {
            self.write(" permits ");
            self.write(&decl.permits.join(", "));
        }
        self.write(" {");
        self.newline();

        self.indent += 1;
        if !decl.enum_constants.is_empty() {
            for (i, constant) in decl.enum_constants.iter().enumerate() {
                if i > 0 {
                    self.write(",");
                    self.newline();
                }
                self.leading(*constant);
                self.write_indent();
                self.enum_constant(*constant);
            }
            if decl.members.is_empty() {
                self.newline();
            } else {
                self.write(";");
                self.newline();
                self.newline();
            }
        }
        self.members(&decl.members);
        self.indent -= 1;
        self.dangling(id);

        self.write_indent();
        self.write("}");
        self.trailing(id);
        self.newline();
    }

    fn enum_constant(&mut self, id: NodeId) {
        if self.verbatim(id) {
            return;
        }
        let NodeKind::EnumConstant {
            annotations,
            name,
            args,
            body,
        } = self.tree().kind(id)
        else {
            return;
        };
        for annotation in annotations {
            if let Some(annotation) = self.tree().annotation(*annotation) {
                self.annotation(annotation);
                self.write(" ");
            }
        }
        self.write(name);
        if !args.is_empty() {
            self.write("(");
            self.comma_separated(args);
            self.write(")");
        }
        if let Some(members) = body {
            self.write(" {");
            self.newline();
            self.indent += 1;
            self.members(members);
            self.indent -= 1;
            self.write_indent();
            self.write("}");
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.inline_modifiers(&param.modifiers);
            self.write(&param.ty);
            if param.varargs {
                self.write("...");
            }
            self.write(" ");
            self.write(&param.name);
        }
        self.write(")");
    }

    fn declarators(&mut self, declarators: &[Declarator]) {
        for (i, declarator) in declarators.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&declarator.name);
            for _ in 0..declarator.dims {
                self.write("[]");
            }
            if let Some(init) = declarator.init {
                self.write(" = ");
                self.expr(init);
            }
        }
    }

    // --- statements ---

    /// Writes `{ ... }`, with the closing brace at the current indentation.
    fn block(&mut self, id: NodeId) {
        if self.verbatim(id) {
            return;
        }
        let statements = self.tree().block_statements(id);
        self.write("{");
        self.newline();
        self.indent += 1;
        for (i, statement) in statements.iter().enumerate() {
            if i > 0 && self.blank_line_before(*statement, false) {
                self.newline();
            }
            self.statement(*statement);
        }
        self.indent -= 1;
        self.dangling(id);
        self.write_indent();
        self.write("}");
    }

    fn statement(&mut self, id: NodeId) {
        self.leading(id);
        if let NodeKind::TypeDecl(decl) = self.tree().kind(id) {
            if !self.verbatim_line(id) {
                self.type_decl(id, decl);
            }
            return;
        }
        self.write_indent();
        self.statement_inline(id);
        self.trailing(id);
        self.newline();
    }

    fn switch(&mut self, selector: NodeId, cases: &[SwitchCase], arrow: bool) {
        self.write("switch (");
        self.expr(selector);
        self.write(") {");
        self.newline();
        self.indent += 1;
        for case in cases {
            self.write_indent();
            if !case.labels.is_empty() {
                self.write("case ");
                self.comma_separated(&case.labels);
                if case.is_default {
                    self.write(", default");
                }
            } else if case.is_default {
                self.write("default");
            }
            if let Some(guard) = case.guard {
                self.write(" when ");
                self.expr(guard);
            }
            if arrow {
                self.write(" -> ");
                if let Some(body) = case.body.first() {
                    self.statement_inline(*body);
                }
                self.newline();
            } else {
                self.write(":");
                self.newline();
                self.indent += 1;
                for statement in &case.body {
                    self.statement(*statement);
                }
                self.indent -= 1;
            }
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    /// Body of a loop or branch: a block on the same line, anything else on
    /// its own indented line.
    fn branch(&mut self, body: NodeId) {
        if matches!(self.tree().kind(body), NodeKind::Block { .. }) {
            self.write(" ");
            self.block(body);
        } else {
            self.newline();
            self.indent += 1;
            self.write_indent();
            self.statement_inline(body);
            self.indent -= 1;
        }
    }

    fn is_block(&self, id: NodeId) -> bool {
        matches!(self.tree().kind(id), NodeKind::Block { .. })
    }

    fn local_var(&mut self, id: NodeId) {
        if let NodeKind::LocalVar(decl) = self.tree().kind(id) {
            self.inline_modifiers(&decl.modifiers);
            self.write(&decl.ty);
            self.write(" ");
            self.declarators(&decl.declarators);
        } else {
            self.expr(id);
        }
    }

    fn statement_inline(&mut self, id: NodeId) {
        if self.verbatim(id) {
            return;
        }
        match self.tree().kind(id) {
            NodeKind::Block { .. } => self.block(id),
            NodeKind::LocalVar(_) => {
                self.local_var(id);
                self.write(";");
            }
            NodeKind::ExprStmt { expr } => {
                self.expr(*expr);
                self.write(";");
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.write("if (");
                self.expr(*condition);
                self.write(")");
                self.branch(*then_branch);
                if let Some(else_branch) = else_branch {
                    if self.is_block(*then_branch) {
                        self.write(" ");
                    } else {
                        self.newline();
                        self.write_indent();
                    }
                    self.write("else");
                    if matches!(self.tree().kind(*else_branch), NodeKind::If { .. }) {
                        self.write(" ");
                        self.statement_inline(*else_branch);
                    } else {
                        self.branch(*else_branch);
                    }
                }
            }
            NodeKind::While { condition, body } => {
                self.write("while (");
                self.expr(*condition);
                self.write(")");
                self.branch(*body);
            }
            NodeKind::DoWhile { body, condition } => {
                self.write("do");
                self.branch(*body);
                if self.is_block(*body) {
                    self.write(" ");
                } else {
                    self.newline();
                    self.write_indent();
                }
                self.write("while (");
                self.expr(*condition);
                self.write(");");
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.write("for (");
                for (i, item) in init.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.local_var(*item);
                }
                self.write(";");
                if let Some(condition) = condition {
                    self.write(" ");
                    self.expr(*condition);
                }
                self.write(";");
                if !update.is_empty() {
                    self.write(" ");
                    self.comma_separated(update);
                }
                self.write(")");
                self.branch(*body);
            }
            NodeKind::ForEach {
                modifiers,
                ty,
                name,
                iterable,
                body,
            } => {
                self.write("for (");
                self.inline_modifiers(modifiers);
                self.write(&format!("{ty} {name} : "));
                self.expr(*iterable);
                self.write(")");
                self.branch(*body);
            }
            NodeKind::Return { value } => {
                self.write("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(*value);
                }
                self.write(";");
            }
            NodeKind::Throw { value } => {
                self.write("throw ");
                self.expr(*value);
                self.write(";");
            }
            NodeKind::Break { label } | NodeKind::Continue { label } => {
                let keyword = if matches!(self.tree().kind(id), NodeKind::Break { .. }) {
                    "break"
                } else {
                    "continue"
                };
                self.write(keyword);
                if let Some(label) = label {
                    self.write(" ");
                    self.write(label);
                }
                self.write(";");
            }
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                self.write("try ");
                if !resources.is_empty() {
                    self.write("(");
                    for (i, resource) in resources.iter().enumerate() {
                        if i > 0 {
                            self.write("; ");
                        }
                        self.local_var(*resource);
                    }
                    self.write(") ");
                }
                self.block(*body);
                for clause in catches {
                    self.write(" catch (");
                    self.inline_modifiers(&clause.modifiers);
                    self.write(&clause.types.join(" | "));
                    self.write(" ");
                    self.write(&clause.name);
                    self.write(") ");
                    self.block(clause.body);
                }
                if let Some(finally) = finally {
                    self.write(" finally ");
                    self.block(*finally);
                }
            }
            NodeKind::Switch {
                selector,
                cases,
                arrow,
            } => self.switch(*selector, cases, *arrow),
            NodeKind::Yield { value } => {
                self.write("yield ");
                self.expr(*value);
                self.write(";");
            }
            NodeKind::Synchronized { lock, body } => {
                self.write("synchronized (");
                self.expr(*lock);
                self.write(") ");
                self.block(*body);
            }
            NodeKind::Assert { condition, message } => {
                self.write("assert ");
                self.expr(*condition);
                if let Some(message) = message {
                    self.write(" : ");
                    self.expr(*message);
                }
                self.write(";");
            }
            NodeKind::Labeled { label, body } => {
                self.write(label);
                self.write(": ");
                self.statement_inline(*body);
            }
            NodeKind::Empty => self.write(";"),
            NodeKind::TypeDecl(decl) => self.type_decl(id, decl),
            _ => self.expr(id),
        }
    }

    // --- expressions ---

    fn expr(&mut self, id: NodeId) {
        if self.verbatim(id) {
            return;
        }
        match self.tree().kind(id) {
            NodeKind::Literal(literal) => self.write(&literal.text),
            NodeKind::Name { ident } => self.write(ident),
            NodeKind::FieldAccess { target, name } => {
                self.expr(*target);
                self.write(".");
                self.write(name);
            }
            NodeKind::MethodCall { target, name, args } => {
                if let Some(target) = target {
                    self.expr(*target);
                    self.write(".");
                }
                self.write(name);
                self.write("(");
                self.comma_separated(args);
                self.write(")");
            }
            NodeKind::New {
                outer,
                ty,
                args,
                body,
            } => {
                if let Some(outer) = outer {
                    self.expr(*outer);
                    self.write(".");
                }
                self.write("new ");
                self.write(ty);
                self.write("(");
                self.comma_separated(args);
                self.write(")");
                if let Some(members) = body {
                    self.write(" {");
                    self.newline();
                    self.indent += 1;
                    self.members(members);
                    self.indent -= 1;
                    self.write_indent();
                    self.write("}");
                }
            }
            NodeKind::NewArray { ty, dims, init } => {
                self.write("new ");
                self.write(ty);
                for dim in dims {
                    self.write("[");
                    if let Some(dim) = dim {
                        self.expr(*dim);
                    }
                    self.write("]");
                }
                if let Some(init) = init {
                    self.write(" ");
                    self.expr(*init);
                }
            }
            NodeKind::ArrayInit { elements } => {
                self.write("{");
                self.comma_separated(elements);
                self.write("}");
            }
            NodeKind::ArrayAccess { array, index } => {
                self.expr(*array);
                self.write("[");
                self.expr(*index);
                self.write("]");
            }
            NodeKind::Assign { op, target, value } => {
                self.expr(*target);
                self.write(&format!(" {op} "));
                self.expr(*value);
            }
            NodeKind::Binary { op, lhs, rhs } => {
                self.expr(*lhs);
                self.write(&format!(" {op} "));
                self.expr(*rhs);
            }
            NodeKind::Unary {
                op,
                operand,
                postfix,
            } => {
                if *postfix {
                    self.expr(*operand);
                    self.write(op);
                } else {
                    self.write(op);
                    self.expr(*operand);
                }
            }
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(*condition);
                self.write(" ? ");
                self.expr(*then_expr);
                self.write(" : ");
                self.expr(*else_expr);
            }
            NodeKind::Cast { ty, expr } => {
                self.write(&format!("({ty}) "));
                self.expr(*expr);
            }
            NodeKind::InstanceOf { expr, ty, binding } => {
                self.expr(*expr);
                self.write(" instanceof ");
                self.write(ty);
                if let Some(binding) = binding {
                    self.write(" ");
                    self.write(binding);
                }
            }
            NodeKind::Lambda {
                params,
                parenthesized,
                body,
            } => {
                self.lambda_params(params, *parenthesized);
                self.write(" -> ");
                if self.is_block(*body) {
                    self.block(*body);
                } else {
                    self.expr(*body);
                }
            }
            NodeKind::MethodRef { target, name } => {
                self.expr(*target);
                self.write("::");
                self.write(name);
            }
            NodeKind::This { qualifier } | NodeKind::Super { qualifier } => {
                if let Some(qualifier) = qualifier {
                    self.write(qualifier);
                    self.write(".");
                }
                let keyword = if matches!(self.tree().kind(id), NodeKind::This { .. }) {
                    "this"
                } else {
                    "super"
                };
                self.write(keyword);
            }
            NodeKind::Paren { expr } => {
                self.write("(");
                self.expr(*expr);
                self.write(")");
            }
            NodeKind::ClassLit { ty } => {
                self.write(ty);
                self.write(".class");
            }
            NodeKind::TypePattern { ty, name } => {
                self.write(ty);
                self.write(" ");
                self.write(name);
            }
            NodeKind::Annotation(annotation) => self.annotation(annotation),
            _ => self.statement_inline(id),
        }
    }

    fn lambda_params(&mut self, params: &[LambdaParam], parenthesized: bool) {
        if !parenthesized && params.len() == 1 && params[0].ty.is_none() {
            self.write(&params[0].name);
            return;
        }
        self.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            if let Some(ty) = &param.ty {
                self.write(ty);
                self.write(" ");
            }
            self.write(&param.name);
        }
        self.write(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn else_if_chains_stay_flat() {
        let source = "class A {\n    int sign(int x) {\n        if (x > 0) {\n            return 1;\n        } else if (x < 0) {\n            return -1;\n        } else {\n            return 0;\n        }\n    }\n}\n";
        let tree = parse(source).unwrap();
        assert_eq!(render(&tree), source);
    }

    #[test]
    fn render_node_prints_expressions_without_indentation() {
        let tree = parse("class A { void m() { a.b(c, \"d\"); } }").unwrap();
        let class = tree.top_level_types()[0];
        let method = tree.methods_of(class)[0];
        let body = tree.method(method).and_then(|m| m.body).unwrap();
        let statement = tree.block_statements(body)[0];
        assert_eq!(render_node(&tree, statement), "a.b(c, \"d\");");
    }

    #[test]
    fn untouched_code_keeps_its_layout() {
        let source = "// header\npackage p;\n\nclass A {\n    int x   =  1; // odd spacing\n}\n";
        let tree = parse(source).unwrap();
        assert_eq!(render(&tree), source);
    }

    #[test]
    fn edited_code_keeps_comments_and_untouched_siblings() {
        let source = "class A {\n    /** Docs. */\n    int keep( ) {\n        return 1;\n    }\n\n    void edit() {\n        // first\n        a();\n\n        b(); // second\n        // closing\n    }\n}\n";
        let mut tree = parse(source).unwrap();
        let class = tree.top_level_types()[0];
        let edit = tree.find_method(class, "edit").unwrap();
        let body = tree.method(edit).and_then(|m| m.body).unwrap();
        let call = tree.block_statements(body)[0];
        let NodeKind::ExprStmt { expr } = tree.kind(call).clone() else {
            panic!("expected expression statement");
        };
        if let NodeKind::MethodCall { name, .. } = tree.kind_mut(expr) {
            *name = "c".to_string();
        }
        assert!(!tree.is_pristine(body));
        assert!(tree.is_pristine(tree.find_method(class, "keep").unwrap()));
        assert_eq!(
            render(&tree),
            "class A {\n    /** Docs. */\n    int keep( ) {\n        return 1;\n    }\n\n    void edit() {\n        // first\n        c();\n\n        b(); // second\n        // closing\n    }\n}\n"
        );
        assert!(!render_node(&tree, edit).contains("//"));
    }

    #[test]
    fn moved_code_is_reindented() {
        let source = "class A {\n    void m() {\n        if (x) {\n            y();\n        }\n    }\n}\n";
        let mut tree = parse(source).unwrap();
        let class = tree.top_level_types()[0];
        let m = tree.find_method(class, "m").unwrap();
        let body = tree.method(m).and_then(|m| m.body).unwrap();
        let branch = tree.block_statements(body)[0];
        let copy = tree.clone_subtree(branch);
        let wrapper = tree.alloc(NodeKind::Block {
            statements: vec![copy],
        });
        tree.set_block_statements(body, vec![wrapper]);
        assert_eq!(
            render(&tree),
            "class A {\n    void m() {\n        {\n            if (x) {\n                y();\n            }\n        }\n    }\n}\n"
        );
    }

    #[test]
    fn new_statement_forms_render_canonically() {
        let tree = parse(
            "class A { int m(int x) { synchronized (this) { assert x > 0 : \"x\"; } loop: while (true) { break loop; } return switch (x) { case 1, 2 -> 3; default -> { yield 4; } }; } }",
        )
        .unwrap();
        let class = tree.top_level_types()[0];
        let m = tree.find_method(class, "m").unwrap();
        assert_eq!(
            render_node(&tree, m),
            "int m(int x) {\n    synchronized (this) {\n        assert x > 0 : \"x\";\n    }\n    loop: while (true) {\n        break loop;\n    }\n    return switch (x) {\n        case 1, 2 -> 3;\n        default -> {\n            yield 4;\n        }\n    };\n}\n"
        );
    }
}
