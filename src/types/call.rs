use std::fmt;
use std::mem;

use proc_macro2::{Delimiter, Spacing, Span, TokenStream, TokenTree};
use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{Expr, ExprCall, Type};

use crate::unit::{ConstValue, DefKind, ScopeKind};

/// A 1-based line and column in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Where `span` starts.
    pub fn of(span: Span) -> Self {
        let start = span.start();
        Self {
            line: start.line,
            column: start.column + 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Why a type argument can or cannot be named from the module top scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// `bool`, `u32`, `str` and the other primitives.
    Primitive,
    /// A prelude type, or a path into `std`, `core` or `alloc`.
    Prelude,
    /// Declared at the top of the file's module.
    Module,
    /// Imported into the file's module with `use`.
    Imported,
    /// A path rooted at an external crate or another module of this crate.
    External,
    /// A tuple, array or slice whose element types are reachable.
    Composite,
    /// Declared inside a function body or block.
    Local,
    /// A generic parameter of the enclosing function or impl.
    GenericParam,
    /// `Self`.
    SelfType,
    /// Declared inside an inline module of the file.
    Submodule,
    /// A name nothing in scope declares.
    Unresolved,
    /// A type form that cannot be named statically, such as `impl Trait` or
    /// `_`.
    Unsupported,
}

impl TypeOrigin {
    pub fn is_reachable(self) -> bool {
        matches!(
            self,
            Self::Primitive
                | Self::Prelude
                | Self::Module
                | Self::Imported
                | Self::External
                | Self::Composite
        )
    }

    /// Explanation for an unreachable origin.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Local => "declared in a local scope",
            Self::GenericParam => "generic parameters are not visible at the module top scope",
            Self::SelfType => "`Self` is only meaningful inside an impl",
            Self::Submodule => "declared in a nested module",
            Self::Unresolved => "not declared or imported in this module",
            Self::Unsupported => "not a nameable type",
            _ => "reachable",
        }
    }
}

/// What a name in a call argument resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub kind: DefKind,
    pub scope: ScopeKind,
    /// Absolute path, for module and universe definitions.
    pub path: Option<Vec<String>>,
    /// Folded value, for constants.
    pub value: Option<ConstValue>,
}

/// The explicit type argument of a call.
#[derive(Debug, Clone)]
pub struct TypeArgument<'ast> {
    pub ty: &'ast Type,
    pub origin: TypeOrigin,
}

impl TypeArgument<'_> {
    pub fn is_reachable(&self) -> bool {
        self.origin.is_reachable()
    }
}

impl fmt::Display for TypeArgument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tokens_text(self.ty))
    }
}

/// One value argument of a call.
#[derive(Debug, Clone)]
pub struct CallArgument<'ast> {
    pub expr: &'ast Expr,
    /// The compile-time constant the argument evaluates to, if any.
    pub value: Option<ConstValue>,
    /// What the argument's root name resolved to, when it has one.
    pub definition: Option<Definition>,
    pub reachable: bool,
}

impl CallArgument<'_> {
    pub fn location(&self) -> Location {
        Location::of(self.expr.span())
    }
}

impl fmt::Display for CallArgument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tokens_text(self.expr))
    }
}

/// A call of the marker function found in a source file.
#[derive(Debug, Clone)]
pub struct CallInfo<'ast> {
    pub call: &'ast ExprCall,
    pub type_arguments: Vec<TypeArgument<'ast>>,
    pub arguments: Vec<CallArgument<'ast>>,
    /// The marker is called and its result is called in turn, as in
    /// `cmp_by_fields::<T>(&["a"])(&x, &y)`. The inner call is reported on
    /// its own.
    pub via_call: bool,
}

impl CallInfo<'_> {
    pub fn location(&self) -> Location {
        Location::of(self.call.span())
    }
}

/// Source text of a syntax node, with `quote`'s token spacing tidied up.
/// Literals are kept as written.
pub(crate) fn tokens_text(node: &impl ToTokens) -> String {
    let mut pieces = Vec::new();
    flatten(node.to_token_stream(), &mut pieces);

    let mut text = String::new();
    let mut prev: Option<&Piece> = None;
    for piece in &pieces {
        if prev.is_some_and(|prev| spaced(prev, piece)) {
            text.push(' ');
        }
        text.push_str(piece.text());
        prev = Some(piece);
    }
    text
}

/// A token as it is printed. Joint punctuation is merged into one operator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Word(String),
    Op(String),
    Open(Delimiter),
    Close(Delimiter),
}

impl Piece {
    fn text(&self) -> &str {
        match self {
            Self::Word(text) | Self::Op(text) => text,
            Self::Open(Delimiter::Parenthesis) => "(",
            Self::Open(Delimiter::Bracket) => "[",
            Self::Open(Delimiter::Brace) => "{",
            Self::Close(Delimiter::Parenthesis) => ")",
            Self::Close(Delimiter::Bracket) => "]",
            Self::Close(Delimiter::Brace) => "}",
            Self::Open(Delimiter::None) | Self::Close(Delimiter::None) => "",
        }
    }
}

fn flatten(tokens: TokenStream, pieces: &mut Vec<Piece>) {
    let mut op = String::new();
    for token in tokens {
        if let TokenTree::Punct(punct) = &token {
            op.push(punct.as_char());
            if punct.spacing() == Spacing::Alone {
                pieces.push(Piece::Op(mem::take(&mut op)));
            }
            continue;
        }
        if !op.is_empty() {
            pieces.push(Piece::Op(mem::take(&mut op)));
        }
        match token {
            TokenTree::Group(group) => {
                let delimiter = group.delimiter();
                if delimiter == Delimiter::None {
                    flatten(group.stream(), pieces);
                } else {
                    pieces.push(Piece::Open(delimiter));
                    flatten(group.stream(), pieces);
                    pieces.push(Piece::Close(delimiter));
                }
            }
            TokenTree::Ident(ident) => pieces.push(Piece::Word(ident.to_string())),
            TokenTree::Literal(literal) => pieces.push(Piece::Word(literal.to_string())),
            TokenTree::Punct(_) => {}
        }
    }
    if !op.is_empty() {
        pieces.push(Piece::Op(op));
    }
}

fn is_prefix(op: &str) -> bool {
    matches!(op, "::" | "." | "<" | "&" | "*" | "!" | "'" | "#")
}

fn is_suffix(op: &str) -> bool {
    matches!(op, "::" | "." | "," | ";" | "<" | ">" | "?")
}

/// Whether `prev` and `next` are written with a space between them.
fn spaced(prev: &Piece, next: &Piece) -> bool {
    use Delimiter::{Brace, Bracket, Parenthesis};

    match (prev, next) {
        (Piece::Open(_), Piece::Close(_)) => false,
        (Piece::Open(Brace), _) | (_, Piece::Close(Brace)) => true,
        (Piece::Open(_), _) | (_, Piece::Close(_)) => false,
        (Piece::Op(op), _) if is_prefix(op) => false,
        (_, Piece::Op(op)) if is_suffix(op) => false,
        (Piece::Word(word), Piece::Open(Parenthesis | Bracket)) => {
            matches!(word.as_str(), "mut" | "as" | "dyn" | "impl" | "in" | "return")
        }
        (Piece::Op(op), Piece::Open(Parenthesis | Bracket)) => op != ">",
        (Piece::Close(_), Piece::Open(Parenthesis | Bracket)) => false,
        _ => true,
    }
}
