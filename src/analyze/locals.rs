//! Lexical scopes inside function bodies.

use rustc_hash::FxHashMap;

use crate::analyze::resolve::Namespace;
use crate::unit::{ConstValue, DefKind};

/// A name bound inside a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Local {
    /// `let`, parameter, closure, `for`, `match` or `if let` binding.
    Binding,
    GenericParam,
    ConstParam,
    /// An item declared inside a block.
    Item {
        kind: DefKind,
        value: Option<ConstValue>,
    },
    /// A `use` inside a block, with the path as written.
    Import(Vec<String>),
}

impl Local {
    /// Items and imports stay visible to items nested in the same body;
    /// bindings and generic parameters do not.
    fn crosses_item_boundary(&self) -> bool {
        matches!(self, Self::Item { .. } | Self::Import(_))
    }

    pub(crate) fn kind(&self) -> DefKind {
        match self {
            Self::Binding => DefKind::Binding,
            Self::GenericParam => DefKind::GenericParam,
            Self::ConstParam => DefKind::ConstParam,
            Self::Item { kind, .. } => *kind,
            Self::Import(_) => DefKind::Import,
        }
    }
}

#[derive(Debug, Default)]
struct Frame {
    values: FxHashMap<String, Local>,
    types: FxHashMap<String, Local>,
    /// Opened by an item (function, impl, trait, const); frames below it
    /// only lend their items.
    item: bool,
}

impl Frame {
    fn table(&self, namespace: Namespace) -> &FxHashMap<String, Local> {
        match namespace {
            Namespace::Type => &self.types,
            Namespace::Value => &self.values,
        }
    }
}

/// Stack of lexical frames, innermost last.
#[derive(Debug, Default)]
pub(crate) struct Locals {
    frames: Vec<Frame>,
}

impl Locals {
    pub(crate) fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    pub(crate) fn push_item(&mut self) {
        self.frames.push(Frame {
            item: true,
            ..Frame::default()
        });
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// Whether we are at module level.
    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn bind(&mut self, namespace: Namespace, name: impl Into<String>, local: Local) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let table = match namespace {
            Namespace::Type => &mut frame.types,
            Namespace::Value => &mut frame.values,
        };
        table.insert(name.into(), local);
    }

    pub(crate) fn lookup(&self, name: &str, namespace: Namespace) -> Option<&Local> {
        let mut crossed = false;
        for frame in self.frames.iter().rev() {
            if let Some(local) = frame.table(namespace).get(name) {
                if !crossed || local.crosses_item_boundary() {
                    return Some(local);
                }
            }
            crossed |= frame.item;
        }
        None
    }
}
