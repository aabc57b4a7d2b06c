//! Tree-building state for parameter bodies
//!
//! The builder owns everything the grammar accumulates while inside a `param`: the
//! pending-tag register and a stack of params under construction. "Which param does this
//! value belong to" is always answered by the top of the stack.
//!
//! Tag routing: `< Tag >` fills the register, the next literal or string list empties it
//! and lands in the top param's `attributes`. A literal seen with an empty register is
//! appended to `values`. A nested param opened while a tag is pending takes the tag
//! itself (`<Default> <ParamLong."">{ }`), so tags never leak into a child's body.

use tracing::trace;

use crate::xprot::ast::{Param, Tag, Value};

/// Builder invariant violations, mapped to parse errors by the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// A tag was still pending when its container closed
    DanglingTag(Tag),
    /// A tag followed another tag with nothing in between
    TagAlreadyPending(Tag),
    /// A value or close with no param open
    NoOpenParam,
}

/// Where a pushed value ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Attribute(Tag),
    Value,
}

#[derive(Debug, Default)]
pub struct BuilderContext {
    pending_tag: Option<Tag>,
    stack: Vec<Param>,
}

impl BuilderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of params currently open
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn pending_tag(&self) -> Option<Tag> {
        self.pending_tag
    }

    /// Fill the pending-tag register
    pub fn set_pending_tag(&mut self, tag: Tag) -> Result<(), BuilderError> {
        match self.pending_tag {
            Some(previous) => Err(BuilderError::TagAlreadyPending(previous)),
            None => {
                self.pending_tag = Some(tag);
                Ok(())
            }
        }
    }

    /// Open a param, handing it the pending tag if there is one
    pub fn open(&mut self, param: Param) {
        let tag = self.pending_tag.take();
        self.stack.push(param.with_tag(tag));
    }

    /// Route a literal into the innermost open param
    pub fn push_value(&mut self, value: Value) -> Result<Slot, BuilderError> {
        let top = self.stack.last_mut().ok_or(BuilderError::NoOpenParam)?;
        match self.pending_tag.take() {
            Some(tag) => {
                // Repeated tags on one param overwrite, last one wins
                top.attributes.insert(tag, value);
                Ok(Slot::Attribute(tag))
            }
            None => {
                top.values.push(value);
                Ok(Slot::Value)
            }
        }
    }

    /// Close the innermost param
    ///
    /// A nested param is attached to its parent's `children` and `None` is returned. The
    /// outermost param is handed back once the stack is empty.
    pub fn close(&mut self) -> Result<Option<Param>, BuilderError> {
        if let Some(tag) = self.pending_tag {
            return Err(BuilderError::DanglingTag(tag));
        }
        let param = self.stack.pop().ok_or(BuilderError::NoOpenParam)?;
        trace!(
            kind = %param.kind,
            name = %param.name,
            line = param.line,
            depth = self.stack.len(),
            "closed parameter"
        );
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(param);
                Ok(None)
            }
            None => Ok(Some(param)),
        }
    }
}
