//! Command Registry
//!
//! A tree of keyword-addressed commands. Each node owns its sub-commands
//! in registration order, an optional argument-hint template, and the
//! handler invoked by the dispatcher. The root of the tree is a plain
//! container with an empty keyword.
//!
//! Commands carry two attribute axes: `mutable` (may be unregistered)
//! and an optional construct role (`Push`/`Pop`/`Modifier`) marking the
//! multi-line language keywords. The transient dry-run flag is set by
//! the dispatcher before invoking a construct command inside an open
//! declaration and consumed by the handler.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::errors::ShellError;
use crate::shell::Shell;

/// Handler signature shared by every command. The command itself is the
/// first argument (for keyword, sub-commands, and the dry-run flag), the
/// shell is the threaded host context, and `args` is the tokenized line
/// with `args[0]` being the invoking keyword.
pub type CommandHandler = Rc<dyn Fn(&ShellCmd, &mut Shell, &[String]) -> Result<i32, ShellError>>;

/// Role a command plays in multi-line construct definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructRole {
    /// Opens a new construct frame (`routine`, `while`, `if`).
    Push,
    /// Closes the outermost open frame (`end`).
    Pop,
    /// Mutates the current frame without pushing or popping (`else`).
    Modifier,
}

#[derive(Clone)]
pub struct ShellCmd {
    keyword: String,
    arghints: Option<String>,
    description: String,
    handler: CommandHandler,
    children: IndexMap<String, ShellCmd>,
    mutable: bool,
    construct: Option<ConstructRole>,
    dry_run: Cell<bool>,
    aliased_from: Option<String>,
}

impl ShellCmd {
    pub fn new(
        keyword: &str,
        arghints: Option<&str>,
        description: &str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            keyword: keyword.to_string(),
            arghints: arghints.map(str::to_string),
            description: description.to_string(),
            handler,
            children: IndexMap::new(),
            mutable: false,
            construct: None,
            dry_run: Cell::new(false),
            aliased_from: None,
        }
    }

    /// The registry root: an empty-keyword container that is never
    /// invoked itself.
    pub fn root() -> Self {
        Self::new("", None, "", Rc::new(|_, _, _| Ok(0)))
    }

    /// Mark this command unregisterable by `unreg`.
    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Mark this command as a construct keyword.
    pub fn construct(mut self, role: ConstructRole) -> Self {
        self.construct = Some(role);
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn arghints(&self) -> Option<&str> {
        self.arghints.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub fn construct_role(&self) -> Option<ConstructRole> {
        self.construct
    }

    pub fn is_construct(&self) -> bool {
        self.construct.is_some()
    }

    pub fn is_construct_push(&self) -> bool {
        self.construct == Some(ConstructRole::Push)
    }

    pub fn is_construct_pop(&self) -> bool {
        self.construct == Some(ConstructRole::Pop)
    }

    pub fn is_construct_modifier(&self) -> bool {
        self.construct == Some(ConstructRole::Modifier)
    }

    pub fn set_dry_run(&self) {
        self.dry_run.set(true);
    }

    /// Read and clear the dry-run flag. Construct handlers call this
    /// exactly once so the flag never outlives the invocation it was
    /// set for.
    pub fn take_dry_run(&self) -> bool {
        self.dry_run.replace(false)
    }

    /// Invoke the handler. The return value becomes `%?`.
    pub fn invoke(&self, shell: &mut Shell, args: &[String]) -> Result<i32, ShellError> {
        (self.handler)(self, shell, args)
    }

    // ------------------------------------------------------------------
    // Registry operations
    // ------------------------------------------------------------------

    /// Insert a direct child. Fails if a sibling already claims the
    /// keyword.
    pub fn register(&mut self, cmd: ShellCmd) -> Result<(), ShellError> {
        if self.children.contains_key(&cmd.keyword) {
            return Err(ShellError::DuplicateKeyword(cmd.keyword));
        }
        tracing::debug!(keyword = %cmd.keyword, parent = %self.keyword, "register command");
        self.children.insert(cmd.keyword.clone(), cmd);
        Ok(())
    }

    /// Remove a direct child by keyword. Fails unless the child is
    /// mutable. Any aliases referencing the removed command (directly or
    /// through other aliases) are removed in the same operation.
    pub fn unregister(&mut self, keyword: &str) -> Result<ShellCmd, ShellError> {
        let cmd = self
            .children
            .get(keyword)
            .ok_or_else(|| ShellError::CommandNotFound(keyword.to_string()))?;
        if !cmd.mutable {
            return Err(ShellError::ImmutableCommand(keyword.to_string()));
        }

        let removed = self.children.shift_remove(keyword).unwrap();

        // Cascade: removing a command invalidates its aliases, and
        // removing those invalidates aliases-of-aliases.
        let mut gone = vec![removed.keyword.clone()];
        while let Some(target) = gone.pop() {
            let stale: Vec<String> = self
                .children
                .values()
                .filter(|c| c.aliased_from.as_deref() == Some(target.as_str()))
                .map(|c| c.keyword.clone())
                .collect();
            for keyword in stale {
                tracing::debug!(alias = %keyword, of = %target, "removing stale alias");
                self.children.shift_remove(&keyword);
                gone.push(keyword);
            }
        }

        Ok(removed)
    }

    /// Exact-match lookup among direct children. Case-sensitive.
    pub fn find(&self, keyword: &str) -> Option<&ShellCmd> {
        self.children.get(keyword)
    }

    /// Every direct child whose keyword begins with `prefix`, in
    /// registration order, plus the length of the longest match.
    pub fn partial_matches(&self, prefix: &str) -> (Vec<&str>, usize) {
        let mut matches = Vec::new();
        let mut longest = 0;
        for keyword in self.children.keys() {
            if keyword.starts_with(prefix) {
                longest = longest.max(keyword.len());
                matches.push(keyword.as_str());
            }
        }
        (matches, longest)
    }

    pub fn children(&self) -> impl Iterator<Item = &ShellCmd> {
        self.children.values()
    }

    /// Rendered width of `keyword + arghints`, used for help alignment.
    pub(crate) fn rendered_width(&self) -> usize {
        self.keyword.len()
            + self
                .arghints
                .as_ref()
                .map(|h| h.len() + 1)
                .unwrap_or(0)
    }

    /// Maximum rendered width across this subtree, so the top-level
    /// help listing aligns sub-command entries with base entries.
    pub fn longest(&self) -> usize {
        let mut width = 0;
        for child in self.children.values() {
            width = width.max(child.rendered_width()).max(child.longest());
        }
        width
    }

    /// Append a left-aligned listing of this command's children
    /// (recursively for sub-trees) to `out`.
    pub fn help(&self, out: &mut String, indent: usize, width: usize) {
        for child in self.children.values() {
            child.help_entry(out, indent, width);
        }
    }

    /// Append this command's own help line followed by its subtree.
    pub fn help_entry(&self, out: &mut String, indent: usize, width: usize) {
        let rendered = match &self.arghints {
            Some(hints) => format!("{} {}", self.keyword, hints),
            None => self.keyword.clone(),
        };
        out.push_str(&format!(
            "{:indent$}{:<width$}  {}\n",
            "", rendered, self.description
        ));
        self.help(out, indent + 2, width.saturating_sub(2));
    }

    /// Produce an alias of this command: a new keyword sharing the
    /// handler, hints, and construct role, always mutable, with a
    /// back-reference so unregistering the original removes it too.
    pub fn alias(&self, new_keyword: &str) -> ShellCmd {
        let mut alias = self.clone();
        alias.keyword = new_keyword.to_string();
        alias.mutable = true;
        alias.dry_run = Cell::new(false);
        alias.aliased_from = Some(self.keyword.clone());
        alias
    }
}

impl fmt::Debug for ShellCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellCmd")
            .field("keyword", &self.keyword)
            .field("mutable", &self.mutable)
            .field("construct", &self.construct)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("aliased_from", &self.aliased_from)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
