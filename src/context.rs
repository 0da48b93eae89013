//! The interpreter context: script/cursor, symbol table, boolean
//! accumulator, `if` depth, host hooks, and the `run`/`step` driver.

use log::trace;

use crate::control;
use crate::error::HostError;
use crate::lexer::Cursor;
use crate::symbols::{self, FuncInfo};

/// Execution status returned by every interpreter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success, continue.
    Ok,
    /// Cooperative suspension requested (`yield`).
    Suspend,
    /// Generic failure — a token did not resolve to a known name, or the
    /// script is malformed in a way no more specific status covers.
    Err,
    /// A popped string would not fit the caller's destination buffer.
    BufferTooSmall,
    /// No comment starts at the cursor.
    NoComment,
    /// No parameter at the cursor — the next token is a known name or a
    /// comma.
    NoParam,
    /// Numeric conversion left trailing non-numeric characters.
    ParamTypeError,
    /// The escape parser consumed zero characters.
    BadEscapeFormat,
}

/// Boolean accumulator composition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Composing {
    /// The next push assigns directly.
    Nil,
    /// The next push is OR-composed with the stored value.
    Or,
    /// The next push is AND-composed with the stored value.
    And,
}

/// Host hook: an additional character class treated as a separator,
/// layered on top of the fixed set.
pub type SeparatorFn = fn(u8) -> bool;
/// Host hook: does this byte begin an escape sequence inside a quoted
/// string?
pub type EscapeDetectFn = fn(u8) -> bool;
/// Host hook: consume an escape sequence from `src` (advancing
/// `src_pos`), writing decoded bytes into `dst` starting at its front.
/// Returns the number of bytes written into `dst`; zero means malformed.
pub type EscapeParseFn = fn(src: &[u8], src_pos: &mut usize, dst: &mut [u8]) -> usize;

/// Names reserved for built-in control words; a host interface may not
/// use one of these.
pub(crate) const BUILTIN_NAMES: [&str; 8] =
    ["and", "else", "elseif", "endif", "if", "or", "then", "yield"];

/// An embeddable command-script interpreter context.
///
/// Owns the script reference and cursor, the sorted function table, the
/// boolean accumulator and its composition mode, the `if` nesting depth,
/// and the host-configured hooks. `U` is an opaque userdata type threaded
/// through to every callback via [`Context::userdata`]/
/// [`Context::userdata_mut`].
#[derive(Debug)]
pub struct Context<'a, U> {
    pub(crate) funcs: Vec<FuncInfo<U>>,
    pub(crate) script: Option<&'a str>,
    pub(crate) pos: usize,
    pub(crate) bool_value: bool,
    pub(crate) composing: Composing,
    pub(crate) if_depth: u32,
    pub(crate) separator_detect: Option<SeparatorFn>,
    pub(crate) escape_detect: Option<EscapeDetectFn>,
    pub(crate) escape_parse: Option<EscapeParseFn>,
    pub(crate) last_escape_written: usize,
    userdata: Option<U>,
}

impl<'a, U> Context<'a, U> {
    /// Open a context: install the host's interfaces alongside the
    /// built-ins, sort the combined table, and store the separator hook.
    /// All other state starts zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ReservedName`] if a host interface shadows a
    /// built-in control word, or [`HostError::DuplicateName`] if two
    /// host interfaces (or a host interface and a built-in) share a name.
    pub fn open(
        funcs: Vec<FuncInfo<U>>,
        separator_detect: Option<SeparatorFn>,
    ) -> Result<Self, HostError> {
        for f in &funcs {
            if BUILTIN_NAMES.contains(&f.name) {
                return Err(HostError::ReservedName(f.name.to_string()));
            }
        }

        let mut all = Vec::with_capacity(funcs.len() + BUILTIN_NAMES.len());
        all.push(FuncInfo::new("if", control::bi_if::<U>));
        all.push(FuncInfo::new("then", control::bi_then::<U>));
        all.push(FuncInfo::new("elseif", control::bi_elseif::<U>));
        all.push(FuncInfo::new("else", control::bi_else::<U>));
        all.push(FuncInfo::new("endif", control::bi_endif::<U>));
        all.push(FuncInfo::new("or", control::bi_or::<U>));
        all.push(FuncInfo::new("and", control::bi_and::<U>));
        all.push(FuncInfo::new("yield", control::bi_yield::<U>));
        all.extend(funcs);
        symbols::sort_funcs(&mut all);

        for pair in all.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(HostError::DuplicateName(pair[0].name.to_string()));
            }
        }

        Ok(Context {
            funcs: all,
            script: None,
            pos: 0,
            bool_value: false,
            composing: Composing::Nil,
            if_depth: 0,
            separator_detect,
            escape_detect: None,
            escape_parse: None,
            last_escape_written: 0,
            userdata: None,
        })
    }

    /// Close the context: clear every field. The context must be
    /// re-[`open`](Context::open)ed before further use.
    pub fn close(&mut self) {
        self.funcs.clear();
        self.script = None;
        self.pos = 0;
        self.bool_value = false;
        self.composing = Composing::Nil;
        self.if_depth = 0;
        self.separator_detect = None;
        self.escape_detect = None;
        self.escape_parse = None;
        self.last_escape_written = 0;
        self.userdata = None;
    }

    /// Load a script. If one was already loaded, it is unloaded first.
    pub fn load(&mut self, text: &'a str) {
        self.unload();
        self.script = Some(text);
        self.pos = 0;
    }

    /// Rewind the cursor to the start of the currently loaded script.
    pub fn reload(&mut self) {
        self.pos = 0;
    }

    /// Clear the loaded script and reset the cursor.
    pub fn unload(&mut self) {
        self.script = None;
        self.pos = 0;
    }

    /// Set the escape-detection and escape-parsing hooks used inside
    /// quoted strings. Either both are set or neither is.
    pub fn set_escape_hooks(&mut self, detect: EscapeDetectFn, parse: EscapeParseFn) {
        self.escape_detect = Some(detect);
        self.escape_parse = Some(parse);
    }

    /// Set the opaque userdata carried on the context.
    pub fn set_userdata(&mut self, data: U) {
        self.userdata = Some(data);
    }

    /// Borrow the opaque userdata, if any was set.
    pub fn userdata(&self) -> Option<&U> {
        self.userdata.as_ref()
    }

    /// Mutably borrow the opaque userdata, if any was set.
    pub fn userdata_mut(&mut self) -> Option<&mut U> {
        self.userdata.as_mut()
    }

    /// Current cursor offset into the loaded script, in bytes.
    #[must_use]
    pub fn cursor_pos(&self) -> usize {
        self.pos
    }

    /// Push a boolean value onto the accumulator, composing it with the
    /// pending mode set by a preceding `or`/`and`. A host
    /// interface that evaluates a condition calls this to feed `if`.
    /// Consumes and resets the composition mode back to `Nil`.
    pub fn push_bool(&mut self, value: bool) -> Status {
        self.bool_value = match self.composing {
            Composing::Nil => value,
            Composing::Or => self.bool_value || value,
            Composing::And => self.bool_value && value,
        };
        self.composing = Composing::Nil;
        Status::Ok
    }

    // -------------------------------------------------------------
    // Cursor plumbing shared by symbols/params/control
    // -------------------------------------------------------------

    pub(crate) fn text(&self) -> &'a str {
        self.script.unwrap_or("")
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.text().len()
    }

    pub(crate) fn peek_byte(&self) -> u8 {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> u8 {
        self.text().as_bytes().get(self.pos + offset).copied().unwrap_or(0)
    }

    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn bump_n(&mut self, n: usize) {
        self.pos += n;
    }

    /// A byte is a separator if it's in the fixed set or the host's
    /// `separator_detect` hook flags it.
    pub(crate) fn is_separator(&self, b: u8) -> bool {
        crate::lexer::is_fixed_separator(b) || self.separator_detect.is_some_and(|f| f(b))
    }

    /// Trim blanks and skip comments until neither applies. `Err` means an unterminated
    /// single-quoted comment.
    pub(crate) fn skip_meaningless(&mut self) -> Result<(), ()> {
        let text = self.text();
        let mut cur = Cursor::at(text, self.pos);
        let r = cur.skip_meaningless();
        self.pos = cur.pos();
        r
    }

    // -------------------------------------------------------------
    // Symbol table peek, shared by peek_func/has_param/step
    // -------------------------------------------------------------

    pub(crate) fn peek_raw(&mut self) -> Result<PeekRaw<U>, ()> {
        self.skip_meaningless()?;
        if self.peek_byte() == b',' {
            self.bump();
            return Ok(PeekRaw::Comma);
        }
        let text = self.text();
        let len = symbols::token_len(text.as_bytes(), self.pos, |b| self.is_separator(b));
        let token = &text[self.pos..self.pos + len];
        match symbols::lookup(&self.funcs, token) {
            Some(f) => Ok(PeekRaw::Func(f.clone())),
            None => Ok(PeekRaw::NotFound),
        }
    }

    /// Try to peek one function at the cursor without consuming it. A
    /// comma is consumed as a no-op and reported as `(Status::Ok, None)`.
    pub fn peek_func(&mut self) -> (Status, Option<FuncInfo<U>>) {
        match self.peek_raw() {
            Err(()) => (Status::Err, None),
            Ok(PeekRaw::Comma) => (Status::Ok, None),
            Ok(PeekRaw::Func(f)) => (Status::Ok, Some(f)),
            Ok(PeekRaw::NotFound) => (Status::Err, None),
        }
    }

    /// Run a single step: peek a function, advance past its name, skip
    /// meaningless characters, then invoke it.
    pub fn step(&mut self) -> Status {
        let outcome = self.peek_raw();
        trace!("step: pos={} outcome={}", self.pos, describe_peek(&outcome));
        match outcome {
            Err(()) => Status::Err,
            Ok(PeekRaw::Comma) => Status::Ok,
            Ok(PeekRaw::NotFound) => Status::Err,
            Ok(PeekRaw::Func(f)) => {
                self.bump_n(f.name.len());
                if self.skip_meaningless().is_err() {
                    return Status::Err;
                }
                (f.func)(self)
            }
        }
    }

    /// Repeatedly step while the cursor has not reached end of input and
    /// the previous status was `Ok`. A `Suspend` or `Err` halts the loop
    /// and is returned; calling `run` again resumes at the same cursor.
    pub fn run(&mut self) -> Status {
        let mut status = Status::Ok;
        while !self.is_eof() && status == Status::Ok {
            status = self.step();
        }
        trace!("run: halted at pos={} status={:?}", self.pos, status);
        status
    }
}

pub(crate) enum PeekRaw<U> {
    Comma,
    Func(FuncInfo<U>),
    NotFound,
}

fn describe_peek<U>(outcome: &Result<PeekRaw<U>, ()>) -> &'static str {
    match outcome {
        Err(()) => "unterminated-comment",
        Ok(PeekRaw::Comma) => "comma",
        Ok(PeekRaw::Func(_)) => "func",
        Ok(PeekRaw::NotFound) => "not-found",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop<U>(_ctx: &mut Context<'_, U>) -> Status {
        Status::Ok
    }

    #[test]
    fn open_rejects_reserved_name() {
        let funcs = vec![FuncInfo::new("if", noop::<()>)];
        let err = Context::open(funcs, None).unwrap_err();
        assert!(matches!(err, HostError::ReservedName(n) if n == "if"));
    }

    #[test]
    fn open_rejects_duplicate_name() {
        let funcs = vec![FuncInfo::new("dup", noop::<()>), FuncInfo::new("dup", noop::<()>)];
        let err = Context::open(funcs, None).unwrap_err();
        assert!(matches!(err, HostError::DuplicateName(n) if n == "dup"));
    }

    #[test]
    fn empty_script_runs_ok() {
        let mut ctx: Context<'_, ()> = Context::open(vec![], None).unwrap();
        ctx.load("");
        assert_eq!(ctx.run(), Status::Ok);
    }

    #[test]
    fn whitespace_and_comment_only_script_runs_ok() {
        let mut ctx: Context<'_, ()> = Context::open(vec![], None).unwrap();
        ctx.load("   'just a comment'   ");
        assert_eq!(ctx.run(), Status::Ok);
    }

    #[test]
    fn unknown_leading_token_errors() {
        let mut ctx: Context<'_, ()> = Context::open(vec![], None).unwrap();
        ctx.load("bogus");
        assert_eq!(ctx.step(), Status::Err);
    }

    #[test]
    fn reload_rewinds_cursor() {
        let mut ctx: Context<'_, ()> = Context::open(vec![FuncInfo::new("cb", noop)], None).unwrap();
        ctx.load("cb cb");
        assert_eq!(ctx.step(), Status::Ok);
        assert!(ctx.cursor_pos() > 0);
        ctx.reload();
        assert_eq!(ctx.cursor_pos(), 0);
    }
}
