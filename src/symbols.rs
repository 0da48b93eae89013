//! Symbol table: the sorted array of `(name, callback)` pairs a host
//! registers at `open`, plus the built-ins.

use crate::context::{Context, Status};

/// A host-registered (or built-in) interface: a name callable from a
/// script, paired with the function invoked when the name is reached.
///
/// `U` is the host's userdata type, threaded through [`Context`].
#[derive(Debug)]
pub struct FuncInfo<U> {
    pub(crate) name: &'static str,
    pub(crate) func: fn(&mut Context<'_, U>) -> Status,
}

impl<U> FuncInfo<U> {
    /// Register an interface under `name`, calling `func` when a script
    /// invokes it.
    #[must_use]
    pub fn new(name: &'static str, func: fn(&mut Context<'_, U>) -> Status) -> Self {
        FuncInfo { name, func }
    }
}

impl<U> Clone for FuncInfo<U> {
    fn clone(&self) -> Self {
        FuncInfo {
            name: self.name,
            func: self.func,
        }
    }
}

/// Length of the token starting at `start`, up to (but not including) the
/// first separator byte or end of input. Zero-copy: callers slice the
/// source themselves with the returned length.
pub(crate) fn token_len(src: &[u8], start: usize, is_sep: impl Fn(u8) -> bool) -> usize {
    let mut i = start;
    while i < src.len() && !is_sep(src[i]) {
        i += 1;
    }
    i - start
}

/// Sort the function table by name. Built-ins and host interfaces share
/// one flat, case-sensitive lexicographic order.
pub(crate) fn sort_funcs<U>(funcs: &mut [FuncInfo<U>]) {
    funcs.sort_by(|a, b| a.name.cmp(b.name));
}

/// Binary search the sorted table for the name at `token`.
pub(crate) fn lookup<'t, U>(funcs: &'t [FuncInfo<U>], token: &str) -> Option<&'t FuncInfo<U>> {
    funcs
        .binary_search_by(|entry| entry.name.cmp(token))
        .ok()
        .map(|i| &funcs[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop<U>(_ctx: &mut Context<'_, U>) -> Status {
        Status::Ok
    }

    #[test]
    fn token_len_stops_at_separator() {
        let src = b"iffy more";
        assert_eq!(token_len(src, 0, crate::lexer::is_fixed_separator), 5);
    }

    #[test]
    fn token_len_runs_to_eof() {
        let src = b"name";
        assert_eq!(token_len(src, 0, crate::lexer::is_fixed_separator), 4);
    }

    #[test]
    fn lookup_matches_exact_name_only() {
        let mut funcs: Vec<FuncInfo<()>> = vec![
            FuncInfo::new("if", noop),
            FuncInfo::new("add", noop),
            FuncInfo::new("iffy_other", noop),
        ];
        sort_funcs(&mut funcs);
        assert!(lookup(&funcs, "if").is_some());
        assert!(lookup(&funcs, "iffy").is_none());
        assert!(lookup(&funcs, "add").is_some());
    }
}
