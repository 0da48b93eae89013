//! Built-in control words: the boolean accumulator (`or`/`and`), the
//! `if`/`then`/`elseif`/`else`/`endif` state machine, and `yield`.

use crate::context::{Composing, Context, PeekRaw, Status};

fn is_if<U>(f: &crate::symbols::FuncInfo<U>) -> bool {
    f.name == "if"
}
fn is_elseif<U>(f: &crate::symbols::FuncInfo<U>) -> bool {
    f.name == "elseif"
}
fn is_else<U>(f: &crate::symbols::FuncInfo<U>) -> bool {
    f.name == "else"
}
fn is_endif<U>(f: &crate::symbols::FuncInfo<U>) -> bool {
    f.name == "endif"
}

/// `if`: push the accumulator's current value as a fresh condition and
/// increment `if_depth`. The accumulator itself is reset by the
/// following `then`.
pub(crate) fn bi_if<U>(ctx: &mut Context<'_, U>) -> Status {
    ctx.if_depth += 1;
    Status::Ok
}

/// `or`: arm the accumulator to OR-compose the next pushed value. The
/// host interface evaluating that value calls [`Context::push_bool`],
/// which reads and resets this mode.
pub(crate) fn bi_or<U>(ctx: &mut Context<'_, U>) -> Status {
    ctx.composing = Composing::Or;
    Status::Ok
}

/// `and`: arm the accumulator to AND-compose the next pushed value.
pub(crate) fn bi_and<U>(ctx: &mut Context<'_, U>) -> Status {
    ctx.composing = Composing::And;
    Status::Ok
}

/// `then`: consume the accumulator's current value as the branch
/// condition, reset the accumulator, and either execute the taken
/// branch or skip to its matching `elseif`/`else`/`endif`.
///
/// `if_depth` at the moment `then` runs is the depth `if` set for this
/// exact statement (an `if` always immediately precedes its `then`), so
/// it doubles as this if-statement's identity for the rest of the chain:
/// every helper below only treats an `elseif`/`else`/`endif` as *this*
/// chain's own marker when `if_depth` still equals that entry value.
///
/// Guarantee: exactly one `if_depth` decrement per matched `if`, even
/// across nested branches. A matching `endif`'s text is consumed the
/// moment it resolves, at whichever level recognizes it as its own —
/// never left for an enclosing loop to reconsider — so the same token
/// can never be credited toward two different `if` statements.
pub(crate) fn bi_then<U>(ctx: &mut Context<'_, U>) -> Status {
    let cond = ctx.bool_value;
    ctx.composing = Composing::Nil;
    ctx.bool_value = false;
    let entry = ctx.if_depth;

    if cond {
        run_body_until_marker(ctx, entry)
    } else {
        match skip_branch(ctx, entry) {
            Err(st) => st,
            Ok(Marker::ElseIf) => Status::Ok,
            Ok(Marker::Endif) => {
                ctx.if_depth -= 1;
                ctx.bump_n("endif".len());
                Status::Ok
            }
            Ok(Marker::Else) => {
                ctx.bump_n("else".len());
                if ctx.skip_meaningless().is_err() {
                    return Status::Err;
                }
                run_body_until_marker(ctx, entry)
            }
        }
    }
}

/// `elseif`/`else`/`endif` reached directly via the ordinary `step`
/// loop (i.e. after `then` left the cursor sitting on one) are pure
/// markers with no effect of their own.
pub(crate) fn bi_elseif<U>(_ctx: &mut Context<'_, U>) -> Status {
    Status::Ok
}

pub(crate) fn bi_else<U>(_ctx: &mut Context<'_, U>) -> Status {
    Status::Ok
}

pub(crate) fn bi_endif<U>(_ctx: &mut Context<'_, U>) -> Status {
    Status::Ok
}

/// `yield`: request cooperative suspension. `run`
/// halts immediately and a later call resumes right after this word.
pub(crate) fn bi_yield<U>(_ctx: &mut Context<'_, U>) -> Status {
    Status::Suspend
}

/// Marker word a skip/drain loop stopped on.
enum Marker {
    ElseIf,
    Else,
    Endif,
}

/// Execute statements in the current branch body until the cursor
/// reaches `elseif`/`else`/`endif` *at `entry` depth* — the marker that
/// belongs to the `if`/`then` pair that started this body. A marker
/// word seen at any other (necessarily deeper, not-yet-resolved) depth
/// belongs to a nested `if` whose own `then` already decided what to do
/// with it; it's just executed here like any other no-op statement.
///
/// Entering our *own* `elseif`/`else` while executing means a prior
/// branch of this chain was already taken — the remainder of the chain
/// is drained, not executed.
fn run_body_until_marker<U>(ctx: &mut Context<'_, U>, entry: u32) -> Status {
    loop {
        match ctx.peek_raw() {
            Err(()) => return Status::Err,
            Ok(PeekRaw::Comma) => {}
            Ok(PeekRaw::NotFound) => return Status::Err,
            Ok(PeekRaw::Func(f)) => {
                let is_marker = is_elseif(&f) || is_else(&f) || is_endif(&f);
                if is_marker && ctx.if_depth == entry {
                    if is_endif(&f) {
                        ctx.if_depth -= 1;
                        ctx.bump_n(f.name.len());
                        return Status::Ok;
                    }
                    return drain_to_endif(ctx, entry);
                }
                ctx.bump_n(f.name.len());
                if ctx.skip_meaningless().is_err() {
                    return Status::Err;
                }
                let st = (f.func)(ctx);
                if st != Status::Ok {
                    return st;
                }
            }
        }
        if ctx.is_eof() {
            return Status::Err;
        }
    }
}

/// Advance past control words without executing them until the `endif`
/// matching `entry` depth, honoring nested `if`/`endif` pairs along the
/// way — used once a branch of this chain has already been taken, to
/// skip the rest of its `elseif`/`else` arms.
fn drain_to_endif<U>(ctx: &mut Context<'_, U>, entry: u32) -> Status {
    loop {
        match ctx.peek_raw() {
            Err(()) => return Status::Err,
            Ok(PeekRaw::Comma) => {}
            Ok(PeekRaw::NotFound) => skip_data_token(ctx),
            Ok(PeekRaw::Func(f)) => {
                if is_if(&f) {
                    ctx.if_depth += 1;
                    ctx.bump_n(f.name.len());
                } else if is_endif(&f) {
                    let is_mine = ctx.if_depth == entry;
                    ctx.if_depth -= 1;
                    ctx.bump_n(f.name.len());
                    if is_mine {
                        return Status::Ok;
                    }
                } else {
                    ctx.bump_n(f.name.len());
                }
            }
        }
        if ctx.is_eof() {
            return Status::Err;
        }
    }
}

/// Skip an untaken branch's body, honoring nested `if`/`endif` pairs,
/// stopping (without consuming) at the `elseif`/`else`/`endif` that
/// matches `entry` depth.
fn skip_branch<U>(ctx: &mut Context<'_, U>, entry: u32) -> Result<Marker, Status> {
    loop {
        match ctx.peek_raw() {
            Err(()) => return Err(Status::Err),
            Ok(PeekRaw::Comma) => {}
            Ok(PeekRaw::NotFound) => skip_data_token(ctx),
            Ok(PeekRaw::Func(f)) => {
                if is_if(&f) {
                    ctx.if_depth += 1;
                    ctx.bump_n(f.name.len());
                } else if is_elseif(&f) || is_else(&f) || is_endif(&f) {
                    if ctx.if_depth == entry {
                        return Ok(match_marker(&f));
                    }
                    if is_endif(&f) {
                        ctx.if_depth -= 1;
                    }
                    ctx.bump_n(f.name.len());
                } else {
                    ctx.bump_n(f.name.len());
                }
            }
        }
        if ctx.is_eof() {
            return Err(Status::Err);
        }
    }
}

fn match_marker<U>(f: &crate::symbols::FuncInfo<U>) -> Marker {
    if is_elseif(f) {
        Marker::ElseIf
    } else if is_else(f) {
        Marker::Else
    } else {
        Marker::Endif
    }
}

/// An unresolved token inside a skipped branch is treated as bare data:
/// advance one character past the failed lookup, then to the next
/// separator.
fn skip_data_token<U>(ctx: &mut Context<'_, U>) {
    ctx.bump();
    while !ctx.is_eof() && !ctx.is_separator(ctx.peek_byte()) {
        ctx.bump();
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::symbols::FuncInfo;

    use crate::context::Status;

    type Marks = Vec<&'static str>;

    fn set_true(ctx: &mut Context<'_, Marks>) -> Status {
        ctx.push_bool(true)
    }
    fn set_false(ctx: &mut Context<'_, Marks>) -> Status {
        ctx.push_bool(false)
    }
    fn mark(ctx: &mut Context<'_, Marks>) -> Status {
        ctx.userdata_mut().unwrap().push("mark");
        Status::Ok
    }

    fn new_ctx<'a>() -> Context<'a, Marks> {
        let funcs = vec![
            FuncInfo::new("true", set_true),
            FuncInfo::new("false", set_false),
            FuncInfo::new("mark", mark),
        ];
        Context::open(funcs, None).unwrap()
    }

    #[test]
    fn simple_if_then_endif_taken() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load("true if then mark endif");
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.if_depth, 0);
    }

    #[test]
    fn simple_if_then_endif_not_taken() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load("false if then mark endif");
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.if_depth, 0);
    }

    #[test]
    fn if_then_else_endif_takes_else_branch() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load("false if then mark else mark endif");
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.if_depth, 0);
        assert_eq!(ctx.userdata().unwrap(), &vec!["mark"]);
    }

    #[test]
    fn if_elseif_chain_picks_first_true_branch() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load("false if then mark elseif true then mark elseif mark endif");
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.if_depth, 0);
        assert_eq!(ctx.userdata().unwrap(), &vec!["mark"]);
    }

    #[test]
    fn nested_if_inside_taken_branch_does_not_confuse_outer_elseif() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load(
            "true if then if false then mark elseif false then mark endif mark elseif mark endif",
        );
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.if_depth, 0);
        assert_eq!(ctx.userdata().unwrap(), &vec!["mark"]);
    }

    #[test]
    fn nested_if_inside_skipped_branch_balances_depth() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load("false if then true if then mark endif endif");
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.if_depth, 0);
    }

    #[test]
    fn yield_suspends_and_resumes() {
        let mut ctx = new_ctx();
        ctx.set_userdata(vec![]);
        ctx.load("mark yield mark");
        assert_eq!(ctx.run(), Status::Suspend);
        assert_eq!(ctx.run(), Status::Ok);
        assert_eq!(ctx.userdata().unwrap(), &vec!["mark", "mark"]);
    }
}
