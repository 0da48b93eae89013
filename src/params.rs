//! Parameter extraction: `has_param`, quoted/unquoted string popping,
//! numeric coercion, and the push side of strings.
//!
//! All buffers are caller-provided; nothing here allocates.

use crate::context::{Context, PeekRaw, Status};

/// Maximum length of the stack buffer used internally by
/// [`Context::pop_long`]/[`Context::pop_double`] to stage a numeric
/// token before parsing it. 32 bytes comfortably fits any integer or
/// float literal a script is expected to pass as a single token.
pub const MAX_TOKEN_LEN: usize = 32;

impl<'a, U> Context<'a, U> {
    /// Does a parameter sit at the cursor? A known function name or a
    /// bare comma both mean "no".
    ///
    /// An unresolved token is treated as a parameter literal (`Ok`), not
    /// propagated as the `Err` that [`Context::peek_func`] would report
    /// for the same token — this function only ever asks "is this a
    /// function name", never "did the lookup succeed".
    pub fn has_param(&mut self) -> Status {
        match self.peek_raw() {
            Err(()) => Status::Err,
            Ok(PeekRaw::Comma) => Status::NoParam,
            Ok(PeekRaw::Func(_)) => Status::NoParam,
            Ok(PeekRaw::NotFound) => Status::Ok,
        }
    }

    /// Skip a comment, quoted or unquoted token, advancing the cursor
    /// past it without copying it anywhere.
    pub fn skip_string(&mut self) -> Status {
        if self.skip_meaningless().is_err() {
            return Status::Err;
        }
        if self.peek_byte() == b'"' {
            self.bump();
            loop {
                if self.is_eof() {
                    return Status::Err;
                }
                let b = self.peek_byte();
                if b == b'"' {
                    self.bump();
                    return Status::Ok;
                }
                if let Some(detect) = self.escape_detect {
                    if detect(b) {
                        let mut scratch = [0u8; MAX_TOKEN_LEN];
                        match self.consume_escape(&mut scratch) {
                            Status::Ok => continue,
                            st => return st,
                        }
                    }
                }
                self.bump();
            }
        } else {
            while !self.is_eof() && !self.is_separator(self.peek_byte()) {
                self.bump();
            }
            Status::Ok
        }
    }

    /// Pop a (possibly quoted) string into `buf`, writing a trailing
    /// NUL. `buf` must hold at least one byte.
    ///
    /// A quoted string exactly filling `buf` (content plus the trailing
    /// NUL) succeeds; one byte more and this returns
    /// [`Status::BufferTooSmall`].
    pub fn pop_string(&mut self, buf: &mut [u8]) -> Status {
        if buf.is_empty() {
            return Status::BufferTooSmall;
        }
        if self.skip_meaningless().is_err() {
            return Status::Err;
        }

        let mut di = 0usize;
        if self.peek_byte() == b'"' {
            self.bump();
            loop {
                if self.is_eof() {
                    return Status::Err;
                }
                let b = self.peek_byte();
                if b == b'"' {
                    self.bump();
                    break;
                }
                if let Some(detect) = self.escape_detect {
                    if detect(b) {
                        // Reserve the last slot for the trailing NUL.
                        let cap = buf.len() - 1;
                        if di >= cap {
                            return Status::BufferTooSmall;
                        }
                        match self.consume_escape(&mut buf[di..cap]) {
                            Status::Ok => {
                                di += self.last_escape_written();
                                continue;
                            }
                            st => return st,
                        }
                    }
                }
                if di + 1 > buf.len() - 1 {
                    return Status::BufferTooSmall;
                }
                buf[di] = b;
                di += 1;
                self.bump();
            }
        } else {
            while !self.is_eof() && !self.is_separator(self.peek_byte()) {
                if di + 1 > buf.len() - 1 {
                    return Status::BufferTooSmall;
                }
                buf[di] = self.peek_byte();
                di += 1;
                self.bump();
            }
        }
        buf[di] = 0;
        Status::Ok
    }

    /// Run the host's escape parser against the remaining destination
    /// capacity `dst`. On success, [`Context::last_escape_written`]
    /// reports the byte count written; call it immediately after.
    fn consume_escape(&mut self, dst: &mut [u8]) -> Status {
        let parse = self
            .escape_parse
            .expect("escape_detect set without escape_parse");
        let text = self.text();
        let mut src_pos = self.pos;
        let written = parse(text.as_bytes(), &mut src_pos, dst);
        if written == 0 {
            return Status::BadEscapeFormat;
        }
        if written > dst.len() {
            return Status::BufferTooSmall;
        }
        self.pos = src_pos;
        self.last_escape_written = written;
        Status::Ok
    }

    fn last_escape_written(&self) -> usize {
        self.last_escape_written
    }

    /// Pop a signed integer token, converted with base-0 autodetection:
    /// a `0x`/`0X` prefix reads hexadecimal, a leading `0` followed by
    /// more digits reads octal, anything else reads decimal. The entire
    /// token must convert, or this returns [`Status::ParamTypeError`].
    pub fn pop_long(&mut self, out: &mut i64) -> Status {
        let mut buf = [0u8; MAX_TOKEN_LEN];
        let status = self.pop_string(&mut buf);
        if status != Status::Ok {
            return status;
        }
        let token = token_str(&buf);
        match parse_base0_i64(token) {
            Some(v) => {
                *out = v;
                Status::Ok
            }
            None => Status::ParamTypeError,
        }
    }

    /// Pop a floating-point token. The entire token must
    /// parse as a float, or this returns [`Status::ParamTypeError`].
    pub fn pop_double(&mut self, out: &mut f64) -> Status {
        let mut buf = [0u8; MAX_TOKEN_LEN];
        let status = self.pop_string(&mut buf);
        if status != Status::Ok {
            return status;
        }
        let token = token_str(&buf);
        match token.parse::<f64>() {
            Ok(v) => {
                *out = v;
                Status::Ok
            }
            Err(_) => Status::ParamTypeError,
        }
    }
}

fn token_str(buf: &[u8]) -> &str {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    std::str::from_utf8(&buf[..len]).unwrap_or("")
}

/// Parse an integer with base-0 autodetection: `0x`/`0X` selects hex, a
/// leading `0` followed by further digits selects octal, anything else
/// is decimal. An optional leading `+`/`-` applies to the result.
fn parse_base0_i64(token: &str) -> Option<i64> {
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let magnitude = if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        i64::from_str_radix(unsigned, 8).ok()?
    } else {
        unsigned.parse::<i64>().ok()?
    };

    if negative {
        magnitude.checked_neg()
    } else {
        Some(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::FuncInfo;

    fn noop<U>(_ctx: &mut Context<'_, U>) -> Status {
        Status::Ok
    }

    fn ctx<'a>() -> Context<'a, ()> {
        Context::open(vec![FuncInfo::new("cb", noop)], None).unwrap()
    }

    #[test]
    fn has_param_true_for_unresolved_token() {
        let mut c = ctx();
        c.load("42");
        assert_eq!(c.has_param(), Status::Ok);
    }

    #[test]
    fn has_param_false_for_known_name() {
        let mut c = ctx();
        c.load("cb");
        assert_eq!(c.has_param(), Status::NoParam);
    }

    #[test]
    fn has_param_false_for_comma() {
        let mut c = ctx();
        c.load(",");
        assert_eq!(c.has_param(), Status::NoParam);
    }

    #[test]
    fn skip_string_advances_past_unquoted_token() {
        let mut c = ctx();
        c.load("hello rest");
        assert_eq!(c.skip_string(), Status::Ok);
        assert_eq!(c.has_param(), Status::Ok);
        let mut buf = [0u8; 16];
        assert_eq!(c.pop_string(&mut buf), Status::Ok);
        assert_eq!(token_str(&buf), "rest");
    }

    #[test]
    fn skip_string_advances_past_quoted_token() {
        let mut c = ctx();
        c.load("\"hello world\" rest");
        assert_eq!(c.skip_string(), Status::Ok);
        let mut buf = [0u8; 16];
        assert_eq!(c.pop_string(&mut buf), Status::Ok);
        assert_eq!(token_str(&buf), "rest");
    }

    #[test]
    fn skip_string_unterminated_quote_errors() {
        let mut c = ctx();
        c.load("\"never closes");
        assert_eq!(c.skip_string(), Status::Err);
    }

    #[test]
    fn pop_string_unquoted() {
        let mut c = ctx();
        c.load("hello rest");
        let mut buf = [0u8; 16];
        assert_eq!(c.pop_string(&mut buf), Status::Ok);
        assert_eq!(token_str(&buf), "hello");
    }

    #[test]
    fn pop_string_quoted() {
        let mut c = ctx();
        c.load("\"hello world\" rest");
        let mut buf = [0u8; 16];
        assert_eq!(c.pop_string(&mut buf), Status::Ok);
        assert_eq!(token_str(&buf), "hello world");
    }

    #[test]
    fn pop_string_exact_fit_succeeds() {
        let mut c = ctx();
        c.load("\"abc\"");
        let mut buf = [0u8; 4];
        assert_eq!(c.pop_string(&mut buf), Status::Ok);
        assert_eq!(token_str(&buf), "abc");
    }

    #[test]
    fn pop_string_one_byte_too_small_fails() {
        let mut c = ctx();
        c.load("\"abcd\"");
        let mut buf = [0u8; 4];
        assert_eq!(c.pop_string(&mut buf), Status::BufferTooSmall);
    }

    #[test]
    fn pop_long_parses_integer() {
        let mut c = ctx();
        c.load("-17");
        let mut v = 0i64;
        assert_eq!(c.pop_long(&mut v), Status::Ok);
        assert_eq!(v, -17);
    }

    #[test]
    fn pop_long_rejects_partial_numeric() {
        let mut c = ctx();
        c.load("12abc");
        let mut v = 0i64;
        assert_eq!(c.pop_long(&mut v), Status::ParamTypeError);
    }

    #[test]
    fn pop_long_parses_hex() {
        let mut c = ctx();
        c.load("0x1A");
        let mut v = 0i64;
        assert_eq!(c.pop_long(&mut v), Status::Ok);
        assert_eq!(v, 26);
    }

    #[test]
    fn pop_long_parses_octal() {
        let mut c = ctx();
        c.load("010");
        let mut v = 0i64;
        assert_eq!(c.pop_long(&mut v), Status::Ok);
        assert_eq!(v, 8);
    }

    #[test]
    fn pop_long_parses_negative_hex() {
        let mut c = ctx();
        c.load("-0x1A");
        let mut v = 0i64;
        assert_eq!(c.pop_long(&mut v), Status::Ok);
        assert_eq!(v, -26);
    }

    #[test]
    fn pop_long_rejects_bad_octal_digit() {
        let mut c = ctx();
        c.load("089");
        let mut v = 0i64;
        assert_eq!(c.pop_long(&mut v), Status::ParamTypeError);
    }

    #[test]
    fn pop_long_zero_stays_zero() {
        let mut c = ctx();
        c.load("0");
        let mut v = 1i64;
        assert_eq!(c.pop_long(&mut v), Status::Ok);
        assert_eq!(v, 0);
    }

    #[test]
    fn pop_double_parses_float() {
        let mut c = ctx();
        c.load("3.5");
        let mut v = 0.0f64;
        assert_eq!(c.pop_double(&mut v), Status::Ok);
        assert!((v - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn push_bool_composes_with_or_and_and() {
        let mut c = ctx();
        assert_eq!(c.push_bool(false), Status::Ok);
        c.composing = crate::context::Composing::Or;
        assert_eq!(c.push_bool(true), Status::Ok);
        assert!(c.bool_value);
        c.composing = crate::context::Composing::And;
        assert_eq!(c.push_bool(false), Status::Ok);
        assert!(!c.bool_value);
    }
}
