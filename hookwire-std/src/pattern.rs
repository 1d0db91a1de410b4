//! # Pattern Engine
//!
//! Compiles a template string into a sequence of emitters and applies it to
//! an argument bag, producing one output line per record.
//!
//! # Template grammar
//!
//! - `%X` where `X` is registered: invoke the function and write its value.
//! - `%J{ABC}`: invoke each registered function in the braces and write the
//!   non-skipped results as one JSON object, keyed by result name.
//! - Anything else, including `%` before an unregistered character or a
//!   trailing `%`, is written literally.
//!
//! `J` is reserved; compiling against a registry that claims it fails.
//!
//! ```rust,ignore
//! let registry = PatternRegistry::new()
//!     .with('t', |_| PatternResult::new("title", "RENDER"));
//! let pattern = Pattern::compile("title:%t %J{t}", &registry)?;
//! assert_eq!(pattern.render_string(&Args::new()), "title:RENDER {\"title\":\"RENDER\"}\n");
//! ```

use hookwire_core::{
    Args, ConfigError, PatternFn, PatternRegistry, RESERVED_KEY, Value, write_loose_map,
};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt::{self, Write as _},
    io,
    sync::Arc,
};

/// Pooled buffers larger than this are released instead of kept.
const MAX_POOLED_CAPACITY: usize = 64 * 1024;

thread_local! {
    static LINE_BUFFER: RefCell<String> = RefCell::new(String::with_capacity(512));
}

enum Emitter {
    Literal(Box<str>),
    Call(PatternFn),
    JsonGroup(Box<[PatternFn]>),
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emitter::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Emitter::Call(_) => f.write_str("Call"),
            Emitter::JsonGroup(funcs) => f.debug_tuple("JsonGroup").field(&funcs.len()).finish(),
        }
    }
}

/// A compiled template.
///
/// Immutable once compiled and cheap to clone; one compiled pattern can be
/// rendered from any number of threads at once.
#[derive(Clone)]
pub struct Pattern {
    template: Arc<str>,
    emitters: Arc<[Emitter]>,
}

impl Pattern {
    /// Compile `template` against `registry`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReservedKey`] if the registry claims `J`.
    pub fn compile(template: &str, registry: &PatternRegistry) -> Result<Self, ConfigError> {
        if registry.contains(RESERVED_KEY) {
            return Err(ConfigError::ReservedKey(RESERVED_KEY));
        }

        let mut emitters = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            match after.chars().next() {
                Some(RESERVED_KEY) if after[1..].starts_with('{') => {
                    let body = &after[2..];
                    match body.find('}') {
                        Some(end) => {
                            let funcs: Vec<PatternFn> = body[..end]
                                .chars()
                                .filter_map(|key| registry.get(key).cloned())
                                .collect();
                            flush_literal(&mut literal, &mut emitters);
                            emitters.push(Emitter::JsonGroup(funcs.into_boxed_slice()));
                            rest = &body[end + 1..];
                        }
                        None => {
                            literal.push('%');
                            rest = after;
                        }
                    }
                }
                Some(key) => match registry.get(key) {
                    Some(f) => {
                        flush_literal(&mut literal, &mut emitters);
                        emitters.push(Emitter::Call(Arc::clone(f)));
                        rest = &after[key.len_utf8()..];
                    }
                    None => {
                        literal.push('%');
                        rest = after;
                    }
                },
                None => {
                    literal.push('%');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        flush_literal(&mut literal, &mut emitters);

        Ok(Self {
            template: template.into(),
            emitters: emitters.into(),
        })
    }

    /// The source template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render one line (with trailing newline) into `stream` in a single write.
    pub fn render<W: io::Write + ?Sized>(&self, stream: &mut W, args: &Args) -> io::Result<()> {
        self.with_line(args, |line| stream.write_all(line.as_bytes()))
    }

    /// Render one line (with trailing newline) into an owned string.
    pub fn render_string(&self, args: &Args) -> String {
        let mut out = String::new();
        self.render_body(&mut out, args);
        out.push('\n');
        out
    }

    /// Render one line into a fresh byte buffer.
    pub fn render_bytes(&self, args: &Args) -> Vec<u8> {
        self.with_line(args, |line| line.as_bytes().to_vec())
    }

    fn with_line<T>(&self, args: &Args, f: impl FnOnce(&str) -> T) -> T {
        LINE_BUFFER.with(|cell| match cell.try_borrow_mut() {
            Ok(mut buf) => {
                buf.clear();
                self.render_body(&mut buf, args);
                buf.push('\n');
                let out = f(&buf);
                if buf.capacity() > MAX_POOLED_CAPACITY {
                    *buf = String::with_capacity(512);
                }
                out
            }
            // A pattern function rendering another pattern on this thread.
            Err(_) => f(&self.render_string(args)),
        })
    }

    fn render_body(&self, out: &mut String, args: &Args) {
        for emitter in self.emitters.iter() {
            match emitter {
                Emitter::Literal(text) => out.push_str(text),
                Emitter::Call(f) => {
                    let result = f(args);
                    if !result.skip {
                        let start = out.len();
                        // Writing into a String only fails if Display does.
                        let _ = write!(out, "{}", result.value);
                        escape_line_breaks(out, start);
                    }
                }
                Emitter::JsonGroup(funcs) => {
                    let fields: BTreeMap<String, Value> = funcs
                        .iter()
                        .map(|f| f(args))
                        .filter(|r| !r.skip)
                        .map(|r| (r.key, r.value))
                        .collect();
                    write_group(out, &fields);
                }
            }
        }
    }
}

fn flush_literal(literal: &mut String, emitters: &mut Vec<Emitter>) {
    if !literal.is_empty() {
        emitters.push(Emitter::Literal(std::mem::take(literal).into_boxed_str()));
    }
}

fn write_group(out: &mut String, fields: &BTreeMap<String, Value>) {
    match serde_json::to_string(fields) {
        Ok(json) => out.push_str(&json),
        Err(err) => {
            tracing::debug!(error = %err, "json group not encodable, writing raw fields");
            let start = out.len();
            let _ = write_loose_map(out, fields.iter());
            escape_line_breaks(out, start);
        }
    }
}

/// Escape `\n` and `\r` in `out[from..]` so a record stays on one line.
fn escape_line_breaks(out: &mut String, from: usize) {
    if !out[from..].contains(['\n', '\r']) {
        return;
    }
    let escaped = out[from..].replace('\n', "\\n").replace('\r', "\\r");
    out.truncate(from);
    out.push_str(&escaped);
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("template", &self.template)
            .field("emitters", &self.emitters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use hookwire_core::PatternResult;
    use proptest::prelude::*;

    fn render_registry() -> PatternRegistry {
        PatternRegistry::new()
            .with('T', |args: &Args| match args.time("time") {
                Some(t) => PatternResult::new("time", t.format("%Y/%m/%d %H:%M:%S%.3f").to_string()),
                None => PatternResult::skip("time"),
            })
            .with('t', |_: &Args| PatternResult::new("title", "RENDER"))
    }

    fn render_args() -> Args {
        let mut args = Args::new();
        args.insert("time", Local.with_ymd_and_hms(2019, 1, 2, 11, 36, 28).unwrap());
        args
    }

    #[test]
    fn json_grouping() {
        let pattern = Pattern::compile("%J{Tt}", &render_registry()).unwrap();
        assert_eq!(
            pattern.render_string(&render_args()),
            "{\"time\":\"2019/01/02 11:36:28.000\",\"title\":\"RENDER\"}\n"
        );
    }

    #[test]
    fn mixed_text() {
        let pattern = Pattern::compile("[%T] title:%t", &render_registry()).unwrap();
        assert_eq!(
            pattern.render_string(&render_args()),
            "[2019/01/02 11:36:28.000] title:RENDER\n"
        );
    }

    #[test]
    fn unknown_specifiers_are_literal() {
        let registry = PatternRegistry::new().with('M', |_: &Args| PatternResult::new("x", "2233"));
        let pattern = Pattern::compile("%12 %% %xd %M", &registry).unwrap();
        assert_eq!(pattern.render_string(&Args::new()), "%12 %% %xd 2233\n");
    }

    #[test]
    fn trailing_percent_and_unclosed_group_are_literal() {
        let registry = render_registry();
        assert_eq!(
            Pattern::compile("50%", &registry).unwrap().render_string(&Args::new()),
            "50%\n"
        );
        assert_eq!(
            Pattern::compile("%J{t", &registry).unwrap().render_string(&Args::new()),
            "%J{t\n"
        );
        assert_eq!(
            Pattern::compile("%Jt", &registry).unwrap().render_string(&Args::new()),
            "%Jt\n"
        );
        assert_eq!(
            Pattern::compile("%J%t", &registry).unwrap().render_string(&Args::new()),
            "%JRENDER\n"
        );
    }

    #[test]
    fn reserved_key_is_rejected() {
        let registry = PatternRegistry::new().with('J', |_: &Args| PatternResult::new("j", 1));
        assert_eq!(
            Pattern::compile("%J", &registry).unwrap_err(),
            ConfigError::ReservedKey('J')
        );
    }

    #[test]
    fn skipped_results_vanish_from_text_and_json() {
        let pattern = Pattern::compile("<%T>%J{Tt}", &render_registry()).unwrap();
        assert_eq!(
            pattern.render_string(&Args::new()),
            "<>{\"title\":\"RENDER\"}\n"
        );
    }

    #[test]
    fn group_ignores_unregistered_keys_and_can_be_empty() {
        let pattern = Pattern::compile("%J{?t!} %J{}", &render_registry()).unwrap();
        assert_eq!(
            pattern.render_string(&Args::new()),
            "{\"title\":\"RENDER\"} {}\n"
        );
    }

    #[test]
    fn unencodable_group_falls_back_to_raw_fields() {
        let registry = PatternRegistry::new()
            .with('c', |_: &Args| PatternResult::new("conn", Value::opaque("pool-1", ())))
            .with('n', |_: &Args| PatternResult::new("n", 2));
        let pattern = Pattern::compile("%J{cn}", &registry).unwrap();
        assert_eq!(pattern.render_string(&Args::new()), "{conn:pool-1 n:2}\n");
    }

    #[test]
    fn render_writes_single_line_to_stream() {
        let pattern = Pattern::compile("%t", &render_registry()).unwrap();
        let mut out = Vec::new();
        pattern.render(&mut out, &Args::new()).unwrap();
        pattern.render(&mut out, &Args::new()).unwrap();
        assert_eq!(out, b"RENDER\nRENDER\n");
        assert_eq!(pattern.render_bytes(&Args::new()), b"RENDER\n");
    }

    #[test]
    fn line_breaks_in_values_are_escaped() {
        let registry = PatternRegistry::new()
            .with('e', |args: &Args| PatternResult::new("error", args.str("error")))
            .with('o', |_: &Args| PatternResult::new("conn", Value::opaque("a\nb", ())));
        let mut args = Args::new();
        args.insert("error", "line one\r\nline two");

        let text = Pattern::compile("err=%e", &registry).unwrap();
        assert_eq!(text.render_string(&args), "err=line one\\r\\nline two\n");

        let json = Pattern::compile("%J{e}", &registry).unwrap();
        assert_eq!(json.render_string(&args), "{\"error\":\"line one\\r\\nline two\"}\n");

        let loose = Pattern::compile("%J{o}", &registry).unwrap();
        assert_eq!(loose.render_string(&args), "{conn:a\\nb}\n");
    }

    #[test]
    fn multibyte_literals_survive() {
        let pattern = Pattern::compile("→ %t ✓ %é", &render_registry()).unwrap();
        assert_eq!(pattern.render_string(&Args::new()), "→ RENDER ✓ %é\n");
    }

    proptest! {
        #[test]
        fn every_render_ends_in_exactly_one_newline(template in "[a-zA-Z%{}J ]{0,24}") {
            let pattern = Pattern::compile(&template, &render_registry()).unwrap();
            let line = pattern.render_string(&render_args());
            prop_assert!(line.ends_with('\n'));
            prop_assert!(!line[..line.len() - 1].contains('\n'));
        }

        #[test]
        fn values_never_break_the_line(value in "[a-z\r\n ]{0,24}") {
            let registry = PatternRegistry::new()
                .with('v', |args: &Args| PatternResult::new("value", args.str("value")));
            let mut args = Args::new();
            args.insert("value", value);
            let line = Pattern::compile("%v|%J{v}", &registry).unwrap().render_string(&args);
            prop_assert!(line.ends_with('\n'));
            prop_assert!(!line[..line.len() - 1].contains(['\n', '\r']));
        }

        #[test]
        fn templates_without_percent_are_verbatim(template in "[^%\n]{0,32}") {
            let pattern = Pattern::compile(&template, &render_registry()).unwrap();
            prop_assert_eq!(pattern.render_string(&Args::new()), format!("{template}\n"));
        }
    }
}
