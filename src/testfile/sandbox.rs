#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Hooks are written in [Rhai](https://rhai.rs). A header
//! such as `def check(word):` is followed by an indented Rhai body; the body
//! is compiled as `fn check(word) { <body> }`, so the value of its last
//! expression is the hook's result. Only the `all_bitstrings(n)` builtin is
//! registered, and every call runs under [`HookLimits`].

use rhai::{
    AST, Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, Position, Scope,
    module_resolvers::DummyModuleResolver,
};
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use super::{
    HookDefinition, HookName, ParseError, ResolvedSpecification, Specification, Verdict,
    parsers::parser,
};
use crate::{bitstrings::all_bitstrings, constants::DEFAULT_HOOK_MAX_OPERATIONS};

/// Resource limits applied to hook evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
#[builder(doc)]
pub struct HookLimits {
    /// maximum number of Rhai operations per hook call
    #[builder(default = DEFAULT_HOOK_MAX_OPERATIONS)]
    pub max_operations:  u64,
    /// maximum function call nesting
    #[builder(default = 64)]
    pub max_call_levels: usize,
    /// maximum length of any string value
    #[builder(default = 1 << 20)]
    pub max_string_size: usize,
    /// maximum length of any array value
    #[builder(default = 1 << 20)]
    pub max_array_size:  usize,
}

impl Default for HookLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builds the sandboxed engine hooks run in.
fn engine(limits: &HookLimits) -> Engine {
    let max_array = limits.max_array_size;
    let mut engine = Engine::new();
    engine
        .set_max_operations(limits.max_operations)
        .set_max_call_levels(limits.max_call_levels)
        .set_max_string_size(limits.max_string_size)
        .set_max_array_size(max_array)
        .set_module_resolver(DummyModuleResolver::new())
        .register_fn(
            "all_bitstrings",
            move |length: i64| -> Result<Array, Box<EvalAltResult>> {
                // 2^(n+1) - 1 strings
                let fits = length < 0
                    || u32::try_from(length)
                        .ok()
                        .and_then(|n| n.checked_add(1))
                        .and_then(|n| 2_usize.checked_pow(n))
                        .is_some_and(|count| count - 1 <= max_array);
                if !fits {
                    return Err(format!(
                        "all_bitstrings({length}) would exceed the array size limit of {max_array}"
                    )
                    .into());
                }
                Ok(all_bitstrings(length).map(Dynamic::from).collect())
            },
        );
    engine.on_print(|text| info!(target: "hook", "{text}"));
    engine.on_debug(|text, _, pos| debug!(target: "hook", "{pos:?}: {text}"));
    engine
}

/// A hook compiled into a Rhai function.
struct CompiledHook {
    /// which hook
    name: HookName,
    /// file line of the header
    line: usize,
    /// compiled script holding one function
    ast:  AST,
}

impl CompiledHook {
    /// File line corresponding to a position in the compiled script.
    fn file_line(&self, pos: Position) -> usize {
        pos.line().map_or(self.line, |l| self.line + l - 1)
    }

    /// Calls the hook, mapping failures to a [`ParseError`] that names `call`.
    fn call(
        &self,
        engine: &Engine,
        args: impl rhai::FuncArgs,
        call: impl FnOnce() -> String,
    ) -> Result<Dynamic, ParseError> {
        engine
            .call_fn::<Dynamic>(&mut Scope::new(), &self.ast, self.name.as_str(), args)
            .map_err(|err| {
                let mut err = innermost(err);
                let pos = err.take_position();
                ParseError::HookRuntime {
                    line:    self.file_line(pos),
                    call:    call(),
                    message: err.to_string(),
                }
            })
    }
}

/// Strips the call-site wrappers Rhai adds around errors raised inside
/// functions.
fn innermost(err: Box<EvalAltResult>) -> Box<EvalAltResult> {
    match *err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => innermost(inner),
        other => Box::new(other),
    }
}

/// Turns a hook definition into Rhai source, with `#` comment lines blanked
/// so line numbers still line up.
fn hook_source(params: &[&str], definition: &HookDefinition) -> String {
    let mut source = format!("fn {}({}) {{\n", definition.name(), params.join(", "));
    for line in definition.body() {
        if !line.trim_start().starts_with('#') {
            source.push_str(line);
        }
        source.push('\n');
    }
    source.push('}');
    source
}

/// Checks the header, arity and syntax of a hook and compiles it.
fn compile(engine: &Engine, definition: &HookDefinition) -> Result<CompiledHook, ParseError> {
    let name = definition.name();
    let (_, params) =
        parser::hook_signature(definition.header()).map_err(|e| ParseError::HookSyntax {
            hook:    name,
            line:    definition.line(),
            message: format!("malformed header `{}`: {e}", definition.header().trim()),
        })?;

    let ast = engine
        .compile(hook_source(&params, definition))
        .map_err(|e| ParseError::HookSyntax {
            hook:    name,
            line:    e.position().line().map_or(definition.line(), |l| definition.line() + l - 1),
            message: e.err_type().to_string(),
        })?;

    if params.len() != name.arity() {
        return Err(ParseError::HookArity {
            hook:  name,
            found: params.len(),
            line:  definition.line(),
        });
    }

    Ok(CompiledHook {
        name,
        line: definition.line(),
        ast,
    })
}

/// Rhai values counted as "accept" when returned by `check`.
fn truthy(value: &Dynamic) -> bool {
    if let Ok(b) = value.as_bool() {
        return b;
    }
    if let Ok(i) = value.as_int() {
        return i != 0;
    }
    if let Ok(f) = value.as_float() {
        return f != 0.0;
    }
    if let Ok(d) = value.as_decimal() {
        return !d.is_zero();
    }
    if value.is_unit() {
        return false;
    }
    if let Some(s) = value.read_lock::<ImmutableString>() {
        return !s.is_empty();
    }
    if let Some(a) = value.read_lock::<Array>() {
        return !a.is_empty();
    }
    if let Some(m) = value.read_lock::<Map>() {
        return !m.is_empty();
    }
    true
}

/// Converts the value returned by `words` into a list of words.
fn generated_words(value: Dynamic, hook: &CompiledHook) -> Result<Vec<String>, ParseError> {
    let not_a_string = |found: &str| ParseError::HookRuntime {
        line:    hook.line,
        call:    "words()".to_string(),
        message: format!("words() must return an array of strings, found {found}"),
    };

    if value.is_string() {
        return value.into_string().map(|w| vec![w]).map_err(not_a_string);
    }
    let items = value
        .try_cast::<Array>()
        .ok_or_else(|| not_a_string("a value that is not an array"))?;
    items
        .into_iter()
        .map(|item| {
            let type_name = item.type_name();
            item.into_string().map_err(|_| not_a_string(type_name))
        })
        .collect()
}

/// Runs the hooks of `spec` and settles every pending word.
///
/// Words returned by `words()` that are not yet tested are added as pending.
/// Each pending word is then passed to `check(word)`; a truthy result means
/// accept. Without a `check` hook pending words are accepted.
pub(crate) fn resolve(
    mut spec: Specification,
    limits: &HookLimits,
) -> Result<ResolvedSpecification, ParseError> {
    let engine = engine(limits);
    let words_hook = spec
        .hooks()
        .words
        .as_ref()
        .map(|d| compile(&engine, d))
        .transpose()?;
    let check_hook = spec
        .hooks()
        .check
        .as_ref()
        .map(|d| compile(&engine, d))
        .transpose()?;

    if let Some(hook) = &words_hook {
        let value = hook.call(&engine, (), || "words()".to_string())?;
        let words = generated_words(value, hook)?;
        let added = words.iter().filter(|w| spec.insert_pending(w)).count();
        debug!("words() generated {} words, {added} new", words.len());
    }

    if let Some(hook) = &check_hook {
        for word in spec.pending_words() {
            let value = hook.call(&engine, (word.clone(),), || format!("check('{word}')"))?;
            spec.settle(&word, Verdict::from_accepted(truthy(&value)));
        }
    }

    Ok(spec.into_resolved())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testfile::{ResultKeywords, parse_test_file};

    fn resolve_text(text: &str) -> Result<ResolvedSpecification, ParseError> {
        Specification::parse(text, &ResultKeywords::default())?.resolve(&HookLimits::default())
    }

    #[test]
    fn words_and_check_hooks() {
        let spec = parse_test_file(concat!(
            "foo yes\n",
            "def words():\n",
            "    let out = [\"extra\"];\n",
            "    out += all_bitstrings(1);\n",
            "    out\n",
            "0 no\n",
            "def check(word):\n",
            "    # even lengths are accepted\n",
            "    word.len() % 2 == 0\n",
            "bare\n",
        ))
        .unwrap();

        assert_eq!(spec.iter().collect::<Vec<_>>(), [
            ("foo", Verdict::Accept),
            ("0", Verdict::Reject),
            ("bare", Verdict::Accept),
            ("extra", Verdict::Reject),
            ("", Verdict::Accept),
            ("1", Verdict::Reject),
        ]);
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&Dynamic::from(true)));
        assert!(!truthy(&Dynamic::from(0_i64)));
        assert!(truthy(&Dynamic::from(2_i64)));
        assert!(!truthy(&Dynamic::UNIT));
        assert!(!truthy(&Dynamic::from(String::new())));
        assert!(truthy(&Dynamic::from("x".to_string())));
        assert!(!truthy(&Dynamic::from(Array::new())));
    }

    #[test]
    fn check_arity_is_enforced() {
        let err = resolve_text("1010\ndef check():\n    true\n0101 -> reject").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'check' must be a function of one argument, but it is defined with 0 required \
             arguments (on line 2)"
        );

        let err = resolve_text("1010\ndef check(a, b):\n    true\n").unwrap_err();
        assert!(matches!(err, ParseError::HookArity { found: 2, .. }));
    }

    #[test]
    fn words_arity_is_enforced() {
        let err = resolve_text("1010\ndef words(n):\n    [\"a\"]\n").unwrap_err();
        assert_eq!(err, ParseError::HookArity {
            hook:  HookName::Words,
            found: 1,
            line:  2,
        });
        assert!(err.to_string().starts_with("'words' must be a function of no arguments"));
    }

    #[test]
    fn syntax_errors_point_into_the_file() {
        let err = resolve_text("\n10 accept\ndef words():\n    [\"a\", \"b, \"c\"]\n01 reject")
            .unwrap_err();
        match err {
            ParseError::HookSyntax { hook, line, .. } => {
                assert_eq!(hook, HookName::Words);
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn runtime_errors_name_the_call() {
        let err = resolve_text("\n1010\ndef check(foo):\n    bar\n0101 -> reject").unwrap_err();
        match err {
            ParseError::HookRuntime { line, call, .. } => {
                assert_eq!(line, 4);
                assert_eq!(call, "check('1010')");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn words_must_return_strings() {
        let err = resolve_text("a\ndef words():\n    [1, 2]\n").unwrap_err();
        assert!(err.to_string().contains("must return an array of strings"));
    }

    #[test]
    fn huge_bitstring_requests_fail() {
        let err = resolve_text("def words():\n    all_bitstrings(40)\n").unwrap_err();
        match err {
            ParseError::HookRuntime { line, call, message } => {
                assert_eq!(line, 2);
                assert_eq!(call, "words()");
                assert!(message.contains("array size limit"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn runaway_hooks_are_stopped() {
        let limits = HookLimits::builder().max_operations(10_000).build();
        let spec = Specification::parse(
            "a\ndef check(word):\n    loop { }\n",
            &ResultKeywords::default(),
        )
        .unwrap();
        assert!(matches!(spec.resolve(&limits), Err(ParseError::HookRuntime { .. })));
    }
}
