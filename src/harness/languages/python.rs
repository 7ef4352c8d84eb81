//! Python harness

use regex::Regex;

use super::LanguageHarness;

/// Get harness for Python
pub fn harness() -> LanguageHarness {
    LanguageHarness {
        source_file: "main.py",
        run_command: "python3 -u /workspace/main.py",
        template: TEMPLATE,
        entry_point: defines_entry_point,
    }
}

/// Top-level function or method definition named `name`
fn defines_entry_point(source: &str, name: &str) -> bool {
    let pattern = format!(
        r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+{}[ \t]*\(",
        regex::escape(name)
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(source))
        .unwrap_or(false)
}

// User prints go to a throwaway buffer; only the result array reaches the
// real stdout.
const TEMPLATE: &str = r#"import io as __io
import json as __json
import sys as __sys
from typing import *

__protocol_out = __sys.stdout
__sys.stdout = __io.StringIO()

__USER_CODE__


def __resolve_entry():
    name = "__FUNCTION_NAME__"
    solution = globals().get("Solution")
    if isinstance(solution, type) and callable(getattr(solution, name, None)):
        return lambda *args: getattr(solution(), name)(*args)
    entry = globals().get(name)
    if callable(entry):
        return entry
    raise NameError("entry point " + name + " is not defined")


def __run_case(entry, args):
    try:
        value = entry(*args)
    except Exception as exc:
        return {"__error__": type(exc).__name__ + ": " + str(exc)}
    try:
        __json.dumps(value, allow_nan=False)
    except (TypeError, ValueError, OverflowError) as exc:
        return {"__error__": "SerializationError: " + str(exc)}
    return value


def __main():
    cases = __json.loads(__sys.stdin.read())
    entry = __resolve_entry()
    results = [__run_case(entry, args) for args in cases]
    __protocol_out.write(__json.dumps(results, allow_nan=False))
    __protocol_out.write("\n")
    __protocol_out.flush()


if __name__ == "__main__":
    __main()
"#;
