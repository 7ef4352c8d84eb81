//! JavaScript (Node.js) harness

use regex::Regex;

use super::LanguageHarness;

/// Get harness for JavaScript
pub fn harness() -> LanguageHarness {
    LanguageHarness {
        source_file: "main.js",
        run_command: "node /workspace/main.js",
        template: TEMPLATE,
        entry_point: defines_entry_point,
    }
}

/// Function declaration, function-valued binding, or class method named `name`
fn defines_entry_point(source: &str, name: &str) -> bool {
    let name = regex::escape(name);
    let pattern = format!(
        r"(?m)\bfunction\s*\*?\s*{name}\s*\(|\b(?:var|let|const)\s+{name}\s*=|^\s*(?:async\s+)?{name}\s*\([^)]*\)\s*\{{"
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(source))
        .unwrap_or(false)
}

// console output is silenced so only the result array reaches stdout.
// Values JSON.stringify would coerce (NaN, Infinity, promises, functions)
// are reported as serialization errors, matching the Python harness.
const TEMPLATE: &str = r#"const __protocolWrite = process.stdout.write.bind(process.stdout);
console.log = () => {};
console.info = () => {};
console.debug = () => {};

__USER_CODE__

function __resolveEntry() {
  const name = "__FUNCTION_NAME__";
  if (typeof __FUNCTION_NAME__ === "function") {
    return __FUNCTION_NAME__;
  }
  if (typeof Solution === "function" && typeof Solution.prototype[name] === "function") {
    return (...args) => new Solution()[name](...args);
  }
  throw new ReferenceError("entry point " + name + " is not defined");
}

function __jsonReplacer(key, value) {
  if (typeof value === "number" && !Number.isFinite(value)) {
    throw new TypeError("Out of range float value " + String(value) + " is not JSON compliant");
  }
  if (typeof value === "function" || typeof value === "symbol") {
    throw new TypeError("value of type " + typeof value + " has no JSON form");
  }
  if (value !== null && typeof value === "object" && typeof value.then === "function") {
    throw new TypeError("Promise results are not JSON serializable");
  }
  return value;
}

function __runCase(entry, args) {
  let value;
  try {
    value = entry(...args);
  } catch (err) {
    const kind = err && err.name ? err.name : "Error";
    const message = err && err.message !== undefined ? err.message : String(err);
    return { __error__: kind + ": " + message };
  }
  let text;
  try {
    text = JSON.stringify(value, __jsonReplacer);
  } catch (err) {
    return { __error__: "SerializationError: " + err.message };
  }
  if (text === undefined) {
    return { __error__: "SerializationError: value of type " + typeof value + " has no JSON form" };
  }
  return JSON.parse(text);
}

const __cases = JSON.parse(require("fs").readFileSync(0, "utf8"));
const __entry = __resolveEntry();
const __results = __cases.map((args) => __runCase(__entry, args));
__protocolWrite(JSON.stringify(__results) + "\n");
"#;
