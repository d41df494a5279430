//! Page-side script builders for the function bridge.
//!
//! Every binding `name` owns three registries on `window[name]`:
//!
//! | Key | Contents |
//! |-----|----------|
//! | `callbacks` | `seq → resolve` of pending page calls |
//! | `errors` | `seq → reject` of pending page calls |
//! | `functions` | `seq → function` passed by the page as an argument |

// ============================================================================
// Helper Functions
// ============================================================================

/// Escapes a string for safe use in JavaScript.
pub(crate) fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Script that replaces the raw binding with a promise-returning proxy.
///
/// Function arguments are parked in `functions` and replaced by
/// `{bindingName, seq}` markers the host decodes into handles.
pub(crate) fn binding_script(name: &str) -> String {
    format!(
        r#"(() => {{
	const bindingName = {name};
	const binding = window[bindingName];
	if (typeof binding !== 'function' || binding['callbacks']) {{
		return;
	}}
	const proxy = async (...args) => {{
		const me = window[bindingName];
		const seq = (me['lastSeq'] || 0) + 1;
		me['lastSeq'] = seq;
		const promise = new Promise((resolve, reject) => {{
			me['callbacks'].set(seq, resolve);
			me['errors'].set(seq, reject);
		}});
		const encoded = args.map((arg) => {{
			if (typeof arg !== 'function') {{
				return arg;
			}}
			const fseq = (me['lastFunctionSeq'] || 0) + 1;
			me['lastFunctionSeq'] = fseq;
			me['functions'].set(fseq, arg);
			return {{bindingName, seq: fseq}};
		}});
		binding(JSON.stringify({{name: bindingName, seq, args: encoded}}));
		return promise;
	}};
	proxy['callbacks'] = new Map();
	proxy['errors'] = new Map();
	proxy['functions'] = new Map();
	window[bindingName] = proxy;
}})();"#,
        name = json_string(name)
    )
}

/// Script that settles the page promise of call `seq`.
///
/// A successful result is handed over as its JSON text, so the page
/// receives a string; an error rejects the promise with its message.
pub(crate) fn completion_script(
    name: &str,
    seq: u64,
    outcome: &std::result::Result<String, String>,
) -> String {
    let me = format!("window[{}]", json_string(name));
    let settle = match outcome {
        Ok(result) => format!("{me}['callbacks'].get({seq})({})", json_string(result)),
        Err(message) => format!("{me}['errors'].get({seq})(new Error({}))", json_string(message)),
    };
    format!(
        "{settle};\n{me}['callbacks'].delete({seq});\n{me}['errors'].delete({seq});"
    )
}

/// Expression invoking a parked page function.
///
/// `spread_args` is a JSON array, or `None` for a call without arguments.
pub(crate) fn function_call_script(name: &str, seq: u64, spread_args: Option<&str>) -> String {
    let args = spread_args.map(|a| format!("...{a}")).unwrap_or_default();
    format!(
        "window[{}]['functions'].get({seq})({args})",
        json_string(name)
    )
}

/// Expression removing a parked page function.
pub(crate) fn function_release_script(name: &str, seq: u64) -> String {
    format!("window[{}]['functions'].delete({seq})", json_string(name))
}

/// Expression removing the proxy from the current document.
pub(crate) fn unbind_script(name: &str) -> String {
    format!("delete window[{}]", json_string(name))
}

// ============================================================================
// Tests
// ============================================================================
