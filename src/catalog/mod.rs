//! Static, compiled-in tables of deserialization sinks and taint sources.
//!
//! The catalog is a policy surface, not a contract: callers should not
//! assume exhaustiveness, only that the documented minimum entries are
//! present (see the module tests).

use std::collections::HashSet;
use std::sync::OnceLock;

static SINKS: OnceLock<HashSet<&'static str>> = OnceLock::new();
static SOURCES: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Fully-qualified callee names known to deserialize arbitrary objects from
/// untrusted bytes.
fn sinks() -> &'static HashSet<&'static str> {
    SINKS.get_or_init(|| {
        HashSet::from([
            "pickle.load",
            "pickle.loads",
            "pickle.Unpickler.load",
            "joblib.load",
            "cloudpickle.load",
            "cloudpickle.loads",
            "dill.load",
            "dill.loads",
            "marshal.load",
            "marshal.loads",
            "shelve.open",
            "yaml.load",
            "torch.load",
            "torch.jit.load",
            "numpy.load",
            "pandas.read_pickle",
            "sklearn.externals.joblib.load",
            "keras.models.load_model",
        ])
    })
}

/// Program constructs through which attacker-controlled data can enter the
/// program. Matched with [`match_source`], which also recognizes any
/// dotted prefix of a candidate name.
fn sources() -> &'static HashSet<&'static str> {
    SOURCES.get_or_init(|| {
        HashSet::from([
            "input",
            "sys.argv",
            "os.environ.get",
            "os.getenv",
            "argparse.Namespace",
            "request.form",
            "request.form.get",
            "request.form.__getitem__",
            "request.args",
            "request.args.get",
            "request.args.__getitem__",
            "request.json",
            "request.json.get",
            "request.json.__getitem__",
            "request.values",
            "request.values.get",
            "request.data",
            "request.body",
            "request.files",
            "request.files.get",
            "request.files.__getitem__",
            "request.headers.get",
            "request.cookies.get",
            "request.POST.get",
            "request.GET.get",
            "request.FILES.get",
            "fastapi.Request.json",
            "flask.Request.get_json",
            "requests.get",
            "urllib.request.urlopen",
            "socket.recv",
            "base64.b64decode",
            "json.loads",
            "open",
        ])
    })
}

/// Is `name` a known deserialization sink?
pub fn is_sink(name: &str) -> bool {
    sinks().contains(name)
}

/// Check whether `call_name` matches a known source, either exactly or via
/// any proper dotted prefix (longest-to-shortest).
///
/// This catches patterns like `request.files['file']` being reduced by the
/// caller to `request.files` before the match, as well as bare calls like
/// `request.form.get`.
pub fn match_source(call_name: &str) -> bool {
    if sources().contains(call_name) {
        return true;
    }
    let parts: Vec<&str> = call_name.split('.').collect();
    for i in (1..parts.len()).rev() {
        let partial = parts[..i].join(".");
        if sources().contains(partial.as_str()) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_sinks_present() {
        for name in [
            "pickle.load",
            "pickle.loads",
            "yaml.load",
            "torch.load",
            "marshal.loads",
            "shelve.open",
        ] {
            assert!(is_sink(name), "expected {name} to be a known sink");
        }
    }

    #[test]
    fn minimum_sources_present() {
        for name in ["input", "sys.argv", "request.form", "request.POST.get", "open"] {
            assert!(match_source(name), "expected {name} to be a known source");
        }
    }

    #[test]
    fn match_source_is_prefix_aware() {
        assert!(match_source("request.form.get"));
        assert!(match_source("request.form"));
        assert!(!match_source("response.form"));
    }

    #[test]
    fn non_sink_is_rejected() {
        assert!(!is_sink("json.loads"));
        assert!(!is_sink("print"));
    }
}
