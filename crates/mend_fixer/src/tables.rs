//! Static name-resolution tables for auto-import and qualification.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Bare function or constant name → the module that provides it.
pub static FUNC_TO_MODULE: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let entries: &[(&str, &str)] = &[
        // math
        ("sqrt", "math"),
        ("sin", "math"),
        ("cos", "math"),
        ("tan", "math"),
        ("asin", "math"),
        ("acos", "math"),
        ("atan", "math"),
        ("atan2", "math"),
        ("log", "math"),
        ("log10", "math"),
        ("log2", "math"),
        ("exp", "math"),
        ("floor", "math"),
        ("ceil", "math"),
        ("fabs", "math"),
        ("factorial", "math"),
        ("degrees", "math"),
        ("radians", "math"),
        ("hypot", "math"),
        ("fmod", "math"),
        ("trunc", "math"),
        ("isfinite", "math"),
        ("isinf", "math"),
        ("isnan", "math"),
        ("gamma", "math"),
        ("lgamma", "math"),
        ("comb", "math"),
        ("perm", "math"),
        ("pi", "math"),
        ("e", "math"),
        ("tau", "math"),
        ("inf", "math"),
        ("nan", "math"),
        // random
        ("random", "random"),
        ("randint", "random"),
        ("uniform", "random"),
        ("choice", "random"),
        ("shuffle", "random"),
        ("sample", "random"),
        ("randrange", "random"),
        ("seed", "random"),
        // statistics
        ("mean", "statistics"),
        ("median", "statistics"),
        ("mode", "statistics"),
        ("stdev", "statistics"),
        ("variance", "statistics"),
        // re
        ("search", "re"),
        ("match", "re"),
        ("fullmatch", "re"),
        ("sub", "re"),
        ("findall", "re"),
        ("finditer", "re"),
        ("split", "re"),
        ("compile", "re"),
        // json
        ("loads", "json"),
        ("dumps", "json"),
        ("load", "json"),
        ("dump", "json"),
        // datetime
        ("datetime", "datetime"),
        ("timedelta", "datetime"),
        ("date", "datetime"),
        ("time", "datetime"),
        ("timezone", "datetime"),
        // itertools
        ("product", "itertools"),
        ("permutations", "itertools"),
        ("combinations", "itertools"),
        ("cycle", "itertools"),
        ("repeat", "itertools"),
        ("accumulate", "itertools"),
        ("chain", "itertools"),
        ("islice", "itertools"),
        // functools
        ("reduce", "functools"),
        ("lru_cache", "functools"),
        ("partial", "functools"),
        // collections
        ("deque", "collections"),
        ("Counter", "collections"),
        ("defaultdict", "collections"),
        // heapq
        ("heappush", "heapq"),
        ("heappop", "heapq"),
        ("heapify", "heapq"),
        ("nlargest", "heapq"),
        ("nsmallest", "heapq"),
        // bisect
        ("bisect", "bisect"),
        ("bisect_left", "bisect"),
        ("bisect_right", "bisect"),
        ("insort", "bisect"),
        ("insort_left", "bisect"),
        ("insort_right", "bisect"),
        // pathlib
        ("Path", "pathlib"),
        // os.path
        ("join", "os.path"),
        ("basename", "os.path"),
        ("dirname", "os.path"),
        // numpy
        ("array", "numpy"),
        ("arange", "numpy"),
        ("zeros", "numpy"),
        ("ones", "numpy"),
        ("linspace", "numpy"),
        ("reshape", "numpy"),
        // pandas
        ("DataFrame", "pandas"),
        ("Series", "pandas"),
        ("read_csv", "pandas"),
    ];
    entries.iter().copied().collect()
});

/// Preference order when a name is provided by more than one module.
pub static PREFERRED_MODULES: Lazy<FxHashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let entries: &[(&str, &[&str])] = &[
            ("sqrt", &["math", "numpy"]),
            ("sin", &["math", "numpy"]),
            ("cos", &["math", "numpy"]),
            ("log", &["math", "numpy"]),
            ("exp", &["math", "numpy"]),
            ("mean", &["statistics", "numpy"]),
            ("median", &["statistics", "numpy"]),
            ("mode", &["statistics"]),
            ("random", &["random", "numpy.random"]),
            ("randint", &["random", "numpy.random"]),
            ("search", &["re"]),
            ("sub", &["re"]),
            ("Path", &["pathlib"]),
            ("join", &["os.path", "pathlib"]),
            ("array", &["numpy"]),
            ("arange", &["numpy"]),
        ];
        entries.iter().copied().collect()
    });

/// The modules to try for `name`, most preferred first.
pub fn candidate_modules(name: &str) -> Option<Vec<&'static str>> {
    if let Some(preferred) = PREFERRED_MODULES.get(name) {
        return Some(preferred.to_vec());
    }
    FUNC_TO_MODULE.get(name).map(|module| vec![*module])
}

#[cfg(test)]
mod tests {
    use super::candidate_modules;

    #[test]
    fn preference_list_wins_over_plain_mapping() {
        assert_eq!(candidate_modules("sqrt").unwrap(), ["math", "numpy"]);
        assert_eq!(candidate_modules("join").unwrap(), ["os.path", "pathlib"]);
    }

    #[test]
    fn plain_mapping_fallback() {
        assert_eq!(candidate_modules("heappush").unwrap(), ["heapq"]);
        assert_eq!(candidate_modules("deque").unwrap(), ["collections"]);
    }

    #[test]
    fn unknown_names_resolve_to_nothing() {
        assert!(candidate_modules("frobnicate").is_none());
    }
}
