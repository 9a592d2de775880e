//! Python helper programs, passed verbatim to `python -c`. Each works on
//! Python 2 and 3 and prints JSON to stdout.

/// PyPI search over the XMLRPC API. Argument: the query (may contain
/// spaces). Prints a list of `{name, summary, version}` maps.
pub const SEARCH: &str = r#"
from __future__ import print_function
import json
import sys
try:
    from xmlrpc import client as xmlrpc
except ImportError:
    import xmlrpclib as xmlrpc

query = sys.argv[1]
pypi = xmlrpc.ServerProxy("https://pypi.org/pypi")
results = pypi.search({"name": query})
json.dump(results, sys.stdout, indent=2)
print()
"#;

/// PyPI release metadata over the XMLRPC API. Argument: the package name
/// (not necessarily canonical). Prints the release data map, or `{}` when
/// the package has no releases.
pub const INFO: &str = r#"
from __future__ import print_function
import json
import sys
try:
    from xmlrpc import client as xmlrpc
except ImportError:
    import xmlrpclib as xmlrpc

package = sys.argv[1]
pypi = xmlrpc.ServerProxy("https://pypi.org/pypi")
releases = pypi.package_releases(package)
if not releases:
    print("{}")
    sys.exit(0)
release, = releases
info = pypi.release_data(package, release)
json.dump(info, sys.stdout, indent=2)
print()
"#;

/// Bare-import guessing with pipreqs. Argument: space-separated directory
/// names to skip. Prints a list of distribution names. pipreqs must be
/// installed for the interpreter in use.
pub const GUESS: &str = r#"
from __future__ import print_function
import json
import pipreqs.pipreqs as pipreqs
import sys

imports = pipreqs.get_all_imports(".", extra_ignore_dirs=sys.argv[1].split())
packages = pipreqs.get_pkg_names(imports)
json.dump(packages, sys.stdout, indent=2)
print()
"#;
