//! Built-in extension and file-name tables.

/// Extension to language. Ambiguous extensions list their common default
/// here; `detect` decides the final answer from content.
pub const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    // Systems and general purpose
    (".c", "c"),
    (".h", "c"),
    (".cpp", "cpp"),
    (".cxx", "cpp"),
    (".cc", "cpp"),
    (".hpp", "cpp"),
    (".hxx", "cpp"),
    (".cs", "csharp"),
    (".go", "go"),
    (".rs", "rust"),
    // Python
    (".py", "python"),
    (".pyw", "python"),
    (".pyx", "python"),
    (".pyi", "python"),
    (".ipynb", "jupyter"),
    // JavaScript and TypeScript
    (".js", "javascript"),
    (".mjs", "javascript"),
    (".cjs", "javascript"),
    (".jsx", "javascript"),
    (".ts", "typescript"),
    (".tsx", "typescript"),
    (".d.ts", "typescript"),
    // Web
    (".html", "html"),
    (".htm", "html"),
    (".css", "css"),
    (".scss", "scss"),
    (".sass", "sass"),
    (".less", "less"),
    (".vue", "vue"),
    (".svelte", "svelte"),
    // Shell
    (".sh", "shell"),
    (".bash", "shell"),
    (".zsh", "shell"),
    (".fish", "shell"),
    // Prolog
    (".pl", "prolog"),
    (".pro", "prolog"),
    (".prolog", "prolog"),
    // Ontology
    (".owl", "ontology"),
    (".ttl", "ontology"),
    (".rdf", "ontology"),
    (".n3", "ontology"),
    (".nt", "ontology"),
    (".jsonld", "ontology"),
    // Data formats
    (".json", "json"),
    (".yaml", "yaml"),
    (".yml", "yaml"),
    (".xml", "xml"),
    (".csv", "csv"),
    (".tsv", "tsv"),
    (".toml", "toml"),
    (".ini", "ini"),
    // Unity
    (".unity", "unity-scene"),
    (".prefab", "unity-prefab"),
    (".asset", "unity-asset"),
    (".mat", "unity-material"),
    (".anim", "unity-animation"),
    (".controller", "unity-animator"),
    (".shader", "unity-shader"),
    (".cginc", "unity-shader-include"),
    (".compute", "unity-compute"),
    (".meta", "unity-meta"),
    // Godot
    (".gd", "gdscript"),
    (".tscn", "godot-scene"),
    (".tres", "godot-resource"),
    // Other game engines
    (".gml", "gamemaker"),
    (".rpy", "renpy"),
    (".ink", "ink"),
    (".yarn", "yarn"),
    (".lua", "lua"),
    // Other languages
    (".java", "java"),
    (".kt", "kotlin"),
    (".swift", "swift"),
    (".rb", "ruby"),
    (".php", "php"),
    (".r", "r"),
    (".R", "r"),
    (".sql", "sql"),
    (".scala", "scala"),
    (".clj", "clojure"),
    (".cljs", "clojurescript"),
    (".erl", "erlang"),
    (".ex", "elixir"),
    (".dart", "dart"),
    (".jl", "julia"),
    (".zig", "zig"),
    (".nim", "nim"),
    (".cr", "crystal"),
    (".v", "vlang"),
    (".verilog", "verilog"),
    (".sv", "systemverilog"),
    (".vhdl", "vhdl"),
    (".vhd", "vhdl"),
    (".asm", "assembly"),
    (".s", "assembly"),
    (".S", "assembly"),
    (".forth", "forth"),
    (".4th", "forth"),
    (".fs", "fsharp"),
    (".fsx", "fsharp"),
    (".fsi", "fsharp"),
    (".ml", "ocaml"),
    (".mli", "ocaml"),
    (".hs", "haskell"),
    (".lhs", "haskell"),
    (".elm", "elm"),
    (".purs", "purescript"),
    (".re", "reason"),
    (".rei", "reason"),
    (".groovy", "groovy"),
    (".gradle", "gradle"),
    (".proto", "protobuf"),
    (".thrift", "thrift"),
    (".sol", "solidity"),
    (".move", "move"),
    (".m", "matlab"),
    (".t", "perl"),
    // Documentation
    (".md", "markdown"),
    (".markdown", "markdown"),
    (".rst", "rst"),
];

/// Whole file names that are selected even though they carry no language.
pub const RECOGNIZED_FILENAMES: &[&str] = &[
    // Build files
    "Makefile",
    "Dockerfile",
    "Rakefile",
    "Gemfile",
    "Podfile",
    "CMakeLists.txt",
    "BUILD",
    "BUILD.bazel",
    "WORKSPACE",
    "Vagrantfile",
    "Brewfile",
    "Procfile",
    "Justfile",
    // Config dotfiles
    ".env",
    ".env.local",
    ".env.production",
    ".env.development",
    ".editorconfig",
    ".prettierrc",
    ".eslintrc",
    ".babelrc",
    ".npmrc",
    ".yarnrc",
    ".dockerignore",
];
