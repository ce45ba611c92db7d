//! Build-recipe emission: a file plan into a Makefile fragment
//!
//! Pure text generation. Each planned file gets a copy rule from `src/`
//! into the build directory, the category file lists become Make
//! variables, and the induce/depend references become extra prerequisite
//! lines: a file that induces an artifact must be reprocessed after the
//! files that depend on that artifact (the bibliography pattern).

use crate::analysis::{Category, FileEntry, Plan};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Directory the fragment copies sources into.
pub const BUILD_DIR: &str = "build";

/// Flatten a path into its name inside the build directory:
/// `chapters/one.tex` becomes `build/chapters__one.tex`.
pub fn build_name(path: &str) -> String {
    format!("{}/{}", BUILD_DIR, path.replace('/', "__"))
}

/// The build name of a figure, compiled to PDF when it is a TeX source.
fn figure_build_name(path: &str) -> String {
    match path.strip_suffix(".tex") {
        Some(stem) => build_name(&format!("{}.pdf", stem)),
        None => build_name(path),
    }
}

/// The extra prerequisite rules derived from the induce/depend graph.
///
/// Artifacts map to the files that depend on them; a file with induces
/// gets one rule whose prerequisites are every dependent of every
/// artifact it induces, in plan order, deduplicated.
pub fn dependency_rules(plan: &Plan) -> Vec<(String, Vec<String>)> {
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for file in &plan.files {
        for artifact in &file.depends {
            dependents
                .entry(artifact.as_str())
                .or_default()
                .push(file.path.as_str());
        }
    }
    let mut rules = Vec::new();
    for file in &plan.files {
        if file.induces.is_empty() {
            continue;
        }
        let mut prereqs: Vec<String> = Vec::new();
        for artifact in &file.induces {
            for dependent in dependents.get(artifact.as_str()).into_iter().flatten() {
                let name = build_name(dependent);
                if !prereqs.contains(&name) {
                    prereqs.push(name);
                }
            }
        }
        rules.push((build_name(&file.path), prereqs));
    }
    rules
}

/// Render the whole Makefile fragment for one target's plan.
pub fn emit_makefile(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Build fragment for target '{}'.", plan.name);
    let _ = writeln!(out, "# This file is generated by `slx build`; edits will be");
    let _ = writeln!(out, "# overwritten the next time the descriptor is compiled.");
    let _ = writeln!(out);

    let groups: [(&str, Category); 4] = [
        ("TEX_SRC", Category::Text),
        ("TEX_FIG", Category::Figure),
        ("BIBLIO", Category::Biblio),
        ("HEADERS", Category::Header),
    ];
    for (label, category) in groups {
        let names: Vec<String> = plan
            .files_in(category)
            .map(|f| match category {
                Category::Figure => figure_build_name(&f.path),
                _ => build_name(&f.path),
            })
            .collect();
        let _ = writeln!(out, "{}_{} := {}", label, plan.name, names.join(" "));
    }
    let has_bib = plan.files_in(Category::Biblio).next().is_some();
    let _ = writeln!(out, "HASBIB_{} := {}", plan.name, if has_bib { "1" } else { "0" });
    let _ = writeln!(out);

    for file in &plan.files {
        let _ = writeln!(out, "{}: src/{}", build_name(&file.path), file.path);
        let _ = writeln!(out, "\tcp $< $@");
    }
    let rules = dependency_rules(plan);
    if !rules.is_empty() {
        let _ = writeln!(out);
        for (target, prereqs) in rules {
            let _ = writeln!(out, "{}: {}", target, prereqs.join(" "));
        }
    }
    out
}
