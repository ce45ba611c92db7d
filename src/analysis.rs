//! Semantic analysis: resolve references and flatten the item tree
//!
//! This pass consumes the AST produced by the parser and turns each
//! declared target into a flat file plan. A branch entry's name becomes a
//! path prefix for its nested list; category labels and induce/depend
//! references accumulate down the tree. `$name` expansions are resolved
//! against previously bound definitions.
//!
//! Duplicate-definition and builtin validation are deliberately not done
//! here; a later binding of the same name shadows the earlier one.

use crate::ast::{DefList, Entry, ItemList, ListItem, Tag, TopLevel};
use crate::diagnostics::{Diagnostic, ParseResult};
use crate::span::{Span, Spanned};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The role of a source file in the document build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Text,
    Figure,
    Biblio,
    Header,
}

impl Category {
    /// The label name selecting this category in source.
    pub fn from_label(name: &str) -> Option<Category> {
        match name {
            "txt" => Some(Category::Text),
            "fig" => Some(Category::Figure),
            "bib" => Some(Category::Biblio),
            "hdr" => Some(Category::Header),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Text => "txt",
            Category::Figure => "fig",
            Category::Biblio => "bib",
            Category::Header => "hdr",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved source file with its role and references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub category: Category,
    /// Artifacts this file induces.
    pub induces: Vec<String>,
    /// Artifacts this file depends on.
    pub depends: Vec<String>,
    /// Where the leaf entry was written.
    pub span: Span,
}

/// The flat plan for one declared target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub name: String,
    pub files: Vec<FileEntry>,
}

impl Plan {
    /// The files of one category, in declaration order.
    pub fn files_in(&self, category: Category) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(move |f| f.category == category)
    }
}

/// Inherited context while flattening a nested item tree.
#[derive(Debug, Clone, Default)]
struct Scope {
    prefix: String,
    category: Option<Category>,
    induces: Vec<String>,
    depends: Vec<String>,
}

impl Scope {
    /// The scope seen by a branch entry's nested list.
    fn child(&self, entry: &Entry, category: Option<Category>) -> Scope {
        let mut child = self.clone();
        child.prefix = format!("{}{}/", self.prefix, entry.name.data.as_str());
        if category.is_some() {
            child.category = category;
        }
        collect_refs(&entry.induces, &mut child.induces);
        collect_refs(&entry.depends, &mut child.depends);
        child
    }
}

/// A tag's name plus its parameters, all referring to artifacts of the
/// same kind.
fn collect_refs(tags: &[Spanned<Tag>], out: &mut Vec<String>) {
    for tag in tags {
        out.push(tag.data.name.data.as_str().to_string());
        for param in &tag.data.params.data.vals {
            out.push(param.data.as_str().to_string());
        }
    }
}

/// The category selected by an entry's labels, if any. The last category
/// label wins; a label that names no category is an error.
fn category_of(entry: &Entry) -> ParseResult<Option<Category>> {
    let mut category = None;
    for label in &entry.labels {
        match Category::from_label(label.data.name.data.as_str()) {
            Some(c) => category = Some(c),
            None => {
                return Err(Diagnostic::new(
                    "Unknown Label",
                    format!(
                        "'{}' should be one of fig, bib, hdr, txt",
                        label.data.name.data.as_str()
                    ),
                )
                .with_span(label.span))
            }
        }
    }
    Ok(category)
}

/// Resolve every declared target of a parsed source file into a flat plan.
pub fn analyze(root: &Spanned<DefList>) -> ParseResult<Vec<Plan>> {
    let mut defs: HashMap<String, Vec<FileEntry>> = HashMap::new();
    let mut targets: Vec<(String, Span)> = Vec::new();
    for decl in &root.data.defs {
        match &decl.data {
            TopLevel::Def(def) => {
                let mut files = Vec::new();
                flatten_list(&def.value, &Scope::default(), &defs, &mut files)?;
                defs.insert(def.name.data.as_str().to_string(), files);
            }
            TopLevel::Target(target) => {
                targets.push((target.name.data.as_str().to_string(), target.name.span));
            }
        }
    }
    let mut plans = Vec::new();
    for (name, span) in targets {
        match defs.get(&name) {
            Some(files) => plans.push(Plan {
                name,
                files: files.clone(),
            }),
            None => {
                return Err(Diagnostic::new(
                    "Unknown Target",
                    format!("target '{}' names no definition", name),
                )
                .with_span(span))
            }
        }
    }
    Ok(plans)
}

fn flatten_list(
    list: &Spanned<ItemList>,
    scope: &Scope,
    defs: &HashMap<String, Vec<FileEntry>>,
    out: &mut Vec<FileEntry>,
) -> ParseResult<()> {
    for item in &list.data.items {
        match &item.data {
            ListItem::Expand(expand) => {
                let name = expand.name.data.as_str();
                let files = defs.get(name).ok_or_else(|| {
                    Diagnostic::new(
                        "Unknown Reference",
                        format!("'${}' refers to no previously bound definition", name),
                    )
                    .with_span(expand.name.span)
                })?;
                for file in files {
                    let mut file = file.clone();
                    file.path = format!("{}{}", scope.prefix, file.path);
                    file.induces.extend(scope.induces.iter().cloned());
                    file.depends.extend(scope.depends.iter().cloned());
                    out.push(file);
                }
            }
            ListItem::Item(item) => {
                let entry = &item.entry.data;
                let category = category_of(entry)?;
                match &item.tail {
                    Some(tail) => {
                        flatten_list(tail, &scope.child(entry, category), defs, out)?;
                    }
                    None => {
                        let mut induces = scope.induces.clone();
                        let mut depends = scope.depends.clone();
                        collect_refs(&entry.induces, &mut induces);
                        collect_refs(&entry.depends, &mut depends);
                        out.push(FileEntry {
                            path: format!("{}{}", scope.prefix, entry.name.data.as_str()),
                            category: category.or(scope.category).unwrap_or(Category::Text),
                            induces,
                            depends,
                            span: item.entry.span,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn plans_of(text: &str) -> Vec<Plan> {
        let root = parse(text).unwrap();
        analyze(&root).unwrap()
    }

    fn paths(plan: &Plan) -> Vec<&str> {
        plan.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_single_file_plan() {
        let plans = plans_of("$doc = intro.tex;\n[doc];");
        assert_eq!(plans.len(), 1);
        assert_eq!(paths(&plans[0]), ["intro.tex"]);
        assert_eq!(plans[0].files[0].category, Category::Text);
    }

    #[test]
    fn test_branch_prefixes_paths() {
        let plans = plans_of("$doc = chapters :: { one.tex, two.tex };\n[doc];");
        assert_eq!(paths(&plans[0]), ["chapters/one.tex", "chapters/two.tex"]);
    }

    #[test]
    fn test_category_labels() {
        let plans = plans_of("$doc = { a.tex, b.pdf:fig, c.bib:bib, d.tex:hdr };\n[doc];");
        let plan = &plans[0];
        let of = |c: Category| plan.files_in(c).map(|f| f.path.as_str()).collect::<Vec<_>>();
        assert_eq!(of(Category::Text), ["a.tex"]);
        assert_eq!(of(Category::Figure), ["b.pdf"]);
        assert_eq!(of(Category::Biblio), ["c.bib"]);
        assert_eq!(of(Category::Header), ["d.tex"]);
    }

    #[test]
    fn test_branch_category_is_inherited() {
        let plans = plans_of("$doc = figures:fig :: { a.pdf, b.pdf };\n[doc];");
        assert!(plans[0]
            .files
            .iter()
            .all(|f| f.category == Category::Figure));
    }

    #[test]
    fn test_leaf_label_overrides_inherited() {
        let plans = plans_of("$doc = figures:fig :: { a.pdf, notes.tex:txt };\n[doc];");
        let plan = &plans[0];
        assert_eq!(plan.files[0].category, Category::Figure);
        assert_eq!(plan.files[1].category, Category::Text);
    }

    #[test]
    fn test_refs_accumulate_down_branches() {
        let plans = plans_of("$doc = part<-macros :: { a.tex->out };\n[doc];");
        let file = &plans[0].files[0];
        assert_eq!(file.induces, ["macros"]);
        assert_eq!(file.depends, ["out"]);
    }

    #[test]
    fn test_tag_params_join_the_reference_list() {
        let plans = plans_of("$doc = a.tex->d(e,f);\n[doc];");
        assert_eq!(plans[0].files[0].depends, ["d", "e", "f"]);
    }

    #[test]
    fn test_expand_resolves_previous_def() {
        let plans = plans_of("$base = shared.tex;\n$doc = { $base, main.tex };\n[doc];");
        assert_eq!(paths(&plans[0]), ["shared.tex", "main.tex"]);
    }

    #[test]
    fn test_expand_under_branch_gets_the_prefix() {
        let plans = plans_of("$base = shared.tex;\n$doc = common :: $base;\n[doc];");
        assert_eq!(paths(&plans[0]), ["common/shared.tex"]);
    }

    #[test]
    fn test_dangling_expand_is_an_error() {
        let root = parse("$doc = $missing;\n[doc];").unwrap();
        let err = analyze(&root).unwrap_err();
        assert_eq!(err.kind, "Unknown Reference");
    }

    #[test]
    fn test_expand_is_not_resolved_forward() {
        let root = parse("$doc = $later;\n$later = a.tex;\n[doc];").unwrap();
        let err = analyze(&root).unwrap_err();
        assert_eq!(err.kind, "Unknown Reference");
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let root = parse("$doc = a.tex:mystery;\n[doc];").unwrap();
        let err = analyze(&root).unwrap_err();
        assert_eq!(err.kind, "Unknown Label");
    }

    #[test]
    fn test_target_without_def_is_an_error() {
        let root = parse("[ghost];").unwrap();
        let err = analyze(&root).unwrap_err();
        assert_eq!(err.kind, "Unknown Target");
    }

    #[test]
    fn test_later_binding_shadows_earlier() {
        let plans = plans_of("$doc = old.tex;\n$doc = new.tex;\n[doc];");
        assert_eq!(paths(&plans[0]), ["new.tex"]);
    }
}
