//! ASCII directory-tree parsing.

use crate::model::DirectoryTree;

/// Glyphs that mark a tree diagram.
const TREE_GLYPHS: &[&str] = &["├──", "└──", "│"];

/// Extension-less file names accepted as files.
const BARE_FILES: &[&str] = &["README", "LICENSE", "Dockerfile", "Makefile"];

fn is_glyph(c: char) -> bool {
    matches!(c, '├' | '└' | '│' | '─') || c.is_whitespace()
}

/// Returns true if `text` looks like a tree diagram.
#[must_use]
pub fn has_tree_glyphs(text: &str) -> bool {
    TREE_GLYPHS.iter().any(|g| text.contains(g))
}

/// Parses a tree diagram into a [`DirectoryTree`].
///
/// Nesting is the character width of the leading glyph prefix divided by
/// four. Entries whose parent cannot be located are attached to the deepest
/// ancestor that exists.
#[must_use]
pub fn parse_tree(text: &str) -> DirectoryTree {
    let mut root = DirectoryTree::new();
    let mut path: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        let indent = line.chars().take_while(|c| is_glyph(*c)).count();
        let level = indent / 4;

        let stripped: String = line.chars().skip(indent).collect();
        let stripped = stripped.trim();
        if stripped.is_empty() || stripped.starts_with('#') || stripped.starts_with("//") {
            continue;
        }

        let mut clean = stripped.to_string();
        if let Some(re) = regex!(r"\s*\(.*?\)\s*$") {
            clean = re.replace(&clean, "").into_owned();
        }
        if let Some(re) = regex!(r"\s*#.*$") {
            clean = re.replace(&clean, "").into_owned();
        }
        let clean: String = clean
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
            .collect();
        if clean.is_empty() {
            continue;
        }

        path.truncate(level);

        if let Some(dir) = clean.strip_suffix('/') {
            let dir = dir.trim_end_matches('/');
            if is_valid_dir_name(dir) {
                insert_at(&mut root, &path, dir.to_string(), Some(DirectoryTree::new()));
                path.push(dir.to_string());
            }
        } else if is_valid_file_name(&clean) {
            insert_at(&mut root, &path, clean, None);
        }
    }

    root
}

fn is_valid_dir_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let core: String = name.chars().filter(|c| !matches!(c, '.' | '_' | '-')).collect();
    (!core.is_empty() && core.chars().all(char::is_alphanumeric)) || name.starts_with('.')
}

fn is_valid_file_name(name: &str) -> bool {
    (name.contains('.') && name.len() < 100) || BARE_FILES.contains(&name)
}

fn insert_at(tree: &mut DirectoryTree, path: &[String], name: String, node: Option<DirectoryTree>) {
    if let Some((head, rest)) = path.split_first() {
        if let Some(Some(child)) = tree.0.get_mut(head) {
            insert_at(child, rest, name, node);
            return;
        }
        insert_at(tree, rest, name, node);
        return;
    }
    // A directory never replaces an existing directory's contents.
    if node.is_some() && matches!(tree.0.get(&name), Some(Some(_))) {
        return;
    }
    tree.0.insert(name, node);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TREE: &str = "\
iabank/
├── backend/
│   ├── src/
│   │   ├── core/            # shared base models
│   │   │   ├── models.py
│   │   │   └── apps.py
│   │   └── settings.py (Django settings)
│   └── manage.py
├── README.md
├── Dockerfile
└── .github/
    └── workflows/
        └── ci.yml
";

    #[test]
    fn detects_glyphs() {
        assert!(has_tree_glyphs(TREE));
        assert!(!has_tree_glyphs("pip install django"));
    }

    #[test]
    fn parses_nested_layout() {
        let tree = parse_tree(TREE);
        let paths = tree.paths();
        for expected in [
            "iabank/",
            "iabank/backend/",
            "iabank/backend/src/core/models.py",
            "iabank/backend/src/core/apps.py",
            "iabank/backend/src/settings.py",
            "iabank/backend/manage.py",
            "iabank/README.md",
            "iabank/Dockerfile",
            "iabank/.github/workflows/ci.yml",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}: {paths:?}");
        }
    }

    #[test]
    fn strips_comments_and_descriptions() {
        let tree = parse_tree("root/\n├── core/  # app\n└── notes.txt (scratch)\n");
        assert_eq!(tree.paths(), vec!["root/", "root/core/", "root/notes.txt"]);
    }

    #[test]
    fn rejects_extensionless_noise() {
        let tree = parse_tree("root/\n├── something\n└── LICENSE\n");
        assert_eq!(tree.paths(), vec!["root/", "root/LICENSE"]);
    }
}
