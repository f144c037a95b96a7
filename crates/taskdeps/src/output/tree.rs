//! Hierarchy rendering for `taskdeps hierarchy` output.
//!
//! A hierarchy is a DAG flattened into levels; each node carries the path
//! that first reached it. The tree shows every node exactly once, under the
//! second-to-last task of its path.

use std::collections::BTreeMap;
use std::io::{self, Write};

use super::color::{bold, colorize_id, dimmed};
use super::OutputConfig;
use crate::domain::{HierarchyNode, TaskId};

/// Print a hierarchy with ASCII/Unicode connectors.
///
/// Renders a tree like:
/// ```text
/// ◆ deploy
/// ├── build (level 1)
/// │   └── compile (level 2)
/// └── test (level 1)
/// ```
pub fn write_hierarchy<W: Write>(
    w: &mut W,
    nodes: &[HierarchyNode],
    config: &OutputConfig,
) -> io::Result<()> {
    let Some(root) = nodes.first() else {
        return Ok(());
    };

    let root_icon = if config.use_ascii { "*" } else { "◆" };
    writeln!(
        w,
        "{} {}",
        bold(root_icon, config),
        colorize_id(root.id.as_str(), config)
    )?;

    let children = children_by_parent(&nodes[1..]);
    write_children(w, &root.id, &children, &mut Vec::new(), config)
}

/// Group nodes under their parent, keeping input order within a group.
fn children_by_parent(nodes: &[HierarchyNode]) -> BTreeMap<&TaskId, Vec<&HierarchyNode>> {
    let mut children: BTreeMap<&TaskId, Vec<&HierarchyNode>> = BTreeMap::new();
    for node in nodes {
        if let Some(parent) = node.path.len().checked_sub(2).and_then(|i| node.path.get(i)) {
            children.entry(parent).or_default().push(node);
        }
    }
    children
}

/// `has_more` tracks which ancestor levels still have siblings below, used
/// to draw the vertical continuation lines.
fn write_children<W: Write>(
    w: &mut W,
    parent: &TaskId,
    children: &BTreeMap<&TaskId, Vec<&HierarchyNode>>,
    has_more: &mut Vec<bool>,
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    let Some(nodes) = children.get(parent) else {
        return Ok(());
    };

    for (i, node) in nodes.iter().enumerate() {
        let is_last = i + 1 == nodes.len();

        let mut prefix = String::new();
        for &more in has_more.iter() {
            prefix.push_str(&dimmed(if more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);

        writeln!(
            w,
            "{prefix}{connector}{} {}",
            colorize_id(node.id.as_str(), config),
            dimmed(&format!("(level {})", node.level), config)
        )?;

        has_more.push(!is_last);
        write_children(w, &node.id, children, has_more, config)?;
        has_more.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &[&str]) -> HierarchyNode {
        HierarchyNode {
            id: TaskId::new(*path.last().unwrap()),
            level: path.len() - 1,
            path: path.iter().map(|s| TaskId::new(*s)).collect(),
        }
    }

    fn render(nodes: &[HierarchyNode], use_ascii: bool) -> String {
        let mut buf = Vec::new();
        write_hierarchy(&mut buf, nodes, &OutputConfig::new(use_ascii, false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_render_nested_tree() {
        let nodes = vec![
            node(&["deploy"]),
            node(&["deploy", "build"]),
            node(&["deploy", "test"]),
            node(&["deploy", "build", "compile"]),
        ];

        let expected = "\
◆ deploy
├── build (level 1)
│   └── compile (level 2)
└── test (level 1)
";
        assert_eq!(render(&nodes, false), expected);
    }

    #[test]
    fn test_render_ascii_connectors() {
        let nodes = vec![
            node(&["a"]),
            node(&["a", "b"]),
            node(&["a", "c"]),
            node(&["a", "c", "d"]),
        ];

        let expected = "\
* a
|-- b (level 1)
`-- c (level 1)
    `-- d (level 2)
";
        assert_eq!(render(&nodes, true), expected);
    }

    #[test]
    fn test_render_single_root() {
        assert_eq!(render(&[node(&["solo"])], false), "◆ solo\n");
        assert_eq!(render(&[], false), "");
    }
}
