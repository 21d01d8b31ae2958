//! Interactive HTML pages.
//!
//! Two pages are produced:
//! - A collapsible call tree built from the stack map
//! - A wrapper page that embeds a rendered SVG flamegraph
//!
//! Both carry the report header as an information block.

use super::prepare_output_path;
use crate::aggregator::stack_builder::StackMap;
use crate::parser::schema::Header;
use crate::utils::error::OutputError;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the synthetic node above all stacks
pub const TREE_ROOT_NAME: &str = "root";

/// A node in the call tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,

    /// Events at or below this node
    pub count: u64,

    /// Sorted by count descending, then first appearance
    pub children: Vec<TreeNode>,
}

#[derive(Default)]
struct BuildNode {
    count: u64,
    children: IndexMap<String, BuildNode>,
}

impl BuildNode {
    fn into_tree(self, name: String, order: &HashMap<String, usize>) -> TreeNode {
        let mut children: Vec<TreeNode> = self
            .children
            .into_iter()
            .map(|(child_name, child)| child.into_tree(child_name, order))
            .collect();
        children.sort_by_key(|c| (Reverse(c.count), order.get(&c.name).copied().unwrap_or(usize::MAX)));

        TreeNode {
            name,
            count: self.count,
            children,
        }
    }
}

/// Build a call tree from a stack map
///
/// **Public** - input for [`write_tree_html`]
///
/// Every node's count is the sum over the stacks passing through it; the
/// root's count is the sum of its children.
pub fn stacks_to_tree(stacks: &StackMap) -> TreeNode {
    let mut root = BuildNode::default();
    let mut order: HashMap<String, usize> = HashMap::new();

    for (stack, count) in stacks.iter() {
        let mut node = &mut root;
        for frame in stack.split(';') {
            let next = order.len();
            order.entry(frame.to_string()).or_insert(next);
            node = node.children.entry(frame.to_string()).or_default();
            node.count += count;
        }
    }
    root.count = root.children.values().map(|c| c.count).sum();

    let tree = root.into_tree(TREE_ROOT_NAME.to_string(), &order);
    debug!("Built call tree with {} top-level nodes", tree.children.len());
    tree
}

/// Escape text for HTML element content and attribute values
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `1234567` -> `1,234,567`
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Header information block shared by both pages
fn info_block(header: &Header) -> String {
    let or_na = |v: &Option<String>| escape_html(v.as_deref().unwrap_or("N/A"));
    let items = [
        ("Command Line", format!("<code>{}</code>", or_na(&header.cmdline))),
        ("Architecture", or_na(&header.arch)),
        ("Event Type", or_na(&header.event)),
        ("Total Samples", group_thousands(header.total_samples)),
        ("Error Callchains", or_na(&header.error_callchains)),
        ("Total Event Count", group_thousands(header.event_count)),
        ("Events per Sample", format!("{:.2}", header.events_per_sample())),
    ];

    let mut block = String::from("<div class=\"info\">\n<h3>Simpleperf Report Information</h3>\n<ul>\n");
    for (label, value) in items {
        block.push_str(&format!("<li><strong>{}:</strong> {}</li>\n", label, value));
    }
    block.push_str("</ul>\n</div>");
    block
}

const TREE_TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<style>
body { font-family: Arial, sans-serif; font-size: 14px; }
.info { background: #f0f0f0; padding: 12px 16px; margin: 10px 0; border-radius: 5px; }
.info code { background: #e4e4e4; padding: 2px 4px; border-radius: 3px; }
#tree ul { list-style-type: none; margin-left: 18px; padding-left: 8px; }
#tree li > span { cursor: pointer; user-select: none; }
.count { color: #666; margin-left: 6px; font-size: 0.9em; }
.toggle { margin-right: 4px; font-family: monospace; }
</style>
</head>
<body>
<h2>{{TITLE}}</h2>
{{INFO}}
<p><button onclick="setAll(true)">Expand All</button> <button onclick="setAll(false)">Collapse All</button></p>
<div id="tree"></div>
<script>
const data = {{DATA}};
function pct(count) {
  return data.count > 0 ? (count / data.count * 100).toFixed(2) : '0.00';
}
function render(node) {
  const li = document.createElement('li');
  const label = document.createElement('span');
  const open = node.children.length > 0;
  if (open) {
    const toggle = document.createElement('span');
    toggle.className = 'toggle';
    toggle.textContent = '▼';
    label.appendChild(toggle);
  }
  label.appendChild(document.createTextNode(node.name));
  const count = document.createElement('span');
  count.className = 'count';
  count.textContent = '(' + node.count + ', ' + pct(node.count) + '%)';
  label.appendChild(count);
  li.appendChild(label);
  if (open) {
    const ul = document.createElement('ul');
    node.children.forEach(function (child) { ul.appendChild(render(child)); });
    li.appendChild(ul);
    label.onclick = function (e) {
      const hidden = ul.style.display === 'none';
      ul.style.display = hidden ? 'block' : 'none';
      label.firstChild.textContent = hidden ? '▼' : '▶';
      e.stopPropagation();
    };
  }
  return li;
}
function setAll(expanded) {
  document.querySelectorAll('#tree ul ul').forEach(function (ul) { ul.style.display = expanded ? 'block' : 'none'; });
  document.querySelectorAll('#tree .toggle').forEach(function (t) { t.textContent = expanded ? '▼' : '▶'; });
}
(function () {
  const ul = document.createElement('ul');
  ul.appendChild(render(data));
  document.getElementById('tree').appendChild(ul);
})();
</script>
</body>
</html>
"#;

const SVG_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{TITLE}}</title>
<style>
body { margin: 0; font-family: Arial, sans-serif; background: #fafafa; }
.header { padding: 12px 20px; background: #333; color: #fff; }
.controls, .info { margin: 10px 20px; }
.info { background: #f0f0f0; padding: 12px 16px; border-radius: 5px; }
.info code { background: #e4e4e4; padding: 2px 4px; border-radius: 3px; }
.frame { margin: 0 20px 20px; height: 80vh; border: 1px solid #ccc; background: #fff; }
.frame iframe { width: 100%; height: 100%; border: 0; }
</style>
</head>
<body>
<div class="header"><h1>{{TITLE}}</h1></div>
<div class="controls">
<button onclick="window.open('{{SVG}}', '_blank')">Open SVG</button>
<button onclick="toggleFullscreen()">Fullscreen</button>
</div>
{{INFO}}
<div class="frame"><iframe src="{{SVG}}" title="Flamegraph"></iframe></div>
<script>
function toggleFullscreen() {
  if (!document.fullscreenElement) {
    document.documentElement.requestFullscreen().catch(function () {});
  } else {
    document.exitFullscreen();
  }
}
</script>
</body>
</html>
"#;

/// Write the interactive call tree page
///
/// **Public** - main entry point for HTML tree output
///
/// # Arguments
/// * `tree` - Tree from [`stacks_to_tree`]
/// * `output_path` - Page to write
/// * `title` - Page title
/// * `header` - Report header shown in the information block
pub fn write_tree_html(
    tree: &TreeNode,
    output_path: impl AsRef<Path>,
    title: &str,
    header: &Header,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing HTML call tree to: {}", output_path.display());

    prepare_output_path(output_path)?;

    // Keep embedded names from closing the script element
    let data = serde_json::to_string(tree)?.replace("</", "<\\/");
    let page = TREE_TEMPLATE
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{INFO}}", &info_block(header))
        .replace("{{DATA}}", &data);

    std::fs::write(output_path, page)?;
    Ok(())
}

/// Path of the wrapper page for an SVG: `<svg base>_svg.html`
pub fn svg_page_path(svg_path: &Path) -> PathBuf {
    let stem = svg_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flamegraph".to_string());
    svg_path.with_file_name(format!("{}_svg.html", stem))
}

/// Write a page that embeds a rendered SVG next to the report information
///
/// **Public** - companion page for every rendered flamegraph
///
/// # Returns
/// Path of the written page
///
/// # Errors
/// * `OutputError::WriteFailed` - the page could not be written or came out empty
pub fn write_svg_page(svg_path: &Path, header: &Header) -> Result<PathBuf, OutputError> {
    let page_path = svg_page_path(svg_path);
    info!("Writing flamegraph page to: {}", page_path.display());

    prepare_output_path(&page_path)?;

    let svg_name = svg_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let page = SVG_PAGE_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&header.graph_title()))
        .replace("{{INFO}}", &info_block(header))
        .replace("{{SVG}}", &escape_html(&svg_name));

    std::fs::write(&page_path, page)?;
    if std::fs::metadata(&page_path)?.len() == 0 {
        return Err(OutputError::WriteFailed(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} is empty after writing", page_path.display()),
        )));
    }

    Ok(page_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, u64)]) -> StackMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_stacks_to_tree_counts() {
        let tree = stacks_to_tree(&map(&[("a;b", 3), ("a;c", 5), ("d", 1)]));

        assert_eq!(tree.name, "root");
        assert_eq!(tree.count, 9);
        assert_eq!(tree.children[0].name, "a");
        assert_eq!(tree.children[0].count, 8);

        let a_children: Vec<(&str, u64)> = tree.children[0]
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.count))
            .collect();
        assert_eq!(a_children, vec![("c", 5), ("b", 3)]);
    }

    #[test]
    fn test_stacks_to_tree_ties_keep_first_seen() {
        let tree = stacks_to_tree(&map(&[("x", 2), ("y", 2), ("z", 2)]));
        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_write_tree_html() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("tree.html");
        let header = Header {
            cmdline: Some("simpleperf record <app>".to_string()),
            total_samples: 10,
            event_count: 1000,
            ..Default::default()
        };
        let tree = stacks_to_tree(&map(&[("proc;</script>", 4)]));

        write_tree_html(&tree, &path, "report.folded", &header).unwrap();

        let page = std::fs::read_to_string(&path).unwrap();
        assert!(page.contains("<title>report.folded</title>"));
        assert!(page.contains("simpleperf record &lt;app&gt;"));
        assert!(page.contains("1,000"));
        assert!(page.contains("<\\/script>"));
        assert!(!page.contains("{{DATA}}"));
    }

    #[test]
    fn test_write_svg_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svg = temp_dir.path().join("report.svg");
        let header = Header {
            event: Some("cpu-cycles (type 0, config 0)".to_string()),
            ..Default::default()
        };

        let page_path = write_svg_page(&svg, &header).unwrap();

        assert_eq!(page_path, temp_dir.path().join("report_svg.html"));
        let page = std::fs::read_to_string(&page_path).unwrap();
        assert!(page.contains("cpu-cycles Flamegraph"));
        assert!(page.contains("src=\"report.svg\""));
    }
}
