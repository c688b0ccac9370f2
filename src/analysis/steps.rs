//! Parsing canonical algorithm steps from spec markdown content.

use std::sync::LazyLock;

use regex::Regex;

/// A single step in a spec algorithm, with its nested sub-steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmStep {
    /// Hierarchical step number, e.g. `[5, 1]` for step 5.1.
    pub number: Vec<u32>,
    /// Plain text, markdown formatting stripped.
    pub text: String,
    /// Nested sub-steps.
    pub children: Vec<AlgorithmStep>,
}

static STEP_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( *)\d+\.\s").unwrap_or_else(|e| unreachable_regex(e)));
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap_or_else(|e| unreachable_regex(e)));
static MD_BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]*)\*\*").unwrap_or_else(|e| unreachable_regex(e)));
static MD_ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]*)\*").unwrap_or_else(|e| unreachable_regex(e)));
static MD_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").unwrap_or_else(|e| unreachable_regex(e)));

#[cold]
fn unreachable_regex(e: regex::Error) -> Regex {
    unreachable!("static pattern failed to compile: {e}")
}

/// Strip markdown inline formatting (links, bold, italic, code spans),
/// keeping their text content. Applied in link, bold, italic, code order so
/// that, e.g., a bold span inside link text survives intact.
#[must_use]
pub fn strip_markdown(text: &str) -> String {
    let text = MD_LINK_RE.replace_all(text, "$1");
    let text = MD_BOLD_RE.replace_all(&text, "$1");
    let text = MD_ITALIC_RE.replace_all(&text, "$1");
    MD_CODE_RE.replace_all(&text, "$1").into_owned()
}

struct ParsedStepLine {
    indent: usize,
    text: String,
}

/// Parse a numbered list line into its indentation level (in 4-space units)
/// and text. The literal number is discarded: step numbers are assigned
/// positionally during tree construction, never read from the markdown.
fn parse_step_line(line: &str) -> Option<ParsedStepLine> {
    let m = STEP_LINE_RE.find(line)?;
    let leading_spaces = line.len() - line.trim_start_matches(' ').len();
    let indent = leading_spaces / 4;
    let rest = &line[m.end()..];
    let text = rest.trim().to_string();
    Some(ParsedStepLine { indent, text })
}

struct RawStep {
    indent: usize,
    text: String,
}

/// Accumulate continuation lines (non-blank, deeper-indented, not `>`/`*`
/// prefixed) following a step line into its text.
fn collect_step(lines: &[&str], start: usize, indent: usize, mut text: String) -> (usize, String) {
    let step_indent_cols = indent * 4;
    let mut j = start;
    while j < lines.len() {
        let next_line = lines[j];
        if next_line.trim().is_empty() {
            j += 1;
            continue;
        }
        if parse_step_line(next_line).is_some() {
            break;
        }
        let stripped = next_line.trim_start();
        let next_indent_cols = next_line.len() - stripped.len();
        if next_indent_cols > step_indent_cols && !stripped.starts_with('>') && !stripped.starts_with('*')
        {
            text.push(' ');
            text.push_str(stripped);
        } else {
            break;
        }
        j += 1;
    }
    (j, text)
}

/// A mutable handle to a sibling list being built, used to thread a
/// depth-indexed stack through tree construction without re-borrowing issues.
struct StackFrame {
    indent: usize,
    /// Index path identifying this frame's step list within the tree, empty
    /// for the root list.
    path: Vec<usize>,
}

/// Parse algorithm steps from markdown content.
///
/// Expects the `content` field of a [`crate::provider::SectionRecord`], which
/// contains numbered lists at various indentation levels representing
/// algorithm steps. Step numbers are assigned purely by position (depth-first,
/// 1-based per sibling group) — the literal digits in the markdown are never
/// trusted, since editors often renumber lists inconsistently.
#[must_use]
pub fn parse_steps(content: &str) -> Vec<AlgorithmStep> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut raw_steps: Vec<RawStep> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if let Some(parsed) = parse_step_line(lines[i]) {
            let (next_i, text) = collect_step(&lines, i + 1, parsed.indent, parsed.text);
            raw_steps.push(RawStep {
                indent: parsed.indent,
                text,
            });
            i = next_i;
        } else {
            i += 1;
        }
    }

    build_tree(&raw_steps)
}

/// Build the step hierarchy from a flat, indentation-tagged list.
///
/// Mirrors the original implementation's stack-based approach: a stack of
/// `(indent, step_list)` frames, popped whenever the next raw step's indent is
/// not strictly deeper than the frame on top.
fn build_tree(raw_steps: &[RawStep]) -> Vec<AlgorithmStep> {
    let mut roots: Vec<AlgorithmStep> = Vec::new();
    let mut stack: Vec<StackFrame> = vec![StackFrame {
        indent: usize::MAX,
        path: Vec::new(),
    }];

    for raw in raw_steps {
        while stack.len() > 1 {
            let Some(top) = stack.last() else { break };
            if top.indent >= raw.indent {
                stack.pop();
            } else {
                break;
            }
        }

        let parent_path = stack.last().map_or_else(Vec::new, |f| f.path.clone());
        let new_step = AlgorithmStep {
            number: Vec::new(),
            text: strip_markdown(&raw.text),
            children: Vec::new(),
        };
        let inserted_index = insert_at_path(&mut roots, &parent_path, new_step);

        let mut child_path = parent_path;
        child_path.push(inserted_index);
        stack.push(StackFrame {
            indent: raw.indent,
            path: child_path,
        });
    }

    assign_numbers(&mut roots, &[]);
    roots
}

/// Push `step` onto the step list addressed by `path` (empty path = root
/// list) and return its index within that list.
///
/// The root stack frame uses `usize::MAX` as a stand-in for the original's
/// `-1` sentinel indent: it never compares `>=` to a real 0-based indent, so
/// it is never popped.
fn insert_at_path(roots: &mut Vec<AlgorithmStep>, path: &[usize], step: AlgorithmStep) -> usize {
    let mut list = roots;
    for &idx in path {
        list = &mut list.get_mut(idx).expect("path built from own insertions").children;
    }
    list.push(step);
    list.len() - 1
}

/// Assign hierarchical step numbers based on tree position, 1-based per
/// sibling group.
fn assign_numbers(steps: &mut [AlgorithmStep], prefix: &[u32]) {
    for (i, step) in steps.iter_mut().enumerate() {
        let mut number = prefix.to_vec();
        number.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
        let child_prefix = number.clone();
        step.number = number;
        assign_numbers(&mut step.children, &child_prefix);
    }
}

/// Find a step by its hierarchical number path, e.g. `[5, 1]` for step 5.1.
#[must_use]
pub fn find_step<'a>(steps: &'a [AlgorithmStep], number: &[u32]) -> Option<&'a AlgorithmStep> {
    if number.is_empty() {
        return None;
    }
    let mut current = steps;
    let mut target = None;
    for &n in number {
        if n < 1 {
            return None;
        }
        let idx = usize::try_from(n - 1).ok()?;
        let step = current.get(idx)?;
        target = Some(step);
        current = &step.children;
    }
    target
}

/// Flatten a step tree into a list, depth-first pre-order.
#[must_use]
pub fn flatten_steps(steps: &[AlgorithmStep]) -> Vec<&AlgorithmStep> {
    let mut result = Vec::new();
    flatten_into(steps, &mut result);
    result
}

fn flatten_into<'a>(steps: &'a [AlgorithmStep], out: &mut Vec<&'a AlgorithmStep>) {
    for step in steps {
        out.push(step);
        flatten_into(&step.children, out);
    }
}
