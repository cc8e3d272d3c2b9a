// Tag filter - removes <think>...</think> reasoning spans from model output
//
// The streaming filter is a small state machine threaded through every
// fragment of a response. State is an explicit value passed in and returned,
// never hidden mutation, so each response stream owns an independent copy.
//
// Markers may be split across fragment boundaries ("a<thi" then "nk>..."), so
// the state carries a pending buffer holding a trailing partial marker until
// the next fragment decides whether it completes.

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

/// Whether the filter is currently inside an unterminated thinking span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Thinking,
}

/// Per-stream filter state
///
/// Created at stream start with `FilterState::default()`, updated once per
/// fragment, discarded when the stream ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub mode: Mode,
    /// Trailing partial marker withheld from output until the next fragment
    pending: String,
}

/// Filter one fragment of text, returning the retained portion and the
/// state to carry into the next fragment.
///
/// Empty or whitespace-only input yields empty output and unchanged state.
pub fn apply(text: &str, state: FilterState) -> (String, FilterState) {
    if text.trim().is_empty() {
        return (String::new(), state);
    }

    let mut input = state.pending;
    input.push_str(text);

    // The model sometimes wraps a JSON answer in a markdown fence; keep only
    // the fenced content. Anything outside the first fence pair is noise.
    if let Some(unwrapped) = unwrap_code_fence(&input) {
        input = unwrapped.to_string();
    }

    let mut out = String::new();
    let mut pending = String::new();
    let mut mode = state.mode;
    let mut rest = input.as_str();

    loop {
        match mode {
            Mode::Normal => {
                if let Some(i) = rest.find(OPEN_TAG) {
                    out.push_str(&rest[..i]);
                    rest = &rest[i + OPEN_TAG.len()..];
                    mode = Mode::Thinking;
                } else {
                    let held = partial_marker_len(rest, OPEN_TAG);
                    out.push_str(&rest[..rest.len() - held]);
                    pending = rest[rest.len() - held..].to_string();
                    break;
                }
            }
            Mode::Thinking => {
                if let Some(i) = rest.find(CLOSE_TAG) {
                    rest = &rest[i + CLOSE_TAG.len()..];
                    mode = Mode::Normal;
                } else {
                    // Everything here is thinking text; keep only a trailing
                    // partial close marker for the next fragment.
                    let held = partial_marker_len(rest, CLOSE_TAG);
                    pending = rest[rest.len() - held..].to_string();
                    break;
                }
            }
        }
    }

    (out, FilterState { mode, pending })
}

/// One-shot cleanup for buffered (non-streaming) responses.
///
/// Repeatedly strips the first `<think>...</think>` span until none remain,
/// collapses runs of blank lines to one, and trims. Idempotent.
pub fn strip_thinking(text: &str) -> String {
    let mut s = text.to_string();
    while let Some(start) = s.find(OPEN_TAG) {
        match s[start..].find(CLOSE_TAG) {
            Some(rel) => s.replace_range(start..start + rel + CLOSE_TAG.len(), ""),
            None => break, // unterminated span, leave as-is
        }
    }

    let mut out = String::with_capacity(s.len());
    let mut prev_blank = false;
    for line in s.lines() {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        prev_blank = blank;
    }
    out.trim().to_string()
}

/// Content strictly between the first complete ``` fence pair, trimmed.
/// Returns None when there is no fence or the fence is unterminated.
fn unwrap_code_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let body = &text[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Length of the longest proper prefix of `marker` that ends `text`
fn partial_marker_len(text: &str, marker: &str) -> usize {
    let max = marker.len().min(text.len() + 1).saturating_sub(1);
    (1..=max)
        .rev()
        .find(|&k| text.ends_with(&marker[..k]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> String {
        let mut state = FilterState::default();
        let mut out = String::new();
        for frag in fragments {
            let (kept, next) = apply(frag, state);
            out.push_str(&kept);
            state = next;
        }
        out
    }

    #[test]
    fn passes_plain_text_through() {
        let (out, state) = apply("hello world", FilterState::default());
        assert_eq!(out, "hello world");
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn empty_and_whitespace_input_yield_empty_output() {
        let thinking = FilterState {
            mode: Mode::Thinking,
            pending: String::new(),
        };
        let (out, state) = apply("", thinking.clone());
        assert_eq!(out, "");
        assert_eq!(state, thinking);

        let (out, state) = apply("  \n ", FilterState::default());
        assert_eq!(out, "");
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn removes_span_within_one_fragment() {
        assert_eq!(run(&["x<think>secret</think>y"]), "xy");
    }

    #[test]
    fn removes_span_crossing_fragment_boundary() {
        assert_eq!(run(&["a<thi", "nk>secret</think>b"]), "ab");
    }

    #[test]
    fn tracks_split_close_marker() {
        assert_eq!(run(&["a<think>secret</th", "ink>b"]), "ab");
    }

    #[test]
    fn fragment_fully_inside_thinking_is_dropped() {
        assert_eq!(run(&["<think>", "all reasoning here", "</think>done"]), "done");
    }

    #[test]
    fn false_partial_marker_is_released() {
        // "<th" looks like a marker prefix but the next fragment disproves it
        assert_eq!(run(&["a<th", "ree>b"]), "a<three>b");
    }

    #[test]
    fn multiple_spans_in_one_fragment() {
        assert_eq!(run(&["a<think>x</think>b<think>y</think>c"]), "abc");
    }

    #[test]
    fn open_without_close_discards_tail() {
        let (out, state) = apply("keep<think>drop", FilterState::default());
        assert_eq!(out, "keep");
        assert_eq!(state.mode, Mode::Thinking);
    }

    #[test]
    fn unwraps_json_code_fence() {
        let (out, _) = apply("```json\n{\"x\":1}\n```", FilterState::default());
        assert_eq!(out, "{\"x\":1}");
    }

    #[test]
    fn unwraps_plain_fence_and_drops_surrounding_text() {
        let (out, _) = apply("noise ```\nanswer\n``` more noise", FilterState::default());
        assert_eq!(out, "answer");
    }

    #[test]
    fn unterminated_fence_left_alone() {
        let (out, _) = apply("```json\n{\"x\":1}", FilterState::default());
        assert_eq!(out, "```json\n{\"x\":1}");
    }

    #[test]
    fn strip_thinking_removes_all_spans() {
        let input = "a<think>one</think>b\n<think>two</think>c";
        assert_eq!(strip_thinking(input), "ab\nc");
    }

    #[test]
    fn strip_thinking_collapses_blank_lines_and_trims() {
        let input = "head<think>gone</think>\n\n\n\ntail\n";
        assert_eq!(strip_thinking(input), "head\n\ntail");
    }

    #[test]
    fn strip_thinking_is_idempotent() {
        let inputs = [
            "plain",
            "a<think>x</think>b",
            "a\n\n\nb<think>c</think>",
            "<think>only</think>",
            "dangling<think>open",
        ];
        for input in inputs {
            let once = strip_thinking(input);
            assert_eq!(strip_thinking(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn strip_thinking_leaves_unterminated_span() {
        assert_eq!(strip_thinking("a<think>b"), "a<think>b");
    }
}
