use regex::Regex;
use std::sync::OnceLock;

fn source_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*# SOURCE LINE (\d+)").expect("source line marker regex"))
}

/// Map compiled template lines to template lines.
///
/// Entry `i` of the result is the template line for compiled line `i`
/// (1-based, entry 0 is a placeholder): the number of the most recent
/// `# SOURCE LINE <n>` marker at or above it, or 0 before the first marker.
pub fn line_map(compiled: &str) -> Vec<usize> {
    let mut map = vec![0];
    let mut current = 0;
    for line in compiled.lines() {
        if let Some(caps) = source_line_regex().captures(line) {
            if let Ok(number) = caps[1].parse() {
                current = number;
            }
        }
        map.push(current);
    }
    map
}
