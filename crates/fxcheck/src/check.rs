//! Static checks run against a pack without a GPU: both stages must be
//! readable and non-empty, each must define `main`, and every uniform default
//! in the manifest must be declared by one of the stages.

use std::collections::BTreeSet;

use postfx::StageKind;
use shaderpack::LocalPack;

/// Removes `//` and `/* */` comments and collapses whitespace runs to one
/// space.
fn normalise(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut pending_space = false;
    while let Some(ch) = chars.next() {
        let ch = match (ch, chars.peek().copied()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                ' '
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                ' '
            }
            (ch, _) => ch,
        };
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

pub fn declares_main(source: &str) -> bool {
    let code = normalise(source);
    code.contains("void main(") || code.contains("void main (")
}

const PRECISIONS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Names declared with `uniform <type> a, b[2], c;` statements.
pub fn declared_uniforms(source: &str) -> BTreeSet<String> {
    let code = normalise(source);
    let mut names = BTreeSet::new();
    for statement in code.split([';', '{', '}']) {
        let mut words = statement.trim().split(' ');
        if !words.by_ref().any(|word| word == "uniform") {
            continue;
        }
        let mut rest = words.skip_while(|word| PRECISIONS.contains(word));
        let _ty = rest.next();
        let declarators = rest.collect::<Vec<_>>().join(" ");
        for declarator in declarators.split(',') {
            let name = declarator
                .split(['[', '='])
                .next()
                .unwrap_or_default()
                .trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }
    names
}

/// Problems found in `pack`; empty when it is usable.
pub fn check_pack(pack: &LocalPack) -> Vec<String> {
    let mut issues = Vec::new();
    let mut declared = BTreeSet::new();
    let mut unreadable = false;
    for stage in [StageKind::Vertex, StageKind::Fragment] {
        match pack.read_stage(stage) {
            Ok(source) if source.trim().is_empty() => {
                issues.push(format!("{stage} stage is empty"));
            }
            Ok(source) => {
                if !declares_main(&source) {
                    issues.push(format!("{stage} stage does not define `void main()`"));
                }
                declared.extend(declared_uniforms(&source));
            }
            Err(err) => {
                unreadable = true;
                issues.push(err.to_string());
            }
        }
    }
    if !unreadable {
        for name in pack.manifest().uniforms.keys() {
            if !declared.contains(name) {
                issues.push(format!("default for uniform '{name}' but no stage declares it"));
            }
        }
    }
    issues
}
