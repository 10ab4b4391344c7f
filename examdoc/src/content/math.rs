//! LaTeX preprocessing shared by every math path (live typesetter, string
//! renderer, graph labels).

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\placeholder(?:\[[^\]]*\])?(?:\{[^{}]*\})?").expect("placeholder regex")
});

static BIG_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\\(?:sum|prod|coprod|bigcup|bigcap|bigsqcup|bigvee|bigwedge|bigodot|bigotimes|bigoplus|biguplus|lim)",
    )
    .expect("big operator regex")
});

const BLANK_BOX: &str = r"\boxed{\quad}";

/// A formula ready for a typesetting engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedMath {
    pub tex: String,
    /// Block (display) rendering; limits go above/below operators.
    pub display: bool,
}

impl PreparedMath {
    /// The formula wrapped in the delimiters a page-level typesetter scans for.
    pub fn delimited(&self) -> String {
        if self.display {
            format!("$${}$$", self.tex)
        } else {
            format!("${}$", self.tex)
        }
    }
}

/// Start offsets (just past the command name) of big operators in `tex`.
/// `\lim` inside `\limsup` or `\limits` does not count.
fn big_operator_ends(tex: &str) -> Vec<usize> {
    BIG_OPERATOR
        .find_iter(tex)
        .filter(|m| {
            !tex[m.end()..]
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic())
        })
        .map(|m| m.end())
        .collect()
}

pub fn needs_display(tex: &str) -> bool {
    !big_operator_ends(tex).is_empty()
}

/// Placeholders become a boxed blank; big operators force display mode with
/// `\displaystyle` and `\limits` added where missing.
pub fn prepare_math(latex: &str) -> PreparedMath {
    let tex = PLACEHOLDER.replace_all(latex.trim(), NoExpand(BLANK_BOX)).into_owned();
    let ends = big_operator_ends(&tex);
    if ends.is_empty() {
        return PreparedMath { tex, display: false };
    }

    let mut out = String::with_capacity(tex.len() + 16 + ends.len() * 7);
    if !tex.contains(r"\displaystyle") {
        out.push_str(r"\displaystyle ");
    }
    let mut last = 0;
    for end in ends {
        out.push_str(&tex[last..end]);
        let rest = tex[end..].trim_start();
        if !(rest.starts_with(r"\limits") || rest.starts_with(r"\nolimits")) {
            out.push_str(r"\limits");
        }
        last = end;
    }
    out.push_str(&tex[last..]);
    PreparedMath { tex: out, display: true }
}
