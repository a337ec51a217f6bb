//! file: core/src/lower/template.rs
//! description: the substitution-template DSL.
//!
//! Library templates are parsed once with the `pest` grammar in
//! `template.pest` into a list of typed tokens. Rendering checks the
//! bindings both ways: a placeholder without a binding is an error, and a
//! binding no placeholder consumed is reported (and rejected in strict
//! mode).

use log::warn;
use pest::Parser;
use pest_derive::Parser;

use super::err::{LowerResult, LoweringError};

#[derive(Parser)]
#[grammar = "lower/template.pest"]
struct TemplateParser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    /// `#L`
    Receiver,
    /// `#A<n>`
    Arg(usize),
    /// `#AA`
    AllArgs,
    /// `#I`
    Info,
    /// `#ASS`
    Assigned,
    /// `#NOL`
    NoReceiver,
    /// `#PRENOL`
    DropPrefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<Token>,
}

/// Piece of lowered text that may still contain the assignment hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Hole,
}

/// Lowered text with zero or more assignment holes. Assignment targets are
/// lowered into a fragment first; the assigned value is filled in last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pieces: Vec<Piece>,
}

impl Fragment {
    pub fn text(s: impl Into<String>) -> Self {
        Fragment { pieces: vec![Piece::Text(s.into())] }
    }

    pub fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        match self.pieces.last_mut() {
            Some(Piece::Text(t)) => t.push_str(s),
            _ => self.pieces.push(Piece::Text(s.to_string())),
        }
    }

    pub fn push_hole(&mut self) {
        self.pieces.push(Piece::Hole);
    }

    pub fn append(&mut self, other: Fragment) {
        for p in other.pieces {
            match p {
                Piece::Text(t) => self.push_str(&t),
                Piece::Hole => self.push_hole(),
            }
        }
    }

    pub fn has_hole(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Hole))
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
    }

    /// Replace every hole with `value`.
    pub fn fill(&self, value: &str) -> String {
        let mut out = String::new();
        for p in &self.pieces {
            match p {
                Piece::Text(t) => out.push_str(t),
                Piece::Hole => out.push_str(value),
            }
        }
        out
    }

    /// The text of a fragment that must not contain a hole.
    pub fn into_text(self, issuer: &str) -> LowerResult<String> {
        if self.has_hole() {
            return Err(LoweringError::template(
                "assignment placeholder rendered outside an assignment".to_string(),
                issuer,
            ));
        }
        Ok(self.fill(""))
    }
}

/// One rendered call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArg {
    pub text: String,
    /// False for arguments filled from a parameter default; those may go
    /// unused without a report.
    pub explicit: bool,
}

impl TemplateArg {
    pub fn explicit(text: impl Into<String>) -> Self {
        TemplateArg { text: text.into(), explicit: true }
    }

    pub fn defaulted(text: impl Into<String>) -> Self {
        TemplateArg { text: text.into(), explicit: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assigned<'a> {
    Value(&'a str),
    Hole,
}

#[derive(Debug, Clone, Default)]
pub struct Bindings<'a> {
    pub receiver: Option<&'a str>,
    pub args: &'a [TemplateArg],
    pub info: Option<&'a str>,
    pub assigned: Option<Assigned<'a>>,
}

impl Template {
    pub fn parse(source: &str) -> LowerResult<Template> {
        let issuer = "trellis.lower.template.parse";
        let mut pairs = TemplateParser::parse(Rule::template, source)
            .map_err(|e| LoweringError::template(format!("malformed template `{}`: {}", source, e), issuer))?;
        let root = pairs
            .next()
            .ok_or_else(|| LoweringError::template(format!("empty parse for template `{}`", source), issuer))?;

        let mut tokens: Vec<Token> = Vec::new();
        for pair in root.into_inner() {
            let token = match pair.as_rule() {
                Rule::assigned => Token::Assigned,
                Rule::drop_prefix => Token::DropPrefix,
                Rule::no_receiver => Token::NoReceiver,
                Rule::all_args => Token::AllArgs,
                Rule::receiver => Token::Receiver,
                Rule::info => Token::Info,
                Rule::arg => {
                    let digits = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                    let index = digits.parse::<usize>().map_err(|e| {
                        LoweringError::template(format!("bad argument index in `{}`: {}", source, e), issuer)
                    })?;
                    Token::Arg(index)
                }
                Rule::text | Rule::hash => {
                    let s = pair.as_str();
                    if let Some(Token::Text(prev)) = tokens.last_mut() {
                        prev.push_str(s);
                        continue;
                    }
                    Token::Text(s.to_string())
                }
                Rule::EOI => continue,
                other => {
                    return Err(LoweringError::template(
                        format!("unexpected rule {:?} in template `{}`", other, source),
                        issuer,
                    ));
                }
            };
            tokens.push(token);
        }
        Ok(Template { source: source.to_string(), tokens })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn uses_receiver(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Receiver))
    }

    pub fn uses_info(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Info))
    }

    pub fn uses_assigned(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Assigned))
    }

    /// Render with the given bindings. `strict` turns unused bindings into
    /// errors.
    pub fn render(&self, bindings: &Bindings<'_>, strict: bool) -> LowerResult<Fragment> {
        let issuer = "trellis.lower.template.render";
        let missing = |what: &str| {
            LoweringError::template(format!("template `{}` uses {} but none was supplied", self.source, what), issuer)
        };

        let mut out = Fragment::default();
        let mut receiver_used = false;
        let mut all_args_used = false;
        let mut args_used = vec![false; bindings.args.len()];

        for token in &self.tokens {
            match token {
                Token::Text(t) => out.push_str(t),
                Token::Receiver => {
                    out.push_str(bindings.receiver.ok_or_else(|| missing("a receiver (#L)"))?);
                    receiver_used = true;
                }
                Token::Arg(i) => {
                    let arg = bindings.args.get(*i).ok_or_else(|| missing(&format!("argument #A{}", i)))?;
                    out.push_str(&arg.text);
                    args_used[*i] = true;
                }
                Token::AllArgs => {
                    let joined: Vec<&str> = bindings.args.iter().map(|a| a.text.as_str()).collect();
                    out.push_str(&joined.join(", "));
                    all_args_used = true;
                }
                Token::Info => out.push_str(bindings.info.ok_or_else(|| missing("generic info (#I)"))?),
                Token::Assigned => match bindings.assigned.ok_or_else(|| missing("an assigned value (#ASS)"))? {
                    Assigned::Value(v) => out.push_str(v),
                    Assigned::Hole => out.push_hole(),
                },
                Token::NoReceiver => receiver_used = true,
                Token::DropPrefix => {
                    out.clear();
                    receiver_used = true;
                }
            }
        }

        let mut unused: Vec<String> = Vec::new();
        if bindings.receiver.is_some() && !receiver_used {
            unused.push("receiver".to_string());
        }
        if !all_args_used {
            for (i, arg) in bindings.args.iter().enumerate() {
                if arg.explicit && !args_used[i] {
                    unused.push(format!("argument {}", i));
                }
            }
        }
        if !unused.is_empty() {
            let msg = format!("template `{}` left {} unused", self.source, unused.join(", "));
            if strict {
                return Err(LoweringError::template(msg, issuer));
            }
            warn!("{}", msg);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_placeholder() {
        let t = Template::parse("#L.f(#I, #A0, #AA) = #ASS#NOL#PRENOL").expect("parse");
        assert_eq!(
            t.tokens(),
            &[
                Token::Receiver,
                Token::Text(".f(".into()),
                Token::Info,
                Token::Text(", ".into()),
                Token::Arg(0),
                Token::Text(", ".into()),
                Token::AllArgs,
                Token::Text(") = ".into()),
                Token::Assigned,
                Token::NoReceiver,
                Token::DropPrefix,
            ]
        );
    }

    #[test]
    fn lone_hash_is_text() {
        let t = Template::parse("a # b").expect("parse");
        assert_eq!(t.tokens(), &[Token::Text("a # b".into())]);
    }

    #[test]
    fn misspelled_placeholder_is_rejected() {
        assert!(Template::parse("#Q0").is_err());
        assert!(Template::parse("#Ax").is_err());
    }

    #[test]
    fn hole_survives_rendering() {
        let t = Template::parse("#L.set(#A0, #ASS)").expect("parse");
        let args = [TemplateArg::explicit("k")];
        let b = Bindings { receiver: Some("m"), args: &args, info: None, assigned: Some(Assigned::Hole) };
        let f = t.render(&b, true).expect("render");
        assert!(f.has_hole());
        assert_eq!(f.fill("v"), "m.set(k, v)");
    }

    #[test]
    fn missing_argument_is_an_error() {
        let t = Template::parse("#A2").expect("parse");
        let args = [TemplateArg::explicit("a")];
        let b = Bindings { args: &args, ..Default::default() };
        assert!(t.render(&b, false).is_err());
    }

    #[test]
    fn unused_binding_only_fails_in_strict_mode() {
        let t = Template::parse("#A0").expect("parse");
        let args = [TemplateArg::explicit("a"), TemplateArg::explicit("b")];
        let b = Bindings { args: &args, ..Default::default() };
        assert!(t.render(&b, false).is_ok());
        assert!(t.render(&b, true).is_err());

        let args = [TemplateArg::explicit("a"), TemplateArg::defaulted("b")];
        let b = Bindings { args: &args, ..Default::default() };
        assert!(t.render(&b, true).is_ok());
    }
}
