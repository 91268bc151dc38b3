//! Praat TextGrid parsing into [`AnnotationFile`].
//!
//! Both text layouts Praat writes are accepted. The long layout
//! (`xmin = 0`, `intervals [1]:`) and the short layout (bare values, one per
//! line) carry the same sequence of numbers, quoted strings and `<flags>`; keys
//! and bracketed item labels are skipped by the lexer, so a single grammar
//! over that token stream covers both.
//!
//! Structural problems (count mismatches, inverted or reordered intervals) fail
//! the file. Gaps, overlaps and tier bounds that disagree with the file bounds
//! are returned as warnings alongside the parsed file.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::AnnotationError;
use crate::types::{AnnotationFile, Interval, MediaStem, Tier};
use std::path::Path;

/// Tolerance in seconds for boundary comparisons.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// File extension of aligner output.
pub const TEXTGRID_EXTENSION: &str = "TextGrid";

const INTERVAL_TIER: &str = "IntervalTier";
const TEXT_TIER: &str = "TextTier";

/// Upper bound on interval storage reserved from a declared count.
const MAX_PREALLOCATED: usize = 1024;

/// A parsed file plus the non-fatal problems found in it.
#[derive(Clone, Debug)]
pub struct ParsedAnnotation {
    pub file: AnnotationFile,
    pub warnings: Vec<Diagnostic>,
}

/// Read and parse a TextGrid file; the stem comes from the file name.
pub fn read_file(path: &Path, epsilon: f64) -> Result<ParsedAnnotation, AnnotationError> {
    let io = |source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = std::fs::read(path).map_err(io)?;
    let text = decode(&bytes);
    let stem = MediaStem::from_path(path).unwrap_or_else(|| MediaStem::new(""));

    parse(stem, &text, epsilon)
}

/// Parse TextGrid text for `stem`.
pub fn parse(stem: MediaStem, text: &str, epsilon: f64) -> Result<ParsedAnnotation, AnnotationError> {
    Parser {
        lexer: Lexer::new(text),
        peeked: None,
        stem,
        epsilon,
        warnings: Vec::new(),
    }
    .parse()
}

/// Decode UTF-8 (with or without BOM) or UTF-16 text as written by Praat.
fn decode(bytes: &[u8]) -> String {
    let utf16 = |bytes: &[u8], from: fn([u8; 2]) -> u16| {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| from([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    };

    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum TokenKind {
    Number(f64),
    Text(String),
    Flag(String),
}

#[derive(Clone, Debug, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

impl Token {
    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Text(s) => format!("string {s:?}"),
            TokenKind::Flag(f) => format!("flag <{f}>"),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn next_token(&mut self) -> Result<Option<Token>, AnnotationError> {
        loop {
            let Some(c) = self.rest().chars().next() else {
                return Ok(None);
            };

            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '!' => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '"' => return self.string().map(Some),
                '<' => {
                    let line = self.line;
                    let word = self.word();
                    let flag = word.trim_start_matches('<').trim_end_matches('>');
                    return Ok(Some(Token {
                        kind: TokenKind::Flag(flag.to_string()),
                        line,
                    }));
                }
                _ => {
                    let line = self.line;
                    let word = self.word();
                    if looks_numeric(word)
                        && let Ok(n) = word.parse::<f64>()
                    {
                        return Ok(Some(Token {
                            kind: TokenKind::Number(n),
                            line,
                        }));
                    }
                    // keys, `=`, and item labels such as `intervals [3]:`
                }
            }
        }
    }

    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.rest().chars().next() {
            if c.is_whitespace() || c == '"' || (c == '!' && self.pos > start) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Quoted string; `""` inside the quotes is a literal quote.
    fn string(&mut self) -> Result<Token, AnnotationError> {
        let line = self.line;
        self.bump();

        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(AnnotationError::UnterminatedString { line }),
                Some('"') if self.rest().starts_with('"') => {
                    self.bump();
                    text.push('"');
                }
                Some('"') => break,
                Some(c) => text.push(c),
            }
        }

        Ok(Token {
            kind: TokenKind::Text(text),
            line,
        })
    }
}

fn looks_numeric(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    stem: MediaStem,
    epsilon: f64,
    warnings: Vec<Diagnostic>,
}

impl Parser<'_> {
    fn parse(mut self) -> Result<ParsedAnnotation, AnnotationError> {
        let file_type = self.text("file type")?;
        if file_type != "ooTextFile" {
            return Err(AnnotationError::NotTextGrid(file_type));
        }
        let object_class = self.text("object class")?;
        if object_class != "TextGrid" {
            return Err(AnnotationError::NotTextGrid(object_class));
        }

        let start = self.number("xmin")?;
        let end = self.number("xmax")?;

        let declared = match self.peek()? {
            Some(Token {
                kind: TokenKind::Flag(flag),
                ..
            }) => {
                let absent = flag == "absent";
                self.advance()?;
                if absent { 0 } else { self.count()? }
            }
            _ => self.count()?,
        };

        let mut tiers = Vec::new();
        let mut found = 0;
        while let Some(token) = self.peek()? {
            match &token.kind {
                TokenKind::Text(_) => {
                    found += 1;
                    if let Some(tier) = self.tier(start, end)? {
                        tiers.push(tier);
                    }
                }
                _ => {
                    let token = token.clone();
                    return Err(AnnotationError::Syntax {
                        line: token.line,
                        expected: "tier class",
                        found: token.describe(),
                    });
                }
            }
        }

        if found != declared {
            return Err(AnnotationError::TierCountMismatch { declared, found });
        }

        Ok(ParsedAnnotation {
            file: AnnotationFile {
                stem: self.stem,
                start,
                end,
                tiers,
            },
            warnings: self.warnings,
        })
    }

    /// One tier block. Point tiers are consumed and skipped.
    fn tier(&mut self, file_start: f64, file_end: f64) -> Result<Option<Tier>, AnnotationError> {
        let line = self.peek()?.map(|t| t.line).unwrap_or(self.lexer.line);
        let class = self.text("tier class")?;
        let name = self.text("tier name")?;
        let start = self.number("tier xmin")?;
        let end = self.number("tier xmax")?;
        let declared = self.count()?;

        match class.as_str() {
            INTERVAL_TIER => {
                // Declared counts are untrusted until matched against the triples.
                let mut intervals = Vec::with_capacity(declared.min(MAX_PREALLOCATED));
                while self.next_is_number()? {
                    let xmin = self.number("interval xmin")?;
                    let xmax = self.number("interval xmax")?;
                    let label = self.text("interval text")?;
                    intervals.push(Interval::new(xmin, xmax, label));
                }

                if intervals.len() != declared {
                    return Err(AnnotationError::IntervalCountMismatch {
                        tier: name,
                        declared,
                        found: intervals.len(),
                    });
                }

                let tier = Tier {
                    name,
                    start,
                    end,
                    intervals,
                };
                self.check_tier(&tier, file_start, file_end)?;
                Ok(Some(tier))
            }
            TEXT_TIER => {
                let mut points = 0;
                while self.next_is_number()? {
                    self.number("point time")?;
                    self.text("point mark")?;
                    points += 1;
                }

                if points != declared {
                    return Err(AnnotationError::IntervalCountMismatch {
                        tier: name,
                        declared,
                        found: points,
                    });
                }

                self.warn(
                    DiagnosticKind::UnsupportedTier,
                    format!("point tier {name:?} skipped ({points} points)"),
                );
                Ok(None)
            }
            _ => Err(AnnotationError::Syntax {
                line,
                expected: "IntervalTier or TextTier",
                found: format!("string {class:?}"),
            }),
        }
    }

    /// Fail on inverted or reordered intervals, warn on gaps and bounds.
    fn check_tier(&mut self, tier: &Tier, file_start: f64, file_end: f64) -> Result<(), AnnotationError> {
        let eps = self.epsilon;

        for (index, interval) in tier.intervals.iter().enumerate() {
            if interval.end < interval.start - eps {
                return Err(AnnotationError::InvertedInterval {
                    tier: tier.name.clone(),
                    index: index + 1,
                    start: interval.start,
                    end: interval.end,
                });
            }
        }

        for (index, pair) in tier.intervals.windows(2).enumerate() {
            let [prev, next] = pair else { continue };

            if next.start < prev.start - eps {
                return Err(AnnotationError::NonMonotonic {
                    tier: tier.name.clone(),
                    index: index + 2,
                    start: next.start,
                    previous: prev.start,
                });
            }

            let gap = next.start - prev.end;
            if gap.abs() > eps {
                let what = if gap > 0.0 { "gap" } else { "overlap" };
                self.warn(
                    DiagnosticKind::Contiguity,
                    format!(
                        "tier {:?}: {what} of {:.4}s between {:?} (ends {:.4}) and {:?} (starts {:.4})",
                        tier.name,
                        gap.abs(),
                        prev.label,
                        prev.end,
                        next.label,
                        next.start
                    ),
                );
            }
        }

        if (tier.start - file_start).abs() > eps || (tier.end - file_end).abs() > eps {
            self.warn(
                DiagnosticKind::TierExtent,
                format!(
                    "tier {:?} spans {:.4}..{:.4}, file spans {:.4}..{:.4}",
                    tier.name, tier.start, tier.end, file_start, file_end
                ),
            );
        }

        if let (Some(first), Some(last)) = (tier.intervals.first(), tier.intervals.last())
            && ((first.start - tier.start).abs() > eps || (last.end - tier.end).abs() > eps)
        {
            self.warn(
                DiagnosticKind::TierExtent,
                format!(
                    "tier {:?} intervals cover {:.4}..{:.4}, tier spans {:.4}..{:.4}",
                    tier.name, first.start, last.end, tier.start, tier.end
                ),
            );
        }

        Ok(())
    }

    fn warn(&mut self, kind: DiagnosticKind, message: String) {
        self.warnings
            .push(Diagnostic::new(kind, self.stem.as_str(), message));
    }

    fn peek(&mut self) -> Result<Option<&Token>, AnnotationError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn advance(&mut self) -> Result<Option<Token>, AnnotationError> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn next_is_number(&mut self) -> Result<bool, AnnotationError> {
        Ok(matches!(
            self.peek()?,
            Some(Token {
                kind: TokenKind::Number(_),
                ..
            })
        ))
    }

    fn number(&mut self, expected: &'static str) -> Result<f64, AnnotationError> {
        match self.advance()? {
            Some(Token {
                kind: TokenKind::Number(n),
                ..
            }) => Ok(n),
            Some(token) => Err(AnnotationError::Syntax {
                line: token.line,
                expected,
                found: token.describe(),
            }),
            None => Err(AnnotationError::UnexpectedEof { expected }),
        }
    }

    fn text(&mut self, expected: &'static str) -> Result<String, AnnotationError> {
        match self.advance()? {
            Some(Token {
                kind: TokenKind::Text(s),
                ..
            }) => Ok(s),
            Some(token) => Err(AnnotationError::Syntax {
                line: token.line,
                expected,
                found: token.describe(),
            }),
            None => Err(AnnotationError::UnexpectedEof { expected }),
        }
    }

    fn count(&mut self) -> Result<usize, AnnotationError> {
        let line = self.peek()?.map(|t| t.line).unwrap_or(self.lexer.line);
        let value = self.number("size")?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(AnnotationError::InvalidCount { line, value });
        }
        Ok(value as usize)
    }
}
