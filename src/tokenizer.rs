//! # Section Tokenizer
//!
//! First stage of the decoding pipeline. Splits the raw chart text into named
//! bracketed sections and each section body into `key = value` records.
//!
//! ## Document Shape
//! ```text
//! [SectionName]
//! {
//!   <tick> = <EventType> <operands...>
//!   <Key> = <Value>
//! }
//! ```
//!
//! Records whose key is a non-negative integer are tick-scoped [`TickEvent`]s.
//! Any other key is kept as a plain [`KeyValue`] pair (this is how `[Song]`
//! carries `Resolution`). Mixed `\r\n` / `\r` / `\n` line endings and arbitrary
//! leading spaces or tabs are accepted. Lines with an empty value are dropped
//! silently; lines that are not `key = value` at all are dropped with a
//! [`DiagnosticKind::MalformedLine`] diagnostic.
//!
//! Each section also carries a tick → event-index multimap so consumers can
//! look up every event sharing a tick.

use crate::error::{ChartError, Diagnostic, DiagnosticKind};
use std::collections::BTreeMap;

/// A tick-scoped record such as `768 = N 2 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    pub tick: u32,
    /// Everything right of `=`, trimmed.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

impl TickEvent {
    /// The event type letters, e.g. `N`, `S`, `B`, `TS`, `E`.
    pub fn kind(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    /// Operands following the event type.
    pub fn operands(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace().skip(1)
    }

    /// Raw operand text following the event type (quotes and spaces preserved).
    pub fn operand_text(&self) -> &str {
        let kind = self.kind();
        self.text
            .trim_start()
            .get(kind.len()..)
            .map(str::trim)
            .unwrap_or("")
    }
}

/// A non-tick record such as `Resolution = 192`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// One bracketed block of the document.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    /// 1-based line of the `[Name]` header.
    pub header_line: usize,
    /// Tick-scoped events in document order.
    pub events: Vec<TickEvent>,
    /// Non-tick key/value pairs in document order.
    pub pairs: Vec<KeyValue>,
    tick_index: BTreeMap<u32, Vec<usize>>,
}

impl Section {
    fn new(name: &str, header_line: usize) -> Self {
        Self {
            name: name.to_string(),
            header_line,
            ..Self::default()
        }
    }

    fn push_event(&mut self, event: TickEvent) {
        self.tick_index
            .entry(event.tick)
            .or_insert_with(Vec::new)
            .push(self.events.len());
        self.events.push(event);
    }

    /// Every event at `tick`, in document order.
    pub fn events_at(&self, tick: u32) -> impl Iterator<Item = &TickEvent> {
        self.tick_index
            .get(&tick)
            .into_iter()
            .flatten()
            .map(move |&i| &self.events[i])
    }

    /// Indices into [`Section::events`] for each tick.
    pub fn tick_index(&self) -> &BTreeMap<u32, Vec<usize>> {
        &self.tick_index
    }

    /// First value for a non-tick key.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_str())
    }

    /// Consecutive runs of events sharing a tick.
    pub fn tick_groups(&self) -> TickGroups<'_> {
        TickGroups { rest: &self.events }
    }
}

/// Iterator over `(tick, events)` runs, see [`Section::tick_groups`].
pub struct TickGroups<'a> {
    rest: &'a [TickEvent],
}

impl<'a> Iterator for TickGroups<'a> {
    type Item = (u32, &'a [TickEvent]);

    fn next(&mut self) -> Option<Self::Item> {
        let tick = self.rest.first()?.tick;
        let len = self
            .rest
            .iter()
            .position(|e| e.tick != tick)
            .unwrap_or(self.rest.len());
        let (group, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some((tick, group))
    }
}

/// Output of [`tokenize`].
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    pub sections: Vec<Section>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Tokenized {
    /// The first section called `name`.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Like [`Tokenized::section`], failing with [`ChartError::SectionNotFound`].
    pub fn require(&self, name: &str) -> Result<&Section, ChartError> {
        self.section(name).ok_or_else(|| ChartError::SectionNotFound {
            name: name.to_string(),
        })
    }

    /// The ordered tick events of section `name`.
    pub fn events(&self, name: &str) -> Result<&[TickEvent], ChartError> {
        Ok(&self.require(name)?.events)
    }
}

enum State {
    Outside,
    /// Saw `[Name]`, waiting for `{`.
    Header(Section),
    Body(Section),
}

/// Line-oriented tokenizer for chart documents
pub struct Tokenizer<'a> {
    input: &'a str,
    state: State,
    sections: Vec<Section>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            state: State::Outside,
            sections: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Tokenized {
        let input = self.input;
        for (index, raw) in split_lines(input).enumerate() {
            self.feed(raw.trim(), index + 1);
        }

        match std::mem::replace(&mut self.state, State::Outside) {
            State::Outside => {}
            State::Header(section) => {
                self.malformed(&section.name, section.header_line, "section header without a body");
            }
            State::Body(section) => {
                self.malformed(&section.name, section.header_line, "section is missing its closing '}'");
                self.sections.push(section);
            }
        }

        log::debug!(
            "tokenized {} sections ({} diagnostics)",
            self.sections.len(),
            self.diagnostics.len()
        );
        Tokenized {
            sections: self.sections,
            diagnostics: self.diagnostics,
        }
    }

    fn feed(&mut self, line: &str, line_no: usize) {
        match std::mem::replace(&mut self.state, State::Outside) {
            State::Outside => {
                if let Some(name) = section_header(line) {
                    self.state = State::Header(Section::new(name, line_no));
                }
            }
            State::Header(section) => {
                if line.is_empty() {
                    self.state = State::Header(section);
                } else if line == "{" {
                    self.state = State::Body(section);
                } else {
                    self.malformed(&section.name, line_no, "expected '{' after section header");
                    // The line may itself open the next section.
                    self.feed(line, line_no);
                }
            }
            State::Body(mut section) => {
                if line == "}" {
                    self.sections.push(section);
                    return;
                }
                if !line.is_empty() {
                    self.record(&mut section, line, line_no);
                }
                self.state = State::Body(section);
            }
        }
    }

    fn record(&mut self, section: &mut Section, line: &str, line_no: usize) {
        let Some((key, value)) = line.split_once('=') else {
            self.malformed(&section.name, line_no, format!("expected 'key = value', found '{}'", line));
            return;
        };
        let key = key.trim();
        let value = value.trim();

        if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
            self.malformed(&section.name, line_no, format!("invalid key '{}'", key));
            return;
        }
        if value.is_empty() {
            return;
        }

        if key.chars().all(|c| c.is_ascii_digit()) {
            match key.parse::<u32>() {
                Ok(tick) => section.push_event(TickEvent {
                    tick,
                    text: value.to_string(),
                    line: line_no,
                }),
                Err(_) => {
                    self.diagnostics.push(Diagnostic::new(
                        &section.name,
                        line_no,
                        DiagnosticKind::InvalidValue,
                        format!("tick '{}' is out of range", key),
                    ));
                }
            }
        } else {
            section.pairs.push(KeyValue {
                key: key.to_string(),
                value: value.to_string(),
                line: line_no,
            });
        }
    }

    fn malformed(&mut self, section: &str, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(
            section,
            line,
            DiagnosticKind::MalformedLine,
            message,
        ));
    }
}

/// Tokenize a chart document into its sections.
pub fn tokenize(input: &str) -> Tokenized {
    Tokenizer::new(input).tokenize()
}

/// Splits on `\r\n`, `\n` or a lone `\r`.
fn split_lines(input: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(input);
    std::iter::from_fn(move || {
        let s = rest?;
        match s.find(|c| c == '\r' || c == '\n') {
            Some(i) => {
                let skip = if s[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&s[i + skip..]);
                Some(&s[..i])
            }
            None => {
                rest = None;
                Some(s)
            }
        }
    })
}

fn section_header(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
