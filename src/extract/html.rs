// src/extract/html.rs
// =============================================================================
// This module pulls raw link strings out of an HTML body while it streams in.
//
// We use the html5ever tokenizer directly (the same parser scraper is built
// on) instead of building a DOM:
// - chunks are fed to the tokenizer as they arrive from the network
// - every start tag is inspected once and then thrown away
// - links come out as a lazy Stream, so nothing waits for the whole page
//
// Which attributes count as links:
//   <a href>                       -> href
//   <script src>, <link href src>  -> src and href
//
// Every occurrence counts. The tokenizer keeps only the first copy of a
// repeated attribute, so for those tags we re-read the tag's own markup.
//
// The strings are NOT resolved here; see scope.rs for that.
// =============================================================================

use futures::stream::{self, Stream, StreamExt};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use tracing::{debug, trace};

/// Turns a stream of body chunks into a lazy stream of raw link values.
///
/// The returned stream is finite and can be consumed once. A read error on
/// the body ends it early; whatever was extracted before the error is still
/// yielded, and the error itself is only logged.
pub fn extract_links<S, B, E>(body: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = ExtractState {
        body: Box::pin(body),
        tokenizer: Tokenizer::new(LinkSink::default(), TokenizerOpts::default()),
        input: BufferQueue::new(),
        decoder: Utf8Decoder::default(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(link) = state.tokenizer.sink.links.pop_front() {
                return Some((link, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.feed(chunk.as_ref()),
                Some(Err(e)) => {
                    debug!(error = %e, "body read failed, keeping partial extraction");
                    state.finish();
                }
                None => state.finish(),
            }
        }
    })
}

struct ExtractState<S> {
    body: Pin<Box<S>>,
    tokenizer: Tokenizer<LinkSink>,
    input: BufferQueue,
    decoder: Utf8Decoder,
    finished: bool,
}

impl<S> ExtractState<S> {
    fn feed(&mut self, bytes: &[u8]) {
        let text = self.decoder.decode(bytes);
        self.push_text(text);
    }

    fn finish(&mut self) {
        let rest = self.decoder.flush();
        self.push_text(rest);
        self.tokenizer.end();
        self.finished = true;
    }

    fn push_text(&mut self, text: String) {
        if text.is_empty() || self.tokenizer.sink.done {
            return;
        }
        // Tags only end on '>', so feeding up to each '>' on its own leaves a
        // finished tag's markup at the end of `sink.source`
        for piece in text.split_inclusive('>') {
            self.tokenizer.sink.source.push_str(piece);
            self.input.push_back(StrTendril::from_slice(piece));
            // With no tree builder attached the sink never asks to run a
            // script, so one call drains the queue
            let _ = self.tokenizer.feed(&mut self.input);
        }
    }
}

/// Receives tokens from html5ever and keeps the link attributes we care about.
#[derive(Default)]
struct LinkSink {
    links: VecDeque<String>,
    /// Markup fed since the last tag, comment or doctype.
    source: String,
    done: bool,
}

impl LinkSink {
    fn collect(&mut self, tag: &Tag) {
        let wanted: &[&str] = match &*tag.name {
            "a" => &["href"],
            "script" | "link" => &["src", "href"],
            _ => return,
        };

        if let Some(values) = repeated_values(tag_markup(&self.source), wanted) {
            self.links.extend(values);
            return;
        }

        for attr in &tag.attrs {
            if wanted.contains(&&*attr.name.local) {
                self.links.push_back(attr.value.to_string());
            }
        }
    }
}

/// The start tag at the end of `source`. In the data state `<` followed by a
/// letter always opens a tag, so the first one is ours.
fn tag_markup(source: &str) -> &str {
    let bytes = source.as_bytes();
    bytes
        .windows(2)
        .position(|pair| pair[0] == b'<' && pair[1].is_ascii_alphabetic())
        .map_or("", |start| &source[start..])
}

/// Every value of the wanted attributes, in source order, when at least one
/// of them appears more than once. `None` means the tokenizer's own
/// attribute list is complete.
fn repeated_values(markup: &str, wanted: &[&str]) -> Option<Vec<String>> {
    let spans: Vec<(String, &str)> = attribute_spans(markup)
        .into_iter()
        .filter(|(name, _)| wanted.contains(&name.as_str()))
        .collect();

    let repeated = wanted
        .iter()
        .any(|want| spans.iter().filter(|(name, _)| name == want).count() > 1);
    if !repeated {
        return None;
    }

    Some(
        spans
            .into_iter()
            .filter_map(|(_, span)| decode_attribute(span))
            .collect(),
    )
}

fn is_tag_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

/// Splits `<name attr=value ...>` into `(lowercased name, raw "attr=value")`
/// pairs, following the HTML attribute syntax: quoted values run to the
/// matching quote, unquoted ones to whitespace or '>'.
fn attribute_spans(markup: &str) -> Vec<(String, &str)> {
    let bytes = markup.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();

    // '<' and the tag name
    let mut i = usize::min(1, len);
    while i < len && !is_tag_delimiter(bytes[i]) {
        i += 1;
    }

    loop {
        while i < len && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= len || bytes[i] == b'>' {
            break;
        }

        let start = i;
        // A leading '=' belongs to the name
        i += 1;
        while i < len && !is_tag_delimiter(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let name = markup[start..i].to_ascii_lowercase();

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < len && bytes[j] == b'=' {
            j += 1;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match bytes.get(j) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    j += 1;
                    while j < len && bytes[j] != quote {
                        j += 1;
                    }
                    j = (j + 1).min(len);
                }
                _ => {
                    while j < len && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                }
            }
            i = j;
        }

        spans.push((name, &markup[start..i]));
    }

    spans
}

/// Runs a single `attr=value` span through the tokenizer on its own, so
/// character references are decoded exactly as in the main pass.
fn decode_attribute(span: &str) -> Option<String> {
    let mut tokenizer = Tokenizer::new(AttributeSink::default(), TokenizerOpts::default());
    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from(format!("<x {}>", span)));
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.value
}

#[derive(Default)]
struct AttributeSink {
    value: Option<String>,
}

impl TokenSink for AttributeSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(tag) = token {
            if self.value.is_none() {
                self.value = tag.attrs.first().map(|attr| attr.value.to_string());
            }
        }
        TokenSinkResult::Continue
    }
}

impl TokenSink for LinkSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) if tag.kind == TagKind::StartTag => {
                self.collect(&tag);
                self.source.clear();
                // A tokenizer on its own does not know that <script> and
                // friends hold text, not markup. Tell it, so a
                // `document.write('<a href=...>')` is not mistaken for a link.
                if !tag.self_closing {
                    if let Some(result) = text_content_mode(&tag.name) {
                        return result;
                    }
                }
            }
            Token::TagToken(_) | Token::CommentToken(_) | Token::DoctypeToken(_) => {
                self.source.clear()
            }
            Token::EOFToken => self.done = true,
            Token::ParseError(reason) => trace!(%reason, "html parse error"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn text_content_mode(name: &str) -> Option<TokenSinkResult<()>> {
    let mode = match name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "iframe" | "noembed" | "noframes" | "noscript" | "xmp" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "textarea" | "title" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => return None,
    };
    Some(mode)
}

/// Incremental UTF-8 decoding across chunk boundaries.
///
/// A multi-byte character split between two network chunks is held back
/// until the rest arrives. Invalid sequences become U+FFFD.
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }

    fn flush(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
