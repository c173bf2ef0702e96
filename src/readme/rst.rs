//! reStructuredText to HTML body fragment.
//!
//! Covers the constructs READMEs actually use: section titles, paragraphs,
//! bullet and enumerated lists, literal blocks, block quotes, transitions,
//! `image`/`figure`/`code` directives, admonitions, comments, hyperlink
//! targets and the common inline markup. Unsupported constructs degrade to
//! paragraphs. Only the body is produced, without document
//! wrappers.

use maud::html;
use std::collections::HashMap;

use super::renderer::escape;

const ADORNMENT_CHARS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Characters allowed before an inline markup start-string.
const START_PRECEDERS: &str = "'\"([{<-/:";

/// Characters allowed after an inline markup end-string.
const END_FOLLOWERS: &str = "'\")]}>-/:.,;!?\\";

const ADMONITIONS: &[&str] = &[
    "attention",
    "caution",
    "danger",
    "error",
    "hint",
    "important",
    "note",
    "tip",
    "warning",
];

/// Renders reStructuredText source to an HTML fragment.
pub fn render(source: &str) -> String {
    let lines: Vec<String> = source
        .lines()
        .map(|line| line.replace('\t', "        ").trim_end().to_string())
        .collect();

    let mut ctx = Context {
        styles: Vec::new(),
        targets: collect_targets(&lines),
    };

    let mut out = String::new();
    render_blocks(&lines, &mut ctx, &mut out);
    out
}

struct Context {
    /// Title adornment styles in order of first appearance.
    styles: Vec<(char, bool)>,
    /// Hyperlink targets keyed by normalized reference name.
    targets: HashMap<String, String>,
}

impl Context {
    fn heading_level(&mut self, style: (char, bool)) -> usize {
        let idx = match self.styles.iter().position(|s| *s == style) {
            Some(idx) => idx,
            None => {
                self.styles.push(style);
                self.styles.len() - 1
            }
        };
        (idx + 1).min(6)
    }
}

fn render_blocks(lines: &[String], ctx: &mut Context, out: &mut String) {
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];

        if is_blank(line) {
            i += 1;
            continue;
        }

        if indent_of(line) > 0 {
            let (block, next) = take_indented(lines, i);
            out.push_str("<blockquote>\n");
            render_blocks(&block, ctx, out);
            out.push_str("</blockquote>\n");
            i = next;
            continue;
        }

        if let Some(next) = section_title(lines, i, ctx, out) {
            i = next;
            continue;
        }

        if is_transition(lines, i) {
            out.push_str("<hr>\n");
            i += 1;
            continue;
        }

        if is_explicit_markup(line) {
            i = explicit_markup(lines, i, ctx, out);
            continue;
        }

        if bullet_marker(line).is_some() {
            i = bullet_list(lines, i, ctx, out);
            continue;
        }

        if enum_marker(line).is_some() {
            i = enumerated_list(lines, i, ctx, out);
            continue;
        }

        i = paragraph(lines, i, ctx, out);
    }
}

fn section_title(lines: &[String], i: usize, ctx: &mut Context, out: &mut String) -> Option<usize> {
    let line = &lines[i];

    // Overline, title, underline.
    if let Some(over) = adornment_char(line)
        && i + 2 < lines.len()
        && !is_blank(&lines[i + 1])
        && adornment_char(&lines[i + 2]) == Some(over)
    {
        let title = lines[i + 1].trim();
        if title.chars().count() <= line.chars().count() {
            push_heading(out, ctx.heading_level((over, true)), title, ctx);
            return Some(i + 3);
        }
    }

    // Title, underline.
    if i + 1 < lines.len()
        && adornment_char(line).is_none()
        && let Some(under) = adornment_char(&lines[i + 1])
    {
        let title_len = line.trim().chars().count();
        let under_len = lines[i + 1].chars().count();
        if under_len >= title_len || under_len >= 4 {
            push_heading(out, ctx.heading_level((under, false)), line.trim(), ctx);
            return Some(i + 2);
        }
    }

    None
}

fn push_heading(out: &mut String, level: usize, title: &str, ctx: &Context) {
    out.push_str(&format!(
        "<h{level}>{}</h{level}>\n",
        inline(title, &ctx.targets)
    ));
}

fn is_transition(lines: &[String], i: usize) -> bool {
    adornment_char(&lines[i]).is_some()
        && lines[i].chars().count() >= 4
        && (i == 0 || is_blank(&lines[i - 1]))
        && (i + 1 == lines.len() || is_blank(&lines[i + 1]))
}

fn is_explicit_markup(line: &str) -> bool {
    line == ".." || line.starts_with(".. ")
}

fn explicit_markup(lines: &[String], i: usize, ctx: &mut Context, out: &mut String) -> usize {
    let body = lines[i][2..].trim();
    let (block, next) = take_indented(lines, i + 1);

    // Hyperlink targets were collected up front.
    if body.starts_with('_') {
        return next;
    }

    let Some((name, argument)) = directive(body) else {
        return next;
    };

    match name.as_str() {
        "image" | "figure" => {
            let (options, rest) = split_options(&block);
            let alt = options.get("alt").map(String::as_str).unwrap_or("");
            let img = html! { img src=(argument) alt=(alt); }.into_string();
            if name == "figure" {
                out.push_str("<div class=\"figure\">\n");
                out.push_str(&img);
                out.push('\n');
                render_blocks(rest, ctx, out);
                out.push_str("</div>\n");
            } else {
                out.push_str(&img);
                out.push('\n');
            }
        }
        "code" | "code-block" | "sourcecode" => {
            let (_, rest) = split_options(&block);
            let code = rest.join("\n");
            if argument.is_empty() {
                out.push_str(&format!("<pre><code>{}</code></pre>\n", escape(&code)));
            } else {
                out.push_str(&format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>\n",
                    escape(argument),
                    escape(&code)
                ));
            }
        }
        kind if ADMONITIONS.contains(&kind) => {
            let mut content = Vec::with_capacity(block.len() + 1);
            if !argument.is_empty() {
                content.push(argument.to_string());
            }
            content.extend(block);

            out.push_str(&format!(
                "<div class=\"admonition {kind}\">\n<p class=\"admonition-title\">{}</p>\n",
                capitalize(kind)
            ));
            render_blocks(&content, ctx, out);
            out.push_str("</div>\n");
        }
        _ => {}
    }

    next
}

/// Splits `name:: argument` directive syntax.
fn directive(body: &str) -> Option<(String, &str)> {
    let (name, argument) = body.split_once("::")?;
    let name = name.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((name.to_ascii_lowercase(), argument.trim()))
}

/// Separates leading `:name: value` option lines from directive content.
fn split_options(block: &[String]) -> (HashMap<String, String>, &[String]) {
    let mut options = HashMap::new();
    let mut idx = 0;

    while idx < block.len() {
        let line = block[idx].trim();
        let Some(rest) = line.strip_prefix(':') else {
            break;
        };
        let Some((name, value)) = rest.split_once(':') else {
            break;
        };
        options.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        idx += 1;
    }

    while idx < block.len() && is_blank(&block[idx]) {
        idx += 1;
    }

    (options, &block[idx..])
}

fn bullet_list(lines: &[String], mut i: usize, ctx: &mut Context, out: &mut String) -> usize {
    let marker = bullet_marker(&lines[i]);
    out.push_str("<ul>\n");

    loop {
        let first = lines[i].get(2..).unwrap_or("").to_string();
        let (rest, next) = take_indented(lines, i + 1);
        push_item(out, first, rest, ctx);
        i = next;

        let j = skip_blank(lines, i);
        if j < lines.len() && bullet_marker(&lines[j]) == marker {
            i = j;
        } else {
            break;
        }
    }

    out.push_str("</ul>\n");
    i
}

fn enumerated_list(lines: &[String], mut i: usize, ctx: &mut Context, out: &mut String) -> usize {
    match enum_marker(&lines[i]) {
        Some((Some(start), _)) if start != 1 => {
            out.push_str(&format!("<ol start=\"{start}\">\n"));
        }
        _ => out.push_str("<ol>\n"),
    }

    while let Some((_, width)) = enum_marker(&lines[i]) {
        let first = lines[i].get(width..).unwrap_or("").trim_start().to_string();
        let (rest, next) = take_indented(lines, i + 1);
        push_item(out, first, rest, ctx);
        i = next;

        let j = skip_blank(lines, i);
        if j < lines.len() && enum_marker(&lines[j]).is_some() {
            i = j;
        } else {
            break;
        }
    }

    out.push_str("</ol>\n");
    i
}

fn push_item(out: &mut String, first: String, rest: Vec<String>, ctx: &mut Context) {
    let mut item = Vec::with_capacity(rest.len() + 1);
    item.push(first);
    item.extend(rest);

    let mut inner = String::new();
    render_blocks(&item, ctx, &mut inner);
    out.push_str("<li>");
    out.push_str(unwrap_single_paragraph(&inner));
    out.push_str("</li>\n");
}

fn paragraph(lines: &[String], start: usize, ctx: &mut Context, out: &mut String) -> usize {
    let mut end = start + 1;
    while end < lines.len() && !is_blank(&lines[end]) && indent_of(&lines[end]) == 0 {
        end += 1;
    }

    let text = lines[start..end].join("\n");
    let (text, literal_follows) = match text.strip_suffix("::") {
        Some(before) if before.trim().is_empty() => (String::new(), true),
        Some(before) if before.ends_with(char::is_whitespace) => {
            (before.trim_end().to_string(), true)
        }
        Some(before) => (format!("{before}:"), true),
        None => (text, false),
    };

    if !text.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", inline(&text, &ctx.targets)));
    }

    if !literal_follows {
        return end;
    }

    let j = skip_blank(lines, end);
    if j < lines.len() && indent_of(&lines[j]) > 0 {
        let (block, next) = take_indented(lines, j);
        out.push_str(&format!(
            "<pre class=\"literal-block\">{}</pre>\n",
            escape(&block.join("\n"))
        ));
        return next;
    }

    end
}

/// Collects `.. _name: url` targets anywhere in the document.
fn collect_targets(lines: &[String]) -> HashMap<String, String> {
    let mut targets = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(rest) = line.trim_start().strip_prefix(".. _") else {
            continue;
        };

        let parsed = match rest.strip_prefix('`') {
            Some(quoted) => quoted
                .split_once("`:")
                .map(|(name, url)| (name, url.trim())),
            None => rest.split_once(':').map(|(name, url)| (name, url.trim())),
        };
        let Some((name, mut url)) = parsed else {
            continue;
        };

        if url.is_empty()
            && let Some(next) = lines.get(idx + 1)
            && indent_of(next) > 0
        {
            url = next.trim();
        }

        if !url.is_empty() && !url.ends_with('_') {
            targets.insert(normalize_name(name), url.to_string());
        }
    }

    targets
}

/// Renders inline markup inside a text block.
fn inline(text: &str, targets: &HashMap<String, String>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            plain.push(chars[i + 1]);
            i += 2;
            continue;
        }

        if can_start(&chars, i)
            && let Some((html, next)) = markup_at(&chars, i, targets)
        {
            out.push_str(&link_plain(&plain, targets));
            plain.clear();
            out.push_str(&html);
            i = next;
            continue;
        }

        plain.push(c);
        i += 1;
    }

    out.push_str(&link_plain(&plain, targets));
    out
}

fn can_start(chars: &[char], i: usize) -> bool {
    match i.checked_sub(1).map(|p| chars[p]) {
        None => true,
        Some(prev) => prev.is_whitespace() || START_PRECEDERS.contains(prev),
    }
}

fn can_end(chars: &[char], after: usize) -> bool {
    after >= chars.len() || chars[after].is_whitespace() || END_FOLLOWERS.contains(chars[after])
}

/// Finds `delim` closing inline markup opened just before `from`.
fn find_closing(chars: &[char], from: usize, delim: &[char]) -> Option<usize> {
    if from >= chars.len() || chars[from].is_whitespace() {
        return None;
    }

    let mut pos = from + 1;
    while pos + delim.len() <= chars.len() {
        if chars[pos..pos + delim.len()] == *delim
            && !chars[pos - 1].is_whitespace()
            && can_end(chars, pos + delim.len())
        {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

fn markup_at(
    chars: &[char],
    i: usize,
    targets: &HashMap<String, String>,
) -> Option<(String, usize)> {
    let rest = &chars[i..];
    let collect = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

    if rest.starts_with(&['`', '`']) {
        let end = find_closing(chars, i + 2, &['`', '`'])?;
        let html = html! { code { (collect(i + 2, end)) } }.into_string();
        return Some((html, end + 2));
    }

    if rest.starts_with(&['*', '*']) {
        let end = find_closing(chars, i + 2, &['*', '*'])?;
        let html = html! { strong { (collect(i + 2, end)) } }.into_string();
        return Some((html, end + 2));
    }

    if rest.starts_with(&['*']) {
        let end = find_closing(chars, i + 1, &['*'])?;
        let html = html! { em { (collect(i + 1, end)) } }.into_string();
        return Some((html, end + 1));
    }

    if rest.starts_with(&[':']) {
        return role(chars, i);
    }

    if rest.starts_with(&['`']) {
        return interpreted(chars, i, targets);
    }

    None
}

/// `:role:`text`` interpreted text.
fn role(chars: &[char], i: usize) -> Option<(String, usize)> {
    let name_end = (i + 1..chars.len()).find(|&p| chars[p] == ':')?;
    let name: String = chars[i + 1..name_end].iter().collect();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        || chars.get(name_end + 1) != Some(&'`')
    {
        return None;
    }

    let open = name_end + 2;
    let close = find_closing(chars, open, &['`'])?;
    let text: String = chars[open..close].iter().collect();

    let html = match name.as_str() {
        "code" | "literal" => html! { code { (text) } }.into_string(),
        "strong" => html! { strong { (text) } }.into_string(),
        "emphasis" => html! { em { (text) } }.into_string(),
        _ => escape(&text),
    };
    Some((html, close + 1))
}

/// `` `text` ``, `` `text`_ ``, `` `text <url>`_ `` and anonymous `__` forms.
fn interpreted(
    chars: &[char],
    i: usize,
    targets: &HashMap<String, String>,
) -> Option<(String, usize)> {
    let close = (i + 2..chars.len()).find(|&p| chars[p] == '`' && !chars[p - 1].is_whitespace())?;
    if chars[i + 1].is_whitespace() {
        return None;
    }
    let content: String = chars[i + 1..close].iter().collect();

    let mut after = close + 1;
    let is_reference = chars.get(after) == Some(&'_');
    if is_reference {
        after += 1;
        if chars.get(after) == Some(&'_') {
            after += 1;
        }
    }
    if !can_end(chars, after) {
        return None;
    }

    if !is_reference {
        return Some((html! { em { (content) } }.into_string(), after));
    }

    if let Some(open) = content.rfind('<')
        && content.ends_with('>')
    {
        let target = content[open + 1..content.len() - 1].trim();
        let label = content[..open].trim();
        let label = if label.is_empty() { target } else { label };
        let url = match target.strip_suffix('_') {
            Some(name) => targets.get(&normalize_name(name)).map(String::as_str),
            None => Some(target),
        };
        let html = match url {
            Some(url) => html! { a href=(url) { (label) } }.into_string(),
            None => escape(label),
        };
        return Some((html, after));
    }

    let html = match targets.get(&normalize_name(&content)) {
        Some(url) => html! { a href=(url) { (content) } }.into_string(),
        None => escape(&content),
    };
    Some((html, after))
}

/// Escapes plain text, linking standalone URLs and `name_` references.
fn link_plain(text: &str, targets: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut rest = text;

    while let Some((start, end)) = find_url(rest) {
        out.push_str(&link_names(&rest[..start], targets));
        let url = &rest[start..end];
        out.push_str(&html! { a href=(url) { (url) } }.into_string());
        rest = &rest[end..];
    }

    out.push_str(&link_names(rest, targets));
    out
}

fn find_url(text: &str) -> Option<(usize, usize)> {
    let start = [text.find("https://"), text.find("http://")]
        .into_iter()
        .flatten()
        .min()?;

    let end = text[start..]
        .find(|c: char| c.is_whitespace() || c == '<' || c == '>' || c == '"')
        .map_or(text.len(), |len| start + len);
    let url = text[start..end].trim_end_matches(|c: char| ".,;:!?)'".contains(c));

    Some((start, start + url.len()))
}

fn link_names(text: &str, targets: &HashMap<String, String>) -> String {
    if targets.is_empty() {
        return escape(text);
    }

    let mut out = String::new();
    for piece in text.split_inclusive(char::is_whitespace) {
        let word = piece.trim_end();
        let space = &piece[word.len()..];
        let core = word.trim_end_matches(|c: char| ".,;:!?)".contains(c));
        let tail = &word[core.len()..];

        match core
            .strip_suffix('_')
            .filter(|name| !name.is_empty() && !name.ends_with('_'))
            .and_then(|name| targets.get(&normalize_name(name)).map(|url| (name, url)))
        {
            Some((name, url)) => {
                out.push_str(&html! { a href=(url) { (name) } }.into_string());
                out.push_str(&escape(tail));
            }
            None => out.push_str(&escape(word)),
        }
        out.push_str(space);
    }
    out
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn bullet_marker(line: &str) -> Option<char> {
    let mut chars = line.chars();
    let marker = chars.next().filter(|c| "-*+".contains(*c))?;
    match chars.next() {
        None | Some(' ') => Some(marker),
        _ => None,
    }
}

/// Parses `1.` and `#.` markers, returning the number and width.
fn enum_marker(line: &str) -> Option<(Option<u32>, usize)> {
    let (label, _) = line.split_once(". ")?;
    let number = match label {
        "#" => None,
        digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            Some(digits.parse().ok()?)
        }
        _ => return None,
    };

    Some((number, label.len() + 2))
}

fn adornment_char(line: &str) -> Option<char> {
    let first = line.chars().next()?;
    if ADORNMENT_CHARS.contains(first) && line.chars().all(|c| c == first) {
        Some(first)
    } else {
        None
    }
}

fn unwrap_single_paragraph(html: &str) -> &str {
    match html
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>\n"))
    {
        Some(inner) if !inner.contains("<p>") => inner,
        _ => html.trim_end_matches('\n'),
    }
}

/// Takes the indented block at `start`, dedented, without trailing blanks.
fn take_indented(lines: &[String], start: usize) -> (Vec<String>, usize) {
    let mut end = start;
    while end < lines.len() && (is_blank(&lines[end]) || indent_of(&lines[end]) > 0) {
        end += 1;
    }
    while end > start && is_blank(&lines[end - 1]) {
        end -= 1;
    }

    let block = &lines[start..end];
    let min = block
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);

    let dedented = block
        .iter()
        .map(|l| {
            if is_blank(l) {
                String::new()
            } else {
                l[min..].to_string()
            }
        })
        .collect();

    (dedented, end)
}

fn skip_blank(lines: &[String], mut i: usize) -> usize {
    while i < lines.len() && is_blank(&lines[i]) {
        i += 1;
    }
    i
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
